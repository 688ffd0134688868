use std::fmt;

use overgrid_model::ArtStyle;

/// One game/art-style unit, as it appears in the final report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unit {
    pub game_id: String,
    pub game_name: String,
    pub style: ArtStyle,
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = if self.game_name.is_empty() {
            "unknown game"
        } else {
            &self.game_name
        };
        write!(f, "{name} (id {}, {})", self.game_id, self.style)
    }
}

/// End-of-run summary, accumulated across all units of a user.
#[derive(Debug, Default)]
pub struct Report {
    pub downloaded: usize,
    pub overlays_applied: usize,
    pub not_found: Vec<Unit>,
    pub from_steamgriddb: Vec<Unit>,
    pub from_igdb: Vec<Unit>,
    pub from_search: Vec<Unit>,
    pub failed: Vec<(Unit, String)>,
    pub write_failures: Vec<(Unit, String)>,
}

impl Report {
    pub fn is_clean(&self) -> bool {
        self.not_found.is_empty()
            && self.from_steamgriddb.is_empty()
            && self.from_igdb.is_empty()
            && self.from_search.is_empty()
            && self.failed.is_empty()
            && self.write_failures.is_empty()
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} images downloaded and {} overlays applied.",
            self.downloaded, self.overlays_applied
        )?;

        let sections: [(&str, &Vec<Unit>); 3] = [
            (
                "images were found with a web search and may not be accurate",
                &self.from_search,
            ),
            (
                "images were found on IGDB and may not be in full quality or accurate",
                &self.from_igdb,
            ),
            (
                "images were found on SteamGridDB and may not be in full quality or accurate",
                &self.from_steamgriddb,
            ),
        ];
        for (label, units) in sections {
            if units.is_empty() {
                continue;
            }
            writeln!(f, "\n{} {label}:", units.len())?;
            for unit in units {
                writeln!(f, "* {unit}")?;
            }
        }

        if !self.not_found.is_empty() {
            writeln!(f, "\n{} images could not be found anywhere:", self.not_found.len())?;
            for unit in &self.not_found {
                writeln!(f, "- {unit}")?;
            }
        }
        if !self.failed.is_empty() {
            writeln!(f, "\n{} images could not be processed:", self.failed.len())?;
            for (unit, reason) in &self.failed {
                writeln!(f, "- {unit} ({reason})")?;
            }
        }
        if !self.write_failures.is_empty() {
            writeln!(f, "\n{} images could not be written:", self.write_failures.len())?;
            for (unit, reason) in &self.write_failures {
                writeln!(f, "- {unit} ({reason})")?;
            }
        }
        Ok(())
    }
}
