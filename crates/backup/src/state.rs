use std::path::PathBuf;

/// What exists on disk for one game/art-style unit, classified before
/// anything is touched.
///
/// The variants are ordered by precedence: an override beats a legacy
/// backup, which beats whatever sits at the canonical path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageState {
    /// User-supplied file in the override directory.
    Override(PathBuf),
    /// Pre-hash `<id><suffix> (original)` backup, migrated on load.
    Legacy(PathBuf),
    /// Decorated canonical file whose hash matches a stored backup; the
    /// backup holds the clean image.
    Backup {
        canonical: PathBuf,
        backup: PathBuf,
    },
    /// Canonical file with no matching backup record; the file itself is
    /// treated as the clean image and backed up this run.
    Manual(PathBuf),
    /// Nothing on disk; the resolver has to find artwork.
    Absent,
}
