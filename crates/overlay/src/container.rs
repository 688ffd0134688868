//! Container-level probes that read animation metadata without decoding
//! any pixels, so the memory gate can run before committing to a full
//! decode.

use std::io::Cursor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WebpInfo {
    /// Canvas size from the VP8X chunk; zero for simple still files.
    pub width: u32,
    pub height: u32,
    pub frame_count: u32,
    /// 0 means loop forever.
    pub loop_count: u16,
}

impl WebpInfo {
    pub fn is_animated(&self) -> bool {
        self.frame_count > 1
    }

    /// Upper bound on decoded RGBA memory for the whole animation.
    pub fn decoded_size(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height) * 4 * u64::from(self.frame_count)
    }
}

/// Walks the RIFF chunk list of a WEBP file. Returns None when the bytes
/// are not WEBP at all.
pub fn probe_webp(bytes: &[u8]) -> Option<WebpInfo> {
    if bytes.len() < 12 || &bytes[0..4] != b"RIFF" || &bytes[8..12] != b"WEBP" {
        return None;
    }

    let mut info = WebpInfo {
        width: 0,
        height: 0,
        frame_count: 0,
        loop_count: 0,
    };

    let mut at = 12;
    while at + 8 <= bytes.len() {
        let fourcc = &bytes[at..at + 4];
        let size = u32::from_le_bytes([
            bytes[at + 4],
            bytes[at + 5],
            bytes[at + 6],
            bytes[at + 7],
        ]) as usize;
        let payload = at + 8;
        if payload + size > bytes.len() {
            break;
        }
        match fourcc {
            b"VP8X" if size >= 10 => {
                // 24-bit canvas dimensions, stored minus one.
                info.width = 1 + u32::from_le_bytes([
                    bytes[payload + 4],
                    bytes[payload + 5],
                    bytes[payload + 6],
                    0,
                ]);
                info.height = 1 + u32::from_le_bytes([
                    bytes[payload + 7],
                    bytes[payload + 8],
                    bytes[payload + 9],
                    0,
                ]);
            }
            b"ANIM" if size >= 6 => {
                info.loop_count = u16::from_le_bytes([bytes[payload + 4], bytes[payload + 5]]);
            }
            b"ANMF" => {
                info.frame_count += 1;
            }
            _ => {}
        }
        // Chunks are padded to an even size.
        at = payload + size + (size & 1);
    }

    if info.frame_count == 0 {
        info.frame_count = 1;
    }
    Some(info)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PngInfo {
    pub width: u32,
    pub height: u32,
    pub frame_count: u32,
    /// 0 means loop forever.
    pub num_plays: u32,
}

impl PngInfo {
    pub fn is_animated(&self) -> bool {
        self.frame_count > 1
    }
}

/// Reads the PNG header and the acTL chunk if present. Returns None when
/// the bytes are not PNG.
pub fn probe_png(bytes: &[u8]) -> Option<PngInfo> {
    const MAGIC: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];
    if bytes.len() < 8 || bytes[0..8] != MAGIC {
        return None;
    }

    let decoder = png::Decoder::new(Cursor::new(bytes));
    let reader = decoder.read_info().ok()?;
    let info = reader.info();
    let (frame_count, num_plays) = match info.animation_control {
        Some(actl) => (actl.num_frames, actl.num_plays),
        None => (1, 0),
    };
    Some(PngInfo {
        width: info.width,
        height: info.height,
        frame_count,
        num_plays,
    })
}
