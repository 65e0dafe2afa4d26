//! Known content signatures ("magic numbers") per file extension
//!
//! A signature is one or more byte segments at fixed offsets; all segments must
//! match. An extension matches when any of its signatures does.

/// Bytes that must appear at `offset`.
#[derive(Debug, Clone, Copy)]
pub struct Segment {
    pub offset: usize,
    pub bytes: &'static [u8],
}

#[derive(Debug, Clone, Copy)]
pub struct Signature {
    pub segments: &'static [Segment],
}

impl Signature {
    pub fn matches(&self, data: &[u8]) -> bool {
        self.segments.iter().all(|segment| {
            data.get(segment.offset..segment.offset + segment.bytes.len())
                .is_some_and(|window| window == segment.bytes)
        })
    }

    /// Number of leading bytes needed to evaluate this signature.
    fn span(&self) -> usize {
        self.segments
            .iter()
            .map(|s| s.offset + s.bytes.len())
            .max()
            .unwrap_or(0)
    }
}

macro_rules! at {
    ($offset:expr, $bytes:expr) => {
        Segment {
            offset: $offset,
            bytes: $bytes,
        }
    };
}

macro_rules! sig {
    ($($segment:expr),+ $(,)?) => {
        Signature {
            segments: &[$($segment),+],
        }
    };
}

const JPEG: &[Signature] = &[
    sig!(at!(0, &[0xFF, 0xD8, 0xFF, 0xE0])),
    sig!(at!(0, &[0xFF, 0xD8, 0xFF, 0xE1])),
    sig!(at!(0, &[0xFF, 0xD8, 0xFF, 0xE2])),
    sig!(at!(0, &[0xFF, 0xD8, 0xFF, 0xE3])),
    sig!(at!(0, &[0xFF, 0xD8, 0xFF, 0xE8])),
    sig!(at!(0, &[0xFF, 0xD8, 0xFF, 0xDB])),
    sig!(at!(0, &[0xFF, 0xD8, 0xFF, 0xEE])),
];

const PNG: &[Signature] = &[sig!(at!(0, &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]))];

const GIF: &[Signature] = &[sig!(at!(0, b"GIF87a")), sig!(at!(0, b"GIF89a"))];

const BMP: &[Signature] = &[sig!(at!(0, b"BM"))];

const WEBP: &[Signature] = &[sig!(
    at!(0, b"RIFF"),
    at!(8, b"WEBP")
)];

const TIFF: &[Signature] = &[
    sig!(at!(0, &[0x49, 0x49, 0x2A, 0x00])),
    sig!(at!(0, &[0x4D, 0x4D, 0x00, 0x2A])),
];

const PDF: &[Signature] = &[sig!(at!(0, b"%PDF-"))];

const ZIP: &[Signature] = &[
    sig!(at!(0, &[0x50, 0x4B, 0x03, 0x04])),
    sig!(at!(0, &[0x50, 0x4B, 0x05, 0x06])),
    sig!(at!(0, &[0x50, 0x4B, 0x07, 0x08])),
];

const GZIP: &[Signature] = &[sig!(at!(0, &[0x1F, 0x8B, 0x08]))];

const WAV: &[Signature] = &[sig!(
    at!(0, b"RIFF"),
    at!(8, b"WAVE")
)];

const MP4: &[Signature] = &[sig!(at!(4, b"ftyp"))];

/// Signatures registered for a normalized extension (`.jpg`).
pub fn signatures_for(extension: &str) -> Option<&'static [Signature]> {
    let signatures = match extension {
        ".jpg" | ".jpeg" => JPEG,
        ".png" => PNG,
        ".gif" => GIF,
        ".bmp" => BMP,
        ".webp" => WEBP,
        ".tif" | ".tiff" => TIFF,
        ".pdf" => PDF,
        ".zip" => ZIP,
        ".gz" => GZIP,
        ".wav" => WAV,
        ".mp4" | ".m4a" | ".mov" => MP4,
        _ => return None,
    };
    Some(signatures)
}

/// Leading bytes needed to evaluate every signature of `extension`; 0 if none.
pub fn max_signature_len(extension: &str) -> usize {
    signatures_for(extension)
        .and_then(|signatures| signatures.iter().map(Signature::span).max())
        .unwrap_or(0)
}

/// True when `data` starts with a signature registered for `extension`.
/// Extensions with no registered signature never match.
pub fn matches_extension(extension: &str, data: &[u8]) -> bool {
    signatures_for(extension)
        .map(|signatures| signatures.iter().any(|s| s.matches(data)))
        .unwrap_or(false)
}
