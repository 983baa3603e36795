//! Error types for packed font assets and growable buffers

use std::path::PathBuf;

/// Growable buffer failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BufferError {
    /// Allocation failed while growing (existing content is untouched)
    #[error("out of memory while growing buffer to {requested} bytes")]
    OutOfMemory { requested: usize },

    /// Offset or index past the live region
    #[error("offset {offset} out of bounds (length {len})")]
    OutOfBounds { offset: usize, len: usize },
}

/// Validation error for packed font and raw texture files
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    /// Signature field does not match the expected magic
    #[error("bad signature 0x{found:08x} (expected 0x{expected:08x})")]
    BadSignature { expected: u32, found: u32 },

    /// File shorter than its header
    #[error("file too small: {len} bytes (header needs {needed})")]
    TooSmall { len: usize, needed: usize },

    /// A section extends past the end of the file
    #[error("{section} section out of bounds ({start}..{end}, file is {len} bytes)")]
    SectionOutOfBounds {
        section: &'static str,
        start: usize,
        end: usize,
        len: usize,
    },

    /// A section offset is not aligned for its record type
    #[error("{section} section at offset {offset} is not {align}-byte aligned")]
    Misaligned {
        section: &'static str,
        offset: usize,
        align: usize,
    },

    /// Stored texture filename is not valid UTF-8 or overruns its entry
    #[error("invalid texture filename entry {index}")]
    InvalidFilename { index: usize },

    /// Index 0 must always hold the placeholder glyph
    #[error("packed font stores no glyphs")]
    Empty,

    /// Texture payload does not match its declared dimensions
    #[error("texture payload is {found} bytes, {width}x{height} needs {expected}")]
    TextureSizeMismatch {
        width: u32,
        height: u32,
        expected: usize,
        found: usize,
    },

    /// Failed to open or map a file
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            BufferError::OutOfMemory { requested: 128 }.to_string(),
            "out of memory while growing buffer to 128 bytes"
        );
        assert_eq!(
            FormatError::BadSignature {
                expected: 0x4659594d,
                found: 0
            }
            .to_string(),
            "bad signature 0x00000000 (expected 0x4659594d)"
        );
        assert_eq!(
            FormatError::Misaligned {
                section: "codepoints",
                offset: 30,
                align: 4
            }
            .to_string(),
            "codepoints section at offset 30 is not 4-byte aligned"
        );
        assert_eq!(FormatError::Empty.to_string(), "packed font stores no glyphs");
    }
}
