//! Packing errors and their process exit codes

use std::path::PathBuf;

use font_common::BufferError;

/// Failure class, each with its own exit code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Missing or unreadable input, malformed chars file, bad configuration
    Input,
    /// A growable buffer could not grow
    ResourceExhaustion,
    /// A codepoint no face can render, with no placeholder available, or a
    /// bitmap that does not match its own dimensions
    Rasterization,
    /// Glyphs do not fit the atlas
    Format,
    /// Writing an output file failed
    Io,
}

impl ErrorCategory {
    /// Process exit code (2 is left to clap for usage errors)
    pub fn exit_code(self) -> u8 {
        match self {
            ErrorCategory::Input => 3,
            ErrorCategory::ResourceExhaustion => 4,
            ErrorCategory::Rasterization => 5,
            ErrorCategory::Format => 6,
            ErrorCategory::Io => 7,
        }
    }
}

/// Errors that abort a packing run
#[derive(Debug, thiserror::Error)]
pub enum PackError {
    #[error("failed to read {path:?}: {source}")]
    ReadInput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed UTF-8 at byte {offset}{}", .path.as_ref().map(|p| format!(" of {}", p.display())).unwrap_or_default())]
    MalformedUtf8 {
        path: Option<PathBuf>,
        offset: usize,
    },

    #[error("failed to load font {path:?}: {reason}")]
    FontLoad { path: PathBuf, reason: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    OutOfMemory(#[from] BufferError),

    #[error("no font can render U+{codepoint:04X} and no placeholder glyph is available")]
    MissingGlyph { codepoint: u32 },

    #[error("rasterizer returned a malformed bitmap for U+{codepoint:04X}: {source}")]
    InvalidBitmap {
        codepoint: u32,
        #[source]
        source: BufferError,
    },

    #[error("glyph U+{codepoint:04X} is {width}px wide, atlas columns are {atlas_width}px")]
    GlyphTooWide {
        codepoint: u32,
        width: u32,
        atlas_width: u32,
    },

    #[error("atlas needs {width}x{height} pixels, limit is {max}x{max}")]
    AtlasOverflow { width: u32, height: u32, max: u32 },

    #[error("failed to write {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PackError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            PackError::ReadInput { .. }
            | PackError::MalformedUtf8 { .. }
            | PackError::FontLoad { .. }
            | PackError::Config(_) => ErrorCategory::Input,
            PackError::OutOfMemory(_) => ErrorCategory::ResourceExhaustion,
            PackError::MissingGlyph { .. } | PackError::InvalidBitmap { .. } => {
                ErrorCategory::Rasterization
            }
            PackError::GlyphTooWide { .. } | PackError::AtlasOverflow { .. } => {
                ErrorCategory::Format
            }
            PackError::Write { .. } => ErrorCategory::Io,
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.category().exit_code()
    }

    /// Attach the chars file path to a decoding error
    pub fn in_file(self, file: impl Into<PathBuf>) -> Self {
        match self {
            PackError::MalformedUtf8 { path: None, offset } => PackError::MalformedUtf8 {
                path: Some(file.into()),
                offset,
            },
            other => other,
        }
    }
}
