//! Shared types for packed glyph atlases
//!
//! This crate provides everything shared between:
//! - `font-packer` (builds atlases from outline fonts)
//! - runtime text renderers (map a packed font and lay out strings)
//!
//! # Modules
//!
//! - [`buffer`] - Growable byte arena and typed record views
//! - [`formats`] - Packed font metadata and raw texture binary formats
//! - [`reader`] - Memory-mapped, validated readers with codepoint lookup
//! - [`layout`] - Text layout into textured quads
//! - [`error`] - Buffer and format errors

pub mod buffer;
pub mod error;
pub mod formats;
pub mod layout;
pub mod reader;

pub use buffer::{GrowableBuffer, TypedBuffer};
pub use error::{BufferError, FormatError};
pub use layout::{GlyphLookup, TextQuad, layout_text, measure_text};
pub use reader::{PackedFontData, RawTexture};

// Re-export commonly used format items
pub use formats::{
    BinarySerializable,
    GlyphMetadata,
    // Constants
    PACKED_FONT_SIGNATURE,
    PackedFontHeader,
    RAW_TEXTURE_SIGNATURE,
    RawTextureHeader,
    denormalize_coord,
    normalize_coord,
};
