//! font-packer library
//!
//! Rasterizes a character list with one or more outline fonts, packs the
//! glyphs into a single-channel atlas and writes the packed font files read
//! by `font-common`.

pub mod atlas;
pub mod codepoints;
pub mod collector;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod rasterizer;
pub mod writer;

pub use atlas::{Atlas, AtlasLayout, AtlasParams, Placement, pack_atlas, plan_atlas};
pub use codepoints::{CodepointSet, PLACEHOLDER_CODEPOINT};
pub use collector::{BitmapRecord, BitmapStats, GlyphTable, collect_glyphs};
pub use config::PackerConfig;
pub use error::{ErrorCategory, PackError};
pub use pipeline::{PackReport, pack_fonts, pack_with_faces};
pub use rasterizer::{FontdueFace, GlyphRasterizer, RasterizedGlyph};
pub use writer::{PackedFontLayout, write_packed_font, write_raw_texture};
