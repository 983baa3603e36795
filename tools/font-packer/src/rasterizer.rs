//! Glyph rasterization
//!
//! The packer only needs coverage bitmaps and metrics; anything able to
//! produce them implements [`GlyphRasterizer`]. [`FontdueFace`] is the
//! outline-font implementation used by the CLI.

use std::path::Path;

use fontdue::{Font, FontSettings};

use crate::codepoints::PLACEHOLDER_CODEPOINT;
use crate::error::PackError;

/// One rendered glyph: 8-bit coverage rows plus layout metrics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterizedGlyph {
    pub width: u32,
    pub height: u32,
    /// Bytes per row in `pixels` (at least `width`)
    pub stride: usize,
    /// `stride * height` bytes, first row at the top of the glyph
    pub pixels: Vec<u8>,
    /// Origin to the left edge of the bitmap
    pub bearing_x: i32,
    /// Baseline to the top edge of the bitmap
    pub bearing_y: i32,
    pub advance_x: i32,
}

/// A font face able to render glyph bitmaps
pub trait GlyphRasterizer {
    /// Name used in logs
    fn name(&self) -> &str;

    /// True if the face has a glyph for `codepoint`
    ///
    /// Codepoint 0 asks for the face's "missing glyph".
    fn has_glyph(&self, codepoint: u32) -> bool;

    /// Render `codepoint`, or `None` if the face fails to
    fn rasterize(&self, codepoint: u32) -> Option<RasterizedGlyph>;

    /// Baseline-to-baseline distance in pixels
    fn line_height(&self) -> i32;
}

/// Outline font face rendered with fontdue
pub struct FontdueFace {
    name: String,
    font: Font,
    px: f32,
}

impl FontdueFace {
    pub fn from_bytes(name: impl Into<String>, data: &[u8], px: f32) -> Result<Self, String> {
        let settings = FontSettings {
            scale: px,
            ..FontSettings::default()
        };
        let font = Font::from_bytes(data, settings)?;
        let name = font
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| name.into());
        Ok(Self { name, font, px })
    }

    /// Load a TrueType/OpenType file
    pub fn from_file(path: &Path, px: f32) -> Result<Self, PackError> {
        let data = std::fs::read(path).map_err(|source| PackError::ReadInput {
            path: path.to_path_buf(),
            source,
        })?;
        let fallback_name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let face =
            Self::from_bytes(fallback_name, &data, px).map_err(|reason| PackError::FontLoad {
                path: path.to_path_buf(),
                reason,
            })?;
        tracing::info!(
            "Loaded font {:?} ({}, {} glyphs) at {:.2}px",
            path,
            face.name,
            face.font.glyph_count(),
            px
        );
        Ok(face)
    }

    fn glyph_index(&self, codepoint: u32) -> Option<u16> {
        if codepoint == PLACEHOLDER_CODEPOINT {
            // Glyph 0 is .notdef in every TrueType/OpenType font
            return Some(0);
        }
        let index = char::from_u32(codepoint).map(|c| self.font.lookup_glyph_index(c))?;
        (index != 0).then_some(index)
    }
}

/// Whole pixels from a float font metric, clamped to the `i32` range
///
/// Non-finite metrics from a broken font become 0 (NaN) or the nearest bound.
fn metric_to_i32(value: f32) -> i32 {
    if value.is_nan() {
        return 0;
    }
    // i32::MAX rounds up to 2^31 as f32; the final cast saturates it back
    value.clamp(i32::MIN as f32, i32::MAX as f32) as i32
}

impl GlyphRasterizer for FontdueFace {
    fn name(&self) -> &str {
        &self.name
    }

    fn has_glyph(&self, codepoint: u32) -> bool {
        self.glyph_index(codepoint).is_some()
    }

    fn rasterize(&self, codepoint: u32) -> Option<RasterizedGlyph> {
        let index = self.glyph_index(codepoint)?;
        let (metrics, pixels) = self.font.rasterize_indexed(index, self.px);
        let width = u32::try_from(metrics.width).ok()?;
        let height = u32::try_from(metrics.height).ok()?;
        Some(RasterizedGlyph {
            width,
            height,
            stride: metrics.width,
            pixels,
            bearing_x: metrics.xmin,
            bearing_y: metrics
                .ymin
                .saturating_add(i32::try_from(height).unwrap_or(i32::MAX)),
            advance_x: metric_to_i32(metrics.advance_width.round()),
        })
    }

    fn line_height(&self) -> i32 {
        self.font
            .horizontal_line_metrics(self.px)
            .map(|m| metric_to_i32(m.new_line_size.ceil()))
            .unwrap_or(metric_to_i32(self.px.ceil()))
    }
}
