//! Shelf atlas packer
//!
//! Glyphs are sorted by width and laid out left to right on shelves. A shelf
//! is as tall as its tallest glyph; when the next glyph does not fit the
//! remaining width a new shelf starts above the previous one. Every glyph
//! keeps `padding` empty pixels on each side so bilinear sampling never
//! bleeds into a neighbour.

use font_common::{GrowableBuffer, normalize_coord};

use crate::collector::{BitmapRecord, BitmapStats, GlyphTable};
use crate::error::PackError;

/// Height of one atlas column: glyphs stacked higher than this double the width
const COLUMN_HEIGHT: u64 = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtlasParams {
    pub padding: u32,
    /// Atlas width before doubling
    pub column_width: u32,
    /// Cap on both dimensions
    pub max_size: u32,
}

impl Default for AtlasParams {
    fn default() -> Self {
        Self {
            padding: 1,
            column_width: 32,
            max_size: 4096,
        }
    }
}

/// Pixel position of one glyph's top-left corner (padding excluded)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    /// Glyph index in the table
    pub index: usize,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Result of the layout pass, before any pixel is copied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtlasLayout {
    pub width: u32,
    /// Power of two covering `used_height`
    pub height: u32,
    /// Rows actually reached by the last shelf, trailing padding included
    pub used_height: u32,
    /// In packing order (narrowest glyph first)
    pub placements: Vec<Placement>,
}

/// Packed single-channel atlas
pub struct Atlas {
    width: u32,
    height: u32,
    pixels: GrowableBuffer,
}

impl Atlas {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// `width * height` bytes, row after row
    pub fn pixels(&self) -> &[u8] {
        self.pixels.as_bytes()
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = y as usize * self.width as usize + x as usize;
        self.pixels().get(offset).copied()
    }
}

impl std::fmt::Debug for Atlas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Atlas")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

fn overflow(width: u64, height: u64, max: u32) -> PackError {
    PackError::AtlasOverflow {
        width: width.min(u64::from(u32::MAX)) as u32,
        height: height.min(u64::from(u32::MAX)) as u32,
        max,
    }
}

/// Atlas width: one base column, doubled for every full column height the
/// stacked glyphs need
fn atlas_width(stats: &BitmapStats, params: &AtlasParams) -> Result<u32, PackError> {
    let extent = stats.max_width as u64 + stats.total_height as u64 + 2 * u64::from(params.padding);
    let n_columns = extent / COLUMN_HEIGHT;
    let width = if n_columns < 32 {
        u64::from(params.column_width) << n_columns
    } else {
        u64::MAX
    };
    if width > u64::from(params.max_size) {
        return Err(overflow(width, 0, params.max_size));
    }
    Ok(width as u32)
}

/// Compute every glyph position without touching pixels
pub fn plan_atlas(table: &GlyphTable, params: &AtlasParams) -> Result<AtlasLayout, PackError> {
    let stats = BitmapStats::of(table.bitmaps());
    let width = atlas_width(&stats, params)?;
    let total_width = u64::from(width);
    let padding = u64::from(params.padding);

    // Stable: equal widths keep collection order
    let mut sorted: Vec<BitmapRecord> = table.bitmaps().to_vec();
    sorted.sort_by_key(|record| record.width);

    let mut placements = Vec::with_capacity(sorted.len());
    let mut line_y = padding;
    let mut line_width = 0u64;
    let mut line_max_height = 0u64;

    for record in &sorted {
        let w = record.width as u64;
        let h = record.height as u64;
        let padded = w + 2 * padding;
        if padded > total_width {
            return Err(PackError::GlyphTooWide {
                codepoint: table.codepoints()[record.index],
                width: record.width.min(u32::MAX as usize) as u32,
                atlas_width: width,
            });
        }

        if line_width + padded > total_width {
            line_y += line_max_height + 2 * padding;
            line_width = 0;
            line_max_height = 0;
        }
        let x = line_width + padding;
        let y = line_y;
        line_width += padded;
        line_max_height = line_max_height.max(h);

        if y + h > u64::from(params.max_size) {
            return Err(overflow(total_width, (y + h).next_power_of_two(), params.max_size));
        }
        placements.push(Placement {
            index: record.index,
            x: x as u32,
            y: y as u32,
            width: w as u32,
            height: h as u32,
        });
    }

    let used_height = line_y + line_max_height + padding;
    let height = used_height.next_power_of_two();
    if height > u64::from(params.max_size) {
        return Err(overflow(total_width, height, params.max_size));
    }

    tracing::debug!(
        "Atlas layout: {}x{} ({} rows used) for {} glyphs",
        width,
        height,
        used_height,
        placements.len()
    );
    Ok(AtlasLayout {
        width,
        height: height as u32,
        used_height: used_height as u32,
        placements,
    })
}

/// Copy every bitmap into a zeroed atlas at its planned position
fn blit(table: &GlyphTable, layout: &AtlasLayout) -> Result<Atlas, PackError> {
    let atlas_width = layout.width as usize;
    let size = atlas_width * layout.height as usize;
    let mut pixels = GrowableBuffer::new("atlas pixels", size)?;
    pixels.append_zeroed(size)?;

    let dst = pixels.as_bytes_mut();
    for placement in &layout.placements {
        let record = &table.bitmaps()[placement.index];
        let src = table.bitmap_pixels(record);
        let width = record.width;
        for (row, line) in src.chunks(record.stride.max(1)).take(record.height).enumerate() {
            let start = (placement.y as usize + row) * atlas_width + placement.x as usize;
            dst[start..start + width].copy_from_slice(&line[..width]);
        }
    }

    Ok(Atlas {
        width: layout.width,
        height: layout.height,
        pixels,
    })
}

/// Pack every glyph of `table` into an atlas
///
/// Fills in each glyph's texture rectangle, normalized to 16-bit fixed
/// point against the atlas width and power-of-two height.
pub fn pack_atlas(table: &mut GlyphTable, params: &AtlasParams) -> Result<Atlas, PackError> {
    let layout = plan_atlas(table, params)?;
    let atlas = blit(table, &layout)?;

    let glyphs = table.glyphs_mut();
    for p in &layout.placements {
        let glyph = &mut glyphs[p.index];
        glyph.tex_left = normalize_coord(p.x, layout.width);
        glyph.tex_right = normalize_coord(p.x + p.width, layout.width);
        glyph.tex_bottom = normalize_coord(p.y, layout.height);
        glyph.tex_top = normalize_coord(p.y + p.height, layout.height);
    }

    tracing::info!(
        "Packed {} glyphs into a {}x{} atlas ({} rows used)",
        layout.placements.len(),
        layout.width,
        layout.height,
        layout.used_height
    );
    Ok(atlas)
}
