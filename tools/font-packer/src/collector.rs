//! Glyph bitmap collector
//!
//! Renders every codepoint of a set through an ordered list of faces and
//! accumulates the results in a [`GlyphTable`].

use bytemuck::{Pod, Zeroable};
use font_common::{BufferError, GlyphMetadata, GrowableBuffer, TypedBuffer};
use hashbrown::HashMap;

use crate::codepoints::PLACEHOLDER_CODEPOINT;
use crate::error::PackError;
use crate::rasterizer::{GlyphRasterizer, RasterizedGlyph};

/// Initial pixel buffer reservation per glyph (20×25 px)
const BITMAP_AVERAGE_SIZE: usize = 20 * 25;

/// Placement data for one collected bitmap
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct BitmapRecord {
    pub width: usize,
    pub height: usize,
    /// Bytes per row in the pixel buffer
    pub stride: usize,
    /// `stride * height`
    pub size: usize,
    /// Start of this bitmap in the pixel buffer
    pub offset: usize,
    /// Glyph (and codepoint) this bitmap belongs to
    pub index: usize,
}

/// Collected glyphs, one row per codepoint
///
/// Codepoints, bitmap records and glyph records live in parallel buffers
/// addressed by the same dense index; [`push`](Self::push) is the only way
/// to add a row, so the buffers always have equal length.
pub struct GlyphTable {
    codepoints: TypedBuffer<u32>,
    bitmaps: TypedBuffer<BitmapRecord>,
    glyphs: TypedBuffer<GlyphMetadata>,
    pixels: GrowableBuffer,
    min_bearing_y: i16,
}

fn saturate_i16(value: i32) -> i16 {
    value.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16
}

fn saturate_u16(value: u32) -> u16 {
    value.min(u32::from(u16::MAX)) as u16
}

impl GlyphTable {
    pub fn with_capacity(glyphs: usize) -> Result<Self, BufferError> {
        Ok(Self {
            codepoints: TypedBuffer::new("table codepoints", glyphs)?,
            bitmaps: TypedBuffer::new("bitmap records", glyphs)?,
            glyphs: TypedBuffer::new("glyph records", glyphs)?,
            pixels: GrowableBuffer::new(
                "glyph pixels",
                glyphs.saturating_mul(BITMAP_AVERAGE_SIZE),
            )?,
            min_bearing_y: 0,
        })
    }

    /// Append one rendered glyph for `codepoint`
    ///
    /// On failure every buffer is rolled back to its previous length.
    pub fn push(
        &mut self,
        codepoint: u32,
        glyph: &RasterizedGlyph,
        advance_y: i16,
    ) -> Result<usize, BufferError> {
        let index = self.bitmaps.len();
        let width = glyph.width as usize;
        if glyph.stride < width {
            return Err(BufferError::OutOfBounds {
                offset: width,
                len: glyph.stride,
            });
        }
        let size = glyph
            .stride
            .checked_mul(glyph.height as usize)
            .ok_or(BufferError::OutOfMemory {
                requested: usize::MAX,
            })?;
        let pixels = glyph.pixels.get(..size).ok_or(BufferError::OutOfBounds {
            offset: size,
            len: glyph.pixels.len(),
        })?;

        let record = BitmapRecord {
            width,
            height: glyph.height as usize,
            stride: glyph.stride,
            size,
            offset: self.pixels.len(),
            index,
        };
        let metadata = GlyphMetadata {
            offset_x: saturate_i16(glyph.bearing_x),
            offset_y: saturate_i16(glyph.bearing_y - glyph.height as i32),
            advance_x: saturate_i16(glyph.advance_x),
            advance_y,
            width: saturate_u16(glyph.width),
            height: saturate_u16(glyph.height),
            ..GlyphMetadata::default()
        };

        self.bitmaps.push(record)?;
        if let Err(e) = self.glyphs.push(metadata) {
            self.bitmaps.forget_last(1);
            return Err(e);
        }
        if let Err(e) = self.pixels.append(pixels) {
            self.glyphs.forget_last(1);
            self.bitmaps.forget_last(1);
            return Err(e);
        }
        if let Err(e) = self.codepoints.push(codepoint) {
            self.pixels.forget_last(size);
            self.glyphs.forget_last(1);
            self.bitmaps.forget_last(1);
            return Err(e);
        }

        // Named min_bearing_y in the file format, but tracks the maximum
        self.min_bearing_y = self.min_bearing_y.max(saturate_i16(glyph.bearing_y));
        Ok(index)
    }

    pub fn len(&self) -> usize {
        self.bitmaps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bitmaps.is_empty()
    }

    pub fn codepoints(&self) -> &[u32] {
        self.codepoints.as_slice()
    }

    pub fn bitmaps(&self) -> &[BitmapRecord] {
        self.bitmaps.as_slice()
    }

    pub fn glyphs(&self) -> &[GlyphMetadata] {
        self.glyphs.as_slice()
    }

    pub fn glyphs_mut(&mut self) -> &mut [GlyphMetadata] {
        self.glyphs.as_mut_slice()
    }

    /// Pixel rows of one collected bitmap
    pub fn bitmap_pixels(&self, record: &BitmapRecord) -> &[u8] {
        &self.pixels.as_bytes()[record.offset..record.offset + record.size]
    }

    /// Largest bearing above the baseline seen so far (starts at 0)
    pub fn min_bearing_y(&self) -> i16 {
        self.min_bearing_y
    }
}

impl std::fmt::Debug for GlyphTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlyphTable")
            .field("len", &self.len())
            .field("pixel_bytes", &self.pixels.len())
            .field("min_bearing_y", &self.min_bearing_y)
            .finish_non_exhaustive()
    }
}

/// Summary over all collected bitmaps
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BitmapStats {
    /// Sum of bitmap heights (glyphs stacked, no padding)
    pub total_height: usize,
    pub max_width: usize,
}

impl BitmapStats {
    pub fn of(bitmaps: &[BitmapRecord]) -> Self {
        bitmaps.iter().fold(Self::default(), |stats, b| Self {
            total_height: stats.total_height + b.height,
            max_width: stats.max_width.max(b.width),
        })
    }
}

fn first_face_with<'a>(
    faces: &'a [Box<dyn GlyphRasterizer>],
    codepoint: u32,
) -> Option<&'a dyn GlyphRasterizer> {
    let face = faces.iter().find(|face| face.has_glyph(codepoint));
    match face {
        Some(face) => tracing::trace!("U+{:04X} found in {}", codepoint, face.name()),
        None => tracing::debug!("No provided font can display U+{:04X}", codepoint),
    }
    face.map(|face| face.as_ref())
}

/// Render every codepoint through `faces`, first match wins
///
/// A codepoint no face can render (or whose rendering fails) gets the
/// placeholder glyph of the first face providing one. With no placeholder
/// available the run fails with [`PackError::MissingGlyph`].
pub fn collect_glyphs(
    faces: &[Box<dyn GlyphRasterizer>],
    codepoints: &[u32],
) -> Result<GlyphTable, PackError> {
    // Uniform line advance, from the tallest face
    let max_height = faces.iter().map(|f| f.line_height()).max().unwrap_or(0);
    let advance_y = saturate_i16(-max_height);

    let mut table = GlyphTable::with_capacity(codepoints.len())?;
    let mut per_face: HashMap<&str, usize> = HashMap::new();

    for &codepoint in codepoints {
        let rendered = first_face_with(faces, codepoint)
            .and_then(|face| face.rasterize(codepoint).map(|glyph| (face, glyph)));

        let (face, glyph) = match rendered {
            Some(found) => found,
            None => {
                tracing::warn!(
                    "Using the placeholder glyph for U+{:04X}",
                    codepoint
                );
                first_face_with(faces, PLACEHOLDER_CODEPOINT)
                    .and_then(|face| {
                        face.rasterize(PLACEHOLDER_CODEPOINT)
                            .map(|glyph| (face, glyph))
                    })
                    .ok_or(PackError::MissingGlyph { codepoint })?
            }
        };

        table
            .push(codepoint, &glyph, advance_y)
            .map_err(|e| match e {
                BufferError::OutOfBounds { .. } => PackError::InvalidBitmap {
                    codepoint,
                    source: e,
                },
                other => other.into(),
            })?;
        *per_face.entry(face.name()).or_default() += 1;
        tracing::debug!(
            "U+{:04X}: {}x{} bearing ({}, {}) advance {}",
            codepoint,
            glyph.width,
            glyph.height,
            glyph.bearing_x,
            glyph.bearing_y,
            glyph.advance_x
        );
        if tracing::enabled!(tracing::Level::TRACE) {
            tracing::trace!("\n{}", ascii_bitmap(&glyph));
        }
    }

    let stats = BitmapStats::of(table.bitmaps());
    tracing::info!(
        "Collected {} glyphs (total height {}, max width {}, min bearing y {})",
        table.len(),
        stats.total_height,
        stats.max_width,
        table.min_bearing_y()
    );
    for (name, count) in &per_face {
        tracing::debug!("  {}: {} glyphs", name, count);
    }

    Ok(table)
}

/// Coverage bitmap as shaded block characters, one line per row
pub fn ascii_bitmap(glyph: &RasterizedGlyph) -> String {
    const SHADES: [char; 5] = [' ', '░', '▒', '▓', '█'];
    let mut out = String::new();
    for row in glyph.pixels.chunks(glyph.stride.max(1)).take(glyph.height as usize) {
        for &value in row.iter().take(glyph.width as usize) {
            out.push(SHADES[(usize::from(value) + 1) / 64]);
        }
        out.push('\n');
    }
    out
}
