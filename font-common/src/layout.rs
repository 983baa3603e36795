//! Text layout against a packed font
//!
//! Turns a string into one screen-space quad per character, with texture
//! coordinates taken straight from the glyph records. Positions are in
//! pixels with y growing upwards, so lines move down by the (negative)
//! `advance_y`.

use crate::formats::GlyphMetadata;
use crate::reader::PackedFontData;

/// Codepoint to glyph resolution
///
/// Implementations must return the placeholder glyph (index 0) for
/// codepoints they do not store.
pub trait GlyphLookup {
    fn glyph(&self, codepoint: u32) -> &GlyphMetadata;
}

impl<B: AsRef<[u8]>> GlyphLookup for PackedFontData<B> {
    fn glyph(&self, codepoint: u32) -> &GlyphMetadata {
        self.glyph_for(codepoint)
    }
}

/// Screen rectangle and normalized texture rectangle for one character
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextQuad {
    pub left: i32,
    pub right: i32,
    pub down: i32,
    pub up: i32,
    pub tex_left: u16,
    pub tex_right: u16,
    pub tex_down: u16,
    pub tex_up: u16,
}

impl TextQuad {
    /// Quad for `glyph` with its origin at (`x`, `y`)
    pub fn place(glyph: &GlyphMetadata, x: i32, y: i32) -> Self {
        let left = x + i32::from(glyph.offset_x);
        let down = y + i32::from(glyph.offset_y);
        Self {
            left,
            right: left + i32::from(glyph.width),
            down,
            up: down + i32::from(glyph.height),
            tex_left: glyph.tex_left,
            tex_right: glyph.tex_right,
            tex_down: glyph.tex_bottom,
            tex_up: glyph.tex_top,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.left == self.right || self.down == self.up
    }
}

/// Lay out `text` starting at `origin`
///
/// Every character except `'\n'` yields a quad (whitespace yields an
/// empty one). The pen moves right by `advance_x`; a newline returns it to
/// `origin.0` and applies the line advance.
pub fn layout_text<L: GlyphLookup + ?Sized>(
    lookup: &L,
    text: &str,
    origin: (i32, i32),
) -> Vec<TextQuad> {
    let line_advance = i32::from(lookup.glyph(0).advance_y);
    let (mut x, mut y) = origin;
    let mut quads = Vec::with_capacity(text.len());

    for c in text.chars() {
        if c == '\n' {
            x = origin.0;
            y += line_advance;
            continue;
        }
        let glyph = lookup.glyph(c as u32);
        quads.push(TextQuad::place(glyph, x, y));
        x += i32::from(glyph.advance_x);
    }
    quads
}

/// Width of the widest line and number of lines
pub fn measure_text<L: GlyphLookup + ?Sized>(lookup: &L, text: &str) -> (i32, usize) {
    text.split('\n').fold((0, 0), |(widest, lines), line| {
        let width = line
            .chars()
            .map(|c| i32::from(lookup.glyph(c as u32).advance_x))
            .sum();
        (widest.max(width), lines + 1)
    })
}
