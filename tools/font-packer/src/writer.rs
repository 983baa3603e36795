//! Packed font and raw texture writers
//!
//! Section offsets are computed up front, so the header is written once with
//! its final values and the output never needs to seek back.

use std::io::{self, Write};

use font_common::formats::{
    FILENAME_ENTRY_HEADER_SIZE, SECTION_ALIGNMENT, align_up, filename_stored_size,
    texture_filenames_section_size,
};
use font_common::{BinarySerializable, GlyphMetadata, PackedFontHeader, RawTextureHeader};

/// Byte offsets of every section in a packed font file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackedFontLayout {
    pub texture_filenames_offset: usize,
    pub codepoints_offset: usize,
    pub glyphdata_offset: usize,
    pub total_size: usize,
}

impl PackedFontLayout {
    /// Layout for `n_codepoints` entries and the given texture names
    ///
    /// Sections follow the header in a fixed order (texture filenames,
    /// codepoints, glyph records), each padded to 16 bytes.
    pub fn compute<S: AsRef<str>>(n_codepoints: usize, texture_filenames: &[S]) -> Self {
        let texture_filenames_offset = PackedFontHeader::SIZE;
        let codepoints_offset = align_up(
            texture_filenames_offset
                + texture_filenames_section_size(texture_filenames_offset, texture_filenames),
            SECTION_ALIGNMENT,
        );
        let glyphdata_offset = align_up(
            codepoints_offset + n_codepoints * size_of::<u32>(),
            SECTION_ALIGNMENT,
        );
        let total_size = align_up(
            glyphdata_offset + n_codepoints * GlyphMetadata::SIZE,
            SECTION_ALIGNMENT,
        );
        Self {
            texture_filenames_offset,
            codepoints_offset,
            glyphdata_offset,
            total_size,
        }
    }
}

fn invalid_input(msg: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, msg)
}

fn to_u32(value: usize, what: &str) -> io::Result<u32> {
    u32::try_from(value).map_err(|_| invalid_input(format!("{what} {value} does not fit in 32 bits")))
}

/// Write one fixed-size header or record
fn write_record<W: Write, T: BinarySerializable>(w: &mut W, record: &T) -> io::Result<()> {
    let bytes = record.serialize();
    debug_assert_eq!(bytes.len(), T::SIZE);
    w.write_all(&bytes)
}

fn write_zeros<W: Write>(w: &mut W, count: usize) -> io::Result<()> {
    const ZEROS: [u8; SECTION_ALIGNMENT] = [0; SECTION_ALIGNMENT];
    let mut left = count;
    while left > 0 {
        let n = left.min(ZEROS.len());
        w.write_all(&ZEROS[..n])?;
        left -= n;
    }
    Ok(())
}

/// Write a complete packed font metadata file
///
/// # Arguments
/// * `w` - Writer to output to
/// * `codepoints` - Ascending, duplicate-free codepoints (placeholder first)
/// * `glyphs` - One record per codepoint, same order
/// * `texture_filenames` - Atlas file names stored for the consumer
/// * `min_bearing_y` - Stored verbatim in the header
///
/// Returns the number of bytes written.
pub fn write_packed_font<W: Write, S: AsRef<str>>(
    w: &mut W,
    codepoints: &[u32],
    glyphs: &[GlyphMetadata],
    texture_filenames: &[S],
    min_bearing_y: i16,
) -> io::Result<usize> {
    if codepoints.len() != glyphs.len() {
        return Err(invalid_input(format!(
            "{} codepoints but {} glyph records",
            codepoints.len(),
            glyphs.len()
        )));
    }

    let layout = PackedFontLayout::compute(codepoints.len(), texture_filenames);
    to_u32(layout.total_size, "file size")?;
    let header = PackedFontHeader::new(
        to_u32(codepoints.len(), "codepoint count")?,
        layout.codepoints_offset as u32,
        layout.glyphdata_offset as u32,
        layout.texture_filenames_offset as u32,
        min_bearing_y,
    );
    write_record(w, &header)?;
    let mut offset = PackedFontHeader::SIZE;

    // Texture filenames
    w.write_all(&to_u32(texture_filenames.len(), "filename count")?.to_le_bytes())?;
    offset += 4;
    for name in texture_filenames {
        let name = name.as_ref().as_bytes();
        let stored = filename_stored_size(offset, name.len());
        w.write_all(&to_u32(stored, "filename size")?.to_le_bytes())?;
        w.write_all(name)?;
        write_zeros(w, stored - name.len())?;
        offset += FILENAME_ENTRY_HEADER_SIZE + stored;
    }
    write_zeros(w, layout.codepoints_offset - offset)?;

    // Codepoints
    for codepoint in codepoints {
        w.write_all(&codepoint.to_le_bytes())?;
    }
    offset = layout.codepoints_offset + codepoints.len() * size_of::<u32>();
    write_zeros(w, layout.glyphdata_offset - offset)?;

    // Glyph records
    for glyph in glyphs {
        write_record(w, glyph)?;
    }
    offset = layout.glyphdata_offset + glyphs.len() * GlyphMetadata::SIZE;
    write_zeros(w, layout.total_size - offset)?;

    tracing::debug!("Packed font layout: {:?}", layout);
    Ok(layout.total_size)
}

/// Write a complete raw texture file (8-bit alpha)
///
/// # Arguments
/// * `w` - Writer to output to
/// * `width` - Atlas width in pixels
/// * `height` - Atlas height in pixels
/// * `pixels` - `width * height` bytes, row after row
pub fn write_raw_texture<W: Write>(
    w: &mut W,
    width: u32,
    height: u32,
    pixels: &[u8],
) -> io::Result<()> {
    let header = RawTextureHeader::alpha8(width, height);
    if pixels.len() != header.pixel_data_size() {
        return Err(invalid_input(format!(
            "{}x{} texture needs {} bytes, got {}",
            width,
            height,
            header.pixel_data_size(),
            pixels.len()
        )));
    }
    write_record(w, &header)?;
    w.write_all(pixels)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use font_common::{PackedFontData, RawTexture};

    fn glyph(width: u16, tex_left: u16) -> GlyphMetadata {
        GlyphMetadata {
            tex_left,
            tex_right: tex_left + 100,
            width,
            height: 12,
            advance_x: width as i16 + 1,
            advance_y: -30,
            ..GlyphMetadata::default()
        }
    }

    #[test]
    fn test_layout_offsets() {
        let layout = PackedFontLayout::compute(3, &["fonts_bitmap.myyraw"]);
        assert_eq!(layout.texture_filenames_offset, 28);
        // count at 28, size at 32, name 36..55 padded to 56
        assert_eq!(layout.codepoints_offset, 64);
        assert_eq!(layout.glyphdata_offset, 80);
        assert_eq!(layout.total_size, 80 + 80);
    }

    #[test]
    fn test_sections_are_aligned() {
        for n in 0..20 {
            for name in ["", "a", "atlas.raw", "a_much_longer_texture_name.myyraw"] {
                let layout = PackedFontLayout::compute(n, &[name]);
                assert_eq!(layout.codepoints_offset % SECTION_ALIGNMENT, 0);
                assert_eq!(layout.glyphdata_offset % SECTION_ALIGNMENT, 0);
                assert_eq!(layout.total_size % SECTION_ALIGNMENT, 0);
            }
        }
    }

    #[test]
    fn test_written_size_matches_layout() {
        let mut out = Vec::new();
        let written = write_packed_font(
            &mut out,
            &[0, 65, 66],
            &[glyph(5, 0), glyph(10, 200), glyph(8, 400)],
            &["fonts_bitmap.myyraw"],
            9,
        )
        .unwrap();
        assert_eq!(written, out.len());
        assert_eq!(out.len(), 160);
    }

    #[test]
    fn test_reader_accepts_written_file() {
        let glyphs = [glyph(5, 0), glyph(10, 200), glyph(8, 400)];
        let mut out = Vec::new();
        write_packed_font(&mut out, &[0, 65, 66], &glyphs, &["fonts_bitmap.myyraw"], 9).unwrap();

        let font = PackedFontData::from_backing(out).unwrap();
        assert_eq!(font.len(), 3);
        assert_eq!(font.codepoints(), &[0, 65, 66]);
        assert_eq!(font.glyphs(), &glyphs);
        assert_eq!(font.min_bearing_y(), 9);
        assert_eq!(
            font.texture_filenames().collect::<Vec<_>>(),
            vec!["fonts_bitmap.myyraw"]
        );
        assert_eq!(font.lookup(66).width, 8);
        assert_eq!(font.glyph_for(0x2603).width, 5);
    }

    #[test]
    fn test_filename_padding_is_zero() {
        let mut out = Vec::new();
        write_packed_font(&mut out, &[0], &[glyph(1, 0)], &["abc"], 0).unwrap();
        // size field at 32 counts the name plus padding to offset 40
        assert_eq!(&out[32..36], &4u32.to_le_bytes());
        assert_eq!(&out[36..39], b"abc");
        assert!(out[39..48].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_mismatched_lengths_rejected() {
        let mut out = Vec::new();
        let err = write_packed_font(&mut out, &[0, 1], &[glyph(1, 0)], &["a"], 0).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert!(out.is_empty());
    }

    #[test]
    fn test_raw_texture() {
        let pixels: Vec<u8> = (0..32u8).collect();
        let mut out = Vec::new();
        write_raw_texture(&mut out, 8, 4, &pixels).unwrap();
        assert_eq!(out.len(), RawTextureHeader::SIZE + 32);

        let texture = RawTexture::from_backing(out).unwrap();
        assert_eq!((texture.width(), texture.height()), (8, 4));
        assert_eq!(texture.pixels(), pixels.as_slice());
        assert_eq!(texture.pixel(1, 2), Some(17));

        let mut short = Vec::new();
        assert!(write_raw_texture(&mut short, 8, 4, &pixels[..31]).is_err());
    }
}
