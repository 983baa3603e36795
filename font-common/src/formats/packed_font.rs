//! Packed font metadata format (font_pack_meta.dat)
//!
//! Codepoint index and per-glyph layout data for a glyph atlas.
//!
//! # Layout
//! ```text
//! 0x00: PackedFontHeader (28 bytes)
//!       texture filenames section   (at texture_filenames_offset)
//!         n_filenames u32
//!         per filename: size u32, name bytes, zero padding
//!           (size counts name + padding; the offset after the
//!            padding is 8-byte aligned)
//!         zero padding to 16 bytes
//!       codepoints section          (at codepoints_offset)
//!         n_stored_codepoints × u32, ascending, zero padding to 16 bytes
//!       glyph section               (at glyphdata_offset)
//!         n_stored_codepoints × GlyphMetadata (24 bytes), zero padding to 16 bytes
//! ```
//!
//! Glyph `i` describes codepoint `i`. Index 0 is always the placeholder
//! ("missing glyph") used for codepoints absent from the set.

use bytemuck::{Pod, Zeroable};

use crate::error::FormatError;

/// "MYYF" read as a little-endian u32
pub const PACKED_FONT_SIGNATURE: u32 = 0x4659594d;

/// Alignment of every top-level section
pub const SECTION_ALIGNMENT: usize = 16;

/// Alignment of the offset following each stored filename
pub const FILENAME_ALIGNMENT: usize = 8;

/// Size of `n_filenames`
pub const FILENAMES_SECTION_HEADER_SIZE: usize = 4;

/// Size of the per-filename `size` prefix
pub const FILENAME_ENTRY_HEADER_SIZE: usize = 4;

/// Packed font header (28 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct PackedFontHeader {
    pub signature: u32,
    pub n_stored_codepoints: u32,
    pub codepoints_offset: u32,
    pub glyphdata_offset: u32,
    pub texture_filenames_offset: u32,
    /// Running maximum of glyph bearings above the baseline
    pub min_bearing_y: i16,
    pub padding: u16,
    pub unused: u32,
}

impl PackedFontHeader {
    pub const SIZE: usize = 28;

    pub fn new(
        n_stored_codepoints: u32,
        codepoints_offset: u32,
        glyphdata_offset: u32,
        texture_filenames_offset: u32,
        min_bearing_y: i16,
    ) -> Self {
        Self {
            signature: PACKED_FONT_SIGNATURE,
            n_stored_codepoints,
            codepoints_offset,
            glyphdata_offset,
            texture_filenames_offset,
            min_bearing_y,
            padding: 0,
            unused: 0,
        }
    }

    /// Write header to bytes
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..4].copy_from_slice(&self.signature.to_le_bytes());
        bytes[4..8].copy_from_slice(&self.n_stored_codepoints.to_le_bytes());
        bytes[8..12].copy_from_slice(&self.codepoints_offset.to_le_bytes());
        bytes[12..16].copy_from_slice(&self.glyphdata_offset.to_le_bytes());
        bytes[16..20].copy_from_slice(&self.texture_filenames_offset.to_le_bytes());
        bytes[20..22].copy_from_slice(&self.min_bearing_y.to_le_bytes());
        bytes[22..24].copy_from_slice(&self.padding.to_le_bytes());
        bytes[24..28].copy_from_slice(&self.unused.to_le_bytes());
        bytes
    }

    /// Read header from bytes
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE {
            return None;
        }
        let u32_at = |at: usize| {
            u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
        };
        Some(Self {
            signature: u32_at(0),
            n_stored_codepoints: u32_at(4),
            codepoints_offset: u32_at(8),
            glyphdata_offset: u32_at(12),
            texture_filenames_offset: u32_at(16),
            min_bearing_y: i16::from_le_bytes([bytes[20], bytes[21]]),
            padding: u16::from_le_bytes([bytes[22], bytes[23]]),
            unused: u32_at(24),
        })
    }

    /// Check the signature before trusting any offset
    pub fn validate(&self) -> Result<(), FormatError> {
        if self.signature != PACKED_FONT_SIGNATURE {
            return Err(FormatError::BadSignature {
                expected: PACKED_FONT_SIGNATURE,
                found: self.signature,
            });
        }
        if self.n_stored_codepoints == 0 {
            return Err(FormatError::Empty);
        }
        Ok(())
    }
}

/// Per-glyph layout record (24 bytes)
///
/// Before packing the texture rectangle is in atlas pixels; in a written
/// file it is normalized 16-bit fixed point (0 = left/bottom edge,
/// 65535 = right/top edge).
///
/// The in-memory layout matches the file layout on little-endian targets,
/// which is what lets [`PackedFontData`](crate::PackedFontData) hand out
/// record slices straight from the mapping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct GlyphMetadata {
    pub tex_left: u16,
    pub tex_right: u16,
    pub tex_bottom: u16,
    pub tex_top: u16,
    /// Horizontal bearing (origin to bitmap left edge)
    pub offset_x: i16,
    /// Baseline to bitmap bottom edge (bearing_y - height)
    pub offset_y: i16,
    pub advance_x: i16,
    /// Line advance, negative (lines go down)
    pub advance_y: i16,
    pub width: u16,
    pub height: u16,
    pub reserved: [i16; 2],
}

impl GlyphMetadata {
    pub const SIZE: usize = 24;

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..2].copy_from_slice(&self.tex_left.to_le_bytes());
        bytes[2..4].copy_from_slice(&self.tex_right.to_le_bytes());
        bytes[4..6].copy_from_slice(&self.tex_bottom.to_le_bytes());
        bytes[6..8].copy_from_slice(&self.tex_top.to_le_bytes());
        bytes[8..10].copy_from_slice(&self.offset_x.to_le_bytes());
        bytes[10..12].copy_from_slice(&self.offset_y.to_le_bytes());
        bytes[12..14].copy_from_slice(&self.advance_x.to_le_bytes());
        bytes[14..16].copy_from_slice(&self.advance_y.to_le_bytes());
        bytes[16..18].copy_from_slice(&self.width.to_le_bytes());
        bytes[18..20].copy_from_slice(&self.height.to_le_bytes());
        bytes[20..22].copy_from_slice(&self.reserved[0].to_le_bytes());
        bytes[22..24].copy_from_slice(&self.reserved[1].to_le_bytes());
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE {
            return None;
        }
        let u16_at = |at: usize| u16::from_le_bytes([bytes[at], bytes[at + 1]]);
        let i16_at = |at: usize| i16::from_le_bytes([bytes[at], bytes[at + 1]]);
        Some(Self {
            tex_left: u16_at(0),
            tex_right: u16_at(2),
            tex_bottom: u16_at(4),
            tex_top: u16_at(6),
            offset_x: i16_at(8),
            offset_y: i16_at(10),
            advance_x: i16_at(12),
            advance_y: i16_at(14),
            width: u16_at(16),
            height: u16_at(18),
            reserved: [i16_at(20), i16_at(22)],
        })
    }
}

/// Stored `size` of a filename entry whose `size` field sits at `entry_offset`
///
/// Counts the name plus the zero padding that brings the absolute offset
/// after the name to an 8-byte boundary.
pub const fn filename_stored_size(entry_offset: usize, name_len: usize) -> usize {
    let name_end = entry_offset + FILENAME_ENTRY_HEADER_SIZE + name_len;
    name_len + super::padding_for(name_end, FILENAME_ALIGNMENT)
}

/// Unpadded size of a texture filenames section starting at `section_offset`
pub fn texture_filenames_section_size<S: AsRef<str>>(section_offset: usize, names: &[S]) -> usize {
    let mut offset = section_offset + FILENAMES_SECTION_HEADER_SIZE;
    for name in names {
        offset += FILENAME_ENTRY_HEADER_SIZE + filename_stored_size(offset, name.as_ref().len());
    }
    offset - section_offset
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_size() {
        assert_eq!(PackedFontHeader::SIZE, 28);
        assert_eq!(GlyphMetadata::SIZE, 24);
        assert_eq!(std::mem::size_of::<GlyphMetadata>(), GlyphMetadata::SIZE);
    }

    #[test]
    fn test_signature_spells_myyf() {
        assert_eq!(&PACKED_FONT_SIGNATURE.to_le_bytes(), b"MYYF");
    }

    #[test]
    fn test_header_parsing() {
        let header = PackedFontHeader::new(3, 64, 80, 28, -2);
        let bytes = header.to_bytes();

        assert_eq!(&bytes[0..4], b"MYYF");
        assert_eq!(&bytes[4..8], &[3, 0, 0, 0]);
        assert_eq!(&bytes[20..22], &(-2i16).to_le_bytes());

        let parsed = PackedFontHeader::from_bytes(&bytes).unwrap();
        assert_eq!(parsed.codepoints_offset, 64);
        assert_eq!(parsed.glyphdata_offset, 80);
        assert_eq!(parsed.texture_filenames_offset, 28);
        assert_eq!(parsed.min_bearing_y, -2);
    }

    #[test]
    fn test_header_validate() {
        assert!(PackedFontHeader::new(1, 0, 0, 0, 0).validate().is_ok());

        let mut header = PackedFontHeader::new(1, 0, 0, 0, 0);
        header.signature = 0x5459594d;
        assert!(matches!(
            header.validate(),
            Err(FormatError::BadSignature {
                found: 0x5459594d,
                ..
            })
        ));

        assert!(matches!(
            PackedFontHeader::new(0, 0, 0, 0, 0).validate(),
            Err(FormatError::Empty)
        ));
    }

    #[test]
    fn test_glyph_bytes_match_pod_layout_on_little_endian() {
        let glyph = GlyphMetadata {
            tex_left: 0x0102,
            offset_x: -1,
            advance_y: -30,
            height: 12,
            ..GlyphMetadata::default()
        };
        if cfg!(target_endian = "little") {
            assert_eq!(bytemuck::bytes_of(&glyph), &glyph.to_bytes());
        }
    }

    #[test]
    fn test_filename_stored_size() {
        // Section at 28: n_filenames ends at 32, size field 32..36,
        // 19-byte name ends at 55, padded to 56
        assert_eq!(filename_stored_size(32, "fonts_bitmap.myyraw".len()), 20);
        // Already aligned: 4 + 4 bytes from 0
        assert_eq!(filename_stored_size(0, 4), 4);
    }

    #[test]
    fn test_texture_filenames_section_size() {
        assert_eq!(texture_filenames_section_size(28, &["fonts_bitmap.myyraw"]), 28);
        assert_eq!(texture_filenames_section_size::<&str>(28, &[]), 4);
        // "abcd" ends at 12, padded to 16; "b" ends at 21, padded to 24
        assert_eq!(texture_filenames_section_size(0, &["abcd", "b"]), 24);
    }
}
