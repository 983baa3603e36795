//! Binary serialization trait for format headers and records.
//!
//! Each header keeps its own `to_bytes()` returning a fixed-size array; the
//! trait gives generic code a single interface: the packed font readers parse
//! headers through it and the packer writes every header and record with it.

/// Trait for binary-serializable format headers.
///
/// The trait uses `Vec<u8>` for the return type because associated const
/// generics in return types (`[u8; Self::SIZE]`) are not yet stable in Rust.
///
/// # Example
///
/// ```
/// use font_common::formats::{BinarySerializable, RawTextureHeader};
///
/// let header = RawTextureHeader::alpha8(64, 64);
///
/// // Using the trait (returns Vec<u8>)
/// let bytes = header.serialize();
/// let parsed = RawTextureHeader::deserialize(&bytes).unwrap();
/// assert_eq!(parsed.width, 64);
///
/// // Using the type-specific method (returns [u8; 32])
/// let bytes_array = header.to_bytes();
/// assert_eq!(bytes_array.len(), RawTextureHeader::SIZE);
/// ```
pub trait BinarySerializable: Sized {
    /// Size of the serialized form in bytes.
    const SIZE: usize;

    /// Serialize to bytes.
    fn serialize(&self) -> Vec<u8>;

    /// Deserialize from bytes.
    ///
    /// Returns `None` if the byte slice is too short.
    fn deserialize(bytes: &[u8]) -> Option<Self>;
}

impl BinarySerializable for super::PackedFontHeader {
    const SIZE: usize = Self::SIZE;

    fn serialize(&self) -> Vec<u8> {
        self.to_bytes().to_vec()
    }

    fn deserialize(bytes: &[u8]) -> Option<Self> {
        Self::from_bytes(bytes)
    }
}

impl BinarySerializable for super::GlyphMetadata {
    const SIZE: usize = Self::SIZE;

    fn serialize(&self) -> Vec<u8> {
        self.to_bytes().to_vec()
    }

    fn deserialize(bytes: &[u8]) -> Option<Self> {
        Self::from_bytes(bytes)
    }
}

impl BinarySerializable for super::RawTextureHeader {
    const SIZE: usize = Self::SIZE;

    fn serialize(&self) -> Vec<u8> {
        self.to_bytes().to_vec()
    }

    fn deserialize(bytes: &[u8]) -> Option<Self> {
        Self::from_bytes(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::{GlyphMetadata, PackedFontHeader, RawTextureHeader};

    #[test]
    fn test_packed_font_header_trait() {
        let header = PackedFontHeader::new(3, 48, 64, 28, 15);
        let bytes = header.serialize();
        assert_eq!(bytes.len(), PackedFontHeader::SIZE);
        assert_eq!(<PackedFontHeader as BinarySerializable>::SIZE, 28);

        let parsed = PackedFontHeader::deserialize(&bytes).unwrap();
        assert_eq!(parsed, header);
    }

    #[test]
    fn test_glyph_metadata_trait() {
        let glyph = GlyphMetadata {
            tex_left: 1,
            tex_right: 11,
            offset_y: -3,
            advance_y: -31,
            width: 10,
            height: 12,
            ..GlyphMetadata::default()
        };
        let bytes = glyph.serialize();
        assert_eq!(<GlyphMetadata as BinarySerializable>::SIZE, 24);
        assert_eq!(GlyphMetadata::deserialize(&bytes).unwrap(), glyph);
    }

    #[test]
    fn test_raw_texture_header_trait() {
        let header = RawTextureHeader::alpha8(32, 128);
        let bytes = header.serialize();
        assert_eq!(<RawTextureHeader as BinarySerializable>::SIZE, 32);
        assert_eq!(RawTextureHeader::deserialize(&bytes).unwrap(), header);
    }

    #[test]
    fn test_deserialize_short_input() {
        assert!(PackedFontHeader::deserialize(&[0; 27]).is_none());
        assert!(GlyphMetadata::deserialize(&[0; 23]).is_none());
        assert!(RawTextureHeader::deserialize(&[0; 31]).is_none());
    }
}
