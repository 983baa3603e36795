//! Raw atlas texture format (.myyraw)
//!
//! Single-channel 8-bit texture, uploaded as-is by the consumer.
//!
//! # Layout
//! ```text
//! 0x00: signature u32 ("MYYT")
//! 0x04: width u32
//! 0x08: height u32
//! 0x0C: target u32        (GL_TEXTURE_2D)
//! 0x10: pixel_format u32  (GL_ALPHA)
//! 0x14: pixel_type u32    (GL_UNSIGNED_BYTE)
//! 0x18: row_alignment u32 (4)
//! 0x1C: reserved u32
//! 0x20: pixel_data (width × height bytes, row 0 first)
//! ```

use crate::error::FormatError;

/// "MYYT" read as a little-endian u32
pub const RAW_TEXTURE_SIGNATURE: u32 = 0x5459594d;

pub const GL_TEXTURE_2D: u32 = 0x0DE1;
pub const GL_ALPHA: u32 = 0x1906;
pub const GL_UNSIGNED_BYTE: u32 = 0x1401;

/// Upload row alignment stored with alpha atlases
pub const DEFAULT_ROW_ALIGNMENT: u32 = 4;

/// Raw texture header (32 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct RawTextureHeader {
    pub signature: u32,
    pub width: u32,
    pub height: u32,
    pub target: u32,
    pub pixel_format: u32,
    pub pixel_type: u32,
    pub row_alignment: u32,
    pub reserved: u32,
}

impl RawTextureHeader {
    pub const SIZE: usize = 32;

    /// Header for a single-channel 8-bit atlas
    pub fn alpha8(width: u32, height: u32) -> Self {
        Self {
            signature: RAW_TEXTURE_SIGNATURE,
            width,
            height,
            target: GL_TEXTURE_2D,
            pixel_format: GL_ALPHA,
            pixel_type: GL_UNSIGNED_BYTE,
            row_alignment: DEFAULT_ROW_ALIGNMENT,
            reserved: 0,
        }
    }

    /// Pixel payload size (1 byte per pixel)
    pub fn pixel_data_size(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Write header to bytes
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let fields = [
            self.signature,
            self.width,
            self.height,
            self.target,
            self.pixel_format,
            self.pixel_type,
            self.row_alignment,
            self.reserved,
        ];
        let mut bytes = [0u8; Self::SIZE];
        for (chunk, field) in bytes.chunks_exact_mut(4).zip(fields) {
            chunk.copy_from_slice(&field.to_le_bytes());
        }
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
            width: u32_at(4),
            height: u32_at(8),
            target: u32_at(12),
            pixel_format: u32_at(16),
            pixel_type: u32_at(20),
            row_alignment: u32_at(24),
            reserved: u32_at(28),
        })
    }

    pub fn validate(&self) -> Result<(), FormatError> {
        if self.signature != RAW_TEXTURE_SIGNATURE {
            return Err(FormatError::BadSignature {
                expected: RAW_TEXTURE_SIGNATURE,
                found: self.signature,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_size() {
        assert_eq!(RawTextureHeader::SIZE, 32);
    }

    #[test]
    fn test_signature_spells_myyt() {
        assert_eq!(&RAW_TEXTURE_SIGNATURE.to_le_bytes(), b"MYYT");
    }

    #[test]
    fn test_header_parsing() {
        let data = [
            b'M', b'Y', b'Y', b'T', // signature
            0x40, 0x00, 0x00, 0x00, // width = 64
            0x00, 0x01, 0x00, 0x00, // height = 256
            0xE1, 0x0D, 0x00, 0x00, // GL_TEXTURE_2D
            0x06, 0x19, 0x00, 0x00, // GL_ALPHA
            0x01, 0x14, 0x00, 0x00, // GL_UNSIGNED_BYTE
            0x04, 0x00, 0x00, 0x00, // alignment
            0x00, 0x00, 0x00, 0x00, // reserved
        ];

        let header = RawTextureHeader::from_bytes(&data).unwrap();
        assert_eq!(header, RawTextureHeader::alpha8(64, 256));
        assert!(header.validate().is_ok());
        assert_eq!(header.to_bytes(), data);
    }

    #[test]
    fn test_pixel_data_size() {
        let header = RawTextureHeader::alpha8(32, 64);
        assert_eq!(header.pixel_data_size(), 2048);
    }

    #[test]
    fn test_validate_rejects_font_signature() {
        let mut header = RawTextureHeader::alpha8(1, 1);
        header.signature = crate::formats::PACKED_FONT_SIGNATURE;
        assert!(header.validate().is_err());
    }
}
