//! Packed font binary formats
//!
//! Two files make up a packed font:
//! - the metadata file (`font_pack_meta.dat`), see [`packed_font`]
//! - the raw single-channel atlas (`fonts_bitmap.myyraw`), see [`texture`]
//!
//! All multi-byte fields are little-endian. Every fixed-size header and
//! record implements [`BinarySerializable`].

pub mod packed_font;
mod serialization;
pub mod texture;

pub use packed_font::*;
pub use serialization::BinarySerializable;
pub use texture::*;

/// Round `value` up to a multiple of `align` (a power of two)
pub const fn align_up(value: usize, align: usize) -> usize {
    (value + align - 1) & !(align - 1)
}

/// Zero bytes needed after `value` to reach the next multiple of `align`
pub const fn padding_for(value: usize, align: usize) -> usize {
    align_up(value, align) - value
}

/// Largest normalized texture coordinate (1.0 in 16-bit fixed point)
pub const NORMALIZED_MAX: u16 = u16::MAX;

/// Convert a pixel coordinate to 16-bit fixed point along an axis of `axis_size` pixels
///
/// Rounds to nearest. Coordinates past the axis clamp to [`NORMALIZED_MAX`].
pub fn normalize_coord(pixel: u32, axis_size: u32) -> u16 {
    if axis_size == 0 {
        return 0;
    }
    let scaled = (u64::from(pixel) * u64::from(NORMALIZED_MAX) + u64::from(axis_size) / 2)
        / u64::from(axis_size);
    scaled.min(u64::from(NORMALIZED_MAX)) as u16
}

/// Inverse of [`normalize_coord`], rounding to the nearest pixel
pub fn denormalize_coord(value: u16, axis_size: u32) -> u32 {
    let max = u64::from(NORMALIZED_MAX);
    ((u64::from(value) * u64::from(axis_size) + max / 2) / max) as u32
}
