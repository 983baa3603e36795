//! Memory-mapped packed font and raw texture readers
//!
//! Both readers validate once on open and then hand out zero-copy views
//! borrowed from the backing bytes. Views live as long as the reader.
//! Readers are `Send + Sync` and can be shared between threads; packed
//! font files are write-once, so nothing mutates a file while it is mapped.
//!
//! Record views reinterpret the little-endian file layout in place, so they
//! assume a little-endian target.

use std::fs::File;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use hashbrown::HashMap;
use memmap2::Mmap;

use crate::error::FormatError;
use crate::formats::{
    BinarySerializable, FILENAME_ENTRY_HEADER_SIZE, FILENAMES_SECTION_HEADER_SIZE, GlyphMetadata,
    PackedFontHeader, RawTextureHeader,
};

/// Map a whole file read-only
fn map_file(path: &Path) -> Result<Mmap, FormatError> {
    let io_error = |source| FormatError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(io_error)?;
    // SAFETY: the mapping is read-only and packed assets are never modified
    // in place once written; a concurrent external writer is outside the
    // format's contract.
    let map = unsafe { Mmap::map(&file) }.map_err(io_error)?;
    tracing::debug!("Mapped {:?} ({} bytes)", path, map.len());
    Ok(map)
}

/// Bounds and alignment check for a section of `size` bytes at `offset`
fn check_section(
    bytes: &[u8],
    section: &'static str,
    offset: usize,
    size: usize,
    align: usize,
) -> Result<Range<usize>, FormatError> {
    let end = offset.checked_add(size).unwrap_or(usize::MAX);
    if end > bytes.len() {
        return Err(FormatError::SectionOutOfBounds {
            section,
            start: offset,
            end,
            len: bytes.len(),
        });
    }
    // Checked on the address: offsets are aligned in the file, but a heap
    // backing need not be
    if (bytes.as_ptr() as usize + offset) % align != 0 {
        return Err(FormatError::Misaligned {
            section,
            offset,
            align,
        });
    }
    Ok(offset..end)
}

/// Fixed-size header at the start of `bytes`
fn read_header<T: BinarySerializable>(bytes: &[u8]) -> Result<T, FormatError> {
    T::deserialize(bytes).ok_or(FormatError::TooSmall {
        len: bytes.len(),
        needed: T::SIZE,
    })
}

fn read_u32(bytes: &[u8], at: usize) -> Option<u32> {
    let field = bytes.get(at..at.checked_add(4)?)?;
    Some(u32::from_le_bytes([field[0], field[1], field[2], field[3]]))
}

/// Locate every stored filename (NUL padding excluded)
fn parse_texture_filenames(
    bytes: &[u8],
    section_offset: usize,
) -> Result<Vec<Range<usize>>, FormatError> {
    let out_of_bounds = |start: usize, end: usize| FormatError::SectionOutOfBounds {
        section: "texture filenames",
        start,
        end,
        len: bytes.len(),
    };

    let count = read_u32(bytes, section_offset).ok_or_else(|| {
        out_of_bounds(section_offset, section_offset + FILENAMES_SECTION_HEADER_SIZE)
    })? as usize;

    let mut names = Vec::new();
    let mut cursor = section_offset + FILENAMES_SECTION_HEADER_SIZE;
    for index in 0..count {
        let size = read_u32(bytes, cursor)
            .ok_or_else(|| out_of_bounds(cursor, cursor + FILENAME_ENTRY_HEADER_SIZE))?
            as usize;
        let start = cursor + FILENAME_ENTRY_HEADER_SIZE;
        let end = start.checked_add(size).unwrap_or(usize::MAX);
        let stored = bytes.get(start..end).ok_or_else(|| out_of_bounds(start, end))?;

        let name_len = stored.iter().position(|&b| b == 0).unwrap_or(stored.len());
        if std::str::from_utf8(&stored[..name_len]).is_err() {
            return Err(FormatError::InvalidFilename { index });
        }
        names.push(start..start + name_len);
        cursor = end;
    }
    Ok(names)
}

// ============================================================================
// Packed font metadata
// ============================================================================

/// A validated packed font metadata file
///
/// `B` is the backing storage: a file mapping by default, or any byte
/// container (handy for fonts embedded in a binary or built in memory).
pub struct PackedFontData<B: AsRef<[u8]> = Mmap> {
    backing: B,
    header: PackedFontHeader,
    codepoints: Range<usize>,
    glyphs: Range<usize>,
    filenames: Vec<Range<usize>>,
    index: OnceLock<HashMap<u32, usize>>,
}

impl PackedFontData<Mmap> {
    /// Memory-map and validate a packed font file
    pub fn open(path: impl AsRef<Path>) -> Result<Self, FormatError> {
        let path = path.as_ref();
        let font = Self::from_backing(map_file(path)?)?;
        tracing::info!(
            "Loaded packed font {:?}: {} codepoints, min bearing y {}",
            path,
            font.len(),
            font.min_bearing_y()
        );
        Ok(font)
    }
}

impl<B: AsRef<[u8]>> PackedFontData<B> {
    /// Validate `backing` as a packed font
    ///
    /// Checks the signature first, then that every section lies inside the
    /// file and is aligned for its record type.
    ///
    /// Alignment is checked on the backing's actual addresses, not just the
    /// file offsets, so the backing must start on a 4-byte boundary. An
    /// [`Mmap`] or a [`GrowableBuffer`](crate::GrowableBuffer) (64-byte
    /// aligned) always does; a plain `Vec<u8>` usually does but is not
    /// guaranteed to, and is reported as [`FormatError::Misaligned`].
    pub fn from_backing(backing: B) -> Result<Self, FormatError> {
        let bytes = backing.as_ref();
        let header: PackedFontHeader = read_header(bytes)?;
        header.validate()?;

        let n = header.n_stored_codepoints as usize;
        let codepoints = check_section(
            bytes,
            "codepoints",
            header.codepoints_offset as usize,
            n.saturating_mul(size_of::<u32>()),
            align_of::<u32>(),
        )?;
        let glyphs = check_section(
            bytes,
            "glyph",
            header.glyphdata_offset as usize,
            n.saturating_mul(GlyphMetadata::SIZE),
            align_of::<GlyphMetadata>(),
        )?;
        let filenames = parse_texture_filenames(bytes, header.texture_filenames_offset as usize)?;

        tracing::debug!(
            "Packed font header: {} codepoints at {}, glyphs at {}, texture names at {}",
            n,
            header.codepoints_offset,
            header.glyphdata_offset,
            header.texture_filenames_offset
        );

        Ok(Self {
            backing,
            header,
            codepoints,
            glyphs,
            filenames,
            index: OnceLock::new(),
        })
    }

    pub fn header(&self) -> &PackedFontHeader {
        &self.header
    }

    /// Number of stored codepoints (and glyphs)
    pub fn len(&self) -> usize {
        self.header.n_stored_codepoints as usize
    }

    /// Always false for a validated file
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn min_bearing_y(&self) -> i16 {
        self.header.min_bearing_y
    }

    /// Stored codepoints, ascending
    pub fn codepoints(&self) -> &[u32] {
        bytemuck::cast_slice(&self.backing.as_ref()[self.codepoints.clone()])
    }

    /// Glyph records, same order as [`codepoints`](Self::codepoints)
    pub fn glyphs(&self) -> &[GlyphMetadata] {
        bytemuck::cast_slice(&self.backing.as_ref()[self.glyphs.clone()])
    }

    /// The "missing glyph" record at index 0
    pub fn placeholder(&self) -> &GlyphMetadata {
        &self.glyphs()[0]
    }

    /// Names of the atlas textures this font refers to
    pub fn texture_filenames(&self) -> impl Iterator<Item = &str> {
        let bytes = self.backing.as_ref();
        self.filenames
            .iter()
            .map(move |range| std::str::from_utf8(&bytes[range.clone()]).unwrap_or_default())
    }

    /// Path of the first atlas texture, resolved against `dir`
    pub fn texture_path_in(&self, dir: &Path) -> Option<PathBuf> {
        self.texture_filenames().next().map(|name| dir.join(name))
    }

    /// Position of `codepoint` in the set (linear scan)
    pub fn index_of(&self, codepoint: u32) -> Option<usize> {
        self.codepoints().iter().position(|&c| c == codepoint)
    }

    /// Glyph for `codepoint`, or the placeholder if it is not stored
    ///
    /// Linear scan over the mapped codepoints.
    pub fn lookup(&self, codepoint: u32) -> &GlyphMetadata {
        let index = self.index_of(codepoint).unwrap_or(0);
        &self.glyphs()[index]
    }

    /// Same result as [`lookup`](Self::lookup), through a hash index built
    /// on first use
    pub fn glyph_for(&self, codepoint: u32) -> &GlyphMetadata {
        let index = self.index.get_or_init(|| {
            let mut index = HashMap::with_capacity(self.len());
            for (i, &c) in self.codepoints().iter().enumerate() {
                index.entry(c).or_insert(i);
            }
            index
        });
        let i = index.get(&codepoint).copied().unwrap_or(0);
        &self.glyphs()[i]
    }
}

impl<B: AsRef<[u8]>> std::fmt::Debug for PackedFontData<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PackedFontData")
            .field("header", &self.header)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Raw atlas texture
// ============================================================================

/// A validated raw texture file
pub struct RawTexture<B: AsRef<[u8]> = Mmap> {
    backing: B,
    header: RawTextureHeader,
}

impl RawTexture<Mmap> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, FormatError> {
        Self::from_backing(map_file(path.as_ref())?)
    }
}

impl<B: AsRef<[u8]>> RawTexture<B> {
    pub fn from_backing(backing: B) -> Result<Self, FormatError> {
        let bytes = backing.as_ref();
        let header: RawTextureHeader = read_header(bytes)?;
        header.validate()?;

        let expected = header.pixel_data_size();
        let found = bytes.len() - RawTextureHeader::SIZE;
        if found < expected {
            return Err(FormatError::TextureSizeMismatch {
                width: header.width,
                height: header.height,
                expected,
                found,
            });
        }
        Ok(Self { backing, header })
    }

    pub fn header(&self) -> &RawTextureHeader {
        &self.header
    }

    pub fn width(&self) -> u32 {
        self.header.width
    }

    pub fn height(&self) -> u32 {
        self.header.height
    }

    /// All pixels, row 0 first
    pub fn pixels(&self) -> &[u8] {
        let start = RawTextureHeader::SIZE;
        &self.backing.as_ref()[start..start + self.header.pixel_data_size()]
    }

    pub fn row(&self, y: u32) -> Option<&[u8]> {
        if y >= self.header.height {
            return None;
        }
        let width = self.header.width as usize;
        let start = y as usize * width;
        Some(&self.pixels()[start..start + width])
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<u8> {
        self.row(y)?.get(x as usize).copied()
    }
}
