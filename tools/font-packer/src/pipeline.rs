//! End-to-end packing run
//!
//! Every input is read and validated, glyphs are collected and packed, and
//! only then are the two output files created.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::atlas::pack_atlas;
use crate::codepoints::CodepointSet;
use crate::collector::collect_glyphs;
use crate::config::PackerConfig;
use crate::error::PackError;
use crate::rasterizer::{FontdueFace, GlyphRasterizer};
use crate::writer::{write_packed_font, write_raw_texture};

/// Summary of a successful run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackReport {
    /// Stored codepoints, placeholder included
    pub codepoints: usize,
    pub atlas_width: u32,
    pub atlas_height: u32,
    pub min_bearing_y: i16,
    pub texture_path: PathBuf,
    pub metadata_path: PathBuf,
    pub metadata_size: usize,
}

/// Pack `fonts` (in priority order) for the characters listed in `chars`
pub fn pack_fonts(
    fonts: &[PathBuf],
    chars: &Path,
    config: &PackerConfig,
) -> Result<PackReport, PackError> {
    config.validate()?;

    let mut faces: Vec<Box<dyn GlyphRasterizer>> = Vec::with_capacity(fonts.len());
    for path in fonts {
        faces.push(Box::new(FontdueFace::from_file(path, config.font_size_px)?));
    }
    let set = CodepointSet::from_chars_file(chars, config.strict_utf8)?;

    pack_with_faces(&faces, set, config)
}

/// Pack an already decoded codepoint set with already loaded faces
pub fn pack_with_faces(
    faces: &[Box<dyn GlyphRasterizer>],
    mut set: CodepointSet,
    config: &PackerConfig,
) -> Result<PackReport, PackError> {
    if faces.is_empty() {
        return Err(PackError::Config("at least one font is required".to_string()));
    }
    set.insert_placeholder()?;

    let mut table = collect_glyphs(faces, set.as_slice())?;
    let atlas = pack_atlas(&mut table, &config.atlas_params())?;

    let output_dir = config.output_dir.as_path();
    std::fs::create_dir_all(output_dir).map_err(|source| PackError::Write {
        path: output_dir.to_path_buf(),
        source,
    })?;

    let texture_path = config.texture_path();
    write_file(&texture_path, |w| {
        write_raw_texture(w, atlas.width(), atlas.height(), atlas.pixels())
    })?;

    let metadata_path = config.metadata_path();
    let mut metadata_size = 0;
    write_file(&metadata_path, |w| {
        metadata_size = write_packed_font(
            w,
            table.codepoints(),
            table.glyphs(),
            &[config.texture_filename.as_str()],
            table.min_bearing_y(),
        )?;
        Ok(())
    })?;

    Ok(PackReport {
        codepoints: table.len(),
        atlas_width: atlas.width(),
        atlas_height: atlas.height(),
        min_bearing_y: table.min_bearing_y(),
        texture_path,
        metadata_path,
        metadata_size,
    })
}

fn write_file(
    path: &Path,
    write: impl FnOnce(&mut BufWriter<File>) -> io::Result<()>,
) -> Result<(), PackError> {
    let write_error = |source| PackError::Write {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(write_error)?;
    let mut writer = BufWriter::new(file);
    write(&mut writer).map_err(write_error)?;
    writer.flush().map_err(write_error)?;
    tracing::info!("Wrote {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_in(dir: &Path) -> PackerConfig {
        PackerConfig {
            output_dir: dir.join("out"),
            ..PackerConfig::default()
        }
    }

    #[test]
    fn test_missing_font_creates_no_output() {
        let dir = tempfile::tempdir().unwrap();
        let chars = dir.path().join("chars.txt");
        std::fs::write(&chars, "abc").unwrap();
        let config = config_in(dir.path());

        let err = pack_fonts(&[dir.path().join("missing.ttf")], &chars, &config).unwrap_err();
        assert!(matches!(err, PackError::ReadInput { .. }));
        assert!(!config.output_dir.exists());
    }

    #[test]
    fn test_invalid_config_checked_first() {
        let dir = tempfile::tempdir().unwrap();
        let config = PackerConfig {
            padding: 100,
            ..config_in(dir.path())
        };
        let err = pack_fonts(&[], &dir.path().join("chars.txt"), &config).unwrap_err();
        assert!(matches!(err, PackError::Config(_)));
    }

    #[test]
    fn test_no_faces() {
        let dir = tempfile::tempdir().unwrap();
        let set = CodepointSet::decode(b"a", false).unwrap();
        let err = pack_with_faces(&[], set, &config_in(dir.path())).unwrap_err();
        assert!(matches!(err, PackError::Config(_)));
    }
}
