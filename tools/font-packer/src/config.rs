//! Packer configuration
//!
//! Defaults reproduce the classic packer output (20pt at 96dpi, 1px
//! padding, 32px base columns, 4096px cap). A TOML file can override any
//! field; CLI flags override the file.
//!
//! ```toml
//! font_size_px = 32.0
//! padding = 2
//! output_dir = "assets/fonts"
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::atlas::AtlasParams;
use crate::error::PackError;

/// Output file for the atlas pixels
pub const DEFAULT_TEXTURE_FILENAME: &str = "fonts_bitmap.myyraw";

/// Output file for the codepoint index and glyph records
pub const DEFAULT_METADATA_FILENAME: &str = "font_pack_meta.dat";

/// 20pt at 96dpi
pub const DEFAULT_FONT_SIZE_PX: f32 = 20.0 * 96.0 / 72.0;

const MAX_PADDING: u32 = 8;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PackerConfig {
    /// Rasterization size in pixels per em
    pub font_size_px: f32,

    /// Empty border around every glyph, in pixels
    pub padding: u32,

    /// Atlas width before doubling (power of two)
    pub column_width: u32,

    /// Hard cap on both atlas dimensions (power of two)
    pub max_atlas_size: u32,

    /// Treat malformed UTF-8 in the chars file as an error
    pub strict_utf8: bool,

    /// Directory receiving both output files
    pub output_dir: PathBuf,

    /// Atlas file name, also recorded inside the metadata file
    pub texture_filename: String,

    pub metadata_filename: String,
}

impl Default for PackerConfig {
    fn default() -> Self {
        Self {
            font_size_px: DEFAULT_FONT_SIZE_PX,
            padding: 1,
            column_width: 32,
            max_atlas_size: 4096,
            strict_utf8: false,
            output_dir: PathBuf::from("."),
            texture_filename: DEFAULT_TEXTURE_FILENAME.to_string(),
            metadata_filename: DEFAULT_METADATA_FILENAME.to_string(),
        }
    }
}

impl PackerConfig {
    /// Load and validate a TOML configuration file
    pub fn load(path: &Path) -> Result<Self, PackError> {
        let content = std::fs::read_to_string(path).map_err(|source| PackError::ReadInput {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content)
            .map_err(|e| PackError::Config(format!("{}: {e}", path.display())))?;
        tracing::debug!("Loaded configuration from {:?}: {:?}", path, config);
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, PackError> {
        let config: Self = toml::from_str(content).map_err(|e| PackError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), PackError> {
        let invalid = |msg: String| Err(PackError::Config(msg));

        if !(self.font_size_px.is_finite() && self.font_size_px > 0.0) {
            return invalid(format!("font_size_px must be positive, got {}", self.font_size_px));
        }
        if self.padding > MAX_PADDING {
            return invalid(format!("padding must be at most {MAX_PADDING}, got {}", self.padding));
        }
        if !self.column_width.is_power_of_two() {
            return invalid(format!(
                "column_width must be a power of two, got {}",
                self.column_width
            ));
        }
        if !self.max_atlas_size.is_power_of_two() || self.max_atlas_size > u32::from(u16::MAX) {
            return invalid(format!(
                "max_atlas_size must be a power of two up to 32768, got {}",
                self.max_atlas_size
            ));
        }
        if self.column_width > self.max_atlas_size {
            return invalid(format!(
                "column_width {} exceeds max_atlas_size {}",
                self.column_width, self.max_atlas_size
            ));
        }
        for (field, name) in [
            ("texture_filename", &self.texture_filename),
            ("metadata_filename", &self.metadata_filename),
        ] {
            if name.is_empty() || name.contains(['/', '\\']) {
                return invalid(format!("{field} must be a plain file name, got {name:?}"));
            }
        }
        if self.texture_filename == self.metadata_filename {
            return invalid("texture_filename and metadata_filename must differ".to_string());
        }
        Ok(())
    }

    pub fn atlas_params(&self) -> AtlasParams {
        AtlasParams {
            padding: self.padding,
            column_width: self.column_width,
            max_size: self.max_atlas_size,
        }
    }

    pub fn texture_path(&self) -> PathBuf {
        self.output_dir.join(&self.texture_filename)
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.output_dir.join(&self.metadata_filename)
    }
}
