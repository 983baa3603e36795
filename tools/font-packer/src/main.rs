//! font-packer - glyph atlas packer
//!
//! Usage: `font-packer font1.ttf [font2.otf ...] chars.txt`
//!
//! Writes the atlas (`fonts_bitmap.myyraw`) and the packed font metadata
//! (`font_pack_meta.dat`) to the output directory.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use font_packer::{PackError, PackerConfig, pack_fonts};

#[derive(Parser)]
#[command(name = "font-packer")]
#[command(about = "Pack outline font glyphs into a texture atlas")]
#[command(version)]
struct Cli {
    /// Font files in priority order, followed by the characters file
    #[arg(num_args = 2.., required = true, value_name = "FONT... CHARS")]
    inputs: Vec<PathBuf>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output directory (overrides config)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Rasterization size in pixels (overrides config)
    #[arg(short, long)]
    size: Option<f32>,

    /// Reject malformed UTF-8 in the characters file
    #[arg(long)]
    strict: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn run(cli: Cli) -> Result<(), PackError> {
    let mut config = match &cli.config {
        Some(path) => PackerConfig::load(path)?,
        None => PackerConfig::default(),
    };
    if let Some(dir) = cli.output_dir {
        config.output_dir = dir;
    }
    if let Some(size) = cli.size {
        config.font_size_px = size;
    }
    if cli.strict {
        config.strict_utf8 = true;
    }

    let Some((chars, fonts)) = cli.inputs.split_last() else {
        return Err(PackError::Config("no input files".to_string()));
    };
    tracing::info!("Packing {} font(s) for {:?}", fonts.len(), chars);

    let report = pack_fonts(fonts, chars, &config)?;
    tracing::info!(
        "Done! {} codepoints, {}x{} atlas -> {:?}, {:?}",
        report.codepoints,
        report.atlas_width,
        report.atlas_height,
        report.texture_path,
        report.metadata_path
    );
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::from(e.exit_code())
        }
    }
}
