//! font-pack-info - inspect a packed font
//!
//! Prints the header, the referenced textures and the glyph records of a
//! packed font metadata file.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use font_common::{GlyphMetadata, PackedFontData, RawTexture, denormalize_coord, layout_text};

#[derive(Parser)]
#[command(name = "font-pack-info")]
#[command(about = "Inspect a packed font metadata file")]
#[command(version)]
struct Cli {
    /// Packed font metadata file
    #[arg(default_value = "font_pack_meta.dat")]
    font: PathBuf,

    /// List every glyph record
    #[arg(short, long)]
    glyphs: bool,

    /// Show the glyph used for each character of TEXT
    #[arg(short, long, value_name = "TEXT")]
    lookup: Option<String>,

    /// Lay out TEXT and print one quad per character
    #[arg(long, value_name = "TEXT")]
    layout: Option<String>,

    /// Also validate the atlas texture stored next to the font
    #[arg(short, long)]
    texture: bool,
}

fn describe(codepoint: u32) -> String {
    match char::from_u32(codepoint) {
        Some(c) if !c.is_control() => format!("U+{codepoint:04X} '{c}'"),
        _ => format!("U+{codepoint:04X}"),
    }
}

fn print_glyph(label: &str, glyph: &GlyphMetadata, atlas: Option<(u32, u32)>) {
    let rect = match atlas {
        Some((w, h)) => format!(
            "px [{}..{}]x[{}..{}]",
            denormalize_coord(glyph.tex_left, w),
            denormalize_coord(glyph.tex_right, w),
            denormalize_coord(glyph.tex_bottom, h),
            denormalize_coord(glyph.tex_top, h)
        ),
        None => format!(
            "tex [{}..{}]x[{}..{}]",
            glyph.tex_left, glyph.tex_right, glyph.tex_bottom, glyph.tex_top
        ),
    };
    println!(
        "  {:<14} {:>3}x{:<3} {} offset ({}, {}) advance ({}, {})",
        label,
        glyph.width,
        glyph.height,
        rect,
        glyph.offset_x,
        glyph.offset_y,
        glyph.advance_x,
        glyph.advance_y
    );
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();

    let font = PackedFontData::open(&cli.font)
        .with_context(|| format!("Failed to load packed font: {}", cli.font.display()))?;
    let header = font.header();

    println!("{}", cli.font.display());
    println!("  codepoints:      {}", font.len());
    println!("  codepoints at:   {}", header.codepoints_offset);
    println!("  glyph data at:   {}", header.glyphdata_offset);
    println!("  textures at:     {}", header.texture_filenames_offset);
    println!("  min bearing y:   {}", font.min_bearing_y());
    for name in font.texture_filenames() {
        println!("  texture:         {}", name);
    }

    let mut atlas = None;
    if cli.texture {
        let dir = cli.font.parent().unwrap_or(std::path::Path::new("."));
        let path = font
            .texture_path_in(dir)
            .context("Packed font does not reference any texture")?;
        let texture = RawTexture::open(&path)
            .with_context(|| format!("Failed to load texture: {}", path.display()))?;
        println!(
            "  atlas:           {}x{} ({} bytes)",
            texture.width(),
            texture.height(),
            texture.pixels().len()
        );
        atlas = Some((texture.width(), texture.height()));
    }

    if cli.glyphs {
        println!("glyphs:");
        for (codepoint, glyph) in font.codepoints().iter().zip(font.glyphs()) {
            print_glyph(&describe(*codepoint), glyph, atlas);
        }
    }

    if let Some(text) = &cli.lookup {
        println!("lookup:");
        for c in text.chars() {
            let codepoint = c as u32;
            let label = match font.index_of(codepoint) {
                Some(_) => describe(codepoint),
                None => format!("{} (missing)", describe(codepoint)),
            };
            print_glyph(&label, font.glyph_for(codepoint), atlas);
        }
    }

    if let Some(text) = &cli.layout {
        println!("layout:");
        for (c, quad) in text.chars().filter(|&c| c != '\n').zip(layout_text(&font, text, (0, 0))) {
            println!(
                "  {:<14} x [{}..{}] y [{}..{}]",
                describe(c as u32),
                quad.left,
                quad.right,
                quad.down,
                quad.up
            );
        }
    }

    Ok(())
}
