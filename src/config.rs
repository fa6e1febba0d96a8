use crate::canvas::Rgb;
use crate::viz::{VisualSize, VisualStyle};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "trackviz",
    version,
    about = "Terminal music visualizer: bars, waveform, or radial spokes over a playing track"
)]
pub struct Config {
    #[arg(long, value_enum, default_value_t = SourceMode::Track)]
    pub source: SourceMode,

    /// WAV file to play (required unless --source mic).
    #[arg(long)]
    pub track: Option<PathBuf>,

    /// Input-device substring for --source mic.
    #[arg(long)]
    pub device: Option<String>,

    /// Visual style; falls back to stored prefs, then bars.
    #[arg(long, value_enum)]
    pub style: Option<StyleMode>,

    /// Surface size; falls back to stored prefs, then small.
    #[arg(long, value_enum)]
    pub size: Option<SizeMode>,

    /// Accent color as hex (#rrggbb); falls back to stored prefs.
    #[arg(long, value_parser = parse_color)]
    pub color: Option<Rgb>,

    #[arg(long, value_enum, default_value_t = RendererMode::HalfBlock)]
    pub renderer: RendererMode,

    #[arg(long, default_value_t = 60)]
    pub fps: u32,

    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub sync_updates: bool,

    /// Start playing immediately instead of paused.
    #[arg(long, default_value_t = false)]
    pub autoplay: bool,

    #[arg(long, default_value_t = false)]
    pub list_devices: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SourceMode {
    Track,
    Mic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StyleMode {
    Bars,
    Wave,
    #[value(alias = "radial")]
    Circle,
}

impl StyleMode {
    pub fn into_style(self) -> VisualStyle {
        match self {
            Self::Bars => VisualStyle::Bars,
            Self::Wave => VisualStyle::Wave,
            Self::Circle => VisualStyle::Circle,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SizeMode {
    Small,
    Large,
}

impl SizeMode {
    pub fn into_size(self) -> VisualSize {
        match self {
            Self::Small => VisualSize::Small,
            Self::Large => VisualSize::Large,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RendererMode {
    #[value(alias = "ansi", alias = "text")]
    Ascii,
    #[value(name = "half-block", alias = "halfblock", alias = "half_block", alias = "hb")]
    HalfBlock,
    #[value(alias = "hires", alias = "dots")]
    Braille,
}

fn parse_color(raw: &str) -> Result<Rgb, String> {
    Rgb::parse_hex(raw).map_err(|e| e.to_string())
}
