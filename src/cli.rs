use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "bandstand", about = "Audio playback engine with live band-energy analysis")]
pub struct Cli {
    /// Track to play: an http(s) URL or a local file path
    pub track: String,

    /// Config file (defaults to ./bandstand.toml, then the platform config dir)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Lower edge of the low band in Hz
    #[arg(long)]
    pub low_hz: Option<f32>,

    /// Low/mid band boundary in Hz
    #[arg(long)]
    pub mid_hz: Option<f32>,

    /// Mid/high band boundary in Hz
    #[arg(long)]
    pub high_hz: Option<f32>,

    /// Playback volume (0.0-1.0)
    #[arg(long)]
    pub volume: Option<f32>,

    /// Loop the track instead of exiting when it ends
    #[arg(long)]
    pub looping: bool,

    /// Estimate the track tempo up front and print beat markers
    #[arg(long)]
    pub show_beats: bool,

    /// Seek to this position (seconds) before starting
    #[arg(long)]
    pub start_at: Option<f64>,
}
