use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;

/// Screen recorder for Windows 10/11 (MP4 output).
///
/// Press Ctrl+F9 to start recording and Ctrl+F10 to stop. A brief flash
/// appears when the recorder is armed, and again when recording actually
/// starts and stops.
#[derive(Debug, Parser)]
#[command(name = "screenrec", version, about)]
pub struct Cli {
    /// Video resolution in WIDTHxHEIGHT format
    #[arg(long, default_value = "1920x1080")]
    pub resolution: String,

    /// Frames per second for the recording
    #[arg(long, default_value_t = 15)]
    pub fps: u32,

    /// Record system audio through the VB-Audio Virtual Cable
    #[arg(long)]
    pub system_audio: bool,

    /// Record from the default microphone
    #[arg(long)]
    pub microphone: bool,

    /// Include the mouse cursor in the recording
    #[arg(long)]
    pub show_mouse: bool,

    /// Recording duration in seconds (default: unlimited until Ctrl+F10)
    #[arg(long)]
    pub duration: Option<u32>,

    /// Output file path (default: ./recordings/Recording_<timestamp>.mp4)
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Skip the final "Press Enter to exit" prompt
    #[arg(long)]
    pub silently: bool,
}

/// Parse a `WIDTHxHEIGHT` string into a (width, height) pair.
pub fn parse_resolution(s: &str) -> Result<(u32, u32)> {
    let Some((w, h)) = s.split_once('x') else {
        bail!("invalid resolution '{}': expected WIDTHxHEIGHT", s);
    };
    let width: u32 = w
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid resolution width '{}'", w))?;
    let height: u32 = h
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid resolution height '{}'", h))?;
    if width == 0 || height == 0 {
        bail!("resolution dimensions must be positive, got {}x{}", width, height);
    }
    Ok((width, height))
}
