use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::Local;
use serde::Deserialize;

use crate::cli::{parse_resolution, Cli};

/// Environment settings, loadable from an optional `config/screenrec.toml`.
///
/// Capture parameters always come from the CLI; this file only carries
/// machine-level defaults (encoder binary location, recordings directory).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Path to the FFmpeg binary.
    pub ffmpeg_path: String,
    /// Directory for default-named recordings.
    pub recordings_dir: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            recordings_dir: "recordings".to_string(),
        }
    }
}

impl Settings {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

/// The bundled `dependencies/ffmpeg.exe` beside the executable if present,
/// otherwise `ffmpeg` from PATH.
fn default_ffmpeg_path() -> String {
    let bundled = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|d| d.join("dependencies").join("ffmpeg.exe")));

    match bundled {
        Some(path) if path.exists() => path.to_string_lossy().into_owned(),
        _ => "ffmpeg".to_string(),
    }
}

/// Capture parameters for one recording session. Immutable once armed.
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub show_mouse: bool,
    /// Bounded recording length in seconds; `None` records until the stop hotkey.
    pub duration: Option<u32>,
    pub output: PathBuf,
}

impl CaptureConfig {
    pub fn from_cli(cli: &Cli, settings: &Settings) -> Result<Self> {
        let (width, height) = parse_resolution(&cli.resolution)?;

        if cli.fps == 0 {
            bail!("fps must be positive");
        }
        if cli.duration == Some(0) {
            bail!("duration must be positive");
        }

        let output = match &cli.output {
            Some(path) => path.clone(),
            None => {
                let dir = Path::new(&settings.recordings_dir);
                std::fs::create_dir_all(dir)
                    .with_context(|| format!("failed to create {}", dir.display()))?;
                dir.join(format!("Recording_{}.mp4", Local::now().format("%Y%m%d_%H%M%S")))
            }
        };

        Ok(Self {
            width,
            height,
            fps: cli.fps,
            show_mouse: cli.show_mouse,
            duration: cli.duration,
            output,
        })
    }

    pub fn resolution(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("screenrec").chain(args.iter().copied()))
    }

    #[test]
    fn test_explicit_output_is_kept() {
        let cli = cli(&["--output", "clip.mp4"]);
        let cfg = CaptureConfig::from_cli(&cli, &Settings::default()).unwrap();
        assert_eq!(cfg.output, PathBuf::from("clip.mp4"));
    }

    #[test]
    fn test_default_output_is_timestamped() {
        let tmp = tempfile::tempdir().unwrap();
        let settings = Settings {
            recordings_dir: tmp.path().join("recordings").to_string_lossy().into_owned(),
            ..Settings::default()
        };
        let cfg = CaptureConfig::from_cli(&cli(&[]), &settings).unwrap();

        let name = cfg.output.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("Recording_"), "got {}", name);
        assert!(name.ends_with(".mp4"));
        assert!(cfg.output.parent().unwrap().exists(), "recordings dir should be created");
    }

    #[test]
    fn test_rejects_zero_fps_and_duration() {
        let settings = Settings::default();
        assert!(CaptureConfig::from_cli(&cli(&["--fps", "0", "--output", "o.mp4"]), &settings).is_err());
        assert!(
            CaptureConfig::from_cli(&cli(&["--duration", "0", "--output", "o.mp4"]), &settings)
                .is_err()
        );
    }

    #[test]
    fn test_defaults_match_cli() {
        let cfg = CaptureConfig::from_cli(&cli(&["--output", "o.mp4"]), &Settings::default()).unwrap();
        assert_eq!((cfg.width, cfg.height), (1920, 1080));
        assert_eq!(cfg.fps, 15);
        assert!(!cfg.show_mouse);
        assert_eq!(cfg.duration, None);
    }
}
