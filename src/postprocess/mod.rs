//! Post-processing: probe the raw recording's real duration, then re-encode
//! a trimmed copy dropping the startup offset and atomically replace the
//! original. The raw file is left untouched on any failure.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::OnceLock;

use anyhow::Result;
use regex::Regex;
use tracing::info;

use crate::encoder::{build_probe_command, build_trim_command};
use crate::error::RecorderError;

/// Startup span trimmed from the front of every recording, seconds.
pub const STARTUP_TRIM_SECS: u32 = 4;

/// A finished recording: the file plus its probed real duration.
#[derive(Debug, Clone)]
pub struct OutputArtifact {
    pub path: PathBuf,
    pub duration_secs: f64,
}

#[async_trait::async_trait]
pub trait PostProcessor: Send + Sync {
    async fn finalize(&self, path: &Path) -> Result<OutputArtifact, RecorderError>;
}

/// Parse the `Duration: HH:MM:SS.ss` line from FFmpeg's self-probe
/// diagnostic output.
pub fn parse_duration(diagnostics: &str) -> Option<f64> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let re = PATTERN
        .get_or_init(|| Regex::new(r"Duration: (\d+):(\d+):(\d+\.\d+)").expect("valid regex"));

    let caps = re.captures(diagnostics)?;
    let hours: f64 = caps[1].parse().ok()?;
    let minutes: f64 = caps[2].parse().ok()?;
    let seconds: f64 = caps[3].parse().ok()?;
    Some(hours * 3600.0 + minutes * 60.0 + seconds)
}

/// Start offset for the trim pass: skip the startup span unless the clip is
/// too short for it, in which case nothing is trimmed.
pub fn trim_offset_secs(duration_secs: f64) -> u32 {
    if duration_secs > STARTUP_TRIM_SECS as f64 {
        STARTUP_TRIM_SECS
    } else {
        0
    }
}

/// FFmpeg-backed post-processor.
pub struct FfmpegPostProcessor {
    pub ffmpeg: String,
}

impl FfmpegPostProcessor {
    pub fn new(ffmpeg: impl Into<String>) -> Self {
        Self { ffmpeg: ffmpeg.into() }
    }

    async fn probe_duration(&self, path: &Path) -> Result<f64, RecorderError> {
        let cmd = build_probe_command(&self.ffmpeg, path);

        // FFmpeg exits non-zero when given only an input; the diagnostics
        // on stderr are what we want.
        let output = tokio::process::Command::new(&cmd.program)
            .args(&cmd.args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| RecorderError::Transcode(format!("failed to run prober: {e}")))?;

        let mut diagnostics = String::from_utf8_lossy(&output.stderr).into_owned();
        diagnostics.push_str(&String::from_utf8_lossy(&output.stdout));

        parse_duration(&diagnostics).ok_or_else(|| RecorderError::Probe {
            path: path.to_path_buf(),
        })
    }
}

#[async_trait::async_trait]
impl PostProcessor for FfmpegPostProcessor {
    async fn finalize(&self, path: &Path) -> Result<OutputArtifact, RecorderError> {
        let duration = self.probe_duration(path).await?;
        let offset = trim_offset_secs(duration);
        info!(
            "trimming {}: duration {:.2}s, start offset {}s",
            path.display(),
            duration,
            offset
        );

        let tmp = PathBuf::from(format!("{}.tmp.mp4", path.display()));
        // Span is intentionally the full probed duration; FFmpeg caps the
        // output at the source's natural end.
        let cmd = build_trim_command(&self.ffmpeg, path, offset, duration, &tmp);

        let status = tokio::process::Command::new(&cmd.program)
            .args(&cmd.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(|e| RecorderError::Transcode(format!("failed to run encoder: {e}")))?;

        if !status.success() {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(RecorderError::Transcode(format!(
                "trim encoder exited with {status}"
            )));
        }

        tokio::fs::rename(&tmp, path)
            .await
            .map_err(|e| RecorderError::Transcode(format!("failed to replace original: {e}")))?;

        Ok(OutputArtifact {
            path: path.to_path_buf(),
            duration_secs: duration,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FFMPEG_BANNER: &str = "\
Input #0, mov,mp4,m4a,3gp,3g2,mj2, from 'recordings/Recording_20250101_120000.mp4':
  Metadata:
    major_brand     : isom
  Duration: 00:00:30.02, start: 0.000000, bitrate: 4200 kb/s
    Stream #0:0[0x1](und): Video: h264 (High) (avc1 / 0x31637661), yuv420p(progressive), 1920x1080";

    #[test]
    fn test_parse_duration_from_diagnostics() {
        let secs = parse_duration(FFMPEG_BANNER).unwrap();
        assert!((secs - 30.02).abs() < 1e-9);
    }

    #[test]
    fn test_parse_duration_with_hours_and_minutes() {
        let secs = parse_duration("  Duration: 01:02:03.50, start: 0.0").unwrap();
        assert!((secs - 3723.5).abs() < 1e-9);
    }

    #[test]
    fn test_parse_duration_missing_line() {
        assert!(parse_duration("Output #0, mp4, to 'out.mp4'").is_none());
        assert!(parse_duration("").is_none());
    }

    #[test]
    fn test_trim_offset_short_clip_untouched() {
        assert_eq!(trim_offset_secs(2.5), 0);
        assert_eq!(trim_offset_secs(4.0), 0);
    }

    #[test]
    fn test_trim_offset_long_clip() {
        assert_eq!(trim_offset_secs(4.01), 4);
        assert_eq!(trim_offset_secs(30.0), 4);
    }
}
