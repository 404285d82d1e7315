//! FFmpeg command synthesis.
//!
//! Argument order is the bit-exact contract with the encoder: inputs, then
//! filters, then maps, then codec options, with the output path last.
//! Everything here is deterministic and side-effect free.

use std::path::Path;

use crate::audio::AudioInput;
use crate::config::CaptureConfig;

use super::filter::{build_graph, final_label, render_graph};

/// Seconds added to a configured duration bound. Matches the session's
/// startup grace budget, so a bounded session still captures the configured
/// amount of real content despite encoder startup latency.
pub const DURATION_PAD_SECS: u32 = 4;

/// An ordered FFmpeg invocation. Built once, consumed once by the session
/// to spawn the external process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl EncoderCommand {
    fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
            args: Vec::new(),
        }
    }

    fn arg(&mut self, a: impl Into<String>) -> &mut Self {
        self.args.push(a.into());
        self
    }

    fn args<I: IntoIterator<Item = S>, S: Into<String>>(&mut self, items: I) -> &mut Self {
        self.args.extend(items.into_iter().map(Into::into));
        self
    }
}

/// Synthesize the screen-capture invocation.
///
/// `devices` holds the dshow device name for each audio input, in the same
/// ingestion order as `inputs`.
pub fn build_capture_command(
    ffmpeg: &str,
    config: &CaptureConfig,
    inputs: &[AudioInput],
    devices: &[String],
) -> EncoderCommand {
    debug_assert_eq!(inputs.len(), devices.len());

    let mut cmd = EncoderCommand::new(ffmpeg);

    // Video input: whole desktop at the configured geometry.
    cmd.args(["-y", "-f", "gdigrab"]);
    cmd.arg("-framerate").arg(config.fps.to_string());
    cmd.arg("-video_size").arg(config.resolution());
    cmd.arg("-draw_mouse").arg(if config.show_mouse { "1" } else { "0" });
    cmd.args(["-i", "desktop"]);

    // Audio inputs, in ingestion order.
    for device in devices {
        cmd.args(["-f", "dshow"]).arg("-i").arg(format!("audio={device}"));
    }

    let stages = build_graph(inputs);
    if !stages.is_empty() {
        cmd.arg("-filter_complex").arg(render_graph(&stages));
    }

    // Video is mapped directly; audio from the single final label if present.
    cmd.args(["-map", "0:v"]);
    if let Some(label) = final_label(inputs) {
        cmd.arg("-map").arg(format!("[{label}]"));
    }

    // Lowest-latency constant-quality video settings for live capture.
    cmd.args(["-c:v", "libx264", "-crf", "20", "-preset", "ultrafast", "-pix_fmt", "yuv420p"]);
    if !inputs.is_empty() {
        cmd.args(["-c:a", "aac", "-b:a", "192k", "-ac", "2"]);
    }
    cmd.args(["-threads", "0"]);

    if let Some(duration) = config.duration {
        cmd.arg("-t").arg((duration + DURATION_PAD_SECS).to_string());
    }

    cmd.arg(config.output.to_string_lossy().into_owned());
    cmd
}

/// Self-probe invocation: FFmpeg with only an input prints stream
/// diagnostics (including the Duration line) and exits non-zero.
pub fn build_probe_command(ffmpeg: &str, input: &Path) -> EncoderCommand {
    let mut cmd = EncoderCommand::new(ffmpeg);
    cmd.arg("-i").arg(input.to_string_lossy().into_owned());
    cmd
}

/// Trim invocation for the post-processing pass: re-encode from `offset`
/// with a quality preset, real-time constraints no longer applying.
///
/// `span` is deliberately the full probed duration, not `duration - offset`;
/// FFmpeg caps the output at the source's natural end.
pub fn build_trim_command(
    ffmpeg: &str,
    input: &Path,
    offset_secs: u32,
    span_secs: f64,
    output: &Path,
) -> EncoderCommand {
    let mut cmd = EncoderCommand::new(ffmpeg);
    cmd.arg("-y")
        .arg("-i")
        .arg(input.to_string_lossy().into_owned())
        .arg("-ss")
        .arg(offset_secs.to_string())
        .arg("-t")
        .arg(span_secs.to_string())
        .args(["-c:v", "libx264", "-preset", "medium", "-crf", "20"])
        .args(["-c:a", "aac", "-b:a", "192k"])
        .arg(output.to_string_lossy().into_owned());
    cmd
}
