//! Typed audio filter graph.
//!
//! Stages are structured descriptors; FFmpeg's textual filter mini-language
//! only appears at serialization time, so routing logic and tests never
//! depend on exact syntax beyond the documented shape.

use crate::audio::AudioInput;

/// Final label of a merged two-source stream.
pub const MERGED_LABEL: &str = "a_out";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterStage {
    /// `[N:a]adelay=<ms>|<ms>[label]` — per-input delay compensation.
    Delay {
        /// FFmpeg input index (video is input 0, audio starts at 1).
        encoder_input: usize,
        delay_ms: u32,
        label: &'static str,
    },
    /// `[left][right]amerge=inputs=2[label]` — two-way channel merge.
    Merge {
        left: &'static str,
        right: &'static str,
        label: &'static str,
    },
}

impl FilterStage {
    pub fn render(&self) -> String {
        match self {
            FilterStage::Delay {
                encoder_input,
                delay_ms,
                label,
            } => format!("[{encoder_input}:a]adelay={delay_ms}|{delay_ms}[{label}]"),
            FilterStage::Merge { left, right, label } => {
                format!("[{left}][{right}]amerge=inputs=2[{label}]")
            }
        }
    }
}

/// Build the filter graph for the planned audio inputs: one delay stage per
/// input, then a merge stage only when exactly two inputs exist. The merge
/// always comes after every delay stage.
pub fn build_graph(inputs: &[AudioInput]) -> Vec<FilterStage> {
    let mut stages: Vec<FilterStage> = inputs
        .iter()
        .map(|input| FilterStage::Delay {
            encoder_input: input.input_index + 1,
            delay_ms: input.delay_ms,
            label: input.label,
        })
        .collect();

    if inputs.len() == 2 {
        stages.push(FilterStage::Merge {
            left: inputs[0].label,
            right: inputs[1].label,
            label: MERGED_LABEL,
        });
    }

    stages
}

/// Label of the single final audio stream, if any audio is captured.
pub fn final_label(inputs: &[AudioInput]) -> Option<&'static str> {
    match inputs.len() {
        0 => None,
        1 => Some(inputs[0].label),
        _ => Some(MERGED_LABEL),
    }
}

/// Serialize the graph to FFmpeg's `-filter_complex` argument.
pub fn render_graph(stages: &[FilterStage]) -> String {
    stages
        .iter()
        .map(FilterStage::render)
        .collect::<Vec<_>>()
        .join(";")
}
