//! Audio routing plan: which capture inputs exist, their ingestion order,
//! delay compensation, and how their filter outputs recombine.
//!
//! Delays are fixed per role. The virtual cable buffers system audio, so a
//! microphone recorded alongside it needs a larger offset to stay aligned.

/// Delay applied to system audio captured through the virtual cable.
pub const SYSTEM_AUDIO_DELAY_MS: u32 = 600;
/// Delay applied to the microphone when it is the only audio source.
pub const MIC_ONLY_DELAY_MS: u32 = 500;
/// Delay applied to the microphone when paired with system audio.
pub const MIC_WITH_SYSTEM_DELAY_MS: u32 = 1200;

/// Capture endpoint exposed by the VB-Audio Virtual Cable driver.
pub const CABLE_CAPTURE_DEVICE: &str = "CABLE Output (VB-Audio Virtual Cable)";

/// Which audio sources a session records. Decided once at session start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioSource {
    None,
    SystemOnly,
    MicrophoneOnly,
    Both,
}

impl AudioSource {
    pub fn from_flags(system_audio: bool, microphone: bool) -> Self {
        match (system_audio, microphone) {
            (false, false) => Self::None,
            (true, false) => Self::SystemOnly,
            (false, true) => Self::MicrophoneOnly,
            (true, true) => Self::Both,
        }
    }

    pub fn uses_system_audio(self) -> bool {
        matches!(self, Self::SystemOnly | Self::Both)
    }

    pub fn uses_microphone(self) -> bool {
        matches!(self, Self::MicrophoneOnly | Self::Both)
    }
}

/// One audio capture input, in encoder ingestion order.
///
/// `input_index` is 0-based over the audio inputs only; the desktop video
/// capture is always encoder input 0, so filter stages reference encoder
/// input `input_index + 1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioInput {
    pub input_index: usize,
    pub delay_ms: u32,
    pub label: &'static str,
}

/// Compute the audio routing plan for the given capture flags.
///
/// Pure: device-name resolution is a separate precondition. When both
/// sources are enabled the microphone always comes second and carries the
/// strictly larger delay.
pub fn plan(system_audio: bool, microphone: bool) -> (AudioSource, Vec<AudioInput>) {
    let source = AudioSource::from_flags(system_audio, microphone);

    let inputs = match source {
        AudioSource::None => vec![],
        AudioSource::SystemOnly => vec![AudioInput {
            input_index: 0,
            delay_ms: SYSTEM_AUDIO_DELAY_MS,
            label: "a_sys",
        }],
        AudioSource::MicrophoneOnly => vec![AudioInput {
            input_index: 0,
            delay_ms: MIC_ONLY_DELAY_MS,
            label: "a_out",
        }],
        AudioSource::Both => vec![
            AudioInput {
                input_index: 0,
                delay_ms: SYSTEM_AUDIO_DELAY_MS,
                label: "a_sys",
            },
            AudioInput {
                input_index: 1,
                delay_ms: MIC_WITH_SYSTEM_DELAY_MS,
                label: "a_mic",
            },
        ],
    };

    (source, inputs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_input_counts() {
        assert_eq!(plan(false, false).1.len(), 0);
        assert_eq!(plan(true, false).1.len(), 1);
        assert_eq!(plan(false, true).1.len(), 1);
        assert_eq!(plan(true, true).1.len(), 2);
    }

    #[test]
    fn test_plan_fixed_delays() {
        assert_eq!(plan(true, false).1[0].delay_ms, 600);
        assert_eq!(plan(false, true).1[0].delay_ms, 500);

        let (_, both) = plan(true, true);
        assert_eq!(both[0].delay_ms, 600);
        assert_eq!(both[1].delay_ms, 1200);
    }

    #[test]
    fn test_both_orders_system_first_with_larger_mic_delay() {
        let (source, inputs) = plan(true, true);
        assert_eq!(source, AudioSource::Both);
        assert_eq!(inputs[0].input_index, 0);
        assert_eq!(inputs[1].input_index, 1);
        assert_eq!(inputs[0].label, "a_sys");
        assert_eq!(inputs[1].label, "a_mic");
        assert!(inputs[1].delay_ms > inputs[0].delay_ms);
    }

    #[test]
    fn test_single_source_labels() {
        assert_eq!(plan(true, false).1[0].label, "a_sys");
        assert_eq!(plan(false, true).1[0].label, "a_out");
    }

    #[test]
    fn test_source_from_flags() {
        assert_eq!(plan(false, false).0, AudioSource::None);
        assert_eq!(plan(true, false).0, AudioSource::SystemOnly);
        assert_eq!(plan(false, true).0, AudioSource::MicrophoneOnly);
    }
}
