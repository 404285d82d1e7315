// End-to-end command synthesis scenarios: routing plan through to the
// exact FFmpeg argument sequence.

use std::path::PathBuf;

use screenrec::audio::{plan, AudioSource, CABLE_CAPTURE_DEVICE};
use screenrec::config::CaptureConfig;
use screenrec::encoder::build_capture_command;

fn config(duration: Option<u32>) -> CaptureConfig {
    CaptureConfig {
        width: 1920,
        height: 1080,
        fps: 15,
        show_mouse: false,
        duration,
        output: PathBuf::from("recordings/clip.mp4"),
    }
}

#[test]
fn test_silent_bounded_recording() {
    // resolution=1920x1080, fps=15, no audio, duration=5
    let (source, inputs) = plan(false, false);
    assert_eq!(source, AudioSource::None);

    let cmd = build_capture_command("ffmpeg", &config(Some(5)), &inputs, &[]);

    assert_eq!(cmd.args.iter().filter(|a| *a == "-i").count(), 1, "video input only");
    assert!(!cmd.args.contains(&"-filter_complex".to_string()));
    assert!(!cmd.args.iter().any(|a| a.starts_with("-c:a")));
    assert!(cmd.args.windows(2).any(|w| w[0] == "-t" && w[1] == "9"), "5s + 4s pad");
    assert_eq!(*cmd.args.last().unwrap(), "recordings/clip.mp4");
}

#[test]
fn test_dual_audio_recording() {
    let (source, inputs) = plan(true, true);
    assert_eq!(source, AudioSource::Both);
    assert_eq!(inputs[0].input_index, 0);
    assert_eq!(inputs[0].delay_ms, 600);
    assert_eq!(inputs[1].input_index, 1);
    assert_eq!(inputs[1].delay_ms, 1200);

    let devices = vec![CABLE_CAPTURE_DEVICE.to_string(), "Headset Microphone".to_string()];
    let cmd = build_capture_command("ffmpeg", &config(None), &inputs, &devices);

    let graph_pos = cmd.args.iter().position(|a| a == "-filter_complex").unwrap();
    let graph = &cmd.args[graph_pos + 1];
    assert_eq!(graph.matches("adelay").count(), 2);
    assert_eq!(graph.matches("amerge").count(), 1);

    // Final map targets the merged label.
    assert!(cmd.args.windows(2).any(|w| w[0] == "-map" && w[1] == "[a_out]"));
}

#[test]
fn test_command_argument_section_order() {
    // Inputs before filters before maps before codecs before the output path.
    let (_, inputs) = plan(true, false);
    let devices = vec![CABLE_CAPTURE_DEVICE.to_string()];
    let cmd = build_capture_command("ffmpeg", &config(Some(10)), &inputs, &devices);

    let pos = |needle: &str| cmd.args.iter().position(|a| a == needle).unwrap();
    let last_input = cmd.args.iter().rposition(|a| a == "-i").unwrap();

    assert!(last_input < pos("-filter_complex"));
    assert!(pos("-filter_complex") < pos("-map"));
    assert!(pos("-map") < pos("-c:v"));
    assert!(pos("-c:v") < pos("-t"));
    assert!(pos("-t") < cmd.args.len() - 1);
}
