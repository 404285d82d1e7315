pub mod audio;
pub mod cli;
pub mod config;
pub mod encoder;
pub mod error;
pub mod flash;
pub mod hotkeys;
pub mod lifecycle;
pub mod postprocess;
pub mod session;

pub use audio::{plan, AudioInput, AudioSource, CableManager, DeviceDirectory};
pub use cli::Cli;
pub use config::{CaptureConfig, Settings};
pub use encoder::{build_capture_command, EncoderCommand};
pub use error::RecorderError;
pub use lifecycle::CleanupGuard;
pub use postprocess::{FfmpegPostProcessor, OutputArtifact, PostProcessor};
pub use session::{RecordingSession, SessionDeps, SessionState, SessionTiming};
