//! Recording session management
//!
//! This module provides the `RecordingSession` state machine that
//! coordinates routing provisioning, hotkey-driven start/stop, the external
//! encoder process lifecycle, and the post-processing trim pass.

mod process;
mod session;
mod state;

pub use process::{EncoderLauncher, EncoderProcess, FfmpegLauncher};
pub use session::{RecordingSession, RoutingProvisioner, SessionDeps, SessionTiming};
pub use state::SessionState;
