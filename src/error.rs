use std::io;
use std::path::PathBuf;
use std::time::Duration;

use crate::session::SessionState;

/// Failure taxonomy for the recording pipeline.
///
/// Provisioning failures (`Driver`) are tolerated: the encoder may still
/// run without confirmed routing. Everything else is fatal to the session.
#[derive(Debug, thiserror::Error)]
pub enum RecorderError {
    #[error("no active {role} device found")]
    DeviceNotFound { role: &'static str },

    #[error("audio routing provisioning failed: {0}")]
    Driver(String),

    #[error("failed to start encoder: {0}")]
    Spawn(#[source] io::Error),

    #[error("encoder produced no output file within {0:?}")]
    SpawnTimeout(Duration),

    #[error("could not determine duration of {}", path.display())]
    Probe { path: PathBuf },

    #[error("trim pass failed: {0}")]
    Transcode(String),

    #[error("illegal session transition: {from:?} -> {to:?}")]
    IllegalTransition { from: SessionState, to: SessionState },
}
