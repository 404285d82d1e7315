//! External encoder process seam.
//!
//! The session drives the encoder through these traits so its sequencing
//! can be exercised without a real FFmpeg binary. The production launcher
//! spawns FFmpeg with a piped stdin (the graceful-stop control channel)
//! and suppressed output streams.

use std::process::Stdio;

use anyhow::{Context, Result};
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, Command};

use crate::encoder::EncoderCommand;
use crate::error::RecorderError;

/// A running encoder child. Must always be awaited before release.
#[async_trait::async_trait]
pub trait EncoderProcess: Send {
    /// Write the graceful stop command to the child's control channel.
    async fn send_stop(&mut self) -> Result<()>;

    /// Wait for the child to exit; `true` means a clean exit.
    async fn wait(&mut self) -> Result<bool>;
}

#[async_trait::async_trait]
pub trait EncoderLauncher: Send + Sync {
    async fn launch(&self, command: &EncoderCommand) -> Result<Box<dyn EncoderProcess>, RecorderError>;
}

/// Spawns the real FFmpeg process.
pub struct FfmpegLauncher;

struct FfmpegProcess {
    child: Child,
}

#[async_trait::async_trait]
impl EncoderProcess for FfmpegProcess {
    async fn send_stop(&mut self) -> Result<()> {
        let stdin = self
            .child
            .stdin
            .as_mut()
            .context("encoder stdin already closed")?;
        stdin.write_all(b"q\n").await?;
        stdin.flush().await?;
        Ok(())
    }

    async fn wait(&mut self) -> Result<bool> {
        let status = self.child.wait().await.context("failed to wait for encoder")?;
        Ok(status.success())
    }
}

#[async_trait::async_trait]
impl EncoderLauncher for FfmpegLauncher {
    async fn launch(&self, command: &EncoderCommand) -> Result<Box<dyn EncoderProcess>, RecorderError> {
        let child = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(RecorderError::Spawn)?;

        Ok(Box::new(FfmpegProcess { child }))
    }
}
