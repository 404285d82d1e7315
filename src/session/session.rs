use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};

use super::process::{EncoderLauncher, EncoderProcess};
use super::state::SessionState;
use crate::audio::AudioSource;
use crate::config::CaptureConfig;
use crate::encoder::EncoderCommand;
use crate::error::RecorderError;
use crate::flash::FlashSignal;
use crate::hotkeys::HotkeySource;
use crate::postprocess::{OutputArtifact, PostProcessor};

/// Prepares system-audio routing before the session arms. Runs exactly once
/// per session, strictly before hotkey listening begins.
#[async_trait::async_trait]
pub trait RoutingProvisioner: Send + Sync {
    async fn provision(&self) -> Result<(), RecorderError>;
}

/// Timing knobs for the encoder startup wait. Defaults match production;
/// tests shrink them.
#[derive(Debug, Clone)]
pub struct SessionTiming {
    /// Interval between output-file existence checks.
    pub poll_interval: Duration,
    /// Upper bound on the whole existence poll.
    pub spawn_timeout: Duration,
    /// Wait after the output file appears before recording counts as started.
    /// Shares its budget with the duration pad baked into the encoder command.
    pub start_grace: Duration,
}

impl Default for SessionTiming {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            spawn_timeout: Duration::from_secs(15),
            start_grace: Duration::from_secs(2),
        }
    }
}

/// External collaborators the session drives.
pub struct SessionDeps {
    /// Present only when system audio is being routed.
    pub provisioner: Option<Arc<dyn RoutingProvisioner>>,
    pub launcher: Arc<dyn EncoderLauncher>,
    pub hotkeys: Arc<dyn HotkeySource>,
    pub flash: Arc<dyn FlashSignal>,
    pub postprocessor: Arc<dyn PostProcessor>,
}

/// One recording session: exclusive owner of the encoder process handle and
/// the session state. Not reentrant; construct a new one per run.
pub struct RecordingSession {
    config: CaptureConfig,
    source: AudioSource,
    command: Option<EncoderCommand>,
    state: SessionState,
    timing: SessionTiming,
    deps: SessionDeps,
}

impl RecordingSession {
    pub fn new(
        config: CaptureConfig,
        source: AudioSource,
        command: EncoderCommand,
        deps: SessionDeps,
    ) -> Self {
        Self {
            config,
            source,
            command: Some(command),
            state: SessionState::Idle,
            timing: SessionTiming::default(),
            deps,
        }
    }

    pub fn with_timing(mut self, timing: SessionTiming) -> Self {
        self.timing = timing;
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    fn transition(&mut self, next: SessionState) -> Result<(), RecorderError> {
        if !self.state.can_transition(next) {
            return Err(RecorderError::IllegalTransition {
                from: self.state,
                to: next,
            });
        }
        info!("session: {:?} -> {:?}", self.state, next);
        self.state = next;
        Ok(())
    }

    fn fail(&mut self) {
        if self.state.can_transition(SessionState::Failed) {
            let _ = self.transition(SessionState::Failed);
        }
    }

    /// Provision routing (when enabled) and enter Armed. The ready flash
    /// fires only after provisioning has fully completed.
    async fn arm(&mut self) -> Result<()> {
        if self.source.uses_system_audio() {
            if let Some(provisioner) = self.deps.provisioner.clone() {
                info!("Preparing system audio...");
                match provisioner.provision().await {
                    Ok(()) => info!("System audio ready"),
                    // Best-effort: the encoder may still run without
                    // confirmed routing.
                    Err(e) => warn!("proceeding without confirmed routing: {}", e),
                }
            }
        }

        self.transition(SessionState::Armed)?;
        self.deps.flash.fire();
        info!("Press Ctrl+F9 to start the recording...");
        Ok(())
    }

    /// Poll until the encoder has actually begun writing the output file.
    /// Process spawn alone does not guarantee the file exists yet.
    async fn await_output_file(&self) -> Result<(), RecorderError> {
        let deadline = tokio::time::Instant::now() + self.timing.spawn_timeout;
        while !self.config.output.exists() {
            if tokio::time::Instant::now() >= deadline {
                return Err(RecorderError::SpawnTimeout(self.timing.spawn_timeout));
            }
            tokio::time::sleep(self.timing.poll_interval).await;
        }
        Ok(())
    }

    /// Drive the full session: arm, wait for the start hotkey, encode until
    /// the stop trigger, then post-process.
    pub async fn run(&mut self) -> Result<OutputArtifact> {
        self.arm().await?;

        self.deps.hotkeys.wait_start().await?;
        info!("Preparing to record...");

        let command = self
            .command
            .take()
            .context("encoder command already consumed")?;
        let launched = self.deps.launcher.launch(&command).await;
        let mut process = match launched {
            Ok(p) => p,
            Err(e) => {
                self.fail();
                return Err(e.into());
            }
        };
        self.transition(SessionState::Encoding)?;

        let started = self.await_output_file().await;
        if let Err(e) = started {
            // The child may still be alive; always await its exit before
            // releasing it.
            let _ = process.send_stop().await;
            let _ = process.wait().await;
            self.fail();
            return Err(e.into());
        }
        tokio::time::sleep(self.timing.start_grace).await;
        self.deps.flash.fire();
        info!("Recording started!");

        let clean_exit = if self.config.duration.is_some() {
            // The -t bound baked into the command makes the encoder
            // self-terminate; the stop hotkey is not listened for.
            let success = process.wait().await?;
            self.transition(SessionState::Stopping)?;
            self.deps.flash.fire();
            success
        } else {
            info!("Press Ctrl+F10 to stop the recording...");
            self.deps.hotkeys.wait_stop().await?;
            self.transition(SessionState::Stopping)?;
            self.deps.flash.fire();
            if let Err(e) = process.send_stop().await {
                warn!("failed to send stop command: {}", e);
            }
            process.wait().await?
        };
        info!("Recording stopped");

        if !clean_exit && !self.config.output.exists() {
            self.fail();
            anyhow::bail!("encoder exited with an error and produced no output file");
        }

        self.transition(SessionState::PostProcessing)?;
        let finalized = self.deps.postprocessor.finalize(&self.config.output).await;
        match finalized {
            Ok(artifact) => {
                self.transition(SessionState::Done)?;
                info!("Recording saved to {}", artifact.path.display());
                Ok(artifact)
            }
            Err(e) => {
                self.fail();
                Err(e.into())
            }
        }
    }
}

// Session behavior is covered by the integration tests in
// tests/session_tests.rs, which drive run() against scripted collaborators.
