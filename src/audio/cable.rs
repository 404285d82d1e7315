//! VB-Audio Virtual Cable driver management and system-audio routing.
//!
//! Provisioning is strictly sequential: install the driver, restart the
//! audio services so endpoints reappear, switch the OS defaults onto the
//! cable, then start the repeater that forwards cable audio back to the
//! real speakers. Each step is attempted exactly once; failures are
//! reported upward and the session decides whether to proceed.

use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};

use super::devices::{DeviceDirectory, Direction, Role};
use crate::error::RecorderError;
use crate::session::RoutingProvisioner;

/// Render endpoint name fragment for the cable (the 16ch variant is skipped).
const CABLE_RENDER_FRAGMENT: &str = "vb-audio virtual cable";
/// dshow truncates long device names; the repeater matches on this prefix.
const REPEATER_INPUT: &str = "CABLE Output (VB-Audio Virtual";

/// Manages the virtual cable driver and the audio repeater helper.
///
/// All operations are idempotent enough to be safe from the shutdown path.
#[derive(Debug, Clone)]
pub struct CableManager {
    inf_path: PathBuf,
    repeater_path: PathBuf,
}

impl CableManager {
    pub fn new() -> Self {
        let base = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|d| d.join("dependencies")))
            .unwrap_or_else(|| PathBuf::from("dependencies"));

        Self {
            inf_path: base.join("vbMmeCable64_win10.inf"),
            repeater_path: base.join("audiorepeater.exe"),
        }
    }

    /// Install the cable driver with pnputil. A non-zero exit is logged but
    /// not fatal: the driver may already be present.
    pub fn install(&self) -> Result<()> {
        let output = Command::new("pnputil")
            .args(["/add-driver"])
            .arg(&self.inf_path)
            .arg("/install")
            .output()
            .context("failed to run pnputil")?;

        if output.status.success() {
            info!("VB-Cable installed");
        } else {
            warn!(
                "VB-Cable installation returned {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stdout).trim()
            );
        }

        // Give the driver a moment to settle before endpoints are rebuilt.
        std::thread::sleep(Duration::from_secs(1));
        self.restart_audio_services()
    }

    pub fn uninstall(&self) {
        let _ = Command::new("pnputil")
            .args(["/delete-driver"])
            .arg(&self.inf_path)
            .arg("/uninstall")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
        info!("VB-Cable uninstalled");

        if let Err(e) = self.restart_audio_services() {
            warn!("audio service restart after uninstall failed: {}", e);
        }
    }

    /// Restart Audiosrv and AudioEndpointBuilder so endpoints reinitialize.
    pub fn restart_audio_services(&self) -> Result<()> {
        Command::new("powershell")
            .args([
                "-NoProfile",
                "-Command",
                "Stop-Service Audiosrv -Force; \
                 Stop-Service AudioEndpointBuilder -Force; \
                 Start-Service AudioEndpointBuilder; \
                 Start-Service Audiosrv",
            ])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .context("failed to restart audio services")?;
        info!("Audio services restarted");
        Ok(())
    }

    /// Make the cable's render and capture endpoints the OS defaults for
    /// both console and communications roles.
    pub fn set_cable_default(&self, directory: &dyn DeviceDirectory) -> Result<()> {
        let roles = [Role::Console, Role::Communications];

        let render = directory.list_devices(Direction::Render)?;
        if let Some(device) = render.iter().find(|d| {
            let name = d.name.to_lowercase();
            name.contains(CABLE_RENDER_FRAGMENT) && !name.contains("16")
        }) {
            directory.set_default(&device.id, &roles)?;
        }

        let capture = directory.list_devices(Direction::Capture)?;
        if let Some(device) = capture
            .iter()
            .find(|d| d.name == super::route::CABLE_CAPTURE_DEVICE)
        {
            directory.set_default(&device.id, &roles)?;
        }

        info!("VB-Audio devices set as defaults");
        Ok(())
    }

    /// Start the repeater forwarding cable audio to the real speakers, so
    /// the user still hears what is being recorded. Runs hidden.
    pub fn start_repeater(&self, output_device: &str) -> Result<()> {
        Command::new("powershell")
            .args([
                "-NoProfile",
                "-Command",
                &format!(
                    "Start-Process -FilePath \"{}\" \
                     -ArgumentList '/Input:\"{}\" /Output:\"{}\" /AutoStart' \
                     -WindowStyle Hidden",
                    self.repeater_path.display(),
                    REPEATER_INPUT,
                    output_device
                ),
            ])
            .status()
            .context("failed to start audiorepeater")?;
        info!("AudioRepeater started");
        Ok(())
    }

    pub fn stop_repeater(&self) {
        let _ = Command::new("powershell")
            .args(["-NoProfile", "-Command", "Stop-Process -Name \"audiorepeater\" -Force"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
        info!("AudioRepeater stopped");
    }

    /// Tear down all routing side effects. Safe to call more than once and
    /// from the console-close path; the cleanup guard ensures it actually
    /// runs at most once.
    pub fn teardown(&self) {
        self.stop_repeater();
        self.uninstall();
    }
}

impl Default for CableManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Production routing provisioner: full cable setup on a blocking thread.
pub struct CableProvisioner {
    pub manager: CableManager,
    pub directory: Arc<dyn DeviceDirectory>,
    /// Name of the real default speakers, resolved before any default switch.
    pub speaker_name: String,
}

#[async_trait::async_trait]
impl RoutingProvisioner for CableProvisioner {
    async fn provision(&self) -> Result<(), RecorderError> {
        let manager = self.manager.clone();
        let directory = Arc::clone(&self.directory);
        let speaker = self.speaker_name.clone();

        tokio::task::spawn_blocking(move || {
            manager.install()?;
            manager.set_cable_default(directory.as_ref())?;
            manager.start_repeater(&speaker)
        })
        .await
        .map_err(|e| RecorderError::Driver(format!("provisioning task panicked: {e}")))?
        .map_err(|e| RecorderError::Driver(format!("{e:#}")))
    }
}
