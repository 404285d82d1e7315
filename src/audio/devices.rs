//! Audio endpoint directory.
//!
//! The session only needs three operations against the OS audio stack:
//! enumerate active endpoints, read the current default for a direction,
//! and force an endpoint to be the default. The production implementation
//! shells out to PowerShell (AudioDeviceCmdlets) and parses its JSON
//! output; tests substitute an in-memory directory.

use std::process::Command;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tracing::debug;

use super::route::{AudioSource, CABLE_CAPTURE_DEVICE};
use crate::error::RecorderError;

/// Endpoint direction: playback (render) or recording (capture).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Render,
    Capture,
}

impl Direction {
    fn cmdlet_type(self) -> &'static str {
        match self {
            Direction::Render => "Playback",
            Direction::Capture => "Recording",
        }
    }
}

/// Default-endpoint roles a device can be assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Console,
    Communications,
}

/// One active audio endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct AudioDevice {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Name")]
    pub name: String,
}

pub trait DeviceDirectory: Send + Sync {
    fn list_devices(&self, direction: Direction) -> Result<Vec<AudioDevice>>;
    fn set_default(&self, id: &str, roles: &[Role]) -> Result<()>;
    fn get_default(&self, direction: Direction) -> Result<Option<AudioDevice>>;
}

/// Resolve the dshow capture device names for the planned sources, in
/// ingestion order. System audio always records from the virtual cable's
/// capture endpoint; the microphone records from the current default
/// capture device.
pub fn resolve_capture_devices(
    source: AudioSource,
    directory: &dyn DeviceDirectory,
) -> Result<Vec<String>> {
    let mut devices = Vec::new();

    if source.uses_system_audio() {
        devices.push(CABLE_CAPTURE_DEVICE.to_string());
    }
    if source.uses_microphone() {
        let mic = directory
            .get_default(Direction::Capture)?
            .ok_or(RecorderError::DeviceNotFound { role: "microphone" })?;
        devices.push(mic.name);
    }

    Ok(devices)
}

/// PowerShell-backed directory for the Windows audio stack.
pub struct PowershellDeviceDirectory;

impl PowershellDeviceDirectory {
    fn run(script: &str) -> Result<String> {
        let output = Command::new("powershell")
            .args(["-NoProfile", "-Command", script])
            .output()
            .context("failed to run powershell")?;

        if !output.status.success() {
            bail!(
                "powershell exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// `ConvertTo-Json` collapses single-element arrays to a bare object.
    fn parse_devices(json: &str) -> Result<Vec<AudioDevice>> {
        let json = json.trim();
        if json.is_empty() {
            return Ok(vec![]);
        }
        if json.starts_with('[') {
            Ok(serde_json::from_str(json)?)
        } else {
            Ok(vec![serde_json::from_str(json)?])
        }
    }
}

impl DeviceDirectory for PowershellDeviceDirectory {
    fn list_devices(&self, direction: Direction) -> Result<Vec<AudioDevice>> {
        let script = format!(
            "Get-AudioDevice -List | Where-Object Type -eq '{}' | \
             Select-Object ID, Name | ConvertTo-Json -Compress",
            direction.cmdlet_type()
        );
        let out = Self::run(&script)?;
        let devices = Self::parse_devices(&out)?;
        debug!("{} active {:?} devices", devices.len(), direction);
        Ok(devices)
    }

    fn set_default(&self, id: &str, roles: &[Role]) -> Result<()> {
        // Set-AudioDevice assigns the console default; the communications
        // role needs a second pass with -CommunicationDevice.
        Self::run(&format!("Set-AudioDevice -ID '{}' | Out-Null", id))?;
        if roles.contains(&Role::Communications) {
            Self::run(&format!(
                "Set-AudioDevice -ID '{}' -CommunicationDevice | Out-Null",
                id
            ))?;
        }
        Ok(())
    }

    fn get_default(&self, direction: Direction) -> Result<Option<AudioDevice>> {
        let script = format!(
            "Get-AudioDevice -{} | Select-Object ID, Name | ConvertTo-Json -Compress",
            direction.cmdlet_type()
        );
        let out = Self::run(&script)?;
        Ok(Self::parse_devices(&out)?.into_iter().next())
    }
}
