//! Global hotkey source.
//!
//! Fixed combinations: Ctrl+F9 arms the actual recording start, Ctrl+F10
//! stops an unbounded session. The Windows implementation registers the
//! hotkey on a dedicated blocking thread (RegisterHotKey requires the
//! message loop to run on the registering thread); other platforms get a
//! placeholder that bails.

use anyhow::Result;

/// Blocking-wait source of the start/stop hotkey events. One event per
/// arm/stop cycle.
#[async_trait::async_trait]
pub trait HotkeySource: Send + Sync {
    /// Resolves when the start combination (Ctrl+F9) is pressed.
    async fn wait_start(&self) -> Result<()>;

    /// Resolves when the stop combination (Ctrl+F10) is pressed.
    async fn wait_stop(&self) -> Result<()>;
}

#[cfg(windows)]
const HOTKEY_START_ID: i32 = 1;
#[cfg(windows)]
const HOTKEY_STOP_ID: i32 = 2;

/// System-wide Ctrl+F9 / Ctrl+F10 hotkeys.
pub struct GlobalHotkeys;

#[cfg(windows)]
mod win {
    use windows_sys::Win32::UI::Input::KeyboardAndMouse::{
        RegisterHotKey, UnregisterHotKey, MOD_CONTROL, VK_F10, VK_F9,
    };
    use windows_sys::Win32::UI::WindowsAndMessaging::{GetMessageW, MSG, WM_HOTKEY};

    /// Register the hotkey on this thread and pump messages until it fires.
    pub fn wait_for(id: i32) -> anyhow::Result<()> {
        let vk = match id {
            super::HOTKEY_START_ID => VK_F9,
            _ => VK_F10,
        };

        unsafe {
            if RegisterHotKey(std::ptr::null_mut(), id, MOD_CONTROL, vk as u32) == 0 {
                anyhow::bail!("RegisterHotKey failed for id {}", id);
            }

            let mut msg: MSG = std::mem::zeroed();
            loop {
                let ret = GetMessageW(&mut msg, std::ptr::null_mut(), 0, 0);
                if ret <= 0 {
                    UnregisterHotKey(std::ptr::null_mut(), id);
                    anyhow::bail!("hotkey message loop ended unexpectedly");
                }
                if msg.message == WM_HOTKEY && msg.wParam == id as usize {
                    UnregisterHotKey(std::ptr::null_mut(), id);
                    return Ok(());
                }
            }
        }
    }
}

#[cfg(windows)]
#[async_trait::async_trait]
impl HotkeySource for GlobalHotkeys {
    async fn wait_start(&self) -> Result<()> {
        tokio::task::spawn_blocking(|| win::wait_for(HOTKEY_START_ID)).await?
    }

    async fn wait_stop(&self) -> Result<()> {
        tokio::task::spawn_blocking(|| win::wait_for(HOTKEY_STOP_ID)).await?
    }
}

#[cfg(not(windows))]
#[async_trait::async_trait]
impl HotkeySource for GlobalHotkeys {
    async fn wait_start(&self) -> Result<()> {
        anyhow::bail!("global hotkeys are only available on Windows")
    }

    async fn wait_stop(&self) -> Result<()> {
        anyhow::bail!("global hotkeys are only available on Windows")
    }
}
