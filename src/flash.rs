//! Best-effort visual feedback.
//!
//! A near-transparent fullscreen flash marks the armed/started/stopped
//! moments. Firing is detached: the session never waits on it and failures
//! are silently dropped.

/// Fire-and-forget visual signal.
pub trait FlashSignal: Send + Sync {
    fn fire(&self);
}

/// Brief fullscreen overlay (100 ms, 2% opacity) on Windows; no-op elsewhere.
pub struct ScreenFlash;

impl FlashSignal for ScreenFlash {
    #[cfg(windows)]
    fn fire(&self) {
        std::thread::spawn(|| {
            let _ = std::process::Command::new("powershell")
                .args([
                    "-NoProfile",
                    "-Command",
                    "Add-Type -AssemblyName System.Windows.Forms; \
                     $f = New-Object System.Windows.Forms.Form; \
                     $f.FormBorderStyle = 'None'; \
                     $f.WindowState = 'Maximized'; \
                     $f.TopMost = $true; \
                     $f.BackColor = 'White'; \
                     $f.Opacity = 0.02; \
                     $f.Show(); \
                     Start-Sleep -Milliseconds 100; \
                     $f.Close()",
                ])
                .stdout(std::process::Stdio::null())
                .stderr(std::process::Stdio::null())
                .status();
        });
    }

    #[cfg(not(windows))]
    fn fire(&self) {}
}
