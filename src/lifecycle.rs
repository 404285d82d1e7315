//! Process lifecycle: elevation bootstrap and one-shot cleanup.
//!
//! Driver install/uninstall and default-device switches need administrator
//! rights, so a non-elevated run relaunches itself via UAC. Cleanup of
//! routing side effects must happen exactly once whether the program exits
//! normally, errors out, or the console window is closed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use tracing::info;

/// Idempotent teardown handle. Cloneable; all clones share the same
/// "already done" flag, so the closure runs at most once no matter which
/// path (normal exit, error exit, console close) invokes it first.
#[derive(Clone)]
pub struct CleanupGuard {
    done: Arc<AtomicBool>,
    teardown: Arc<dyn Fn() + Send + Sync>,
}

impl CleanupGuard {
    pub fn new(teardown: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            done: Arc::new(AtomicBool::new(false)),
            teardown: Arc::new(teardown),
        }
    }

    /// Run the teardown if no other caller has.
    pub fn run(&self) {
        if self
            .done
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            info!("running cleanup");
            (self.teardown)();
        }
    }

    pub fn has_run(&self) -> bool {
        self.done.load(Ordering::SeqCst)
    }
}

static CONSOLE_GUARD: OnceLock<CleanupGuard> = OnceLock::new();

/// Register a console control handler so cleanup also runs on console
/// close, user logoff, or system shutdown. Windows only; a second call is
/// ignored.
pub fn register_console_close_handler(guard: CleanupGuard) {
    if CONSOLE_GUARD.set(guard).is_err() {
        return;
    }

    #[cfg(windows)]
    unsafe {
        use windows_sys::Win32::System::Console::SetConsoleCtrlHandler;
        SetConsoleCtrlHandler(Some(console_handler), 1);
    }
}

#[cfg(windows)]
unsafe extern "system" fn console_handler(event: u32) -> windows_sys::Win32::Foundation::BOOL {
    use windows_sys::Win32::System::Console::{
        CTRL_CLOSE_EVENT, CTRL_LOGOFF_EVENT, CTRL_SHUTDOWN_EVENT,
    };

    if matches!(event, CTRL_CLOSE_EVENT | CTRL_LOGOFF_EVENT | CTRL_SHUTDOWN_EVENT) {
        if let Some(guard) = CONSOLE_GUARD.get() {
            guard.run();
        }
    }
    0
}

/// Relaunch the process elevated if it is not already running as
/// administrator. On relaunch the current process exits; the elevated copy
/// carries the original arguments. No-op off Windows.
pub fn ensure_elevated() {
    #[cfg(windows)]
    {
        use windows_sys::Win32::UI::Shell::{IsUserAnAdmin, ShellExecuteW};

        unsafe {
            if IsUserAnAdmin() != 0 {
                return;
            }
        }

        let exe = match std::env::current_exe() {
            Ok(e) => e,
            Err(_) => return,
        };
        let args = std::env::args()
            .skip(1)
            .map(|a| format!("\"{}\"", a))
            .collect::<Vec<_>>()
            .join(" ");

        info!("not elevated, relaunching with administrator rights");

        let verb = to_wide("runas");
        let file = to_wide(&exe.to_string_lossy());
        let params = to_wide(&args);

        unsafe {
            ShellExecuteW(
                std::ptr::null_mut(),
                verb.as_ptr(),
                file.as_ptr(),
                params.as_ptr(),
                std::ptr::null(),
                1, // SW_SHOWNORMAL
            );
        }
        std::process::exit(0);
    }
}

#[cfg(windows)]
fn to_wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}
