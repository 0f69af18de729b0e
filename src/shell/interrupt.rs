//! Ctrl-C handling.
//!
//! The first interrupt only raises a flag; the orchestrator checks it between
//! steps, stops cleanly and still produces a partial report. A running child
//! process receives the console interrupt on its own.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

static INTERRUPTED: OnceLock<Arc<AtomicBool>> = OnceLock::new();

fn flag() -> &'static Arc<AtomicBool> {
    INTERRUPTED.get_or_init(|| Arc::new(AtomicBool::new(false)))
}

/// Handle for cancelling a running plan.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    /// A fresh handle not tied to any signal.
    pub fn new() -> Self {
        Self::default()
    }

    /// A handle raised by the process-wide interrupt handler.
    pub fn from_interrupts() -> Self {
        Self {
            flag: Arc::clone(flag()),
        }
    }

    /// Request cancellation.
    ///
    /// The plan stops at the next step boundary.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Check if cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Install the process-wide Ctrl-C handler.
///
/// Safe to call more than once.
pub fn install_handler() {
    let _ = flag();
    platform::install();
}

#[cfg(unix)]
mod platform {
    extern "C" fn on_sigint(_signal: libc::c_int) {
        if let Some(flag) = super::INTERRUPTED.get() {
            flag.store(true, std::sync::atomic::Ordering::SeqCst);
        }
    }

    pub(super) fn install() {
        let handler = on_sigint as extern "C" fn(libc::c_int);
        // SAFETY: the handler only performs an atomic store on an already
        // initialized static, which is async-signal-safe.
        unsafe {
            libc::signal(libc::SIGINT, handler as libc::sighandler_t);
        }
    }
}

#[cfg(windows)]
mod platform {
    use winapi::shared::minwindef::{BOOL, DWORD, FALSE, TRUE};
    use winapi::um::consoleapi::SetConsoleCtrlHandler;
    use winapi::um::wincon::{CTRL_BREAK_EVENT, CTRL_C_EVENT};

    unsafe extern "system" fn on_ctrl(event: DWORD) -> BOOL {
        match event {
            CTRL_C_EVENT | CTRL_BREAK_EVENT => {
                if let Some(flag) = super::INTERRUPTED.get() {
                    flag.store(true, std::sync::atomic::Ordering::SeqCst);
                }
                TRUE
            }
            _ => FALSE,
        }
    }

    pub(super) fn install() {
        // SAFETY: registers a static function pointer; the handler only
        // touches an atomic.
        unsafe {
            SetConsoleCtrlHandler(Some(on_ctrl), TRUE);
        }
    }
}

#[cfg(not(any(unix, windows)))]
mod platform {
    pub(super) fn install() {}
}
