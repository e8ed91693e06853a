//! Window-manager seam for the window-control channels.
//!
//! The host process owns the real window; the bridge only forwards
//! validated control requests through this trait. A real shell plugs its
//! window in at startup; the headless implementation below backs the host
//! binary and tests, where there is no native window to drive.

use std::sync::atomic::{AtomicBool, Ordering};

use log::info;

/// Privileged window operations reachable through the `window:*` channels.
pub trait WindowManager: Send + Sync {
    fn minimize(&self);
    fn maximize(&self);
    fn unmaximize(&self);
    fn close(&self);
    fn is_maximized(&self) -> bool;
}

/// Logical window state with no native backing.
#[derive(Default)]
pub struct HeadlessWindowManager {
    maximized: AtomicBool,
    minimized: AtomicBool,
    closed: AtomicBool,
}

impl HeadlessWindowManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `close` has been requested.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl WindowManager for HeadlessWindowManager {
    fn minimize(&self) {
        self.minimized.store(true, Ordering::SeqCst);
        self.maximized.store(false, Ordering::SeqCst);
    }

    fn maximize(&self) {
        self.maximized.store(true, Ordering::SeqCst);
        self.minimized.store(false, Ordering::SeqCst);
    }

    fn unmaximize(&self) {
        self.maximized.store(false, Ordering::SeqCst);
    }

    fn close(&self) {
        info!("Window close requested");
        self.closed.store(true, Ordering::SeqCst);
    }

    fn is_maximized(&self) -> bool {
        self.maximized.load(Ordering::SeqCst)
    }
}
