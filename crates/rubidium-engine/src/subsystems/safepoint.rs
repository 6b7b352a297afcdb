//! Safepoints.
//!
//! The context does not implement safepoint polling itself; it only
//! needs a consultable handle that pauses all guest threads for the
//! duration of a global operation. Guest threads enter the phase lock
//! around their execution slices; a global operation takes the lock
//! exclusively.

use parking_lot::RwLock;

/// Pause-all coordination for global operations.
#[derive(Default)]
pub struct SafepointManager {
    phase: RwLock<()>,
}

impl SafepointManager {
    /// New manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `action` with all cooperating guest threads paused.
    pub fn pause_all_and_run<R>(&self, action: impl FnOnce() -> R) -> R {
        let _exclusive = self.phase.write();
        action()
    }

    /// Enter a guest execution slice. Blocks while a global operation
    /// is in progress.
    pub fn enter<R>(&self, slice: impl FnOnce() -> R) -> R {
        let _shared = self.phase.read();
        slice()
    }
}
