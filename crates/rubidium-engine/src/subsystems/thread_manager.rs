//! Guest thread tracking.
//!
//! The context owns one thread manager; guest threads register their
//! join handles here so teardown can drain them. Per the shutdown
//! contract this manager is always the last subsystem stopped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;

use parking_lot::Mutex;

/// Tracks live guest threads and joins them at shutdown.
pub struct ThreadManager {
    parallelism: usize,
    running: AtomicBool,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl ThreadManager {
    /// Manager sized to `threads` workers; 0 means one per CPU.
    pub fn new(threads: usize) -> Self {
        let parallelism = if threads == 0 {
            num_cpus::get()
        } else {
            threads
        };

        Self {
            parallelism,
            running: AtomicBool::new(false),
            handles: Mutex::new(Vec::new()),
        }
    }

    /// Mark the manager live. Must be called once during context
    /// construction, after the core library exists.
    pub fn initialize(&self) {
        self.running.store(true, Ordering::SeqCst);
    }

    /// Worker parallelism the embedder configured.
    pub fn parallelism(&self) -> usize {
        self.parallelism
    }

    /// True between `initialize` and `shutdown`.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Track a guest thread for teardown.
    pub fn register(&self, handle: JoinHandle<()>) {
        self.handles.lock().push(handle);
    }

    /// Stop accepting guest threads and join every tracked one. Called
    /// last during context teardown.
    pub fn shutdown(&self) {
        self.running.store(false, Ordering::SeqCst);

        let handles = std::mem::take(&mut *self.handles.lock());
        for handle in handles {
            // A panicked guest thread has already reported; ignore here.
            let _ = handle.join();
        }
    }
}
