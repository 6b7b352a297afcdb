//! Tracing hooks.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::value::ProcObject;

/// Holds the installed `set_trace_func` handler, if any. The context
/// owns one of these; firing trace events is the interpreter's job and
/// outside the core contract.
#[derive(Default)]
pub struct TraceManager {
    handler: RwLock<Option<Arc<ProcObject>>>,
}

impl TraceManager {
    /// New manager with tracing disabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Install or clear the trace handler.
    pub fn set_handler(&self, handler: Option<Arc<ProcObject>>) {
        *self.handler.write() = handler;
    }

    /// The installed handler.
    pub fn handler(&self) -> Option<Arc<ProcObject>> {
        self.handler.read().clone()
    }

    /// True when a handler is installed.
    pub fn is_enabled(&self) -> bool {
        self.handler.read().is_some()
    }
}
