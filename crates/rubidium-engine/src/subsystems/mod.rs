//! Collaborator subsystems owned by the runtime context.
//!
//! The context wires these together and drives their lifecycle; their
//! internals are not part of the core contract beyond what the context
//! relies on (at-exit ordering and isolation, thread manager shut down
//! last, safepoints consultable for global operations).

mod at_exit;
mod instrumentation;
mod safepoint;
mod thread_manager;
mod trace;

pub use at_exit::{AtExitAction, AtExitManager};
pub use instrumentation::InstrumentationServer;
pub use safepoint::SafepointManager;
pub use thread_manager::ThreadManager;
pub use trace::TraceManager;
