//! Rubidium Runtime
//!
//! The global execution context of a running Rubidium system, embedded
//! inside a host VM. Owns process-wide interpreter state, loads and
//! executes source units, assigns object identities, and bridges values
//! between the host's native representation and the guest's.

#![warn(rust_2018_idioms)]

pub mod bridge;
pub mod context;
pub mod error;
pub mod host;
pub mod loader;

pub use context::{RuntimeContext, RuntimeOptions};
pub use error::{RuntimeError, RuntimeResult};
pub use host::{HostRuntime, HostString, HostValue, ProcessHost};
pub use loader::{SourceCache, SourceLoader, CLASSPATH_SCHEME, RUBIDIUM_SCHEME};
