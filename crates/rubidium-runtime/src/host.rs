//! The host seam.
//!
//! The embedding VM is abstracted behind `HostRuntime` (the services
//! the context consumes) and `HostValue` (the host's own value
//! representation, the far side of the conversion bridge). Concrete
//! hosts live with the embedder; `ProcessHost` is a minimal
//! process-backed implementation.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;

/// A host string: byte-exact content plus the taint flag that must
/// survive conversion in both directions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostString {
    /// Byte content
    pub bytes: Vec<u8>,
    /// Untrusted-origin marker
    pub tainted: bool,
}

impl HostString {
    /// Untainted host string from text.
    pub fn from_str(text: &str) -> Self {
        Self {
            bytes: text.as_bytes().to_vec(),
            tainted: false,
        }
    }
}

/// The host VM's value representation.
#[derive(Debug, Clone, PartialEq)]
pub enum HostValue {
    /// Host nil
    Nil,
    /// The host's Kernel singleton
    Kernel,
    /// The host's top-level self
    TopSelf,
    /// Boolean
    Bool(bool),
    /// 64-bit integer (32-bit guest fixnums are widened into this)
    Fixnum(i64),
    /// Double
    Float(f64),
    /// Byte string with taint flag
    Str(HostString),
    /// Ordered sequence
    Array(Vec<HostValue>),
    /// Interned name token, keyed by text
    Symbol(String),
    /// Encoding registry entry, addressed by name
    Encoding(String),
    /// Host exception carrying its class name and message
    Exception {
        /// Host exception class name, e.g. "TypeError"
        class_name: String,
        /// Message text
        message: String,
    },
}

impl HostValue {
    /// Human-readable kind name for conversion diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            HostValue::Nil => "NilClass",
            HostValue::Kernel => "Kernel",
            HostValue::TopSelf => "Object",
            HostValue::Bool(_) => "Boolean",
            HostValue::Fixnum(_) => "Fixnum",
            HostValue::Float(_) => "Float",
            HostValue::Str(_) => "String",
            HostValue::Array(_) => "Array",
            HostValue::Symbol(_) => "Symbol",
            HostValue::Encoding(_) => "Encoding",
            HostValue::Exception { .. } => "Exception",
        }
    }
}

/// A host-configured output stream.
pub type HostOutput = Arc<Mutex<dyn Write + Send>>;

/// Services the context consumes from the embedding VM.
pub trait HostRuntime: Send + Sync {
    /// Current working directory, used to resolve relative load paths.
    fn current_directory(&self) -> PathBuf;

    /// Program arguments destined for guest `ARGV`.
    fn program_arguments(&self) -> Vec<String>;

    /// The host's effective load path, rewritten by the context during
    /// `initialize`.
    fn load_path(&self) -> Vec<String>;

    /// The host installation home, under which the guest library
    /// directories live.
    fn runtime_home(&self) -> String;

    /// Canonical encoding name from the host registry, None when the
    /// registry has no such entry.
    fn lookup_encoding(&self, name: &str) -> Option<String>;

    /// The host-configured output stream, None when it is plain
    /// process stdout. A non-default stream is captured by the context
    /// as its debug output.
    fn configured_output(&self) -> Option<HostOutput> {
        None
    }
}

/// Minimal host backed by the owning process.
#[derive(Debug, Default)]
pub struct ProcessHost;

impl HostRuntime for ProcessHost {
    fn current_directory(&self) -> PathBuf {
        std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
    }

    fn program_arguments(&self) -> Vec<String> {
        std::env::args().skip(1).collect()
    }

    fn load_path(&self) -> Vec<String> {
        Vec::new()
    }

    fn runtime_home(&self) -> String {
        ".".to_string()
    }

    fn lookup_encoding(&self, name: &str) -> Option<String> {
        ["UTF-8", "US-ASCII", "ASCII-8BIT"]
            .iter()
            .find(|candidate| candidate.eq_ignore_ascii_case(name))
            .map(|candidate| candidate.to_string())
    }
}
