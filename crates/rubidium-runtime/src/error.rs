//! Runtime error types.

use rubidium_engine::EngineError;

/// Errors that can occur during loading, conversion, or execution.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// File I/O error during source resolution; propagated to the
    /// caller of `load`, never retried
    #[error("{0}")]
    Io(#[from] std::io::Error),

    /// Source resolution failure that is not a plain I/O error
    #[error("load error: {0}")]
    Load(String),

    /// Engine-level failure, including guest exceptions propagating
    /// unmodified
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// A guest value has no host mapping
    #[error("cannot pass {value} ({kind}) to the host")]
    HostConversion {
        /// Display form of the offending value
        value: String,
        /// Runtime kind name
        kind: String,
    },

    /// A host exception class outside the fixed translation map
    #[error("don't know how to translate {class_name}")]
    ExceptionTranslation {
        /// Host exception class name
        class_name: String,
    },

    /// An encoding name absent from the host registry
    #[error("unknown encoding: {0}")]
    UnknownEncoding(String),

    /// A programming-contract violation by the native caller
    #[error("{0}")]
    Contract(String),
}

/// Runtime result alias.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
