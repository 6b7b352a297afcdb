//! Rubidium Engine
//!
//! Guest object model and engine services for the Rubidium runtime:
//! - Value representation and core-library bootstrap
//! - Symbol table (interned, identity-comparable names)
//! - Object-identity allocation
//! - Frames, packed call arguments, and internal methods
//! - The translator seam (source → executable unit)
//! - Collaborator subsystems (threads, safepoints, tracing, at-exit,
//!   instrumentation)

#![warn(rust_2018_idioms)]

pub mod core_library;
pub mod frame;
pub mod method;
pub mod object_id;
pub mod source;
pub mod subsystems;
pub mod symbol;
pub mod translator;
pub mod value;

pub use core_library::{CoreLibrary, LexicalScope};
pub use frame::{DeclarationContext, MaterializedFrame, PackedArguments};
pub use method::{lookup_method, InternalMethod, SharedMethodInfo, Visibility};
pub use object_id::ObjectIdAllocator;
pub use source::SourceUnit;
pub use symbol::SymbolTable;
pub use translator::{CallTarget, ExecutableUnit, ParserMode, Translator};
pub use value::{
    BasicObject, BindingObject, ExceptionObject, ModuleObject, ProcObject, RubidiumArray,
    RubidiumEncoding, RubidiumString, RubidiumSymbol, Value,
};

/// Engine-level errors.
///
/// Guest-level raised exceptions travel as `Raise` and must propagate
/// unmodified through every layer back to the original native caller.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EngineError {
    /// A guest exception was raised during translation or execution.
    #[error("{0}")]
    Raise(Value),

    /// The translator rejected the source unit.
    #[error("syntax error in {source_name}: {message}")]
    Syntax {
        /// Name of the offending source unit
        source_name: String,
        /// Translator-provided detail
        message: String,
    },

    /// An engine operation was invoked outside its contract.
    #[error("{0}")]
    Unsupported(String),
}

/// Engine result alias.
pub type EngineResult<T> = Result<T, EngineError>;
