//! The translator seam.
//!
//! The parser/translator that turns source text into an executable tree
//! is an external collaborator. The engine only defines the interface it
//! consumes: a parse mode, a `translate` entry point, and the executable
//! unit the context wraps into a synthetic method.

use std::sync::Arc;

use crate::frame::{MaterializedFrame, PackedArguments};
use crate::method::SharedMethodInfo;
use crate::source::SourceUnit;
use crate::value::Value;
use crate::{EngineError, EngineResult};

/// How a source unit is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserMode {
    /// Top-level load of a file
    TopLevel,
    /// Module or class body
    Module,
    /// Eval with an inherited lexical scope
    Eval,
    /// Inline evaluation with a synthesized frame
    Inline,
}

/// The callable body of an executable unit.
pub type CallTarget = Arc<dyn Fn(&PackedArguments) -> EngineResult<Value> + Send + Sync>;

/// A translated, callable source unit.
#[derive(Clone)]
pub struct ExecutableUnit {
    /// Name/origin of the callable root
    pub info: SharedMethodInfo,
    /// Entry point
    pub call_target: CallTarget,
}

impl ExecutableUnit {
    /// Unit with `info` and `call_target`.
    pub fn new(info: SharedMethodInfo, call_target: CallTarget) -> Self {
        Self { info, call_target }
    }
}

impl std::fmt::Debug for ExecutableUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutableUnit")
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}

/// Source → executable-unit translation service.
///
/// `parent_frame` is the enclosing frame for evals that must see a
/// captured binding; `own_scope_for_assignments` controls whether new
/// assignments get their own scope or escape into the parent's.
pub trait Translator: Send + Sync {
    /// Translate `source` under `mode`.
    fn translate(
        &self,
        source: &SourceUnit,
        mode: ParserMode,
        parent_frame: Option<&Arc<MaterializedFrame>>,
        own_scope_for_assignments: bool,
    ) -> Result<ExecutableUnit, EngineError>;
}
