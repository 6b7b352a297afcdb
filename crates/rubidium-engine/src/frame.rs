//! Frames and the packed calling convention.
//!
//! Every invocation in the engine goes through one argument shape:
//! method, declaration frame, receiver, block, declaration context, and
//! positional arguments. Materialized frames add named local slots and
//! are what bindings capture.

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::method::InternalMethod;
use crate::value::{ProcObject, Value};

/// The syntactic circumstance a unit of code executes under. Recorded
/// with every invocation; governs receiver, declaring scope, and
/// visibility of synthetic methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationContext {
    /// Top-level load
    TopLevel,
    /// Ordinary method body
    Method,
    /// Module or class body
    Module,
    /// `instance_eval` body
    InstanceEval,
    /// `eval` against a binding; always carries the context inherited
    /// from the captured frame, never `TopLevel`
    Eval,
}

/// The packed argument frame passed to every call target.
#[derive(Clone)]
pub struct PackedArguments {
    /// Method being invoked (None only for bootstrap frames)
    pub method: Option<Arc<InternalMethod>>,
    /// Enclosing frame for methods that close over one
    pub declaration_frame: Option<Arc<MaterializedFrame>>,
    /// Receiver
    pub self_value: Value,
    /// Block argument
    pub block: Option<Arc<ProcObject>>,
    /// Declaration context of this invocation
    pub declaration_context: DeclarationContext,
    /// Positional arguments
    pub arguments: Vec<Value>,
}

impl PackedArguments {
    /// Pack an argument frame.
    pub fn pack(
        method: Option<Arc<InternalMethod>>,
        declaration_frame: Option<Arc<MaterializedFrame>>,
        self_value: Value,
        block: Option<Arc<ProcObject>>,
        declaration_context: DeclarationContext,
        arguments: Vec<Value>,
    ) -> Self {
        Self {
            method,
            declaration_frame,
            self_value,
            block,
            declaration_context,
            arguments,
        }
    }
}

/// A frame that outlives its activation: packed arguments plus named
/// local slots. Captured by bindings and used as the parent frame of
/// evals.
pub struct MaterializedFrame {
    /// The arguments the frame was entered with
    pub arguments: PackedArguments,
    locals: RwLock<FxHashMap<String, Value>>,
}

impl MaterializedFrame {
    /// Frame over `arguments` with no locals.
    pub fn new(arguments: PackedArguments) -> Arc<Self> {
        Arc::new(Self {
            arguments,
            locals: RwLock::new(FxHashMap::default()),
        })
    }

    /// Receiver captured by this frame.
    pub fn self_value(&self) -> Value {
        self.arguments.self_value.clone()
    }

    /// Declaration context captured by this frame.
    pub fn declaration_context(&self) -> DeclarationContext {
        self.arguments.declaration_context
    }

    /// Read a named local.
    pub fn local(&self, name: &str) -> Option<Value> {
        self.locals.read().get(name).cloned()
    }

    /// Create or overwrite a named local.
    pub fn set_local(&self, name: &str, value: Value) {
        self.locals.write().insert(name.to_string(), value);
    }
}

impl std::fmt::Debug for MaterializedFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MaterializedFrame")
            .field("declaration_context", &self.arguments.declaration_context)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locals_are_settable_and_readable() {
        let frame = MaterializedFrame::new(PackedArguments::pack(
            None,
            None,
            Value::Nil,
            None,
            DeclarationContext::TopLevel,
            vec![],
        ));
        assert!(frame.local("x").is_none());
        frame.set_local("x", Value::Int(5));
        assert_eq!(frame.local("x"), Some(Value::Int(5)));
    }
}
