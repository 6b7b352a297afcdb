//! Internal methods and method resolution.

use std::sync::Arc;

use crate::frame::MaterializedFrame;
use crate::translator::CallTarget;
use crate::value::ModuleObject;

/// Method visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Callable from anywhere
    Public,
    /// Callable without an explicit receiver only
    Private,
    /// Callable from instances of the declaring module
    Protected,
}

/// Name and origin of a callable, shared between a method and the
/// executable unit it wraps.
#[derive(Debug, Clone)]
pub struct SharedMethodInfo {
    /// Method name, e.g. "<main>" for top-level loads
    pub name: String,
    /// Name of the source unit the method came from
    pub source_name: String,
}

impl SharedMethodInfo {
    /// Info for a named callable from `source_name`.
    pub fn new(name: &str, source_name: &str) -> Self {
        Self {
            name: name.to_string(),
            source_name: source_name.to_string(),
        }
    }
}

/// A bound, invocable method.
pub struct InternalMethod {
    /// Shared name/origin info
    pub info: SharedMethodInfo,
    /// Name the method is reachable under
    pub name: String,
    /// Module the method is defined in; the declaring scope of code it
    /// executes
    pub declaring_module: Arc<ModuleObject>,
    /// Visibility
    pub visibility: Visibility,
    /// True when the method has been explicitly undefined; lookup treats
    /// it as absent
    pub undefined: bool,
    /// Executable body
    pub call_target: CallTarget,
    /// Frame the method closes over, if any
    pub declaration_frame: Option<Arc<MaterializedFrame>>,
}

impl InternalMethod {
    /// New method.
    pub fn new(
        info: SharedMethodInfo,
        declaring_module: Arc<ModuleObject>,
        visibility: Visibility,
        undefined: bool,
        call_target: CallTarget,
        declaration_frame: Option<Arc<MaterializedFrame>>,
    ) -> Arc<Self> {
        let name = info.name.clone();
        Arc::new(Self {
            info,
            name,
            declaring_module,
            visibility,
            undefined,
            call_target,
            declaration_frame,
        })
    }
}

impl std::fmt::Debug for InternalMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InternalMethod")
            .field("name", &self.name)
            .field("declaring_module", &self.declaring_module.name)
            .field("visibility", &self.visibility)
            .field("undefined", &self.undefined)
            .finish_non_exhaustive()
    }
}

/// Resolve `name` starting at `module`, following the full
/// method-resolution order (the ancestor chain).
pub fn lookup_method(module: &Arc<ModuleObject>, name: &str) -> Option<Arc<InternalMethod>> {
    let mut current = Some(module.clone());

    while let Some(module) = current {
        if let Some(method) = module.own_method(name) {
            return Some(method);
        }
        current = module.superclass.clone();
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn stub_method(name: &str, module: &Arc<ModuleObject>, undefined: bool) -> Arc<InternalMethod> {
        InternalMethod::new(
            SharedMethodInfo::new(name, "(test)"),
            module.clone(),
            Visibility::Public,
            undefined,
            Arc::new(|_| Ok(Value::Nil)),
            None,
        )
    }

    #[test]
    fn lookup_walks_the_ancestor_chain() {
        let base = ModuleObject::new("Base", None);
        let derived = ModuleObject::new("Derived", Some(base.clone()));
        base.add_method(stub_method("inherited", &base, false));
        derived.add_method(stub_method("own", &derived, false));

        assert!(lookup_method(&derived, "own").is_some());
        let inherited = lookup_method(&derived, "inherited").unwrap();
        assert_eq!(inherited.declaring_module.name, "Base");
        assert!(lookup_method(&base, "own").is_none());
    }

    #[test]
    fn nearest_definition_wins() {
        let base = ModuleObject::new("Base", None);
        let derived = ModuleObject::new("Derived", Some(base.clone()));
        base.add_method(stub_method("m", &base, false));
        derived.add_method(stub_method("m", &derived, false));

        let found = lookup_method(&derived, "m").unwrap();
        assert_eq!(found.declaring_module.name, "Derived");
    }
}
