//! Dispatch gateway: send from native code.

mod common;

use std::sync::Arc;

use common::test_context;
use rubidium_engine::{
    BasicObject, EngineError, InternalMethod, ModuleObject, ProcObject, RubidiumString,
    SharedMethodInfo, Value, Visibility,
};
use rubidium_runtime::{RuntimeContext, RuntimeError};

fn context() -> Arc<RuntimeContext> {
    let dir = tempfile::tempdir().unwrap();
    test_context(dir.path().to_path_buf()).0
}

fn define(
    module: &Arc<ModuleObject>,
    name: &str,
    undefined: bool,
    target: rubidium_engine::CallTarget,
) {
    module.add_method(InternalMethod::new(
        SharedMethodInfo::new(name, "(test)"),
        module.clone(),
        Visibility::Public,
        undefined,
        target,
        None,
    ));
}

#[test]
fn missing_method_returns_the_not_found_sentinel() {
    let context = context();
    let receiver = context.core_library().main_object();

    let result = context.send(&receiver, "no_such_method", None, vec![]).unwrap();
    assert!(result.is_none());
}

#[test]
fn not_found_is_distinct_from_a_nil_return() {
    let context = context();
    let class = ModuleObject::new("Widget", Some(context.core_library().object_class()));
    define(&class, "nothing", false, Arc::new(|_| Ok(Value::Nil)));
    let receiver = Value::Object(BasicObject::new(class));

    assert_eq!(
        context.send(&receiver, "nothing", None, vec![]).unwrap(),
        Some(Value::Nil)
    );
    assert_eq!(context.send(&receiver, "missing", None, vec![]).unwrap(), None);
}

#[test]
fn found_methods_receive_packed_arguments() {
    let context = context();
    let class = ModuleObject::new("Echo", Some(context.core_library().object_class()));
    define(
        &class,
        "first_arg",
        false,
        Arc::new(|args| Ok(args.arguments.first().cloned().unwrap_or(Value::Nil))),
    );
    let receiver = Value::Object(BasicObject::new(class));

    let result = context
        .send(&receiver, "first_arg", None, vec![Value::Int(9), Value::Nil])
        .unwrap();
    assert_eq!(result, Some(Value::Int(9)));
}

#[test]
fn lookup_follows_the_resolution_order() {
    let context = context();
    let base = ModuleObject::new("Base", Some(context.core_library().object_class()));
    let derived = ModuleObject::new("Derived", Some(base.clone()));
    define(
        &base,
        "greeting",
        false,
        Arc::new(|_| Ok(Value::Str(RubidiumString::from_str("from base")))),
    );
    let receiver = Value::Object(BasicObject::new(derived));

    let result = context.send(&receiver, "greeting", None, vec![]).unwrap();
    assert_eq!(
        result,
        Some(Value::Str(RubidiumString::from_str("from base")))
    );
}

#[test]
fn undefined_methods_are_treated_as_absent() {
    let context = context();
    let class = ModuleObject::new("Gone", Some(context.core_library().object_class()));
    define(&class, "removed", true, Arc::new(|_| Ok(Value::Nil)));
    let receiver = Value::Object(BasicObject::new(class));

    assert_eq!(context.send(&receiver, "removed", None, vec![]).unwrap(), None);
}

#[test]
fn blocks_are_threaded_through() {
    let context = context();
    let class = ModuleObject::new("Yields", Some(context.core_library().object_class()));
    define(
        &class,
        "block_given",
        false,
        Arc::new(|args| Ok(Value::Bool(args.block.is_some()))),
    );
    let receiver = Value::Object(BasicObject::new(class));

    let block = ProcObject::new(Arc::new(|_| Ok(Value::Nil)), None);

    assert_eq!(
        context.send(&receiver, "block_given", Some(block), vec![]).unwrap(),
        Some(Value::Bool(true))
    );
    assert_eq!(
        context.send(&receiver, "block_given", None, vec![]).unwrap(),
        Some(Value::Bool(false))
    );
}

#[test]
fn guest_errors_propagate_to_the_native_caller() {
    let context = context();
    let class = ModuleObject::new("Raises", Some(context.core_library().object_class()));
    let error = context.core_library().type_error("kaboom");
    define(
        &class,
        "explode",
        false,
        Arc::new(move |_| Err(EngineError::Raise(error.clone()))),
    );
    let receiver = Value::Object(BasicObject::new(class));

    let result = context.send(&receiver, "explode", None, vec![]);
    match result {
        Err(RuntimeError::Engine(EngineError::Raise(Value::Exception(e)))) => {
            assert_eq!(e.class.name, "TypeError");
            assert_eq!(e.message, "kaboom");
        }
        other => panic!("expected a propagated guest error, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn primitive_receivers_dispatch_through_their_class() {
    let context = context();
    // Fixnums resolve through the bootstrap Fixnum class; none of the
    // test-defined methods live there.
    assert_eq!(context.send(&Value::Int(1), "frob", None, vec![]).unwrap(), None);
    assert_eq!(context.send(&Value::Nil, "frob", None, vec![]).unwrap(), None);
}
