//! Execution pipeline: load, eval, instance_eval, inline evaluation.

mod common;

use common::test_context;
use rubidium_engine::{
    BindingObject, DeclarationContext, MaterializedFrame, PackedArguments, ParserMode, Value,
};
use rubidium_runtime::RuntimeError;

#[test]
fn load_file_reexecutes_but_reads_once() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("a.rb");
    std::fs::write(&file, "nil").unwrap();
    let absolute = file.to_string_lossy().to_string();

    let (context, translator) = test_context(dir.path().to_path_buf());

    context.load_file(&absolute).unwrap();
    // The cached unit outlives the file: only execution repeats.
    std::fs::remove_file(&file).unwrap();
    context.load_file(&absolute).unwrap();

    assert_eq!(context.source_cache().len(), 1);
    assert_eq!(translator.execution_count(), 2);
    assert_eq!(translator.last_context(), Some(DeclarationContext::TopLevel));
}

#[test]
fn relative_spellings_share_one_cache_entry() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a.rb"), "nil").unwrap();

    let (context, translator) = test_context(dir.path().to_path_buf());

    context.load_file("a.rb").unwrap();
    context.load_file("./a.rb").unwrap();

    assert_eq!(context.source_cache().len(), 1);
    assert_eq!(translator.execution_count(), 2);
}

#[test]
fn load_file_of_a_missing_relative_path_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let (context, _) = test_context(dir.path().to_path_buf());

    assert!(matches!(
        context.load_file("nope.rb"),
        Err(RuntimeError::Io(_))
    ));
}

#[test]
fn top_level_load_runs_against_the_main_object() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("main.rb"), "self").unwrap();

    let (context, _) = test_context(dir.path().to_path_buf());
    let result = context.load_file("main.rb").unwrap();
    assert!(context.core_library().is_main_object(&result));
}

#[test]
fn eval_returns_the_bindings_local_and_inherits_its_context() {
    let dir = tempfile::tempdir().unwrap();
    let (context, translator) = test_context(dir.path().to_path_buf());

    let receiver = context.core_library().main_object();
    let frame = MaterializedFrame::new(PackedArguments::pack(
        None,
        None,
        receiver,
        None,
        DeclarationContext::Method,
        vec![],
    ));
    frame.set_local("x", Value::Int(5));
    let binding = Value::Binding(BindingObject::new(frame));

    let result = context
        .eval(ParserMode::Eval, "x", &binding, true, "(eval)")
        .unwrap();

    assert_eq!(result, Value::Int(5));
    // Inherited from the captured frame, never forced to TopLevel.
    assert_eq!(translator.last_context(), Some(DeclarationContext::Method));
}

#[test]
fn eval_requires_a_binding_value() {
    let dir = tempfile::tempdir().unwrap();
    let (context, _) = test_context(dir.path().to_path_buf());

    let result = context.eval(ParserMode::Eval, "x", &Value::Int(1), true, "(eval)");
    assert!(matches!(result, Err(RuntimeError::Contract(_))));
}

#[test]
fn instance_eval_sets_receiver_and_context() {
    let dir = tempfile::tempdir().unwrap();
    let (context, translator) = test_context(dir.path().to_path_buf());

    let receiver = Value::Long(99);
    let result = context
        .instance_eval("self", receiver.clone(), "(instance_eval)")
        .unwrap();

    assert_eq!(result, receiver);
    assert_eq!(
        translator.last_context(),
        Some(DeclarationContext::InstanceEval)
    );
}

#[test]
fn module_mode_declares_into_the_receiver_module() {
    let dir = tempfile::tempdir().unwrap();
    let (context, _) = test_context(dir.path().to_path_buf());

    let module = rubidium_engine::ModuleObject::new("Widgets", None);
    let source = rubidium_engine::SourceUnit::from_text("__declaring__", "(module)");

    let result = context
        .parse_and_execute(
            &source,
            ParserMode::Module,
            Value::Module(module),
            None,
            true,
            DeclarationContext::Module,
        )
        .unwrap();

    assert_eq!(
        result,
        Value::Str(rubidium_engine::RubidiumString::from_str("Widgets"))
    );
}

#[test]
fn module_mode_rejects_a_non_module_receiver() {
    let dir = tempfile::tempdir().unwrap();
    let (context, _) = test_context(dir.path().to_path_buf());

    let source = rubidium_engine::SourceUnit::from_text("nil", "(module)");
    let result = context.parse_and_execute(
        &source,
        ParserMode::Module,
        Value::Int(1),
        None,
        true,
        DeclarationContext::Module,
    );

    assert!(matches!(result, Err(RuntimeError::Contract(_))));
}

#[test]
fn eval_outside_module_mode_declares_into_the_object_class() {
    let dir = tempfile::tempdir().unwrap();
    let (context, _) = test_context(dir.path().to_path_buf());

    let source = rubidium_engine::SourceUnit::from_text("__declaring__", "(load)");
    let result = context
        .parse_and_execute(
            &source,
            ParserMode::TopLevel,
            context.core_library().main_object(),
            None,
            true,
            DeclarationContext::TopLevel,
        )
        .unwrap();

    assert_eq!(
        result,
        Value::Str(rubidium_engine::RubidiumString::from_str("Object"))
    );
}

#[test]
fn inline_eval_seeds_locals_from_pairs() {
    let dir = tempfile::tempdir().unwrap();
    let (context, translator) = test_context(dir.path().to_path_buf());

    let frame = MaterializedFrame::new(PackedArguments::pack(
        None,
        None,
        context.core_library().main_object(),
        None,
        DeclarationContext::Method,
        vec![],
    ));

    let result = context
        .inline_eval(
            &frame,
            "y",
            &[context.get_symbol("y"), Value::Int(3)],
        )
        .unwrap();

    assert_eq!(result, Value::Int(3));
    assert_eq!(
        translator.last_context(),
        Some(DeclarationContext::InstanceEval)
    );
}

#[test]
fn inline_eval_rejects_odd_pair_lists() {
    let dir = tempfile::tempdir().unwrap();
    let (context, translator) = test_context(dir.path().to_path_buf());

    let frame = MaterializedFrame::new(PackedArguments::pack(
        None,
        None,
        Value::Nil,
        None,
        DeclarationContext::TopLevel,
        vec![],
    ));

    let result = context.inline_eval(&frame, "y", &[context.get_symbol("y")]);
    assert!(matches!(result, Err(RuntimeError::Contract(_))));
    // Failed immediately: nothing was translated or executed.
    assert_eq!(translator.translation_count(), 0);
    assert_eq!(translator.execution_count(), 0);
}
