//! Shared fixtures: a recording stub translator and a scriptable host.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use rubidium_engine::{
    CallTarget, DeclarationContext, EngineError, ExecutableUnit, MaterializedFrame,
    PackedArguments, ParserMode, SharedMethodInfo, SourceUnit, Translator, Value,
};
use rubidium_runtime::{HostRuntime, RuntimeContext, RuntimeOptions};

/// Translator stub with just enough behavior to exercise the pipeline:
/// the "program" is the trimmed source text, interpreted as either a
/// local-variable reference (resolved against the declaration frame),
/// `self`, `__declaring__` (the declaring module's name), or anything
/// else (evaluates to nil). Counts translations and executions and
/// records the declaration context of every invocation.
#[derive(Default)]
pub struct StubTranslator {
    pub translations: AtomicUsize,
    pub executions: Arc<AtomicUsize>,
    pub observed_contexts: Arc<Mutex<Vec<DeclarationContext>>>,
}

impl StubTranslator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn translation_count(&self) -> usize {
        self.translations.load(Ordering::SeqCst)
    }

    pub fn execution_count(&self) -> usize {
        self.executions.load(Ordering::SeqCst)
    }

    pub fn last_context(&self) -> Option<DeclarationContext> {
        self.observed_contexts.lock().last().copied()
    }
}

impl Translator for StubTranslator {
    fn translate(
        &self,
        source: &SourceUnit,
        _mode: ParserMode,
        _parent_frame: Option<&Arc<MaterializedFrame>>,
        _own_scope_for_assignments: bool,
    ) -> Result<ExecutableUnit, EngineError> {
        self.translations.fetch_add(1, Ordering::SeqCst);

        let program = source.code().trim().to_string();
        let executions = self.executions.clone();
        let observed = self.observed_contexts.clone();

        let target: CallTarget = Arc::new(move |args: &PackedArguments| {
            executions.fetch_add(1, Ordering::SeqCst);
            observed.lock().push(args.declaration_context);

            match program.as_str() {
                "self" => Ok(args.self_value.clone()),
                "__declaring__" => Ok(args
                    .method
                    .as_ref()
                    .map(|method| {
                        Value::Str(rubidium_engine::RubidiumString::from_str(
                            &method.declaring_module.name,
                        ))
                    })
                    .unwrap_or(Value::Nil)),
                name => {
                    if let Some(frame) = &args.declaration_frame {
                        if let Some(value) = frame.local(name) {
                            return Ok(value);
                        }
                    }
                    Ok(Value::Nil)
                }
            }
        });

        Ok(ExecutableUnit::new(
            SharedMethodInfo::new("<main>", &source.name),
            target,
        ))
    }
}

/// Scriptable host for tests.
pub struct TestHost {
    pub current_directory: PathBuf,
    pub program_arguments: Vec<String>,
    pub load_path: Vec<String>,
    pub runtime_home: String,
}

impl TestHost {
    pub fn new(current_directory: PathBuf) -> Arc<Self> {
        Arc::new(Self {
            current_directory,
            program_arguments: Vec::new(),
            load_path: Vec::new(),
            runtime_home: ".".to_string(),
        })
    }
}

impl HostRuntime for TestHost {
    fn current_directory(&self) -> PathBuf {
        self.current_directory.clone()
    }

    fn program_arguments(&self) -> Vec<String> {
        self.program_arguments.clone()
    }

    fn load_path(&self) -> Vec<String> {
        self.load_path.clone()
    }

    fn runtime_home(&self) -> String {
        self.runtime_home.clone()
    }

    fn lookup_encoding(&self, name: &str) -> Option<String> {
        ["UTF-8", "US-ASCII", "ASCII-8BIT"]
            .iter()
            .find(|candidate| candidate.eq_ignore_ascii_case(name))
            .map(|candidate| candidate.to_string())
    }
}

/// Context over a stub translator and a host rooted at `dir`.
pub fn test_context(dir: PathBuf) -> (Arc<RuntimeContext>, Arc<StubTranslator>) {
    let translator = StubTranslator::new();
    let context = RuntimeContext::new(
        TestHost::new(dir),
        RuntimeOptions::default(),
        translator.clone(),
    );
    (context, translator)
}
