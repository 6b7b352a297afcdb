//! The global state of a running Rubidium system.
//!
//! One `RuntimeContext` exists per interpreter process. It owns the
//! identity allocator, symbol table, core-library bootstrap, source
//! cache, and collaborator subsystems, and exposes the load/eval
//! pipeline and the native dispatch entry point.

use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Weak};

use once_cell::sync::Lazy;
use parking_lot::RwLock;

use rubidium_engine::subsystems::{
    AtExitManager, InstrumentationServer, SafepointManager, ThreadManager, TraceManager,
};
use rubidium_engine::{
    lookup_method, BindingObject, CoreLibrary, DeclarationContext, ExecutableUnit, InternalMethod,
    LexicalScope, MaterializedFrame, ObjectIdAllocator, PackedArguments, ParserMode, ProcObject,
    SourceUnit, SymbolTable, Translator, Value, Visibility,
};

use crate::error::{RuntimeError, RuntimeResult};
use crate::host::{HostOutput, HostRuntime};
use crate::loader::{SourceCache, SourceLoader, CLASSPATH_SCHEME, RUBIDIUM_SCHEME};

/// Most recently constructed context.
///
/// Debug tooling only: native-entry helpers use this to reach the
/// active context without threading a handle through every call. All
/// production control flow passes the context explicitly.
static LATEST_CONTEXT: Lazy<RwLock<Weak<RuntimeContext>>> =
    Lazy::new(|| RwLock::new(Weak::new()));

/// Host stdlib-layout suffixes that must not survive into the guest
/// load path.
const HOST_STDLIB_SUFFIXES: &[&str] = &[
    "lib/ruby/2.2/site_ruby",
    "lib/ruby/shared",
    "lib/ruby/stdlib",
];

/// Bundled compatibility gems appended to the load path from the
/// runtime home.
const RUBYSL_GEMS: &[&str] = &[
    "rubysl-strscan",
    "rubysl-stringio",
    "rubysl-complex",
    "rubysl-date",
    "rubysl-pathname",
    "rubysl-tempfile",
    "rubysl-socket",
    "rubysl-securerandom",
    "rubysl-timeout",
    "rubysl-webrick",
];

/// Embedder-facing configuration.
#[derive(Debug, Clone, Default)]
pub struct RuntimeOptions {
    /// Guest thread-manager parallelism; 0 means one per CPU
    pub threads: usize,
    /// Instrumentation listener port; 0 disables the listener
    pub instrumentation_port: u16,
}

/// The runtime context aggregate root.
pub struct RuntimeContext {
    host: Arc<dyn HostRuntime>,
    options: RuntimeOptions,
    translator: Arc<dyn Translator>,

    object_ids: Arc<ObjectIdAllocator>,
    symbols: Arc<SymbolTable>,
    core_library: CoreLibrary,
    root_lexical_scope: Arc<LexicalScope>,

    safepoint_manager: SafepointManager,
    trace_manager: TraceManager,
    at_exit_manager: AtExitManager,
    thread_manager: ThreadManager,
    instrumentation_server: Option<InstrumentationServer>,

    source_cache: SourceCache,
    running_on_windows: bool,
    debug_standard_out: Option<HostOutput>,
}

impl RuntimeContext {
    /// Construct the context. Later subsystems depend on earlier ones
    /// being live, so the wiring order here is load-bearing.
    pub fn new(
        host: Arc<dyn HostRuntime>,
        options: RuntimeOptions,
        translator: Arc<dyn Translator>,
    ) -> Arc<Self> {
        // Identity and symbols have no dependencies and come first.
        let object_ids = Arc::new(ObjectIdAllocator::new());
        let symbols = Arc::new(SymbolTable::new());

        let safepoint_manager = SafepointManager::new();

        // The bootstrap needs the identity allocator and a lexical root.
        let core_library = CoreLibrary::new(object_ids.clone());
        let root_lexical_scope = LexicalScope::new(None, core_library.object_class());
        core_library.initialize();

        let trace_manager = TraceManager::new();
        let at_exit_manager = AtExitManager::new();

        // The thread manager needs the core library in place.
        let thread_manager = ThreadManager::new(options.threads);
        thread_manager.initialize();

        // Optional listener: a bind failure is reported, never fatal.
        let instrumentation_server = if options.instrumentation_port != 0 {
            match InstrumentationServer::start(options.instrumentation_port) {
                Ok(server) => Some(server),
                Err(error) => {
                    eprintln!(
                        "instrumentation listener failed to start on port {}: {}",
                        options.instrumentation_port, error
                    );
                    None
                }
            }
        } else {
            None
        };

        let source_cache = SourceCache::new(SourceLoader::new(host.clone()));
        let debug_standard_out = host.configured_output();

        let context = Arc::new(Self {
            host,
            options,
            translator,
            object_ids,
            symbols,
            core_library,
            root_lexical_scope,
            safepoint_manager,
            trace_manager,
            at_exit_manager,
            thread_manager,
            instrumentation_server,
            source_cache,
            running_on_windows: cfg!(windows),
            debug_standard_out,
        });

        *LATEST_CONTEXT.write() = Arc::downgrade(&context);

        context
    }

    /// The most recently constructed context, for debug entry points.
    pub fn latest() -> Option<Arc<RuntimeContext>> {
        LATEST_CONTEXT.read().upgrade()
    }

    /// Finish bootstrap once the context and core library exist:
    /// program arguments into guest `ARGV`, and the effective load
    /// path rewritten for the guest.
    pub fn initialize(&self) {
        for argument in self.host.program_arguments() {
            self.core_library.argv().push(self.core_library.create_string(
                argument.into_bytes(),
                "UTF-8",
                false,
            ));
        }

        let load_path = self.core_library.load_path();

        // Host entries, minus the host's own stdlib layout, with
        // classpath-style locators moved onto the guest scheme.
        for entry in self.host.load_path() {
            if HOST_STDLIB_SUFFIXES.iter().any(|suffix| entry.ends_with(suffix)) {
                continue;
            }

            let entry = match entry.strip_prefix(CLASSPATH_SCHEME) {
                Some(rest) => format!("{}{}", RUBIDIUM_SCHEME, rest),
                None => entry,
            };

            load_path.push(self.core_library.create_string(entry.into_bytes(), "UTF-8", false));
        }

        // Our own library directories under the runtime home.
        let mut home = self.host.runtime_home();
        if let Some(rest) = home.strip_prefix(CLASSPATH_SCHEME) {
            home = format!("{}/{}", RUBIDIUM_SCHEME, rest.trim_start_matches('/'));
        }
        let home = format!("{}/", home);

        let mut guest_dirs = vec![
            // Libraries copied unmodified from the reference implementation
            format!("{}lib/rubidium/mri", home),
            // Our own implementations
            format!("{}lib/rubidium/rubidium", home),
        ];
        for gem in RUBYSL_GEMS {
            guest_dirs.push(format!("{}lib/rubidium/rubysl/{}/lib", home, gem));
        }
        guest_dirs.push(format!("{}lib/rubidium/shims", home));

        for dir in guest_dirs {
            load_path.push(self.core_library.create_string(dir.into_bytes(), "UTF-8", false));
        }
    }

    /// Tear the context down exactly once: at-exit actions first (in
    /// reverse registration order, failures isolated and reported),
    /// then the instrumentation listener, then the thread manager last.
    pub fn shutdown(&self, normal_exit: bool) {
        for failure in self.at_exit_manager.run(normal_exit) {
            self.report(&format!("error running at_exit handler: {}", failure));
        }

        if let Some(server) = &self.instrumentation_server {
            server.shutdown();
        }

        self.safepoint_manager
            .pause_all_and_run(|| self.thread_manager.shutdown());
    }

    // ========================================================================
    // Execution pipeline
    // ========================================================================

    /// Load and execute a file top-level. Relative paths resolve
    /// against the host's current directory and are canonicalized
    /// before the cache lookup, so two spellings of the same file share
    /// one cached unit; every call re-executes the cached unit.
    pub fn load_file(&self, file_name: &str) -> RuntimeResult<Value> {
        if Path::new(file_name).is_absolute() || file_name.starts_with(RUBIDIUM_SCHEME) {
            self.load_file_absolute(file_name)
        } else {
            let resolved = self.host.current_directory().join(file_name).canonicalize()?;
            self.load_file_absolute(&resolved.to_string_lossy())
        }
    }

    fn load_file_absolute(&self, file_name: &str) -> RuntimeResult<Value> {
        let source = self.source_cache.get_source(file_name)?;
        self.load(&source)
    }

    /// Execute a source unit top-level against the main object.
    pub fn load(&self, source: &SourceUnit) -> RuntimeResult<Value> {
        self.parse_and_execute(
            source,
            ParserMode::TopLevel,
            self.core_library.main_object(),
            None,
            true,
            DeclarationContext::TopLevel,
        )
    }

    /// Evaluate inline text with `self_value` as the receiver. The
    /// source unit is transient and never cached.
    pub fn instance_eval(
        &self,
        code: &str,
        self_value: Value,
        filename: &str,
    ) -> RuntimeResult<Value> {
        let source = SourceUnit::from_text(code, filename);
        self.parse_and_execute(
            &source,
            ParserMode::Eval,
            self_value,
            None,
            true,
            DeclarationContext::InstanceEval,
        )
    }

    /// Evaluate against a captured binding. The declaration context is
    /// inherited from the binding's frame, never forced to top-level,
    /// and the receiver is the frame's captured self.
    pub fn eval(
        &self,
        mode: ParserMode,
        code: &str,
        binding: &Value,
        own_scope_for_assignments: bool,
        filename: &str,
    ) -> RuntimeResult<Value> {
        let Value::Binding(binding) = binding else {
            return Err(RuntimeError::Contract(format!(
                "eval requires a Binding receiver, got {}",
                binding.kind_name()
            )));
        };

        let source = SourceUnit::from_text(code, filename);
        let frame = binding.frame.clone();
        let declaration_context = frame.declaration_context();
        let self_value = frame.self_value();

        self.parse_and_execute(
            &source,
            mode,
            self_value,
            Some(frame),
            own_scope_for_assignments,
            declaration_context,
        )
    }

    /// Evaluate an expression against a caller frame with extra locals
    /// given as alternating name/value pairs. Used by native helpers
    /// that need to run guest code inline.
    pub fn inline_eval(
        &self,
        frame: &Arc<MaterializedFrame>,
        expression: &str,
        arguments: &[Value],
    ) -> RuntimeResult<Value> {
        if arguments.len() % 2 == 1 {
            return Err(RuntimeError::Contract(
                "odd number of name-value pairs for inline evaluation arguments".to_string(),
            ));
        }

        let eval_frame = MaterializedFrame::new(PackedArguments::pack(
            frame.arguments.method.clone(),
            None,
            frame.self_value(),
            None,
            DeclarationContext::InstanceEval,
            vec![],
        ));

        for pair in arguments.chunks(2) {
            let name = match &pair[0] {
                Value::Symbol(symbol) => symbol.as_str(),
                Value::Str(string) => String::from_utf8_lossy(&string.bytes).into_owned(),
                other => {
                    return Err(RuntimeError::Contract(format!(
                        "inline evaluation argument names must be symbols or strings, got {}",
                        other.kind_name()
                    )))
                }
            };
            eval_frame.set_local(&name, pair[1].clone());
        }

        let binding = Value::Binding(BindingObject::new(eval_frame));
        self.eval(ParserMode::Inline, expression, &binding, true, "inline-code")
    }

    /// Translate a source unit and execute the result.
    pub fn parse_and_execute(
        &self,
        source: &SourceUnit,
        mode: ParserMode,
        self_value: Value,
        parent_frame: Option<Arc<MaterializedFrame>>,
        own_scope_for_assignments: bool,
        declaration_context: DeclarationContext,
    ) -> RuntimeResult<Value> {
        let unit = self.translator.translate(
            source,
            mode,
            parent_frame.as_ref(),
            own_scope_for_assignments,
        )?;
        self.execute(mode, declaration_context, unit, parent_frame, self_value)
    }

    /// Wrap an executable unit in a synthetic public method bound to
    /// its declaring scope and invoke it. Guest-raised errors propagate
    /// unmodified.
    fn execute(
        &self,
        mode: ParserMode,
        declaration_context: DeclarationContext,
        unit: ExecutableUnit,
        parent_frame: Option<Arc<MaterializedFrame>>,
        self_value: Value,
    ) -> RuntimeResult<Value> {
        let declaring_module = match (mode, &parent_frame) {
            // An eval executes in the declaring scope of the frame it
            // was evaluated against.
            (ParserMode::Eval, Some(frame)) => match &frame.arguments.method {
                Some(method) => method.declaring_module.clone(),
                None => self.core_library.object_class(),
            },
            (ParserMode::Module, _) => match &self_value {
                Value::Module(module) => module.clone(),
                other => {
                    return Err(RuntimeError::Contract(format!(
                        "module body execution requires a module receiver, got {}",
                        other.kind_name()
                    )))
                }
            },
            _ => self.core_library.object_class(),
        };

        let method = InternalMethod::new(
            unit.info.clone(),
            declaring_module,
            Visibility::Public,
            false,
            unit.call_target.clone(),
            parent_frame.clone(),
        );

        let arguments = PackedArguments::pack(
            Some(method.clone()),
            parent_frame,
            self_value,
            None,
            declaration_context,
            vec![],
        );

        Ok((method.call_target)(&arguments)?)
    }

    // ========================================================================
    // Dispatch gateway
    // ========================================================================

    /// Resolve and invoke a guest method from native code.
    ///
    /// Returns `Ok(None)` when no method is found or the found method
    /// is explicitly undefined — a sentinel distinct from a guest nil
    /// return, so native callers can probe optional protocols without
    /// rescuing. Guest errors raised by the call propagate.
    pub fn send(
        &self,
        receiver: &Value,
        method_name: &str,
        block: Option<Arc<ProcObject>>,
        arguments: Vec<Value>,
    ) -> RuntimeResult<Option<Value>> {
        let metaclass = self.core_library.metaclass(receiver);

        let Some(method) = lookup_method(&metaclass, method_name) else {
            return Ok(None);
        };
        if method.undefined {
            return Ok(None);
        }

        let packed = PackedArguments::pack(
            Some(method.clone()),
            method.declaration_frame.clone(),
            receiver.clone(),
            block,
            DeclarationContext::Method,
            arguments,
        );

        Ok(Some((method.call_target)(&packed)?))
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Issue the next object identity token.
    pub fn next_object_id(&self) -> i64 {
        self.object_ids.next_id()
    }

    /// Identity token for a value, assigned lazily for heap objects.
    pub fn object_id(&self, value: &Value) -> i64 {
        self.core_library.object_id(value)
    }

    /// Intern a symbol by text.
    pub fn get_symbol(&self, name: &str) -> Value {
        self.symbols.symbol(name)
    }

    /// The core library bootstrap.
    pub fn core_library(&self) -> &CoreLibrary {
        &self.core_library
    }

    /// The shared symbol table.
    pub fn symbol_table(&self) -> &Arc<SymbolTable> {
        &self.symbols
    }

    /// The memoizing source cache.
    pub fn source_cache(&self) -> &SourceCache {
        &self.source_cache
    }

    /// The host the context was constructed against.
    pub fn host(&self) -> &Arc<dyn HostRuntime> {
        &self.host
    }

    /// Embedder configuration.
    pub fn options(&self) -> &RuntimeOptions {
        &self.options
    }

    /// The root lexical scope.
    pub fn root_lexical_scope(&self) -> &Arc<LexicalScope> {
        &self.root_lexical_scope
    }

    /// The safepoint manager.
    pub fn safepoint_manager(&self) -> &SafepointManager {
        &self.safepoint_manager
    }

    /// The trace manager.
    pub fn trace_manager(&self) -> &TraceManager {
        &self.trace_manager
    }

    /// The at-exit manager.
    pub fn at_exit_manager(&self) -> &AtExitManager {
        &self.at_exit_manager
    }

    /// The guest thread manager.
    pub fn thread_manager(&self) -> &ThreadManager {
        &self.thread_manager
    }

    /// The instrumentation listener, when one is running.
    pub fn instrumentation_server(&self) -> Option<&InstrumentationServer> {
        self.instrumentation_server.as_ref()
    }

    /// True when the host OS is the non-POSIX platform.
    pub fn running_on_windows(&self) -> bool {
        self.running_on_windows
    }

    /// The captured debug output stream, when the host configured one.
    pub fn debug_standard_out(&self) -> Option<&HostOutput> {
        self.debug_standard_out.as_ref()
    }

    fn report(&self, message: &str) {
        match &self.debug_standard_out {
            Some(stream) => {
                let _ = writeln!(stream.lock(), "{}", message);
            }
            None => eprintln!("{}", message),
        }
    }
}
