//! Core-library bootstrap.
//!
//! Builds the built-in classes and modules the context consumes: the
//! Object root, the primitive classes, the Kernel module, the main
//! object, `ARGV`, the global-variables object, and the error factories
//! the conversion bridge dispatches to. The full built-in hierarchy is
//! out of scope; only the surface the context depends on is built here.

use std::sync::Arc;

use crate::object_id::ObjectIdAllocator;
use crate::value::{
    BasicObject, ExceptionObject, ModuleObject, RubidiumArray, RubidiumEncoding, RubidiumString,
    Value,
};

/// A lexical scope: a parent chain rooted at the Object class.
#[derive(Debug)]
pub struct LexicalScope {
    /// Enclosing scope, None at the root
    pub parent: Option<Arc<LexicalScope>>,
    /// Module this scope opens
    pub module: Arc<ModuleObject>,
}

impl LexicalScope {
    /// Scope opening `module` under `parent`.
    pub fn new(parent: Option<Arc<LexicalScope>>, module: Arc<ModuleObject>) -> Arc<Self> {
        Arc::new(Self { parent, module })
    }
}

/// The bootstrapped core library.
pub struct CoreLibrary {
    object_ids: Arc<ObjectIdAllocator>,

    object_class: Arc<ModuleObject>,
    module_class: Arc<ModuleObject>,
    nil_class: Arc<ModuleObject>,
    true_class: Arc<ModuleObject>,
    false_class: Arc<ModuleObject>,
    fixnum_class: Arc<ModuleObject>,
    float_class: Arc<ModuleObject>,
    string_class: Arc<ModuleObject>,
    array_class: Arc<ModuleObject>,
    symbol_class: Arc<ModuleObject>,
    encoding_class: Arc<ModuleObject>,
    proc_class: Arc<ModuleObject>,
    binding_class: Arc<ModuleObject>,

    exception_class: Arc<ModuleObject>,
    argument_error_class: Arc<ModuleObject>,
    type_error_class: Arc<ModuleObject>,
    encoding_compatibility_error_class: Arc<ModuleObject>,
    regexp_error_class: Arc<ModuleObject>,

    kernel_module: Arc<ModuleObject>,
    main_object: Arc<BasicObject>,
    globals: Arc<BasicObject>,
    argv: Arc<RubidiumArray>,
}

impl CoreLibrary {
    /// Bootstrap the core library. Requires the identity allocator so
    /// objects created here can be given ids on demand.
    pub fn new(object_ids: Arc<ObjectIdAllocator>) -> Self {
        let object_class = ModuleObject::new("Object", None);
        let module_class = ModuleObject::new("Module", Some(object_class.clone()));

        let exception_class = ModuleObject::new("Exception", Some(object_class.clone()));
        let standard_error_class = ModuleObject::new("StandardError", Some(exception_class.clone()));

        let main_object = BasicObject::new(object_class.clone());
        let globals = BasicObject::new(object_class.clone());

        Self {
            object_ids,
            module_class,
            nil_class: ModuleObject::new("NilClass", Some(object_class.clone())),
            true_class: ModuleObject::new("TrueClass", Some(object_class.clone())),
            false_class: ModuleObject::new("FalseClass", Some(object_class.clone())),
            fixnum_class: ModuleObject::new("Fixnum", Some(object_class.clone())),
            float_class: ModuleObject::new("Float", Some(object_class.clone())),
            string_class: ModuleObject::new("String", Some(object_class.clone())),
            array_class: ModuleObject::new("Array", Some(object_class.clone())),
            symbol_class: ModuleObject::new("Symbol", Some(object_class.clone())),
            encoding_class: ModuleObject::new("Encoding", Some(object_class.clone())),
            proc_class: ModuleObject::new("Proc", Some(object_class.clone())),
            binding_class: ModuleObject::new("Binding", Some(object_class.clone())),
            argument_error_class: ModuleObject::new(
                "ArgumentError",
                Some(standard_error_class.clone()),
            ),
            type_error_class: ModuleObject::new("TypeError", Some(standard_error_class.clone())),
            encoding_compatibility_error_class: ModuleObject::new(
                "Encoding::CompatibilityError",
                Some(standard_error_class.clone()),
            ),
            regexp_error_class: ModuleObject::new("RegexpError", Some(standard_error_class)),
            exception_class,
            kernel_module: ModuleObject::new("Kernel", None),
            main_object,
            globals,
            argv: RubidiumArray::new(),
            object_class,
        }
    }

    /// Finish bootstrap: seed the global-variables object with the load
    /// path and the default program name.
    pub fn initialize(&self) {
        self.globals
            .set_ivar("$:", Value::Array(RubidiumArray::new()));
        self.globals
            .set_ivar("$0", Value::Str(RubidiumString::from_str("rubidium")));
    }

    /// The root declaring scope.
    pub fn object_class(&self) -> Arc<ModuleObject> {
        self.object_class.clone()
    }

    /// The Kernel module singleton.
    pub fn kernel_module(&self) -> Value {
        Value::Module(self.kernel_module.clone())
    }

    /// True when `value` is the Kernel module singleton.
    pub fn is_kernel_module(&self, value: &Value) -> bool {
        matches!(value, Value::Module(m) if Arc::ptr_eq(m, &self.kernel_module))
    }

    /// The main (top-level self) object singleton.
    pub fn main_object(&self) -> Value {
        Value::Object(self.main_object.clone())
    }

    /// True when `value` is the main object singleton.
    pub fn is_main_object(&self, value: &Value) -> bool {
        matches!(value, Value::Object(o) if Arc::ptr_eq(o, &self.main_object))
    }

    /// The nil singleton.
    pub fn nil_object(&self) -> Value {
        Value::Nil
    }

    /// `ARGV`.
    pub fn argv(&self) -> Arc<RubidiumArray> {
        self.argv.clone()
    }

    /// The global-variables object.
    pub fn globals(&self) -> Arc<BasicObject> {
        self.globals.clone()
    }

    /// The `$:` load path array.
    pub fn load_path(&self) -> Arc<RubidiumArray> {
        match self.globals.ivar("$:") {
            Some(Value::Array(a)) => a,
            _ => RubidiumArray::new(),
        }
    }

    /// The dynamic class of any value, for method resolution.
    pub fn metaclass(&self, value: &Value) -> Arc<ModuleObject> {
        match value {
            Value::Nil => self.nil_class.clone(),
            Value::Bool(true) => self.true_class.clone(),
            Value::Bool(false) => self.false_class.clone(),
            Value::Int(_) | Value::Long(_) => self.fixnum_class.clone(),
            Value::Float(_) => self.float_class.clone(),
            Value::Str(_) => self.string_class.clone(),
            Value::Array(_) => self.array_class.clone(),
            Value::Symbol(_) => self.symbol_class.clone(),
            Value::Encoding(_) => self.encoding_class.clone(),
            Value::Module(_) => self.module_class.clone(),
            Value::Object(o) => o.class.clone(),
            Value::Binding(_) => self.binding_class.clone(),
            Value::Proc(_) => self.proc_class.clone(),
            Value::Exception(e) => e.class.clone(),
        }
    }

    /// Guest string factory.
    pub fn create_string(&self, bytes: Vec<u8>, encoding: &str, tainted: bool) -> Value {
        Value::Str(RubidiumString::from_bytes(bytes, encoding, tainted))
    }

    /// Guest encoding descriptor by name.
    pub fn create_encoding(&self, name: &str) -> Value {
        Value::Encoding(RubidiumEncoding::new(name))
    }

    /// Identity token for `value`. Immediates carry tagged ids; every
    /// heap kind has a lazy id slot filled from the allocator on first
    /// request, so repeated queries on the same object agree.
    pub fn object_id(&self, value: &Value) -> i64 {
        use crate::object_id::{fixnum_to_id, FALSE_OBJECT_ID, NIL_OBJECT_ID, TRUE_OBJECT_ID};

        let slot = match value {
            Value::Nil => return NIL_OBJECT_ID,
            Value::Bool(true) => return TRUE_OBJECT_ID,
            Value::Bool(false) => return FALSE_OBJECT_ID,
            Value::Int(i) => return fixnum_to_id(i64::from(*i)),
            Value::Long(i) => return fixnum_to_id(*i),
            // Floats tag by bit pattern.
            Value::Float(f) => return fixnum_to_id(f.to_bits() as i64),
            Value::Str(s) => &s.object_id,
            Value::Array(a) => &a.object_id,
            Value::Symbol(s) => &s.object_id,
            Value::Encoding(e) => &e.object_id,
            Value::Module(m) => &m.object_id,
            Value::Object(o) => &o.object_id,
            Value::Binding(b) => &b.object_id,
            Value::Proc(p) => &p.object_id,
            Value::Exception(e) => &e.object_id,
        };

        *slot.get_or_init(|| self.object_ids.next_id())
    }

    /// `ArgumentError` factory.
    pub fn argument_error(&self, message: &str) -> Value {
        Value::Exception(ExceptionObject::new(self.argument_error_class.clone(), message))
    }

    /// `TypeError` factory.
    pub fn type_error(&self, message: &str) -> Value {
        Value::Exception(ExceptionObject::new(self.type_error_class.clone(), message))
    }

    /// `Encoding::CompatibilityError` factory.
    pub fn encoding_compatibility_error(&self, message: &str) -> Value {
        Value::Exception(ExceptionObject::new(
            self.encoding_compatibility_error_class.clone(),
            message,
        ))
    }

    /// `RegexpError` factory.
    pub fn regexp_error(&self, message: &str) -> Value {
        Value::Exception(ExceptionObject::new(self.regexp_error_class.clone(), message))
    }
}
