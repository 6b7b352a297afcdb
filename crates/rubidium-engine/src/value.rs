//! Guest value representation.
//!
//! `Value` is a closed tagged enum over every guest kind the context
//! handles. Heap kinds are `Arc`-backed so values are cheap to clone and
//! safe to share between guest threads; singleton identity (nil, the
//! Kernel module, the main object) is variant identity or `Arc` pointer
//! identity.

use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::frame::MaterializedFrame;
use crate::method::InternalMethod;
use crate::translator::CallTarget;

/// A guest value.
///
/// Fixnums keep the 32/64-bit split of the underlying representation:
/// values that fit in 32 bits are stored as `Int` and widened on the way
/// out to the host.
#[derive(Clone)]
pub enum Value {
    /// The nil singleton
    Nil,
    /// true / false
    Bool(bool),
    /// Fixnum that fits in 32 bits
    Int(i32),
    /// Fixnum that needs 64 bits
    Long(i64),
    /// Floating point
    Float(f64),
    /// Byte string with encoding and taint flag
    Str(Arc<RubidiumString>),
    /// Mutable object array
    Array(Arc<RubidiumArray>),
    /// Interned symbol (identity-comparable)
    Symbol(Arc<RubidiumSymbol>),
    /// Encoding descriptor
    Encoding(Arc<RubidiumEncoding>),
    /// Class or module
    Module(Arc<ModuleObject>),
    /// Plain object instance
    Object(Arc<BasicObject>),
    /// Captured binding (frame + self)
    Binding(Arc<BindingObject>),
    /// Block / proc
    Proc(Arc<ProcObject>),
    /// Guest exception instance
    Exception(Arc<ExceptionObject>),
}

impl Value {
    /// Human-readable name of this value's runtime kind, used in
    /// unsupported-conversion diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Nil => "NilClass",
            Value::Bool(true) => "TrueClass",
            Value::Bool(false) => "FalseClass",
            Value::Int(_) | Value::Long(_) => "Fixnum",
            Value::Float(_) => "Float",
            Value::Str(_) => "String",
            Value::Array(_) => "Array",
            Value::Symbol(_) => "Symbol",
            Value::Encoding(_) => "Encoding",
            Value::Module(_) => "Module",
            Value::Object(_) => "Object",
            Value::Binding(_) => "Binding",
            Value::Proc(_) => "Proc",
            Value::Exception(_) => "Exception",
        }
    }

    /// True for class/module values.
    pub fn is_module(&self) -> bool {
        matches!(self, Value::Module(_))
    }

    /// True for binding values.
    pub fn is_binding(&self) -> bool {
        matches!(self, Value::Binding(_))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Long(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Str(s) => write!(f, "{}", String::from_utf8_lossy(&s.bytes)),
            Value::Array(a) => write!(f, "#<Array:{} elements>", a.len()),
            Value::Symbol(s) => write!(f, ":{}", s.as_str()),
            Value::Encoding(e) => write!(f, "#<Encoding:{}>", e.name),
            Value::Module(m) => write!(f, "{}", m.name),
            Value::Object(o) => write!(f, "#<{}>", o.class.name),
            Value::Binding(_) => write!(f, "#<Binding>"),
            Value::Proc(_) => write!(f, "#<Proc>"),
            Value::Exception(e) => write!(f, "#<{}: {}>", e.class.name, e.message),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

/// Value equality.
///
/// Heap kinds without a structural notion of equality (modules, plain
/// objects, bindings, procs) compare by identity. Strings compare by
/// content, encoding and taint so bridge round-trips can assert
/// taint preservation.
impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Long(a), Value::Long(b)) => a == b,
            (Value::Int(a), Value::Long(b)) | (Value::Long(b), Value::Int(a)) => {
                i64::from(*a) == *b
            }
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => {
                a.bytes == b.bytes && a.encoding == b.encoding && a.tainted == b.tainted
            }
            (Value::Array(a), Value::Array(b)) => *a.elements.read() == *b.elements.read(),
            (Value::Symbol(a), Value::Symbol(b)) => Arc::ptr_eq(a, b),
            (Value::Encoding(a), Value::Encoding(b)) => a.name == b.name,
            (Value::Module(a), Value::Module(b)) => Arc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            (Value::Binding(a), Value::Binding(b)) => Arc::ptr_eq(a, b),
            (Value::Proc(a), Value::Proc(b)) => Arc::ptr_eq(a, b),
            (Value::Exception(a), Value::Exception(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Guest string: immutable byte content plus encoding name and taint flag.
#[derive(Debug, Clone)]
pub struct RubidiumString {
    /// Byte-exact content
    pub bytes: Vec<u8>,
    /// Encoding name, e.g. "UTF-8"
    pub encoding: String,
    /// Untrusted-origin marker, preserved across conversions
    pub tainted: bool,
    /// Identity token, assigned on first request
    pub object_id: OnceCell<i64>,
}

impl RubidiumString {
    /// UTF-8 string from text, untainted.
    pub fn from_str(text: &str) -> Arc<Self> {
        Self::from_bytes(text.as_bytes().to_vec(), "UTF-8", false)
    }

    /// String from raw bytes with an explicit taint flag.
    pub fn from_bytes(bytes: Vec<u8>, encoding: &str, tainted: bool) -> Arc<Self> {
        Arc::new(Self {
            bytes,
            encoding: encoding.to_string(),
            tainted,
            object_id: OnceCell::new(),
        })
    }
}

impl PartialEq for RubidiumString {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes && self.encoding == other.encoding && self.tainted == other.tainted
    }
}

impl Eq for RubidiumString {}

/// Guest array with interior mutability.
#[derive(Debug, Default)]
pub struct RubidiumArray {
    /// Element store
    pub elements: RwLock<Vec<Value>>,
    /// Identity token, assigned on first request
    pub object_id: OnceCell<i64>,
}

impl RubidiumArray {
    /// Empty array.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Array seeded with elements.
    pub fn from_vec(elements: Vec<Value>) -> Arc<Self> {
        Arc::new(Self {
            elements: RwLock::new(elements),
            object_id: OnceCell::new(),
        })
    }

    /// Append an element.
    pub fn push(&self, value: Value) {
        self.elements.write().push(value);
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.elements.read().len()
    }

    /// True when empty.
    pub fn is_empty(&self) -> bool {
        self.elements.read().is_empty()
    }

    /// Snapshot of the element store.
    pub fn to_vec(&self) -> Vec<Value> {
        self.elements.read().clone()
    }
}

/// Interned symbol. Two symbols with the same byte content are the same
/// `Arc` (see [`crate::symbol::SymbolTable`]), so identity comparison is
/// content comparison.
#[derive(Debug)]
pub struct RubidiumSymbol {
    /// Exact byte content of the symbol name
    pub bytes: Vec<u8>,
    /// Identity token, assigned on first request
    pub object_id: OnceCell<i64>,
}

impl RubidiumSymbol {
    /// Symbol with `bytes` as its exact name.
    pub fn new(bytes: Vec<u8>) -> Arc<Self> {
        Arc::new(Self {
            bytes,
            object_id: OnceCell::new(),
        })
    }

    /// Symbol name as lossy UTF-8.
    pub fn as_str(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

impl PartialEq for RubidiumSymbol {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}

impl Eq for RubidiumSymbol {}

/// Encoding descriptor, addressed by name.
#[derive(Debug)]
pub struct RubidiumEncoding {
    /// Registry name, e.g. "UTF-8"
    pub name: String,
    /// Identity token, assigned on first request
    pub object_id: OnceCell<i64>,
}

impl RubidiumEncoding {
    /// Descriptor for the encoding named `name`.
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            object_id: OnceCell::new(),
        })
    }
}

impl PartialEq for RubidiumEncoding {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for RubidiumEncoding {}

/// A class or module: a name, an optional superclass, and a method table.
#[derive(Debug)]
pub struct ModuleObject {
    /// Fully-qualified name
    pub name: String,
    /// Superclass in the ancestor chain (None for the root and for
    /// standalone modules)
    pub superclass: Option<Arc<ModuleObject>>,
    /// Method table
    pub methods: RwLock<FxHashMap<String, Arc<InternalMethod>>>,
    /// Identity token, assigned on first request
    pub object_id: OnceCell<i64>,
}

impl ModuleObject {
    /// New module/class under `superclass`.
    pub fn new(name: &str, superclass: Option<Arc<ModuleObject>>) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            superclass,
            methods: RwLock::new(FxHashMap::default()),
            object_id: OnceCell::new(),
        })
    }

    /// Define or replace a method.
    pub fn add_method(&self, method: Arc<InternalMethod>) {
        self.methods.write().insert(method.name.clone(), method);
    }

    /// Method defined directly on this module, ignoring ancestors.
    pub fn own_method(&self, name: &str) -> Option<Arc<InternalMethod>> {
        self.methods.read().get(name).cloned()
    }
}

/// A plain object instance: class, instance variables, and a lazily
/// assigned object id.
#[derive(Debug)]
pub struct BasicObject {
    /// The object's class
    pub class: Arc<ModuleObject>,
    /// Instance variables
    pub ivars: RwLock<FxHashMap<String, Value>>,
    /// Identity token, assigned on first request
    pub object_id: OnceCell<i64>,
}

impl BasicObject {
    /// New instance of `class`.
    pub fn new(class: Arc<ModuleObject>) -> Arc<Self> {
        Arc::new(Self {
            class,
            ivars: RwLock::new(FxHashMap::default()),
            object_id: OnceCell::new(),
        })
    }

    /// Read an instance variable.
    pub fn ivar(&self, name: &str) -> Option<Value> {
        self.ivars.read().get(name).cloned()
    }

    /// Write an instance variable.
    pub fn set_ivar(&self, name: &str, value: Value) {
        self.ivars.write().insert(name.to_string(), value);
    }
}

/// A captured binding: the materialized frame of the capture site.
#[derive(Debug)]
pub struct BindingObject {
    /// Captured frame
    pub frame: Arc<MaterializedFrame>,
    /// Identity token, assigned on first request
    pub object_id: OnceCell<i64>,
}

impl BindingObject {
    /// Binding over `frame`.
    pub fn new(frame: Arc<MaterializedFrame>) -> Arc<Self> {
        Arc::new(Self {
            frame,
            object_id: OnceCell::new(),
        })
    }
}

/// A block. The context treats blocks as opaque callables; it only
/// threads them through packed arguments.
pub struct ProcObject {
    /// The block body
    pub call_target: CallTarget,
    /// Frame the block was created in, if any
    pub declaration_frame: Option<Arc<MaterializedFrame>>,
    /// Identity token, assigned on first request
    pub object_id: OnceCell<i64>,
}

impl ProcObject {
    /// Block over `call_target`, closing over `declaration_frame`.
    pub fn new(
        call_target: CallTarget,
        declaration_frame: Option<Arc<MaterializedFrame>>,
    ) -> Arc<Self> {
        Arc::new(Self {
            call_target,
            declaration_frame,
            object_id: OnceCell::new(),
        })
    }
}

impl fmt::Debug for ProcObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcObject").finish_non_exhaustive()
    }
}

/// A guest exception instance.
#[derive(Debug)]
pub struct ExceptionObject {
    /// Exception class
    pub class: Arc<ModuleObject>,
    /// Message text
    pub message: String,
    /// Identity token, assigned on first request
    pub object_id: OnceCell<i64>,
}

impl ExceptionObject {
    /// New exception of `class` with `message`.
    pub fn new(class: Arc<ModuleObject>, message: &str) -> Arc<Self> {
        Arc::new(Self {
            class,
            message: message.to_string(),
            object_id: OnceCell::new(),
        })
    }
}
