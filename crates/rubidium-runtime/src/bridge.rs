//! The host↔guest conversion bridge.
//!
//! Two total dispatches over the runtime kind of the input. Every
//! recognized kind has exactly one mapping; anything else fails with an
//! unsupported-conversion error naming the kind — values are never
//! silently coerced. Strings cross byte-exact and keep their taint
//! flag; symbols are canonicalized through the context's shared symbol
//! table; host exceptions translate through a fixed class-name map.

use crate::context::RuntimeContext;
use crate::error::{RuntimeError, RuntimeResult};
use crate::host::{HostString, HostValue};

use rubidium_engine::Value;

impl RuntimeContext {
    /// Convert a guest value to the host representation.
    pub fn to_host(&self, value: &Value) -> RuntimeResult<HostValue> {
        // Singletons convert by identity, not structure.
        if self.core_library().is_kernel_module(value) {
            return Ok(HostValue::Kernel);
        }
        if self.core_library().is_main_object(value) {
            return Ok(HostValue::TopSelf);
        }

        match value {
            Value::Nil => Ok(HostValue::Nil),
            Value::Bool(b) => Ok(HostValue::Bool(*b)),
            Value::Int(i) => Ok(HostValue::Fixnum(i64::from(*i))),
            Value::Long(i) => Ok(HostValue::Fixnum(*i)),
            Value::Float(f) => Ok(HostValue::Float(*f)),
            Value::Str(string) => Ok(HostValue::Str(HostString {
                bytes: string.bytes.clone(),
                tainted: string.tainted,
            })),
            Value::Symbol(symbol) => Ok(HostValue::Symbol(symbol.as_str())),
            Value::Array(array) => {
                let elements = array.to_vec();
                let mut converted = Vec::with_capacity(elements.len());
                for element in &elements {
                    converted.push(self.to_host(element)?);
                }
                Ok(HostValue::Array(converted))
            }
            Value::Encoding(encoding) => {
                let name = self
                    .host()
                    .lookup_encoding(&encoding.name)
                    .ok_or_else(|| RuntimeError::UnknownEncoding(encoding.name.clone()))?;
                Ok(HostValue::Encoding(name))
            }
            other => Err(RuntimeError::HostConversion {
                value: other.to_string(),
                kind: other.kind_name().to_string(),
            }),
        }
    }

    /// Convert a slice of guest values, preserving order.
    pub fn to_host_values(&self, values: &[Value]) -> RuntimeResult<Vec<HostValue>> {
        values.iter().map(|value| self.to_host(value)).collect()
    }

    /// Convert a host value to the guest representation.
    pub fn to_guest(&self, value: &HostValue) -> RuntimeResult<Value> {
        match value {
            HostValue::TopSelf => Ok(self.core_library().main_object()),
            HostValue::Kernel => Ok(self.core_library().kernel_module()),
            HostValue::Nil => Ok(self.core_library().nil_object()),
            HostValue::Bool(b) => Ok(Value::Bool(*b)),
            HostValue::Fixnum(i) => Ok(match i32::try_from(*i) {
                Ok(narrow) => Value::Int(narrow),
                Err(_) => Value::Long(*i),
            }),
            HostValue::Float(f) => Ok(Value::Float(*f)),
            HostValue::Str(string) => Ok(self.core_library().create_string(
                string.bytes.clone(),
                "UTF-8",
                string.tainted,
            )),
            HostValue::Symbol(name) => Ok(self.symbol_table().symbol(name)),
            HostValue::Array(elements) => {
                let mut converted = Vec::with_capacity(elements.len());
                for element in elements {
                    converted.push(self.to_guest(element)?);
                }
                Ok(Value::Array(rubidium_engine::RubidiumArray::from_vec(
                    converted,
                )))
            }
            HostValue::Encoding(name) => Ok(self.core_library().create_encoding(name)),
            HostValue::Exception {
                class_name,
                message,
            } => self.translate_exception(class_name, message),
        }
    }

    /// Translate a host exception by class name against the fixed map.
    /// Any class outside the map is an unsupported conversion.
    fn translate_exception(&self, class_name: &str, message: &str) -> RuntimeResult<Value> {
        match class_name {
            "ArgumentError" => Ok(self.core_library().argument_error(message)),
            "Encoding::CompatibilityError" => {
                Ok(self.core_library().encoding_compatibility_error(message))
            }
            "TypeError" => Ok(self.core_library().type_error(message)),
            "RegexpError" => Ok(self.core_library().regexp_error(message)),
            _ => Err(RuntimeError::ExceptionTranslation {
                class_name: class_name.to_string(),
            }),
        }
    }
}
