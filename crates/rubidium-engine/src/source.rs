//! Source units.

/// An immutable (locator, content, encoding) triple.
///
/// File-backed units are created by the runtime's source cache and
/// shared for the process lifetime; inline evaluation builds transient
/// units that are never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUnit {
    /// Canonical locator (absolute path, virtual-scheme locator, or an
    /// eval pseudo-filename)
    pub name: String,
    /// Raw source bytes
    pub bytes: Vec<u8>,
    /// Default encoding name for the unit
    pub encoding: String,
}

impl SourceUnit {
    /// Unit from raw bytes.
    pub fn new(name: &str, bytes: Vec<u8>, encoding: &str) -> Self {
        Self {
            name: name.to_string(),
            bytes,
            encoding: encoding.to_string(),
        }
    }

    /// Transient unit from inline text, UTF-8.
    pub fn from_text(code: &str, name: &str) -> Self {
        Self::new(name, code.as_bytes().to_vec(), "UTF-8")
    }

    /// Source text as lossy UTF-8.
    pub fn code(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}
