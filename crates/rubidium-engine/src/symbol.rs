//! Interned symbol table.
//!
//! Symbols are canonicalized by exact byte content: two interns of the
//! same bytes return the same `Arc`, so symbol identity comparison is
//! pointer comparison. Population is at-most-once per key and safe for
//! concurrent callers.

use std::sync::Arc;

use dashmap::DashMap;

use crate::value::{RubidiumSymbol, Value};

/// Shared symbol table.
#[derive(Default)]
pub struct SymbolTable {
    symbols: DashMap<Vec<u8>, Arc<RubidiumSymbol>>,
}

impl SymbolTable {
    /// New empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a symbol by text.
    pub fn symbol(&self, name: &str) -> Value {
        self.symbol_from_bytes(name.as_bytes())
    }

    /// Intern a symbol by exact byte content.
    pub fn symbol_from_bytes(&self, bytes: &[u8]) -> Value {
        if let Some(existing) = self.symbols.get(bytes) {
            return Value::Symbol(existing.clone());
        }

        let interned = self
            .symbols
            .entry(bytes.to_vec())
            .or_insert_with(|| RubidiumSymbol::new(bytes.to_vec()))
            .clone();

        Value::Symbol(interned)
    }

    /// Number of interned symbols.
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// True when no symbol has been interned yet.
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}
