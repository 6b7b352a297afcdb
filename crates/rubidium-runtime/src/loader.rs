//! Source loading and the memoizing source cache.

use std::path::Path;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use rubidium_engine::SourceUnit;

use crate::error::{RuntimeError, RuntimeResult};
use crate::host::HostRuntime;

/// The guest's own virtual scheme, addressing sources packaged outside
/// the plain filesystem (resolved under the runtime home).
pub const RUBIDIUM_SCHEME: &str = "rbx:";

/// The host's classpath-style scheme, rewritten to [`RUBIDIUM_SCHEME`]
/// during context initialization.
pub const CLASSPATH_SCHEME: &str = "uri:classloader:";

/// Reads source units from the filesystem or from virtual-scheme
/// locators.
pub struct SourceLoader {
    host: Arc<dyn HostRuntime>,
}

impl SourceLoader {
    /// Loader resolving virtual locators against `host`.
    pub fn new(host: Arc<dyn HostRuntime>) -> Self {
        Self { host }
    }

    /// Read the source unit at `locator`. I/O failures propagate; they
    /// are never retried here.
    pub fn load(&self, locator: &str) -> RuntimeResult<SourceUnit> {
        let path = if let Some(rest) = locator.strip_prefix(RUBIDIUM_SCHEME) {
            Path::new(&self.host.runtime_home()).join(rest.trim_start_matches('/'))
        } else {
            Path::new(locator).to_path_buf()
        };

        let bytes = std::fs::read(&path)?;
        Ok(SourceUnit::new(locator, bytes, "UTF-8"))
    }
}

/// Memoizing source lookup keyed by canonical locator.
///
/// At most one read per distinct locator for the process lifetime:
/// concurrent first lookups are serialized per key through the map's
/// entry API, and later calls return the cached unit even if the
/// underlying file is gone.
pub struct SourceCache {
    loader: SourceLoader,
    sources: DashMap<String, Arc<SourceUnit>>,
}

impl SourceCache {
    /// Cache over `loader`.
    pub fn new(loader: SourceLoader) -> Self {
        Self {
            loader,
            sources: DashMap::new(),
        }
    }

    /// Cached unit for `locator`, reading it on first use.
    pub fn get_source(&self, locator: &str) -> RuntimeResult<Arc<SourceUnit>> {
        if let Some(cached) = self.sources.get(locator) {
            return Ok(cached.clone());
        }

        match self.sources.entry(locator.to_string()) {
            Entry::Occupied(occupied) => Ok(occupied.get().clone()),
            Entry::Vacant(vacant) => {
                let unit = Arc::new(self.loader.load(locator)?);
                vacant.insert(unit.clone());
                Ok(unit)
            }
        }
    }

    /// Number of cached units.
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// True when nothing has been loaded yet.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
