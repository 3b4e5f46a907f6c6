// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! The module runtime
//!
//! [`ModuleRuntime`] owns every piece of per-runtime state the
//! subsystem needs: search-path configuration, the preload table, the
//! searcher chain, the module cache and the native-library registry.
//! Nothing here is a process global; two runtimes in one process load
//! the same library path into two independent handles.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::PathConfig;
use crate::dylib::entry::{self, LookedUp};
use crate::dylib::{DylibError, EntryPoint, LibraryRegistry};
use crate::error::{ModuleError, Result};
use crate::host::ScriptHost;
use crate::module_system::cache::ModuleCache;
use crate::module_system::path::search_path;
use crate::module_system::searcher::{DEFAULT_CHAIN, Loader, PreloadFn, Searcher, SearcherResult};
use crate::value::Value;

/// Result of the low-level [`loadlib`](ModuleRuntime::loadlib)
#[derive(Debug)]
pub enum LoadedEntry {
    /// A concrete entry point was resolved
    Entry(EntryPoint),
    /// The wildcard was given: the library is mapped as a symbol
    /// source, no entry point was looked up
    Opened,
}

/// Load-activity counters, a side channel for tests and diagnostics
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadStats {
    /// Loaders actually executed by `require`
    pub loader_invocations: u64,
    /// Requires answered from the module cache
    pub cache_hits: u64,
}

/// Per-runtime module resolution state
pub struct ModuleRuntime {
    config: PathConfig,
    preload: HashMap<String, PreloadFn>,
    searchers: Vec<Searcher>,
    modules: ModuleCache,
    registry: LibraryRegistry,
    stats: LoadStats,
}

impl ModuleRuntime {
    /// Create a runtime configured from the environment
    pub fn new() -> Self {
        Self::with_config(PathConfig::from_env())
    }

    /// Create a runtime with an explicit path configuration
    pub fn with_config(config: PathConfig) -> Self {
        Self {
            config,
            preload: HashMap::new(),
            searchers: DEFAULT_CHAIN.to_vec(),
            modules: ModuleCache::new(),
            registry: LibraryRegistry::new(),
            stats: LoadStats::default(),
        }
    }

    /// The active search paths
    pub fn config(&self) -> &PathConfig {
        &self.config
    }

    /// Swap the search paths
    ///
    /// Only between resolutions; an in-flight `require` holds `&mut
    /// self`, so the borrow checker enforces that much for free.
    pub fn set_config(&mut self, config: PathConfig) {
        self.config = config;
    }

    /// Register a preload loader for `name`
    ///
    /// The preload searcher runs first, so a registered entry shadows
    /// any file of the same name on the search paths.
    pub fn preload<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&mut ModuleRuntime, &mut dyn ScriptHost, &str) -> Result<Option<Value>>
            + Send
            + Sync
            + 'static,
    {
        self.preload.insert(name.into(), std::sync::Arc::new(f));
    }

    /// Names currently registered in the preload table
    pub fn preloaded(&self) -> Vec<String> {
        self.preload.keys().cloned().collect()
    }

    /// The loaded-modules cache
    pub fn loaded(&self) -> &ModuleCache {
        &self.modules
    }

    /// The native-library registry
    pub fn registry(&self) -> &LibraryRegistry {
        &self.registry
    }

    /// Load-activity counters
    pub fn stats(&self) -> LoadStats {
        self.stats
    }

    pub(crate) fn preload_fn(&self, name: &str) -> Option<PreloadFn> {
        self.preload.get(name).cloned()
    }

    pub(crate) fn registry_mut(&mut self) -> &mut LibraryRegistry {
        &mut self.registry
    }

    /// Resolve `name` to a loader by driving the searcher chain
    ///
    /// Searchers run in their fixed order; the first hit wins, a hard
    /// error propagates immediately, and exhaustion produces
    /// [`ModuleError::ModuleNotFound`] carrying every searcher's
    /// not-found line.
    pub fn find_loader(&mut self, name: &str) -> Result<Loader> {
        let mut tried = String::new();
        let chain = self.searchers.clone();
        for searcher in chain {
            match searcher.resolve(self, name)? {
                SearcherResult::Found(loader) => {
                    debug!(module = name, ?searcher, ?loader, "loader found");
                    return Ok(loader);
                }
                SearcherResult::NotFound(line) => tried.push_str(&line),
            }
        }
        Err(ModuleError::ModuleNotFound {
            name: name.to_string(),
            tried,
        })
    }

    /// Load a module, at most once per runtime lifetime
    ///
    /// A truthy cached value short-circuits without touching any
    /// searcher. Otherwise the chain resolves a loader, the loader runs
    /// through `host` with `(name, resolved path)`, and the produced
    /// value (or the `true` sentinel when it produced none) is cached
    /// under `name`. Failures are not cached; a later call retries
    /// resolution from scratch.
    ///
    /// A loader body may re-enter `require` for its own name; the
    /// in-flight load is not detected and resolution plus execution
    /// run again. Native re-opens are deduplicated by the registry,
    /// repeated source execution is the embedder's to avoid.
    pub fn require(&mut self, host: &mut dyn ScriptHost, name: &str) -> Result<Value> {
        if let Some(cached) = self.modules.get(name) {
            if cached.is_truthy() {
                self.stats.cache_hits += 1;
                return Ok(cached);
            }
        }
        let loader = self.find_loader(name)?;
        let produced = self.run_loader(host, name, loader)?;
        if let Some(value) = produced {
            self.modules.set(name, value);
        }
        // the loader body may have stored a value re-entrantly
        match self.modules.get(name) {
            Some(value) => Ok(value),
            None => {
                self.modules.set_loaded_sentinel(name);
                Ok(Value::Boolean(true))
            }
        }
    }

    fn run_loader(
        &mut self,
        host: &mut dyn ScriptHost,
        name: &str,
        loader: Loader,
    ) -> Result<Option<Value>> {
        self.stats.loader_invocations += 1;
        match loader {
            Loader::Preloaded(f) => f(self, host, name),
            Loader::Source { path, text } => host.execute_source(self, name, &path, &text),
            Loader::Native { path, entry } => host.invoke_entry(self, name, &path, &entry),
        }
    }

    /// Low-level library loader
    ///
    /// Opens (or reuses) the library at `path` and resolves `symbol`
    /// in it. The wildcard `*` maps the library with global symbol
    /// visibility and resolves nothing. On failure,
    /// [`ModuleError::load_failure`] tells the caller which stage
    /// failed: `Open`, `Init` (symbol missing), or `Absent` (no
    /// dynamic loading on this build).
    pub fn loadlib(&mut self, path: &Path, symbol: &str) -> Result<LoadedEntry> {
        match entry::look_for(&mut self.registry, path, symbol) {
            Ok(LookedUp::Entry(e)) => Ok(LoadedEntry::Entry(e)),
            Ok(LookedUp::LibraryOnly) => Ok(LoadedEntry::Opened),
            Err(DylibError::Open(message)) => Err(ModuleError::LibraryLoadFailed {
                path: path.to_path_buf(),
                message,
            }),
            Err(DylibError::Symbol(message)) => Err(ModuleError::SymbolNotFound {
                symbol: symbol.to_string(),
                path: path.to_path_buf(),
                message,
            }),
            Err(DylibError::Unsupported) => Err(ModuleError::DynamicLoadingUnsupported),
        }
    }

    /// Expand `path`'s templates against `name`, returning the first
    /// readable candidate
    ///
    /// `sep` defaults to `"."` and `dirsep` to the platform directory
    /// separator when `None`.
    pub fn searchpath(
        &self,
        name: &str,
        path: &str,
        sep: Option<&str>,
        dirsep: Option<&str>,
    ) -> Result<PathBuf> {
        search_path(
            name,
            path,
            sep.unwrap_or("."),
            dirsep.unwrap_or(std::path::MAIN_SEPARATOR_STR),
        )
        .map_err(|tried| ModuleError::SourceNotFound {
            name: name.to_string(),
            tried,
        })
    }

    /// Tear down the native-library registry
    ///
    /// Every open handle is released in reverse acquisition order.
    /// Also runs on drop; calling it twice is harmless.
    pub fn close(&mut self) {
        self.registry.close_all();
    }
}

impl Default for ModuleRuntime {
    fn default() -> Self {
        Self::new()
    }
}
