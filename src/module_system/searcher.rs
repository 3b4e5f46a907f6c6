// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! The searcher chain
//!
//! Four strategies tried in fixed order: preload table, interpreted
//! source, native library, native library by root package name. A
//! searcher either produces a concrete [`Loader`], reports "not found"
//! with a diagnostic line for the accumulated error message, or raises
//! a hard error that stops the chain.

use std::fmt;
use std::fs;
use std::path::{MAIN_SEPARATOR_STR, Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::dylib::{DylibError, EntryPoint, entry};
use crate::error::{ModuleError, Result};
use crate::host::ScriptHost;
use crate::module_system::path::search_path;
use crate::runtime::ModuleRuntime;
use crate::value::Value;

/// A preload loader registered by the embedder
pub type PreloadFn = Arc<
    dyn Fn(&mut ModuleRuntime, &mut dyn ScriptHost, &str) -> Result<Option<Value>> + Send + Sync,
>;

/// What a successful search produced: how to actually load the module
pub enum Loader {
    /// Run a registered preload function
    Preloaded(PreloadFn),
    /// Execute interpreted source read from `path`
    Source {
        /// Resolved source file
        path: PathBuf,
        /// File contents, read at search time
        text: String,
    },
    /// Call a resolved native entry point
    Native {
        /// Library the entry point lives in
        path: PathBuf,
        /// The resolved entry point
        entry: EntryPoint,
    },
}

impl Loader {
    /// The resolved file path, for loaders that have one
    pub fn path(&self) -> Option<&Path> {
        match self {
            Loader::Preloaded(_) => None,
            Loader::Source { path, .. } | Loader::Native { path, .. } => Some(path),
        }
    }
}

impl fmt::Debug for Loader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Loader::Preloaded(_) => f.write_str("Loader::Preloaded"),
            Loader::Source { path, .. } => write!(f, "Loader::Source({})", path.display()),
            Loader::Native { path, entry } => {
                write!(f, "Loader::Native({}, {})", path.display(), entry.symbol())
            }
        }
    }
}

/// Soft outcome of one searcher
pub enum SearcherResult {
    /// A loader was produced; the chain stops here
    Found(Loader),
    /// Not found; the line joins the accumulated diagnostic
    NotFound(String),
}

/// One strategy in the chain
///
/// The set is closed and the order fixed at runtime construction;
/// searchers share the runtime's preload table, path configuration and
/// library registry rather than closing over them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Searcher {
    /// Verbatim lookup in the preload table
    Preload,
    /// Interpreted source on the source path
    Source,
    /// Native library on the native path
    Native,
    /// Native library resolved by the root segment of a dotted name
    NativeRoot,
}

/// The built-in chain, in resolution order
pub const DEFAULT_CHAIN: [Searcher; 4] = [
    Searcher::Preload,
    Searcher::Source,
    Searcher::Native,
    Searcher::NativeRoot,
];

impl Searcher {
    /// Try to resolve `name` with this strategy
    pub(crate) fn resolve(self, rt: &mut ModuleRuntime, name: &str) -> Result<SearcherResult> {
        match self {
            Searcher::Preload => Ok(resolve_preload(rt, name)),
            Searcher::Source => resolve_source(rt, name),
            Searcher::Native => resolve_native(rt, name, name),
            Searcher::NativeRoot => match name.split_once('.') {
                // a root name has no separate root loader to offer
                None => Ok(SearcherResult::NotFound(String::new())),
                Some((root, _)) => resolve_native(rt, root, name),
            },
        }
    }
}

fn resolve_preload(rt: &ModuleRuntime, name: &str) -> SearcherResult {
    match rt.preload_fn(name) {
        Some(f) => SearcherResult::Found(Loader::Preloaded(f)),
        None => SearcherResult::NotFound(format!("\n\tno entry preload['{name}']")),
    }
}

fn resolve_source(rt: &ModuleRuntime, name: &str) -> Result<SearcherResult> {
    let found = search_path(name, rt.config().source_path.as_str(), ".", MAIN_SEPARATOR_STR);
    match found {
        Err(tried) => Ok(SearcherResult::NotFound(tried)),
        Ok(path) => {
            debug!(module = name, path = %path.display(), "source module found");
            let text = fs::read_to_string(&path).map_err(|e| ModuleError::LoaderFailed {
                module: name.to_string(),
                path: path.clone(),
                reason: e.to_string(),
            })?;
            Ok(SearcherResult::Found(Loader::Source { path, text }))
        }
    }
}

/// Shared body of the native and native-root searchers: probe the
/// native path for `file_name`, then resolve the entry point derived
/// from the full `module` name.
fn resolve_native(rt: &mut ModuleRuntime, file_name: &str, module: &str) -> Result<SearcherResult> {
    let found = search_path(
        file_name,
        rt.config().native_path.as_str(),
        ".",
        MAIN_SEPARATOR_STR,
    );
    let path = match found {
        Err(tried) => return Ok(SearcherResult::NotFound(tried)),
        Ok(path) => path,
    };
    debug!(module, path = %path.display(), "native library found");
    match entry::resolve_entry(rt.registry_mut(), &path, module) {
        Ok(entry) => Ok(SearcherResult::Found(Loader::Native { path, entry })),
        // entry-point absence falls through to the next searcher
        Err(DylibError::Symbol(_)) => Ok(SearcherResult::NotFound(format!(
            "\n\tno module '{module}' in file '{}'",
            path.display()
        ))),
        // a load failure stops the chain, loader text verbatim
        Err(DylibError::Open(message)) => Err(ModuleError::LibraryLoadFailed { path, message }),
        Err(DylibError::Unsupported) => Err(ModuleError::DynamicLoadingUnsupported),
    }
}
