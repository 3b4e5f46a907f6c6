// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Library handle registry
//!
//! Maps canonical file paths to opened native-library handles, one per
//! runtime instance. A library file is mapped into the process at most
//! once per registry; the registry owns every handle until
//! [`close_all`](LibraryRegistry::close_all) runs at runtime teardown,
//! which releases them in reverse acquisition order.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use super::platform::{self, DylibError, PlatformHandle, RawEntryFn};

/// One opened library and the path it was opened from
struct LibraryHandle {
    path: PathBuf,
    lib: PlatformHandle,
}

/// Per-runtime registry of opened native libraries
#[derive(Default)]
pub struct LibraryRegistry {
    /// Canonical path -> index into `handles`
    by_path: HashMap<PathBuf, usize>,
    /// Handles in acquisition order
    handles: Vec<LibraryHandle>,
    /// Number of native opens actually performed
    opens: u64,
}

impl LibraryRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached handle for `path`, opening the library on a miss
    ///
    /// On a hit `expose_global` is ignored: the library is already
    /// mapped with whatever visibility it was first opened under, and
    /// first-load visibility wins permanently for a given path.
    pub fn get_or_open(
        &mut self,
        path: &Path,
        expose_global: bool,
    ) -> Result<usize, DylibError> {
        let key = canonical_key(path);
        if let Some(&idx) = self.by_path.get(&key) {
            trace!(path = %key.display(), "library already mapped");
            return Ok(idx);
        }
        let lib = platform::open(path, expose_global)?;
        self.opens += 1;
        debug!(path = %key.display(), expose_global, "mapped native library");
        let idx = self.handles.len();
        self.handles.push(LibraryHandle {
            path: key.clone(),
            lib,
        });
        self.by_path.insert(key, idx);
        Ok(idx)
    }

    /// Resolve `symbol` in the library behind `index`
    pub fn lookup(&self, index: usize, symbol: &str) -> Result<RawEntryFn, DylibError> {
        platform::lookup(&self.handles[index].lib, symbol)
    }

    /// Path the library behind `index` was opened from
    pub fn path_of(&self, index: usize) -> &Path {
        &self.handles[index].path
    }

    /// Whether `path` currently has a mapped handle
    pub fn contains(&self, path: &Path) -> bool {
        self.by_path.contains_key(&canonical_key(path))
    }

    /// Number of currently open handles
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Whether no handle is open
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Number of native opens performed over the registry's lifetime
    pub fn opens(&self) -> u64 {
        self.opens
    }

    /// Release every handle in reverse acquisition order
    ///
    /// Safe to call with zero entries, and idempotent: a second call
    /// finds the registry empty.
    pub fn close_all(&mut self) {
        while let Some(handle) = self.handles.pop() {
            debug!(path = %handle.path.display(), "unmapping native library");
            platform::close(handle.lib);
        }
        self.by_path.clear();
    }
}

impl Drop for LibraryRegistry {
    fn drop(&mut self) {
        self.close_all();
    }
}

/// Canonical cache key for a library path
///
/// Falls back to the path as given when the file does not resolve
/// (the open will fail with the loader's own message in that case).
fn canonical_key(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};

    #[test]
    fn test_close_all_with_zero_handles() {
        let mut reg = LibraryRegistry::new();
        reg.close_all();
        reg.close_all();
        assert!(reg.is_empty());
        assert_eq!(reg.opens(), 0);
    }

    #[test]
    fn test_failed_open_registers_nothing() {
        let mut reg = LibraryRegistry::new();
        let path = PathBuf::from("./no-such-library.xyz");
        assert!(reg.get_or_open(&path, false).is_err());
        assert!(!reg.contains(&path));
        assert!(reg.is_empty());
        assert_eq!(reg.opens(), 0);
    }

    /// A shared object that ships with the host system, if one is where
    /// we expect it; tests that need a real library skip otherwise.
    #[cfg(all(feature = "native-loading", unix))]
    fn system_library() -> Option<&'static Path> {
        [
            "/lib/x86_64-linux-gnu/libm.so.6",
            "/lib/aarch64-linux-gnu/libm.so.6",
            "/usr/lib/libm.so.6",
            "/usr/lib/libSystem.B.dylib",
        ]
        .into_iter()
        .map(Path::new)
        .find(|p| p.exists())
    }

    #[cfg(all(feature = "native-loading", unix))]
    #[test]
    fn test_second_open_reuses_the_handle() {
        let Some(path) = system_library() else {
            return;
        };
        let mut reg = LibraryRegistry::new();
        let first = reg.get_or_open(path, false).unwrap();
        let second = reg.get_or_open(path, true).unwrap();

        // one native open, one handle, same index both times
        assert_eq!(first, second);
        assert_eq!(reg.opens(), 1);
        assert_eq!(reg.len(), 1);
        assert!(reg.contains(path));
        assert_eq!(reg.path_of(first), path.canonicalize().unwrap());

        reg.close_all();
        assert!(reg.is_empty());
        assert!(!reg.contains(path));
        // the open count is historical, teardown does not rewind it
        assert_eq!(reg.opens(), 1);
    }

    #[cfg(all(feature = "native-loading", unix))]
    #[test]
    fn test_close_all_over_live_handles_is_idempotent() {
        let Some(path) = system_library() else {
            return;
        };
        let mut reg = LibraryRegistry::new();
        reg.get_or_open(path, false).unwrap();
        assert_eq!(reg.len(), 1);
        reg.close_all();
        reg.close_all();
        assert!(reg.is_empty());
    }
}
