// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Entry-point symbol derivation and resolution
//!
//! A native module exports one initialization function per logical
//! module name: `lumen_open_` followed by the name with dots replaced by
//! underscores. An ignore mark (`-`) inside a name truncates derivation
//! to the part before it, so one binary can serve differently-suffixed
//! distribution names; the full post-mark name is retried only when the
//! truncated symbol is genuinely missing. This boundary is inherently
//! stringly-typed (it crosses the dynamic-loading ABI) and is kept
//! contained to this module.

use std::fmt;
use std::path::Path;

use tracing::debug;

use crate::config::{ENTRY_PREFIX, ENTRY_SEP, IGNORE_MARK};

use super::platform::{DylibError, RawEntryFn};
use super::registry::LibraryRegistry;

/// Wildcard symbol meaning "open the library, look nothing up"
pub const LOAD_ONLY: &str = "*";

/// A resolved native entry point
#[derive(Clone)]
pub struct EntryPoint {
    symbol: String,
    func: RawEntryFn,
}

impl EntryPoint {
    /// The exported symbol this entry was resolved from
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// The raw function pointer
    ///
    /// Valid for as long as the originating [`LibraryRegistry`] keeps
    /// the library mapped, which is the runtime's whole lifetime.
    pub fn raw(&self) -> RawEntryFn {
        self.func
    }
}

impl fmt::Debug for EntryPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntryPoint")
            .field("symbol", &self.symbol)
            .finish_non_exhaustive()
    }
}

/// Outcome of a low-level symbol lookup
pub enum LookedUp {
    /// A concrete entry point was resolved
    Entry(EntryPoint),
    /// The wildcard was requested: the library is mapped, nothing looked up
    LibraryOnly,
}

/// Look for `symbol` in the library at `path`, loading it first if needed
///
/// The wildcard `*` opens the library with global symbol visibility and
/// reports success without resolving anything, which is how a library is
/// preloaded purely as a symbol source for later loads.
pub fn look_for(
    registry: &mut LibraryRegistry,
    path: &Path,
    symbol: &str,
) -> Result<LookedUp, DylibError> {
    let load_only = symbol == LOAD_ONLY;
    let idx = registry.get_or_open(path, load_only)?;
    if load_only {
        return Ok(LookedUp::LibraryOnly);
    }
    let func = registry.lookup(idx, symbol)?;
    Ok(LookedUp::Entry(EntryPoint {
        symbol: symbol.to_string(),
        func,
    }))
}

/// Derive the entry symbols for a logical module name
///
/// Returns the primary symbol and, when the name carries an ignore
/// mark, the backward-compatible full-name fallback.
pub fn derive_symbols(logical: &str) -> (String, Option<String>) {
    let flat = logical.replace('.', ENTRY_SEP);
    match flat.find(IGNORE_MARK) {
        Some(pos) => (
            format!("{ENTRY_PREFIX}{}", &flat[..pos]),
            Some(format!("{ENTRY_PREFIX}{}", &flat[pos + 1..])),
        ),
        None => (format!("{ENTRY_PREFIX}{flat}"), None),
    }
}

/// Resolve the entry point for `logical` inside the library at `path`
///
/// Tries the ignore-mark-truncated symbol first; only a missing-symbol
/// failure (not a load failure) falls back to the full name.
pub fn resolve_entry(
    registry: &mut LibraryRegistry,
    path: &Path,
    logical: &str,
) -> Result<EntryPoint, DylibError> {
    let (primary, fallback) = derive_symbols(logical);
    debug!(module = logical, symbol = %primary, path = %path.display(), "resolving entry point");
    match look_for(registry, path, &primary) {
        Ok(LookedUp::Entry(entry)) => Ok(entry),
        Ok(LookedUp::LibraryOnly) => unreachable!("derived symbols are never the wildcard"),
        Err(DylibError::Symbol(first_msg)) => match fallback {
            Some(compat) => {
                debug!(symbol = %compat, "primary symbol missing, trying compat name");
                match look_for(registry, path, &compat)? {
                    LookedUp::Entry(entry) => Ok(entry),
                    LookedUp::LibraryOnly => unreachable!(),
                }
            }
            None => Err(DylibError::Symbol(first_msg)),
        },
        Err(other) => Err(other),
    }
}
