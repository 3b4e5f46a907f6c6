// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Error types for the module subsystem

use std::path::PathBuf;
use thiserror::Error;

/// Result type for module subsystem operations
pub type Result<T> = std::result::Result<T, ModuleError>;

/// Errors that can occur while resolving or loading modules
#[derive(Debug, Error)]
pub enum ModuleError {
    /// The native loader could not map the library file into the process
    #[error("cannot open library '{}': {message}", path.display())]
    LibraryLoadFailed {
        /// Library file that failed to open
        path: PathBuf,
        /// Platform loader's native error text
        message: String,
    },

    /// The library mapped but the expected entry point is missing
    #[error("no symbol '{symbol}' in library '{}': {message}", path.display())]
    SymbolNotFound {
        /// Symbol that was looked up
        symbol: String,
        /// Library the lookup ran against
        path: PathBuf,
        /// Platform loader's native error text
        message: String,
    },

    /// No path template produced a readable file
    #[error("source for '{name}' not found:{tried}")]
    SourceNotFound {
        /// Name the templates were expanded against
        name: String,
        /// One "no file" line per candidate probed
        tried: String,
    },

    /// Every searcher in the chain exhausted itself
    #[error("module '{name}' not found:{tried}")]
    ModuleNotFound {
        /// Requested module name
        name: String,
        /// Concatenation of every searcher's not-found line
        tried: String,
    },

    /// A searcher located a file but could not turn it into a loader,
    /// or the loader itself failed while producing the module value
    #[error("error loading module '{module}' from file '{}':\n\t{reason}", path.display())]
    LoaderFailed {
        /// Module being loaded
        module: String,
        /// File the loader was built from
        path: PathBuf,
        /// Underlying failure text
        reason: String,
    },

    /// Platform loader stub is active (feature off or unsupported OS)
    #[error("dynamic libraries not enabled; check your Lumen installation")]
    DynamicLoadingUnsupported,

    /// Failure propagated from the script engine while running a loader
    #[error("{0}")]
    Host(String),
}

impl ModuleError {
    /// Create a host-propagated error
    pub fn host(msg: impl Into<String>) -> Self {
        Self::Host(msg.into())
    }

    /// The loadlib failure stage, for errors that represent one
    ///
    /// Scripts receive this as the failure-kind tag next to the error
    /// text when the low-level loader fails.
    pub fn load_failure(&self) -> Option<LoadFailure> {
        match self {
            ModuleError::LibraryLoadFailed { .. } => Some(LoadFailure::Open),
            ModuleError::SymbolNotFound { .. } => Some(LoadFailure::Init),
            ModuleError::DynamicLoadingUnsupported => Some(LoadFailure::Absent),
            _ => None,
        }
    }
}

/// Failure stage reported by [`loadlib`](crate::ModuleRuntime::loadlib)
///
/// Mirrors the three-way split the low-level loader exposes to scripts:
/// the library could not be opened, the library opened but the requested
/// entry point was missing, or dynamic loading does not exist on this
/// build at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadFailure {
    /// Library could not be mapped
    Open,
    /// Entry point missing after a successful map
    Init,
    /// Dynamic loading unsupported on this build
    Absent,
}

impl LoadFailure {
    /// Short tag matching what scripts receive as the failure kind
    pub fn as_str(self) -> &'static str {
        match self {
            LoadFailure::Open => "open",
            LoadFailure::Init => "init",
            LoadFailure::Absent => "absent",
        }
    }
}
