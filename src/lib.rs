// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! # lumen-modules
//!
//! Module resolution and dynamic library loading for the Lumen
//! scripting runtime.
//!
//! Given a module name requested by running script code, this crate
//! locates the corresponding source file or compiled native library on
//! a configurable search path, loads it exactly once per runtime
//! instance, caches the result, and exposes a uniform loader
//! abstraction over both kinds of artifact.
//!
//! - `require(name)`: resolve, load once, cache
//! - `loadlib(path, symbol)`: low-level native loading
//! - `searchpath(name, path)`: path-template probing
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use lumen_modules::{ModuleRuntime, PathConfig, ScriptHost};
//!
//! let mut runtime = ModuleRuntime::with_config(PathConfig::from_env());
//! let value = runtime.require(&mut engine, "net.socket")?;
//! ```
//!
//! The engine reaches in through the [`ScriptHost`] trait; the crate
//! never executes code itself. All state is owned by [`ModuleRuntime`]:
//! no process globals, and native-library handles are released in
//! reverse acquisition order when the runtime closes.
//!
//! ## Search paths
//!
//! Paths are `;`-separated template lists where `?` stands for the
//! module name and `!` for the executable's directory, configured via
//! `LUMEN_PATH`/`LUMEN_CPATH` (or their `_1_0`-suffixed variants) and
//! disabled wholesale by `LUMEN_NOENV`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod dylib;
pub mod error;
pub mod host;
pub mod module_system;
pub mod runtime;
pub mod value;

// Re-exports
pub use config::PathConfig;
pub use dylib::{EntryPoint, LOAD_ONLY, LibraryRegistry, RawEntryFn};
pub use error::{LoadFailure, ModuleError, Result};
pub use host::ScriptHost;
pub use module_system::{Loader, ModuleCache, Searcher};
pub use runtime::{LoadStats, LoadedEntry, ModuleRuntime};
pub use value::Value;

/// Version of the lumen-modules crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
