// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Seam to the language engine
//!
//! The module subsystem never executes code itself; it hands resolved
//! loaders to the engine through this trait. Both methods receive the
//! [`ModuleRuntime`] back so loader bodies can issue nested `require`
//! calls. The embedding is expected to serialize all calls into one
//! runtime, as the engine's own execution model already does.

use std::path::Path;

use crate::dylib::EntryPoint;
use crate::error::Result;
use crate::runtime::ModuleRuntime;
use crate::value::Value;

/// Engine-side operations the module subsystem depends on
pub trait ScriptHost {
    /// Compile and run freshly loaded source text
    ///
    /// `name` is the logical module name and `path` the file the text
    /// was read from; both are conventionally made visible to the
    /// executing chunk. `Ok(None)` means the chunk ran but produced no
    /// value, which `require` records as the loaded-sentinel.
    fn execute_source(
        &mut self,
        modules: &mut ModuleRuntime,
        name: &str,
        path: &Path,
        text: &str,
    ) -> Result<Option<Value>>;

    /// Call a native module's entry point
    ///
    /// The entry point follows the `lumen_open_*` ABI; the engine owns
    /// the state pointer it is called with. The library behind `entry`
    /// stays mapped until runtime teardown, so the call is sound at any
    /// point in the runtime's lifetime.
    fn invoke_entry(
        &mut self,
        modules: &mut ModuleRuntime,
        name: &str,
        path: &Path,
        entry: &EntryPoint,
    ) -> Result<Option<Value>>;
}
