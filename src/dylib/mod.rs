// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Native dynamic-library loading
//!
//! Three layers, leaf-first:
//!
//! - **platform**: per-OS open/lookup/close, errors normalized to strings
//! - **registry**: at-most-one handle per path, reverse-order teardown
//! - **entry**: `lumen_open_*` symbol derivation and resolution

pub mod entry;
pub mod platform;
pub mod registry;

pub use entry::{EntryPoint, LOAD_ONLY};
pub use platform::{DylibError, RawEntryFn, UNSUPPORTED_MSG};
pub use registry::LibraryRegistry;
