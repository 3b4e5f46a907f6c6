// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module resolution
//!
//! - **path**: search-path templating and filesystem probing
//! - **searcher**: the ordered resolution strategies
//! - **cache**: the loaded-modules table behind `require()`

pub mod cache;
pub mod path;
pub mod searcher;

pub use cache::ModuleCache;
pub use path::search_path;
pub use searcher::{DEFAULT_CHAIN, Loader, PreloadFn, Searcher, SearcherResult};
