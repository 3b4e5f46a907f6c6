// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Path template resolution
//!
//! A search path is a `;`-separated list of templates; each `?` in a
//! template is replaced by the module name being resolved. Templates
//! are probed left to right and the first readable candidate wins. A
//! miss over the whole path yields a diagnostic listing every candidate
//! tried, which the searcher chain folds into its own report.

use std::fs::File;
use std::path::PathBuf;

use tracing::trace;

use crate::config::{PATH_MARK, PATH_SEP};

/// Iterate the templates of a search path
///
/// Repeated leading separators are skipped; a trailing empty segment
/// ends the list, so `"a;;b"` yields `a`, `b` and `"a;"` yields `a`.
pub fn templates(path: &str) -> impl Iterator<Item = &str> {
    path.split(PATH_SEP).filter(|t| !t.is_empty())
}

/// Expand every template of `path` against `name`, returning the first
/// readable candidate
///
/// A non-empty `sep` has each of its occurrences in `name` replaced by
/// `dirsep` before templating, mapping dotted module names onto
/// directory layouts. The `Err` carries one `no file` line per
/// candidate, in template order.
pub fn search_path(
    name: &str,
    path: &str,
    sep: &str,
    dirsep: &str,
) -> Result<PathBuf, String> {
    let name = if sep.is_empty() {
        name.to_string()
    } else {
        name.replace(sep, dirsep)
    };
    let mut tried = String::new();
    for template in templates(path) {
        let candidate = template.replace(PATH_MARK, &name);
        trace!(candidate, "probing");
        if readable(&candidate) {
            return Ok(PathBuf::from(candidate));
        }
        tried.push_str(&format!("\n\tno file '{candidate}'"));
    }
    Err(tried)
}

/// Whether the file exists and can be opened for reading
fn readable(path: &str) -> bool {
    File::open(path).is_ok()
}
