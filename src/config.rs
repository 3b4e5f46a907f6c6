// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Search-path configuration
//!
//! Search paths come from environment variables when present (a
//! version-suffixed name is preferred over the plain one), falling back
//! to compiled-in defaults. `LUMEN_NOENV` disables the environment
//! lookup entirely. A doubled separator (`;;`) inside an environment
//! path splices the default path in at that position, and `!` in a
//! template expands to the running executable's directory.

use std::env;
use std::path::MAIN_SEPARATOR;

/// Character separating templates in a search path
pub const PATH_SEP: char = ';';

/// Substitution marker replaced by the module name inside a template
pub const PATH_MARK: char = '?';

/// Marker replaced by the running executable's directory
pub const EXEC_DIR_MARK: char = '!';

/// Mark inside a module name that truncates entry-point symbol derivation
pub const IGNORE_MARK: char = '-';

/// Prefix of every native entry-point symbol
pub const ENTRY_PREFIX: &str = "lumen_open_";

/// Separator joining name segments inside an entry-point symbol
pub const ENTRY_SEP: &str = "_";

/// File extension of interpreted Lumen source
pub const SOURCE_EXT: &str = "lum";

/// Native library extension on this platform
#[cfg(target_os = "windows")]
pub const NATIVE_EXT: &str = "dll";
/// Native library extension on this platform
#[cfg(target_os = "macos")]
pub const NATIVE_EXT: &str = "dylib";
/// Native library extension on this platform
#[cfg(not(any(target_os = "windows", target_os = "macos")))]
pub const NATIVE_EXT: &str = "so";

/// Environment variable for the source search path (versioned, preferred)
pub const ENV_PATH_VERSIONED: &str = "LUMEN_PATH_1_0";
/// Environment variable for the source search path (fallback)
pub const ENV_PATH: &str = "LUMEN_PATH";
/// Environment variable for the native search path (versioned, preferred)
pub const ENV_CPATH_VERSIONED: &str = "LUMEN_CPATH_1_0";
/// Environment variable for the native search path (fallback)
pub const ENV_CPATH: &str = "LUMEN_CPATH";
/// When set (to anything, including the empty string), both path
/// variables are ignored
pub const ENV_NOENV: &str = "LUMEN_NOENV";

/// Compiled-in default source search path
pub fn default_source_path() -> String {
    format!(
        "./?.{ext};./?/init.{ext};!/lum/?.{ext};!/lum/?/init.{ext}",
        ext = SOURCE_EXT
    )
}

/// Compiled-in default native search path
pub fn default_native_path() -> String {
    format!("./?.{ext};!/?.{ext}", ext = NATIVE_EXT)
}

/// Active search paths for one runtime instance
#[derive(Debug, Clone)]
pub struct PathConfig {
    /// Search path for interpreted source modules
    pub source_path: String,
    /// Search path for native library modules
    pub native_path: String,
}

impl PathConfig {
    /// Build a configuration from the environment
    ///
    /// Honors `LUMEN_PATH_1_0`/`LUMEN_PATH` and
    /// `LUMEN_CPATH_1_0`/`LUMEN_CPATH`, unless `LUMEN_NOENV` is set.
    pub fn from_env() -> Self {
        let noenv = env::var_os(ENV_NOENV).is_some();
        let source_path = resolve_path(
            lookup(ENV_PATH_VERSIONED).or_else(|| lookup(ENV_PATH)),
            &default_source_path(),
            noenv,
        );
        let native_path = resolve_path(
            lookup(ENV_CPATH_VERSIONED).or_else(|| lookup(ENV_CPATH)),
            &default_native_path(),
            noenv,
        );
        Self {
            source_path,
            native_path,
        }
    }

    /// Build a configuration with explicit paths, bypassing the environment
    pub fn with_paths(source_path: impl Into<String>, native_path: impl Into<String>) -> Self {
        Self {
            source_path: substitute_exec_dir(&source_path.into()),
            native_path: substitute_exec_dir(&native_path.into()),
        }
    }

    /// The subsystem's marker characters, one per line
    ///
    /// Order: directory separator, template separator, substitution mark,
    /// executable-directory mark, ignore mark.
    pub fn config_string() -> String {
        format!(
            "{}\n{}\n{}\n{}\n{}\n",
            MAIN_SEPARATOR, PATH_SEP, PATH_MARK, EXEC_DIR_MARK, IGNORE_MARK
        )
    }
}

impl Default for PathConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

fn lookup(var: &str) -> Option<String> {
    env::var(var).ok()
}

/// Pick the effective path for one of the two search paths
///
/// An environment value containing a doubled separator has the default
/// spliced in at that position.
fn resolve_path(env_value: Option<String>, default: &str, noenv: bool) -> String {
    let raw = match env_value {
        Some(v) if !noenv => {
            let doubled = format!("{PATH_SEP}{PATH_SEP}");
            let splice = format!("{PATH_SEP}{default}{PATH_SEP}");
            v.replace(&doubled, &splice)
        }
        _ => default.to_string(),
    };
    substitute_exec_dir(&raw)
}

/// Replace the executable-directory marker with the running binary's
/// parent directory; the marker is left alone when that directory
/// cannot be determined.
fn substitute_exec_dir(path: &str) -> String {
    if !path.contains(EXEC_DIR_MARK) {
        return path.to_string();
    }
    match env::current_exe().ok().and_then(|p| {
        p.parent().map(|d| d.to_string_lossy().into_owned())
    }) {
        Some(dir) => path.replace(EXEC_DIR_MARK, &dir),
        None => path.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_when_no_env() {
        let p = resolve_path(None, "./?.lum", false);
        assert_eq!(p, "./?.lum");
    }

    #[test]
    fn test_env_wins_over_default() {
        let p = resolve_path(Some("/opt/?.lum".to_string()), "./?.lum", false);
        assert_eq!(p, "/opt/?.lum");
    }

    #[test]
    fn test_noenv_forces_default() {
        let p = resolve_path(Some("/opt/?.lum".to_string()), "./?.lum", true);
        assert_eq!(p, "./?.lum");
    }

    #[test]
    fn test_doubled_separator_splices_default() {
        let p = resolve_path(Some("/opt/?.lum;;/srv/?.lum".to_string()), "./?.lum", false);
        assert_eq!(p, "/opt/?.lum;./?.lum;/srv/?.lum");
    }

    #[test]
    fn test_noenv_set_but_empty_still_disables_env() {
        // SAFETY: no other test in this crate reads these variables
        unsafe {
            env::set_var(ENV_NOENV, "");
            env::set_var(ENV_PATH, "/opt/?.lum");
        }
        let cfg = PathConfig::from_env();
        unsafe {
            env::remove_var(ENV_NOENV);
            env::remove_var(ENV_PATH);
        }
        assert_eq!(cfg.source_path, substitute_exec_dir(&default_source_path()));
    }

    #[test]
    fn test_exec_dir_marker_expands() {
        let p = substitute_exec_dir("!/lum/?.lum");
        // current_exe is available under the test harness
        assert!(!p.contains(EXEC_DIR_MARK));
        assert!(p.ends_with("/lum/?.lum"));
    }

    #[test]
    fn test_config_string_shape() {
        let c = PathConfig::config_string();
        assert_eq!(c.lines().count(), 5);
        assert!(c.contains(';'));
        assert!(c.contains('?'));
    }
}
