// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! End-to-end require() behavior against a scripted mock engine

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use lumen_modules::{
    EntryPoint, ModuleError, ModuleRuntime, PathConfig, Result, ScriptHost, Value,
};
use tempfile::TempDir;

/// What the mock engine does when a module's source executes
#[derive(Clone)]
enum Script {
    /// Produce this value
    Value(Value),
    /// Run fine, produce nothing
    Nothing,
    /// Require a dependency first, then produce this value
    RequireFirst(String, Value),
    /// On the first execution, re-require the module itself
    SelfAgain(Value),
    /// Fail with an engine-side error
    Fail(String),
}

/// Scripted engine: records executions, plays back `Script`s
#[derive(Default)]
struct MockHost {
    executed: Vec<(String, PathBuf)>,
    runs: HashMap<String, u32>,
    scripts: HashMap<String, Script>,
}

impl MockHost {
    fn script(mut self, name: &str, s: Script) -> Self {
        self.scripts.insert(name.to_string(), s);
        self
    }

    fn executions_of(&self, name: &str) -> usize {
        self.executed.iter().filter(|(n, _)| n == name).count()
    }
}

impl ScriptHost for MockHost {
    fn execute_source(
        &mut self,
        modules: &mut ModuleRuntime,
        name: &str,
        path: &Path,
        _text: &str,
    ) -> Result<Option<Value>> {
        self.executed.push((name.to_string(), path.to_path_buf()));
        let runs = {
            let r = self.runs.entry(name.to_string()).or_insert(0);
            *r += 1;
            *r
        };
        match self.scripts.get(name).cloned().unwrap_or(Script::Nothing) {
            Script::Value(v) => Ok(Some(v)),
            Script::Nothing => Ok(None),
            Script::RequireFirst(dep, v) => {
                modules.require(self, &dep)?;
                Ok(Some(v))
            }
            Script::SelfAgain(v) => {
                if runs == 1 {
                    modules.require(self, name)?;
                }
                Ok(Some(v))
            }
            Script::Fail(msg) => Err(ModuleError::host(msg)),
        }
    }

    fn invoke_entry(
        &mut self,
        _modules: &mut ModuleRuntime,
        name: &str,
        path: &Path,
        _entry: &EntryPoint,
    ) -> Result<Option<Value>> {
        self.executed.push((name.to_string(), path.to_path_buf()));
        Ok(Some(Value::Boolean(true)))
    }
}

fn touch(dir: &TempDir, rel: &str) {
    let p = dir.path().join(rel);
    if let Some(parent) = p.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(p, "-- lumen module").unwrap();
}

/// Runtime whose source path probes `dir` and whose native path probes
/// a separate (empty) directory, so diagnostics from the two are
/// distinguishable.
fn runtime_for(dir: &TempDir, native_dir: &TempDir) -> ModuleRuntime {
    let root = dir.path().display();
    let nroot = native_dir.path().display();
    ModuleRuntime::with_config(PathConfig::with_paths(
        format!("{root}/?.lum;{root}/?/init.lum"),
        format!("{nroot}/?.so"),
    ))
}

#[test]
fn test_require_loads_once_and_caches() {
    let dir = TempDir::new().unwrap();
    let native = TempDir::new().unwrap();
    touch(&dir, "foo.lum");

    let mut rt = runtime_for(&dir, &native);
    let marker: Arc<dyn std::any::Any + Send + Sync> = Arc::new(42u32);
    let mut host =
        MockHost::default().script("foo", Script::Value(Value::External(Arc::clone(&marker))));

    let first = rt.require(&mut host, "foo").unwrap();
    let second = rt.require(&mut host, "foo").unwrap();

    // identical cached value, no second loader run
    assert_eq!(first, second);
    assert_eq!(first, Value::External(marker));
    assert_eq!(host.executions_of("foo"), 1);
    assert_eq!(rt.stats().loader_invocations, 1);
    assert_eq!(rt.stats().cache_hits, 1);
}

#[test]
fn test_module_with_no_value_gets_true_sentinel() {
    let dir = TempDir::new().unwrap();
    let native = TempDir::new().unwrap();
    touch(&dir, "silent.lum");

    let mut rt = runtime_for(&dir, &native);
    let mut host = MockHost::default().script("silent", Script::Nothing);

    assert_eq!(rt.require(&mut host, "silent").unwrap(), Value::Boolean(true));
    assert_eq!(rt.require(&mut host, "silent").unwrap(), Value::Boolean(true));
    assert_eq!(host.executions_of("silent"), 1);
}

#[test]
fn test_init_file_found_after_failed_probe() {
    let dir = TempDir::new().unwrap();
    let native = TempDir::new().unwrap();
    touch(&dir, "foo/init.lum");

    let mut rt = runtime_for(&dir, &native);
    let mut host = MockHost::default();
    rt.require(&mut host, "foo").unwrap();

    let (_, path) = &host.executed[0];
    assert_eq!(path, &dir.path().join("foo/init.lum"));
}

#[test]
fn test_dotted_name_resolves_through_directories() {
    let dir = TempDir::new().unwrap();
    let native = TempDir::new().unwrap();
    touch(&dir, "net/socket.lum");

    let mut rt = runtime_for(&dir, &native);
    let mut host = MockHost::default();
    rt.require(&mut host, "net.socket").unwrap();

    let (_, path) = &host.executed[0];
    assert_eq!(path, &dir.path().join("net/socket.lum"));
}

#[test]
fn test_not_found_accumulates_every_searcher_line() {
    let dir = TempDir::new().unwrap();
    let native = TempDir::new().unwrap();

    let mut rt = runtime_for(&dir, &native);
    let mut host = MockHost::default();
    let err = rt.require(&mut host, "bar").unwrap_err();

    let msg = err.to_string();
    assert!(matches!(err, ModuleError::ModuleNotFound { .. }));
    // preload line, two source-path lines, one native-path line
    assert!(msg.contains("no entry preload['bar']"));
    assert!(msg.contains(&format!("{}/bar.lum", dir.path().display())));
    assert!(msg.contains(&format!("{}/bar/init.lum", dir.path().display())));
    assert!(msg.contains(&format!("{}/bar.so", native.path().display())));
}

#[test]
fn test_preload_shadows_search_paths() {
    let dir = TempDir::new().unwrap();
    let native = TempDir::new().unwrap();
    touch(&dir, "cfg.lum");

    let mut rt = runtime_for(&dir, &native);
    rt.preload("cfg", |_rt, _host, _name| {
        Ok(Some(Value::table([("level".to_string(), Value::Integer(7))])))
    });
    let mut host = MockHost::default().script("cfg", Script::Value(Value::Integer(999)));

    let exports = rt.require(&mut host, "cfg").unwrap();
    assert_eq!(
        exports,
        Value::table([("level".to_string(), Value::Integer(7))])
    );
    assert!(host.executed.is_empty());
    assert_eq!(rt.preloaded(), vec!["cfg".to_string()]);
}

#[test]
fn test_engine_failure_propagates_and_is_not_cached() {
    let dir = TempDir::new().unwrap();
    let native = TempDir::new().unwrap();
    touch(&dir, "flaky.lum");

    let mut rt = runtime_for(&dir, &native);
    let mut host =
        MockHost::default().script("flaky", Script::Fail("syntax error near eof".to_string()));

    let err = rt.require(&mut host, "flaky").unwrap_err();
    assert!(matches!(err, ModuleError::Host(_)));
    assert_eq!(err.to_string(), "syntax error near eof");
    assert!(!rt.loaded().has("flaky"));

    // the engine recovers; the same runtime loads the module cleanly
    host.scripts
        .insert("flaky".to_string(), Script::Value(Value::Integer(3)));
    assert_eq!(rt.require(&mut host, "flaky").unwrap(), Value::Integer(3));
}

#[test]
fn test_nested_require_loads_dependency() {
    let dir = TempDir::new().unwrap();
    let native = TempDir::new().unwrap();
    touch(&dir, "app.lum");
    touch(&dir, "dep.lum");

    let mut rt = runtime_for(&dir, &native);
    let mut host = MockHost::default()
        .script(
            "app",
            Script::RequireFirst("dep".to_string(), Value::Text("app".into())),
        )
        .script("dep", Script::Value(Value::Text("dep".into())));

    assert_eq!(rt.require(&mut host, "app").unwrap(), Value::Text("app".into()));
    assert_eq!(rt.loaded().get("dep"), Some(Value::Text("dep".into())));
    // app started executing before dep
    assert_eq!(host.executed[0].0, "app");
    assert_eq!(host.executed[1].0, "dep");
}

#[test]
fn test_reentrant_require_of_self_reruns_loader() {
    let dir = TempDir::new().unwrap();
    let native = TempDir::new().unwrap();
    touch(&dir, "cycle.lum");

    let mut rt = runtime_for(&dir, &native);
    let mut host =
        MockHost::default().script("cycle", Script::SelfAgain(Value::Text("done".into())));

    // no cycle detection: the in-flight load is re-run
    let value = rt.require(&mut host, "cycle").unwrap();
    assert_eq!(value, Value::Text("done".into()));
    assert_eq!(host.executions_of("cycle"), 2);
}

#[test]
fn test_failure_is_not_cached() {
    let dir = TempDir::new().unwrap();
    let native = TempDir::new().unwrap();

    let mut rt = runtime_for(&dir, &native);
    let mut host = MockHost::default().script("late", Script::Value(Value::Integer(5)));

    assert!(rt.require(&mut host, "late").is_err());

    // installing the file afterwards lets the same runtime succeed
    touch(&dir, "late.lum");
    assert_eq!(rt.require(&mut host, "late").unwrap(), Value::Integer(5));
}

#[test]
fn test_searchpath_reports_source_not_found() {
    let dir = TempDir::new().unwrap();
    let native = TempDir::new().unwrap();
    let rt = runtime_for(&dir, &native);

    let err = rt
        .searchpath("ghost", &format!("{}/?.lum", dir.path().display()), None, None)
        .unwrap_err();
    assert!(matches!(err, ModuleError::SourceNotFound { .. }));
    assert!(err.to_string().contains("no file"));
}

#[test]
fn test_searchpath_finds_first_readable() {
    let dir = TempDir::new().unwrap();
    let native = TempDir::new().unwrap();
    touch(&dir, "a/b.lum");
    let rt = runtime_for(&dir, &native);

    let found = rt
        .searchpath(
            "a.b",
            &format!("{0}/?.lum;{0}/?/init.lum", dir.path().display()),
            None,
            Some("/"),
        )
        .unwrap();
    assert_eq!(found, dir.path().join("a/b.lum"));
}

#[cfg(all(feature = "native-loading", any(unix, windows)))]
#[test]
fn test_loadlib_missing_library_fails_at_open() {
    use lumen_modules::LoadFailure;

    let mut rt = ModuleRuntime::with_config(PathConfig::with_paths("", ""));
    let err = rt
        .loadlib(Path::new("./no-such-library.so"), "lumen_open_x")
        .unwrap_err();
    assert_eq!(err.load_failure(), Some(LoadFailure::Open));
    assert_eq!(err.load_failure().unwrap().as_str(), "open");
}

#[test]
fn test_close_is_idempotent_with_no_handles() {
    let mut rt = ModuleRuntime::with_config(PathConfig::with_paths("", ""));
    rt.close();
    rt.close();
    assert!(rt.registry().is_empty());
    assert_eq!(rt.registry().opens(), 0);
}
