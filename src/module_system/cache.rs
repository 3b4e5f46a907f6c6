// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module cache for require()
//!
//! One entry per module name for the runtime's lifetime; entries are
//! never evicted. A module that deliberately exported nothing is held
//! as the `true` sentinel so later requires still short-circuit.

use dashmap::DashMap;

use crate::value::Value;

/// Thread-safe module cache
pub struct ModuleCache {
    /// Cache mapping module names to their produced values
    cache: DashMap<String, Value>,
}

impl ModuleCache {
    /// Create a new empty cache
    pub fn new() -> Self {
        Self {
            cache: DashMap::new(),
        }
    }

    /// Get a cached module value by name
    pub fn get(&self, name: &str) -> Option<Value> {
        self.cache.get(name).map(|entry| entry.clone())
    }

    /// Check if a module is cached
    pub fn has(&self, name: &str) -> bool {
        self.cache.contains_key(name)
    }

    /// Store a module's value
    pub fn set(&self, name: impl Into<String>, value: Value) {
        self.cache.insert(name.into(), value);
    }

    /// Store the "loaded, exports nothing" sentinel
    pub fn set_loaded_sentinel(&self, name: impl Into<String>) {
        self.cache.insert(name.into(), Value::Boolean(true));
    }

    /// Get all cached module names
    pub fn keys(&self) -> Vec<String> {
        self.cache.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Get the number of cached modules
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

impl Default for ModuleCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let cache = ModuleCache::new();
        cache.set("json", Value::Integer(1));
        assert_eq!(cache.get("json"), Some(Value::Integer(1)));
        assert!(cache.has("json"));
        assert!(!cache.has("xml"));
    }

    #[test]
    fn test_sentinel_is_truthy() {
        let cache = ModuleCache::new();
        cache.set_loaded_sentinel("empty");
        assert!(cache.get("empty").unwrap().is_truthy());
    }
}
