// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Interchange value between the engine and the module subsystem
//!
//! The module cache stores whatever a loader produced. The engine's real
//! value representation stays on the engine side of the [`ScriptHost`]
//! seam; values that have no meaningful projection into this enum travel
//! as [`Value::External`].
//!
//! [`ScriptHost`]: crate::host::ScriptHost

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A module result value
///
/// "No value" is modeled as `Option::<Value>::None` at the loader
/// boundary, not as a variant here; the module cache never stores an
/// absent value.
#[derive(Clone)]
pub enum Value {
    /// Boolean; `Boolean(true)` is also the "loaded, exports nothing" sentinel
    Boolean(bool),
    /// Integer
    Integer(i64),
    /// Float
    Number(f64),
    /// String
    Text(String),
    /// String-keyed table, the usual shape of a module's export surface
    Table(HashMap<String, Value>),
    /// Opaque engine-owned value
    External(Arc<dyn Any + Send + Sync>),
}

impl Value {
    /// Truthiness as scripts see it: only `Boolean(false)` is falsy
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Boolean(false))
    }

    /// Convenience constructor for the export-table shape
    pub fn table(entries: impl IntoIterator<Item = (String, Value)>) -> Self {
        Value::Table(entries.into_iter().collect())
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Boolean(b) => write!(f, "Boolean({b})"),
            Value::Integer(n) => write!(f, "Integer({n})"),
            Value::Number(n) => write!(f, "Number({n})"),
            Value::Text(s) => write!(f, "Text({s:?})"),
            Value::Table(t) => f.debug_tuple("Table").field(t).finish(),
            Value::External(_) => f.write_str("External(..)"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Table(a), Value::Table(b)) => a == b,
            (Value::External(a), Value::External(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truthiness() {
        assert!(Value::Boolean(true).is_truthy());
        assert!(!Value::Boolean(false).is_truthy());
        assert!(Value::Integer(0).is_truthy());
        assert!(Value::Text(String::new()).is_truthy());
    }

    #[test]
    fn test_external_identity() {
        let a: Arc<dyn Any + Send + Sync> = Arc::new(7u32);
        let v1 = Value::External(Arc::clone(&a));
        let v2 = Value::External(a);
        let v3 = Value::External(Arc::new(7u32));
        assert_eq!(v1, v2);
        assert_ne!(v1, v3);
    }
}
