//! Build state container.
//!
//! `State` accumulates facts produced by step runners while a build runs:
//! assigned partition device paths, the image file location, mount records.
//! Entries are only ever added or overwritten, never deleted, so anything a
//! step recorded is still visible to every later step and to the whole
//! teardown pass. The template expander reads it through [`State::snapshot`].
//!
//! There is no global state — the engine owns one `State` per build and
//! hands it to each handler call by reference.

use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Mutable key/value store written by step runners during a build
#[derive(Debug, Clone, Default)]
pub struct State {
    values: BTreeMap<String, Value>,
}

impl State {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or overwrite an entry.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Look up an entry as a string slice, if it is one.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(Value::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// True when the entry exists and is neither `false` nor `null`.
    pub fn is_truthy(&self, key: &str) -> bool {
        match self.values.get(key) {
            None | Some(Value::Null) => false,
            Some(Value::Bool(b)) => *b,
            Some(_) => true,
        }
    }

    /// Read snapshot for template expansion.
    pub fn snapshot(&self) -> Map<String, Value> {
        self.values
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
