//! Per-request context ("locals") threaded from route handlers into the renderer.
//!
//! # Design Decisions
//! - Stored as a request extension: one map per in-flight request, never shared
//! - JSON values so handlers and route manifests can attach arbitrary data
//! - Merging is last-writer-wins per key

use axum::http::Request;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Mutable mapping attached to a single request and read at render time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Locals(Map<String, Value>);

impl Locals {
    /// Create an empty set of locals.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, returning the previous one for that key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// Copy every entry of `other` into `self`, overwriting existing keys.
    pub fn merge(&mut self, other: Locals) {
        for (key, value) in other.0 {
            self.0.insert(key, value);
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for Locals {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Locals {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Access to the locals carried by a request.
pub trait LocalsExt {
    /// Locals attached to this request, if any handler wrote some.
    fn locals(&self) -> Option<&Locals>;

    /// Locals attached to this request, created empty on first access.
    fn locals_mut(&mut self) -> &mut Locals;

    /// Detach the locals from the request, leaving none behind.
    fn take_locals(&mut self) -> Locals;
}

impl<B> LocalsExt for Request<B> {
    fn locals(&self) -> Option<&Locals> {
        self.extensions().get::<Locals>()
    }

    fn locals_mut(&mut self) -> &mut Locals {
        self.extensions_mut().get_or_insert_default::<Locals>()
    }

    fn take_locals(&mut self) -> Locals {
        self.extensions_mut().remove::<Locals>().unwrap_or_default()
    }
}
