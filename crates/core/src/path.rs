//! Dotted field paths over the intermediate value tree.
//!
//! A path such as `soundtrack.composer` names the `composer` field of the
//! object stored under `soundtrack`. Paths are resolved against the
//! `serde_json::Value` produced by serialising a source or target object.

use serde_json::{Map, Value};

/// A parsed, non-empty dotted path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    raw: String,
    segments: Vec<String>,
}

impl FieldPath {
    /// Parse a dotted path. Returns `None` if the path or any segment is empty.
    pub fn parse(raw: &str) -> Option<Self> {
        let segments: Vec<String> = raw.split('.').map(str::to_string).collect();
        if segments.iter().any(|s| s.is_empty()) {
            return None;
        }
        Some(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn is_nested(&self) -> bool {
        self.segments.len() > 1
    }

    /// Resolve the path. Absent keys, `null` intermediates and non-object
    /// intermediates all resolve to `None`, as does a `null` leaf.
    pub fn lookup<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        let mut current = root;
        for segment in &self.segments {
            current = current.as_object()?.get(segment)?;
        }
        if current.is_null() {
            None
        } else {
            Some(current)
        }
    }

    /// Write `value` at the path, creating intermediate objects as needed.
    /// A non-object intermediate is replaced by an object.
    pub fn insert(&self, root: &mut Map<String, Value>, value: Value) {
        let (last, parents) = match self.segments.split_last() {
            Some(split) => split,
            None => return,
        };

        let mut current = root;
        for segment in parents {
            let slot = current
                .entry(segment.clone())
                .or_insert_with(|| Value::Object(Map::new()));
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            current = match slot.as_object_mut() {
                Some(map) => map,
                None => return,
            };
        }
        current.insert(last.clone(), value);
    }
}

impl std::fmt::Display for FieldPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}
