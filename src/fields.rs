//! Ordered form field sets.
//!
//! Outbound payloads are rendered as HTML hidden fields and posted as
//! urlencoded bodies; the gateway tooling and our own tests diff them
//! textually, so iteration order must be deterministic: the canonical
//! default order of the flow, followed by caller pass-through keys in the
//! order they were supplied.

use serde::ser::{Serialize, SerializeMap, Serializer};

/// An insertion-ordered mapping from canonical field name to string value.
///
/// Built fresh per call and immutable once returned. Serializes as a map
/// that preserves insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSet {
    entries: Vec<(String, String)>,
}

impl FieldSet {
    /// Create an empty field set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a flow's canonical defaults against caller overrides.
    ///
    /// Every default key appears in the output, carrying the override value
    /// when the caller supplied that key (an explicit empty string counts
    /// as supplied) and the default otherwise. Override keys outside the
    /// default set are appended afterwards, in caller order.
    pub fn from_defaults(defaults: &[(&str, String)], overrides: &[(String, String)]) -> Self {
        let mut entries = Vec::with_capacity(defaults.len() + overrides.len());
        for (name, default_value) in defaults {
            let value = overrides
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, v)| v.clone())
                .unwrap_or_else(|| default_value.clone());
            entries.push((name.to_string(), value));
        }
        for (key, value) in overrides {
            if !defaults.iter().any(|(name, _)| name == key) {
                entries.push((key.clone(), value.clone()));
            }
        }
        Self { entries }
    }

    /// Append a field, keeping insertion order.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// Value of the first field with the given name, if present.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Iterate fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Borrow as name/value pairs, the shape `reqwest`'s `.form()` accepts.
    pub fn as_pairs(&self) -> &[(String, String)] {
        &self.entries
    }
}

impl Serialize for FieldSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl<'a> IntoIterator for &'a FieldSet {
    type Item = &'a (String, String);
    type IntoIter = std::slice::Iter<'a, (String, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
