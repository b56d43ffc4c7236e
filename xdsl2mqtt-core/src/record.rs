//! Data model for parsed modem metrics
//!
//! A [`MetricRecord`] is a partially populated, insertion-ordered mapping.
//! Keys whose source label was not found are absent, never `null` or zero,
//! so consumers must read a missing key as "unknown".

use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

/// A downstream/upstream value pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownUp<T> {
    /// Downstream value
    pub down: T,
    /// Upstream value
    pub up: T,
}

impl<T> DownUp<T> {
    /// Creates a pair from its downstream and upstream values
    pub const fn new(down: T, up: T) -> Self {
        Self { down, up }
    }
}

/// A single value held in a [`MetricRecord`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetricValue {
    /// Free text (status strings, opaque vendor codes, the banner)
    Text(String),
    /// Integer counter
    Integer(i64),
    /// Floating-point measurement
    Float(f64),
    /// Boolean flag
    Flag(bool),
    /// Integer down/up pair (rates, error counters)
    IntPair(DownUp<i64>),
    /// Floating-point down/up pair (SNR, attenuation, power)
    FloatPair(DownUp<f64>),
    /// Nested group of related values
    Group(MetricRecord),
}

/// Insertion-ordered mapping from metric key to value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricRecord {
    entries: Vec<(String, MetricValue)>,
}

impl MetricRecord {
    /// Creates an empty record
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Inserts a value, replacing any existing value under the same key
    /// while keeping its original position.
    pub fn insert(&mut self, key: impl Into<String>, value: MetricValue) {
        let key = key.into();
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            self.entries.push((key, value));
        }
    }

    /// Returns the value stored under `key`
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&MetricValue> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Returns whether `key` is present
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Returns the nested group stored under `key`, creating an empty one
    /// if it does not exist yet.
    ///
    /// A non-group value already stored under `key` is replaced.
    pub fn group_mut(&mut self, key: &str) -> &mut Self {
        let idx = match self.entries.iter().position(|(k, _)| k == key) {
            Some(idx) => {
                if !matches!(self.entries[idx].1, MetricValue::Group(_)) {
                    self.entries[idx].1 = MetricValue::Group(Self::new());
                }
                idx
            }
            None => {
                self.entries
                    .push((key.to_string(), MetricValue::Group(Self::new())));
                self.entries.len() - 1
            }
        };
        match &mut self.entries[idx].1 {
            MetricValue::Group(group) => group,
            _ => unreachable!("slot was just set to a group"),
        }
    }

    /// Returns the nested group stored under `key`, if any
    #[must_use]
    pub fn group(&self, key: &str) -> Option<&Self> {
        match self.get(key) {
            Some(MetricValue::Group(group)) => Some(group),
            _ => None,
        }
    }

    /// Returns the text stored under `key`, if any
    #[must_use]
    pub fn text(&self, key: &str) -> Option<&str> {
        match self.get(key) {
            Some(MetricValue::Text(s)) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer pair stored under `key` (e.g. `max_rate`)
    #[must_use]
    pub fn int_pair(&self, key: &str) -> Option<DownUp<i64>> {
        match self.get(key) {
            Some(MetricValue::IntPair(pair)) => Some(*pair),
            _ => None,
        }
    }

    /// Number of top-level keys
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the record holds no keys at all
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `(key, value)` pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetricValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Serializes the record as a UTF-8 JSON object
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_vec(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

impl Serialize for MetricRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}
