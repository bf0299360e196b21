use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::names_match;
use crate::lenient::{self, FieldValue};

/// Read-only keyed model inputs (model parameters or model variables).
///
/// Accepts either a JSON object keyed by field name or the grid's entry list
/// of `{ "field_key": ..., "value": ... }`. Keys are matched trimmed and
/// case-insensitively; values that do not parse count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawLookup", into = "BTreeMap<String, FieldValue>")]
pub struct ModelLookup {
    values: BTreeMap<String, FieldValue>,
}

/// One row of the grid's entry list. A `null` or missing key reads as empty
/// and the entry is dropped.
#[derive(Deserialize)]
struct FieldEntry {
    #[serde(default, alias = "key", deserialize_with = "lenient::identifier")]
    field_key: String,
    #[serde(default)]
    value: FieldValue,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawLookup {
    Map(BTreeMap<String, FieldValue>),
    Entries(Vec<FieldEntry>),
    Absent(()),
}

impl From<RawLookup> for ModelLookup {
    fn from(raw: RawLookup) -> Self {
        match raw {
            RawLookup::Map(values) => ModelLookup { values },
            RawLookup::Entries(entries) => entries
                .into_iter()
                .filter(|e| !e.field_key.trim().is_empty())
                .map(|e| (e.field_key, e.value))
                .collect(),
            RawLookup::Absent(()) => ModelLookup::default(),
        }
    }
}

impl From<ModelLookup> for BTreeMap<String, FieldValue> {
    fn from(lookup: ModelLookup) -> Self {
        lookup.values
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for ModelLookup {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut lookup = ModelLookup::default();
        for (k, v) in iter {
            lookup.insert(k, v);
        }
        lookup
    }
}

impl ModelLookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// First entry wins when the grid sends the same key twice.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) {
        self.values.entry(key.into()).or_insert(value.into());
    }

    /// Replace any entry whose key matches `key`, then store `value` under it.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) {
        let key = key.into();
        self.values.retain(|k, _| !names_match(k, &key));
        self.values.insert(key, value.into());
    }

    /// Parsed value for `key`, or `None` when missing or unparseable.
    pub fn get(&self, key: &str) -> Option<Decimal> {
        if let Some(v) = self.values.get(key) {
            return v.value();
        }
        self.values
            .iter()
            .find(|(k, _)| names_match(k, key))
            .and_then(|(_, v)| v.value())
    }

    pub fn get_or(&self, key: &str, default: Decimal) -> Decimal {
        self.get(key).unwrap_or(default)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
