use std::collections::HashMap;

use serde_json::Value as JsonValue;

use crate::error::TdsHelperError;
use crate::types::RowValues;

/// A caller-supplied value, or an explicit "undefined" marker.
///
/// An undefined slot still counts as present during merge (it stops the lookup and
/// satisfies `required`), but no value is assigned.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueSlot {
    Value(RowValues),
    Undefined,
}

/// Values keyed by whatever names the caller uses. Only read by merge.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueMap {
    entries: HashMap<String, ValueSlot>,
}

impl ValueMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<RowValues>) -> Self {
        self.insert(key, value);
        self
    }

    #[must_use]
    pub fn with_undefined(mut self, key: impl Into<String>) -> Self {
        self.insert_undefined(key);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<RowValues>) {
        self.entries
            .insert(key.into(), ValueSlot::Value(value.into()));
    }

    pub fn insert_undefined(&mut self, key: impl Into<String>) {
        self.entries.insert(key.into(), ValueSlot::Undefined);
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ValueSlot> {
        self.entries.get(key)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<RowValues>> FromIterator<(K, V)> for ValueMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = ValueMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl From<serde_json::Map<String, JsonValue>> for ValueMap {
    fn from(object: serde_json::Map<String, JsonValue>) -> Self {
        object.into_iter().collect()
    }
}

impl TryFrom<JsonValue> for ValueMap {
    type Error = TdsHelperError;

    /// JSON `null` members become `RowValues::Null`, not undefined.
    fn try_from(value: JsonValue) -> Result<Self, Self::Error> {
        match value {
            JsonValue::Object(object) => Ok(object.into()),
            other => Err(TdsHelperError::ParameterError(format!(
                "value map must be a JSON object, got {other}"
            ))),
        }
    }
}
