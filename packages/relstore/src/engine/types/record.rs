use super::value::{FieldMap, Value};
use crate::error::{Result, StoreError};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use smol_str::SmolStr;

/// A single row: an ordered map from field name to value.
///
/// Records carry no schema of their own, only the field names matter when
/// matching and joining.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(FieldMap);

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field insertion.
    pub fn with(mut self, field: impl Into<SmolStr>, value: impl Into<Value>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    /// Build a record from a JSON object.
    pub fn from_json(value: JsonValue) -> Result<Self> {
        match Value::from(value) {
            Value::Object(map) => Ok(Record(map)),
            _ => Err(StoreError::NotAnObject),
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Set a field, returning the previous value.
    pub fn set(&mut self, field: impl Into<SmolStr>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(field.into(), value.into())
    }

    /// True if the field exists and holds `value`.
    #[inline]
    pub fn field_eq(&self, field: &str, value: &Value) -> bool {
        self.0.get(field).is_some_and(|v| v == value)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&SmolStr, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    pub fn to_json(&self) -> JsonValue {
        self.clone().into()
    }
}

impl From<FieldMap> for Record {
    fn from(map: FieldMap) -> Self {
        Record(map)
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        record.into_value()
    }
}

impl From<Record> for JsonValue {
    fn from(record: Record) -> Self {
        record.into_value().into()
    }
}

impl TryFrom<JsonValue> for Record {
    type Error = StoreError;

    fn try_from(value: JsonValue) -> Result<Self> {
        Record::from_json(value)
    }
}

impl<K: Into<SmolStr>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Record(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
