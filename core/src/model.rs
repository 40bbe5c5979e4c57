//! JSON mapping for records whose fields may or may not be present.
//!
//! # Design
//! Every field of a model is an `Option`; `Some` means the field was set,
//! whatever its value. Serialization emits exactly the set fields.
//! Deserialization is tolerant at two levels:
//! - a field whose JSON value has the wrong type is left unset, its siblings
//!   are unaffected (see [`lenient`]);
//! - input that is not a JSON object at all produces the default record.
//!
//! Some servers built against older generated clients never saw empty
//! strings, because those clients dropped them. [`EmptyPolicy::Suppress`]
//! reproduces that for callers that need it.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

/// What to do with present-but-empty values when serializing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EmptyPolicy {
    /// Emit every present field, empty or not.
    #[default]
    Emit,
    /// Drop empty strings, empty arrays and empty objects.
    Suppress,
}

/// A record mapped to and from a JSON object.
pub trait Model: Serialize + DeserializeOwned + Default {
    /// True if at least one field is present.
    fn is_set(&self) -> bool;

    fn from_json(json: &str) -> Self {
        match serde_json::from_str::<Value>(json) {
            Ok(value) => Self::from_json_value(value),
            Err(e) => {
                debug!(error = %e, "malformed JSON, using default record");
                Self::default()
            }
        }
    }

    fn from_json_slice(json: &[u8]) -> Self {
        match serde_json::from_slice::<Value>(json) {
            Ok(value) => Self::from_json_value(value),
            Err(e) => {
                debug!(error = %e, "malformed JSON, using default record");
                Self::default()
            }
        }
    }

    fn from_json_value(value: Value) -> Self {
        if !value.is_object() {
            debug!("expected a JSON object, using default record");
            return Self::default();
        }
        serde_json::from_value(value).unwrap_or_else(|e| {
            debug!(error = %e, "record did not map, using default record");
            Self::default()
        })
    }

    fn as_json_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| Value::Object(Map::new()))
    }

    fn as_json_value_with(&self, policy: EmptyPolicy) -> Value {
        let mut value = self.as_json_value();
        if policy == EmptyPolicy::Suppress {
            strip_empty(&mut value);
        }
        value
    }

    fn as_json(&self) -> String {
        self.as_json_value().to_string()
    }
}

/// Map a JSON array of objects; anything else yields an empty list.
pub fn models_from_json_value<T: Model>(value: Value) -> Vec<T> {
    match value {
        Value::Array(items) => items.into_iter().map(T::from_json_value).collect(),
        other => {
            debug!(kind = json_kind(&other), "expected a JSON array, using empty list");
            Vec::new()
        }
    }
}

pub fn models_from_json_slice<T: Model>(json: &[u8]) -> Vec<T> {
    match serde_json::from_slice::<Value>(json) {
        Ok(value) => models_from_json_value(value),
        Err(e) => {
            debug!(error = %e, "malformed JSON, using empty list");
            Vec::new()
        }
    }
}

pub fn models_as_json_value<T: Model>(models: &[T]) -> Value {
    Value::Array(models.iter().map(Model::as_json_value).collect())
}

/// Removes members whose value is `""`, `[]` or `{}`, innermost first.
fn strip_empty(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for member in map.values_mut() {
                strip_empty(member);
            }
            map.retain(|_, member| !is_empty(member));
        }
        Value::Array(items) => items.iter_mut().for_each(strip_empty),
        _ => {}
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Field-level deserializer: a value of the wrong type becomes `None`.
///
/// Use together with `#[serde(default)]` so missing keys are `None` too.
pub mod lenient {
    use serde::de::DeserializeOwned;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        let value = Value::deserialize(deserializer)?;
        if value.is_null() {
            return Ok(None);
        }
        Ok(T::deserialize(value).ok())
    }
}
