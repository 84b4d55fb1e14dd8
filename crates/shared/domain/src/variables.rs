//! Raw feature variables and the typed views over them.
//!
//! A [`Variables`] source is what the SDK hands back for one feature. Typed getters return `None`
//! both for absent keys and for values of the wrong JSON type; the `require_*` family turns those
//! two cases into distinct [`VariablesError`]s. JSON `null` is treated as absent.

use crate::error::{VariablesError, VariablesErrorExt};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt::Debug;

/// Read-only key/value configuration for one feature.
pub trait Variables: Debug + Send + Sync {
    /// The raw JSON value stored under `key`.
    fn get_value(&self, key: &str) -> Option<&Value>;

    /// All keys present in this source.
    fn keys(&self) -> Vec<&str>;

    /// A JSON object snapshot of every variable.
    fn to_json(&self) -> Map<String, Value>;

    fn contains_key(&self, key: &str) -> bool {
        self.get_value(key).is_some_and(|v| !v.is_null())
    }

    fn get_bool(&self, key: &str) -> Option<bool> {
        self.get_value(key).and_then(Value::as_bool)
    }

    fn get_int(&self, key: &str) -> Option<i64> {
        self.get_value(key).and_then(Value::as_i64)
    }

    fn get_float(&self, key: &str) -> Option<f64> {
        self.get_value(key).and_then(Value::as_f64)
    }

    fn get_string(&self, key: &str) -> Option<&str> {
        self.get_value(key).and_then(Value::as_str)
    }

    /// A nested variables object.
    fn get_variables(&self, key: &str) -> Option<JsonVariables> {
        self.get_value(key).and_then(as_variables)
    }

    fn get_bool_list(&self, key: &str) -> Option<Vec<bool>> {
        list(self.get_value(key)?, Value::as_bool)
    }

    fn get_int_list(&self, key: &str) -> Option<Vec<i64>> {
        list(self.get_value(key)?, Value::as_i64)
    }

    fn get_string_list(&self, key: &str) -> Option<Vec<String>> {
        list(self.get_value(key)?, |v| v.as_str().map(str::to_owned))
    }

    fn get_variables_list(&self, key: &str) -> Option<Vec<JsonVariables>> {
        list(self.get_value(key)?, as_variables)
    }

    fn get_bool_map(&self, key: &str) -> Option<BTreeMap<String, bool>> {
        map(self.get_value(key)?, Value::as_bool)
    }

    fn get_int_map(&self, key: &str) -> Option<BTreeMap<String, i64>> {
        map(self.get_value(key)?, Value::as_i64)
    }

    fn get_string_map(&self, key: &str) -> Option<BTreeMap<String, String>> {
        map(self.get_value(key)?, |v| v.as_str().map(str::to_owned))
    }

    fn get_variables_map(&self, key: &str) -> Option<BTreeMap<String, JsonVariables>> {
        map(self.get_value(key)?, as_variables)
    }

    /// # Errors
    /// [`VariablesError::Missing`] if absent, [`VariablesError::WrongType`] if not a boolean.
    fn require_bool(&self, key: &str) -> Result<bool, VariablesError> {
        require(self.get_value(key), key, "a boolean", Value::as_bool)
    }

    /// # Errors
    /// [`VariablesError::Missing`] if absent, [`VariablesError::WrongType`] if not an integer.
    fn require_int(&self, key: &str) -> Result<i64, VariablesError> {
        require(self.get_value(key), key, "an integer", Value::as_i64)
    }

    /// # Errors
    /// [`VariablesError::Missing`] if absent, [`VariablesError::WrongType`] if not a number.
    fn require_float(&self, key: &str) -> Result<f64, VariablesError> {
        require(self.get_value(key), key, "a number", Value::as_f64)
    }

    /// # Errors
    /// [`VariablesError::Missing`] if absent, [`VariablesError::WrongType`] if not a string.
    fn require_string(&self, key: &str) -> Result<&str, VariablesError> {
        require(self.get_value(key), key, "a string", Value::as_str)
    }

    /// # Errors
    /// [`VariablesError::Missing`] if absent, [`VariablesError::WrongType`] if not an object.
    fn require_variables(&self, key: &str) -> Result<JsonVariables, VariablesError> {
        require(self.get_value(key), key, "an object", as_variables)
    }
}

fn as_variables(value: &Value) -> Option<JsonVariables> {
    value.as_object().cloned().map(JsonVariables::new)
}

fn list<T>(value: &Value, item: impl Fn(&Value) -> Option<T>) -> Option<Vec<T>> {
    value.as_array()?.iter().map(item).collect()
}

fn map<T>(value: &Value, item: impl Fn(&Value) -> Option<T>) -> Option<BTreeMap<String, T>> {
    value.as_object()?.iter().map(|(k, v)| item(v).map(|v| (k.clone(), v))).collect()
}

fn require<'a, T>(
    value: Option<&'a Value>,
    key: &str,
    expected: &'static str,
    typed: impl FnOnce(&'a Value) -> Option<T>,
) -> Result<T, VariablesError> {
    let value = value.filter(|v| !v.is_null()).ok_or_else(|| VariablesError::missing(key))?;
    typed(value).ok_or_else(|| VariablesError::wrong_type(key, expected))
}

/// [`Variables`] backed by a JSON object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JsonVariables {
    inner: Map<String, Value>,
}

impl JsonVariables {
    #[must_use]
    pub const fn new(inner: Map<String, Value>) -> Self {
        Self { inner }
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Wraps a JSON value, which must be an object.
    ///
    /// # Errors
    /// Returns [`VariablesError::WrongType`] for any non-object value.
    pub fn from_value(value: Value) -> Result<Self, VariablesError> {
        match value {
            Value::Object(inner) => Ok(Self::new(inner)),
            _ => Err(VariablesError::wrong_type("$", "an object")),
        }
    }

    /// Sets `key`, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.inner.insert(key.into(), value.into())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    #[must_use]
    pub fn into_inner(self) -> Map<String, Value> {
        self.inner
    }
}

impl Variables for JsonVariables {
    fn get_value(&self, key: &str) -> Option<&Value> {
        self.inner.get(key)
    }

    fn keys(&self) -> Vec<&str> {
        self.inner.keys().map(String::as_str).collect()
    }

    fn to_json(&self) -> Map<String, Value> {
        self.inner.clone()
    }
}

impl From<Map<String, Value>> for JsonVariables {
    fn from(inner: Map<String, Value>) -> Self {
        Self::new(inner)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for JsonVariables {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// The empty variables source used when no SDK connection is available.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NullVariables;

impl Variables for NullVariables {
    fn get_value(&self, _key: &str) -> Option<&Value> {
        None
    }

    fn keys(&self) -> Vec<&str> {
        Vec::new()
    }

    fn to_json(&self) -> Map<String, Value> {
        Map::new()
    }
}

/// A typed configuration value buildable from raw variables.
///
/// Implementations must treat absent variables as "use the default", so that construction from
/// [`NullVariables`] succeeds.
pub trait FromVariables: Sized {
    /// # Errors
    /// Returns a [`VariablesError`] when present variables are malformed.
    fn from_variables(variables: &dyn Variables) -> Result<Self, VariablesError>;
}

impl FromVariables for JsonVariables {
    fn from_variables(variables: &dyn Variables) -> Result<Self, VariablesError> {
        Ok(Self::new(variables.to_json()))
    }
}

/// Builds `T` from variables through its `serde` representation.
///
/// Use `#[serde(default)]` on `T` so missing variables fall back to defaults.
///
/// # Errors
/// Returns [`VariablesError::Deserialize`] if the variables do not fit `T`.
pub fn deserialize<T: DeserializeOwned>(variables: &dyn Variables) -> Result<T, VariablesError> {
    serde_json::from_value(Value::Object(variables.to_json())).context(std::any::type_name::<T>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn vars(value: Value) -> JsonVariables {
        JsonVariables::from_value(value).unwrap()
    }

    #[test]
    fn test_typed_getters_ignore_wrong_types() {
        let v = vars(json!({ "flag": true, "count": 3, "ratio": 0.5, "name": "x" }));

        assert_eq!(v.get_bool("flag"), Some(true));
        assert_eq!(v.get_int("count"), Some(3));
        assert_eq!(v.get_float("ratio"), Some(0.5));
        assert_eq!(v.get_string("name"), Some("x"));

        assert_eq!(v.get_bool("count"), None);
        assert_eq!(v.get_int("name"), None);
        assert_eq!(v.get_string("flag"), None);
        assert_eq!(v.get_bool("absent"), None);
    }

    #[test]
    fn test_require_distinguishes_missing_from_wrong_type() {
        let v = vars(json!({ "flag": "yes", "empty": null }));

        let err = v.require_bool("flag").unwrap_err();
        assert!(matches!(err, VariablesError::WrongType { expected: "a boolean", .. }));
        assert_eq!(err.part_id(), Some("flag"));

        let err = v.require_bool("absent").unwrap_err();
        assert!(matches!(err, VariablesError::Missing { .. }));
        assert_eq!(err.part_id(), Some("absent"));

        assert!(matches!(v.require_int("empty"), Err(VariablesError::Missing { .. })));
        assert!(!v.contains_key("empty"));
    }

    #[test]
    fn test_lists_and_maps_reject_mixed_items() {
        let v = vars(json!({
            "ids": [1, 2, 3],
            "mixed": [1, "two"],
            "labels": { "a": "A", "b": "B" },
            "cards": [{ "id": 1 }, { "id": 2 }],
        }));

        assert_eq!(v.get_int_list("ids"), Some(vec![1, 2, 3]));
        assert_eq!(v.get_int_list("mixed"), None);
        assert_eq!(v.get_string_list("ids"), None);

        let labels = v.get_string_map("labels").unwrap();
        assert_eq!(labels.get("b").map(String::as_str), Some("B"));
        assert_eq!(v.get_bool_map("labels"), None);

        let cards = v.get_variables_list("cards").unwrap();
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[1].get_int("id"), Some(2));
    }

    #[test]
    fn test_nested_variables() {
        let v = vars(json!({ "section": { "enabled": true } }));
        let section = v.require_variables("section").unwrap();
        assert_eq!(section.get_bool("enabled"), Some(true));
        assert!(v.get_variables("absent").is_none());
    }

    #[test]
    fn test_from_value_rejects_non_objects() {
        assert!(JsonVariables::from_value(json!([1, 2])).is_err());
        assert!(JsonVariables::from_value(json!({})).unwrap().is_empty());
    }

    #[test]
    fn test_null_variables_is_empty() {
        assert!(NullVariables.keys().is_empty());
        assert!(NullVariables.to_json().is_empty());
        assert!(matches!(NullVariables.require_string("k"), Err(VariablesError::Missing { .. })));
    }

    #[derive(Debug, Default, PartialEq, Deserialize)]
    #[serde(default, rename_all = "kebab-case")]
    struct Settings {
        punctuation_enabled: bool,
        max_length: u32,
    }

    #[test]
    fn test_deserialize_uses_serde_defaults() {
        let settings: Settings = deserialize(&NullVariables).unwrap();
        assert_eq!(settings, Settings::default());

        let v = vars(json!({ "punctuation-enabled": true, "max-length": 12 }));
        let settings: Settings = deserialize(&v).unwrap();
        assert_eq!(settings, Settings { punctuation_enabled: true, max_length: 12 });
    }

    #[test]
    fn test_deserialize_reports_shape_mismatch() {
        let v = vars(json!({ "max-length": "long" }));
        let err = deserialize::<Settings>(&v).unwrap_err();
        assert!(matches!(err, VariablesError::Deserialize { .. }));
        assert!(err.part_id().is_none());
        assert!(err.context_message().is_some_and(|c| c.contains("Settings")));
    }

    #[test]
    fn test_collect_into_variables() {
        let v: JsonVariables = [("a", json!(1)), ("b", json!(true))].into_iter().collect();
        assert_eq!(v.len(), 2);
        let mut keys = v.keys();
        keys.sort_unstable();
        assert_eq!(keys, ["a", "b"]);
    }
}
