use crate::config::{ConfigError, ConfigLoader};
use fkit_domain::config::LocalVariables;
use fkit_domain::{JsonVariables, Variables};
use fkit_registry::{Connection, ConnectionError};
use fxhash::FxHashMap;
use parking_lot::{Mutex, RwLock};
use std::path::Path;
use tracing::{debug, trace};

/// An exposure event received by a [`StaticConnection`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exposure {
    pub feature_id: String,
    pub experiment_slug: Option<String>,
}

/// A malformed-configuration report received by a [`StaticConnection`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedReport {
    pub feature_id: String,
    pub part_id: String,
}

/// A [`Connection`] serving variables from memory.
///
/// Features without an entry get empty variables, so their holders fall back to defaults.
/// Exposure and malformed-configuration events are kept for inspection.
#[derive(Debug, Default)]
pub struct StaticConnection {
    variables: RwLock<FxHashMap<String, JsonVariables>>,
    exposures: Mutex<Vec<Exposure>>,
    malformed: Mutex<Vec<MalformedReport>>,
}

impl StaticConnection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_variables(variables: LocalVariables) -> Self {
        let connection = Self::new();
        connection.replace_all(variables);
        connection
    }

    /// Reads a `feature id -> variables` table from a TOML, JSON or YAML file, applying
    /// `FKIT__<FEATURE>__<KEY>` environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be loaded or is not a table of tables.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::load_with(ConfigLoader::new(path))
    }

    /// Like [`load`](Self::load) with a preconfigured loader.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be loaded or is not a table of tables.
    pub fn load_with(loader: ConfigLoader) -> Result<Self, ConfigError> {
        let variables: LocalVariables = loader.load()?;
        debug!(features = variables.len(), "Static variables loaded");
        Ok(Self::from_variables(variables))
    }

    /// Sets the variables of one feature, returning the previous ones.
    pub fn set_variables(
        &self,
        feature_id: impl Into<String>,
        variables: JsonVariables,
    ) -> Option<JsonVariables> {
        self.variables.write().insert(feature_id.into(), variables)
    }

    pub fn remove_variables(&self, feature_id: &str) -> Option<JsonVariables> {
        self.variables.write().remove(feature_id)
    }

    /// Replaces the whole table.
    pub fn replace_all(&self, variables: LocalVariables) {
        *self.variables.write() = variables.into_inner().into_iter().collect();
    }

    pub fn variables(&self, feature_id: &str) -> Option<JsonVariables> {
        self.variables.read().get(feature_id).cloned()
    }

    /// Feature ids with an entry, sorted.
    pub fn feature_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.variables.read().keys().cloned().collect();
        ids.sort_unstable();
        ids
    }

    pub fn exposures(&self) -> Vec<Exposure> {
        self.exposures.lock().clone()
    }

    pub fn malformed_reports(&self) -> Vec<MalformedReport> {
        self.malformed.lock().clone()
    }

    /// Forgets recorded exposures and reports.
    pub fn clear_events(&self) {
        self.exposures.lock().clear();
        self.malformed.lock().clear();
    }
}

impl Connection for StaticConnection {
    fn get_variables(&self, feature_id: &str) -> Result<Box<dyn Variables>, ConnectionError> {
        let variables = self.variables(feature_id).unwrap_or_default();
        trace!(feature = feature_id, keys = variables.len(), "Serving static variables");
        Ok(Box::new(variables))
    }

    fn record_exposure(&self, feature_id: &str, experiment_slug: Option<&str>) {
        self.exposures.lock().push(Exposure {
            feature_id: feature_id.to_owned(),
            experiment_slug: experiment_slug.map(str::to_owned),
        });
    }

    fn record_malformed_configuration(&self, feature_id: &str, part_id: &str) {
        debug!(feature = feature_id, part = part_id, "Malformed configuration reported");
        self.malformed
            .lock()
            .push(MalformedReport { feature_id: feature_id.to_owned(), part_id: part_id.to_owned() });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn vars(value: serde_json::Value) -> JsonVariables {
        JsonVariables::from_value(value).unwrap()
    }

    #[test]
    fn test_unknown_features_get_empty_variables() {
        let connection = StaticConnection::new();
        let variables = connection.get_variables("settings").unwrap();
        assert!(variables.keys().is_empty());
    }

    #[test]
    fn test_set_and_remove_variables() {
        let connection = StaticConnection::new();
        assert!(connection.set_variables("settings", vars(json!({ "a": 1 }))).is_none());

        let previous = connection.set_variables("settings", vars(json!({ "a": 2 })));
        assert_eq!(previous.and_then(|v| v.get_int("a")), Some(1));
        assert_eq!(connection.get_variables("settings").unwrap().get_int("a"), Some(2));

        connection.remove_variables("settings");
        assert!(connection.feature_ids().is_empty());
    }

    #[test]
    fn test_replace_all_drops_previous_entries() {
        let connection = StaticConnection::new();
        connection.set_variables("old", JsonVariables::empty());

        connection.replace_all(
            [("b".to_owned(), JsonVariables::empty()), ("a".to_owned(), JsonVariables::empty())]
                .into_iter()
                .collect(),
        );

        assert_eq!(connection.feature_ids(), ["a", "b"]);
    }

    #[test]
    fn test_events_are_recorded_in_order() {
        let connection = StaticConnection::new();
        connection.record_exposure("settings", None);
        connection.record_exposure("settings", Some("rollout"));
        connection.record_malformed_configuration("settings", "punctuation-enabled");

        assert_eq!(connection.exposures().len(), 2);
        assert_eq!(connection.exposures()[1].experiment_slug.as_deref(), Some("rollout"));
        assert_eq!(
            connection.malformed_reports(),
            [MalformedReport { feature_id: "settings".into(), part_id: "punctuation-enabled".into() }]
        );

        connection.clear_events();
        assert!(connection.exposures().is_empty());
        assert!(connection.malformed_reports().is_empty());
    }
}
