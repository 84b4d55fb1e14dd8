#![allow(dead_code)]

use fkit_domain::{JsonVariables, Variables};
use fkit_registry::{Connection, ConnectionError, FeatureDescriptor, FeatureHolder, FeatureRegistry};
use parking_lot::Mutex;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// In-memory connection that records every call.
#[derive(Debug, Default)]
pub struct RecordingConnection {
    variables: Mutex<HashMap<String, JsonVariables>>,
    pub fetches: AtomicUsize,
    pub exposures: Mutex<Vec<(String, Option<String>)>>,
    pub malformed: Mutex<Vec<(String, String)>>,
    pub fail_with: Mutex<Option<String>>,
}

impl RecordingConnection {
    pub fn with(feature_id: &str, variables: Value) -> Arc<Self> {
        let connection = Self::default();
        connection.set(feature_id, variables);
        Arc::new(connection)
    }

    pub fn set(&self, feature_id: &str, variables: Value) {
        let variables = JsonVariables::from_value(variables).expect("test variables are objects");
        self.variables.lock().insert(feature_id.to_owned(), variables);
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl Connection for RecordingConnection {
    fn get_variables(&self, feature_id: &str) -> Result<Box<dyn Variables>, ConnectionError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = self.fail_with.lock().clone() {
            return Err(message.into());
        }
        let variables = self.variables.lock().get(feature_id).cloned().unwrap_or_default();
        Ok(Box::new(variables))
    }

    fn record_exposure(&self, feature_id: &str, experiment_slug: Option<&str>) {
        self.exposures.lock().push((feature_id.to_owned(), experiment_slug.map(str::to_owned)));
    }

    fn record_malformed_configuration(&self, feature_id: &str, part_id: &str) {
        self.malformed.lock().push((feature_id.to_owned(), part_id.to_owned()));
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsConfig {
    pub punctuation_enabled: bool,
}

pub fn settings_descriptor() -> FeatureDescriptor<SettingsConfig> {
    FeatureDescriptor::new("settings", |v: &dyn Variables| {
        Ok(SettingsConfig { punctuation_enabled: v.get_bool("punctuation-enabled").unwrap_or(false) })
    })
}

pub fn settings_registry() -> (FeatureRegistry, Arc<FeatureHolder<SettingsConfig>>) {
    let mut builder = FeatureRegistry::builder();
    let settings = builder.register(settings_descriptor()).expect("single registration");
    (builder.build(), settings)
}

pub fn punctuation(enabled: bool) -> Value {
    json!({ "punctuation-enabled": enabled })
}
