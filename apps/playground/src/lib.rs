//! # FeatureKit Playground
//!
//! Drives the demo manifest through the full lifecycle against a variables file:
//! defaults without a connection, `initialize` (values stay cached), then
//! `invalidate_cached_values` (values are rebuilt from the file).
//!
//! ## Example
//! ```no_run
//! use fkit_playground::Playground;
//!
//! fn main() -> anyhow::Result<()> {
//!     let report = Playground::builder().variables("variables.toml").build()?.run()?;
//!     assert_eq!(report.phases.len(), 3);
//!     Ok(())
//! }
//! ```

pub mod args;
pub mod features;

use crate::features::DemoFeatures;
use anyhow::{Context, Result, bail};
use fkit::kernel::config::ConfigLoader;
use fkit::kernel::connection::{MalformedReport, StaticConnection};
use fkit::registry::{Connection, Feature};
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// A fluent builder for configuring the [`Playground`].
#[must_use = "builders do nothing unless you call .build()"]
#[derive(Debug, Default)]
pub struct PlaygroundBuilder {
    variables: Option<PathBuf>,
    features: Vec<String>,
    loader: Option<ConfigLoader>,
}

impl PlaygroundBuilder {
    pub fn variables(mut self, path: impl Into<PathBuf>) -> Self {
        self.variables = Some(path.into());
        self
    }

    /// Restricts the report to `feature_id`. May be called repeatedly.
    pub fn feature(mut self, feature_id: impl Into<String>) -> Self {
        self.features.push(feature_id.into());
        self
    }

    pub fn features(mut self, feature_ids: impl IntoIterator<Item = String>) -> Self {
        self.features.extend(feature_ids);
        self
    }

    /// Uses a preconfigured loader instead of reading `FKIT__*` from the process environment.
    pub fn loader(mut self, loader: ConfigLoader) -> Self {
        self.loader = Some(loader);
        self
    }

    /// # Errors
    ///
    /// Fails when no variables file was given or a selected feature is not in the manifest.
    pub fn build(self) -> Result<Playground> {
        let loader = match (self.loader, self.variables) {
            (Some(loader), _) => loader,
            (None, Some(path)) => ConfigLoader::new(path),
            (None, None) => bail!("A variables file is required"),
        };

        let features = DemoFeatures::new();
        let selected = if self.features.is_empty() {
            features.feature_ids().map(str::to_owned).collect()
        } else {
            self.features
        };
        if let Some(unknown) = selected.iter().find(|id| !features.contains(id)) {
            let known = features.feature_ids().collect::<Vec<_>>().join(", ");
            bail!("Unknown feature `{unknown}`; known features: {known}");
        }

        Ok(Playground { features, loader, selected })
    }
}

/// The value (or error) of one feature at one point of the lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub feature: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Phase {
    pub name: &'static str,
    pub snapshots: Vec<Snapshot>,
}

impl Phase {
    pub fn snapshot(&self, feature_id: &str) -> Option<&Snapshot> {
        self.snapshots.iter().find(|snapshot| snapshot.feature == feature_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub phases: Vec<Phase>,
    pub exposures: usize,
    #[serde(serialize_with = "serialize_reports")]
    pub malformed: Vec<MalformedReport>,
}

impl Report {
    pub fn phase(&self, name: &str) -> Option<&Phase> {
        self.phases.iter().find(|phase| phase.name == name)
    }
}

fn serialize_reports<S: serde::Serializer>(
    reports: &[MalformedReport],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(reports.iter().map(|report| format!("{}/{}", report.feature_id, report.part_id)))
}

#[derive(Debug)]
pub struct Playground {
    features: DemoFeatures,
    loader: ConfigLoader,
    selected: Vec<String>,
}

impl Playground {
    pub fn builder() -> PlaygroundBuilder {
        PlaygroundBuilder::default()
    }

    pub const fn features(&self) -> &DemoFeatures {
        &self.features
    }

    /// Runs the lifecycle once.
    ///
    /// # Errors
    ///
    /// Fails when the variables file cannot be loaded. Per-feature construction errors are
    /// part of the report instead.
    pub fn run(self) -> Result<Report> {
        let mut phases = Vec::with_capacity(3);
        phases.push(self.phase("defaults"));

        let connection = Arc::new(
            StaticConnection::load_with(self.loader.clone()).context("Failed to load variables")?,
        );
        info!(features = ?connection.feature_ids(), "Variables loaded");

        let shared = Arc::clone(&connection);
        self.features.initialize(move || Some(Arc::clone(&shared) as Arc<dyn Connection>));
        phases.push(self.phase("initialized"));

        self.features.invalidate_cached_values();
        let refreshed = self.phase("refreshed");
        for snapshot in refreshed.snapshots.iter().filter(|snapshot| snapshot.error.is_none()) {
            if let Some(feature) = self.features.feature(&snapshot.feature) {
                feature.record_exposure()?;
            }
        }
        phases.push(refreshed);

        Ok(Report { phases, exposures: connection.exposures().len(), malformed: connection.malformed_reports() })
    }

    fn phase(&self, name: &'static str) -> Phase {
        let snapshots = self
            .features
            .features()
            .filter(|feature| self.selected.iter().any(|id| id == feature.feature_id()))
            .map(|feature| {
                let feature_id = feature.feature_id();
                match value_of(&**feature) {
                    Ok(value) => {
                        info!(phase = name, feature = feature_id, %value, "Feature value");
                        Snapshot { feature: feature_id.to_owned(), value: Some(value), error: None }
                    },
                    Err(err) => {
                        warn!(phase = name, feature = feature_id, error = %err, "Feature unavailable");
                        Snapshot { feature: feature_id.to_owned(), value: None, error: Some(err.to_string()) }
                    },
                }
            })
            .collect();
        Phase { name, snapshots }
    }
}

fn value_of(feature: &dyn Feature) -> Result<Value> {
    let value = feature
        .value_json()
        .with_context(|| format!("Feature `{}` is not serializable", feature.feature_id()))??;
    Ok(value)
}
