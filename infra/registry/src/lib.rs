//! # Feature Registry
//!
//! Lazily constructed, cached and invalidatable feature configuration.
//!
//! A [`FeatureRegistry`] owns one [`FeatureHolder`] per feature and a single
//! [`SdkAccessor`] shared by all of them. Holders build their typed value on first read
//! from the variables the current [`Connection`] reports (or from empty variables when
//! there is none) and keep it until invalidated.
//!
//! ```rust
//! use fkit_domain::{JsonVariables, Variables, VariablesError};
//! use fkit_registry::{Connection, ConnectionError, FeatureDescriptor, FeatureRegistry};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! #[derive(Debug)]
//! struct Remote;
//!
//! impl Connection for Remote {
//!     fn get_variables(&self, _feature_id: &str) -> Result<Box<dyn Variables>, ConnectionError> {
//!         Ok(Box::new(JsonVariables::from_value(json!({ "punctuation-enabled": true }))?))
//!     }
//! }
//!
//! let mut builder = FeatureRegistry::builder();
//! let settings = builder
//!     .register(FeatureDescriptor::new("settings", |v: &dyn Variables| {
//!         Ok::<_, VariablesError>(v.get_bool("punctuation-enabled").unwrap_or(false))
//!     }))
//!     .unwrap();
//! let registry = builder.build();
//!
//! assert!(!*settings.value().unwrap());
//!
//! registry.set_connection(Arc::new(Remote));
//! assert!(!*settings.value().unwrap());
//!
//! registry.invalidate_cached_values();
//! assert!(*settings.value().unwrap());
//! ```

mod accessor;
mod connection;
mod descriptor;
mod error;
mod holder;
mod registry;

pub use accessor::SdkAccessor;
pub use connection::{Connection, ConnectionError};
pub use descriptor::{Constructor, FeatureDescriptor, Renderer};
pub use error::{FeatureError, FeatureErrorExt, RegistryError, RegistryErrorExt};
pub use holder::{FeatureHolder, HolderState};
pub use registry::{Feature, FeatureRegistry, FeatureRegistryBuilder};
