//! Facade crate for FeatureKit.
//! Re-exports the domain, registry and kernel crates plus the procedural macros.
//! Keep this crate thin: it composes other crates and is the path generated code refers to.
//!
//! ## Usage
//! Declare the application's features once with [`feature_manifest`], wire the SDK with
//! [`FeatureRegistry::initialize`](registry::FeatureRegistry::initialize) and read typed values
//! from the generated accessors.
//!
//! ```rust
//! use fkit::prelude::*;
//!
//! #[derive(Debug)]
//! pub struct SettingsConfig {
//!     pub punctuation_enabled: bool,
//! }
//!
//! impl FromVariables for SettingsConfig {
//!     fn from_variables(variables: &dyn Variables) -> Result<Self, VariablesError> {
//!         Ok(Self { punctuation_enabled: variables.get_bool("punctuation-enabled").unwrap_or(false) })
//!     }
//! }
//!
//! #[feature_manifest]
//! pub struct AppFeatures {
//!     /// Editor settings.
//!     settings: SettingsConfig,
//! }
//!
//! let features = AppFeatures::new();
//! assert!(!features.settings().value().unwrap().punctuation_enabled);
//! ```

pub use fkit_derive::{feature_manifest, fkit_error};
pub use fkit_domain as domain;
#[cfg(feature = "kernel")]
pub use fkit_kernel as kernel;
pub use fkit_registry as registry;

/// Everything an application usually needs in scope.
pub mod prelude {
    pub use fkit_derive::feature_manifest;
    pub use fkit_domain::{
        FromVariables, JsonVariables, NullVariables, Variables, VariablesError, VariablesErrorExt,
    };
    #[cfg(feature = "kernel")]
    pub use fkit_kernel::connection::StaticConnection;
    pub use fkit_registry::{
        Connection, ConnectionError, Feature, FeatureDescriptor, FeatureError, FeatureHolder,
        FeatureRegistry, HolderState, RegistryError,
    };
}

/// Version of the facade crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
