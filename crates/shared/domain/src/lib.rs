//! # Domain Models
//!
//! Pure types shared by the registry, the kernel and generated manifests.
//! Keep it lean: no I/O, no locking, no logging. Just variables and the errors they produce.
//!
//! ```rust
//! use fkit_domain::variables::{JsonVariables, NullVariables, Variables};
//! use serde_json::json;
//!
//! let vars = JsonVariables::from_value(json!({ "punctuation-enabled": true })).unwrap();
//! assert_eq!(vars.get_bool("punctuation-enabled"), Some(true));
//! assert_eq!(NullVariables.get_bool("punctuation-enabled"), None);
//! ```

pub mod config;
pub mod error;
pub mod variables;

pub use error::{VariablesError, VariablesErrorExt};
pub use variables::{FromVariables, JsonVariables, NullVariables, Variables, deserialize};
