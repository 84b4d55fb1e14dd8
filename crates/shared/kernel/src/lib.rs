//! Kernel utilities shared by applications embedding FeatureKit.
//! Keep this crate lightweight: layered config loading and a `Connection` backed by plain data.
//!
//! ```rust,no_run
//! use fkit_kernel::connection::StaticConnection;
//!
//! let connection = StaticConnection::load("variables.toml").unwrap();
//! assert!(connection.feature_ids().iter().any(|id| id == "settings"));
//! ```

pub mod config;
pub mod connection;

pub use fkit_domain as domain;
