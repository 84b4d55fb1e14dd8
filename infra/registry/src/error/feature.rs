use crate::connection::ConnectionError;
use fkit_domain::VariablesError;
use std::borrow::Cow;

/// Errors surfaced by [`FeatureHolder::value`](crate::FeatureHolder::value).
///
/// Construction and connection failures leave the holder empty, so the next call is a
/// fresh attempt.
#[fkit_derive::fkit_error]
pub enum FeatureError {
    /// The variables could not be turned into the typed configuration value.
    #[error("Feature construction failed{}: {source}", format_context(.context))]
    ConstructionFailed { source: VariablesError, context: Option<Cow<'static, str>> },

    /// The SDK accessor or the connection itself failed. The provider's error is kept as-is
    /// and can be downcast by the caller.
    #[error("SDK connection failed{}: {source}", format_context(.context))]
    Connection { source: ConnectionError, context: Option<Cow<'static, str>> },

    /// A constructed value could not be rendered as JSON.
    #[error("Feature serialization failed{}: {source}", format_context(.context))]
    Serialization { source: serde_json::Error, context: Option<Cow<'static, str>> },
}

impl FeatureError {
    /// The variables error behind a construction failure.
    #[must_use]
    pub const fn variables_error(&self) -> Option<&VariablesError> {
        match self {
            Self::ConstructionFailed { source, .. } => Some(source),
            Self::Connection { .. } | Self::Serialization { .. } => None,
        }
    }

    /// The provider error behind a connection failure.
    #[must_use]
    pub fn connection_error(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            Self::Connection { source, .. } => Some(source.as_ref()),
            Self::ConstructionFailed { .. } | Self::Serialization { .. } => None,
        }
    }
}
