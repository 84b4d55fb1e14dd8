use std::borrow::Cow;

/// Errors raised while turning raw variables into a typed configuration value.
#[fkit_derive::fkit_error]
pub enum VariablesError {
    /// A required variable is absent.
    #[error("Missing variable{}: {key}", format_context(.context))]
    Missing { key: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// A variable is present but holds a different JSON type.
    #[error("Wrong variable type{}: `{key}` is not {expected}", format_context(.context))]
    WrongType {
        key: Cow<'static, str>,
        expected: &'static str,
        context: Option<Cow<'static, str>>,
    },

    /// A variable has the right type but an unacceptable value.
    #[error("Malformed variable{}: `{key}`: {message}", format_context(.context))]
    Malformed {
        key: Cow<'static, str>,
        message: Cow<'static, str>,
        context: Option<Cow<'static, str>>,
    },

    /// Serde-driven construction failed.
    #[error("Variables do not match the configuration shape{}: {source}", format_context(.context))]
    Deserialize { source: serde_json::Error, context: Option<Cow<'static, str>> },
}

impl VariablesError {
    #[must_use]
    pub fn missing(key: &str) -> Self {
        Self::Missing { key: key.to_owned().into(), context: None }
    }

    #[must_use]
    pub fn wrong_type(key: &str, expected: &'static str) -> Self {
        Self::WrongType { key: key.to_owned().into(), expected, context: None }
    }

    #[must_use]
    pub fn malformed(key: &str, message: impl Into<Cow<'static, str>>) -> Self {
        Self::Malformed { key: key.to_owned().into(), message: message.into(), context: None }
    }

    /// The variable this error is about, reported to the SDK as the malformed part.
    #[must_use]
    pub fn part_id(&self) -> Option<&str> {
        match self {
            Self::Missing { key, .. } | Self::WrongType { key, .. } | Self::Malformed { key, .. } => {
                Some(key)
            },
            Self::Deserialize { .. } => None,
        }
    }
}
