use std::borrow::Cow;

/// Errors raised while building or querying a [`FeatureRegistry`](crate::FeatureRegistry).
#[fkit_derive::fkit_error]
pub enum RegistryError {
    /// Two descriptors share the same feature id.
    #[error("Duplicate feature{}: {message}", format_context(.context))]
    DuplicateFeature { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// No feature with the requested id is registered.
    #[error("Feature not found{}: {message}", format_context(.context))]
    UnknownFeature { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The feature exists but holds a different configuration type.
    #[error("Feature type mismatch{}: {message}", format_context(.context))]
    TypeMismatch { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}
