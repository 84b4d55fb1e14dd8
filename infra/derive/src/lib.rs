#![allow(unreachable_pub)]
#![allow(clippy::needless_pass_by_value)]

//! # Macros
//!
//! Procedural macros for the `FeatureKit` workspace.
//!
//! * [`fkit_error`] turns a plain enum into a `thiserror` error with context support.
//! * [`feature_manifest`] turns a struct that lists features into a typed registry wrapper.
//!
//! ## Usage
//! Application code should depend on the `fkit` facade, which re-exports
//! [`feature_manifest`]; the generated code refers to `::fkit::...` paths.
//!
//! See each macro's docstring for examples; they are `ignore`d to avoid compiling in this crate.

mod macros;

use proc_macro::TokenStream;
use syn::{DeriveInput, ItemStruct, parse_macro_input};

/// A high-level attribute macro for defining domain-specific error enums.
///
/// # Features
///
/// * **Automatic Derives**: Injects `#[derive(Debug, thiserror::Error)]`.
/// * **Context Support**: Generates a companion `...Ext` trait that adds `.context()`
///   to any `Result` that can be converted into this error type.
/// * **Context Accessor**: Generates an inherent `context_message()` returning the attached context.
/// * **Standard Conversions**: Implements `From<T>` for variants containing a `source` field,
///   enabling the use of the `?` operator for upstream errors.
/// * **Internal Fallback**: Provides `From<&'static str>` and `From<String>` if an `Internal`
///   variant is present.
///
/// # Requirements
///
/// 1. The macro must be applied to an **enum**.
/// 2. Variants that support context must include a `context: Option<Cow<'static, str>>` field.
/// 3. Variants wrapping upstream errors must include a `source: T` field (or a field marked with
///    `#[source]`/`#[from]`) and a context field, and no other fields.
/// 4. Tuple or unit variants are rejected to keep error wiring explicit.
///
/// Only one `#[fkit_error]` enum may live in a module, since the macro emits a module-level
/// `format_context` helper used by the `#[error(...)]` strings.
///
/// # Example
///
/// ```rust,ignore
/// use fkit_derive::fkit_error;
/// use std::borrow::Cow;
///
/// #[fkit_error]
/// pub enum LoadError {
///     #[error("IO error{}: {source}", format_context(.context))]
///     Io { source: std::io::Error, context: Option<Cow<'static, str>> },
///
///     #[error("Internal fault{}: {message}", format_context(.context))]
///     Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
/// }
///
/// fn read() -> Result<String, LoadError> {
///     std::fs::read_to_string("features.toml").context("Reading local variables")
/// }
/// ```
#[proc_macro_attribute]
pub fn fkit_error(_args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    macros::error::expand_derive(input).into()
}

/// Attribute macro that turns a struct listing features into a typed feature registry.
///
/// Every named field `name: Config` declares one feature whose typed configuration is `Config`.
///
/// # Arguments
///
/// * `serialize` - marks every descriptor `serializable()`, so `Feature::value_json` renders
///   values. Every `Config` must then implement `Serialize`.
/// * `crate = "::fkit"` - overrides the path generated code refers to.
///
/// # Field attributes
///
/// * `#[feature(name = "home-screen")]` - overrides the feature id (defaults to the field name).
/// * `#[feature(with = path::to::constructor)]` - uses a custom constructor
///   `fn(&dyn Variables) -> Result<Config, VariablesError>` instead of `Config::from_variables`.
///
/// Field doc comments are carried into the feature descriptor and onto the generated accessor.
///
/// # Generated items
///
/// * The struct itself, holding a `FeatureRegistry` and one holder per feature.
/// * `new()`, `Default`, `Debug` and `Deref<Target = FeatureRegistry>`, so `initialize` and
///   `invalidate_cached_values` are called directly on the manifest.
/// * One accessor method per feature returning `&FeatureHolder<Config>`.
///
/// # Errors
/// Emits a compile-time error for tuple/unit structs, generic structs, unknown field arguments
/// and duplicate feature ids. Fields named after a generated method or a `FeatureRegistry`
/// method (`new`, `registry`, `initialize`, `feature`, `len`, ...) are rejected; rename the
/// field and keep the id with `#[feature(name = "...")]`.
///
/// # Example
///
/// ```rust,ignore
/// use fkit::prelude::*;
///
/// #[fkit::feature_manifest]
/// pub struct AppFeatures {
///     /// Punctuation settings for the editor.
///     settings: SettingsConfig,
///     #[feature(name = "home-screen")]
///     homescreen: HomescreenConfig,
/// }
///
/// let features = AppFeatures::new();
/// features.initialize(move || Some(connection.clone()));
/// let settings = features.settings().value()?;
/// ```
#[proc_macro_attribute]
pub fn feature_manifest(args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemStruct);
    macros::manifest::expand_manifest(args.into(), input).into()
}
