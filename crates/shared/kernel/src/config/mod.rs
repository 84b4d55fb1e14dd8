use config::{Config, Environment, File};
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Prefix of environment overrides, e.g. `FKIT__SETTINGS__PUNCTUATION_ENABLED`.
pub const ENV_PREFIX: &str = "FKIT";
const ENV_SEPARATOR: &str = "__";

/// Custom error type for config loading.
#[fkit_derive::fkit_error]
pub enum ConfigError {
    #[error("Config error{}: {source}", format_context(.context))]
    Config { source: config::ConfigError, context: Option<Cow<'static, str>> },
}

/// Layered loader: a required file, then environment overrides.
///
/// Environment keys are split on `__` and converted to kebab case, so
/// `FKIT__HOME_SCREEN__SECTION_COUNT=3` overrides `section-count` under `[home-screen]`.
/// Scalar values are parsed, so `false` and `3` arrive as a boolean and an integer.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    path: PathBuf,
    prefix: Cow<'static, str>,
    env: Option<config::Map<String, String>>,
}

impl ConfigLoader {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self { path: path.as_ref().to_path_buf(), prefix: Cow::Borrowed(ENV_PREFIX), env: None }
    }

    /// Overrides the environment prefix.
    #[must_use]
    pub fn prefix(mut self, prefix: impl Into<Cow<'static, str>>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Reads overrides from `vars` instead of the process environment.
    #[must_use]
    pub fn env_source(mut self, vars: config::Map<String, String>) -> Self {
        self.env = Some(vars);
        self
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::Config`] when the file is missing or unreadable, or when the
    /// merged result does not deserialize into `T`.
    pub fn load<T: DeserializeOwned>(self) -> Result<T, ConfigError> {
        debug!(path = %self.path.display(), prefix = %self.prefix, "Loading config");

        let environment = Environment::with_prefix(&self.prefix)
            .separator(ENV_SEPARATOR)
            .convert_case(config::Case::Kebab)
            .try_parsing(true)
            .source(self.env);

        Config::builder()
            .add_source(File::from(self.path.as_path()).required(true))
            .add_source(environment)
            .build()
            .context(format!("Failed to build config from {}", self.path.display()))?
            .try_deserialize::<T>()
            .context("Failed to deserialize config")
    }
}

/// Loads `path` with `FKIT__` environment overrides.
///
/// # Errors
///
/// See [`ConfigLoader::load`].
///
/// # Example
/// ```rust
/// use fkit_kernel::config::load_config;
///
/// #[derive(Default, serde::Deserialize)]
/// struct PlaygroundConfig {
///     level: String,
/// }
///
/// let cfg: PlaygroundConfig = load_config("config/playground.toml").unwrap_or_default();
/// ```
pub fn load_config<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, ConfigError> {
    ConfigLoader::new(path).load()
}
