//! # Logger
//!
//! Installs the process-wide `tracing` subscriber for FeatureKit binaries.
//!
//! Library crates of the workspace only emit `trace!`/`debug!` diagnostics; whether they
//! show up is decided here. The filter starts from [`LoggerBuilder::level`], adds any
//! [`LoggerBuilder::directive`]s and is overridden by `RUST_LOG` when set.
//!
//! ```rust
//! # use fkit_logger::{LevelFilter, Logger};
//! let _logger = Logger::builder()
//!     .name("fkit-playground")
//!     .level(LevelFilter::INFO)
//!     .directive("fkit_registry=debug")
//!     .init()
//!     .unwrap();
//! ```

mod error;

pub use crate::error::{LoggerError, LoggerErrorExt};
pub use tracing::level_filters::LevelFilter;
pub use tracing_appender::rolling::Rotation;

use private::Sealed;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::RollingFileAppender;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::fmt::layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

const DEFAULT_MAX_FILES: usize = 7;
const LOG_FILE_SUFFIX: &str = "log";

#[derive(Debug)]
struct FileOutput {
    dir: PathBuf,
    rotation: Rotation,
    max_files: usize,
    json: bool,
}

#[derive(Debug)]
struct LoggerConfig {
    console: bool,
    verbose: bool,
    level: LevelFilter,
    directives: Vec<String>,
    file: Option<FileOutput>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self { console: true, verbose: false, level: LevelFilter::INFO, directives: Vec::new(), file: None }
    }
}

#[derive(Debug)]
pub struct NoName;
#[derive(Debug)]
pub struct WithName(String);

mod private {
    pub trait Sealed {}
}
impl Sealed for NoName {}
impl Sealed for WithName {}

/// Configures the global subscriber. A name is required before [`init`](LoggerBuilder::init)
/// becomes available.
#[derive(Debug)]
pub struct LoggerBuilder<N: Sealed = NoName> {
    config: LoggerConfig,
    name: N,
}

impl LoggerBuilder<NoName> {
    /// Names the application; also the prefix of rolling log files.
    pub fn name(self, name: impl Into<String>) -> LoggerBuilder<WithName> {
        LoggerBuilder { config: self.config, name: WithName(name.into()) }
    }
}

impl LoggerBuilder<WithName> {
    /// Default level for targets no directive mentions.
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub const fn level(mut self, level: LevelFilter) -> Self {
        self.config.level = level;
        self
    }

    /// Adds a filter directive such as `fkit_registry=trace`. May be called repeatedly.
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub fn directive(mut self, directive: impl Into<String>) -> Self {
        self.config.directives.push(directive.into());
        self
    }

    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub const fn console(mut self, enabled: bool) -> Self {
        self.config.console = enabled;
        self
    }

    /// Uses the full console format (with span context) instead of the compact one.
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub const fn verbose(mut self, enabled: bool) -> Self {
        self.config.verbose = enabled;
        self
    }

    /// Also writes logs to daily rolling files under `dir`.
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub fn log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.file = Some(FileOutput {
            dir: dir.into(),
            rotation: Rotation::DAILY,
            max_files: DEFAULT_MAX_FILES,
            json: false,
        });
        self
    }

    /// Rotation of the log files. Ignored without [`log_dir`](Self::log_dir).
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub fn rotation(mut self, rotation: Rotation) -> Self {
        if let Some(file) = self.config.file.as_mut() {
            file.rotation = rotation;
        }
        self
    }

    /// How many rotated files to keep. Ignored without [`log_dir`](Self::log_dir).
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub fn max_files(mut self, max: usize) -> Self {
        if let Some(file) = self.config.file.as_mut() {
            file.max_files = max;
        }
        self
    }

    /// Writes JSON lines to the log files. Ignored without [`log_dir`](Self::log_dir).
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub fn json(mut self) -> Self {
        if let Some(file) = self.config.file.as_mut() {
            file.json = true;
        }
        self
    }

    /// Installs the global subscriber.
    ///
    /// Keep the returned [`Logger`] alive for as long as file output should be flushed.
    ///
    /// # Errors
    ///
    /// - [`LoggerError::InvalidConfiguration`] for an empty name, zero `max_files` or no
    ///   output at all.
    /// - [`LoggerError::Directive`] for an unparsable directive.
    /// - [`LoggerError::Appender`] when the log directory cannot be used.
    /// - [`LoggerError::Subscriber`] when a global subscriber is already installed.
    pub fn init(self) -> Result<Logger, LoggerError> {
        validate_config(&self.config, &self.name.0)?;
        let env_filter = build_env_filter(&self.config)?;

        let mut layers = Vec::new();
        if self.config.console {
            let console = layer().with_ansi(true);
            layers.push(if self.config.verbose { console.boxed() } else { console.compact().boxed() });
        }

        let guard = match self.config.file {
            Some(file) => {
                let (writer, guard) = file_writer(&file, &self.name.0)?;
                let file_layer = layer().with_writer(writer).with_ansi(false);
                layers.push(if file.json { file_layer.json().boxed() } else { file_layer.boxed() });
                Some(guard)
            },
            None => None,
        };

        tracing_subscriber::registry().with(env_filter).with(layers).try_init()?;
        tracing::debug!(name = %self.name.0, "Logger initialized");

        Ok(Logger { name: self.name.0, guard })
    }
}

/// Handle to the installed subscriber. Dropping it flushes and stops the file writer.
#[must_use = "Dropping this handle will stop background logging threads."]
#[derive(Debug)]
pub struct Logger {
    name: String,
    guard: Option<WorkerGuard>,
}

impl Logger {
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder { config: LoggerConfig::default(), name: NoName }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether logs are also written to files.
    pub const fn writes_files(&self) -> bool {
        self.guard.is_some()
    }
}

fn validate_config(config: &LoggerConfig, name: &str) -> Result<(), LoggerError> {
    if name.trim().is_empty() {
        return Err(LoggerError::InvalidConfiguration {
            message: "Logger name cannot be empty".into(),
            context: None,
        });
    }
    if config.file.as_ref().is_some_and(|file| file.max_files == 0) {
        return Err(LoggerError::InvalidConfiguration {
            message: "max_files must be greater than zero".into(),
            context: None,
        });
    }
    if !config.console && config.file.is_none() {
        return Err(LoggerError::InvalidConfiguration {
            message: "No output enabled; enable the console or set a log directory".into(),
            context: None,
        });
    }
    Ok(())
}

fn build_env_filter(config: &LoggerConfig) -> Result<EnvFilter, LoggerError> {
    let mut filter = EnvFilter::builder().with_default_directive(config.level.into()).from_env_lossy();
    for directive in &config.directives {
        let parsed = directive.parse::<Directive>().context(format!("`{directive}`"))?;
        filter = filter.add_directive(parsed);
    }
    Ok(filter)
}

fn file_writer(
    file: &FileOutput,
    name: &str,
) -> Result<(tracing_appender::non_blocking::NonBlocking, WorkerGuard), LoggerError> {
    ensure_dir(&file.dir)?;
    let appender = RollingFileAppender::builder()
        .rotation(file.rotation.clone())
        .filename_prefix(name)
        .filename_suffix(LOG_FILE_SUFFIX)
        .max_log_files(file.max_files)
        .build(&file.dir)
        .context(file.dir.display().to_string())?;
    Ok(tracing_appender::non_blocking(appender))
}

fn ensure_dir(dir: &Path) -> Result<(), LoggerError> {
    fs::create_dir_all(dir).map_err(|e| LoggerError::Internal {
        message: e.to_string().into(),
        context: Some(format!("Failed to create log directory {}", dir.display()).into()),
    })
}
