//! # CLI Argument Definitions

use clap::Parser;
use fkit_logger::LevelFilter;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "fkit-playground")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Walks a feature manifest through defaults, initialize and invalidate")]
pub struct Args {
    /// Variables file (TOML, JSON or YAML) mapping feature ids to their variables
    #[arg(long, short = 'v')]
    pub variables: PathBuf,

    /// Only report these features (repeatable). All features by default
    #[arg(long = "feature", short = 'f', value_name = "ID")]
    pub features: Vec<String>,

    /// Minimum log level
    #[arg(long, short = 'l', default_value_t = LevelFilter::INFO)]
    pub level: LevelFilter,

    /// Also write rolling log files to this directory
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    /// Print the final report as JSON on stdout
    #[arg(long)]
    pub json: bool,
}
