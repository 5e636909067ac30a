//! RSCheck daemon binary
//!
//! Loads the configuration named on the command line, starts one runner
//! per configured check plus the status servers, and stays up until a
//! signal arrives or a supervised task dies.

#![allow(unused_crate_dependencies)]

use clap::Parser;
use daemon::{bootstrap, DaemonError};
use schema::{LogFormat, LoggingSpec};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rscheck")]
#[command(about = "Local health-probing daemon for load-balanced services")]
#[command(version)]
struct Cli {
    /// Path to the YAML configuration file
    config: PathBuf,
}

fn init_tracing(spec: &LoggingSpec) -> daemon::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&spec.level))
        .map_err(|e| {
            DaemonError::Core(rscheck_core::CoreError::ConfigurationError(format!(
                "logging.level: {}",
                e
            )))
        })?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match spec.format {
        LogFormat::Plain => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> daemon::Result<()> {
    let cli = Cli::parse();

    let cfg = rscheck_core::config::load_from_yaml_path(&cli.config)?;
    init_tracing(&cfg.logging)?;

    info!(
        "starting rscheck {} with config {}",
        env!("CARGO_PKG_VERSION"),
        cli.config.display()
    );
    bootstrap::run(cfg).await
}
