use crate::error::{CliError, Result};
use std::fs::File;
use std::path::PathBuf;
use tracing_subscriber::{
    filter::{LevelFilter, Targets},
    fmt,
    prelude::*,
};

/// Module path prefix shared by the library and the binary.
const CRATE_TARGET: &str = "molframe";

fn verbosity_level(verbosity: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::OFF;
    }
    match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// Builds the per-target filter. Our own spans follow the verbosity flag,
/// while the HTTP stack (reqwest, hyper) stays at warnings until `-vvv`.
pub fn build_filter(verbosity: u8, quiet: bool) -> Targets {
    let level = verbosity_level(verbosity, quiet);
    let dependencies = if level == LevelFilter::TRACE {
        LevelFilter::TRACE
    } else {
        level.min(LevelFilter::WARN)
    };
    Targets::new()
        .with_default(dependencies)
        .with_target(CRATE_TARGET, level)
}

/// Installs the global subscriber: a compact stderr layer for humans, plus an
/// optional plain-text file layer carrying targets and thread ids.
pub fn setup_logging(verbosity: u8, quiet: bool, log_file: Option<PathBuf>) -> Result<()> {
    let filter = build_filter(verbosity, quiet);

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .compact();

    let file_layer = match log_file {
        Some(path) => {
            let file = File::create(&path).map_err(CliError::Io)?;
            Some(
                fmt::layer()
                    .with_writer(file)
                    .with_ansi(false)
                    .with_thread_ids(true)
                    .with_target(true),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    tracing::debug!(verbosity, "logging initialized");
    Ok(())
}
