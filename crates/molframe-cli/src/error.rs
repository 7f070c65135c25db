use molframe::core::io::samples::SampleIoError;
use molframe::core::table::TableLoadError;
use molframe::engine::error::EngineError;
use molframe::engine::sampler::client::ScoringError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse file '{path}': {source}", path = path.display())]
    FileParsing {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("Geometry table error: {0}")]
    Table(#[from] TableLoadError),

    #[error("Scoring service error: {0}")]
    Scoring(#[from] ScoringError),

    #[error("Failed to write samples: {0}")]
    SampleOutput(#[from] SampleIoError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
