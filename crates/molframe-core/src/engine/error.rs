use thiserror::Error;

use super::config::ConfigError;
use super::physics::PhysicsError;
use super::registry::RegistryError;
use super::sampler::client::ScoringError;
use super::scene::SceneError;
use crate::core::table::TableLoadError;
use crate::core::utils::geometry::GeometryError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid configuration: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("Failed to build molecule from geometry table: {source}")]
    Table {
        #[from]
        source: TableLoadError,
    },

    #[error("Physics world rejected an operation: {source}")]
    Physics {
        #[from]
        source: PhysicsError,
    },

    #[error("Scene graph rejected an operation: {source}")]
    Scene {
        #[from]
        source: SceneError,
    },

    #[error("Registry invariant violated: {source}")]
    Registry {
        #[from]
        source: RegistryError,
    },

    #[error("Degenerate geometry: {source}")]
    Geometry {
        #[from]
        source: GeometryError,
    },

    #[error("Energy scoring failed: {source}")]
    Scoring {
        #[from]
        source: ScoringError,
    },

    #[error("Atom with serial {serial} is not part of the simulation")]
    AtomNotFound { serial: usize },

    #[error("Internal logic error: {0}")]
    Internal(String),
}
