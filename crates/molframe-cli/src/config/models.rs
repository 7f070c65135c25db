use molframe::core::table::GeometryTable;
use molframe::engine::config::SimulationConfig;
use molframe::workflows::simulate::RunOptions;
use std::path::PathBuf;
use std::time::Duration;

/// Where and how to reach the scoring service.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringSettings {
    pub endpoint: String,
    pub timeout: Option<Duration>,
}

/// Fully resolved settings for the `run` command.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub core_config: SimulationConfig,
    pub run_options: RunOptions,
    /// `None` when sampling is disabled.
    pub scoring: Option<ScoringSettings>,
    pub output_path: Option<PathBuf>,
}

/// Fully resolved settings for the `score` command.
#[derive(Debug, Clone)]
pub struct ScoreConfig {
    pub table: GeometryTable,
    pub deduplicate_relations: bool,
    pub dihedral_serials: [usize; 4],
    pub scoring: ScoringSettings,
}
