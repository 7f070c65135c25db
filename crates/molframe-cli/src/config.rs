pub mod defaults;
pub mod models;

use crate::cli::{RunArgs, ScoreArgs};
use crate::error::{CliError, Result};
use defaults::DefaultsConfig;
use models::{AppConfig, ScoreConfig, ScoringSettings};
use molframe::core::table::GeometryTable;
use molframe::engine::config::{DEFAULT_DIHEDRAL_SERIALS, SimulationConfigBuilder};
use molframe::workflows::simulate::{Pacing, RunOptions};
use nalgebra::Vector3;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialSimulationSection {
    frames: Option<u64>,
    timestep: Option<f64>,
    #[serde(rename = "velocity-damping")]
    velocity_damping: Option<f64>,
    gravity: Option<[f64; 3]>,
    #[serde(rename = "solver-iterations")]
    solver_iterations: Option<usize>,
    #[serde(rename = "real-time")]
    real_time: Option<bool>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialSceneSection {
    ground: Option<bool>,
    #[serde(rename = "prop-cylinder")]
    prop_cylinder: Option<bool>,
    #[serde(rename = "atom-radius")]
    atom_radius: Option<f64>,
    #[serde(rename = "stick-radius")]
    stick_radius: Option<f64>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialMoleculeSection {
    table: Option<PathBuf>,
    deduplicate: Option<bool>,
    scale: Option<f64>,
    translation: Option<[f64; 3]>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialSamplerSection {
    enabled: Option<bool>,
    endpoint: Option<String>,
    #[serde(rename = "timeout-secs")]
    timeout_secs: Option<f64>,
    interval: Option<f64>,
    capacity: Option<usize>,
    dihedral: Option<[usize; 4]>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialAppConfig {
    simulation: Option<PartialSimulationSection>,
    scene: Option<PartialSceneSection>,
    molecule: Option<PartialMoleculeSection>,
    sampler: Option<PartialSamplerSection>,
    /// Directory of the config file; relative table paths resolve against it.
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

impl PartialAppConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        let mut partial: Self = toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })?;
        partial.base_dir = path.parent().map(Path::to_path_buf);
        Ok(partial)
    }

    /// Reads `path` when given, otherwise starts from an empty configuration.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn merge_with_cli(mut self, args: &RunArgs) -> Result<AppConfig> {
        self.apply_set_values(&args.set_values)?;
        let defaults = DefaultsConfig::default();

        let sim = self.simulation.take().unwrap_or_default();
        let scene = self.scene.take().unwrap_or_default();
        let molecule = self.molecule.take().unwrap_or_default();
        let sampler = self.sampler.take().unwrap_or_default();

        let table_path = args
            .table
            .clone()
            .or_else(|| self.resolve_relative(molecule.table.as_deref()));
        let table = load_table(table_path.as_deref())?;

        let deduplicate = if args.keep_duplicates {
            false
        } else {
            molecule.deduplicate.unwrap_or(true)
        };
        let prop_cylinder = args.with_cylinder || scene.prop_cylinder.unwrap_or(false);

        let mut builder = SimulationConfigBuilder::new()
            .table(table)
            .deduplicate_relations(deduplicate)
            .include_prop_cylinder(prop_cylinder);
        if let Some(timestep) = sim.timestep {
            builder = builder.timestep(timestep);
        }
        if let Some(damping) = sim.velocity_damping {
            builder = builder.velocity_damping(damping);
        }
        if let Some(gravity) = sim.gravity {
            builder = builder.gravity(Vector3::from(gravity));
        }
        if let Some(iterations) = sim.solver_iterations {
            builder = builder.solver_iterations(iterations);
        }
        if let Some(ground) = scene.ground {
            builder = builder.include_ground(ground);
        }
        if let Some(radius) = scene.atom_radius {
            builder = builder.atom_radius(radius);
        }
        if let Some(radius) = scene.stick_radius {
            builder = builder.stick_radius(radius);
        }
        if let Some(scale) = molecule.scale {
            builder = builder.placement_scale(scale);
        }
        if let Some(translation) = molecule.translation {
            builder = builder.placement_translation(Vector3::from(translation));
        }
        if let Some(interval) = sampler.interval {
            builder = builder.sample_interval(interval);
        }
        if let Some(capacity) = sampler.capacity {
            builder = builder.sample_capacity(capacity);
        }
        if let Some(serials) = sampler.dihedral {
            builder = builder.dihedral_serials(serials);
        }
        let core_config = builder
            .build()
            .map_err(|e| CliError::Config(e.to_string()))?;

        let real_time = args.real_time || sim.real_time.unwrap_or(defaults.real_time);
        let run_options = RunOptions {
            frames: args.frames.or(sim.frames).unwrap_or(defaults.frames),
            pacing: if real_time {
                Pacing::RealTime
            } else {
                Pacing::Fixed
            },
        };

        let sampling_enabled =
            !args.offline && sampler.enabled.unwrap_or(defaults.sampling_enabled);
        let scoring = if sampling_enabled {
            Some(resolve_scoring(
                args.endpoint.as_ref().or(sampler.endpoint.as_ref()),
                args.timeout.or(sampler.timeout_secs),
                &defaults,
            )?)
        } else {
            None
        };

        Ok(AppConfig {
            core_config,
            run_options,
            scoring,
            output_path: args.output.clone(),
        })
    }

    pub fn merge_for_score(mut self, args: &ScoreArgs) -> Result<ScoreConfig> {
        let defaults = DefaultsConfig::default();
        let molecule = self.molecule.take().unwrap_or_default();
        let sampler = self.sampler.take().unwrap_or_default();

        let table_path = args
            .table
            .clone()
            .or_else(|| self.resolve_relative(molecule.table.as_deref()));
        let table = load_table(table_path.as_deref())?;

        let dihedral_serials = sampler.dihedral.unwrap_or(DEFAULT_DIHEDRAL_SERIALS);
        if let Some(&serial) = dihedral_serials
            .iter()
            .find(|&&s| s == 0 || s > table.atoms.len())
        {
            return Err(CliError::Config(format!(
                "Dihedral serial {} is outside the table's {} atoms.",
                serial,
                table.atoms.len()
            )));
        }

        Ok(ScoreConfig {
            table,
            deduplicate_relations: molecule.deduplicate.unwrap_or(true),
            dihedral_serials,
            scoring: resolve_scoring(
                args.endpoint.as_ref().or(sampler.endpoint.as_ref()),
                args.timeout.or(sampler.timeout_secs),
                &defaults,
            )?,
        })
    }

    fn resolve_relative(&self, path: Option<&Path>) -> Option<PathBuf> {
        let path = path?;
        match &self.base_dir {
            Some(base) if path.is_relative() => Some(base.join(path)),
            _ => Some(path.to_path_buf()),
        }
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        if set_values.is_empty() {
            return Ok(());
        }
        for kv_pair in set_values {
            let parts: Vec<_> = kv_pair.splitn(2, '=').collect();
            if parts.len() != 2 {
                return Err(CliError::Config(format!(
                    "Invalid --set format: '{}'. Expected KEY=VALUE.",
                    kv_pair
                )));
            }
            let key = parts[0];
            let value_str = parts[1];

            match key {
                "simulation.frames" => {
                    self.simulation.get_or_insert_with(Default::default).frames =
                        Some(parse_set_value(key, value_str, "integer")?);
                }
                "simulation.timestep" => {
                    self.simulation.get_or_insert_with(Default::default).timestep =
                        Some(parse_set_value(key, value_str, "float")?);
                }
                "simulation.velocity-damping" => {
                    self.simulation
                        .get_or_insert_with(Default::default)
                        .velocity_damping = Some(parse_set_value(key, value_str, "float")?);
                }
                "simulation.solver-iterations" => {
                    self.simulation
                        .get_or_insert_with(Default::default)
                        .solver_iterations = Some(parse_set_value(key, value_str, "integer")?);
                }
                "simulation.real-time" => {
                    self.simulation.get_or_insert_with(Default::default).real_time =
                        Some(parse_set_value(key, value_str, "boolean")?);
                }
                "scene.ground" => {
                    self.scene.get_or_insert_with(Default::default).ground =
                        Some(parse_set_value(key, value_str, "boolean")?);
                }
                "scene.prop-cylinder" => {
                    self.scene.get_or_insert_with(Default::default).prop_cylinder =
                        Some(parse_set_value(key, value_str, "boolean")?);
                }
                "scene.atom-radius" => {
                    self.scene.get_or_insert_with(Default::default).atom_radius =
                        Some(parse_set_value(key, value_str, "float")?);
                }
                "scene.stick-radius" => {
                    self.scene.get_or_insert_with(Default::default).stick_radius =
                        Some(parse_set_value(key, value_str, "float")?);
                }
                "molecule.table" => {
                    self.molecule.get_or_insert_with(Default::default).table =
                        Some(PathBuf::from(value_str));
                }
                "molecule.deduplicate" => {
                    self.molecule.get_or_insert_with(Default::default).deduplicate =
                        Some(parse_set_value(key, value_str, "boolean")?);
                }
                "molecule.scale" => {
                    self.molecule.get_or_insert_with(Default::default).scale =
                        Some(parse_set_value(key, value_str, "float")?);
                }
                "sampler.enabled" => {
                    self.sampler.get_or_insert_with(Default::default).enabled =
                        Some(parse_set_value(key, value_str, "boolean")?);
                }
                "sampler.endpoint" => {
                    self.sampler.get_or_insert_with(Default::default).endpoint =
                        Some(value_str.to_string());
                }
                "sampler.timeout-secs" => {
                    self.sampler.get_or_insert_with(Default::default).timeout_secs =
                        Some(parse_set_value(key, value_str, "float")?);
                }
                "sampler.interval" => {
                    self.sampler.get_or_insert_with(Default::default).interval =
                        Some(parse_set_value(key, value_str, "float")?);
                }
                "sampler.capacity" => {
                    self.sampler.get_or_insert_with(Default::default).capacity =
                        Some(parse_set_value(key, value_str, "integer")?);
                }
                _ => {
                    return Err(CliError::Config(format!(
                        "Unsupported configuration key for --set: '{}'",
                        key
                    )));
                }
            }
        }
        Ok(())
    }
}

fn parse_set_value<T: FromStr>(key: &str, value_str: &str, kind: &str) -> Result<T> {
    value_str.parse().map_err(|_| {
        CliError::Config(format!(
            "Invalid {} value for {}: {}",
            kind, key, value_str
        ))
    })
}

/// Loads the geometry table at `path`, or the built-in one when no path is given.
pub fn load_table(path: Option<&Path>) -> Result<GeometryTable> {
    match path {
        Some(path) => {
            debug!("Loading geometry table from {:?}", path);
            Ok(GeometryTable::load(path)?)
        }
        None => Ok(GeometryTable::builtin()),
    }
}

fn resolve_scoring(
    endpoint: Option<&String>,
    timeout_secs: Option<f64>,
    defaults: &DefaultsConfig,
) -> Result<ScoringSettings> {
    let endpoint = endpoint
        .cloned()
        .unwrap_or_else(|| defaults.endpoint.clone());
    if endpoint.trim().is_empty() {
        return Err(CliError::Config(
            "The scoring endpoint must not be empty.".to_string(),
        ));
    }
    let timeout = match timeout_secs {
        Some(secs) if secs.is_finite() && secs > 0.0 => Some(Duration::from_secs_f64(secs)),
        Some(secs) => {
            return Err(CliError::Config(format!(
                "The scoring timeout must be a positive number of seconds, got {}",
                secs
            )));
        }
        None => None,
    };
    Ok(ScoringSettings { endpoint, timeout })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;
    use molframe::engine::sampler::client::DEFAULT_ENDPOINT;
    use std::fs;
    use tempfile::{TempDir, tempdir};

    const SMALL_TABLE: &str = r#"
        atoms = [
            { element = "C", position = [0.0, 0.0, 0.0] },
            { element = "C", position = [1.5, 0.0, 0.0] },
            { element = "C", position = [1.5, 1.5, 0.0] },
            { element = "C", position = [1.5, 1.5, 1.5] },
        ]
        relations = [
            { a = 1, b = 2, bond = true },
            { a = 2, b = 3, bond = true },
            { a = 3, b = 4, bond = true },
        ]
    "#;

    fn write_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let file_path = dir.path().join(name);
        fs::write(&file_path, content).unwrap();
        file_path
    }

    fn parse_run_args(extra: &[&str]) -> RunArgs {
        let mut args = vec!["molframe", "run"];
        args.extend_from_slice(extra);
        match Cli::parse_from(args).command {
            Commands::Run(run_args) => run_args,
            _ => panic!("Expected 'run' subcommand"),
        }
    }

    #[test]
    fn empty_config_uses_defaults() {
        let args = parse_run_args(&[]);
        let config = PartialAppConfig::default().merge_with_cli(&args).unwrap();

        assert_eq!(config.run_options.frames, 600);
        assert_eq!(config.run_options.pacing, Pacing::Fixed);
        assert_eq!(config.core_config.molecule.table, GeometryTable::builtin());
        assert!(config.core_config.molecule.deduplicate_relations);
        assert!(config.core_config.scene.include_ground);
        assert!(!config.core_config.scene.include_prop_cylinder);
        assert_eq!(config.core_config.sampler.capacity, 150);

        let scoring = config.scoring.unwrap();
        assert_eq!(scoring.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(scoring.timeout, None);
        assert!(config.output_path.is_none());
    }

    #[test]
    fn load_from_file_and_merge_with_defaults() {
        let dir = tempdir().unwrap();
        write_file(&dir, "small.toml", SMALL_TABLE);
        let config_path = write_file(
            &dir,
            "config.toml",
            r#"
            [simulation]
            frames = 120
            velocity-damping = 1.1
            real-time = true

            [scene]
            prop-cylinder = true

            [molecule]
            table = "small.toml"
            translation = [0.0, 2.0, 0.0]

            [sampler]
            endpoint = "http://localhost:8080/score"
            timeout-secs = 2.5
            interval = 0.5
            "#,
        );

        let args = parse_run_args(&["-c", config_path.to_str().unwrap()]);
        let config = PartialAppConfig::from_file(&config_path)
            .unwrap()
            .merge_with_cli(&args)
            .unwrap();

        assert_eq!(config.run_options.frames, 120);
        assert_eq!(config.run_options.pacing, Pacing::RealTime);
        assert_eq!(config.core_config.physics.velocity_damping, 1.1);
        assert_eq!(config.core_config.physics.timestep, 1.0 / 60.0);
        assert!(config.core_config.scene.include_prop_cylinder);
        assert_eq!(config.core_config.molecule.table.atoms.len(), 4);
        assert_eq!(
            config.core_config.molecule.placement.translation,
            Vector3::new(0.0, 2.0, 0.0)
        );
        assert_eq!(config.core_config.sampler.interval, 0.5);

        let scoring = config.scoring.unwrap();
        assert_eq!(scoring.endpoint, "http://localhost:8080/score");
        assert_eq!(scoring.timeout, Some(Duration::from_secs_f64(2.5)));
    }

    #[test]
    fn cli_args_override_file_values() {
        let dir = tempdir().unwrap();
        let config_path = write_file(
            &dir,
            "config.toml",
            r#"
            [simulation]
            frames = 120

            [molecule]
            deduplicate = true

            [sampler]
            endpoint = "http://localhost:8080/score"
            "#,
        );

        let args = parse_run_args(&[
            "-c",
            config_path.to_str().unwrap(),
            "--frames",
            "30",
            "--keep-duplicates",
            "--endpoint",
            "http://example.org/energy",
            "--timeout",
            "4",
            "-o",
            "samples.csv",
        ]);
        let config = PartialAppConfig::from_file(&config_path)
            .unwrap()
            .merge_with_cli(&args)
            .unwrap();

        assert_eq!(config.run_options.frames, 30);
        assert!(!config.core_config.molecule.deduplicate_relations);
        let scoring = config.scoring.unwrap();
        assert_eq!(scoring.endpoint, "http://example.org/energy");
        assert_eq!(scoring.timeout, Some(Duration::from_secs(4)));
        assert_eq!(config.output_path, Some(PathBuf::from("samples.csv")));
    }

    #[test]
    fn set_value_overrides_file_and_defaults() {
        let dir = tempdir().unwrap();
        let config_path = write_file(
            &dir,
            "config.toml",
            r#"
            [sampler]
            interval = 0.5
            "#,
        );

        let args = parse_run_args(&[
            "-c",
            config_path.to_str().unwrap(),
            "-S",
            "sampler.interval=1.0",
            "-S",
            "sampler.capacity=10",
            "-S",
            "scene.ground=false",
        ]);
        let config = PartialAppConfig::from_file(&config_path)
            .unwrap()
            .merge_with_cli(&args)
            .unwrap();

        assert_eq!(config.core_config.sampler.interval, 1.0);
        assert_eq!(config.core_config.sampler.capacity, 10);
        assert!(!config.core_config.scene.include_ground);
    }

    #[test]
    fn offline_flag_disables_sampling() {
        let args = parse_run_args(&["--offline"]);
        let config = PartialAppConfig::default().merge_with_cli(&args).unwrap();
        assert!(config.scoring.is_none());

        let args = parse_run_args(&["-S", "sampler.enabled=false"]);
        let config = PartialAppConfig::default().merge_with_cli(&args).unwrap();
        assert!(config.scoring.is_none());
    }

    #[test]
    fn invalid_set_values_are_rejected() {
        for set in ["sampler.interval", "sampler.capacity=many", "physics.mass=2"] {
            let args = parse_run_args(&["-S", set]);
            let result = PartialAppConfig::default().merge_with_cli(&args);
            assert!(matches!(result, Err(CliError::Config(_))), "{set}");
        }
    }

    #[test]
    fn invalid_core_values_surface_as_config_errors() {
        let args = parse_run_args(&["-S", "sampler.capacity=0"]);
        let result = PartialAppConfig::default().merge_with_cli(&args);
        assert!(matches!(result, Err(CliError::Config(msg)) if msg.contains("sample_capacity")));

        let args = parse_run_args(&["--timeout", "0"]);
        let result = PartialAppConfig::default().merge_with_cli(&args);
        assert!(matches!(result, Err(CliError::Config(msg)) if msg.contains("timeout")));
    }

    #[test]
    fn unknown_keys_in_file_are_rejected() {
        let dir = tempdir().unwrap();
        let config_path = write_file(
            &dir,
            "config.toml",
            r#"
            [simulation]
            frame-count = 10
            "#,
        );
        let result = PartialAppConfig::from_file(&config_path);
        assert!(matches!(result, Err(CliError::FileParsing { .. })));
    }

    #[test]
    fn missing_table_file_is_reported() {
        let args = parse_run_args(&["--table", "/nonexistent/table.toml"]);
        let result = PartialAppConfig::default().merge_with_cli(&args);
        assert!(matches!(result, Err(CliError::Table(_))));
    }

    #[test]
    fn score_config_checks_dihedral_serials_against_table() {
        let dir = tempdir().unwrap();
        let table_path = write_file(&dir, "small.toml", SMALL_TABLE);
        let config_path = write_file(
            &dir,
            "config.toml",
            r#"
            [sampler]
            dihedral = [1, 2, 3, 9]
            "#,
        );
        let cli = Cli::parse_from([
            "molframe",
            "score",
            "--table",
            table_path.to_str().unwrap(),
        ]);
        let Commands::Score(args) = cli.command else {
            panic!("Expected 'score' subcommand");
        };

        let result = PartialAppConfig::from_file(&config_path)
            .unwrap()
            .merge_for_score(&args);
        assert!(matches!(result, Err(CliError::Config(msg)) if msg.contains('9')));

        let config = PartialAppConfig::default().merge_for_score(&args).unwrap();
        assert_eq!(config.table.atoms.len(), 4);
        assert_eq!(config.dihedral_serials, [1, 2, 3, 4]);
        assert_eq!(config.scoring.endpoint, DEFAULT_ENDPOINT);
    }
}
