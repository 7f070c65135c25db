use crate::core::table::GeometryTable;
use crate::core::utils::geometry::Placement;
use nalgebra::Vector3;
use thiserror::Error;

pub const DEFAULT_TIMESTEP: f64 = 1.0 / 60.0;
pub const DEFAULT_VELOCITY_DAMPING: f64 = 1.05;
pub const DEFAULT_PLACEMENT_SCALE: f64 = 0.1;
pub const DEFAULT_PLACEMENT_TRANSLATION: [f64; 3] = [0.0, 1.15, -0.5];
pub const DEFAULT_SOLVER_ITERATIONS: usize = 10;

pub const DEFAULT_ATOM_RADIUS: f64 = 0.04;
pub const DEFAULT_ATOM_SEGMENTS: u32 = 32;
pub const DEFAULT_STICK_RADIUS: f64 = 0.015;
pub const DEFAULT_STICK_SEGMENTS: u32 = 32;

pub const DEFAULT_SAMPLE_INTERVAL: f64 = 0.2;
pub const DEFAULT_SAMPLE_CAPACITY: usize = 150;
pub const DEFAULT_SNAPSHOT_DECIMALS: i32 = 3;
pub const DEFAULT_DIHEDRAL_SERIALS: [usize; 4] = [1, 2, 3, 4];

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PhysicsConfig {
    pub timestep: f64,
    /// Every body's linear velocity is divided by this after each step.
    pub velocity_damping: f64,
    pub gravity: Vector3<f64>,
    pub solver_iterations: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneConfig {
    pub include_ground: bool,
    pub include_prop_cylinder: bool,
    pub atom_radius: f64,
    pub atom_segments: u32,
    pub stick_radius: f64,
    pub stick_segments: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MoleculeConfig {
    pub table: GeometryTable,
    pub placement: Placement,
    /// Fold reversed duplicate table entries into a single relation.
    pub deduplicate_relations: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SamplerConfig {
    /// Minimum elapsed time between two snapshots.
    pub interval: f64,
    pub capacity: usize,
    pub snapshot_decimals: i32,
    /// Table serials of the four atoms whose dihedral is plotted.
    pub dihedral_serials: [usize; 4],
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_SAMPLE_INTERVAL,
            capacity: DEFAULT_SAMPLE_CAPACITY,
            snapshot_decimals: DEFAULT_SNAPSHOT_DECIMALS,
            dihedral_serials: DEFAULT_DIHEDRAL_SERIALS,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    pub physics: PhysicsConfig,
    pub scene: SceneConfig,
    pub molecule: MoleculeConfig,
    pub sampler: SamplerConfig,
}

#[derive(Default)]
pub struct SimulationConfigBuilder {
    table: Option<GeometryTable>,
    timestep: Option<f64>,
    velocity_damping: Option<f64>,
    gravity: Option<Vector3<f64>>,
    solver_iterations: Option<usize>,
    placement_scale: Option<f64>,
    placement_translation: Option<Vector3<f64>>,
    deduplicate_relations: Option<bool>,
    include_ground: Option<bool>,
    include_prop_cylinder: Option<bool>,
    atom_radius: Option<f64>,
    stick_radius: Option<f64>,
    sample_interval: Option<f64>,
    sample_capacity: Option<usize>,
    dihedral_serials: Option<[usize; 4]>,
}

impl SimulationConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(mut self, table: GeometryTable) -> Self {
        self.table = Some(table);
        self
    }
    pub fn timestep(mut self, timestep: f64) -> Self {
        self.timestep = Some(timestep);
        self
    }
    pub fn velocity_damping(mut self, damping: f64) -> Self {
        self.velocity_damping = Some(damping);
        self
    }
    pub fn gravity(mut self, gravity: Vector3<f64>) -> Self {
        self.gravity = Some(gravity);
        self
    }
    pub fn solver_iterations(mut self, iterations: usize) -> Self {
        self.solver_iterations = Some(iterations);
        self
    }
    pub fn placement_scale(mut self, scale: f64) -> Self {
        self.placement_scale = Some(scale);
        self
    }
    pub fn placement_translation(mut self, translation: Vector3<f64>) -> Self {
        self.placement_translation = Some(translation);
        self
    }
    pub fn deduplicate_relations(mut self, deduplicate: bool) -> Self {
        self.deduplicate_relations = Some(deduplicate);
        self
    }
    pub fn include_ground(mut self, include: bool) -> Self {
        self.include_ground = Some(include);
        self
    }
    pub fn include_prop_cylinder(mut self, include: bool) -> Self {
        self.include_prop_cylinder = Some(include);
        self
    }
    pub fn atom_radius(mut self, radius: f64) -> Self {
        self.atom_radius = Some(radius);
        self
    }
    pub fn stick_radius(mut self, radius: f64) -> Self {
        self.stick_radius = Some(radius);
        self
    }
    pub fn sample_interval(mut self, interval: f64) -> Self {
        self.sample_interval = Some(interval);
        self
    }
    pub fn sample_capacity(mut self, capacity: usize) -> Self {
        self.sample_capacity = Some(capacity);
        self
    }
    pub fn dihedral_serials(mut self, serials: [usize; 4]) -> Self {
        self.dihedral_serials = Some(serials);
        self
    }

    pub fn build(self) -> Result<SimulationConfig, ConfigError> {
        let table = self.table.ok_or(ConfigError::MissingParameter("table"))?;

        let physics = PhysicsConfig {
            timestep: positive("timestep", self.timestep.unwrap_or(DEFAULT_TIMESTEP))?,
            velocity_damping: positive(
                "velocity_damping",
                self.velocity_damping.unwrap_or(DEFAULT_VELOCITY_DAMPING),
            )?,
            gravity: self.gravity.unwrap_or_else(Vector3::zeros),
            solver_iterations: self
                .solver_iterations
                .unwrap_or(DEFAULT_SOLVER_ITERATIONS)
                .max(1),
        };
        let scene = SceneConfig {
            include_ground: self.include_ground.unwrap_or(true),
            include_prop_cylinder: self.include_prop_cylinder.unwrap_or(false),
            atom_radius: positive("atom_radius", self.atom_radius.unwrap_or(DEFAULT_ATOM_RADIUS))?,
            atom_segments: DEFAULT_ATOM_SEGMENTS,
            stick_radius: positive(
                "stick_radius",
                self.stick_radius.unwrap_or(DEFAULT_STICK_RADIUS),
            )?,
            stick_segments: DEFAULT_STICK_SEGMENTS,
        };

        let scale = self.placement_scale.unwrap_or(DEFAULT_PLACEMENT_SCALE);
        if scale == 0.0 || !scale.is_finite() {
            return Err(ConfigError::InvalidParameter {
                name: "placement_scale",
                reason: format!("must be finite and non-zero, got {scale}"),
            });
        }
        let translation = self
            .placement_translation
            .unwrap_or_else(|| Vector3::from(DEFAULT_PLACEMENT_TRANSLATION));

        let dihedral_serials = self.dihedral_serials.unwrap_or(DEFAULT_DIHEDRAL_SERIALS);
        for serial in dihedral_serials {
            if serial == 0 || serial > table.atoms.len() {
                return Err(ConfigError::InvalidParameter {
                    name: "dihedral_serials",
                    reason: format!(
                        "serial {serial} is outside the table's {} atoms",
                        table.atoms.len()
                    ),
                });
            }
        }

        let capacity = self.sample_capacity.unwrap_or(DEFAULT_SAMPLE_CAPACITY);
        if capacity == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "sample_capacity",
                reason: "must be at least 1".to_string(),
            });
        }
        let interval = self.sample_interval.unwrap_or(DEFAULT_SAMPLE_INTERVAL);
        if interval < 0.0 || !interval.is_finite() {
            return Err(ConfigError::InvalidParameter {
                name: "sample_interval",
                reason: format!("must be finite and non-negative, got {interval}"),
            });
        }

        Ok(SimulationConfig {
            physics,
            scene,
            molecule: MoleculeConfig {
                table,
                placement: Placement::new(scale, translation),
                deduplicate_relations: self.deduplicate_relations.unwrap_or(true),
            },
            sampler: SamplerConfig {
                interval,
                capacity,
                snapshot_decimals: DEFAULT_SNAPSHOT_DECIMALS,
                dihedral_serials,
            },
        })
    }
}

fn positive(name: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(value)
    } else {
        Err(ConfigError::InvalidParameter {
            name,
            reason: format!("must be finite and positive, got {value}"),
        })
    }
}
