use super::config::SimulationConfig;
use super::error::EngineError;
use super::hands::{HandInput, HandProxies};
use super::physics::{BodyDesc, PhysicsError, PhysicsWorld, Shape};
use super::registry::{BindingKind, Registry, StickBinding};
use super::scene::{Material, Mesh, MeshGeometry, SceneGraph, Transform};
use super::sync::{SyncReport, synchronize};
use crate::core::models::atom::Element;
use crate::core::models::molecule::Molecule;
use crate::core::utils::geometry::{Placement, calculate_rmsd, compute_segment_pose};
use nalgebra::{Point3, UnitQuaternion, Vector3};
use std::f64::consts::FRAC_PI_2;
use tracing::{debug, info};

pub const GROUND_SIZE: f64 = 4.0;
pub const PROP_RADIUS: f64 = 0.25;
pub const PROP_HEIGHT: f64 = 1.0;
pub const PROP_MASS: f64 = 20.0;
pub const PROP_START: [f64; 3] = [0.0, 10.0, -0.5];
pub const PROP_SEGMENTS: u32 = 20;

/// Everything one running scene owns: the physics world, the scene graph,
/// the molecule they were built from and the bindings between them.
pub struct SimulationContext<W: PhysicsWorld, S: SceneGraph> {
    world: W,
    scene: S,
    molecule: Molecule,
    registry: Registry,
    hands: HandProxies,
    config: SimulationConfig,
    frames: u64,
}

impl<W: PhysicsWorld, S: SceneGraph> SimulationContext<W, S> {
    /// Builds the scene: ground plane, optional prop cylinder, one sphere per
    /// atom, one distance constraint per relation and one stick per bond.
    pub fn setup(config: SimulationConfig, mut world: W, mut scene: S) -> Result<Self, EngineError> {
        let molecule = config
            .molecule
            .table
            .to_molecule(config.molecule.deduplicate_relations)?;
        let placement = config.molecule.placement;
        let mut registry = Registry::new();

        if config.scene.include_ground {
            let orientation = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), -FRAC_PI_2);
            let body = world.add_body(
                BodyDesc::new(0.0, Shape::Plane, Point3::origin()).with_orientation(orientation),
            )?;
            let mesh = scene.add_mesh(
                Mesh::new(
                    "ground",
                    MeshGeometry::Plane {
                        width: GROUND_SIZE,
                        height: GROUND_SIZE,
                    },
                    Material::GROUND,
                )
                .with_transform(Transform::default().with_orientation(orientation)),
            );
            registry.register_pair(mesh, body, BindingKind::Ground)?;
        }

        if config.scene.include_prop_cylinder {
            let start = Point3::from(PROP_START);
            let body = world.add_body(BodyDesc::new(
                PROP_MASS,
                Shape::Cylinder {
                    radius: PROP_RADIUS,
                    height: PROP_HEIGHT,
                },
                start,
            ))?;
            let mesh = scene.add_mesh(
                Mesh::new(
                    "cylinder",
                    MeshGeometry::Cylinder {
                        radius: PROP_RADIUS,
                        height: PROP_HEIGHT,
                        radial_segments: PROP_SEGMENTS,
                        base_at_origin: false,
                    },
                    Material::PROP,
                )
                .with_transform(Transform::from_position(start)),
            );
            registry.register_pair(mesh, body, BindingKind::Prop)?;
        }

        for (atom_id, atom) in molecule.atoms_iter() {
            let position = placement.to_world(&atom.rest_position);
            let body = world.add_body(BodyDesc::new(
                atom.mass,
                Shape::Sphere {
                    radius: config.scene.atom_radius,
                },
                position,
            ))?;
            let material = match atom.element {
                Element::Carbon => Material::CARBON,
                _ => Material::HYDROGEN,
            };
            let mesh = scene.add_mesh(
                Mesh::new(
                    format!("atom-{}-{}", atom.serial, atom.element),
                    MeshGeometry::Sphere {
                        radius: config.scene.atom_radius,
                        segments: config.scene.atom_segments,
                    },
                    material,
                )
                .with_transform(Transform::from_position(position)),
            );
            registry.register_pair(mesh, body, BindingKind::Atom(atom_id))?;
        }

        for (relation_id, relation) in molecule.relations_iter() {
            let missing = || {
                EngineError::Internal(format!("relation {relation_id:?} endpoint has no body"))
            };
            let body_a = registry.body_for_atom(relation.atom1_id).ok_or_else(missing)?;
            let body_b = registry.body_for_atom(relation.atom2_id).ok_or_else(missing)?;
            let constraint = world.add_distance_constraint(body_a, body_b)?;
            registry.register_constraint(relation_id, constraint)?;

            if !relation.is_bond() {
                continue;
            }

            let a = molecule.atom(relation.atom1_id).ok_or_else(missing)?;
            let b = molecule.atom(relation.atom2_id).ok_or_else(missing)?;
            let pose = compute_segment_pose(
                &placement.to_world(&a.rest_position),
                &placement.to_world(&b.rest_position),
            )?;
            let mesh = scene.add_mesh(
                Mesh::new(
                    format!("stick-{}-{}", a.serial, b.serial),
                    MeshGeometry::stick(
                        config.scene.stick_radius,
                        pose.length,
                        config.scene.stick_segments,
                    ),
                    Material::STICK,
                )
                .with_transform(
                    Transform::from_position(pose.origin).with_orientation(pose.orientation),
                ),
            );
            registry.register_stick(StickBinding {
                relation: relation_id,
                mesh,
                endpoints: (relation.atom1_id, relation.atom2_id),
                built_length: pose.length,
            })?;
        }

        info!(
            atoms = molecule.atom_count(),
            bindings = registry.bindings().len(),
            constraints = registry.constraint_count(),
            sticks = registry.sticks().len(),
            "Scene setup complete."
        );

        Ok(Self {
            world,
            scene,
            molecule,
            registry,
            hands: HandProxies::new(),
            config,
            frames: 0,
        })
    }

    /// Advances physics by one fixed timestep and mirrors the result.
    pub fn step_frame(&mut self, hand_input: &HandInput) -> Result<SyncReport, EngineError> {
        self.hands.ensure_created(&mut self.world, hand_input)?;
        self.world.step(self.config.physics.timestep);
        self.frames += 1;
        let report = self.synchronize(hand_input)?;
        if report.sticks_skipped > 0 {
            debug!(frame = self.frames, skipped = report.sticks_skipped, "Sticks skipped this frame.");
        }
        Ok(report)
    }

    /// Mirrors the current physics state into the scene without stepping.
    pub fn synchronize(&mut self, hand_input: &HandInput) -> Result<SyncReport, EngineError> {
        synchronize(
            &mut self.world,
            &mut self.scene,
            &self.registry,
            &self.hands,
            hand_input,
            self.config.physics.velocity_damping,
        )
    }

    /// Body positions of every atom, in table order, in world space.
    pub fn atom_world_positions(&self) -> Result<Vec<Point3<f64>>, EngineError> {
        self.molecule
            .atom_ids()
            .iter()
            .map(|&atom_id| -> Result<Point3<f64>, EngineError> {
                let body = self.registry.body_for_atom(atom_id).ok_or_else(|| {
                    EngineError::Internal(format!("atom {atom_id:?} has no body"))
                })?;
                self.world
                    .body_state(body)
                    .map(|state| state.position)
                    .ok_or_else(|| PhysicsError::UnknownBody(body).into())
            })
            .collect()
    }

    /// 0-based positions in table order of the configured dihedral atoms.
    pub fn dihedral_indices(&self) -> Result<[usize; 4], EngineError> {
        let serials = self.config.sampler.dihedral_serials;
        let mut indices = [0; 4];
        for (slot, serial) in indices.iter_mut().zip(serials) {
            let atom_id = self
                .molecule
                .find_atom_by_serial(serial)
                .ok_or(EngineError::AtomNotFound { serial })?;
            *slot = self
                .molecule
                .atom_ids()
                .iter()
                .position(|&id| id == atom_id)
                .ok_or(EngineError::AtomNotFound { serial })?;
        }
        Ok(indices)
    }

    /// RMSD in atomic units between the current atom positions and the rest
    /// geometry.
    pub fn drift_rmsd(&self) -> Result<Option<f64>, EngineError> {
        let placement = self.placement();
        let current: Vec<_> = self
            .atom_world_positions()?
            .iter()
            .map(|p| placement.to_atomic(p))
            .collect();
        Ok(calculate_rmsd(&current, &self.molecule.rest_positions()))
    }

    pub fn simulated_time(&self) -> f64 {
        self.frames as f64 * self.config.physics.timestep
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn placement(&self) -> Placement {
        self.config.molecule.placement
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn molecule(&self) -> &Molecule {
        &self.molecule
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn hands(&self) -> &HandProxies {
        &self.hands
    }

    pub fn world(&self) -> &W {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut W {
        &mut self.world
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }
}
