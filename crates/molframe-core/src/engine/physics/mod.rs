//! # Physics Collaborator
//!
//! The engine never integrates motion itself. It talks to a [`PhysicsWorld`],
//! which owns every body's pose and velocity, and only reads state back out
//! (or writes it, for kinematic hand proxies) between steps.
//!
//! [`rigid::RigidWorld`] is the headless reference implementation used by the
//! CLI and the tests.

pub mod rigid;

use nalgebra::{Point3, UnitQuaternion, Vector3};
use slotmap::new_key_type;
use thiserror::Error;

new_key_type! {
    pub struct BodyId;
    pub struct ConstraintId;
}

/// Collision shape of a body, expressed in the body's local frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Sphere { radius: f64 },
    /// Cylinder along local +Y, centered on the body origin.
    Cylinder { radius: f64, height: f64 },
    /// Infinite plane through the body origin with local +Z as its normal.
    Plane,
}

/// Everything needed to create a body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyDesc {
    /// Zero mass makes the body static: it is never moved by the solver.
    pub mass: f64,
    pub shape: Shape,
    pub position: Point3<f64>,
    pub orientation: UnitQuaternion<f64>,
}

impl BodyDesc {
    pub fn new(mass: f64, shape: Shape, position: Point3<f64>) -> Self {
        Self {
            mass,
            shape,
            position,
            orientation: UnitQuaternion::identity(),
        }
    }

    pub fn with_orientation(mut self, orientation: UnitQuaternion<f64>) -> Self {
        self.orientation = orientation;
        self
    }
}

/// A snapshot of one body's kinematic state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyState {
    pub position: Point3<f64>,
    pub orientation: UnitQuaternion<f64>,
    pub linear_velocity: Vector3<f64>,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PhysicsError {
    #[error("Body {0:?} does not exist in the physics world")]
    UnknownBody(BodyId),
    #[error("Invalid body mass {mass}: must be finite and non-negative")]
    InvalidMass { mass: f64 },
    #[error("Invalid shape: {0}")]
    InvalidShape(&'static str),
    #[error("A distance constraint needs two distinct bodies")]
    DegenerateConstraint,
}

/// The rigid-body simulation the engine drives.
///
/// Implementations own body state. Distance constraints keep two bodies at the
/// separation they had when the constraint was added.
pub trait PhysicsWorld {
    fn add_body(&mut self, desc: BodyDesc) -> Result<BodyId, PhysicsError>;

    fn add_distance_constraint(
        &mut self,
        body_a: BodyId,
        body_b: BodyId,
    ) -> Result<ConstraintId, PhysicsError>;

    /// Advances the simulation by `dt`.
    fn step(&mut self, dt: f64);

    fn body_state(&self, body: BodyId) -> Option<BodyState>;

    fn set_position(&mut self, body: BodyId, position: Point3<f64>) -> Result<(), PhysicsError>;

    fn set_linear_velocity(
        &mut self,
        body: BodyId,
        velocity: Vector3<f64>,
    ) -> Result<(), PhysicsError>;

    fn body_count(&self) -> usize;

    fn constraint_count(&self) -> usize;
}
