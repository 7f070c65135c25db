use super::{BodyDesc, BodyId, BodyState, ConstraintId, PhysicsError, PhysicsWorld, Shape};
use crate::engine::config::DEFAULT_SOLVER_ITERATIONS;
use nalgebra::{Point3, UnitQuaternion, Vector3};
use slotmap::{SecondaryMap, SlotMap};

const SEPARATION_EPSILON: f64 = 1e-12;

#[derive(Debug, Clone)]
struct RigidBody {
    shape: Shape,
    inverse_mass: f64,
    position: Point3<f64>,
    orientation: UnitQuaternion<f64>,
    linear_velocity: Vector3<f64>,
}

impl RigidBody {
    #[inline]
    fn is_static(&self) -> bool {
        self.inverse_mass == 0.0
    }

    fn state(&self) -> BodyState {
        BodyState {
            position: self.position,
            orientation: self.orientation,
            linear_velocity: self.linear_velocity,
        }
    }

    /// Distance from the body origin to its lowest point along `-normal`.
    fn extent_along(&self, normal: &Vector3<f64>) -> Option<f64> {
        match self.shape {
            Shape::Sphere { radius } => Some(radius),
            Shape::Cylinder { radius, height } => {
                let axis = self.orientation * Vector3::y();
                let cos = axis.dot(normal).abs().min(1.0);
                let sin = (1.0 - cos * cos).sqrt();
                Some(cos * height * 0.5 + sin * radius)
            }
            Shape::Plane => None,
        }
    }

    fn plane_normal(&self) -> Option<Vector3<f64>> {
        match self.shape {
            Shape::Plane => Some(self.orientation * Vector3::z()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct DistanceConstraint {
    body_a: BodyId,
    body_b: BodyId,
    distance: f64,
}

/// Headless rigid-body world.
///
/// Integrates translation with semi-implicit Euler, then projects predicted
/// positions onto the distance constraints, plane contacts and sphere
/// overlaps for a fixed number of solver iterations. Velocities are re-derived
/// from the corrected positions. Orientation is carried but never integrated:
/// bodies have no angular dynamics.
#[derive(Debug, Clone)]
pub struct RigidWorld {
    bodies: SlotMap<BodyId, RigidBody>,
    constraints: SlotMap<ConstraintId, DistanceConstraint>,
    gravity: Vector3<f64>,
    solver_iterations: usize,
}

impl Default for RigidWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl RigidWorld {
    /// Creates an empty world without gravity.
    pub fn new() -> Self {
        Self {
            bodies: SlotMap::with_key(),
            constraints: SlotMap::with_key(),
            gravity: Vector3::zeros(),
            solver_iterations: DEFAULT_SOLVER_ITERATIONS,
        }
    }

    pub fn with_gravity(mut self, gravity: Vector3<f64>) -> Self {
        self.gravity = gravity;
        self
    }

    pub fn with_solver_iterations(mut self, iterations: usize) -> Self {
        self.solver_iterations = iterations.max(1);
        self
    }

    pub fn gravity(&self) -> Vector3<f64> {
        self.gravity
    }

    /// Separation a constraint maintains, fixed when it was added.
    pub fn constraint_distance(&self, constraint: ConstraintId) -> Option<f64> {
        self.constraints.get(constraint).map(|c| c.distance)
    }

    fn body_mut(&mut self, body: BodyId) -> Result<&mut RigidBody, PhysicsError> {
        self.bodies
            .get_mut(body)
            .ok_or(PhysicsError::UnknownBody(body))
    }

    fn solve_distance(
        &self,
        constraint: &DistanceConstraint,
        predicted: &mut SecondaryMap<BodyId, Point3<f64>>,
    ) {
        let wa = self.bodies[constraint.body_a].inverse_mass;
        let wb = self.bodies[constraint.body_b].inverse_mass;
        let total = wa + wb;
        if total == 0.0 {
            return;
        }

        let delta = predicted[constraint.body_b] - predicted[constraint.body_a];
        let length = delta.norm();
        if length < SEPARATION_EPSILON {
            return;
        }
        let correction = delta / length * (length - constraint.distance);
        predicted[constraint.body_a] += correction * (wa / total);
        predicted[constraint.body_b] -= correction * (wb / total);
    }

    fn solve_plane_contacts(
        &self,
        planes: &[(Point3<f64>, Vector3<f64>)],
        predicted: &mut SecondaryMap<BodyId, Point3<f64>>,
    ) {
        for (id, body) in &self.bodies {
            if body.is_static() {
                continue;
            }
            for (origin, normal) in planes {
                let Some(extent) = body.extent_along(normal) else {
                    continue;
                };
                let depth = (predicted[id] - origin).dot(normal) - extent;
                if depth < 0.0 {
                    predicted[id] -= normal * depth;
                }
            }
        }
    }

    fn solve_sphere_overlaps(
        &self,
        spheres: &[(BodyId, f64)],
        predicted: &mut SecondaryMap<BodyId, Point3<f64>>,
    ) {
        for (i, &(id_a, radius_a)) in spheres.iter().enumerate() {
            for &(id_b, radius_b) in &spheres[i + 1..] {
                let wa = self.bodies[id_a].inverse_mass;
                let wb = self.bodies[id_b].inverse_mass;
                let total = wa + wb;
                if total == 0.0 {
                    continue;
                }
                let delta = predicted[id_b] - predicted[id_a];
                let length = delta.norm();
                let overlap = radius_a + radius_b - length;
                if overlap <= 0.0 || length < SEPARATION_EPSILON {
                    continue;
                }
                let push = delta / length * overlap;
                predicted[id_a] -= push * (wa / total);
                predicted[id_b] += push * (wb / total);
            }
        }
    }
}

impl PhysicsWorld for RigidWorld {
    fn add_body(&mut self, desc: BodyDesc) -> Result<BodyId, PhysicsError> {
        if !desc.mass.is_finite() || desc.mass < 0.0 {
            return Err(PhysicsError::InvalidMass { mass: desc.mass });
        }
        match desc.shape {
            Shape::Sphere { radius } if radius <= 0.0 => {
                return Err(PhysicsError::InvalidShape("sphere radius must be positive"));
            }
            Shape::Cylinder { radius, height } if radius <= 0.0 || height <= 0.0 => {
                return Err(PhysicsError::InvalidShape(
                    "cylinder radius and height must be positive",
                ));
            }
            Shape::Plane if desc.mass != 0.0 => {
                return Err(PhysicsError::InvalidShape("plane bodies must be static"));
            }
            _ => {}
        }

        let inverse_mass = if desc.mass == 0.0 { 0.0 } else { 1.0 / desc.mass };
        Ok(self.bodies.insert(RigidBody {
            shape: desc.shape,
            inverse_mass,
            position: desc.position,
            orientation: desc.orientation,
            linear_velocity: Vector3::zeros(),
        }))
    }

    fn add_distance_constraint(
        &mut self,
        body_a: BodyId,
        body_b: BodyId,
    ) -> Result<ConstraintId, PhysicsError> {
        if body_a == body_b {
            return Err(PhysicsError::DegenerateConstraint);
        }
        let a = self
            .bodies
            .get(body_a)
            .ok_or(PhysicsError::UnknownBody(body_a))?;
        let b = self
            .bodies
            .get(body_b)
            .ok_or(PhysicsError::UnknownBody(body_b))?;
        let distance = (b.position - a.position).norm();
        Ok(self.constraints.insert(DistanceConstraint {
            body_a,
            body_b,
            distance,
        }))
    }

    fn step(&mut self, dt: f64) {
        if !(dt > 0.0 && dt.is_finite()) {
            return;
        }

        let mut predicted = SecondaryMap::with_capacity(self.bodies.len());
        for (id, body) in &mut self.bodies {
            if body.is_static() {
                predicted.insert(id, body.position);
            } else {
                body.linear_velocity += self.gravity * dt;
                predicted.insert(id, body.position + body.linear_velocity * dt);
            }
        }

        let planes: Vec<_> = self
            .bodies
            .values()
            .filter_map(|body| body.plane_normal().map(|n| (body.position, n)))
            .collect();
        let spheres: Vec<_> = self
            .bodies
            .iter()
            .filter_map(|(id, body)| match body.shape {
                Shape::Sphere { radius } => Some((id, radius)),
                _ => None,
            })
            .collect();

        for _ in 0..self.solver_iterations {
            for constraint in self.constraints.values() {
                self.solve_distance(constraint, &mut predicted);
            }
            self.solve_sphere_overlaps(&spheres, &mut predicted);
            self.solve_plane_contacts(&planes, &mut predicted);
        }

        for (id, body) in &mut self.bodies {
            if body.is_static() {
                continue;
            }
            let next = predicted[id];
            body.linear_velocity = (next - body.position) / dt;
            body.position = next;
        }
    }

    fn body_state(&self, body: BodyId) -> Option<BodyState> {
        self.bodies.get(body).map(RigidBody::state)
    }

    fn set_position(&mut self, body: BodyId, position: Point3<f64>) -> Result<(), PhysicsError> {
        self.body_mut(body)?.position = position;
        Ok(())
    }

    fn set_linear_velocity(
        &mut self,
        body: BodyId,
        velocity: Vector3<f64>,
    ) -> Result<(), PhysicsError> {
        self.body_mut(body)?.linear_velocity = velocity;
        Ok(())
    }

    fn body_count(&self) -> usize {
        self.bodies.len()
    }

    fn constraint_count(&self) -> usize {
        self.constraints.len()
    }
}
