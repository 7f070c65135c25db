use super::physics::{BodyDesc, BodyId, PhysicsError, PhysicsWorld, Shape};
use nalgebra::Point3;
use tracing::info;

pub const HAND_COUNT: usize = 2;
pub const JOINT_PROXY_RADIUS: f64 = 0.01;

/// Tracked joint positions for one frame, in world space, indexed by hand.
///
/// A hand that is not tracked reports no joints.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HandInput {
    pub joints: [Vec<Point3<f64>>; HAND_COUNT],
}

impl HandInput {
    pub fn untracked() -> Self {
        Self::default()
    }

    pub fn new(first: Vec<Point3<f64>>, second: Vec<Point3<f64>>) -> Self {
        Self {
            joints: [first, second],
        }
    }
}

/// Static sphere bodies that follow the tracked hand joints so hands can push
/// atoms around.
///
/// Proxies are created once, the first frame the first hand reports more than
/// one joint, with one body per joint reported at that moment. They are never
/// bound to a mesh: the joints themselves are the visual.
#[derive(Debug, Clone, Default)]
pub struct HandProxies {
    bodies: [Vec<BodyId>; HAND_COUNT],
    created: bool,
}

impl HandProxies {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_created(&self) -> bool {
        self.created
    }

    pub fn proxy_count(&self) -> usize {
        self.bodies.iter().map(Vec::len).sum()
    }

    pub fn bodies(&self, hand: usize) -> &[BodyId] {
        self.bodies.get(hand).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Creates the proxy bodies if they do not exist yet and the input is ready.
    ///
    /// Returns `true` when proxies were created by this call.
    pub fn ensure_created<W: PhysicsWorld + ?Sized>(
        &mut self,
        world: &mut W,
        input: &HandInput,
    ) -> Result<bool, PhysicsError> {
        if self.created || input.joints[0].len() <= 1 {
            return Ok(false);
        }

        for (hand, joints) in input.joints.iter().enumerate() {
            for joint in joints {
                let body = world.add_body(BodyDesc::new(
                    0.0,
                    Shape::Sphere {
                        radius: JOINT_PROXY_RADIUS,
                    },
                    *joint,
                ))?;
                self.bodies[hand].push(body);
            }
        }
        self.created = true;
        info!(
            proxies = self.proxy_count(),
            "Hand tracking detected; joint proxies created."
        );
        Ok(true)
    }

    /// Moves every proxy onto its joint. Proxies whose joint is missing this
    /// frame keep their last position.
    pub fn sync<W: PhysicsWorld + ?Sized>(
        &self,
        world: &mut W,
        input: &HandInput,
    ) -> Result<(), PhysicsError> {
        for (bodies, joints) in self.bodies.iter().zip(&input.joints) {
            for (&body, joint) in bodies.iter().zip(joints) {
                world.set_position(body, *joint)?;
            }
        }
        Ok(())
    }
}
