use super::error::EngineError;
use super::hands::{HandInput, HandProxies};
use super::physics::{PhysicsError, PhysicsWorld};
use super::registry::{Registry, StickBinding};
use super::scene::{SceneError, SceneGraph, Transform};
use crate::core::models::ids::AtomId;
use crate::core::utils::geometry::{SegmentPose, compute_segment_pose};
use nalgebra::Vector3;
use tracing::warn;

/// Counts of what one synchronization pass touched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub bindings_mirrored: usize,
    pub sticks_updated: usize,
    pub sticks_skipped: usize,
}

/// Transform that places a stick's geometry (built along +Y from the origin
/// with `built_length`) onto `pose`.
pub fn stick_transform(pose: &SegmentPose, built_length: f64) -> Transform {
    let stretch = if built_length > 0.0 {
        pose.length / built_length
    } else {
        1.0
    };
    Transform {
        position: pose.origin,
        orientation: pose.orientation,
        scale: Vector3::new(1.0, stretch, 1.0),
    }
}

/// Mirrors the physics world into the scene after a step.
///
/// Runs in three passes, in this order:
/// 1. every binding: damp the body's linear velocity, then copy its position
///    and orientation into the mesh transform;
/// 2. hand proxies: copy tracked joint positions into their bodies;
/// 3. every stick: re-derive its pose from the now current atom meshes.
///
/// A stick whose endpoints coincide has no orientation. That is a broken
/// precondition: debug builds panic, release builds warn and leave the stick
/// where it was.
pub fn synchronize<W, S>(
    world: &mut W,
    scene: &mut S,
    registry: &Registry,
    hands: &HandProxies,
    hand_input: &HandInput,
    velocity_damping: f64,
) -> Result<SyncReport, EngineError>
where
    W: PhysicsWorld + ?Sized,
    S: SceneGraph + ?Sized,
{
    let mut report = SyncReport::default();

    for binding in registry.bindings() {
        let state = world
            .body_state(binding.body)
            .ok_or(PhysicsError::UnknownBody(binding.body))?;
        world.set_linear_velocity(binding.body, state.linear_velocity / velocity_damping)?;

        let mut transform = scene
            .transform(binding.mesh)
            .ok_or(SceneError::UnknownMesh(binding.mesh))?;
        transform.position = state.position;
        transform.orientation = state.orientation;
        scene.set_transform(binding.mesh, transform)?;
        report.bindings_mirrored += 1;
    }

    hands.sync(world, hand_input)?;

    for stick in registry.sticks() {
        if update_stick(scene, registry, stick)? {
            report.sticks_updated += 1;
        } else {
            report.sticks_skipped += 1;
        }
    }

    Ok(report)
}

/// Returns `false` when the stick was skipped because its endpoints coincide.
fn update_stick<S: SceneGraph + ?Sized>(
    scene: &mut S,
    registry: &Registry,
    stick: &StickBinding,
) -> Result<bool, EngineError> {
    let (first, second) = stick.endpoints;
    let endpoint = |atom: AtomId| {
        registry
            .mesh_for_atom(atom)
            .and_then(|mesh| scene.transform(mesh))
            .map(|t| t.position)
            .ok_or_else(|| {
                EngineError::Internal(format!("stick endpoint atom {atom:?} has no mesh"))
            })
    };
    let a = endpoint(first)?;
    let b = endpoint(second)?;

    match compute_segment_pose(&a, &b) {
        Ok(pose) => {
            scene.set_transform(stick.mesh, stick_transform(&pose, stick.built_length))?;
            Ok(true)
        }
        Err(e) => {
            if cfg!(debug_assertions) {
                panic!("stick for relation {:?}: {e}", stick.relation);
            }
            warn!(relation = ?stick.relation, error = %e, "Skipping stick redraw.");
            Ok(false)
        }
    }
}
