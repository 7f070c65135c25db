use nalgebra::{Point3, Unit, UnitQuaternion, Vector3};
use std::f64::consts::PI;
use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum GeometryError {
    #[error("Segment endpoints are coincident at ({x}, {y}, {z})")]
    CoincidentEndpoints { x: f64, y: f64, z: f64 },
}

/// Maps atomic-unit coordinates into world space: `world = atomic * scale + translation`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub scale: f64,
    pub translation: Vector3<f64>,
}

impl Placement {
    pub fn new(scale: f64, translation: Vector3<f64>) -> Self {
        Self { scale, translation }
    }

    #[inline]
    pub fn to_world(&self, atomic: &Point3<f64>) -> Point3<f64> {
        Point3::from(atomic.coords * self.scale + self.translation)
    }

    /// Inverse of [`Placement::to_world`]. `scale` must be non-zero.
    #[inline]
    pub fn to_atomic(&self, world: &Point3<f64>) -> Point3<f64> {
        Point3::from((world.coords - self.translation) / self.scale)
    }
}

/// Rounds every coordinate to the given number of decimal places.
pub fn round_point(point: &Point3<f64>, decimals: i32) -> Point3<f64> {
    let factor = 10f64.powi(decimals);
    point.map(|c| (c * factor).round() / factor)
}

/// Pose of a stick spanning two points.
///
/// The stick mesh is built along local +Y with its origin at one end, so the
/// whole placement is: rotate by `orientation`, then translate to `origin`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentPose {
    pub length: f64,
    pub orientation: UnitQuaternion<f64>,
    pub origin: Point3<f64>,
}

impl SegmentPose {
    /// World-space direction of the stick's local +Y axis.
    pub fn axis(&self) -> Vector3<f64> {
        self.orientation * Vector3::y()
    }

    /// World-space position of the far end of the stick.
    pub fn tip(&self) -> Point3<f64> {
        self.origin + self.axis() * self.length
    }
}

/// Shortest-arc rotation taking +Y onto `direction`.
///
/// The antiparallel case has no unique shortest arc; a half turn about +X is used.
pub fn rotation_from_up(direction: &Unit<Vector3<f64>>) -> UnitQuaternion<f64> {
    UnitQuaternion::rotation_between(&Vector3::y(), direction.as_ref()).unwrap_or_else(|| {
        UnitQuaternion::from_axis_angle(&Vector3::x_axis(), PI)
    })
}

/// Computes the pose of a stick from `a` to `b`.
///
/// # Errors
///
/// Returns [`GeometryError::CoincidentEndpoints`] when `a` and `b` are equal,
/// where no direction (and so no orientation) exists.
pub fn compute_segment_pose(
    a: &Point3<f64>,
    b: &Point3<f64>,
) -> Result<SegmentPose, GeometryError> {
    let delta = b - a;
    let length = delta.norm();
    let direction = Unit::try_new(delta, 0.0).ok_or(GeometryError::CoincidentEndpoints {
        x: a.x,
        y: a.y,
        z: a.z,
    })?;
    Ok(SegmentPose {
        length,
        orientation: rotation_from_up(&direction),
        origin: *a,
    })
}

/// Dihedral angle p1-p2-p3-p4 in degrees, in `(-180, 180]`.
///
/// Uses n1 = |b1 x b2|, n2 = |b2 x b3|, m1 = n1 x |b2| and
/// `atan2(m1 . n2, n1 . n2)`. Collinear inputs give a zero normal and the
/// result is not meaningful (NaN propagates).
pub fn dihedral_degrees(
    p1: &Point3<f64>,
    p2: &Point3<f64>,
    p3: &Point3<f64>,
    p4: &Point3<f64>,
) -> f64 {
    let b1 = p2 - p1;
    let b2 = p3 - p2;
    let b3 = p4 - p3;

    let n1 = b1.cross(&b2).normalize();
    let n2 = b2.cross(&b3).normalize();
    let m1 = n1.cross(&b2.normalize());

    let x = n1.dot(&n2);
    let y = m1.dot(&n2);
    y.atan2(x).to_degrees()
}

pub fn calculate_rmsd(coords1: &[Point3<f64>], coords2: &[Point3<f64>]) -> Option<f64> {
    if coords1.len() != coords2.len() || coords1.is_empty() {
        return None;
    }
    let n = coords1.len() as f64;
    let squared_dist_sum: f64 = coords1
        .iter()
        .zip(coords2.iter())
        .map(|(p1, p2)| (p1 - p2).norm_squared())
        .sum();
    Some((squared_dist_sum / n).sqrt())
}
