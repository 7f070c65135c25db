//! # Scene Collaborator
//!
//! Meshes are visual mirrors of physics bodies. The engine creates them once
//! during setup and afterwards only rewrites their [`Transform`]s, so a
//! [`SceneGraph`] needs nothing beyond insertion and transform access.

use nalgebra::{Point3, UnitQuaternion, Vector3};
use slotmap::{SlotMap, new_key_type};
use thiserror::Error;

new_key_type! {
    pub struct MeshId;
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SceneError {
    #[error("Mesh {0:?} does not exist in the scene")]
    UnknownMesh(MeshId),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Point3<f64>,
    pub orientation: UnitQuaternion<f64>,
    pub scale: Vector3<f64>,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Point3::origin(),
            orientation: UnitQuaternion::identity(),
            scale: Vector3::repeat(1.0),
        }
    }
}

impl Transform {
    pub fn from_position(position: Point3<f64>) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn with_orientation(mut self, orientation: UnitQuaternion<f64>) -> Self {
        self.orientation = orientation;
        self
    }

    /// Maps a point from mesh-local space into world space.
    pub fn apply(&self, local: &Point3<f64>) -> Point3<f64> {
        self.position + self.orientation * local.coords.component_mul(&self.scale)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MeshGeometry {
    Sphere {
        radius: f64,
        segments: u32,
    },
    /// Cylinder along local +Y. With `base_at_origin` the geometry spans
    /// `0..height` instead of being centered.
    Cylinder {
        radius: f64,
        height: f64,
        radial_segments: u32,
        base_at_origin: bool,
    },
    /// Rectangle in the local XY plane.
    Plane { width: f64, height: f64 },
}

impl MeshGeometry {
    /// Stick geometry spanning `0..length` along local +Y, so a stick placed at
    /// one endpoint and rotated onto the bond direction reaches the other end.
    pub fn stick(radius: f64, length: f64, radial_segments: u32) -> Self {
        Self::Cylinder {
            radius,
            height: length,
            radial_segments,
            base_at_origin: true,
        }
    }
}

/// Plain surface descriptor; colors are `0xRRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Material {
    pub color: u32,
    pub emissive: u32,
}

impl Material {
    pub const GROUND: Self = Self {
        color: 0x156289,
        emissive: 0x072534,
    };
    pub const PROP: Self = Self {
        color: 0xffffff,
        emissive: 0x072534,
    };
    pub const CARBON: Self = Self {
        color: 0x909090,
        emissive: 0x000000,
    };
    pub const HYDROGEN: Self = Self {
        color: 0xffffff,
        emissive: 0x000000,
    };
    pub const STICK: Self = Self {
        color: 0xffffff,
        emissive: 0x072534,
    };
}

#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub name: String,
    pub geometry: MeshGeometry,
    pub material: Material,
    pub transform: Transform,
}

impl Mesh {
    pub fn new(name: impl Into<String>, geometry: MeshGeometry, material: Material) -> Self {
        Self {
            name: name.into(),
            geometry,
            material,
            transform: Transform::default(),
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }
}

pub trait SceneGraph {
    fn add_mesh(&mut self, mesh: Mesh) -> MeshId;

    fn transform(&self, mesh: MeshId) -> Option<Transform>;

    fn set_transform(&mut self, mesh: MeshId, transform: Transform) -> Result<(), SceneError>;

    fn mesh_count(&self) -> usize;
}

/// Scene graph without a renderer; it only stores meshes.
#[derive(Debug, Clone, Default)]
pub struct HeadlessScene {
    meshes: SlotMap<MeshId, Mesh>,
}

impl HeadlessScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mesh(&self, mesh: MeshId) -> Option<&Mesh> {
        self.meshes.get(mesh)
    }

    pub fn meshes_iter(&self) -> impl Iterator<Item = (MeshId, &Mesh)> {
        self.meshes.iter()
    }
}

impl SceneGraph for HeadlessScene {
    fn add_mesh(&mut self, mesh: Mesh) -> MeshId {
        self.meshes.insert(mesh)
    }

    fn transform(&self, mesh: MeshId) -> Option<Transform> {
        self.meshes.get(mesh).map(|m| m.transform)
    }

    fn set_transform(&mut self, mesh: MeshId, transform: Transform) -> Result<(), SceneError> {
        let target = self
            .meshes
            .get_mut(mesh)
            .ok_or(SceneError::UnknownMesh(mesh))?;
        target.transform = transform;
        Ok(())
    }

    fn mesh_count(&self) -> usize {
        self.meshes.len()
    }
}
