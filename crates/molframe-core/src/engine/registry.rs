use super::physics::{BodyId, ConstraintId};
use super::scene::MeshId;
use crate::core::models::ids::{AtomId, RelationId};
use slotmap::SecondaryMap;
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RegistryError {
    #[error("Mesh {0:?} is already bound to a body")]
    MeshAlreadyBound(MeshId),
    #[error("Body {0:?} is already bound to a mesh")]
    BodyAlreadyBound(BodyId),
    #[error("Atom {0:?} is already bound")]
    AtomAlreadyBound(AtomId),
    #[error("Relation {0:?} already has a stick")]
    StickAlreadyRegistered(RelationId),
    #[error("Relation {0:?} already has a distance constraint")]
    ConstraintAlreadyRegistered(RelationId),
}

/// What a mesh/body pair represents in the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    Ground,
    Prop,
    Atom(AtomId),
}

/// One visual mesh mirroring exactly one physics body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binding {
    pub mesh: MeshId,
    pub body: BodyId,
    pub kind: BindingKind,
}

/// A bond stick and the relation it draws.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StickBinding {
    pub relation: RelationId,
    pub mesh: MeshId,
    pub endpoints: (AtomId, AtomId),
    /// Length of the stick geometry as built; the per-frame Y scale is
    /// `current_length / built_length`.
    pub built_length: f64,
}

/// Ordered mesh/body bindings plus the typed atom, stick and constraint lookups.
///
/// Bindings only grow during setup and keep registration order, which is the
/// order the synchronizer mirrors them in.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    bindings: Vec<Binding>,
    bound_meshes: HashSet<MeshId>,
    bound_bodies: HashSet<BodyId>,
    atom_bindings: SecondaryMap<AtomId, usize>,
    sticks: Vec<StickBinding>,
    stick_by_relation: SecondaryMap<RelationId, usize>,
    constraints: SecondaryMap<RelationId, ConstraintId>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_pair(
        &mut self,
        mesh: MeshId,
        body: BodyId,
        kind: BindingKind,
    ) -> Result<usize, RegistryError> {
        if self.bound_meshes.contains(&mesh) {
            return Err(RegistryError::MeshAlreadyBound(mesh));
        }
        if self.bound_bodies.contains(&body) {
            return Err(RegistryError::BodyAlreadyBound(body));
        }
        if let BindingKind::Atom(atom) = kind {
            if self.atom_bindings.contains_key(atom) {
                return Err(RegistryError::AtomAlreadyBound(atom));
            }
        }

        let index = self.bindings.len();
        self.bindings.push(Binding { mesh, body, kind });
        self.bound_meshes.insert(mesh);
        self.bound_bodies.insert(body);
        if let BindingKind::Atom(atom) = kind {
            self.atom_bindings.insert(atom, index);
        }

        debug_assert_eq!(self.mesh_count(), self.body_count());
        Ok(index)
    }

    pub fn register_stick(&mut self, stick: StickBinding) -> Result<usize, RegistryError> {
        if self.stick_by_relation.contains_key(stick.relation) {
            return Err(RegistryError::StickAlreadyRegistered(stick.relation));
        }
        let index = self.sticks.len();
        self.stick_by_relation.insert(stick.relation, index);
        self.sticks.push(stick);
        Ok(index)
    }

    pub fn register_constraint(
        &mut self,
        relation: RelationId,
        constraint: ConstraintId,
    ) -> Result<(), RegistryError> {
        if self.constraints.contains_key(relation) {
            return Err(RegistryError::ConstraintAlreadyRegistered(relation));
        }
        self.constraints.insert(relation, constraint);
        Ok(())
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    pub fn sticks(&self) -> &[StickBinding] {
        &self.sticks
    }

    pub fn mesh_count(&self) -> usize {
        self.bound_meshes.len()
    }

    pub fn body_count(&self) -> usize {
        self.bound_bodies.len()
    }

    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    pub fn atom_binding(&self, atom: AtomId) -> Option<&Binding> {
        self.atom_bindings.get(atom).map(|&i| &self.bindings[i])
    }

    pub fn body_for_atom(&self, atom: AtomId) -> Option<BodyId> {
        self.atom_binding(atom).map(|b| b.body)
    }

    pub fn mesh_for_atom(&self, atom: AtomId) -> Option<MeshId> {
        self.atom_binding(atom).map(|b| b.mesh)
    }

    pub fn stick_for_relation(&self, relation: RelationId) -> Option<&StickBinding> {
        self.stick_by_relation
            .get(relation)
            .map(|&i| &self.sticks[i])
    }

    pub fn constraint_for_relation(&self, relation: RelationId) -> Option<ConstraintId> {
        self.constraints.get(relation).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::{KeyData, SlotMap};

    fn key<K: From<KeyData>>(n: u64) -> K {
        K::from(KeyData::from_ffi(n))
    }

    #[test]
    fn register_pair_keeps_mesh_and_body_counts_equal() {
        let mut registry = Registry::new();
        registry
            .register_pair(key(1), key(1), BindingKind::Ground)
            .unwrap();
        registry
            .register_pair(key(2), key(2), BindingKind::Prop)
            .unwrap();
        assert_eq!(registry.mesh_count(), 2);
        assert_eq!(registry.body_count(), 2);
        assert_eq!(registry.bindings()[1].kind, BindingKind::Prop);
    }

    #[test]
    fn a_mesh_or_body_can_only_be_bound_once() {
        let mut registry = Registry::new();
        let mesh: MeshId = key(1);
        let body: BodyId = key(1);
        registry.register_pair(mesh, body, BindingKind::Ground).unwrap();

        assert_eq!(
            registry.register_pair(mesh, key(2), BindingKind::Prop),
            Err(RegistryError::MeshAlreadyBound(mesh))
        );
        assert_eq!(
            registry.register_pair(key(2), body, BindingKind::Prop),
            Err(RegistryError::BodyAlreadyBound(body))
        );
        assert_eq!(registry.mesh_count(), registry.body_count());
    }

    #[test]
    fn atom_lookups_resolve_through_binding() {
        let mut atoms: SlotMap<AtomId, ()> = SlotMap::with_key();
        let atom = atoms.insert(());
        let mut registry = Registry::new();
        let mesh: MeshId = key(5);
        let body: BodyId = key(7);
        registry
            .register_pair(mesh, body, BindingKind::Atom(atom))
            .unwrap();

        assert_eq!(registry.body_for_atom(atom), Some(body));
        assert_eq!(registry.mesh_for_atom(atom), Some(mesh));
        assert_eq!(
            registry.register_pair(key(6), key(8), BindingKind::Atom(atom)),
            Err(RegistryError::AtomAlreadyBound(atom))
        );
    }

    #[test]
    fn sticks_are_keyed_by_relation() {
        let mut relations: SlotMap<RelationId, ()> = SlotMap::with_key();
        let first = relations.insert(());
        let second = relations.insert(());
        let stick = StickBinding {
            relation: first,
            mesh: key(3),
            endpoints: (key(1), key(2)),
            built_length: 0.11,
        };

        let mut registry = Registry::new();
        registry.register_stick(stick).unwrap();
        assert_eq!(registry.stick_for_relation(first), Some(&stick));
        assert!(registry.stick_for_relation(second).is_none());
        assert_eq!(
            registry.register_stick(stick),
            Err(RegistryError::StickAlreadyRegistered(first))
        );
    }

    #[test]
    fn constraints_are_keyed_by_relation() {
        let mut relations: SlotMap<RelationId, ()> = SlotMap::with_key();
        let relation = relations.insert(());
        let constraint: ConstraintId = key(9);
        let mut registry = Registry::new();
        registry.register_constraint(relation, constraint).unwrap();
        assert_eq!(registry.constraint_for_relation(relation), Some(constraint));
        assert_eq!(
            registry.register_constraint(relation, constraint),
            Err(RegistryError::ConstraintAlreadyRegistered(relation))
        );
        assert_eq!(registry.constraint_count(), 1);
    }
}
