use super::atom::Atom;
use super::ids::{AtomId, RelationId};
use super::relation::{PairRelation, RelationKind};
use nalgebra::Point3;
use slotmap::SlotMap;
use std::collections::HashMap;

/// The molecule shown in the scene: atoms plus the pair relations between them.
///
/// Atoms and relations are stored in slot maps and referenced through typed
/// keys, so a relation always names its two endpoint atoms directly instead of
/// relying on the insertion order of parallel lists. Insertion order is still
/// tracked separately because the scoring service expects atoms in table order.
#[derive(Debug, Clone, Default)]
pub struct Molecule {
    /// Primary storage for atoms.
    atoms: SlotMap<AtomId, Atom>,
    /// Atom keys in table order.
    atom_order: Vec<AtomId>,
    /// Primary storage for pair relations.
    relations: SlotMap<RelationId, PairRelation>,
    /// Relation keys in table order.
    relation_order: Vec<RelationId>,
    /// Lookup map from 1-based table serial to atom key.
    serial_map: HashMap<usize, AtomId>,
}

impl Molecule {
    /// Creates a new, empty molecule.
    pub fn new() -> Self {
        Self::default()
    }

    /// Retrieves an immutable reference to an atom by its ID.
    pub fn atom(&self, id: AtomId) -> Option<&Atom> {
        self.atoms.get(id)
    }

    /// Returns atom IDs in table order.
    pub fn atom_ids(&self) -> &[AtomId] {
        &self.atom_order
    }

    /// Returns an iterator over all atoms in table order.
    pub fn atoms_iter(&self) -> impl Iterator<Item = (AtomId, &Atom)> {
        self.atom_order.iter().map(|&id| (id, &self.atoms[id]))
    }

    pub fn atom_count(&self) -> usize {
        self.atom_order.len()
    }

    /// Finds an atom by its 1-based serial number.
    pub fn find_atom_by_serial(&self, serial: usize) -> Option<AtomId> {
        self.serial_map.get(&serial).copied()
    }

    /// Retrieves a relation by its ID.
    pub fn relation(&self, id: RelationId) -> Option<&PairRelation> {
        self.relations.get(id)
    }

    /// Returns an iterator over all relations in table order.
    pub fn relations_iter(&self) -> impl Iterator<Item = (RelationId, &PairRelation)> {
        self.relation_order
            .iter()
            .map(|&id| (id, &self.relations[id]))
    }

    /// Returns an iterator over the bond relations in table order.
    pub fn bonds_iter(&self) -> impl Iterator<Item = (RelationId, &PairRelation)> {
        self.relations_iter().filter(|(_, relation)| relation.is_bond())
    }

    pub fn relation_count(&self) -> usize {
        self.relation_order.len()
    }

    pub fn bond_count(&self) -> usize {
        self.bonds_iter().count()
    }

    /// Adds an atom to the molecule.
    ///
    /// # Return
    ///
    /// Returns `None` if an atom with the same serial already exists.
    pub fn add_atom(&mut self, atom: Atom) -> Option<AtomId> {
        if self.serial_map.contains_key(&atom.serial) {
            return None;
        }
        let serial = atom.serial;
        let atom_id = self.atoms.insert(atom);
        self.atom_order.push(atom_id);
        self.serial_map.insert(serial, atom_id);
        Some(atom_id)
    }

    /// Adds a pair relation between two atoms.
    ///
    /// When `deduplicate` is set and a relation between the same unordered pair
    /// already exists, that relation absorbs the new entry: its multiplicity is
    /// incremented and a bond entry upgrades a non-bonded one. Otherwise every
    /// call creates a new relation, reproducing a table's duplicate entries.
    ///
    /// # Return
    ///
    /// Returns `None` if either atom does not exist or both IDs are the same.
    pub fn add_relation(
        &mut self,
        atom1_id: AtomId,
        atom2_id: AtomId,
        kind: RelationKind,
        deduplicate: bool,
    ) -> Option<RelationId> {
        if atom1_id == atom2_id
            || !self.atoms.contains_key(atom1_id)
            || !self.atoms.contains_key(atom2_id)
        {
            return None;
        }

        if deduplicate {
            if let Some(existing_id) = self.find_relation(atom1_id, atom2_id) {
                let relation = &mut self.relations[existing_id];
                relation.multiplicity += 1;
                if kind == RelationKind::Bond {
                    relation.kind = RelationKind::Bond;
                }
                return Some(existing_id);
            }
        }

        let relation_id = self
            .relations
            .insert(PairRelation::new(atom1_id, atom2_id, kind));
        self.relation_order.push(relation_id);
        Some(relation_id)
    }

    /// Finds the first relation connecting the given unordered pair.
    pub fn find_relation(&self, atom1_id: AtomId, atom2_id: AtomId) -> Option<RelationId> {
        self.relations_iter()
            .find(|(_, relation)| relation.connects(atom1_id, atom2_id))
            .map(|(id, _)| id)
    }

    /// Atomic numbers in table order, as sent to the scoring service.
    pub fn species(&self) -> Vec<u8> {
        self.atoms_iter()
            .map(|(_, atom)| atom.element.atomic_number())
            .collect()
    }

    /// Rest positions in table order, in atomic units.
    pub fn rest_positions(&self) -> Vec<Point3<f64>> {
        self.atoms_iter().map(|(_, atom)| atom.rest_position).collect()
    }
}
