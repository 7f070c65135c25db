use super::ids::AtomId;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RelationKind {
    /// A covalent bond: constrained and drawn as a stick.
    #[default]
    Bond,
    /// A non-bonded distance relation: constrained but never drawn.
    NonBonded,
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Bond => "Bond",
                Self::NonBonded => "NonBonded",
            }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PairRelation {
    pub atom1_id: AtomId,
    pub atom2_id: AtomId,
    pub kind: RelationKind,
    /// How many table entries were folded into this relation.
    pub multiplicity: u32,
}

impl PairRelation {
    pub fn new(atom1_id: AtomId, atom2_id: AtomId, kind: RelationKind) -> Self {
        Self {
            atom1_id,
            atom2_id,
            kind,
            multiplicity: 1,
        }
    }

    #[inline]
    pub fn is_bond(&self) -> bool {
        self.kind == RelationKind::Bond
    }

    pub fn contains(&self, atom_id: AtomId) -> bool {
        self.atom1_id == atom_id || self.atom2_id == atom_id
    }

    /// Order-independent comparison of the two endpoints.
    pub fn connects(&self, a: AtomId, b: AtomId) -> bool {
        (self.atom1_id == a && self.atom2_id == b) || (self.atom1_id == b && self.atom2_id == a)
    }
}
