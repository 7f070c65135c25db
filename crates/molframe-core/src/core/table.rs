use super::models::atom::{Atom, Element, ParseElementError};
use super::models::molecule::Molecule;
use super::models::relation::RelationKind;
use nalgebra::Point3;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Mass given to atoms that are free to move.
pub const DEFAULT_ATOM_MASS: f64 = 1.0;

/// Serial numbers of the two central carbons held fixed in the built-in scene.
pub const BUILTIN_PIVOT_SERIALS: [usize; 2] = [2, 3];

/// Rest geometry of the built-in molecule, in Angstroms.
///
/// Four carbons in a chain followed by ten hydrogens: C1 carries H5-H7,
/// C2 carries H8-H9, C3 carries H10-H11 and C4 carries H12-H14.
const BUILTIN_ATOMS: [(Element, [f64; 3]); 14] = [
    (Element::Carbon, [1.92, -0.137, 0.0]),
    (Element::Carbon, [0.546, 0.536, 0.0]),
    (Element::Carbon, [-0.546, -0.536, 0.0]),
    (Element::Carbon, [-1.92, 0.137, 0.0]),
    (Element::Hydrogen, [2.021, -0.759, 0.89]),
    (Element::Hydrogen, [2.021, -0.759, -0.89]),
    (Element::Hydrogen, [2.699, 0.626, 0.0]),
    (Element::Hydrogen, [0.446, 1.157, 0.89]),
    (Element::Hydrogen, [0.446, 1.157, -0.89]),
    (Element::Hydrogen, [-0.446, -1.157, -0.89]),
    (Element::Hydrogen, [-0.446, -1.157, 0.89]),
    (Element::Hydrogen, [-2.021, 0.759, 0.89]),
    (Element::Hydrogen, [-2.021, 0.759, -0.89]),
    (Element::Hydrogen, [-2.699, -0.626, 0.0]),
];

/// Pair relations of the built-in molecule as `(a, b, is_bond)`, 1-based.
///
/// The table lists every bond in both directions, so only 13 of its 26 bond
/// entries are distinct pairs.
const BUILTIN_RELATIONS: [(usize, usize, bool); 48] = [
    (1, 2, true),
    (1, 5, true),
    (1, 6, true),
    (1, 7, true),
    (2, 1, true),
    (2, 3, true),
    (2, 8, true),
    (2, 9, true),
    (3, 2, true),
    (3, 4, true),
    (3, 10, true),
    (3, 11, true),
    (4, 3, true),
    (4, 12, true),
    (4, 13, true),
    (4, 14, true),
    (5, 1, true),
    (6, 1, true),
    (7, 1, true),
    (8, 2, true),
    (9, 2, true),
    (10, 3, true),
    (11, 3, true),
    (12, 4, true),
    (13, 4, true),
    (14, 4, true),
    (5, 6, false),
    (6, 7, false),
    (5, 7, false),
    (2, 5, false),
    (2, 6, false),
    (2, 7, false),
    (2, 4, false),
    (2, 10, false),
    (2, 11, false),
    (12, 13, false),
    (13, 14, false),
    (12, 14, false),
    (3, 12, false),
    (3, 13, false),
    (3, 14, false),
    (3, 9, false),
    (3, 8, false),
    (3, 1, false),
    (1, 8, false),
    (1, 9, false),
    (4, 10, false),
    (4, 11, false),
];

#[derive(Debug, Clone, PartialEq)]
pub struct AtomRecord {
    pub element: Element,
    pub position: Point3<f64>,
    pub mass: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RelationRecord {
    /// 1-based serial of the first atom.
    pub a: usize,
    /// 1-based serial of the second atom.
    pub b: usize,
    /// Whether the relation is a drawn bond.
    pub bond: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawAtomRecord {
    element: String,
    position: [f64; 3],
    mass: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTable {
    atoms: Vec<RawAtomRecord>,
    #[serde(default)]
    relations: Vec<RelationRecord>,
}

/// The static description of a molecule: atom rest positions and pair relations.
///
/// Atom serials are implied by position in `atoms` (first atom is serial 1).
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryTable {
    pub atoms: Vec<AtomRecord>,
    pub relations: Vec<RelationRecord>,
}

impl GeometryTable {
    /// The tetra-substituted ethane-like molecule shipped with the program.
    pub fn builtin() -> Self {
        let atoms = BUILTIN_ATOMS
            .iter()
            .enumerate()
            .map(|(index, &(element, [x, y, z]))| AtomRecord {
                element,
                position: Point3::new(x, y, z),
                mass: if BUILTIN_PIVOT_SERIALS.contains(&(index + 1)) {
                    0.0
                } else {
                    DEFAULT_ATOM_MASS
                },
            })
            .collect();
        let relations = BUILTIN_RELATIONS
            .iter()
            .map(|&(a, b, bond)| RelationRecord { a, b, bond })
            .collect();
        Self { atoms, relations }
    }

    pub fn load(path: &Path) -> Result<Self, TableLoadError> {
        let content = std::fs::read_to_string(path).map_err(|e| TableLoadError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        let raw: RawTable = toml::from_str(&content).map_err(|e| TableLoadError::Toml {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        Self::from_raw(raw)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, TableLoadError> {
        let raw: RawTable = toml::from_str(content).map_err(|e| TableLoadError::Toml {
            path: "<inline>".to_string(),
            source: e,
        })?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawTable) -> Result<Self, TableLoadError> {
        let atoms = raw
            .atoms
            .into_iter()
            .map(|record| {
                let [x, y, z] = record.position;
                Ok(AtomRecord {
                    element: record.element.parse()?,
                    position: Point3::new(x, y, z),
                    mass: record.mass.unwrap_or(DEFAULT_ATOM_MASS),
                })
            })
            .collect::<Result<Vec<_>, TableLoadError>>()?;
        let table = Self {
            atoms,
            relations: raw.relations,
        };
        table.validate()?;
        Ok(table)
    }

    /// Checks that every relation names two distinct, existing atoms.
    pub fn validate(&self) -> Result<(), TableLoadError> {
        if self.atoms.is_empty() {
            return Err(TableLoadError::Empty);
        }
        for (index, record) in self.relations.iter().enumerate() {
            let in_range = |serial: usize| serial >= 1 && serial <= self.atoms.len();
            if !in_range(record.a) || !in_range(record.b) {
                return Err(TableLoadError::RelationOutOfRange {
                    index,
                    a: record.a,
                    b: record.b,
                    atom_count: self.atoms.len(),
                });
            }
            if record.a == record.b {
                return Err(TableLoadError::SelfRelation {
                    index,
                    serial: record.a,
                });
            }
        }
        if let Some(index) = self
            .atoms
            .iter()
            .position(|atom| !atom.mass.is_finite() || atom.mass < 0.0)
        {
            return Err(TableLoadError::InvalidMass { serial: index + 1 });
        }
        Ok(())
    }

    pub fn bond_entry_count(&self) -> usize {
        self.relations.iter().filter(|r| r.bond).count()
    }

    /// Builds the molecule model described by this table.
    ///
    /// With `deduplicate` set, reversed or repeated pairs collapse into one
    /// relation; otherwise every table entry becomes its own relation.
    pub fn to_molecule(&self, deduplicate: bool) -> Result<Molecule, TableLoadError> {
        self.validate()?;
        let mut molecule = Molecule::new();
        let mut ids = Vec::with_capacity(self.atoms.len());
        for (index, record) in self.atoms.iter().enumerate() {
            let atom = Atom::new(index + 1, record.element, record.position, record.mass);
            let id = molecule
                .add_atom(atom)
                .ok_or(TableLoadError::Internal("duplicate atom serial"))?;
            ids.push(id);
        }
        for record in &self.relations {
            let kind = if record.bond {
                RelationKind::Bond
            } else {
                RelationKind::NonBonded
            };
            molecule
                .add_relation(ids[record.a - 1], ids[record.b - 1], kind, deduplicate)
                .ok_or(TableLoadError::Internal("relation endpoints missing"))?;
        }
        Ok(molecule)
    }
}

impl Default for GeometryTable {
    fn default() -> Self {
        Self::builtin()
    }
}

#[derive(Debug, Error)]
pub enum TableLoadError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
    #[error(transparent)]
    Element(#[from] ParseElementError),
    #[error("Geometry table contains no atoms")]
    Empty,
    #[error("Relation #{index} ({a}, {b}) refers to an atom outside 1..={atom_count}")]
    RelationOutOfRange {
        index: usize,
        a: usize,
        b: usize,
        atom_count: usize,
    },
    #[error("Relation #{index} connects atom {serial} to itself")]
    SelfRelation { index: usize, serial: usize },
    #[error("Atom {serial} has a negative or non-finite mass")]
    InvalidMass { serial: usize },
    #[error("Internal table error: {0}")]
    Internal(&'static str),
}
