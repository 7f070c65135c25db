//! # Core Models Module
//!
//! Data structures describing the scene molecule: atoms with their elements and
//! rest positions, the pair relations (bonds and non-bonded distances) between
//! them, and the typed identifiers that tie everything together.
//!
//! ## Key Components
//!
//! - [`atom`] - Atom record and chemical element
//! - [`relation`] - Pair relation between two atoms and its kind
//! - [`molecule`] - The molecule container with ordered, keyed storage
//! - [`ids`] - Slot-map keys for atoms and relations
//! - [`sample`] - A scored energy snapshot and the display unit conversion
//!
//! ## Usage
//!
//! ```ignore
//! use molframe::core::models::{atom::{Atom, Element}, molecule::Molecule};
//! use molframe::core::models::relation::RelationKind;
//!
//! let mut molecule = Molecule::new();
//! let c = molecule.add_atom(Atom::new(1, Element::Carbon, Point3::origin(), 1.0)).unwrap();
//! let h = molecule.add_atom(Atom::new(2, Element::Hydrogen, Point3::new(1.1, 0.0, 0.0), 1.0)).unwrap();
//! molecule.add_relation(c, h, RelationKind::Bond, true);
//! ```

pub mod atom;
pub mod ids;
pub mod molecule;
pub mod relation;
pub mod sample;
