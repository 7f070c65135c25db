//! # Core Module
//!
//! Stateless building blocks of molframe: the molecule data model, the static
//! geometry table the scene is built from, pure geometry routines and sample
//! export.
//!
//! ## Architecture
//!
//! - **Molecular Representation** ([`models`]) - Atoms, pair relations, the molecule
//!   container and scored energy samples
//! - **Geometry Table** ([`table`]) - The built-in 14-atom table and TOML table loading
//! - **Geometry** ([`utils`]) - Segment poses, dihedral angles, placement and RMSD
//! - **File I/O** ([`io`]) - CSV export of energy samples
//!
//! Nothing in this module owns simulation state; the [`crate::engine`] layer
//! drives these types frame by frame.

pub mod io;
pub mod models;
pub mod table;
pub mod utils;
