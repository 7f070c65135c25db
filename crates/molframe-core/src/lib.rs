//! # molframe Core Library
//!
//! Drives a small rigid-body scene holding a substituted ethane-like molecule,
//! mirrors physics state onto scene meshes every frame, keeps bond sticks
//! attached to their moving atoms and samples the molecule's energy against
//! its central dihedral angle through a remote scoring service.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer architecture:
//!
//! - **[`core`]: The Foundation.** Stateless data models (`Molecule`, `PairRelation`),
//!   the geometry table, pure geometry routines and sample export.
//!
//! - **[`engine`]: The Logic Core.** The stateful per-frame machinery. It defines the
//!   physics and scene collaborator traits with headless reference implementations,
//!   the mesh/body registry, the frame synchronizer and the throttled energy sampler.
//!
//! - **[`workflows`]: The Public API.** Ties `engine` and `core` together into a complete
//!   headless simulation run with progress reporting and a summary of the results.

pub mod core;
pub mod engine;
pub mod workflows;
