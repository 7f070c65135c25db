//! # Workflows Module
//!
//! High-level entry points that tie [`crate::engine`] and [`crate::core`]
//! together into complete runs.
//!
//! - **Simulation Workflow** ([`simulate`]) - Builds the scene, drives the frame loop
//!   for a fixed number of frames while sampling energies, drains outstanding
//!   scoring requests and summarizes the run.
//! - **Scoring Workflow** ([`score`]) - Scores a single geometry once, outside any frame
//!   loop.

pub mod score;
pub mod simulate;
