//! # Engine Module
//!
//! The stateful, per-frame half of molframe. It builds a scene from a
//! geometry table, advances it through an external physics collaborator and
//! keeps the visual side in step.
//!
//! ## Overview
//!
//! A frame is: merge finished scoring results, step the physics world by a
//! fixed timestep, mirror bodies into meshes (with velocity damping), move
//! hand proxies and re-derive every bond stick, then, when the throttle
//! allows, snapshot the molecule for scoring.
//!
//! ## Architecture
//!
//! - **Collaborators** ([`physics`], [`scene`]) - The `PhysicsWorld` and `SceneGraph`
//!   traits plus their headless reference implementations
//! - **Bindings** ([`registry`]) - Mesh/body pairs and the typed relation, stick and
//!   constraint lookups
//! - **Frame Synchronizer** ([`sync`], [`hands`]) - Per-frame mirroring, damping, hand
//!   proxies and stick poses
//! - **Energy Sampler** ([`sampler`]) - Throttled snapshots, asynchronous scoring and the
//!   bounded sample buffer
//! - **Setup** ([`context`], [`config`]) - Scene construction and its parameters
//! - **Error Handling** ([`error`]) and **Progress Monitoring** ([`progress`])

pub mod config;
pub mod context;
pub mod error;
pub mod hands;
pub mod physics;
pub mod progress;
pub mod registry;
pub mod sampler;
pub mod scene;
pub mod sync;
