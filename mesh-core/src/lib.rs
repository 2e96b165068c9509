//! Core procedural mesh growth simulation library.
//!
//! Main components:
//! - [`mesh`] — vertices, edges, faces and the derived edge map.
//! - [`geometry`] — segment/triangle proximity tests and bounding boxes.
//! - [`grid`] — uniform spatial hash grid for broad-phase queries.
//! - [`collision`] — self-collision detection and repulsion response.
//! - [`growth`] — boundary extrusion, integration and length constraints.
//! - [`subdivision`] — quad-based topology refinement.
//! - [`sim`] — the owning simulation state and per-frame pipeline.
//! - [`config`] — global configuration for the growth engine.
//! - [`types`] — shared type aliases and the canonical edge key.

pub mod collision;
pub mod config;
pub mod geometry;
pub mod grid;
pub mod growth;
pub mod mesh;
pub mod sim;
pub mod subdivision;
pub mod types;
