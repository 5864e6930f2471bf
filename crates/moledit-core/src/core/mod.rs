//! # Core Module
//!
//! Stateless building blocks for molecular geometry editing.
//!
//! ## Architecture
//!
//! - **Molecular Representation** ([`models`]) - Atoms, bonds and the [`MoleculeGraph`](models::molecule::MoleculeGraph)
//!   arena that keeps adjacency consistent under removal
//! - **Element Data** ([`elements`]) - Symbol validation and covalent radii
//! - **Connectivity** ([`topology`]) - Fragment partitioning and distance-based bond perception
//! - **Geometry** ([`utils`]) - Measurements and the pure length/angle/dihedral transforms
//!
//! Nothing in this module records history or logs; those concerns live in
//! [`crate::engine`].

pub mod elements;
pub mod models;
pub mod topology;
pub mod utils;
