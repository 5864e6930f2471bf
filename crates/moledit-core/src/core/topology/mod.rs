//! # Topology Module
//!
//! Connectivity algorithms over a [`MoleculeGraph`](crate::core::models::molecule::MoleculeGraph).
//!
//! ## Key Components
//!
//! - [`fragment`] - Reachability with one bond excluded, used to decide which atoms
//!   move together during a geometry edit
//! - [`perception`] - Distance-based bond perception from covalent radii
//!
//! Neither module ever mutates adjacency lists to perform a traversal; an excluded
//! bond is filtered out while walking the graph.

pub mod fragment;
pub mod perception;
