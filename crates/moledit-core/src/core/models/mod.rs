//! # Core Models Module
//!
//! This module contains the fundamental data structures used to represent an
//! editable molecule in MolEdit.
//!
//! ## Overview
//!
//! Atoms and bonds live in dense slot-map arenas owned by a [`molecule::MoleculeGraph`].
//! Bonds refer to their endpoints by [`ids::AtomId`] and atoms keep back-references
//! to their incident bonds by [`ids::BondId`], so there are no ownership cycles and a
//! full copy of a molecule is a plain data clone.
//!
//! ## Key Components
//!
//! - [`atom`] - Atom representation with element, position and selection state
//! - [`topology`] - Bonds and bond orders
//! - [`molecule`] - The molecule graph with its mutation primitives and lookups
//! - [`ids`] - Stable identifier types for atoms and bonds
//!
//! ## Usage
//!
//! ```ignore
//! use moledit::core::models::{molecule::MoleculeGraph, topology::BondOrder};
//! use nalgebra::Point3;
//!
//! let mut graph = MoleculeGraph::new();
//! let c1 = graph.add_atom("C", Point3::new(0.0, 0.0, 0.0));
//! let c2 = graph.add_atom("C", Point3::new(1.5, 0.0, 0.0));
//! graph.add_bond(c1, c2, BondOrder::Single)?;
//! ```

pub mod atom;
pub mod ids;
pub mod molecule;
pub mod topology;
