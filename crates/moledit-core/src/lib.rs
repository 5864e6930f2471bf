//! # MolEdit Core Library
//!
//! An interactive molecular geometry editing engine: set bond lengths, bond angles
//! and dihedral angles by exact rigid transforms, perceive bonds from covalent radii,
//! and manage several molecules with independent undo histories and a shared clipboard.
//!
//! ## Architectural Philosophy
//!
//! The library follows a strict three-layer architecture.
//!
//! - **[`core`]: The Foundation.** Stateless data models (`MoleculeGraph`), the
//!   element table, graph topology algorithms (fragment partitioning, bond
//!   perception) and pure geometry transforms.
//!
//! - **[`engine`]: The Stateful Layer.** Snapshot history, edit transactions, the
//!   clipboard with collision-avoiding paste, the multi-molecule session manager,
//!   configuration and error types.
//!
//! - **[`workflows`]: The Public API.** Complete geometry edits over a
//!   `SessionEntry`: selection validation, partitioning, transform, apply and
//!   history, reported as a typed outcome.
//!
//! Rendering, picking, file formats and force-field optimization are left to
//! collaborators; nothing here draws, parses or minimizes.

pub mod core;
pub mod engine;
pub mod workflows;
