//! # Workflows Module
//!
//! High-level entry points that carry out a complete geometry edit on one
//! [`SessionEntry`](crate::engine::session::SessionEntry).
//!
//! - **Geometry Edits** ([`edit`]) - Bond length, bond angle and dihedral edits plus
//!   measurement queries. Angles cross this boundary in degrees.
//!
//! Every edit is validated before anything moves, applied as a single undoable step,
//! and reported as an [`EditOutcome`](edit::EditOutcome) carrying any degenerate-geometry
//! warnings.

pub mod edit;
