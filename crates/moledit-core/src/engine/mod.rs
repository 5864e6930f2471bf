//! # Engine Module
//!
//! The stateful layer: everything that remembers something between two calls.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Editor tunables, builder and TOML loading
//! - **Error Handling** ([`error`]) - [`EditError`](error::EditError) and its kinds
//! - **History** ([`history`]) - Bounded snapshot undo/redo per molecule
//! - **Transactions** ([`transaction`]) - Run a mutation as one undoable step, reverting on failure
//! - **Clipboard** ([`clipboard`]) - Detached atom/bond templates and the smart paste offset
//! - **Sessions** ([`session`]) - Multiple molecules, the active one and the shared clipboard

pub mod clipboard;
pub mod config;
pub mod error;
pub mod history;
pub mod session;
pub mod transaction;
