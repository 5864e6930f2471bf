use thiserror::Error;

use crate::core::models::ids::AtomId;
use crate::core::models::molecule::GraphError;

/// Every way an edit can be rejected. A rejected edit never mutates the molecule
/// and never records a history step.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EditError {
    #[error("{operation} requires {expected} selected atoms, got {actual}")]
    InvalidSelection {
        operation: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Selection for {operation} contains the same atom more than once")]
    RepeatedAtom { operation: &'static str },

    #[error("Target value must be finite, got {value}")]
    NonFiniteTarget { value: f64 },

    #[error("Target value {value} is outside the allowed range [{min}, {max}]")]
    TargetOutOfRange { value: f64, min: f64, max: f64 },

    #[error("Atoms {first:?} and {second:?} are not bonded")]
    MissingBond { first: AtomId, second: AtomId },

    #[error("Measurement is undefined for the selected geometry")]
    UndefinedMeasurement,

    #[error("Unknown element symbol: '{0}'")]
    UnknownElement(String),

    #[error("Invalid value for '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("A molecule named '{0}' already exists")]
    DuplicateName(String),

    #[error("Molecule names must not be empty")]
    EmptyName,

    #[error("Cannot remove the last remaining molecule")]
    LastMolecule,

    #[error("Molecule index {index} is out of range (session holds {len})")]
    MoleculeIndexOutOfRange { index: usize, len: usize },

    #[error("Cannot merge a molecule into itself")]
    MergeIntoSelf,

    #[error("No atoms are selected")]
    EmptySelection,

    #[error("The clipboard is empty")]
    EmptyClipboard,

    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// The kind of an [`EditError`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditErrorKind {
    InvalidSelection,
    RepeatedAtom,
    NonFiniteTarget,
    TargetOutOfRange,
    MissingBond,
    UndefinedMeasurement,
    UnknownElement,
    InvalidParameter,
    DuplicateName,
    EmptyName,
    LastMolecule,
    MoleculeIndexOutOfRange,
    MergeIntoSelf,
    EmptySelection,
    EmptyClipboard,
    Graph,
}

impl EditError {
    pub fn kind(&self) -> EditErrorKind {
        match self {
            Self::InvalidSelection { .. } => EditErrorKind::InvalidSelection,
            Self::RepeatedAtom { .. } => EditErrorKind::RepeatedAtom,
            Self::NonFiniteTarget { .. } => EditErrorKind::NonFiniteTarget,
            Self::TargetOutOfRange { .. } => EditErrorKind::TargetOutOfRange,
            Self::MissingBond { .. } => EditErrorKind::MissingBond,
            Self::UndefinedMeasurement => EditErrorKind::UndefinedMeasurement,
            Self::UnknownElement(_) => EditErrorKind::UnknownElement,
            Self::InvalidParameter { .. } => EditErrorKind::InvalidParameter,
            Self::DuplicateName(_) => EditErrorKind::DuplicateName,
            Self::EmptyName => EditErrorKind::EmptyName,
            Self::LastMolecule => EditErrorKind::LastMolecule,
            Self::MoleculeIndexOutOfRange { .. } => EditErrorKind::MoleculeIndexOutOfRange,
            Self::MergeIntoSelf => EditErrorKind::MergeIntoSelf,
            Self::EmptySelection => EditErrorKind::EmptySelection,
            Self::EmptyClipboard => EditErrorKind::EmptyClipboard,
            Self::Graph(_) => EditErrorKind::Graph,
        }
    }
}
