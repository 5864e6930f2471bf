use super::ids::BondId;
use nalgebra::Point3;

/// Represents a single atom of an editable molecule.
///
/// The element symbol is stored as given by the caller after validation by the
/// element table. The list of incident bonds is maintained exclusively by
/// [`MoleculeGraph`](super::molecule::MoleculeGraph); it holds identities only and
/// never owns the bonds it refers to.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// The element symbol (e.g., "C", "Cl").
    pub element: String,
    /// The 3D coordinates of the atom in Angstroms.
    pub position: Point3<f64>,
    /// Whether the atom is part of the current user selection.
    pub selected: bool,
    /// Back-references to the bonds incident to this atom, in creation order.
    pub(crate) bonds: Vec<BondId>,
}

impl Atom {
    /// Creates a new, unselected and unbonded `Atom`.
    ///
    /// # Arguments
    ///
    /// * `element` - The element symbol of the atom.
    /// * `position` - The 3D coordinates of the atom.
    pub fn new(element: &str, position: Point3<f64>) -> Self {
        Self {
            element: element.to_string(),
            position,
            selected: false,
            bonds: Vec::new(),
        }
    }

    /// Returns the bonds incident to this atom.
    pub fn bonds(&self) -> &[BondId] {
        &self.bonds
    }

    /// Returns the number of bonds incident to this atom.
    pub fn degree(&self) -> usize {
        self.bonds.len()
    }
}
