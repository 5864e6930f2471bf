use crate::core::models::ids::AtomId;
use crate::core::models::molecule::{GraphError, MoleculeGraph};
use crate::core::models::topology::BondOrder;
use crate::core::utils::geometry::{bounding_sphere, centroid};
use nalgebra::{Point3, Vector3};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct ClipboardAtom {
    pub element: String,
    pub position: Point3<f64>,
}

/// A bond between two template atoms, by their index in the template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClipboardBond {
    pub first: usize,
    pub second: usize,
    pub order: BondOrder,
}

/// A detached template of atoms and the bonds among them.
///
/// Holds no ids of any live graph, so it can be pasted into any molecule.
#[derive(Debug, Clone, PartialEq)]
pub struct Clipboard {
    atoms: Vec<ClipboardAtom>,
    bonds: Vec<ClipboardBond>,
    center: Point3<f64>,
}

impl Clipboard {
    /// Copies the given atoms, in the given order, and every bond whose two
    /// endpoints are both among them. Bonds leaving the set are dropped.
    pub fn from_atoms(graph: &MoleculeGraph, ids: &[AtomId]) -> Result<Self, GraphError> {
        let index_of: HashMap<AtomId, usize> =
            ids.iter().enumerate().map(|(i, &id)| (id, i)).collect();

        let atoms = ids
            .iter()
            .map(|&id| {
                let atom = graph.atom(id).ok_or(GraphError::AtomNotFound(id))?;
                Ok(ClipboardAtom {
                    element: atom.element.clone(),
                    position: atom.position,
                })
            })
            .collect::<Result<Vec<_>, GraphError>>()?;

        let mut bonds = Vec::new();
        for (i, &id) in ids.iter().enumerate() {
            for (bond_id, neighbor) in graph.bonded_neighbors(id) {
                let Some(&j) = index_of.get(&neighbor) else {
                    continue;
                };
                if j <= i {
                    continue;
                }
                let bond = graph.bond(bond_id).ok_or(GraphError::BondNotFound(bond_id))?;
                bonds.push(ClipboardBond {
                    first: i,
                    second: j,
                    order: bond.order,
                });
            }
        }

        let positions: Vec<_> = atoms.iter().map(|a| a.position).collect();
        Ok(Self {
            center: centroid(&positions).unwrap_or_else(Point3::origin),
            atoms,
            bonds,
        })
    }

    /// Copies a whole molecule.
    pub fn from_graph(graph: &MoleculeGraph) -> Result<Self, GraphError> {
        Self::from_atoms(graph, graph.atom_ids())
    }

    pub fn atoms(&self) -> &[ClipboardAtom] {
        &self.atoms
    }

    pub fn bonds(&self) -> &[ClipboardBond] {
        &self.bonds
    }

    /// Unweighted centroid of the template atoms.
    pub fn center(&self) -> Point3<f64> {
        self.center
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    pub fn positions(&self) -> Vec<Point3<f64>> {
        self.atoms.iter().map(|a| a.position).collect()
    }

    /// Inserts the template into `graph`, shifted by `offset`.
    ///
    /// # Return
    ///
    /// The ids of the new atoms, in template order.
    pub fn paste_into(
        &self,
        graph: &mut MoleculeGraph,
        offset: &Vector3<f64>,
    ) -> Result<Vec<AtomId>, GraphError> {
        let new_ids: Vec<AtomId> = self
            .atoms
            .iter()
            .map(|atom| graph.add_atom(&atom.element, atom.position + *offset))
            .collect();
        for bond in &self.bonds {
            graph.add_bond(new_ids[bond.first], new_ids[bond.second], bond.order)?;
        }
        Ok(new_ids)
    }
}

/// Translation that moves `incoming` clear of `existing`.
///
/// Both point sets are wrapped in centroid-centred bounding spheres. The result is
/// the shortest shift along +X after which the sphere centres are at least
/// `r_incoming + r_existing + min_distance` apart. Returns zero when either set is
/// empty or the spheres are already far enough apart.
pub fn smart_offset(
    incoming: &[Point3<f64>],
    existing: &[Point3<f64>],
    min_distance: f64,
) -> Vector3<f64> {
    let (Some((c_in, r_in)), Some((c_ex, r_ex))) =
        (bounding_sphere(incoming), bounding_sphere(existing))
    else {
        return Vector3::zeros();
    };

    let required = r_in + r_ex + min_distance;
    let d = c_in - c_ex;
    if d.norm() >= required {
        return Vector3::zeros();
    }

    // Smallest t >= 0 with |d + t·x| = required.
    let shift = -d.x + (d.x * d.x - d.norm_squared() + required * required).sqrt();
    Vector3::new(shift.max(0.0), 0.0, 0.0)
}
