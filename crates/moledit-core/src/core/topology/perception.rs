use crate::core::elements::ElementTable;
use crate::core::models::molecule::MoleculeGraph;
use crate::core::models::topology::BondOrder;
use crate::core::utils::geometry::distance;
use nalgebra::Point3;

#[cfg(not(feature = "parallel"))]
use itertools::Itertools;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Per-atom input for bond perception: position and covalent radius, if known.
pub type PerceptionAtom = (Point3<f64>, Option<f64>);

/// Returns `true` if two atoms are close enough to be considered bonded.
///
/// The cutoff is `(r1 + r2) * threshold_factor` and the comparison is strict, so a
/// pair exactly at the cutoff is not bonded. Atoms without a known radius never bond.
pub fn within_bonding_distance(a: &PerceptionAtom, b: &PerceptionAtom, threshold_factor: f64) -> bool {
    match (a.1, b.1) {
        (Some(r1), Some(r2)) => distance(&a.0, &b.0) < (r1 + r2) * threshold_factor,
        _ => false,
    }
}

/// Finds all index pairs `(i, j)`, `i < j`, within bonding distance, in ascending order.
pub fn find_bond_candidates(atoms: &[PerceptionAtom], threshold_factor: f64) -> Vec<(usize, usize)> {
    #[cfg(not(feature = "parallel"))]
    let candidates: Vec<(usize, usize)> = (0..atoms.len())
        .tuple_combinations()
        .filter(|&(i, j)| within_bonding_distance(&atoms[i], &atoms[j], threshold_factor))
        .collect();

    #[cfg(feature = "parallel")]
    let candidates: Vec<(usize, usize)> = {
        let mut pairs: Vec<(usize, usize)> = (0..atoms.len())
            .into_par_iter()
            .flat_map_iter(|i| {
                (i + 1..atoms.len())
                    .filter(move |&j| within_bonding_distance(&atoms[i], &atoms[j], threshold_factor))
                    .map(move |j| (i, j))
            })
            .collect();
        pairs.sort_unstable();
        pairs
    };

    candidates
}

/// Adds a single bond between every unbonded pair of atoms within bonding distance.
///
/// Pairs are visited in ascending external-index order, so repeated runs over the
/// same geometry produce the same bond set.
///
/// # Return
///
/// The number of bonds added; existing bonds are left untouched and not counted.
pub fn auto_bond(graph: &mut MoleculeGraph, elements: &ElementTable, threshold_factor: f64) -> usize {
    let ids = graph.atom_ids().to_vec();
    let atoms: Vec<PerceptionAtom> = graph
        .atoms_iter()
        .map(|(_, atom)| (atom.position, elements.covalent_radius(&atom.element)))
        .collect();

    let mut added = 0;
    for (i, j) in find_bond_candidates(&atoms, threshold_factor) {
        if graph.get_bond(ids[i], ids[j]).is_some() {
            continue;
        }
        if graph.add_bond(ids[i], ids[j], BondOrder::Single).is_ok() {
            added += 1;
        }
    }
    added
}
