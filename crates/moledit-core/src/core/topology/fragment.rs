use crate::core::models::ids::{AtomId, BondId};
use crate::core::models::molecule::MoleculeGraph;
use std::collections::{HashSet, VecDeque};

/// Collects every atom reachable from `seed` without traversing `excluded_bond`.
///
/// The excluded bond is only skipped for the duration of this call; the graph is
/// borrowed immutably and never changes. If the excluded bond lies on a ring the
/// traversal walks around the ring and returns the whole connected component.
///
/// # Return
///
/// The reachable set, including `seed` itself. Empty if `seed` is not in the graph.
pub fn partition(
    graph: &MoleculeGraph,
    seed: AtomId,
    excluded_bond: Option<BondId>,
) -> HashSet<AtomId> {
    let mut visited = HashSet::new();
    if !graph.contains_atom(seed) {
        return visited;
    }

    let mut queue = VecDeque::from([seed]);
    visited.insert(seed);

    while let Some(current) = queue.pop_front() {
        for (bond_id, neighbor) in graph.bonded_neighbors(current) {
            if Some(bond_id) == excluded_bond {
                continue;
            }
            if visited.insert(neighbor) {
                queue.push_back(neighbor);
            }
        }
    }

    visited
}

/// The connected component containing `seed`.
pub fn connected_component(graph: &MoleculeGraph, seed: AtomId) -> HashSet<AtomId> {
    partition(graph, seed, None)
}

/// Returns `true` if removing `bond_id` would leave its endpoints connected,
/// i.e. the bond is part of a ring. `None` if the bond does not exist.
pub fn is_ring_bond(graph: &MoleculeGraph, bond_id: BondId) -> Option<bool> {
    let bond = graph.bond(bond_id)?;
    Some(partition(graph, bond.atom2_id, Some(bond_id)).contains(&bond.atom1_id))
}

/// Orders a fragment set by external index so that positions can be gathered and
/// written back deterministically.
pub fn ordered(graph: &MoleculeGraph, fragment: &HashSet<AtomId>) -> Vec<AtomId> {
    graph
        .atom_ids()
        .iter()
        .copied()
        .filter(|id| fragment.contains(id))
        .collect()
}
