use super::atom::Atom;
use super::ids::{AtomId, BondId};
use super::topology::{Bond, BondOrder};
use nalgebra::{Point3, Vector3};
use slotmap::SlotMap;
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("Atom {0:?} does not exist in this molecule")]
    AtomNotFound(AtomId),
    #[error("Bond {0:?} does not exist in this molecule")]
    BondNotFound(BondId),
    #[error("An atom cannot be bonded to itself")]
    SelfBond,
    #[error("A bond already exists between atoms {0:?} and {1:?}")]
    DuplicateBond(AtomId, AtomId),
}

/// The atom/bond graph of a single editable molecule.
///
/// Atoms and bonds are stored in slot-map arenas. Bonds reference their endpoints
/// by [`AtomId`] and every atom keeps the ids of its incident bonds, so each bond
/// appears in exactly the adjacency lists of its two endpoints.
///
/// Insertion order of atoms is significant: the position of an atom in that order
/// is its external index, as used by console and UI collaborators. Removing an
/// atom shifts the external index of every later atom; [`AtomId`]s are unaffected.
#[derive(Debug, Clone, Default)]
pub struct MoleculeGraph {
    /// Primary storage for atoms.
    atoms: SlotMap<AtomId, Atom>,
    /// Atom ids in insertion order; the position in this list is the external index.
    order: Vec<AtomId>,
    /// Primary storage for bonds.
    bonds: SlotMap<BondId, Bond>,
}

impl MoleculeGraph {
    /// Creates a new, empty molecule graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Retrieves an immutable reference to an atom by its ID.
    ///
    /// # Arguments
    ///
    /// * `id` - The atom ID to look up.
    ///
    /// # Return
    ///
    /// Returns `Some(&Atom)` if the atom exists, otherwise `None`.
    pub fn atom(&self, id: AtomId) -> Option<&Atom> {
        self.atoms.get(id)
    }

    /// Retrieves a mutable reference to an atom by its ID.
    ///
    /// Only the element, position and selection state can be changed through the
    /// returned reference; bond bookkeeping stays with the graph.
    pub fn atom_mut(&mut self, id: AtomId) -> Option<&mut Atom> {
        self.atoms.get_mut(id)
    }

    /// Retrieves a bond by its ID.
    pub fn bond(&self, id: BondId) -> Option<&Bond> {
        self.bonds.get(id)
    }

    pub fn contains_atom(&self, id: AtomId) -> bool {
        self.atoms.contains_key(id)
    }

    pub fn atom_count(&self) -> usize {
        self.order.len()
    }

    pub fn bond_count(&self) -> usize {
        self.bonds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Returns all atom IDs in insertion (external index) order.
    pub fn atom_ids(&self) -> &[AtomId] {
        &self.order
    }

    /// Returns an iterator over all atoms in insertion order.
    ///
    /// # Return
    ///
    /// An iterator yielding `(AtomId, &Atom)` pairs.
    pub fn atoms_iter(&self) -> impl Iterator<Item = (AtomId, &Atom)> {
        self.order
            .iter()
            .filter_map(|&id| self.atoms.get(id).map(|atom| (id, atom)))
    }

    /// Returns an iterator over all bonds.
    pub fn bonds_iter(&self) -> impl Iterator<Item = (BondId, &Bond)> {
        self.bonds.iter()
    }

    /// Returns the positions of all atoms in insertion order.
    pub fn positions(&self) -> Vec<Point3<f64>> {
        self.atoms_iter().map(|(_, atom)| atom.position).collect()
    }

    /// Returns the external index of an atom, i.e. its position in insertion order.
    ///
    /// Indices are only valid until the next atom removal; re-resolve them afterwards.
    pub fn index_of(&self, id: AtomId) -> Option<usize> {
        self.order.iter().position(|&candidate| candidate == id)
    }

    /// Resolves an external index back to an atom ID.
    pub fn atom_at(&self, index: usize) -> Option<AtomId> {
        self.order.get(index).copied()
    }

    /// Adds a new, unselected atom to the end of the molecule.
    ///
    /// Element symbols are not validated here; callers are expected to have run
    /// them through the element table first.
    pub fn add_atom(&mut self, element: &str, position: Point3<f64>) -> AtomId {
        let atom_id = self.atoms.insert(Atom::new(element, position));
        self.order.push(atom_id);
        atom_id
    }

    /// Adds a bond between two distinct atoms.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::SelfBond`] if `atom1_id == atom2_id`,
    /// [`GraphError::AtomNotFound`] if either atom is missing and
    /// [`GraphError::DuplicateBond`] if the pair is already bonded.
    pub fn add_bond(
        &mut self,
        atom1_id: AtomId,
        atom2_id: AtomId,
        order: BondOrder,
    ) -> Result<BondId, GraphError> {
        if atom1_id == atom2_id {
            return Err(GraphError::SelfBond);
        }
        for id in [atom1_id, atom2_id] {
            if !self.atoms.contains_key(id) {
                return Err(GraphError::AtomNotFound(id));
            }
        }
        if self.get_bond(atom1_id, atom2_id).is_some() {
            return Err(GraphError::DuplicateBond(atom1_id, atom2_id));
        }

        let bond_id = self.bonds.insert(Bond::new(atom1_id, atom2_id, order));
        for id in [atom1_id, atom2_id] {
            if let Some(atom) = self.atoms.get_mut(id) {
                atom.bonds.push(bond_id);
            }
        }
        Ok(bond_id)
    }

    /// Finds the bond joining two atoms by scanning the first atom's adjacency list.
    pub fn get_bond(&self, atom1_id: AtomId, atom2_id: AtomId) -> Option<BondId> {
        self.atoms.get(atom1_id)?.bonds.iter().copied().find(|&bond_id| {
            self.bonds
                .get(bond_id)
                .is_some_and(|bond| bond.connects(atom1_id, atom2_id))
        })
    }

    /// Removes a bond from the arena and from both endpoints' adjacency lists.
    pub fn remove_bond(&mut self, bond_id: BondId) -> Option<Bond> {
        let bond = self.bonds.remove(bond_id)?;
        for id in [bond.atom1_id, bond.atom2_id] {
            if let Some(atom) = self.atoms.get_mut(id) {
                atom.bonds.retain(|&candidate| candidate != bond_id);
            }
        }
        Some(bond)
    }

    /// Removes an atom together with every bond incident to it.
    ///
    /// All incident bonds are detached from both endpoints before the atom itself
    /// is dropped, within this single call, so no dangling bond is ever observable.
    ///
    /// # Return
    ///
    /// Returns `Some(Atom)` if the atom existed and was removed, otherwise `None`.
    /// The returned atom carries an empty bond list.
    pub fn remove_atom(&mut self, atom_id: AtomId) -> Option<Atom> {
        let incident = self.atoms.get(atom_id)?.bonds.clone();
        for bond_id in incident {
            self.remove_bond(bond_id);
        }

        self.order.retain(|&id| id != atom_id);
        self.atoms.remove(atom_id)
    }

    /// Removes a batch of atoms together with their incident bonds.
    ///
    /// Equivalent to calling [`remove_atom`](Self::remove_atom) for each id, but the
    /// display order is compacted in a single pass. Missing and repeated ids are skipped.
    ///
    /// # Return
    ///
    /// Returns the number of atoms actually removed.
    pub fn remove_atoms(&mut self, atom_ids: &[AtomId]) -> usize {
        let mut removed = HashSet::with_capacity(atom_ids.len());
        for &atom_id in atom_ids {
            let Some(atom) = self.atoms.get(atom_id) else {
                continue;
            };
            let incident = atom.bonds.clone();
            for bond_id in incident {
                self.remove_bond(bond_id);
            }
            self.atoms.remove(atom_id);
            removed.insert(atom_id);
        }

        if !removed.is_empty() {
            self.order.retain(|id| !removed.contains(id));
        }
        removed.len()
    }

    /// Removes every atom and bond.
    pub fn clear(&mut self) {
        self.atoms.clear();
        self.order.clear();
        self.bonds.clear();
    }

    /// Returns an iterator over `(bond, neighbor)` pairs for the given atom.
    pub fn bonded_neighbors(&self, atom_id: AtomId) -> impl Iterator<Item = (BondId, AtomId)> + '_ {
        self.atoms
            .get(atom_id)
            .into_iter()
            .flat_map(move |atom| {
                atom.bonds.iter().filter_map(move |&bond_id| {
                    self.bonds
                        .get(bond_id)
                        .and_then(|bond| bond.partner(atom_id))
                        .map(|neighbor| (bond_id, neighbor))
                })
            })
    }

    /// Returns the position of an atom.
    pub fn position(&self, atom_id: AtomId) -> Result<Point3<f64>, GraphError> {
        self.atoms
            .get(atom_id)
            .map(|atom| atom.position)
            .ok_or(GraphError::AtomNotFound(atom_id))
    }

    /// Writes a batch of new positions.
    ///
    /// Every id is checked before any position changes, so either all updates are
    /// applied or none is.
    pub fn apply_positions(&mut self, updates: &[(AtomId, Point3<f64>)]) -> Result<(), GraphError> {
        if let Some(&(missing, _)) = updates
            .iter()
            .find(|(id, _)| !self.atoms.contains_key(*id))
        {
            return Err(GraphError::AtomNotFound(missing));
        }
        for &(id, position) in updates {
            if let Some(atom) = self.atoms.get_mut(id) {
                atom.position = position;
            }
        }
        Ok(())
    }

    /// Translates the given atoms rigidly by `offset`.
    pub fn translate_atoms(&mut self, ids: &[AtomId], offset: &Vector3<f64>) -> Result<(), GraphError> {
        let updates = ids
            .iter()
            .map(|&id| self.position(id).map(|p| (id, p + *offset)))
            .collect::<Result<Vec<_>, _>>()?;
        self.apply_positions(&updates)
    }

    /// Marks an atom as selected.
    pub fn select(&mut self, atom_id: AtomId) -> Result<(), GraphError> {
        self.set_selected(atom_id, true)
    }

    /// Clears the selection flag of an atom.
    pub fn deselect(&mut self, atom_id: AtomId) -> Result<(), GraphError> {
        self.set_selected(atom_id, false)
    }

    fn set_selected(&mut self, atom_id: AtomId, selected: bool) -> Result<(), GraphError> {
        let atom = self
            .atoms
            .get_mut(atom_id)
            .ok_or(GraphError::AtomNotFound(atom_id))?;
        atom.selected = selected;
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        for (_, atom) in self.atoms.iter_mut() {
            atom.selected = false;
        }
    }

    /// Returns the selected atoms in insertion order.
    pub fn selected_atoms(&self) -> Vec<AtomId> {
        self.atoms_iter()
            .filter(|(_, atom)| atom.selected)
            .map(|(id, _)| id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestRefs {
        c1: AtomId,
        c2: AtomId,
        o: AtomId,
        c1_c2: BondId,
        c2_o: BondId,
    }

    fn create_ethanol_like_chain() -> (MoleculeGraph, TestRefs) {
        let mut graph = MoleculeGraph::new();
        let c1 = graph.add_atom("C", Point3::new(0.0, 0.0, 0.0));
        let c2 = graph.add_atom("C", Point3::new(1.5, 0.0, 0.0));
        let o = graph.add_atom("O", Point3::new(2.0, 1.3, 0.0));
        let c1_c2 = graph.add_bond(c1, c2, BondOrder::Single).unwrap();
        let c2_o = graph.add_bond(c2, o, BondOrder::Single).unwrap();
        (
            graph,
            TestRefs {
                c1,
                c2,
                o,
                c1_c2,
                c2_o,
            },
        )
    }

    mod core_functionality {
        use super::*;

        #[test]
        fn graph_creation_and_access() {
            let (graph, refs) = create_ethanol_like_chain();

            assert_eq!(graph.atom_count(), 3);
            assert_eq!(graph.bond_count(), 2);
            assert_eq!(graph.atom(refs.o).unwrap().element, "O");
            assert_eq!(graph.atom_ids(), &[refs.c1, refs.c2, refs.o]);
            assert_eq!(graph.atom(refs.c2).unwrap().bonds(), &[refs.c1_c2, refs.c2_o]);
        }

        #[test]
        fn add_bond_rejects_self_bonds() {
            let (mut graph, refs) = create_ethanol_like_chain();
            assert_eq!(
                graph.add_bond(refs.c1, refs.c1, BondOrder::Single),
                Err(GraphError::SelfBond)
            );
            assert_eq!(graph.bond_count(), 2);
        }

        #[test]
        fn add_bond_rejects_duplicates_in_either_direction() {
            let (mut graph, refs) = create_ethanol_like_chain();
            assert_eq!(
                graph.add_bond(refs.c2, refs.c1, BondOrder::Double),
                Err(GraphError::DuplicateBond(refs.c2, refs.c1))
            );
            assert_eq!(graph.bond_count(), 2);
            assert_eq!(graph.atom(refs.c1).unwrap().degree(), 1);
        }

        #[test]
        fn add_bond_rejects_missing_atoms() {
            let (mut graph, refs) = create_ethanol_like_chain();
            graph.remove_atom(refs.o);
            assert_eq!(
                graph.add_bond(refs.c1, refs.o, BondOrder::Single),
                Err(GraphError::AtomNotFound(refs.o))
            );
        }

        #[test]
        fn get_bond_finds_bond_from_either_endpoint() {
            let (graph, refs) = create_ethanol_like_chain();
            assert_eq!(graph.get_bond(refs.c1, refs.c2), Some(refs.c1_c2));
            assert_eq!(graph.get_bond(refs.c2, refs.c1), Some(refs.c1_c2));
            assert_eq!(graph.get_bond(refs.c1, refs.o), None);
        }

        #[test]
        fn remove_bond_updates_both_adjacency_lists() {
            let (mut graph, refs) = create_ethanol_like_chain();
            let removed = graph.remove_bond(refs.c1_c2).unwrap();

            assert!(removed.connects(refs.c1, refs.c2));
            assert!(graph.atom(refs.c1).unwrap().bonds().is_empty());
            assert_eq!(graph.atom(refs.c2).unwrap().bonds(), &[refs.c2_o]);
            assert!(graph.remove_bond(refs.c1_c2).is_none());
        }

        #[test]
        fn clear_removes_everything() {
            let (mut graph, _) = create_ethanol_like_chain();
            graph.clear();
            assert!(graph.is_empty());
            assert_eq!(graph.bond_count(), 0);
        }
    }

    mod atom_removal {
        use super::*;

        #[test]
        fn removing_an_atom_cascades_to_incident_bonds() {
            let (mut graph, refs) = create_ethanol_like_chain();

            let removed = graph.remove_atom(refs.c2).unwrap();

            assert_eq!(removed.element, "C");
            assert!(removed.bonds().is_empty());
            assert_eq!(graph.atom_count(), 2);
            assert_eq!(graph.bond_count(), 0);
            assert!(graph.bond(refs.c1_c2).is_none());
            assert!(graph.bond(refs.c2_o).is_none());
            assert!(graph.atom(refs.c1).unwrap().bonds().is_empty());
            assert!(graph.atom(refs.o).unwrap().bonds().is_empty());
        }

        #[test]
        fn no_bond_references_a_removed_atom() {
            let (mut graph, refs) = create_ethanol_like_chain();
            graph.remove_atom(refs.o);

            for (bond_id, bond) in graph.bonds_iter() {
                assert!(graph.contains_atom(bond.atom1_id));
                assert!(graph.contains_atom(bond.atom2_id));
                assert!(graph.atom(bond.atom1_id).unwrap().bonds().contains(&bond_id));
                assert!(graph.atom(bond.atom2_id).unwrap().bonds().contains(&bond_id));
            }
        }

        #[test]
        fn removal_shifts_external_indices() {
            let (mut graph, refs) = create_ethanol_like_chain();
            assert_eq!(graph.index_of(refs.o), Some(2));

            graph.remove_atom(refs.c1);

            assert_eq!(graph.index_of(refs.c1), None);
            assert_eq!(graph.index_of(refs.c2), Some(0));
            assert_eq!(graph.index_of(refs.o), Some(1));
            assert_eq!(graph.atom_at(1), Some(refs.o));
            assert_eq!(graph.atom_at(2), None);
        }

        #[test]
        fn removing_a_missing_atom_returns_none() {
            let (mut graph, refs) = create_ethanol_like_chain();
            graph.remove_atom(refs.o);
            assert!(graph.remove_atom(refs.o).is_none());
            assert_eq!(graph.atom_count(), 2);
        }

        #[test]
        fn batch_removal_matches_one_by_one_removal() {
            let (mut batch, refs) = create_ethanol_like_chain();
            let n = batch.add_atom("N", Point3::new(3.0, 1.0, 0.0));
            batch.add_bond(refs.o, n, BondOrder::Single).unwrap();
            let mut single = batch.clone();

            let removed = batch.remove_atoms(&[refs.o, refs.c1, refs.o]);
            single.remove_atom(refs.o);
            single.remove_atom(refs.c1);

            assert_eq!(removed, 2);
            assert_eq!(batch.atom_ids(), &[refs.c2, n]);
            assert_eq!(batch.atom_ids(), single.atom_ids());
            assert_eq!(batch.bond_count(), 0);
            assert!(batch.atom(refs.c2).unwrap().bonds().is_empty());
            assert!(batch.atom(n).unwrap().bonds().is_empty());
            assert_eq!(batch.index_of(n), Some(1));
        }

        #[test]
        fn batch_removal_skips_missing_atoms() {
            let (mut graph, refs) = create_ethanol_like_chain();
            graph.remove_atom(refs.o);

            assert_eq!(graph.remove_atoms(&[refs.o]), 0);
            assert_eq!(graph.remove_atoms(&[]), 0);
            assert_eq!(graph.atom_ids(), &[refs.c1, refs.c2]);
            assert_eq!(graph.bond_count(), 1);
        }
    }

    mod positions_and_selection {
        use super::*;

        #[test]
        fn bonded_neighbors_lists_partners_with_bond_ids() {
            let (graph, refs) = create_ethanol_like_chain();
            let neighbors: Vec<_> = graph.bonded_neighbors(refs.c2).collect();
            assert_eq!(neighbors, vec![(refs.c1_c2, refs.c1), (refs.c2_o, refs.o)]);
        }

        #[test]
        fn apply_positions_is_all_or_nothing() {
            let (mut graph, refs) = create_ethanol_like_chain();
            graph.remove_atom(refs.o);

            let result = graph.apply_positions(&[
                (refs.c1, Point3::new(9.0, 9.0, 9.0)),
                (refs.o, Point3::new(1.0, 1.0, 1.0)),
            ]);

            assert_eq!(result, Err(GraphError::AtomNotFound(refs.o)));
            assert_eq!(graph.position(refs.c1).unwrap(), Point3::origin());
        }

        #[test]
        fn translate_atoms_moves_only_the_given_atoms() {
            let (mut graph, refs) = create_ethanol_like_chain();
            graph
                .translate_atoms(&[refs.o], &Vector3::new(0.0, 0.0, 1.0))
                .unwrap();
            assert_eq!(graph.position(refs.o).unwrap(), Point3::new(2.0, 1.3, 1.0));
            assert_eq!(graph.position(refs.c2).unwrap(), Point3::new(1.5, 0.0, 0.0));
        }

        #[test]
        fn selection_is_reported_in_insertion_order() {
            let (mut graph, refs) = create_ethanol_like_chain();
            graph.select(refs.o).unwrap();
            graph.select(refs.c1).unwrap();
            assert_eq!(graph.selected_atoms(), vec![refs.c1, refs.o]);

            graph.deselect(refs.c1).unwrap();
            assert_eq!(graph.selected_atoms(), vec![refs.o]);

            graph.clear_selection();
            assert!(graph.selected_atoms().is_empty());
        }
    }
}
