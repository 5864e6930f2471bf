use crate::core::elements::ElementTable;
use crate::core::models::atom::Atom;
use crate::core::models::ids::{AtomId, BondId};
use crate::core::models::molecule::{GraphError, MoleculeGraph};
use crate::core::models::topology::{Bond, BondOrder};
use crate::core::topology::perception;
use super::clipboard::{Clipboard, smart_offset};
use super::config::EditorConfig;
use super::error::EditError;
use super::history::HistoryManager;
use super::transaction::{self, Mutation};
use nalgebra::{Point3, Vector3};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LabelMode {
    #[default]
    Hidden,
    Symbol,
    Index,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ColorMode {
    #[default]
    Element,
    Uniform,
}

/// Per-molecule presentation state. Carried with its entry, never interpreted here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DisplaySettings {
    pub label_mode: LabelMode,
    pub color_mode: ColorMode,
}

/// One molecule of a session together with its own undo history and display settings.
#[derive(Debug, Clone)]
pub struct SessionEntry {
    name: String,
    graph: MoleculeGraph,
    history: HistoryManager,
    pub settings: DisplaySettings,
}

impl SessionEntry {
    pub fn new(name: impl Into<String>, max_history: usize) -> Self {
        Self {
            name: name.into(),
            graph: MoleculeGraph::new(),
            history: HistoryManager::new(max_history),
            settings: DisplaySettings::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn graph(&self) -> &MoleculeGraph {
        &self.graph
    }

    /// Direct access to the graph. Changes made here are not recorded; call
    /// [`save_state`](Self::save_state) first if they should be undoable.
    pub fn graph_mut(&mut self) -> &mut MoleculeGraph {
        &mut self.graph
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    pub fn save_state(&mut self) {
        self.history.save_state(&self.graph);
    }

    pub fn undo(&mut self) -> bool {
        self.history.undo(&mut self.graph)
    }

    pub fn redo(&mut self) -> bool {
        self.history.redo(&mut self.graph)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Runs `action` as one undoable step; see [`transaction::run`].
    pub fn transaction<F, R>(&mut self, action: F) -> Result<R, EditError>
    where
        F: FnOnce(&mut MoleculeGraph) -> Result<Mutation<R>, EditError>,
    {
        transaction::run(&mut self.graph, &mut self.history, action)
    }

    pub fn add_atom(&mut self, element: &str, position: Point3<f64>) -> Result<AtomId, EditError> {
        let symbol = ElementTable::normalize(element)
            .ok_or_else(|| EditError::UnknownElement(element.to_string()))?;
        if !position.coords.iter().all(|c| c.is_finite()) {
            return Err(EditError::InvalidParameter {
                name: "position",
                reason: format!("coordinates must be finite, got {position}"),
            });
        }
        self.transaction(|graph| Ok(Mutation::Applied(graph.add_atom(symbol, position))))
    }

    pub fn remove_atom(&mut self, atom_id: AtomId) -> Result<Atom, EditError> {
        self.transaction(|graph| {
            let atom = graph
                .remove_atom(atom_id)
                .ok_or(GraphError::AtomNotFound(atom_id))?;
            Ok(Mutation::Applied(atom))
        })
    }

    pub fn add_bond(
        &mut self,
        atom1_id: AtomId,
        atom2_id: AtomId,
        order: BondOrder,
    ) -> Result<BondId, EditError> {
        self.transaction(|graph| Ok(Mutation::Applied(graph.add_bond(atom1_id, atom2_id, order)?)))
    }

    pub fn remove_bond(&mut self, bond_id: BondId) -> Result<Bond, EditError> {
        self.transaction(|graph| {
            let bond = graph
                .remove_bond(bond_id)
                .ok_or(GraphError::BondNotFound(bond_id))?;
            Ok(Mutation::Applied(bond))
        })
    }

    /// Removes every selected atom (and its bonds) as one step.
    pub fn delete_selected(&mut self) -> Result<usize, EditError> {
        let selected = self.graph.selected_atoms();
        if selected.is_empty() {
            return Err(EditError::EmptySelection);
        }
        self.transaction(|graph| Ok(Mutation::Applied(graph.remove_atoms(&selected))))
    }

    /// Removes all atoms and bonds. Clearing an empty molecule records nothing.
    pub fn clear_molecule(&mut self) -> Result<usize, EditError> {
        self.transaction(|graph| {
            let removed = graph.atom_count();
            if removed == 0 {
                return Ok(Mutation::NoOp(0));
            }
            graph.clear();
            Ok(Mutation::Applied(removed))
        })
    }

    pub fn translate_selected(&mut self, offset: &Vector3<f64>) -> Result<usize, EditError> {
        if !offset.iter().all(|c| c.is_finite()) {
            return Err(EditError::InvalidParameter {
                name: "offset",
                reason: "components must be finite".to_string(),
            });
        }
        let selected = self.graph.selected_atoms();
        if selected.is_empty() {
            return Err(EditError::EmptySelection);
        }
        self.transaction(|graph| {
            if offset.norm() == 0.0 {
                return Ok(Mutation::NoOp(selected.len()));
            }
            graph.translate_atoms(&selected, offset)?;
            Ok(Mutation::Applied(selected.len()))
        })
    }

    /// Perceives bonds from interatomic distances. A run that adds nothing records nothing.
    pub fn auto_bond(&mut self, elements: &ElementTable, threshold_factor: f64) -> Result<usize, EditError> {
        if !threshold_factor.is_finite() || threshold_factor <= 0.0 {
            return Err(EditError::InvalidParameter {
                name: "threshold_factor",
                reason: format!("must be positive and finite, got {threshold_factor}"),
            });
        }
        let added = self.transaction(|graph| {
            let added = perception::auto_bond(graph, elements, threshold_factor);
            Ok(if added > 0 {
                Mutation::Applied(added)
            } else {
                Mutation::NoOp(0)
            })
        })?;
        debug!(molecule = %self.name, added, "Auto-bond finished");
        Ok(added)
    }

    /// Inserts a clipboard template, shifted clear of the existing atoms, as one step.
    /// The pasted atoms replace the current selection.
    pub fn paste(&mut self, clipboard: &Clipboard, min_distance: f64) -> Result<Vec<AtomId>, EditError> {
        if clipboard.is_empty() {
            return Err(EditError::EmptyClipboard);
        }
        validate_min_distance(min_distance)?;
        let offset = smart_offset(&clipboard.positions(), &self.graph.positions(), min_distance);
        self.transaction(|graph| {
            let new_ids = clipboard.paste_into(graph, &offset)?;
            graph.clear_selection();
            for &id in &new_ids {
                graph.select(id)?;
            }
            Ok(Mutation::Applied(new_ids))
        })
    }
}

fn validate_min_distance(min_distance: f64) -> Result<(), EditError> {
    if !min_distance.is_finite() || min_distance < 0.0 {
        return Err(EditError::InvalidParameter {
            name: "min_distance",
            reason: format!("must be non-negative and finite, got {min_distance}"),
        });
    }
    Ok(())
}

/// An ordered set of molecules, one of which is active, plus a shared clipboard.
///
/// There is always at least one entry. Every entry owns its own history, so undo
/// never crosses from one molecule into another.
#[derive(Debug, Clone)]
pub struct MoleculeSessionManager {
    entries: Vec<SessionEntry>,
    active: usize,
    clipboard: Option<Clipboard>,
    config: EditorConfig,
    elements: ElementTable,
}

impl Default for MoleculeSessionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl MoleculeSessionManager {
    pub fn new() -> Self {
        Self::with_config(EditorConfig::default(), ElementTable::new())
    }

    /// Creates a session holding a single empty molecule named "Molecule 1".
    pub fn with_config(config: EditorConfig, elements: ElementTable) -> Self {
        let first = SessionEntry::new("Molecule 1", config.max_history);
        Self {
            entries: vec![first],
            active: 0,
            clipboard: None,
            config,
            elements,
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn elements(&self) -> &ElementTable {
        &self.elements
    }

    pub fn entries(&self) -> &[SessionEntry] {
        &self.entries
    }

    pub fn entry(&self, index: usize) -> Option<&SessionEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active(&self) -> &SessionEntry {
        &self.entries[self.active]
    }

    pub fn active_mut(&mut self) -> &mut SessionEntry {
        &mut self.entries[self.active]
    }

    pub fn clipboard(&self) -> Option<&Clipboard> {
        self.clipboard.as_ref()
    }

    fn check_index(&self, index: usize) -> Result<(), EditError> {
        if index >= self.entries.len() {
            return Err(EditError::MoleculeIndexOutOfRange {
                index,
                len: self.entries.len(),
            });
        }
        Ok(())
    }

    /// Trims `name` and checks it against every entry except `ignore`.
    fn validate_name(&self, name: &str, ignore: Option<usize>) -> Result<String, EditError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(EditError::EmptyName);
        }
        let taken = self
            .entries
            .iter()
            .enumerate()
            .any(|(i, entry)| Some(i) != ignore && entry.name == name);
        if taken {
            return Err(EditError::DuplicateName(name.to_string()));
        }
        Ok(name.to_string())
    }

    fn generate_name(&self) -> String {
        let mut n = self.entries.len() + 1;
        loop {
            let candidate = format!("Molecule {n}");
            if self.entries.iter().all(|entry| entry.name != candidate) {
                return candidate;
            }
            n += 1;
        }
    }

    /// Adds an empty molecule and makes it active.
    ///
    /// # Return
    ///
    /// The index of the new entry.
    pub fn create_molecule(&mut self, name: Option<&str>) -> Result<usize, EditError> {
        let name = match name {
            Some(requested) => self.validate_name(requested, None)?,
            None => self.generate_name(),
        };
        info!(molecule = %name, "Creating molecule");
        self.entries
            .push(SessionEntry::new(name, self.config.max_history));
        self.active = self.entries.len() - 1;
        Ok(self.active)
    }

    pub fn switch_molecule(&mut self, index: usize) -> Result<(), EditError> {
        self.check_index(index)?;
        self.active = index;
        debug!(molecule = %self.entries[index].name, "Switched active molecule");
        Ok(())
    }

    /// Removes an entry. The last remaining entry cannot be removed.
    ///
    /// If the active entry is removed, the entry that takes its place (or the new
    /// last entry) becomes active; otherwise the same molecule stays active.
    pub fn remove_molecule(&mut self, index: usize) -> Result<SessionEntry, EditError> {
        self.check_index(index)?;
        if self.entries.len() == 1 {
            return Err(EditError::LastMolecule);
        }
        let removed = self.entries.remove(index);
        if index < self.active {
            self.active -= 1;
        } else if index == self.active {
            self.active = index.min(self.entries.len() - 1);
        }
        info!(molecule = %removed.name, "Removed molecule");
        Ok(removed)
    }

    pub fn rename_molecule(&mut self, index: usize, name: &str) -> Result<(), EditError> {
        self.check_index(index)?;
        let name = self.validate_name(name, Some(index))?;
        info!(from = %self.entries[index].name, to = %name, "Renamed molecule");
        self.entries[index].name = name;
        Ok(())
    }

    /// Copies the selected atoms of the active molecule, and the bonds among them,
    /// to the clipboard.
    ///
    /// # Return
    ///
    /// The number of atoms copied.
    pub fn copy_selection(&mut self) -> Result<usize, EditError> {
        let graph = self.active().graph();
        let selected = graph.selected_atoms();
        if selected.is_empty() {
            return Err(EditError::EmptySelection);
        }
        let clipboard = Clipboard::from_atoms(graph, &selected)?;
        debug!(atoms = clipboard.len(), bonds = clipboard.bonds().len(), "Copied selection");
        self.clipboard = Some(clipboard);
        Ok(selected.len())
    }

    /// Copies the selection, then deletes it from the active molecule as one undoable step.
    pub fn cut(&mut self) -> Result<usize, EditError> {
        let copied = self.copy_selection()?;
        self.active_mut().delete_selected()?;
        Ok(copied)
    }

    /// Pastes the clipboard into the active molecule. `min_distance` defaults to the
    /// configured paste clearance.
    pub fn paste_clipboard(&mut self, min_distance: Option<f64>) -> Result<Vec<AtomId>, EditError> {
        let min_distance = min_distance.unwrap_or(self.config.paste_min_distance);
        let clipboard = self.clipboard.as_ref().ok_or(EditError::EmptyClipboard)?;
        let entry = &mut self.entries[self.active];
        let new_ids = entry.paste(clipboard, min_distance)?;
        info!(molecule = %entry.name, atoms = new_ids.len(), "Pasted clipboard");
        Ok(new_ids)
    }

    /// Pastes every atom and bond of `source` into the active molecule as one undoable
    /// step, then removes `source` from the session. The clipboard is not touched.
    pub fn merge_molecule(
        &mut self,
        source: usize,
        min_distance: Option<f64>,
    ) -> Result<Vec<AtomId>, EditError> {
        self.check_index(source)?;
        if source == self.active {
            return Err(EditError::MergeIntoSelf);
        }
        let min_distance = min_distance.unwrap_or(self.config.paste_min_distance);
        validate_min_distance(min_distance)?;

        let template = Clipboard::from_graph(self.entries[source].graph())?;
        let new_ids = if template.is_empty() {
            Vec::new()
        } else {
            self.entries[self.active].paste(&template, min_distance)?
        };

        let removed = self.entries.remove(source);
        if source < self.active {
            self.active -= 1;
        }
        info!(
            source = %removed.name,
            target = %self.entries[self.active].name,
            atoms = new_ids.len(),
            "Merged molecule"
        );
        Ok(new_ids)
    }

    /// Perceives bonds in the active molecule. `threshold_factor` defaults to the
    /// configured factor.
    pub fn auto_bond(&mut self, threshold_factor: Option<f64>) -> Result<usize, EditError> {
        let factor = threshold_factor.unwrap_or(self.config.bond_threshold_factor);
        let entry = &mut self.entries[self.active];
        entry.auto_bond(&self.elements, factor)
    }

    pub fn add_atom(&mut self, element: &str, position: Point3<f64>) -> Result<AtomId, EditError> {
        self.active_mut().add_atom(element, position)
    }

    pub fn remove_atom(&mut self, atom_id: AtomId) -> Result<Atom, EditError> {
        self.active_mut().remove_atom(atom_id)
    }

    pub fn add_bond(
        &mut self,
        atom1_id: AtomId,
        atom2_id: AtomId,
        order: BondOrder,
    ) -> Result<BondId, EditError> {
        self.active_mut().add_bond(atom1_id, atom2_id, order)
    }

    pub fn remove_bond(&mut self, bond_id: BondId) -> Result<Bond, EditError> {
        self.active_mut().remove_bond(bond_id)
    }

    pub fn delete_selected(&mut self) -> Result<usize, EditError> {
        self.active_mut().delete_selected()
    }

    pub fn clear_molecule(&mut self) -> Result<usize, EditError> {
        self.active_mut().clear_molecule()
    }

    pub fn translate_selected(&mut self, offset: &Vector3<f64>) -> Result<usize, EditError> {
        self.active_mut().translate_selected(offset)
    }

    pub fn save_state(&mut self) {
        self.active_mut().save_state();
    }

    pub fn undo(&mut self) -> bool {
        self.active_mut().undo()
    }

    pub fn redo(&mut self) -> bool {
        self.active_mut().redo()
    }

    pub fn can_undo(&self) -> bool {
        self.active().can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.active().can_redo()
    }
}
