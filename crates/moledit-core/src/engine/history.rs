use crate::core::models::molecule::MoleculeGraph;
use super::config::DEFAULT_MAX_HISTORY;
use tracing::debug;

/// An independent deep copy of a molecule's atoms and bonds.
///
/// Atom and bond ids are preserved, so ids held before an undo stay valid for the
/// atoms that exist in the restored state.
#[derive(Debug, Clone)]
pub struct HistorySnapshot {
    graph: MoleculeGraph,
}

impl HistorySnapshot {
    pub fn capture(graph: &MoleculeGraph) -> Self {
        Self {
            graph: graph.clone(),
        }
    }

    pub fn graph(&self) -> &MoleculeGraph {
        &self.graph
    }

    /// Replaces the live graph with a fresh copy of this snapshot.
    pub fn restore_into(&self, graph: &mut MoleculeGraph) {
        *graph = self.graph.clone();
    }

    pub fn into_graph(self) -> MoleculeGraph {
        self.graph
    }
}

/// Bounded undo/redo stack for a single molecule.
///
/// `entries[..cursor]` are earlier states reachable by undo, most recent last.
/// `entries[cursor..]` are later states reachable by redo, nearest first.
#[derive(Debug, Clone)]
pub struct HistoryManager {
    entries: Vec<HistorySnapshot>,
    cursor: usize,
    max_history: usize,
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HISTORY)
    }
}

impl HistoryManager {
    /// Creates an empty history holding at most `max_history` undo steps (minimum 1).
    pub fn new(max_history: usize) -> Self {
        Self {
            entries: Vec::new(),
            cursor: 0,
            max_history: max_history.max(1),
        }
    }

    pub fn max_history(&self) -> usize {
        self.max_history
    }

    /// Records a state that existed before an edit. Any redo branch is discarded.
    pub fn push(&mut self, snapshot: HistorySnapshot) {
        self.entries.truncate(self.cursor);
        self.entries.push(snapshot);
        if self.entries.len() > self.max_history {
            let overflow = self.entries.len() - self.max_history;
            self.entries.drain(..overflow);
        }
        self.cursor = self.entries.len();
        debug!(depth = self.cursor, "History state saved");
    }

    /// Snapshots `graph` and pushes it. Call this before mutating.
    pub fn save_state(&mut self, graph: &MoleculeGraph) {
        self.push(HistorySnapshot::capture(graph));
    }

    /// Steps back one state, swapping the live graph for the previous snapshot.
    ///
    /// # Return
    ///
    /// `false` if there is nothing to undo; the graph is then untouched.
    pub fn undo(&mut self, live: &mut MoleculeGraph) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        let previous = std::mem::replace(
            &mut self.entries[self.cursor],
            HistorySnapshot::capture(live),
        );
        *live = previous.into_graph();
        debug!(undo_depth = self.cursor, "Undo applied");
        true
    }

    /// Steps forward one state after an undo.
    ///
    /// # Return
    ///
    /// `false` if there is nothing to redo; the graph is then untouched.
    pub fn redo(&mut self, live: &mut MoleculeGraph) -> bool {
        if self.cursor == self.entries.len() {
            return false;
        }
        let next = std::mem::replace(
            &mut self.entries[self.cursor],
            HistorySnapshot::capture(live),
        );
        self.cursor += 1;
        *live = next.into_graph();
        debug!(undo_depth = self.cursor, "Redo applied");
        true
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor < self.entries.len()
    }

    pub fn undo_depth(&self) -> usize {
        self.cursor
    }

    pub fn redo_depth(&self) -> usize {
        self.entries.len() - self.cursor
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = 0;
    }
}
