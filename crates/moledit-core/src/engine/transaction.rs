use crate::core::models::molecule::MoleculeGraph;
use super::error::EditError;
use super::history::{HistoryManager, HistorySnapshot};

/// What an edit action did to the graph.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation<R> {
    /// The graph changed; the pre-edit state becomes an undo step.
    Applied(R),
    /// The graph is as it was; no undo step is recorded.
    NoOp(R),
}

impl<R> Mutation<R> {
    pub fn into_inner(self) -> R {
        match self {
            Self::Applied(value) | Self::NoOp(value) => value,
        }
    }
}

/// Runs `action` against `graph` as a single undoable step.
///
/// The state before the action is recorded only if the action reports
/// [`Mutation::Applied`]. If the action fails, the graph is restored to the
/// recorded state and the error is returned with nothing pushed.
pub fn run<F, R>(
    graph: &mut MoleculeGraph,
    history: &mut HistoryManager,
    action: F,
) -> Result<R, EditError>
where
    F: FnOnce(&mut MoleculeGraph) -> Result<Mutation<R>, EditError>,
{
    // 1. Record the original state.
    let original = HistorySnapshot::capture(graph);

    // 2. Execute the action, reverting on failure.
    match action(graph) {
        Ok(Mutation::Applied(result)) => {
            history.push(original);
            Ok(result)
        }
        Ok(Mutation::NoOp(result)) => Ok(result),
        Err(err) => {
            original.restore_into(graph);
            Err(err)
        }
    }
}
