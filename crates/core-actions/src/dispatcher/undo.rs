//! Undo / redo dispatch. Both keys are always consumed, even with an empty
//! history.

use crate::EditResult;
use core_state::EditorState;
use tracing::trace;

pub(crate) fn handle_undo(state: &mut EditorState) -> EditResult {
    let undone = state.undo()?;
    trace!(target: "actions.dispatch", op = "undo", undone, depth = state.undo_stack().undo_depth(), "undo");
    Ok(true)
}

pub(crate) fn handle_redo(state: &mut EditorState) -> EditResult {
    let redone = state.redo()?;
    trace!(target: "actions.dispatch", op = "redo", redone, depth = state.undo_stack().redo_depth(), "redo");
    Ok(true)
}
