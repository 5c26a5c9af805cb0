//! Content assist proposal acceptance.

use crate::linked::LinkedModeModel;
use crate::{EditError, Proposal};
use core_state::EditorState;
use tracing::debug;

/// Replace `[start, end)` with the proposal text. When the proposal carries
/// linked positions the linked-mode model to enter is returned; otherwise the
/// caret moves to the escape position (or after the inserted text).
pub fn accept_proposal(
    state: &mut EditorState,
    start: usize,
    end: usize,
    proposal: &Proposal,
) -> Result<Option<LinkedModeModel>, EditError> {
    state.replace(start, end, &proposal.text)?;
    let after = start + proposal.text.chars().count();
    debug!(target: "actions.engine", op = "accept_proposal", start, end, linked = !proposal.positions.is_empty(), "proposal_applied");
    if !proposal.positions.is_empty() {
        return Ok(Some(LinkedModeModel {
            groups: proposal.positions.clone(),
            escape_offset: proposal.escape_position.unwrap_or(after),
        }));
    }
    state.set_caret_offset(proposal.escape_position.unwrap_or(after), true);
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PositionGroup;
    use core_state::Selection;
    use core_text::Buffer;

    #[test]
    fn plain_proposal_places_caret_after_text() {
        let mut st = EditorState::new(Buffer::from_str("t", "pr x"));
        st.set_caret_offset(2, false);
        let linked = accept_proposal(&mut st, 0, 2, &Proposal::plain("println!()")).unwrap();
        assert!(linked.is_none());
        assert_eq!(st.buffer().text(), "println!() x");
        assert_eq!(st.selection(), Selection::caret_at(10));
        assert_eq!(st.undo_stack().undo_depth(), 1);
    }

    #[test]
    fn positional_proposal_yields_linked_model() {
        let mut st = EditorState::new(Buffer::from_str("t", "f"));
        let proposal = Proposal {
            text: "for (i; c) {}".into(),
            positions: vec![PositionGroup::single(5, 1), PositionGroup::single(8, 1)],
            escape_position: Some(12),
        };
        let linked = accept_proposal(&mut st, 0, 1, &proposal).unwrap().unwrap();
        assert_eq!(linked.groups.len(), 2);
        assert_eq!(linked.escape_offset, 12);
        assert_eq!(st.buffer().text(), "for (i; c) {}");
    }
}
