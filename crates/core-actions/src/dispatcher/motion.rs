//! Default caret movement for lineUp / lineDown when no mode claims them.
//!
//! The caret keeps a sticky column across short lines until some other action
//! resets it. At the first / last line the key is consumed without moving.

use crate::EditResult;
use core_state::EditorState;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Vertical {
    Up,
    Down,
}

pub(crate) fn vertical(
    state: &mut EditorState,
    sticky_col: &mut Option<usize>,
    direction: Vertical,
) -> EditResult {
    let (line, col) = state.caret_line_col();
    let buf = state.buffer();
    let target = match direction {
        Vertical::Up if line == 0 => return Ok(true),
        Vertical::Up => line - 1,
        Vertical::Down if line + 1 >= buf.line_count() => return Ok(true),
        Vertical::Down => line + 1,
    };
    let goal = *sticky_col.get_or_insert(col);
    let start = buf.line_start(target)?;
    let len = buf.line_end(target, false)? - start;
    let offset = start + goal.min(len);
    state.set_caret_offset(offset, true);
    trace!(target: "actions.dispatch", motion = ?direction, line, to_line = target, goal, "motion");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_state::Selection;
    use core_text::Buffer;

    #[test]
    fn up_collapses_selection_onto_previous_line() {
        let mut st = EditorState::new(Buffer::from_str("t", "one\ntwo"));
        st.set_selection(4, 6, false);
        let mut sticky = None;
        vertical(&mut st, &mut sticky, Vertical::Up).unwrap();
        assert_eq!(st.selection(), Selection::caret_at(2));
        assert_eq!(sticky, Some(2));
    }

    #[test]
    fn top_line_is_consumed_without_motion() {
        let mut st = EditorState::new(Buffer::from_str("t", "one\ntwo"));
        st.set_caret_offset(1, false);
        let mut sticky = None;
        assert!(vertical(&mut st, &mut sticky, Vertical::Up).unwrap());
        assert_eq!(st.caret_offset(), 1);
        assert!(st.take_reveal().is_none());
    }
}
