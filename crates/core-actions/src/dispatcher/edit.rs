//! Default text edits: typed text through verify listeners and backspace.

use crate::EditResult;
use crate::modes::ModeDispatcher;
use core_events::VerifyEvent;
use core_state::EditorState;
use tracing::trace;

/// Replace the selection with `text` unless a verify listener vetoes it.
/// A vetoed edit still counts as consumed.
pub(crate) fn insert_text(
    state: &mut EditorState,
    modes: &mut ModeDispatcher,
    text: &str,
) -> EditResult {
    let (start, end) = state.selection().range();
    let mut event = VerifyEvent::new(start, end, text);
    modes.deliver_verify(state, &mut event);
    if !event.doit {
        trace!(target: "actions.dispatch", op = "insert_text", start, end, "vetoed");
        return Ok(true);
    }
    state.replace(event.start, event.end, &event.text)?;
    trace!(target: "actions.dispatch", op = "insert_text", start = event.start, end = event.end, chars = event.text.chars().count(), "edit");
    Ok(true)
}

/// Delete the selection, or the character before the caret. A `\r\n` pair is
/// removed as one unit.
pub(crate) fn delete_previous(state: &mut EditorState) -> EditResult {
    let (start, end) = state.selection().range();
    if start != end {
        state.replace(start, end, "")?;
        return Ok(true);
    }
    if start == 0 {
        return Ok(true);
    }
    let buf = state.buffer();
    let width = if start >= 2
        && buf.char_at(start - 2) == Some('\r')
        && buf.char_at(start - 1) == Some('\n')
    {
        2
    } else {
        1
    };
    state.replace(start - width, start, "")?;
    trace!(target: "actions.dispatch", op = "backspace", at = start, width, "edit");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_state::Selection;
    use core_text::Buffer;

    #[test]
    fn typing_replaces_selection() {
        let mut st = EditorState::new(Buffer::from_str("t", "hello world"));
        st.set_selection(6, 11, false);
        let mut modes = ModeDispatcher::default();
        assert!(insert_text(&mut st, &mut modes, "there").unwrap());
        assert_eq!(st.buffer().text(), "hello there");
        assert_eq!(st.selection(), Selection::caret_at(11));
    }

    #[test]
    fn backspace_at_start_is_consumed_noop() {
        let mut st = EditorState::new(Buffer::from_str("t", "ab"));
        assert!(delete_previous(&mut st).unwrap());
        assert_eq!(st.buffer().text(), "ab");
        assert_eq!(st.undo_stack().undo_depth(), 0);
    }

    #[test]
    fn backspace_deletes_selection() {
        let mut st = EditorState::new(Buffer::from_str("t", "abcd"));
        st.set_selection(3, 1, false);
        delete_previous(&mut st).unwrap();
        assert_eq!(st.buffer().text(), "ad");
        assert_eq!(st.selection(), Selection::caret_at(1));
    }
}
