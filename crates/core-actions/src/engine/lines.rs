//! Move, copy and delete whole lines.

use super::{LineRange, replace_and_select, selected_lines, shifted};
use crate::EditResult;
use core_state::{EditorState, Selection};
use tracing::{debug, trace};

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Swap the spanned block with the line above. At the first line this is a
/// consumed no-op.
pub fn move_lines_up(state: &mut EditorState) -> EditResult {
    let LineRange { first, last } = selected_lines(state)?;
    if first == 0 {
        trace!(target: "actions.engine", op = "move_lines_up", "at_buffer_start");
        return Ok(true);
    }
    let buf = state.buffer();
    let prev = first - 1;
    let region_start = buf.line_start(prev)?;
    let block_start = buf.line_start(first)?;
    let region_end = buf.line_end(last, true)?;
    let block = buf.text_range(block_start, region_end)?;
    let prev_text = buf.line(prev, false)?;
    let prev_delimiter = buf.text_range(buf.line_end(prev, false)?, block_start)?;
    // The final line has no delimiter; borrow the one from the line above.
    let moved = if region_end > buf.line_end(last, false)? {
        format!("{block}{prev_text}{prev_delimiter}")
    } else {
        format!("{block}{prev_delimiter}{prev_text}")
    };
    let sel = shifted(state.selection(), -((block_start - region_start) as isize));
    replace_and_select(state, region_start, region_end, &moved, sel)?;
    debug!(target: "actions.engine", op = "move_lines_up", first, last, "lines_moved");
    Ok(true)
}

/// Swap the spanned block with the line below. At the last line this is a
/// consumed no-op.
pub fn move_lines_down(state: &mut EditorState) -> EditResult {
    let LineRange { first, last } = selected_lines(state)?;
    let buf = state.buffer();
    if last + 1 >= buf.line_count() {
        trace!(target: "actions.engine", op = "move_lines_down", "at_buffer_end");
        return Ok(true);
    }
    let next = last + 1;
    let block_start = buf.line_start(first)?;
    let body_end = buf.line_end(last, false)?;
    let block_body = buf.text_range(block_start, body_end)?;
    let block_delimiter = buf.text_range(body_end, buf.line_end(last, true)?)?;
    let next_text = buf.line(next, false)?;
    let next_body_end = buf.line_end(next, false)?;
    let region_end = buf.line_end(next, true)?;
    let next_delimiter = buf.text_range(next_body_end, region_end)?;
    let (moved, shift) = if region_end > next_body_end {
        (
            format!("{next_text}{next_delimiter}{block_body}{block_delimiter}"),
            char_len(&next_text) + char_len(&next_delimiter),
        )
    } else {
        (
            format!("{next_text}{block_delimiter}{block_body}"),
            char_len(&next_text) + char_len(&block_delimiter),
        )
    };
    let sel = shifted(state.selection(), shift as isize);
    replace_and_select(state, block_start, region_end, &moved, sel)?;
    debug!(target: "actions.engine", op = "move_lines_down", first, last, "lines_moved");
    Ok(true)
}

/// Duplicate the block above itself; the selection stays on the original.
pub fn copy_lines_up(state: &mut EditorState) -> EditResult {
    let LineRange { first, last } = selected_lines(state)?;
    let buf = state.buffer();
    let start = buf.line_start(first)?;
    let end = buf.line_end(last, true)?;
    let mut block = buf.text_range(start, end)?;
    if end == buf.line_end(last, false)? {
        block.push_str(buf.line_delimiter());
    }
    let sel = shifted(state.selection(), char_len(&block) as isize);
    replace_and_select(state, start, start, &block, sel)?;
    debug!(target: "actions.engine", op = "copy_lines_up", first, last, "lines_copied");
    Ok(true)
}

/// Duplicate the block below itself; the selection moves to the copy.
pub fn copy_lines_down(state: &mut EditorState) -> EditResult {
    let LineRange { first, last } = selected_lines(state)?;
    let buf = state.buffer();
    let start = buf.line_start(first)?;
    let end = buf.line_end(last, true)?;
    let block = buf.text_range(start, end)?;
    let (insert, copy_start) = if end > buf.line_end(last, false)? {
        (block, end)
    } else {
        let delimiter = buf.line_delimiter();
        (format!("{delimiter}{block}"), end + char_len(delimiter))
    };
    let sel = shifted(state.selection(), (copy_start - start) as isize);
    replace_and_select(state, end, end, &insert, sel)?;
    debug!(target: "actions.engine", op = "copy_lines_down", first, last, "lines_copied");
    Ok(true)
}

/// Remove the spanned lines including the trailing delimiter.
pub fn delete_lines(state: &mut EditorState) -> EditResult {
    let LineRange { first, last } = selected_lines(state)?;
    let buf = state.buffer();
    let start = buf.line_start(first)?;
    let end = buf.line_end(last, true)?;
    if start == end {
        return Ok(true);
    }
    replace_and_select(state, start, end, "", Selection::caret_at(start))?;
    debug!(target: "actions.engine", op = "delete_lines", first, last, "lines_deleted");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_text::Buffer;

    fn state(text: &str, anchor: usize, caret: usize) -> EditorState {
        let mut st = EditorState::new(Buffer::from_str("t", text));
        st.set_selection(anchor, caret, false);
        st
    }

    #[test]
    fn move_up_swaps_with_previous_line() {
        let mut st = state("one\ntwo\nthree", 5, 6);
        assert!(move_lines_up(&mut st).unwrap());
        assert_eq!(st.buffer().text(), "two\none\nthree");
        assert_eq!(st.selection(), Selection::new(1, 2));
    }

    #[test]
    fn move_up_relocates_delimiter_for_final_line() {
        let mut st = state("one\ntwo\nthree", 9, 9);
        assert!(move_lines_up(&mut st).unwrap());
        assert_eq!(st.buffer().text(), "one\nthree\ntwo");
        assert_eq!(st.selection(), Selection::caret_at(5));
    }

    #[test]
    fn move_down_relocates_delimiter_into_final_line() {
        let mut st = state("one\ntwo\nthree", 4, 4);
        assert!(move_lines_down(&mut st).unwrap());
        assert_eq!(st.buffer().text(), "one\nthree\ntwo");
        assert_eq!(st.selection(), Selection::caret_at(10));
    }

    #[test]
    fn move_at_boundaries_is_consumed_noop() {
        let mut st = state("one\ntwo", 1, 1);
        assert!(move_lines_up(&mut st).unwrap());
        assert_eq!(st.buffer().text(), "one\ntwo");
        st.set_caret_offset(5, false);
        assert!(move_lines_down(&mut st).unwrap());
        assert_eq!(st.buffer().text(), "one\ntwo");
        assert_eq!(st.undo_stack().undo_depth(), 0);
    }

    #[test]
    fn copy_up_keeps_selection_on_original() {
        let mut st = state("a\nb\nc", 2, 3);
        assert!(copy_lines_up(&mut st).unwrap());
        assert_eq!(st.buffer().text(), "a\nb\nb\nc");
        assert_eq!(st.selection(), Selection::new(4, 5));
    }

    #[test]
    fn copy_down_of_final_line_synthesizes_delimiter() {
        let mut st = state("a\r\nb", 3, 4);
        assert!(copy_lines_down(&mut st).unwrap());
        assert_eq!(st.buffer().text(), "a\r\nb\r\nb");
        assert_eq!(st.selection(), Selection::new(6, 7));
    }

    #[test]
    fn delete_lines_removes_block_with_delimiter() {
        let mut st = state("a\nbb\ncc\nd", 3, 6);
        assert!(delete_lines(&mut st).unwrap());
        assert_eq!(st.buffer().text(), "a\nd");
        assert_eq!(st.selection(), Selection::caret_at(2));
        assert!(st.undo().unwrap());
        assert_eq!(st.buffer().text(), "a\nbb\ncc\nd");
        assert_eq!(st.selection(), Selection::new(3, 6));
    }
}
