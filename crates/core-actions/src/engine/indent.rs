//! Block indent / unindent with tabs.

use super::{LineRange, SpanEdit, apply_span_edits, replace_and_select, selected_lines};
use crate::EditResult;
use core_state::{EditorState, Selection};
use core_text::TextResult;
use tracing::debug;

/// Insert a tab at the start of every spanned line. Single-line selections
/// are not handled here (`Ok(false)`) so the caller can insert a plain tab.
pub fn tab_indent(state: &mut EditorState) -> EditResult {
    let LineRange { first, last } = selected_lines(state)?;
    if first == last {
        return Ok(false);
    }
    let buf = state.buffer();
    let edits = (first..=last)
        .map(|line| Ok(SpanEdit::insert(buf.line_start(line)?, "\t")))
        .collect::<TextResult<Vec<_>>>()?;
    let span_start = buf.line_start(first)?;
    let span_end = buf.line_end(last, false)?;
    apply_span_edits(state, span_start, span_end, &edits)?;
    debug!(target: "actions.engine", op = "tab_indent", first, last, "lines_indented");
    Ok(true)
}

/// Remove one leading tab from every spanned line. Refuses (`Ok(false)`)
/// unless every line starts with a tab.
pub fn unindent(state: &mut EditorState) -> EditResult {
    let LineRange { first, last } = selected_lines(state)?;
    let buf = state.buffer();
    let mut edits = Vec::with_capacity(last - first + 1);
    for line in first..=last {
        let start = buf.line_start(line)?;
        if buf.char_at(start) != Some('\t') {
            debug!(target: "actions.engine", op = "unindent", line, "line_without_tab");
            return Ok(false);
        }
        edits.push(SpanEdit::delete(start, 1));
    }
    let span_start = buf.line_start(first)?;
    let span_end = buf.line_end(last, false)?;
    apply_span_edits(state, span_start, span_end, &edits)?;
    debug!(target: "actions.engine", op = "unindent", first, last, "lines_unindented");
    Ok(true)
}

fn is_blank(c: char) -> bool {
    c == ' ' || c == '\t'
}

/// Break the line at the caret and carry its leading blanks (up to the caret)
/// onto the new line. Blanks directly after the caret are swallowed. Only an
/// empty selection applies; otherwise `Ok(false)`.
pub fn auto_indent_newline(state: &mut EditorState) -> EditResult {
    let sel = state.selection();
    if !sel.is_empty() {
        return Ok(false);
    }
    let caret = sel.caret;
    let buf = state.buffer();
    let line = buf.line_at_offset(caret)?;
    let line_start = buf.line_start(line)?;
    let line_end = buf.line_end(line, false)?;
    let head = buf.text_range(line_start, caret)?;
    let indent: String = head.chars().take_while(|&c| is_blank(c)).collect();
    let trailing = buf
        .text_range(caret, line_end)?
        .chars()
        .take_while(|&c| is_blank(c))
        .count();
    let text = format!("{}{indent}", buf.line_delimiter());
    let after = caret + text.chars().count();
    replace_and_select(state, caret, caret + trailing, &text, Selection::caret_at(after))?;
    debug!(target: "actions.engine", op = "auto_indent_newline", line, indent = indent.chars().count(), trailing, "line_split");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_state::Selection;
    use core_text::Buffer;

    fn state(text: &str, anchor: usize, caret: usize) -> EditorState {
        let mut st = EditorState::new(Buffer::from_str("t", text));
        st.set_selection(anchor, caret, false);
        st
    }

    #[test]
    fn indents_each_spanned_line_once() {
        let mut st = state("ab\ncd\nef", 1, 4);
        assert!(tab_indent(&mut st).unwrap());
        assert_eq!(st.buffer().text(), "\tab\n\tcd\nef");
        assert_eq!(st.selection(), Selection::new(2, 6));
        assert_eq!(st.undo_stack().undo_depth(), 1);
    }

    #[test]
    fn single_line_indent_falls_through() {
        let mut st = state("ab\ncd", 0, 2);
        assert!(!tab_indent(&mut st).unwrap());
        assert_eq!(st.buffer().text(), "ab\ncd");
    }

    #[test]
    fn unindent_refuses_mixed_lines() {
        let mut st = state("\tfoo\nbar", 0, 8);
        assert!(!unindent(&mut st).unwrap());
        assert_eq!(st.buffer().text(), "\tfoo\nbar");
        assert_eq!(st.undo_stack().undo_depth(), 0);
    }

    #[test]
    fn unindent_strips_exactly_one_tab() {
        let mut st = state("\t\tfoo\n\tbar", 0, 10);
        assert!(unindent(&mut st).unwrap());
        assert_eq!(st.buffer().text(), "\tfoo\nbar");
        assert_eq!(st.selection(), Selection::new(0, 8));
    }

    #[test]
    fn newline_copies_leading_tabs() {
        let mut st = state("\tfoo", 4, 4);
        assert!(auto_indent_newline(&mut st).unwrap());
        assert_eq!(st.buffer().text(), "\tfoo\n\t");
        assert_eq!(st.selection(), Selection::caret_at(6));
        assert_eq!(st.undo_stack().undo_depth(), 1);
    }

    #[test]
    fn newline_indent_stops_at_caret_and_swallows_blanks_after_it() {
        let mut st = state("    ab  cd", 1, 1);
        assert!(auto_indent_newline(&mut st).unwrap());
        assert_eq!(st.buffer().text(), " \n ab  cd");

        let mut st = state("  ab  cd\r\nx", 4, 4);
        assert!(auto_indent_newline(&mut st).unwrap());
        assert_eq!(st.buffer().text(), "  ab\r\n  cd\r\nx");
        assert_eq!(st.selection(), Selection::caret_at(8));
    }

    #[test]
    fn newline_with_selection_is_not_applicable() {
        let mut st = state("\tab", 1, 3);
        assert!(!auto_indent_newline(&mut st).unwrap());
        assert_eq!(st.buffer().text(), "\tab");
    }
}
