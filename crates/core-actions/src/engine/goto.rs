//! Goto line / column.

use crate::{EditError, EditResult, LinePrompt};
use core_state::EditorState;
use tracing::debug;

/// Column target within a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Column {
    /// Zero-based character column, clamped to the line length.
    Offset(usize),
    /// Select the first occurrence of this text in the line.
    Find(String),
}

/// Ask the prompt for a 1-based line number and jump there. Cancelled or
/// non-numeric input is not applicable.
pub fn goto_line(state: &mut EditorState, prompt: &mut dyn LinePrompt) -> EditResult {
    let current = state.caret_line_col().0 + 1;
    let count = state.buffer().line_count();
    let Some(answer) = prompt.prompt(current, count) else {
        return Ok(false);
    };
    let Ok(line) = answer.trim().parse::<usize>() else {
        debug!(target: "actions.engine", op = "goto_line", input = answer.as_str(), "not_a_line_number");
        return Ok(false);
    };
    goto_line_column(state, line, Column::Offset(0), None)
}

/// Select within 1-based `line`. With `Column::Offset` the selection runs from
/// the column to `end` (a column too, defaulting to an empty selection); with
/// `Column::Find` it covers the first match, or lands at the line start when
/// there is none. The selection is revealed.
pub fn goto_line_column(
    state: &mut EditorState,
    line: usize,
    column: Column,
    end: Option<usize>,
) -> EditResult {
    let buf = state.buffer();
    if line == 0 || line > buf.line_count() {
        return Err(EditError::InvalidLine(line));
    }
    let index = line - 1;
    let line_start = buf.line_start(index)?;
    let line_len = buf.line_end(index, false)? - line_start;
    let (from, to) = match column {
        Column::Offset(col) => {
            let from = col.min(line_len);
            (from, end.map_or(from, |e| e.min(line_len)))
        }
        Column::Find(needle) => {
            let text = buf.line(index, false)?;
            match text.find(needle.as_str()) {
                Some(byte) if !needle.is_empty() => {
                    let from = text[..byte].chars().count();
                    (from, from + needle.chars().count())
                }
                _ => (0, 0),
            }
        }
    };
    state.set_selection(line_start + from, line_start + to, true);
    debug!(target: "actions.engine", op = "goto_line", line, from, to, "goto");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_state::Selection;
    use core_text::Buffer;

    fn state(text: &str) -> EditorState {
        EditorState::new(Buffer::from_str("t", text))
    }

    #[test]
    fn prompt_line_is_one_based_and_revealed() {
        let mut st = state("a\nbb\nccc");
        let mut prompt = |current: usize, count: usize| {
            assert_eq!((current, count), (1, 3));
            Some(" 3 ".to_string())
        };
        assert!(goto_line(&mut st, &mut prompt).unwrap());
        assert_eq!(st.selection(), Selection::caret_at(5));
        assert!(st.take_reveal().is_some());
    }

    #[test]
    fn cancelled_or_garbage_prompt_is_not_applicable() {
        let mut st = state("a\nb");
        let mut cancel = |_: usize, _: usize| -> Option<String> { None };
        assert!(!goto_line(&mut st, &mut cancel).unwrap());
        let mut garbage = |_: usize, _: usize| Some("two".to_string());
        assert!(!goto_line(&mut st, &mut garbage).unwrap());
        assert_eq!(st.caret_offset(), 0);
    }

    #[test]
    fn out_of_range_line_is_an_error() {
        let mut st = state("a\nb");
        assert_eq!(
            goto_line_column(&mut st, 3, Column::Offset(0), None),
            Err(EditError::InvalidLine(3))
        );
        assert_eq!(
            goto_line_column(&mut st, 0, Column::Offset(0), None),
            Err(EditError::InvalidLine(0))
        );
    }

    #[test]
    fn column_offsets_clamp_and_find_selects_match() {
        let mut st = state("first\nlet value = 1;");
        goto_line_column(&mut st, 2, Column::Offset(4), Some(99)).unwrap();
        assert_eq!(st.selection(), Selection::new(10, 20));
        goto_line_column(&mut st, 2, Column::Find("value".into()), None).unwrap();
        assert_eq!(st.selection(), Selection::new(10, 15));
        goto_line_column(&mut st, 2, Column::Find("missing".into()), None).unwrap();
        assert_eq!(st.selection(), Selection::caret_at(6));
    }
}
