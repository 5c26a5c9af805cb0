//! Edit command engine.
//!
//! Every command reads the current selection, derives the spanned line range,
//! computes the complete replacement up front and then performs exactly one
//! `replace` inside a compound change followed by the new selection. A command
//! that cannot apply returns `Ok(false)` before touching the buffer, so no
//! partial multi-line transform and no empty undo unit can result.
//!
//! Line range rule: `first = line_at(start)`, `last = line_at(end - 1)` when
//! the selection is non-empty (else `line_at(end)`). A selection ending at
//! column 0 therefore does not drag the following line in.

use crate::{EditError, EditResult};
use core_state::{EditorState, Selection};
use core_text::TextResult;

mod assist;
mod comment;
mod goto;
mod indent;
mod lines;

pub use assist::accept_proposal;
pub use comment::{add_block_comment, remove_block_comment, toggle_line_comment};
pub use goto::{Column, goto_line, goto_line_column};
pub use indent::{auto_indent_newline, tab_indent, unindent};
pub use lines::{copy_lines_down, copy_lines_up, delete_lines, move_lines_down, move_lines_up};

/// Inclusive range of lines spanned by the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRange {
    pub first: usize,
    pub last: usize,
}

pub fn selected_lines(state: &EditorState) -> TextResult<LineRange> {
    let (start, end) = state.selection().range();
    let buf = state.buffer();
    let first = buf.line_at_offset(start)?;
    let last = buf.line_at_offset(if end > start { end - 1 } else { end })?;
    Ok(LineRange { first, last })
}

/// Run `edit` inside one compound change. The compound is closed on failure too.
pub(crate) fn compound<F>(state: &mut EditorState, edit: F) -> Result<(), EditError>
where
    F: FnOnce(&mut EditorState) -> Result<(), EditError>,
{
    state.start_compound_change();
    let result = edit(state);
    state.end_compound_change();
    result
}

/// Replace `[start, end)` with `text` and select `selection`, as one undo step.
pub(crate) fn replace_and_select(
    state: &mut EditorState,
    start: usize,
    end: usize,
    text: &str,
    selection: Selection,
) -> Result<(), EditError> {
    compound(state, |st| {
        st.replace(start, end, text)?;
        st.set_selection_value(selection, true);
        Ok(())
    })
}

/// Selection over `[start, end)` with the orientation of `like`.
pub(crate) fn oriented(like: Selection, start: usize, end: usize) -> Selection {
    if like.is_backward() {
        Selection::new(end, start)
    } else {
        Selection::new(start, end)
    }
}

pub(crate) fn shifted(sel: Selection, delta: isize) -> Selection {
    Selection::new(
        sel.anchor.saturating_add_signed(delta),
        sel.caret.saturating_add_signed(delta),
    )
}

/// One insertion or deletion in pre-edit coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SpanEdit {
    pub at: usize,
    pub remove: usize,
    pub insert: String,
}

impl SpanEdit {
    pub fn insert(at: usize, text: &str) -> Self {
        Self {
            at,
            remove: 0,
            insert: text.to_string(),
        }
    }

    pub fn delete(at: usize, len: usize) -> Self {
        Self {
            at,
            remove: len,
            insert: String::new(),
        }
    }
}

/// Apply ascending, non-overlapping `edits` that all fall inside
/// `[span_start, span_end)` as a single replace of that span. Anchor and caret
/// are carried through the edits individually.
pub(crate) fn apply_span_edits(
    state: &mut EditorState,
    span_start: usize,
    span_end: usize,
    edits: &[SpanEdit],
) -> EditResult {
    let old: Vec<char> = state
        .buffer()
        .text_range(span_start, span_end)?
        .chars()
        .collect();
    let mut out = String::with_capacity(old.len() + edits.len() * 2);
    let mut cursor = span_start;
    for e in edits {
        out.extend(&old[cursor - span_start..e.at - span_start]);
        out.push_str(&e.insert);
        cursor = e.at + e.remove;
    }
    out.extend(&old[cursor - span_start..]);

    let sel = state.selection();
    let next = Selection::new(map_offset(sel.anchor, edits), map_offset(sel.caret, edits));
    replace_and_select(state, span_start, span_end, &out, next)?;
    Ok(true)
}

/// Position of `offset` after `edits`. An offset equal to an insertion point
/// stays before the inserted text; one inside a deleted range collapses to
/// the deletion point.
fn map_offset(offset: usize, edits: &[SpanEdit]) -> usize {
    let mut delta: isize = 0;
    for e in edits {
        let inserted = e.insert.chars().count() as isize;
        if offset > e.at + e.remove {
            delta += inserted - e.remove as isize;
        } else if offset > e.at {
            return e.at.saturating_add_signed(delta);
        } else {
            break;
        }
    }
    offset.saturating_add_signed(delta)
}
