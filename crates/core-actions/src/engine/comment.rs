//! Line comment toggle and block comment add/remove.

use super::{LineRange, SpanEdit, apply_span_edits, oriented, replace_and_select, selected_lines};
use crate::{CommentMarkers, EditResult};
use core_state::EditorState;
use core_text::{Buffer, TextResult};
use tracing::debug;

/// Column of `marker` when it is the first non-blank text of `line`.
fn line_comment_column(line: &str, marker: &str) -> Option<usize> {
    let rest = line.trim_start_matches([' ', '\t']);
    rest.starts_with(marker)
        .then(|| line[..line.len() - rest.len()].chars().count())
}

/// Comment every spanned line, or uncomment them all when every line already
/// starts with the marker after leading blanks. Never toggles a subset.
pub fn toggle_line_comment(state: &mut EditorState, markers: &CommentMarkers) -> EditResult {
    let marker = markers.line.as_str();
    if marker.is_empty() {
        return Ok(false);
    }
    let LineRange { first, last } = selected_lines(state)?;
    let buf = state.buffer();
    let mut uncomment = Vec::with_capacity(last - first + 1);
    for line in first..=last {
        let text = buf.line(line, false)?;
        match line_comment_column(&text, marker) {
            Some(col) => uncomment.push(buf.line_start(line)? + col),
            None => {
                uncomment.clear();
                break;
            }
        }
    }
    let remove = !uncomment.is_empty();
    let edits = if remove {
        let len = marker.chars().count();
        uncomment.into_iter().map(|at| SpanEdit::delete(at, len)).collect()
    } else {
        (first..=last)
            .map(|line| Ok(SpanEdit::insert(buf.line_start(line)?, marker)))
            .collect::<TextResult<Vec<_>>>()?
    };
    let span_start = buf.line_start(first)?;
    let span_end = buf.line_end(last, false)?;
    apply_span_edits(state, span_start, span_end, &edits)?;
    debug!(target: "actions.engine", op = "toggle_line_comment", first, last, uncomment = remove, "lines_toggled");
    Ok(true)
}

/// Wrap the selection in block comment markers. Nested markers inside the
/// selection are stripped first. Inside an existing block comment this is a
/// consumed no-op; an empty selection is not applicable.
pub fn add_block_comment(state: &mut EditorState, markers: &CommentMarkers) -> EditResult {
    let (open, close) = (markers.block_start.as_str(), markers.block_end.as_str());
    let sel = state.selection();
    let (start, end) = sel.range();
    if start == end || open.is_empty() || close.is_empty() {
        return Ok(false);
    }
    let buf = state.buffer();
    if let (Some(at), Some(_)) = enclosing_comment(buf, start, end, open, close)? {
        debug!(target: "actions.engine", op = "add_block_comment", comment_start = at, "already_commented");
        return Ok(true);
    }
    let stripped = strip_markers(&buf.text_range(start, end)?, open, close);
    let inner_start = start + open.chars().count();
    let inner_end = inner_start + stripped.chars().count();
    let wrapped = format!("{open}{stripped}{close}");
    replace_and_select(state, start, end, &wrapped, oriented(sel, inner_start, inner_end))?;
    debug!(target: "actions.engine", op = "add_block_comment", start, end, "block_commented");
    Ok(true)
}

/// Unwrap the block comment found inside the selection, or failing that the
/// one enclosing it. `Ok(false)` when neither exists.
pub fn remove_block_comment(state: &mut EditorState, markers: &CommentMarkers) -> EditResult {
    let (open, close) = (markers.block_start.as_str(), markers.block_end.as_str());
    if open.is_empty() || close.is_empty() {
        return Ok(false);
    }
    let open_chars: Vec<char> = open.chars().collect();
    let close_chars: Vec<char> = close.chars().collect();
    let sel = state.selection();
    let (start, end) = sel.range();
    let buf = state.buffer();
    let selected: Vec<char> = buf.text_range(start, end)?.chars().collect();
    // First open marker paired with the first close marker after it.
    let inside = find_chars(&selected, &open_chars, 0).and_then(|o| {
        find_chars(&selected, &close_chars, o + open_chars.len())
            .map(|c| (start + o, start + c + close_chars.len()))
    });
    let (comment_start, comment_end) = match inside {
        Some(range) => range,
        None => match enclosing_comment(buf, start, end, open, close)? {
            (Some(s), Some(e)) => (s, e + close_chars.len()),
            _ => {
                debug!(target: "actions.engine", op = "remove_block_comment", "no_comment_found");
                return Ok(false);
            }
        },
    };
    let body = buf.text_range(comment_start + open_chars.len(), comment_end - close_chars.len())?;
    let body_end = comment_start + body.chars().count();
    replace_and_select(
        state,
        comment_start,
        comment_end,
        &body,
        oriented(sel, comment_start, body_end),
    )?;
    debug!(target: "actions.engine", op = "remove_block_comment", comment_start, comment_end, "block_uncommented");
    Ok(true)
}

/// Locate the block comment surrounding `[start, end)`: the nearest unmatched
/// open marker ending at or before `start` and the nearest close marker at or
/// after `end`. Each side is `None` when the scan meets the opposite marker
/// first or runs off the buffer.
fn enclosing_comment(
    buf: &Buffer,
    start: usize,
    end: usize,
    open: &str,
    close: &str,
) -> TextResult<(Option<usize>, Option<usize>)> {
    let open: Vec<char> = open.chars().collect();
    let close: Vec<char> = close.chars().collect();

    let first_line = buf.line_at_offset(start)?;
    let mut comment_start = None;
    for line in (0..=first_line).rev() {
        let line_start = buf.line_start(line)?;
        let text: Vec<char> = buf.line(line, false)?.chars().collect();
        let limit = if line == first_line {
            start - line_start
        } else {
            text.len()
        };
        match (rfind_chars(&text, &open, limit), rfind_chars(&text, &close, limit)) {
            (o, Some(c)) if o.is_none_or(|o| c > o) => break,
            (Some(o), _) => {
                comment_start = Some(line_start + o);
                break;
            }
            _ => {}
        }
    }

    let last_line = buf.line_at_offset(end)?;
    let mut comment_end = None;
    for line in last_line..buf.line_count() {
        let line_start = buf.line_start(line)?;
        let text: Vec<char> = buf.line(line, false)?.chars().collect();
        let from = if line == last_line { end - line_start } else { 0 };
        match (find_chars(&text, &open, from), find_chars(&text, &close, from)) {
            (Some(o), c) if c.is_none_or(|c| o < c) => break,
            (_, Some(c)) => {
                comment_end = Some(line_start + c);
                break;
            }
            _ => {}
        }
    }
    Ok((comment_start, comment_end))
}

/// First index `>= from` where `needle` occurs.
fn find_chars(hay: &[char], needle: &[char], from: usize) -> Option<usize> {
    let last = hay.len().checked_sub(needle.len())?;
    (from..=last).find(|&i| hay[i..i + needle.len()] == *needle)
}

/// Last index where `needle` occurs and ends at or before `limit`.
fn rfind_chars(hay: &[char], needle: &[char], limit: usize) -> Option<usize> {
    let last = limit.min(hay.len()).checked_sub(needle.len())?;
    (0..=last)
        .rev()
        .find(|&i| hay[i..i + needle.len()] == *needle)
}

/// Remove every occurrence of either marker, scanning left to right.
fn strip_markers(text: &str, open: &str, close: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(c) = rest.chars().next() {
        if rest.starts_with(open) {
            rest = &rest[open.len()..];
        } else if rest.starts_with(close) {
            rest = &rest[close.len()..];
        } else {
            out.push(c);
            rest = &rest[c.len_utf8()..];
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_state::Selection;

    fn state(text: &str, anchor: usize, caret: usize) -> EditorState {
        let mut st = EditorState::new(Buffer::from_str("t", text));
        st.set_selection(anchor, caret, false);
        st
    }

    #[test]
    fn comments_every_line_at_column_zero() {
        let markers = CommentMarkers::default();
        let mut st = state("  a\nb\n\nc", 2, 7);
        assert!(toggle_line_comment(&mut st, &markers).unwrap());
        assert_eq!(st.buffer().text(), "//  a\n//b\n//\nc");
        assert_eq!(st.selection(), Selection::new(4, 13));
    }

    #[test]
    fn uncomments_only_when_every_line_is_commented() {
        let markers = CommentMarkers::default();
        let mut st = state("  // a\n\t//b", 0, 11);
        assert!(toggle_line_comment(&mut st, &markers).unwrap());
        assert_eq!(st.buffer().text(), "   a\n\tb");

        let mut mixed = state("// a\nb", 0, 6);
        assert!(toggle_line_comment(&mut mixed, &markers).unwrap());
        assert_eq!(mixed.buffer().text(), "//// a\n//b");
    }

    #[test]
    fn toggle_twice_restores_text_and_selection() {
        let markers = CommentMarkers::default();
        let mut st = state("alpha\n  beta\ngamma\n", 3, 14);
        toggle_line_comment(&mut st, &markers).unwrap();
        toggle_line_comment(&mut st, &markers).unwrap();
        assert_eq!(st.buffer().text(), "alpha\n  beta\ngamma\n");
        assert_eq!(st.selection(), Selection::new(3, 14));
    }

    #[test]
    fn add_block_comment_wraps_and_strips_nested_markers() {
        let markers = CommentMarkers::default();
        let mut st = state("x a/*b*/c y", 2, 9);
        assert!(add_block_comment(&mut st, &markers).unwrap());
        assert_eq!(st.buffer().text(), "x /*abc*/ y");
        assert_eq!(st.selection(), Selection::new(4, 7));
    }

    #[test]
    fn add_block_comment_inside_comment_is_noop() {
        let markers = CommentMarkers::default();
        let mut st = state("a /* hello\nworld */ b", 5, 10);
        assert!(add_block_comment(&mut st, &markers).unwrap());
        assert_eq!(st.buffer().text(), "a /* hello\nworld */ b");
        assert_eq!(st.selection(), Selection::new(5, 10));
        assert_eq!(st.undo_stack().undo_depth(), 0);
    }

    #[test]
    fn add_block_comment_on_empty_selection_is_not_applicable() {
        let markers = CommentMarkers::default();
        let mut st = state("abc", 1, 1);
        assert!(!add_block_comment(&mut st, &markers).unwrap());
        assert_eq!(st.buffer().text(), "abc");
    }

    #[test]
    fn remove_prefers_comment_inside_selection() {
        let markers = CommentMarkers::default();
        let mut st = state("k /*abc*/ z", 0, 11);
        assert!(remove_block_comment(&mut st, &markers).unwrap());
        assert_eq!(st.buffer().text(), "k abc z");
        assert_eq!(st.selection(), Selection::new(2, 5));
    }

    #[test]
    fn remove_unwraps_only_the_first_of_two_selected_comments() {
        let markers = CommentMarkers::default();
        let mut st = state("/*a*/ b /*c*/", 0, 13);
        assert!(remove_block_comment(&mut st, &markers).unwrap());
        assert_eq!(st.buffer().text(), "a b /*c*/");
        assert_eq!(st.selection(), Selection::new(0, 1));
        assert!(!remove_block_comment(&mut st, &markers).unwrap());
    }

    #[test]
    fn add_block_comment_after_a_closed_comment_wraps() {
        let markers = CommentMarkers::default();
        let mut st = state("/* x */ sel", 8, 11);
        assert!(add_block_comment(&mut st, &markers).unwrap());
        assert_eq!(st.buffer().text(), "/* x */ /*sel*/");
        assert_eq!(st.selection(), Selection::new(10, 13));
        assert_eq!(st.undo_stack().undo_depth(), 1);
    }

    #[test]
    fn remove_falls_back_to_enclosing_comment() {
        let markers = CommentMarkers::default();
        let mut st = state("q /* in\nside */ r", 5, 9);
        assert!(remove_block_comment(&mut st, &markers).unwrap());
        assert_eq!(st.buffer().text(), "q  in\nside  r");
        assert_eq!(st.selection(), Selection::new(2, 11));

        let mut none = state("/* a */ b", 8, 9);
        assert!(!remove_block_comment(&mut none, &markers).unwrap());
    }
}
