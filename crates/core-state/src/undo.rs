use core_events::ModelChange;
use core_text::{Buffer, TextResult};
use tracing::{trace, warn};

use crate::selection::Selection;

/// Default number of units retained in undo history.
pub const UNDO_HISTORY_MAX: usize = 200;

/// One atomic replace: `removed` was at `start` before, `inserted` is there after.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub start: usize,
    pub removed: String,
    pub inserted: String,
}

impl Change {
    pub fn removed_chars(&self) -> usize {
        self.removed.chars().count()
    }
    pub fn inserted_chars(&self) -> usize {
        self.inserted.chars().count()
    }
}

/// A single undo/redo step: one or more changes plus the selection on either side.
#[derive(Debug, Clone)]
pub struct UndoUnit {
    pub changes: Vec<Change>,
    pub selection_before: Selection,
    pub selection_after: Selection,
}

impl UndoUnit {
    fn open(selection: Selection) -> Self {
        Self {
            changes: Vec::new(),
            selection_before: selection,
            selection_after: selection,
        }
    }
}

/// Result of applying an undo or redo step.
#[derive(Debug, Clone)]
pub struct Applied {
    pub selection: Selection,
    pub changes: Vec<ModelChange>,
}

/// Undo/redo history with compound grouping and a clean marker.
///
/// Compound changes nest: only the outermost `end_compound_change` seals the
/// unit. A sealed compound with no changes is discarded so operations that
/// turn out to be not applicable never leave an empty undo step behind.
#[derive(Debug)]
pub struct UndoStack {
    undo_stack: Vec<UndoUnit>,
    redo_stack: Vec<UndoUnit>,
    open: Option<UndoUnit>,
    compound_depth: usize,
    /// Undo depth at which the buffer was last marked clean; `None` when that
    /// state is no longer reachable.
    clean_at: Option<usize>,
    history_max: usize,
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new(UNDO_HISTORY_MAX)
    }
}

impl UndoStack {
    pub fn new(history_max: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            open: None,
            compound_depth: 0,
            clean_at: Some(0),
            history_max: history_max.max(1),
        }
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }
    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }
    pub fn in_compound(&self) -> bool {
        self.compound_depth > 0
    }

    pub fn start_compound_change(&mut self, selection: Selection) {
        self.compound_depth += 1;
        if self.compound_depth == 1 {
            self.open = Some(UndoUnit::open(selection));
        }
        trace!(target: "state.undo", depth = self.compound_depth, "compound_start");
    }

    pub fn end_compound_change(&mut self, selection: Selection) {
        if self.compound_depth == 0 {
            warn!(target: "state.undo", "compound_end_without_start");
            return;
        }
        self.compound_depth -= 1;
        trace!(target: "state.undo", depth = self.compound_depth, "compound_end");
        if self.compound_depth > 0 {
            return;
        }
        if let Some(mut unit) = self.open.take() {
            if unit.changes.is_empty() {
                trace!(target: "state.undo", "compound_discarded_empty");
                return;
            }
            unit.selection_after = selection;
            self.push_unit(unit);
        }
    }

    /// Record a committed change. Outside a compound it forms its own unit.
    pub fn record(&mut self, change: Change, before: Selection, after: Selection) {
        match self.open.as_mut() {
            Some(unit) => unit.changes.push(change),
            None => self.push_unit(UndoUnit {
                changes: vec![change],
                selection_before: before,
                selection_after: after,
            }),
        }
    }

    fn push_unit(&mut self, unit: UndoUnit) {
        if let Some(c) = self.clean_at
            && c > self.undo_stack.len()
        {
            // clean state lived on the redo side and is discarded with it
            self.clean_at = None;
        }
        self.undo_stack.push(unit);
        trace!(target: "state.undo", undo_depth = self.undo_stack.len(), redo_depth = self.redo_stack.len(), "push_unit");
        if self.undo_stack.len() > self.history_max {
            let _ = self.undo_stack.remove(0);
            self.clean_at = self.clean_at.and_then(|c| c.checked_sub(1));
            trace!(target: "state.undo", "undo_stack_trimmed");
        }
        if !self.redo_stack.is_empty() {
            self.redo_stack.clear();
            trace!(target: "state.undo", "redo_stack_cleared_on_new_edit");
        }
    }

    /// Revert the most recent unit. Returns `None` when there is nothing to
    /// undo or a compound change is still open.
    pub fn undo(&mut self, buffer: &mut Buffer) -> TextResult<Option<Applied>> {
        if self.compound_depth > 0 {
            warn!(target: "state.undo", "undo_inside_compound_ignored");
            return Ok(None);
        }
        let Some(unit) = self.undo_stack.pop() else {
            return Ok(None);
        };
        let mut changes = Vec::with_capacity(unit.changes.len());
        for change in unit.changes.iter().rev() {
            let added = change.inserted_chars();
            buffer.replace(change.start, change.start + added, &change.removed)?;
            changes.push(ModelChange {
                start: change.start,
                removed_chars: added,
                added_chars: change.removed_chars(),
            });
        }
        let selection = unit.selection_before;
        self.redo_stack.push(unit);
        trace!(target: "state.undo", undo_depth = self.undo_stack.len(), redo_depth = self.redo_stack.len(), "undo_pop");
        Ok(Some(Applied { selection, changes }))
    }

    /// Reapply the most recently undone unit.
    pub fn redo(&mut self, buffer: &mut Buffer) -> TextResult<Option<Applied>> {
        if self.compound_depth > 0 {
            warn!(target: "state.undo", "redo_inside_compound_ignored");
            return Ok(None);
        }
        let Some(unit) = self.redo_stack.pop() else {
            return Ok(None);
        };
        let mut changes = Vec::with_capacity(unit.changes.len());
        for change in &unit.changes {
            let removed = change.removed_chars();
            buffer.replace(change.start, change.start + removed, &change.inserted)?;
            changes.push(ModelChange {
                start: change.start,
                removed_chars: removed,
                added_chars: change.inserted_chars(),
            });
        }
        let selection = unit.selection_after;
        self.undo_stack.push(unit);
        trace!(target: "state.undo", undo_depth = self.undo_stack.len(), redo_depth = self.redo_stack.len(), "redo_pop");
        Ok(Some(Applied { selection, changes }))
    }

    pub fn is_clean(&self) -> bool {
        let pending = self.open.as_ref().is_some_and(|u| !u.changes.is_empty());
        !pending && self.clean_at == Some(self.undo_stack.len())
    }

    pub fn mark_clean(&mut self) {
        self.clean_at = Some(self.undo_stack.len());
    }

    pub fn reset(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.open = None;
        self.compound_depth = 0;
        self.clean_at = Some(0);
        trace!(target: "state.undo", "reset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(buf: &mut Buffer, stack: &mut UndoStack, start: usize, end: usize, text: &str) {
        let removed = buf.replace(start, end, text).unwrap();
        let sel = Selection::caret_at(start);
        stack.record(
            Change {
                start,
                removed,
                inserted: text.to_string(),
            },
            sel,
            Selection::caret_at(start + text.chars().count()),
        );
    }

    #[test]
    fn single_edit_undo_redo() {
        let mut buf = Buffer::from_str("t", "hello");
        let mut stack = UndoStack::default();
        apply(&mut buf, &mut stack, 5, 5, " world");
        assert_eq!(buf.text(), "hello world");
        let applied = stack.undo(&mut buf).unwrap().unwrap();
        assert_eq!(buf.text(), "hello");
        assert_eq!(applied.selection, Selection::caret_at(5));
        assert_eq!(applied.changes[0].removed_chars, 6);
        stack.redo(&mut buf).unwrap().unwrap();
        assert_eq!(buf.text(), "hello world");
        assert!(stack.redo(&mut buf).unwrap().is_none());
    }

    #[test]
    fn compound_groups_into_one_step_and_restores_selection() {
        let mut buf = Buffer::from_str("t", "abc");
        let mut stack = UndoStack::default();
        let before = Selection::new(1, 2);
        stack.start_compound_change(before);
        stack.start_compound_change(before); // nested
        apply(&mut buf, &mut stack, 0, 0, "x");
        apply(&mut buf, &mut stack, 4, 4, "y");
        stack.end_compound_change(Selection::new(9, 9));
        assert_eq!(stack.undo_depth(), 0, "inner end must not seal");
        stack.end_compound_change(Selection::new(2, 3));
        assert_eq!(stack.undo_depth(), 1);
        assert_eq!(buf.text(), "xabcy");
        let applied = stack.undo(&mut buf).unwrap().unwrap();
        assert_eq!(buf.text(), "abc");
        assert_eq!(applied.selection, before);
        let applied = stack.redo(&mut buf).unwrap().unwrap();
        assert_eq!(buf.text(), "xabcy");
        assert_eq!(applied.selection, Selection::new(2, 3));
    }

    #[test]
    fn empty_compound_is_discarded() {
        let mut stack = UndoStack::default();
        stack.start_compound_change(Selection::caret_at(0));
        stack.end_compound_change(Selection::caret_at(0));
        assert_eq!(stack.undo_depth(), 0);
        assert!(stack.is_clean());
    }

    #[test]
    fn clean_marker_tracks_history() {
        let mut buf = Buffer::from_str("t", "");
        let mut stack = UndoStack::default();
        assert!(stack.is_clean());
        apply(&mut buf, &mut stack, 0, 0, "a");
        assert!(!stack.is_clean());
        stack.mark_clean();
        assert!(stack.is_clean());
        stack.undo(&mut buf).unwrap();
        assert!(!stack.is_clean());
        stack.redo(&mut buf).unwrap();
        assert!(stack.is_clean());
        stack.undo(&mut buf).unwrap();
        apply(&mut buf, &mut stack, 0, 0, "b");
        assert!(!stack.is_clean());
        stack.undo(&mut buf).unwrap();
        assert!(!stack.is_clean(), "clean state was discarded with the redo stack");
        stack.reset();
        assert!(stack.is_clean());
        assert_eq!(stack.undo_depth(), 0);
    }

    #[test]
    fn history_is_capped() {
        let mut buf = Buffer::from_str("t", "");
        let mut stack = UndoStack::new(3);
        for i in 0..5 {
            apply(&mut buf, &mut stack, i, i, "x");
        }
        assert_eq!(stack.undo_depth(), 3);
        while stack.undo(&mut buf).unwrap().is_some() {}
        assert_eq!(buf.text(), "xx");
    }

    #[test]
    fn undo_refused_while_compound_open() {
        let mut buf = Buffer::from_str("t", "");
        let mut stack = UndoStack::default();
        apply(&mut buf, &mut stack, 0, 0, "a");
        stack.start_compound_change(Selection::caret_at(1));
        assert!(stack.undo(&mut buf).unwrap().is_none());
        stack.end_compound_change(Selection::caret_at(1));
        assert!(stack.undo(&mut buf).unwrap().is_some());
    }
}
