//! Caret and selection model.
//!
//! A selection is stored as `(anchor, caret)`. `start()`/`end()` expose the
//! normalized range; the caret is whichever end the user extended last, so
//! `set(start, end)` with `start > end` yields a backward selection whose caret
//! sits at the smaller offset. Every code path that rebuilds a selection keeps
//! that orientation explicit instead of guessing it.

use core_events::SelectionChange;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    pub anchor: usize,
    pub caret: usize,
}

impl Selection {
    pub const fn new(anchor: usize, caret: usize) -> Self {
        Self { anchor, caret }
    }
    pub const fn caret_at(offset: usize) -> Self {
        Self {
            anchor: offset,
            caret: offset,
        }
    }
    pub fn start(&self) -> usize {
        self.anchor.min(self.caret)
    }
    pub fn end(&self) -> usize {
        self.anchor.max(self.caret)
    }
    pub fn range(&self) -> (usize, usize) {
        (self.start(), self.end())
    }
    pub fn is_empty(&self) -> bool {
        self.anchor == self.caret
    }
    pub fn is_backward(&self) -> bool {
        self.caret < self.anchor
    }
    fn clamped(self, len: usize) -> Self {
        Self {
            anchor: self.anchor.min(len),
            caret: self.caret.min(len),
        }
    }
}

/// Owner of the current selection plus the notifications and reveal requests
/// produced by changing it.
#[derive(Debug, Default)]
pub struct SelectionController {
    current: Selection,
    changes: Vec<SelectionChange>,
    reveal: Option<Selection>,
}

impl SelectionController {
    pub fn get(&self) -> Selection {
        self.current
    }

    /// Set the selection clamped to `len`. Returns true when the value changed.
    /// `show` requests that the caret be revealed even when nothing changed.
    pub fn set(&mut self, selection: Selection, show: bool, len: usize) -> bool {
        let next = selection.clamped(len);
        let old = self.current;
        if show {
            self.reveal = Some(next);
        }
        if next == old {
            return false;
        }
        self.current = next;
        self.changes.push(SelectionChange {
            old: old.range(),
            new: next.range(),
        });
        trace!(target: "state.selection", anchor = next.anchor, caret = next.caret, show, "selection_set");
        true
    }

    /// Pending selection notifications, oldest first.
    pub fn take_changes(&mut self) -> Vec<SelectionChange> {
        std::mem::take(&mut self.changes)
    }

    /// Pending reveal request, if any.
    pub fn take_reveal(&mut self) -> Option<Selection> {
        self.reveal.take()
    }
}
