//! Editor session state: buffer, selection, undo history and notifications.
//!
//! `EditorState` is the explicit session object. It owns the buffer, the
//! selection controller and the undo stack; modes and commands receive it by
//! `&mut` and never the other way around.
//!
//! Mutation discipline:
//! - Every buffer edit goes through [`EditorState::replace`], which records the
//!   change in the undo stack, queues a `ModelChange` notification and places
//!   the caret after the inserted text.
//! - Multi-step operations bracket their edit(s) with
//!   `start_compound_change`/`end_compound_change` so one undo reverts the
//!   whole operation, including the selection.
//! - Notifications are queued, not delivered. The owner of the modes drains
//!   them with `take_model_changes` / `take_selection_changes` after the action
//!   that produced them completes, which guarantees listeners always observe a
//!   committed buffer.

use core_events::{ModelChange, SelectionChange, Subscriptions};
use core_text::{Buffer, TextResult};
use tracing::{debug, trace};

pub mod selection;
pub mod undo;

pub use selection::{Selection, SelectionController};
pub use undo::{Change, UNDO_HISTORY_MAX, UndoStack, UndoUnit};

/// A status message as reported to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub is_error: bool,
    pub is_progress: bool,
}

/// Receiver for status reports (the status line of the hosting UI).
pub trait StatusReporter {
    fn report(&mut self, message: &str, is_error: bool, is_progress: bool);
}

impl<F> StatusReporter for F
where
    F: FnMut(&str, bool, bool),
{
    fn report(&mut self, message: &str, is_error: bool, is_progress: bool) {
        self(message, is_error, is_progress)
    }
}

/// Top-level session state.
pub struct EditorState {
    buffer: Buffer,
    selection: SelectionController,
    undo: UndoStack,
    /// Listener registrations for verify / modify / selection notifications.
    pub subscriptions: Subscriptions,
    pending_changes: Vec<ModelChange>,
    status: Option<StatusMessage>,
    reporter: Option<Box<dyn StatusReporter>>,
    pub file_name: Option<std::path::PathBuf>,
}

impl EditorState {
    /// Create a new session around `buffer` with the default history size.
    pub fn new(buffer: Buffer) -> Self {
        Self::with_history(buffer, UNDO_HISTORY_MAX)
    }

    pub fn with_history(buffer: Buffer, history_max: usize) -> Self {
        Self {
            buffer,
            selection: SelectionController::default(),
            undo: UndoStack::new(history_max),
            subscriptions: Subscriptions::new(),
            pending_changes: Vec::new(),
            status: None,
            reporter: None,
            file_name: None,
        }
    }

    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    pub fn selection(&self) -> Selection {
        self.selection.get()
    }

    pub fn caret_offset(&self) -> usize {
        self.selection.get().caret
    }

    /// Set the selection to `anchor..caret`. Returns true if it changed.
    pub fn set_selection(&mut self, anchor: usize, caret: usize, show: bool) -> bool {
        self.set_selection_value(Selection::new(anchor, caret), show)
    }

    pub fn set_selection_value(&mut self, selection: Selection, show: bool) -> bool {
        let len = self.buffer.char_count();
        self.selection.set(selection, show, len)
    }

    pub fn set_caret_offset(&mut self, offset: usize, show: bool) -> bool {
        self.set_selection(offset, offset, show)
    }

    /// Zero-based (line, column) of the caret.
    pub fn caret_line_col(&self) -> (usize, usize) {
        let caret = self.caret_offset();
        let line = self.buffer.line_at_offset(caret).unwrap_or(0);
        let start = self.buffer.line_start(line).unwrap_or(0);
        (line, caret.saturating_sub(start))
    }

    /// Atomically replace `[start, end)` with `text`, recording undo and notifications.
    /// The caret ends up after the inserted text.
    pub fn replace(&mut self, start: usize, end: usize, text: &str) -> TextResult<String> {
        let before = self.selection.get();
        let removed = self.buffer.replace(start, end, text)?;
        let added_chars = text.chars().count();
        self.pending_changes.push(ModelChange {
            start,
            removed_chars: end - start,
            added_chars,
        });
        self.set_caret_offset(start + added_chars, false);
        let after = self.selection.get();
        self.undo.record(
            Change {
                start,
                removed: removed.clone(),
                inserted: text.to_string(),
            },
            before,
            after,
        );
        Ok(removed)
    }

    pub fn start_compound_change(&mut self) {
        let sel = self.selection.get();
        self.undo.start_compound_change(sel);
    }

    pub fn end_compound_change(&mut self) {
        let sel = self.selection.get();
        self.undo.end_compound_change(sel);
    }

    /// Revert the last undo unit. Returns true if something was undone.
    pub fn undo(&mut self) -> TextResult<bool> {
        let applied = self.undo.undo(&mut self.buffer)?;
        Ok(self.restore(applied, "undo"))
    }

    /// Reapply the last undone unit. Returns true if something was redone.
    pub fn redo(&mut self) -> TextResult<bool> {
        let applied = self.undo.redo(&mut self.buffer)?;
        Ok(self.restore(applied, "redo"))
    }

    fn restore(&mut self, applied: Option<undo::Applied>, op: &'static str) -> bool {
        let Some(applied) = applied else {
            return false;
        };
        trace!(target: "state.undo", op, changes = applied.changes.len(), "restore");
        self.pending_changes.extend(applied.changes);
        self.set_selection_value(applied.selection, true);
        true
    }

    pub fn undo_stack(&self) -> &UndoStack {
        &self.undo
    }

    pub fn is_clean(&self) -> bool {
        self.undo.is_clean()
    }

    pub fn mark_clean(&mut self) {
        self.undo.mark_clean();
    }

    pub fn reset_undo(&mut self) {
        self.undo.reset();
    }

    /// Drain queued model change notifications.
    pub fn take_model_changes(&mut self) -> Vec<ModelChange> {
        std::mem::take(&mut self.pending_changes)
    }

    /// Drain queued selection change notifications.
    pub fn take_selection_changes(&mut self) -> Vec<SelectionChange> {
        self.selection.take_changes()
    }

    /// Drain the pending reveal request produced by `show = true` selection updates.
    pub fn take_reveal(&mut self) -> Option<Selection> {
        self.selection.take_reveal()
    }

    pub fn set_status_reporter(&mut self, reporter: Box<dyn StatusReporter>) {
        self.reporter = Some(reporter);
    }

    /// Report a status message to the hosting UI and retain it as the last message.
    pub fn report_status(&mut self, message: impl Into<String>, is_error: bool, is_progress: bool) {
        let text = message.into();
        debug!(target: "state.status", message = text.as_str(), is_error, is_progress, "status");
        if let Some(r) = self.reporter.as_mut() {
            r.report(&text, is_error, is_progress);
        }
        self.status = Some(StatusMessage {
            text,
            is_error,
            is_progress,
        });
    }

    pub fn last_status(&self) -> Option<&StatusMessage> {
        self.status.as_ref()
    }
}
