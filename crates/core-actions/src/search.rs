//! Incremental search mode.
//!
//! While active the mode swallows typed text through the verify hook and grows
//! its prefix instead, moving the selection to the next match. Backspace
//! shrinks the prefix; an empty prefix leaves the mode. Any selection change
//! the mode did not cause itself ends the search.

use crate::modes::EditorMode;
use core_events::{EventMask, ListenerId, SelectionChange, Subscription, VerifyEvent};
use core_state::{EditorState, StatusMessage};
use core_text::Direction;
use tracing::debug;

pub const LISTENER: ListenerId = ListenerId(1);

#[derive(Debug)]
pub struct IncrementalSearch {
    active: bool,
    reverse: bool,
    prefix: String,
    succeeded: bool,
    ignore_selection: bool,
    wrap: bool,
    subscription: Option<Subscription>,
}

impl Default for IncrementalSearch {
    fn default() -> Self {
        Self::new(true)
    }
}

impl IncrementalSearch {
    /// `wrap` controls whether find next/previous wraps around the buffer
    /// within the same keystroke.
    pub fn new(wrap: bool) -> Self {
        Self {
            active: false,
            reverse: false,
            prefix: String::new(),
            succeeded: true,
            ignore_selection: false,
            wrap,
            subscription: None,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn is_reverse(&self) -> bool {
        self.reverse
    }

    pub fn last_succeeded(&self) -> bool {
        self.succeeded
    }

    /// Toggle key. Enters the mode when inactive. While active an empty
    /// prefix cancels, otherwise searches again in the toggle's direction.
    pub fn toggle(&mut self, state: &mut EditorState, reverse: bool) -> bool {
        if !self.active {
            self.active = true;
            self.reverse = reverse;
            self.prefix.clear();
            self.succeeded = true;
            self.ignore_selection = false;
            self.subscription = Some(
                state
                    .subscriptions
                    .subscribe(LISTENER, EventMask::VERIFY | EventMask::SELECTION),
            );
            debug!(target: "actions.search", reverse, "search_enter");
            return true;
        }
        if self.prefix.is_empty() {
            return self.cancel(state);
        }
        self.reverse = reverse;
        if reverse {
            self.find_previous(state)
        } else {
            self.find_next(state)
        }
    }

    /// Verify hook: typed text extends the prefix and never reaches the buffer.
    pub fn on_verify(&mut self, state: &mut EditorState, event: &mut VerifyEvent) {
        if !self.active || event.text.is_empty() {
            return;
        }
        event.doit = false;
        self.prefix.push_str(&event.text);
        let sel_start = state.selection().start();
        let found = if self.reverse {
            let from = sel_start + self.prefix.chars().count();
            self.search(state, from, Direction::Backward)
        } else {
            self.search(state, sel_start, Direction::Forward)
        };
        self.record(state, found);
    }

    /// Selection hook. The first change after one of our own selection moves
    /// is ours; anything else cancels the search.
    pub fn on_selection(&mut self, state: &mut EditorState, change: &SelectionChange) {
        if !self.active {
            return;
        }
        if self.ignore_selection {
            self.ignore_selection = false;
            return;
        }
        debug!(target: "actions.search", old = ?change.old, new = ?change.new, "foreign_selection_change");
        self.deactivate(state);
    }

    /// Backspace while active: drop the last prefix character and search
    /// backward for the shorter prefix, or leave the mode once it is empty.
    pub fn backspace(&mut self, state: &mut EditorState) -> bool {
        if !self.active {
            return false;
        }
        self.prefix.pop();
        let sel_start = state.selection().start();
        if self.prefix.is_empty() {
            self.deactivate(state);
            state.set_caret_offset(sel_start, true);
            return true;
        }
        let from = sel_start + self.prefix.chars().count();
        let found = self.search(state, from, Direction::Backward);
        self.record(state, found);
        true
    }

    pub fn find_next(&mut self, state: &mut EditorState) -> bool {
        if !self.active {
            return false;
        }
        let from = if self.succeeded {
            state.selection().start() + 1
        } else {
            0
        };
        let mut found = self.search(state, from, Direction::Forward);
        if found.is_none() && self.wrap && from > 0 {
            debug!(target: "actions.search", prefix = self.prefix.as_str(), "wrap_to_start");
            found = self.search(state, 0, Direction::Forward);
        }
        self.record(state, found);
        true
    }

    pub fn find_previous(&mut self, state: &mut EditorState) -> bool {
        if !self.active {
            return false;
        }
        let len = state.buffer().char_count();
        let from = if self.succeeded {
            (state.selection().start() + self.prefix.chars().count()).saturating_sub(1)
        } else {
            len
        };
        let mut found = self.search(state, from, Direction::Backward);
        if found.is_none() && self.wrap && from < len {
            debug!(target: "actions.search", prefix = self.prefix.as_str(), "wrap_to_end");
            found = self.search(state, len, Direction::Backward);
        }
        self.record(state, found);
        true
    }

    fn search(&self, state: &EditorState, from: usize, direction: Direction) -> Option<(usize, usize)> {
        let case_sensitive = self.prefix != self.prefix.to_lowercase();
        state
            .buffer()
            .find(&self.prefix, from, direction, case_sensitive)
    }

    fn record(&mut self, state: &mut EditorState, found: Option<(usize, usize)>) {
        match found {
            Some((start, end)) => {
                self.succeeded = true;
                if state.set_selection(start, end, true) {
                    self.ignore_selection = true;
                }
                debug!(target: "actions.search", prefix = self.prefix.as_str(), start, end, "match");
            }
            None => {
                self.succeeded = false;
                debug!(target: "actions.search", prefix = self.prefix.as_str(), "not_found");
            }
        }
    }

    fn deactivate(&mut self, state: &mut EditorState) {
        state.subscriptions.unsubscribe(&mut self.subscription);
        self.active = false;
        self.prefix.clear();
        self.succeeded = true;
        self.ignore_selection = false;
        debug!(target: "actions.search", "search_exit");
    }
}

impl EditorMode for IncrementalSearch {
    fn name(&self) -> &'static str {
        "incremental-search"
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn is_status_active(&self) -> bool {
        self.active
    }

    fn status_message(&self) -> Option<StatusMessage> {
        if !self.active {
            return None;
        }
        let label = if self.reverse {
            "Reverse incremental find"
        } else {
            "Incremental find"
        };
        let text = if self.succeeded {
            format!("{label}: {}", self.prefix)
        } else {
            format!("{label}: {} (not found)", self.prefix)
        };
        Some(StatusMessage {
            text,
            is_error: !self.succeeded,
            is_progress: self.succeeded,
        })
    }

    fn cancel(&mut self, state: &mut EditorState) -> bool {
        if !self.active {
            return false;
        }
        self.deactivate(state);
        true
    }

    fn line_up(&mut self, state: &mut EditorState) -> bool {
        self.find_previous(state)
    }

    fn line_down(&mut self, state: &mut EditorState) -> bool {
        self.find_next(state)
    }

    fn enter(&mut self, state: &mut EditorState) -> bool {
        self.cancel(state)
    }
}
