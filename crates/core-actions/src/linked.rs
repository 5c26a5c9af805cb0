//! Linked edit session.
//!
//! A session tracks groups of buffer ranges (template fields) while the user
//! edits inside them. It observes committed model changes:
//! * an edit fully inside one tracked position resizes that position and
//!   shifts every position after it (in iteration order) and the escape offset
//!   by the same delta;
//! * an edit touching anything else ends the session; the edit itself stands.
//!
//! Deltas are computed from the change first and applied in a single pass.
//! Tab / Shift+Tab cycle through the first position of each group; Enter and
//! cancel leave the session with the caret at the escape offset.

use crate::modes::EditorMode;
use core_events::{EventMask, ListenerId, ModelChange, Subscription};
use core_state::{EditorState, StatusMessage};
use std::cmp::Ordering;
use tracing::debug;

pub const LISTENER: ListenerId = ListenerId(2);

const ENTERED: &str = "Linked Mode entered";
const EXITED: &str = "Linked Mode exited";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkedPosition {
    pub offset: usize,
    pub length: usize,
}

impl LinkedPosition {
    pub fn new(offset: usize, length: usize) -> Self {
        Self { offset, length }
    }

    pub fn end(&self) -> usize {
        self.offset + self.length
    }

    fn contains(&self, change: &ModelChange) -> bool {
        self.offset <= change.start && change.old_end() <= self.end()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PositionGroup {
    pub positions: Vec<LinkedPosition>,
}

impl PositionGroup {
    pub fn single(offset: usize, length: usize) -> Self {
        Self {
            positions: vec![LinkedPosition::new(offset, length)],
        }
    }
}

/// What a session is seeded with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedModeModel {
    pub groups: Vec<PositionGroup>,
    pub escape_offset: usize,
}

#[derive(Debug, Default)]
pub struct LinkedEditSession {
    active: bool,
    groups: Vec<PositionGroup>,
    current: usize,
    escape_offset: usize,
    subscription: Option<Subscription>,
}

impl LinkedEditSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a session and select the first position of group 0. A running
    /// session is replaced. Returns false when the model has no positions.
    pub fn enter(&mut self, state: &mut EditorState, model: LinkedModeModel) -> bool {
        if model.groups.iter().all(|g| g.positions.is_empty()) {
            return false;
        }
        if self.active {
            self.exit(state, false);
        }
        self.groups = model.groups;
        self.escape_offset = model.escape_offset;
        self.current = 0;
        self.active = true;
        self.subscription = Some(state.subscriptions.subscribe(LISTENER, EventMask::MODIFY));
        debug!(target: "actions.linked", groups = self.groups.len(), escape = self.escape_offset, "linked_enter");
        state.report_status(ENTERED, false, false);
        self.select_current(state);
        true
    }

    pub fn groups(&self) -> &[PositionGroup] {
        &self.groups
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn escape_offset(&self) -> usize {
        self.escape_offset
    }

    pub fn next_position(&mut self, state: &mut EditorState) -> bool {
        if !self.active || self.groups.is_empty() {
            return false;
        }
        self.current = (self.current + 1) % self.groups.len();
        self.select_current(state);
        true
    }

    pub fn previous_position(&mut self, state: &mut EditorState) -> bool {
        if !self.active || self.groups.is_empty() {
            return false;
        }
        let n = self.groups.len();
        self.current = (self.current + n - 1) % n;
        self.select_current(state);
        true
    }

    fn select_current(&self, state: &mut EditorState) {
        let Some(pos) = self
            .groups
            .get(self.current)
            .and_then(|g| g.positions.first())
        else {
            return;
        };
        state.set_selection(pos.offset, pos.end(), true);
    }

    /// Observe one committed change.
    pub fn on_model_change(&mut self, state: &mut EditorState, change: &ModelChange) {
        if !self.active {
            return;
        }
        let hit = self.groups.iter().enumerate().find_map(|(g, group)| {
            group
                .positions
                .iter()
                .position(|p| p.contains(change))
                .map(|p| (g, p))
        });
        let Some(hit) = hit else {
            debug!(target: "actions.linked", start = change.start, removed = change.removed_chars, "edit_outside_positions");
            self.exit(state, false);
            return;
        };
        let delta = change.delta();
        for (g, group) in self.groups.iter_mut().enumerate() {
            for (p, pos) in group.positions.iter_mut().enumerate() {
                match (g, p).cmp(&hit) {
                    Ordering::Equal => pos.length = pos.length.saturating_add_signed(delta),
                    Ordering::Greater => pos.offset = pos.offset.saturating_add_signed(delta),
                    Ordering::Less => {}
                }
            }
        }
        self.escape_offset = self.escape_offset.saturating_add_signed(delta);
    }

    fn exit(&mut self, state: &mut EditorState, to_escape: bool) {
        state.subscriptions.unsubscribe(&mut self.subscription);
        self.active = false;
        self.groups.clear();
        self.current = 0;
        if to_escape {
            state.set_caret_offset(self.escape_offset, true);
        }
        state.report_status(EXITED, false, false);
        debug!(target: "actions.linked", to_escape, "linked_exit");
    }
}

impl EditorMode for LinkedEditSession {
    fn name(&self) -> &'static str {
        "linked"
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn is_status_active(&self) -> bool {
        self.active
    }

    fn status_message(&self) -> Option<StatusMessage> {
        self.active.then(|| StatusMessage {
            text: ENTERED.to_string(),
            is_error: false,
            is_progress: false,
        })
    }

    fn cancel(&mut self, state: &mut EditorState) -> bool {
        if !self.active {
            return false;
        }
        self.exit(state, true);
        true
    }

    fn line_up(&mut self, _state: &mut EditorState) -> bool {
        false
    }

    fn line_down(&mut self, _state: &mut EditorState) -> bool {
        false
    }

    fn enter(&mut self, state: &mut EditorState) -> bool {
        self.cancel(state)
    }
}
