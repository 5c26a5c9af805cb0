//! Mode dispatch.
//!
//! Modes sit in a fixed priority list. Cancel, line up/down and enter go to
//! the first active mode; when none is active the key falls through to the
//! default editing behaviour.

use crate::linked::{self, LinkedEditSession};
use crate::search::{self, IncrementalSearch};
use core_events::{EventMask, ListenerId, ModelChange, SelectionChange, VerifyEvent};
use core_state::{EditorState, StatusMessage};
use tracing::debug;

/// Capability set shared by every mode.
pub trait EditorMode {
    fn name(&self) -> &'static str;
    fn is_active(&self) -> bool;
    /// True when the mode owns the status line.
    fn is_status_active(&self) -> bool;
    fn status_message(&self) -> Option<StatusMessage>;
    fn cancel(&mut self, state: &mut EditorState) -> bool;
    fn line_up(&mut self, state: &mut EditorState) -> bool;
    fn line_down(&mut self, state: &mut EditorState) -> bool;
    fn enter(&mut self, state: &mut EditorState) -> bool;
}

#[derive(Debug)]
pub enum ModeSlot {
    Search(IncrementalSearch),
    Linked(LinkedEditSession),
}

impl ModeSlot {
    fn mode(&self) -> &dyn EditorMode {
        match self {
            ModeSlot::Search(m) => m,
            ModeSlot::Linked(m) => m,
        }
    }

    fn mode_mut(&mut self) -> &mut dyn EditorMode {
        match self {
            ModeSlot::Search(m) => m,
            ModeSlot::Linked(m) => m,
        }
    }

    fn listener(&self) -> ListenerId {
        match self {
            ModeSlot::Search(_) => search::LISTENER,
            ModeSlot::Linked(_) => linked::LISTENER,
        }
    }
}

/// Dispatchable keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeKey {
    Cancel,
    LineUp,
    LineDown,
    Enter,
}

#[derive(Debug)]
pub struct ModeDispatcher {
    slots: Vec<ModeSlot>,
}

impl Default for ModeDispatcher {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ModeDispatcher {
    /// Incremental search first, linked editing second.
    pub fn new(search_wrap: bool) -> Self {
        Self {
            slots: vec![
                ModeSlot::Search(IncrementalSearch::new(search_wrap)),
                ModeSlot::Linked(LinkedEditSession::new()),
            ],
        }
    }

    /// Route `key` to the first active mode. Returns whether it was consumed.
    pub fn dispatch(&mut self, state: &mut EditorState, key: ModeKey) -> bool {
        let Some(slot) = self.slots.iter_mut().find(|s| s.mode().is_active()) else {
            return false;
        };
        let mode = slot.mode_mut();
        let consumed = match key {
            ModeKey::Cancel => mode.cancel(state),
            ModeKey::LineUp => mode.line_up(state),
            ModeKey::LineDown => mode.line_down(state),
            ModeKey::Enter => mode.enter(state),
        };
        debug!(target: "actions.dispatch", mode = mode.name(), key = ?key, consumed, "mode_dispatch");
        consumed
    }

    pub fn any_active(&self) -> bool {
        self.slots.iter().any(|s| s.mode().is_active())
    }

    /// The active mode owning the status line, if any.
    pub fn status_owner(&self) -> Option<&dyn EditorMode> {
        self.slots
            .iter()
            .map(ModeSlot::mode)
            .find(|m| m.is_active() && m.is_status_active())
    }

    pub fn search(&self) -> Option<&IncrementalSearch> {
        self.slots.iter().find_map(|s| match s {
            ModeSlot::Search(m) => Some(m),
            _ => None,
        })
    }

    pub fn search_mut(&mut self) -> Option<&mut IncrementalSearch> {
        self.slots.iter_mut().find_map(|s| match s {
            ModeSlot::Search(m) => Some(m),
            _ => None,
        })
    }

    pub fn linked(&self) -> Option<&LinkedEditSession> {
        self.slots.iter().find_map(|s| match s {
            ModeSlot::Linked(m) => Some(m),
            _ => None,
        })
    }

    pub fn linked_mut(&mut self) -> Option<&mut LinkedEditSession> {
        self.slots.iter_mut().find_map(|s| match s {
            ModeSlot::Linked(m) => Some(m),
            _ => None,
        })
    }

    fn slot_for(&mut self, listener: ListenerId) -> Option<&mut ModeSlot> {
        self.slots.iter_mut().find(|s| s.listener() == listener)
    }

    /// Offer user text to the verify listeners in registration order. Stops
    /// early once a listener vetoes the edit.
    pub fn deliver_verify(&mut self, state: &mut EditorState, event: &mut VerifyEvent) {
        for listener in state.subscriptions.listeners(EventMask::VERIFY) {
            if !event.doit {
                break;
            }
            if let Some(ModeSlot::Search(m)) = self.slot_for(listener) {
                m.on_verify(state, event);
            }
        }
    }

    pub fn deliver_model_change(&mut self, state: &mut EditorState, change: &ModelChange) {
        for listener in state.subscriptions.listeners(EventMask::MODIFY) {
            if let Some(ModeSlot::Linked(m)) = self.slot_for(listener) {
                m.on_model_change(state, change);
            }
        }
    }

    pub fn deliver_selection(&mut self, state: &mut EditorState, change: &SelectionChange) {
        for listener in state.subscriptions.listeners(EventMask::SELECTION) {
            if let Some(ModeSlot::Search(m)) = self.slot_for(listener) {
                m.on_selection(state, change);
            }
        }
    }
}
