//! Editor notifications and the publish/subscribe registry.
//!
//! Three notification kinds exist:
//! * `Verify`: fired before user text input reaches the buffer. Listeners may
//!   rewrite the text or veto the edit by clearing `doit`.
//! * `Modify`: recorded for every committed replace, delivered after the action
//!   that caused it completes.
//! * `Selection`: recorded whenever the selection value changes.
//!
//! Listeners are identified by a [`ListenerId`] chosen by the owner of the
//! registry. A subscription is an explicit token; dropping interest means
//! handing the token back through [`Subscriptions::unsubscribe`]. Delivery
//! order is registration order.

use tracing::trace;

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct EventMask: u8 {
        const VERIFY    = 0b0000_0001;
        const MODIFY    = 0b0000_0010;
        const SELECTION = 0b0000_0100;
    }
}

/// Pre-commit notification for user text input. `start..end` is the range
/// about to be replaced with `text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyEvent {
    pub start: usize,
    pub end: usize,
    pub text: String,
    /// Cleared by a listener to suppress the edit.
    pub doit: bool,
}

impl VerifyEvent {
    pub fn new(start: usize, end: usize, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
            doit: true,
        }
    }
}

/// Post-commit record of one atomic replace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelChange {
    pub start: usize,
    pub removed_chars: usize,
    pub added_chars: usize,
}

impl ModelChange {
    /// End of the replaced range before the edit.
    pub fn old_end(&self) -> usize {
        self.start + self.removed_chars
    }

    /// Net change in character count.
    pub fn delta(&self) -> isize {
        self.added_chars as isize - self.removed_chars as isize
    }
}

/// Selection value change. Ranges are normalized `(start, end)` pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionChange {
    pub old: (usize, usize),
    pub new: (usize, usize),
}

/// Identity of a listener as chosen by the registry owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u32);

/// Token proving a live registration. Deliberately neither `Clone` nor `Copy`
/// so each registration is released exactly once.
#[derive(Debug, PartialEq, Eq)]
pub struct Subscription {
    id: u64,
    listener: ListenerId,
}

impl Subscription {
    pub fn listener(&self) -> ListenerId {
        self.listener
    }
}

#[derive(Debug)]
struct Entry {
    id: u64,
    listener: ListenerId,
    mask: EventMask,
}

/// Ordered registry of listener interests.
#[derive(Debug, Default)]
pub struct Subscriptions {
    entries: Vec<Entry>,
    next_id: u64,
}

impl Subscriptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener` for the notification kinds in `mask`.
    pub fn subscribe(&mut self, listener: ListenerId, mask: EventMask) -> Subscription {
        self.next_id += 1;
        let id = self.next_id;
        self.entries.push(Entry { id, listener, mask });
        trace!(target: "events.subscriptions", listener = listener.0, mask = mask.bits(), id, "subscribe");
        Subscription { id, listener }
    }

    /// Release a registration. Taking the token out of the slot makes repeated
    /// calls harmless.
    pub fn unsubscribe(&mut self, slot: &mut Option<Subscription>) {
        if let Some(sub) = slot.take() {
            self.entries.retain(|e| e.id != sub.id);
            trace!(target: "events.subscriptions", listener = sub.listener.0, id = sub.id, "unsubscribe");
        }
    }

    /// Listeners interested in any kind of `mask`, in registration order, each listed once.
    pub fn listeners(&self, mask: EventMask) -> Vec<ListenerId> {
        let mut out: Vec<ListenerId> = Vec::new();
        for e in self.entries.iter().filter(|e| e.mask.intersects(mask)) {
            if !out.contains(&e.listener) {
                out.push(e.listener);
            }
        }
        out
    }

    pub fn is_subscribed(&self, listener: ListenerId, mask: EventMask) -> bool {
        self.entries
            .iter()
            .any(|e| e.listener == listener && e.mask.intersects(mask))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
