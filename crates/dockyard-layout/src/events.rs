//! Notifications raised by engine operations.
//!
//! Events are queued during a call and handed to the host through
//! [`EventQueue::drain`]; nothing is dispatched re-entrantly.

use std::collections::VecDeque;

use crate::node::NodeId;

/// Something the host may want to react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DockEvent {
    /// The hidden bit of `node` toggled; `was_hidden` is the old value.
    VisibilityChanged { node: NodeId, was_hidden: bool },
    FloatingChanged { node: NodeId, is_floating: bool },
    /// `node` got a new parent after a move.
    ParentChanged { node: NodeId },
    TabSelected { node: NodeId },
    /// The root stack is `root` (after load or when its identity changed).
    RootChanged { root: NodeId },
}

/// FIFO of pending events.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventQueue {
    pending: VecDeque<DockEvent>,
}

impl EventQueue {
    pub fn push(&mut self, event: DockEvent) {
        tracing::trace!(?event, "dock event queued");
        self.pending.push_back(event);
    }

    /// Take every pending event in the order raised.
    pub fn drain(&mut self) -> Vec<DockEvent> {
        self.pending.drain(..).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
