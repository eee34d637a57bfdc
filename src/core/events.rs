use crate::core::{BodyHandle, JointHandle};
use std::collections::VecDeque;

/// Lifecycle events recorded by the space, drained by the caller between
/// steps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorldEvent {
    /// A body has been added to the space
    BodyAdded(BodyHandle),

    /// A body has been removed from the space
    BodyRemoved(BodyHandle),

    /// A body has gone to sleep
    BodySlept(BodyHandle),

    /// A body has been woken (by contact, joint wake propagation, or the
    /// caller)
    BodyWoke(BodyHandle),

    /// A breakable joint exceeded its maximum reaction force and was removed
    JointBroken(JointHandle),
}

/// A queue of world events
#[derive(Debug, Default)]
pub struct EventQueue {
    events: VecDeque<WorldEvent>,
}

impl EventQueue {
    /// Creates a new empty event queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an event to the queue
    pub(crate) fn push(&mut self, event: WorldEvent) {
        self.events.push_back(event);
    }

    /// Removes and returns the oldest event
    pub fn pop(&mut self) -> Option<WorldEvent> {
        self.events.pop_front()
    }

    /// Iterates the queued events without draining them
    pub fn iter(&self) -> impl Iterator<Item = &WorldEvent> {
        self.events.iter()
    }

    /// Returns whether the queue is empty
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Returns the number of queued events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Clears all queued events
    pub fn clear(&mut self) {
        self.events.clear();
    }
}
