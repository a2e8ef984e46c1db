//! Notifications raised while the tree changes state.

use serde::{Deserialize, Serialize};

use crate::ids::AnimationId;
use crate::node::AnimationState;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum AnimationEvent {
    StateChanged {
        animation: AnimationId,
        new: AnimationState,
        old: AnimationState,
    },
    /// Raised when a node stops at its natural end, not on an explicit early stop.
    Finished { animation: AnimationId },
    CurrentLoopChanged { animation: AnimationId, current_loop: i32 },
}

impl AnimationEvent {
    pub fn animation(&self) -> AnimationId {
        match self {
            AnimationEvent::StateChanged { animation, .. }
            | AnimationEvent::Finished { animation }
            | AnimationEvent::CurrentLoopChanged { animation, .. } => *animation,
        }
    }
}

/// Bounded buffer between drains.
#[derive(Debug)]
pub(crate) struct EventQueue {
    events: Vec<AnimationEvent>,
    capacity: usize,
    dropped: usize,
}

impl EventQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            events: Vec::new(),
            capacity,
            dropped: 0,
        }
    }

    pub fn push(&mut self, event: AnimationEvent) {
        if self.events.len() < self.capacity {
            self.events.push(event);
        } else {
            if self.dropped == 0 {
                log::warn!("animation event queue full ({}), dropping events", self.capacity);
            }
            self.dropped += 1;
        }
    }

    pub fn drain(&mut self) -> Vec<AnimationEvent> {
        self.dropped = 0;
        std::mem::take(&mut self.events)
    }

    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }
}
