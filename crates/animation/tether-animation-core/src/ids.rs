#![allow(dead_code)]
//! Identifiers and simple allocators for animation entities.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A node of the animation tree: a leaf job or a group.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct AnimationId(pub u32);

impl fmt::Display for AnimationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "animation#{}", self.0)
    }
}

/// A spring driver owned by the scheduler.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct SpringId(pub u32);

/// Monotonic allocator. Ids double as dense indices into the owning tables.
#[derive(Default, Debug)]
pub struct IdAllocator {
    next_animation: u32,
    next_spring: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn alloc_animation(&mut self) -> AnimationId {
        let id = AnimationId(self.next_animation);
        self.next_animation = self.next_animation.wrapping_add(1);
        id
    }

    #[inline]
    pub fn alloc_spring(&mut self) -> SpringId {
        let id = SpringId(self.next_spring);
        self.next_spring = self.next_spring.wrapping_add(1);
        id
    }
}
