#![allow(dead_code)]
//! Identifiers and allocators for engine entities.

use serde::{Deserialize, Serialize};
use std::fmt;

use tether_api_core::ObjectId;

/// Handle to a binding record. The generation makes stale handles detectable
/// after the slot has been reused.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct BindingId {
    pub index: u32,
    pub generation: u32,
}

impl fmt::Display for BindingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "binding#{}v{}", self.index, self.generation)
    }
}

/// A loaded program: the closures of one document.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ProgramId(pub u32);

/// Monotonic allocator for objects and programs. Binding ids come from the arena.
#[derive(Default, Debug)]
pub struct IdAllocator {
    next_object: u32,
    next_program: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn alloc_object(&mut self) -> ObjectId {
        let id = ObjectId(self.next_object);
        self.next_object = self.next_object.wrapping_add(1);
        id
    }

    #[inline]
    pub fn alloc_program(&mut self) -> ProgramId {
        let id = ProgramId(self.next_program);
        self.next_program = self.next_program.wrapping_add(1);
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_monotonic() {
        let mut ids = IdAllocator::new();
        assert_eq!(ids.alloc_object(), ObjectId(0));
        assert_eq!(ids.alloc_object(), ObjectId(1));
        assert_eq!(ids.alloc_program(), ProgramId(0));
        assert_eq!(ids.alloc_program(), ProgramId(1));
    }
}
