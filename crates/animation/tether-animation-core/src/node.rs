//! Per-node timing state shared by leaves and groups.

use serde::{Deserialize, Serialize};

use crate::ids::AnimationId;
use crate::job::AnimationJob;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnimationState {
    Stopped,
    Paused,
    Running,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

impl Direction {
    /// Sign applied to clock deltas.
    pub fn sign(self) -> i32 {
        match self {
            Direction::Forward => 1,
            Direction::Backward => -1,
        }
    }
}

/// Child bookkeeping of a sequential group.
#[derive(Debug, Default)]
pub(crate) struct Sequential {
    pub children: Vec<AnimationId>,
    pub current: Option<AnimationId>,
    pub previous_loop: i32,
}

/// Child bookkeeping of a parallel group.
#[derive(Debug, Default)]
pub(crate) struct Parallel {
    pub children: Vec<AnimationId>,
    pub previous_loop: i32,
    pub previous_current_time: i32,
}

pub(crate) enum NodeKind {
    Leaf(Box<dyn AnimationJob>),
    Sequential(Sequential),
    Parallel(Parallel),
}

/// What kind of node an id refers to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NodeType {
    Leaf,
    Sequential,
    Parallel,
}

pub(crate) struct Node {
    pub kind: NodeKind,
    pub parent: Option<AnimationId>,
    pub state: AnimationState,
    pub direction: Direction,
    /// `-1` loops forever; `0` never runs.
    pub loop_count: i32,
    pub current_loop: i32,
    /// Time within the current loop.
    pub current_time: i32,
    /// Time across all loops.
    pub total_current_time: i32,
    /// Listed among the clock's top-level animations.
    pub registered: bool,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            state: AnimationState::Stopped,
            direction: Direction::Forward,
            loop_count: 1,
            current_loop: 0,
            current_time: 0,
            total_current_time: 0,
            registered: false,
        }
    }

    pub fn node_type(&self) -> NodeType {
        match self.kind {
            NodeKind::Leaf(_) => NodeType::Leaf,
            NodeKind::Sequential(_) => NodeType::Sequential,
            NodeKind::Parallel(_) => NodeType::Parallel,
        }
    }

    pub fn children(&self) -> &[AnimationId] {
        match &self.kind {
            NodeKind::Leaf(_) => &[],
            NodeKind::Sequential(s) => &s.children,
            NodeKind::Parallel(p) => &p.children,
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<AnimationId>> {
        match &mut self.kind {
            NodeKind::Leaf(_) => None,
            NodeKind::Sequential(s) => Some(&mut s.children),
            NodeKind::Parallel(p) => Some(&mut p.children),
        }
    }
}
