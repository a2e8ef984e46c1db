//! Errors reported by the animation tree and scheduler.

use thiserror::Error;

use crate::ids::{AnimationId, SpringId};

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum AnimationError {
    #[error("unknown animation {0}")]
    UnknownAnimation(AnimationId),
    #[error("{0} is not a group")]
    NotAGroup(AnimationId),
    #[error("cannot add {child} to {group}: it would contain itself")]
    WouldCycle { group: AnimationId, child: AnimationId },
    #[error("position {position} is out of range for {group} with {len} children")]
    PositionOutOfRange {
        group: AnimationId,
        position: usize,
        len: usize,
    },
    #[error("cannot pause {0} while it is stopped")]
    PauseWhileStopped(AnimationId),
    #[error("cannot resume {0}: it is not paused")]
    ResumeWhileNotPaused(AnimationId),
    #[error("unknown spring driver {0:?}")]
    UnknownSpring(SpringId),
    #[error("scheduler is not initialized")]
    NotInitialized,
    #[error("invalid animation description: {0}")]
    InvalidSpec(String),
}

pub type Result<T> = std::result::Result<T, AnimationError>;
