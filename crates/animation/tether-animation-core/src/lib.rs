//! tether-animation-core: the animation clock, the sequential/parallel group
//! tree and the spring property driver.
//!
//! All timing is in integer milliseconds. Property writes go through the
//! [`tether_api_core::PropertyHost`] passed into each call, so the crate has no
//! opinion on where property values live.

pub mod clock;
pub mod config;
pub mod error;
pub mod events;
pub mod ids;
pub mod job;
pub mod node;
mod parallel;
pub mod scheduler;
mod sequential;
pub mod spec;
pub mod spring;
pub mod tree;

pub use clock::AnimationClock;
pub use config::Config;
pub use error::AnimationError;
pub use events::AnimationEvent;
pub use ids::{AnimationId, SpringId};
pub use job::{AnimationJob, Easing, JobControl, PauseAnimation, PropertyAnimation};
pub use node::{AnimationState, Direction, NodeType};
pub use scheduler::AnimationScheduler;
pub use spec::AnimationSpec;
pub use spring::{SpringDriver, SpringMode, SpringParams, SpringTarget};
pub use tree::AnimationTree;
pub use tether_api_core::{ObjectId, PropertyHost, PropertyIndex, Value};
