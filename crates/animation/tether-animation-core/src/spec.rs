//! JSON description of an animation tree.

use serde::{Deserialize, Serialize};
use tether_api_core::{ObjectId, PropertyHost, PropertyIndex};

use crate::error::{AnimationError, Result};
use crate::ids::AnimationId;
use crate::job::{Easing, PauseAnimation, PropertyAnimation};
use crate::tree::AnimationTree;

fn one() -> i32 {
    1
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnimationSpec {
    Sequential {
        #[serde(default = "one")]
        loops: i32,
        children: Vec<AnimationSpec>,
    },
    Parallel {
        #[serde(default = "one")]
        loops: i32,
        children: Vec<AnimationSpec>,
    },
    Pause {
        duration: i32,
        #[serde(default = "one")]
        loops: i32,
    },
    Property {
        object: u32,
        property: u32,
        #[serde(default)]
        member: Option<u32>,
        #[serde(default)]
        from: Option<f64>,
        to: f64,
        duration: i32,
        #[serde(default)]
        easing: Easing,
        #[serde(default = "one")]
        loops: i32,
    },
}

impl AnimationSpec {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| AnimationError::InvalidSpec(e.to_string()))
    }

    fn loops(&self) -> i32 {
        match self {
            AnimationSpec::Sequential { loops, .. }
            | AnimationSpec::Parallel { loops, .. }
            | AnimationSpec::Pause { loops, .. }
            | AnimationSpec::Property { loops, .. } => *loops,
        }
    }
}

impl AnimationTree {
    /// Create the nodes described by `spec` and return the root.
    pub fn build(&mut self, spec: &AnimationSpec, host: &mut dyn PropertyHost) -> Result<AnimationId> {
        let id = match spec {
            AnimationSpec::Sequential { children, .. } | AnimationSpec::Parallel { children, .. } => {
                let group = if matches!(spec, AnimationSpec::Sequential { .. }) {
                    self.add_sequential()
                } else {
                    self.add_parallel()
                };
                for child in children {
                    let child = self.build(child, host)?;
                    self.append(group, child, host)?;
                }
                group
            }
            AnimationSpec::Pause { duration, .. } => {
                if *duration < 0 {
                    return Err(AnimationError::InvalidSpec(format!(
                        "pause duration {duration} is negative"
                    )));
                }
                self.add_job(PauseAnimation::new(*duration))
            }
            AnimationSpec::Property {
                object,
                property,
                member,
                from,
                to,
                duration,
                easing,
                ..
            } => {
                if *duration < 0 {
                    return Err(AnimationError::InvalidSpec(format!(
                        "property animation duration {duration} is negative"
                    )));
                }
                let index = match member {
                    Some(m) => PropertyIndex::member(*property, *m),
                    None => PropertyIndex::new(*property),
                };
                let mut job =
                    PropertyAnimation::new(ObjectId(*object), index, *to, *duration).easing(*easing);
                if let Some(from) = from {
                    job = job.with_from(*from);
                }
                self.add_job(job)
            }
        };
        self.set_loop_count(id, spec.loops())?;
        Ok(id)
    }
}
