//! Leaf animation jobs.
//!
//! A job only knows how to turn a local time into property writes. Looping,
//! direction and state bookkeeping live in the tree node that owns it.

use serde::{Deserialize, Serialize};
use tether_api_core::{ObjectId, PropertyHost, PropertyIndex, Value, WriteFlags};

use crate::node::AnimationState;

/// What a job asks of its node after an update.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum JobControl {
    Continue,
    /// The job decided it is done. Used by jobs with an undetermined duration.
    Stop,
}

pub trait AnimationJob {
    /// Length of one loop in milliseconds; `-1` when the job decides for itself when to stop.
    fn duration(&self) -> i32;

    /// Apply the job at local time `time` (already folded into the current loop).
    fn update_current_time(&mut self, time: i32, host: &mut dyn PropertyHost) -> JobControl;

    fn state_changed(
        &mut self,
        _new: AnimationState,
        _old: AnimationState,
        _host: &mut dyn PropertyHost,
    ) {
    }
}

/// Does nothing for a fixed time. Spaces out the children of a sequential group.
#[derive(Clone, Debug)]
pub struct PauseAnimation {
    duration: i32,
}

impl PauseAnimation {
    pub fn new(duration: i32) -> Self {
        Self {
            duration: duration.max(0),
        }
    }
}

impl AnimationJob for PauseAnimation {
    fn duration(&self) -> i32 {
        self.duration
    }

    fn update_current_time(&mut self, _time: i32, _host: &mut dyn PropertyHost) -> JobControl {
        JobControl::Continue
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    #[default]
    Linear,
    InQuad,
    OutQuad,
    InOutQuad,
    OutCubic,
}

impl Easing {
    /// Map progress in `[0, 1]` onto the curve.
    pub fn apply(self, t: f64) -> f64 {
        match self {
            Easing::Linear => t,
            Easing::InQuad => t * t,
            Easing::OutQuad => -t * (t - 2.0),
            Easing::InOutQuad => {
                let t = t * 2.0;
                if t < 1.0 {
                    t * t / 2.0
                } else {
                    let t = t - 1.0;
                    -0.5 * (t * (t - 2.0) - 1.0)
                }
            }
            Easing::OutCubic => {
                let t = t - 1.0;
                t * t * t + 1.0
            }
        }
    }
}

/// Interpolates a numeric property from `from` to `to`.
///
/// Without an explicit `from` the property's value is captured each time the
/// animation leaves the stopped state. Writes bypass interceptors so an animation
/// never feeds back into a behavior installed on its own target.
#[derive(Clone, Debug)]
pub struct PropertyAnimation {
    pub object: ObjectId,
    pub index: PropertyIndex,
    pub from: Option<f64>,
    pub to: f64,
    pub duration: i32,
    pub easing: Easing,
    start_value: f64,
}

impl PropertyAnimation {
    pub fn new(object: ObjectId, index: PropertyIndex, to: f64, duration: i32) -> Self {
        Self {
            object,
            index,
            from: None,
            to,
            duration: duration.max(0),
            easing: Easing::Linear,
            start_value: to,
        }
    }

    pub fn with_from(mut self, from: f64) -> Self {
        self.from = Some(from);
        self.start_value = from;
        self
    }

    pub fn easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    /// The value the current run interpolates from.
    pub fn start_value(&self) -> f64 {
        self.start_value
    }

    fn value_at(&self, time: i32) -> f64 {
        let progress = if self.duration <= 0 {
            1.0
        } else {
            (time as f64 / self.duration as f64).clamp(0.0, 1.0)
        };
        self.start_value + (self.to - self.start_value) * self.easing.apply(progress)
    }
}

impl AnimationJob for PropertyAnimation {
    fn duration(&self) -> i32 {
        self.duration
    }

    fn update_current_time(&mut self, time: i32, host: &mut dyn PropertyHost) -> JobControl {
        let value = self.value_at(time);
        host.write(
            self.object,
            self.index,
            Value::Number(value),
            WriteFlags::BYPASS_INTERCEPTORS,
        );
        JobControl::Continue
    }

    fn state_changed(
        &mut self,
        new: AnimationState,
        old: AnimationState,
        host: &mut dyn PropertyHost,
    ) {
        if old == AnimationState::Stopped && new != AnimationState::Stopped {
            self.start_value = match self.from {
                Some(from) => from,
                None => host.read(self.object, self.index).as_number().unwrap_or(self.to),
            };
        }
    }
}
