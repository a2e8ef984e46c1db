//! Spring / velocity follower for numeric properties.
//!
//! A driver holds one parameter set and any number of active properties. Each
//! property chases its own target; once it settles it leaves the active set and
//! the driver stops consuming clock time altogether when the set is empty.

use serde::{Deserialize, Serialize};
use tether_api_core::{ObjectId, PropertyHost, PropertyIndex, Value, WriteFlags};

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpringParams {
    /// Spring constant. Zero selects velocity or track mode.
    pub spring: f64,
    pub damping: f64,
    pub mass: f64,
    /// Settling threshold for both distance and velocity.
    pub epsilon: f64,
    /// Wrap values into `[0, modulus)`; zero disables wrapping.
    pub modulus: f64,
    /// Units per second. Caps spring velocity; drives velocity mode when `spring` is zero.
    pub max_velocity: f64,
}

impl Default for SpringParams {
    fn default() -> Self {
        Self {
            spring: 0.0,
            damping: 0.1,
            mass: 1.0,
            epsilon: 0.01,
            modulus: 0.0,
            max_velocity: 0.0,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpringMode {
    /// Jump straight to the target.
    Track,
    /// Constant speed toward the target.
    Velocity,
    /// Damped spring integration.
    Spring,
}

impl SpringParams {
    pub fn mode(&self) -> SpringMode {
        if self.spring == 0.0 && self.max_velocity == 0.0 {
            SpringMode::Track
        } else if self.spring > 0.0 {
            SpringMode::Spring
        } else {
            SpringMode::Velocity
        }
    }
}

/// One property being driven.
#[derive(Clone, Debug, PartialEq)]
pub struct SpringTarget {
    pub object: ObjectId,
    pub index: PropertyIndex,
    pub current: f64,
    pub velocity: f64,
    pub to: f64,
    /// Driver time at which the current transition started (velocity mode).
    start: i64,
    /// Expected length of a velocity-mode transition in milliseconds.
    duration: f64,
    /// Target value this entry settled on during the last step.
    settled_at: Option<f64>,
}

#[derive(Debug)]
pub struct SpringDriver {
    params: SpringParams,
    mode: SpringMode,
    substep_ms: i64,
    /// Driver-local clock, reset whenever the active set empties.
    time: i64,
    last_time: i64,
    active: Vec<SpringTarget>,
}

impl SpringDriver {
    pub fn new(params: SpringParams) -> Self {
        Self::with_substep(params, 16)
    }

    pub fn with_substep(params: SpringParams, substep_ms: i32) -> Self {
        Self {
            mode: params.mode(),
            params,
            substep_ms: i64::from(substep_ms.max(1)),
            time: 0,
            last_time: 0,
            active: Vec::new(),
        }
    }

    pub fn params(&self) -> &SpringParams {
        &self.params
    }

    pub fn mode(&self) -> SpringMode {
        self.mode
    }

    pub fn is_idle(&self) -> bool {
        self.active.is_empty()
    }

    pub fn active(&self) -> &[SpringTarget] {
        &self.active
    }

    pub fn target(&self, object: ObjectId, index: PropertyIndex) -> Option<&SpringTarget> {
        self.active
            .iter()
            .find(|t| t.object == object && t.index == index)
    }

    fn velocity_ms(&self) -> f64 {
        self.params.max_velocity / 1000.0
    }

    fn distance(&self, from: f64, to: f64) -> f64 {
        let modulus = self.params.modulus;
        let dist = (from - to).abs();
        if modulus != 0.0 && dist > modulus / 2.0 {
            modulus - dist % modulus
        } else {
            dist
        }
    }

    /// Replace the parameters. Properties in flight keep their value and velocity;
    /// velocity-mode transitions are re-timed from their remaining distance.
    pub fn set_params(&mut self, params: SpringParams) {
        self.params = params;
        self.mode = params.mode();
        if self.mode == SpringMode::Velocity {
            let velocity_ms = self.velocity_ms();
            for i in 0..self.active.len() {
                let dist = self.distance(self.active[i].current, self.active[i].to);
                let entry = &mut self.active[i];
                entry.start = self.last_time;
                entry.duration = dist / velocity_ms;
            }
        }
    }

    /// Start chasing `to`. Without `from` the chase continues from the property's
    /// present value, keeping any velocity already built up.
    pub fn transition(
        &mut self,
        object: ObjectId,
        index: PropertyIndex,
        to: f64,
        from: Option<f64>,
        host: &mut dyn PropertyHost,
    ) {
        if self.mode == SpringMode::Track {
            self.active
                .retain(|t| !(t.object == object && t.index == index));
            host.write(object, index, Value::Number(to), WriteFlags::BYPASS_INTERCEPTORS);
            return;
        }
        if self.active.is_empty() {
            self.time = 0;
            self.last_time = 0;
        }

        let current = from.unwrap_or_else(|| host.read(object, index).as_number().unwrap_or(to));
        let duration = if self.mode == SpringMode::Velocity {
            self.distance(current, to) / self.velocity_ms()
        } else {
            0.0
        };
        let start = self.last_time;
        match self
            .active
            .iter_mut()
            .find(|t| t.object == object && t.index == index)
        {
            Some(entry) => {
                entry.to = to;
                entry.current = current;
                entry.start = start;
                entry.duration = duration;
                entry.settled_at = None;
            }
            None => self.active.push(SpringTarget {
                object,
                index,
                current,
                velocity: 0.0,
                to,
                start,
                duration,
                settled_at: None,
            }),
        }
    }

    /// Advance every active property by `elapsed_ms` and write the new values.
    /// Settled properties stay listed until [`Self::retire`].
    pub fn step(&mut self, elapsed_ms: i32, host: &mut dyn PropertyHost) {
        if self.active.is_empty() {
            return;
        }
        if self.mode == SpringMode::Track {
            for entry in self.active.drain(..) {
                host.write(
                    entry.object,
                    entry.index,
                    Value::Number(entry.to),
                    WriteFlags::BYPASS_INTERCEPTORS,
                );
            }
            return;
        }

        self.time += i64::from(elapsed_ms.max(0));
        let elapsed = self.time - self.last_time;
        if elapsed == 0 {
            return;
        }
        if self.mode == SpringMode::Spring {
            if elapsed < self.substep_ms {
                return;
            }
            let count = elapsed / self.substep_ms;
            self.last_time = self.time - (elapsed - count * self.substep_ms);
        } else {
            self.last_time = self.time;
        }

        for i in 0..self.active.len() {
            let mut entry = self.active[i].clone();
            let settled = self.animate(&mut entry, elapsed);
            host.write(
                entry.object,
                entry.index,
                Value::Number(entry.current),
                WriteFlags::BYPASS_INTERCEPTORS,
            );
            if settled {
                entry.settled_at = Some(entry.to);
            }
            self.active[i] = entry;
        }
    }

    /// Drop properties that settled during the last step and whose target has not
    /// been changed since.
    pub fn retire(&mut self) -> usize {
        let before = self.active.len();
        self.active.retain(|t| t.settled_at != Some(t.to));
        if self.active.is_empty() {
            self.time = 0;
            self.last_time = 0;
        }
        before - self.active.len()
    }

    /// [`Self::step`] followed by [`Self::retire`].
    pub fn tick(&mut self, elapsed_ms: i32, host: &mut dyn PropertyHost) -> usize {
        self.step(elapsed_ms, host);
        self.retire()
    }

    /// Stop driving everything without writing.
    pub fn clear(&mut self) {
        self.active.clear();
        self.time = 0;
        self.last_time = 0;
    }

    fn wrap_diff(&self, mut diff: f64) -> f64 {
        let modulus = self.params.modulus;
        if modulus != 0.0 && diff.abs() > modulus / 2.0 {
            if diff < 0.0 {
                diff += modulus;
            } else {
                diff -= modulus;
            }
        }
        diff
    }

    fn animate(&self, entry: &mut SpringTarget, elapsed: i64) -> bool {
        let p = &self.params;
        let have_modulus = p.modulus != 0.0;
        let mut target = entry.to;
        if have_modulus {
            entry.current %= p.modulus;
            target %= p.modulus;
        }

        if self.mode == SpringMode::Spring {
            let count = elapsed / self.substep_ms;
            let step = self.substep_ms as f64;
            for _ in 0..count {
                let diff = self.wrap_diff(target - entry.current);
                if p.mass != 1.0 {
                    entry.velocity += (p.spring * diff - p.damping * entry.velocity) / p.mass;
                } else {
                    entry.velocity = entry.velocity + p.spring * diff - p.damping * entry.velocity;
                }
                if p.max_velocity > 0.0 {
                    entry.velocity = entry.velocity.clamp(-p.max_velocity, p.max_velocity);
                }
                entry.current += entry.velocity * step / 1000.0;
                if have_modulus {
                    entry.current %= p.modulus;
                    if entry.current < 0.0 {
                        entry.current += p.modulus;
                    }
                }
            }
            if entry.velocity.abs() < p.epsilon && (target - entry.current).abs() < p.epsilon {
                entry.velocity = 0.0;
                entry.current = target;
                return true;
            }
            false
        } else {
            let move_by = elapsed as f64 * self.velocity_ms();
            let diff = self.wrap_diff(target - entry.current);
            if diff > 0.0 {
                entry.current += move_by;
                if have_modulus {
                    entry.current %= p.modulus;
                }
            } else {
                entry.current -= move_by;
                if have_modulus && entry.current < 0.0 {
                    entry.current = entry.current % p.modulus + p.modulus;
                }
            }
            if (self.last_time - entry.start) as f64 >= entry.duration {
                entry.current = entry.to;
                return true;
            }
            false
        }
    }
}
