#![allow(dead_code)]
//! Scheduler configuration.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Nominal clock period. Used as the tick delta when `consistent_timing` is on.
    pub tick_interval_ms: i32,
    /// Integration step of the spring driver.
    pub spring_substep_ms: i32,
    /// Events retained between drains; later events are dropped and counted.
    pub max_events_per_tick: usize,
    /// Advance every tick by exactly `tick_interval_ms`, ignoring the elapsed time passed in.
    pub consistent_timing: bool,
    /// Divides every tick delta (slow motion when greater than 1).
    pub slowdown_factor: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tick_interval_ms: 16,
            spring_substep_ms: 16,
            max_events_per_tick: 1024,
            consistent_timing: false,
            slowdown_factor: 1.0,
        }
    }
}
