//! Turns wall-clock deltas into animation time.

use crate::config::Config;

#[derive(Clone, Debug)]
pub struct AnimationClock {
    interval: i32,
    consistent: bool,
    slowdown: f64,
    elapsed: i64,
    ticks: u64,
}

impl AnimationClock {
    pub fn new(cfg: &Config) -> Self {
        Self {
            interval: cfg.tick_interval_ms,
            consistent: cfg.consistent_timing,
            slowdown: cfg.slowdown_factor,
            elapsed: 0,
            ticks: 0,
        }
    }

    /// Animation time that passes for a tick `elapsed_ms` after the previous one.
    pub fn advance(&mut self, elapsed_ms: i32) -> i32 {
        let raw = if self.consistent {
            self.interval
        } else {
            elapsed_ms.max(0)
        };
        let delta = if self.slowdown > 0.0 && self.slowdown != 1.0 {
            (f64::from(raw) / self.slowdown).round() as i32
        } else {
            raw
        };
        self.elapsed += i64::from(delta);
        self.ticks += 1;
        delta
    }

    /// Animation time since the clock was created or reset.
    pub fn elapsed(&self) -> i64 {
        self.elapsed
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn reset(&mut self) {
        self.elapsed = 0;
        self.ticks = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consistent_timing_ignores_wall_time() {
        let mut clock = AnimationClock::new(&Config {
            consistent_timing: true,
            ..Config::default()
        });
        assert_eq!(clock.advance(100), 16);
        assert_eq!(clock.advance(3), 16);
        assert_eq!(clock.elapsed(), 32);
        assert_eq!(clock.ticks(), 2);
    }

    #[test]
    fn slowdown_divides_deltas() {
        let mut clock = AnimationClock::new(&Config {
            slowdown_factor: 5.0,
            ..Config::default()
        });
        assert_eq!(clock.advance(50), 10);
        assert_eq!(clock.advance(-4), 0);
    }
}
