//! The scheduler owns the clock, the animation tree and the spring drivers and
//! advances them together, one tick at a time.

use hashbrown::HashMap;
use tether_api_core::{InterceptedWrite, ObjectId, PropertyHost, PropertyIndex, WriteFlags};

use crate::clock::AnimationClock;
use crate::config::Config;
use crate::error::{AnimationError, Result};
use crate::events::AnimationEvent;
use crate::ids::{IdAllocator, SpringId};
use crate::spring::{SpringDriver, SpringParams};
use crate::tree::AnimationTree;

pub struct AnimationScheduler {
    cfg: Config,
    initialized: bool,
    clock: AnimationClock,
    tree: AnimationTree,
    ids: IdAllocator,
    springs: Vec<SpringDriver>,
    /// Intercepted property (object, core index) -> driver that animates it.
    routes: HashMap<(ObjectId, u32), SpringId>,
}

impl AnimationScheduler {
    pub fn new(cfg: Config) -> Self {
        Self {
            clock: AnimationClock::new(&cfg),
            tree: AnimationTree::new(cfg.max_events_per_tick),
            cfg,
            initialized: false,
            ids: IdAllocator::new(),
            springs: Vec::new(),
            routes: HashMap::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    pub fn init(&mut self) {
        if !self.initialized {
            log::debug!("animation scheduler up (tick {}ms)", self.cfg.tick_interval_ms);
            self.initialized = true;
            self.clock.reset();
        }
    }

    /// Stop every running animation and spring. The tree and the drivers are kept.
    pub fn shutdown(&mut self, host: &mut dyn PropertyHost) {
        if !self.initialized {
            return;
        }
        for id in self.tree.top_level().to_vec() {
            self.tree.stop_node(id, host);
        }
        for spring in &mut self.springs {
            spring.clear();
        }
        self.initialized = false;
        log::debug!("animation scheduler down after {} ticks", self.clock.ticks());
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn clock(&self) -> &AnimationClock {
        &self.clock
    }

    pub fn tree(&self) -> &AnimationTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut AnimationTree {
        &mut self.tree
    }

    pub fn add_spring(&mut self, params: SpringParams) -> SpringId {
        let id = self.ids.alloc_spring();
        self.springs
            .push(SpringDriver::with_substep(params, self.cfg.spring_substep_ms));
        id
    }

    pub fn spring(&self, id: SpringId) -> Option<&SpringDriver> {
        self.springs.get(id.0 as usize)
    }

    pub fn spring_mut(&mut self, id: SpringId) -> Result<&mut SpringDriver> {
        self.springs
            .get_mut(id.0 as usize)
            .ok_or(AnimationError::UnknownSpring(id))
    }

    /// Send intercepted writes to `object`'s `core` property into `spring`.
    pub fn route(&mut self, object: ObjectId, core: u32, spring: SpringId) -> Result<()> {
        self.spring(spring).ok_or(AnimationError::UnknownSpring(spring))?;
        self.routes.insert((object, core), spring);
        Ok(())
    }

    pub fn unroute(&mut self, object: ObjectId, core: u32) -> Option<SpringId> {
        self.routes.remove(&(object, core))
    }

    /// Turn intercepted writes into spring targets. Writes with no route, or with a
    /// value that is not a number, are stored as-is. Returns how many were routed.
    pub fn route_intercepted(
        &mut self,
        writes: Vec<InterceptedWrite>,
        host: &mut dyn PropertyHost,
    ) -> usize {
        let mut routed = 0;
        for write in writes {
            let spring = self.routes.get(&(write.object, write.index.core)).copied();
            match (spring, write.value.as_number()) {
                (Some(spring), Some(to)) => {
                    if let Some(driver) = self.springs.get_mut(spring.0 as usize) {
                        driver.transition(write.object, write.index, to, None, host);
                        routed += 1;
                    }
                }
                _ => {
                    host.write(
                        write.object,
                        write.index,
                        write.value,
                        WriteFlags::BYPASS_INTERCEPTORS,
                    );
                }
            }
        }
        routed
    }

    /// Convenience for driving one property without going through interception.
    pub fn spring_to(
        &mut self,
        spring: SpringId,
        object: ObjectId,
        index: PropertyIndex,
        to: f64,
        host: &mut dyn PropertyHost,
    ) -> Result<()> {
        self.spring_mut(spring)?
            .transition(object, index, to, None, host);
        Ok(())
    }

    /// Advance the clock by one tick: top-level animations first, then springs,
    /// then any writes the host intercepted meanwhile. Returns the events raised.
    pub fn tick(
        &mut self,
        elapsed_ms: i32,
        host: &mut dyn PropertyHost,
    ) -> Result<Vec<AnimationEvent>> {
        if !self.initialized {
            return Err(AnimationError::NotInitialized);
        }
        let delta = self.clock.advance(elapsed_ms);
        self.tree.advance(delta, host);
        for spring in &mut self.springs {
            spring.step(delta, host);
        }
        let intercepted = host.take_intercepted();
        if !intercepted.is_empty() {
            self.route_intercepted(intercepted, host);
        }
        for spring in &mut self.springs {
            spring.retire();
        }
        let dropped = self.tree.dropped_events();
        if dropped > 0 {
            log::warn!("{dropped} animation events dropped this tick");
        }
        Ok(self.tree.take_events())
    }

    /// Nothing left to advance: no top-level animation running and every spring settled.
    pub fn is_idle(&self) -> bool {
        self.tree.top_level().is_empty() && self.springs.iter().all(SpringDriver::is_idle)
    }
}
