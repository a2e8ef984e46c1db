//! Parallel groups: all children play at once, the longest one sets the length.

use tether_api_core::PropertyHost;

use crate::ids::AnimationId;
use crate::node::{AnimationState, Direction, NodeKind, Parallel};
use crate::tree::AnimationTree;

impl AnimationTree {
    fn par(&self, group: AnimationId) -> Option<&Parallel> {
        match &self.node(group)?.kind {
            NodeKind::Parallel(p) => Some(p),
            _ => None,
        }
    }

    fn par_mut(&mut self, group: AnimationId) -> Option<&mut Parallel> {
        match &mut self.node_mut(group)?.kind {
            NodeKind::Parallel(p) => Some(p),
            _ => None,
        }
    }

    /// Whether `child` should be playing at the group's current loop time.
    fn par_should_start(&self, group: AnimationId, child: AnimationId, start_if_at_end: bool) -> bool {
        let Some(node) = self.node(group) else { return false };
        let time = node.current_time;
        let dura = self.total_duration_of(child);
        if dura == -1 {
            return !self.uncontrolled_finish.contains_key(&child);
        }
        if start_if_at_end {
            time <= dura
        } else if node.direction == Direction::Forward {
            time < dura
        } else {
            time != 0 && time <= dura
        }
    }

    /// Bring a child into the group's running or paused state.
    fn par_apply_group_state(&mut self, group: AnimationId, child: AnimationId, host: &mut dyn PropertyHost) {
        match self.state(group) {
            Some(AnimationState::Running) => self.start_node(child, host),
            Some(AnimationState::Paused) => self.pause_node(child, host),
            _ => {}
        }
    }

    pub(crate) fn par_update_current_time(
        &mut self,
        group: AnimationId,
        time: i32,
        host: &mut dyn PropertyHost,
    ) {
        let children = self.children(group).to_vec();
        if children.is_empty() {
            return;
        }
        let current_loop = self.current_loop(group).unwrap_or(0);
        let (previous_loop, previous_time) = self
            .par(group)
            .map_or((0, 0), |p| (p.previous_loop, p.previous_current_time));

        if current_loop > previous_loop {
            // Finish the loop that was left behind.
            let mut dura = self.duration_of(group);
            if dura < 0 {
                for &child in &children {
                    let d = self.total_duration_of(child);
                    if d >= 0 {
                        dura = dura.max(d);
                    }
                }
            }
            if dura > 0 {
                for &child in &children {
                    if self.state(child) != Some(AnimationState::Stopped) {
                        self.set_time(child, dura, host);
                    }
                }
            }
        } else if current_loop < previous_loop {
            // Seeking back across a loop boundary: rewind everything.
            for &child in &children {
                self.par_apply_group_state(group, child, host);
                self.set_time(child, 0, host);
                self.stop_node(child, host);
            }
        }

        for &child in &children {
            let dura = self.total_duration_of(child);
            if current_loop > previous_loop || self.par_should_start(group, child, previous_time > dura) {
                self.par_apply_group_state(group, child, host);
            }
            if self.state(child) == self.state(group) {
                self.set_time(child, time, host);
                if dura > 0 && time > dura {
                    self.stop_node(child, host);
                }
            }
        }

        if let Some(par) = self.par_mut(group) {
            par.previous_loop = current_loop;
            par.previous_current_time = time;
        }
    }

    pub(crate) fn par_update_state(
        &mut self,
        group: AnimationId,
        new: AnimationState,
        old: AnimationState,
        host: &mut dyn PropertyHost,
    ) {
        let children = self.children(group).to_vec();
        match new {
            AnimationState::Stopped => {
                for child in children {
                    self.stop_node(child, host);
                }
            }
            AnimationState::Paused => {
                for child in children {
                    if self.state(child) == Some(AnimationState::Running) {
                        self.pause_node(child, host);
                    }
                }
            }
            AnimationState::Running => {
                let Some(node) = self.node(group) else { return };
                let (direction, loop_count) = (node.direction, node.loop_count);
                for child in children {
                    if old == AnimationState::Stopped {
                        self.stop_node(child, host);
                        if let Some(par) = self.par_mut(group) {
                            par.previous_loop = match direction {
                                Direction::Forward => 0,
                                Direction::Backward => loop_count - 1,
                            };
                        }
                    }
                    self.uncontrolled_finish.remove(&child);
                    self.set_dir(child, direction, host);
                    if self.par_should_start(group, child, old == AnimationState::Stopped) {
                        self.start_node(child, host);
                    }
                }
            }
        }
    }

    pub(crate) fn par_update_direction(
        &mut self,
        group: AnimationId,
        direction: Direction,
        host: &mut dyn PropertyHost,
    ) {
        if self.state(group) != Some(AnimationState::Stopped) {
            for child in self.children(group).to_vec() {
                self.set_dir(child, direction, host);
            }
            return;
        }
        let Some(node) = self.node(group) else { return };
        let loop_count = node.loop_count;
        let (previous_loop, previous_time) = match direction {
            Direction::Forward => (0, 0),
            // Looping backward forever has no last loop to start from.
            Direction::Backward => (
                if loop_count == -1 { 0 } else { loop_count - 1 },
                self.duration_of(group),
            ),
        };
        if let Some(par) = self.par_mut(group) {
            par.previous_loop = previous_loop;
            par.previous_current_time = previous_time;
        }
    }

    pub(crate) fn par_uncontrolled_finished(
        &mut self,
        group: AnimationId,
        child: AnimationId,
        host: &mut dyn PropertyHost,
    ) {
        let children = self.children(group).to_vec();
        let mut still_running = 0;
        for &other in &children {
            if other == child {
                let finish = self.current_time(child).unwrap_or(0);
                self.uncontrolled_finish.insert(child, finish);
            } else if (self.duration_of(other) == -1 || self.loop_count(other).unwrap_or(1) < 0)
                && !self.uncontrolled_finish.contains_key(&other)
            {
                still_running += 1;
            }
        }
        if still_running > 0 {
            return;
        }

        let longest = children
            .iter()
            .map(|&c| self.total_duration_of(c))
            .max()
            .unwrap_or(0)
            .max(0);
        if self.current_loop_time(group).unwrap_or(0) >= longest {
            self.stop_node(group, host);
        }
    }
}
