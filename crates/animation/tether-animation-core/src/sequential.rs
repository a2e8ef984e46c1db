//! Sequential groups: children play one after another.

use tether_api_core::PropertyHost;

use crate::ids::AnimationId;
use crate::node::{AnimationState, Direction, NodeKind, Sequential};
use crate::tree::AnimationTree;

/// Which child plays at the group's current loop time.
#[derive(Copy, Clone, Debug)]
struct ChildAt {
    child: AnimationId,
    /// Group time at which `child` starts.
    offset: i32,
    /// `child` comes after the group's current child.
    after_current: bool,
}

impl AnimationTree {
    fn seq(&self, group: AnimationId) -> Option<&Sequential> {
        match &self.node(group)?.kind {
            NodeKind::Sequential(s) => Some(s),
            _ => None,
        }
    }

    fn seq_mut(&mut self, group: AnimationId) -> Option<&mut Sequential> {
        match &mut self.node_mut(group)?.kind {
            NodeKind::Sequential(s) => Some(s),
            _ => None,
        }
    }

    /// A child's total duration, or the time it actually finished at when its
    /// duration is undetermined and it has already reported completion.
    pub(crate) fn actual_total_duration(&self, id: AnimationId) -> i32 {
        let total = self.total_duration_of(id);
        if total == -1 {
            if let (Some(&done), Some(node)) = (self.uncontrolled_finish.get(&id), self.node(id)) {
                if done >= 0
                    && (node.loop_count - 1 == node.current_loop
                        || node.state == AnimationState::Stopped)
                {
                    return done;
                }
            }
        }
        total
    }

    fn seq_child_at(&self, group: AnimationId) -> Option<ChildAt> {
        let node = self.node(group)?;
        let seq = self.seq(group)?;
        let last = *seq.children.last()?;
        let time = node.current_time;
        let backward = node.direction == Direction::Backward;

        let mut offset = 0;
        let mut duration = 0;
        let mut after_current = false;
        for &child in &seq.children {
            duration = self.actual_total_duration(child);
            // Undetermined children absorb all remaining time. Moving backward, an
            // exact boundary belongs to the earlier child.
            if duration == -1
                || time < offset + duration
                || (time == offset + duration && backward)
            {
                return Some(ChildAt {
                    child,
                    offset,
                    after_current,
                });
            }
            if seq.current == Some(child) {
                after_current = true;
            }
            offset += duration;
        }

        Some(ChildAt {
            child: last,
            offset: offset - duration,
            after_current,
        })
    }

    fn seq_at_end(&self, group: AnimationId) -> bool {
        let (Some(node), Some(seq)) = (self.node(group), self.seq(group)) else {
            return false;
        };
        let Some(current) = seq.current else {
            return false;
        };
        node.current_loop == node.loop_count - 1
            && node.direction == Direction::Forward
            && seq.children.last() == Some(&current)
            && self.current_time(current) == Some(self.actual_total_duration(current))
    }

    pub(crate) fn seq_update_current_time(
        &mut self,
        group: AnimationId,
        time: i32,
        host: &mut dyn PropertyHost,
    ) {
        let Some(current) = self.seq(group).and_then(|s| s.current) else {
            return;
        };
        let Some(target) = self.seq_child_at(group) else {
            return;
        };
        let previous_loop = self.seq(group).map_or(0, |s| s.previous_loop);
        let current_loop = self.current_loop(group).unwrap_or(0);

        let moved = current != target.child;
        if previous_loop < current_loop
            || (previous_loop == current_loop && moved && target.after_current)
        {
            self.seq_advance_forwards(group, target.child, previous_loop, current_loop, host);
        } else if previous_loop > current_loop
            || (previous_loop == current_loop && moved && !target.after_current)
        {
            self.seq_rewind_forwards(group, target.child, previous_loop, current_loop, host);
        }

        self.seq_set_current(group, Some(target.child), false, host);

        let local = time - target.offset;
        match self.seq(group).and_then(|s| s.current) {
            Some(current) => {
                self.set_time(current, local, host);
                if self.seq_at_end(group) {
                    // Keep the group from running past its last child.
                    let child_time = self
                        .seq(group)
                        .and_then(|s| s.current)
                        .and_then(|c| self.current_time(c))
                        .unwrap_or(local);
                    if let Some(node) = self.node_mut(group) {
                        node.current_time += child_time - local;
                    }
                    self.stop_node(group, host);
                }
            }
            None => {
                if let Some(node) = self.node_mut(group) {
                    node.current_time = 0;
                }
                self.stop_node(group, host);
            }
        }

        let current_loop = self.current_loop(group).unwrap_or(0);
        if let Some(seq) = self.seq_mut(group) {
            seq.previous_loop = current_loop;
        }
    }

    /// Finish every child between the current one and `target` so each one gets
    /// its end state applied.
    fn seq_advance_forwards(
        &mut self,
        group: AnimationId,
        target: AnimationId,
        previous_loop: i32,
        current_loop: i32,
        host: &mut dyn PropertyHost,
    ) {
        let children = self.children(group).to_vec();
        let position = |tree: &Self| {
            tree.seq(group)
                .and_then(|s| s.current)
                .and_then(|c| children.iter().position(|&x| x == c))
        };

        if previous_loop < current_loop {
            // Run out the rest of the previous loop.
            if let Some(from) = position(self) {
                for &child in &children[from..] {
                    self.seq_set_current(group, Some(child), true, host);
                    let end = self.actual_total_duration(child);
                    self.set_time(child, end, host);
                }
            }
            if children.len() == 1 {
                self.seq_activate_current(group, true, host);
            } else {
                self.seq_set_current(group, children.first().copied(), true, host);
            }
        }

        let (Some(from), Some(to)) = (position(self), children.iter().position(|&c| c == target))
        else {
            return;
        };
        if from > to {
            return;
        }
        for &child in &children[from..to] {
            self.seq_set_current(group, Some(child), true, host);
            let end = self.actual_total_duration(child);
            self.set_time(child, end, host);
        }
    }

    /// Mirror of [`Self::seq_advance_forwards`]: rewind every child between the
    /// current one and `target` to zero.
    fn seq_rewind_forwards(
        &mut self,
        group: AnimationId,
        target: AnimationId,
        previous_loop: i32,
        current_loop: i32,
        host: &mut dyn PropertyHost,
    ) {
        let children = self.children(group).to_vec();
        let position = |tree: &Self| {
            tree.seq(group)
                .and_then(|s| s.current)
                .and_then(|c| children.iter().position(|&x| x == c))
        };

        if previous_loop > current_loop {
            if let Some(from) = position(self) {
                for &child in children[..=from].iter().rev() {
                    self.seq_set_current(group, Some(child), true, host);
                    self.set_time(child, 0, host);
                }
            }
            if children.len() == 1 {
                self.seq_activate_current(group, true, host);
            } else {
                self.seq_set_current(group, children.last().copied(), true, host);
            }
        }

        let (Some(from), Some(to)) = (position(self), children.iter().position(|&c| c == target))
        else {
            return;
        };
        if from < to {
            return;
        }
        for &child in children[to + 1..=from].iter().rev() {
            self.seq_set_current(group, Some(child), true, host);
            self.set_time(child, 0, host);
        }
    }

    fn seq_restart(&mut self, group: AnimationId, host: &mut dyn PropertyHost) {
        let Some(node) = self.node(group) else { return };
        let (direction, loop_count) = (node.direction, node.loop_count);
        let children = self.children(group);
        let (first, last) = (children.first().copied(), children.last().copied());
        let current = self.seq(group).and_then(|s| s.current);

        let (previous_loop, target) = match direction {
            Direction::Forward => (0, first),
            Direction::Backward => (loop_count - 1, last),
        };
        if let Some(seq) = self.seq_mut(group) {
            seq.previous_loop = previous_loop;
        }
        if current == target {
            self.seq_activate_current(group, false, host);
        } else {
            self.seq_set_current(group, target, false, host);
        }
    }

    fn seq_set_current(
        &mut self,
        group: AnimationId,
        child: Option<AnimationId>,
        intermediate: bool,
        host: &mut dyn PropertyHost,
    ) {
        let Some(child) = child else {
            if let Some(seq) = self.seq_mut(group) {
                seq.current = None;
            }
            return;
        };
        let old = self.seq(group).and_then(|s| s.current);
        if old == Some(child) {
            return;
        }
        if let Some(old) = old {
            self.stop_node(old, host);
        }
        if let Some(seq) = self.seq_mut(group) {
            seq.current = Some(child);
        }
        self.seq_activate_current(group, intermediate, host);
    }

    /// (Re)start the current child in step with the group.
    fn seq_activate_current(
        &mut self,
        group: AnimationId,
        intermediate: bool,
        host: &mut dyn PropertyHost,
    ) {
        let Some(node) = self.node(group) else { return };
        let (state, direction) = (node.state, node.direction);
        let Some(current) = self.seq(group).and_then(|s| s.current) else {
            return;
        };
        if state == AnimationState::Stopped {
            return;
        }
        self.stop_node(current, host);
        self.set_dir(current, direction, host);
        self.start_node(current, host);
        if !intermediate && self.state(group) == Some(AnimationState::Paused) {
            self.pause_node(current, host);
        }
    }

    pub(crate) fn seq_update_state(
        &mut self,
        group: AnimationId,
        new: AnimationState,
        old: AnimationState,
        host: &mut dyn PropertyHost,
    ) {
        let Some(current) = self.seq(group).and_then(|s| s.current) else {
            return;
        };
        let child_state = self.state(current);
        match new {
            AnimationState::Stopped => self.stop_node(current, host),
            AnimationState::Paused => {
                if child_state == Some(old) && old == AnimationState::Running {
                    self.pause_node(current, host);
                } else {
                    self.seq_restart(group, host);
                }
            }
            AnimationState::Running => {
                if child_state == Some(old) && old == AnimationState::Paused {
                    self.start_node(current, host);
                } else {
                    self.seq_restart(group, host);
                }
            }
        }
    }

    pub(crate) fn seq_update_direction(
        &mut self,
        group: AnimationId,
        direction: Direction,
        host: &mut dyn PropertyHost,
    ) {
        if self.state(group) == Some(AnimationState::Stopped) {
            return;
        }
        if let Some(current) = self.seq(group).and_then(|s| s.current) {
            self.set_dir(current, direction, host);
        }
    }

    pub(crate) fn seq_uncontrolled_finished(
        &mut self,
        group: AnimationId,
        child: AnimationId,
        host: &mut dyn PropertyHost,
    ) {
        if self.seq(group).and_then(|s| s.current) != Some(child) {
            return;
        }
        let finish = self.current_time(child).unwrap_or(0);
        self.uncontrolled_finish.insert(child, finish);

        let Some(node) = self.node(group) else { return };
        let direction = node.direction;
        let mut total = node.total_current_time;
        let children = self.children(group).to_vec();
        let Some(position) = children.iter().position(|&c| c == child) else {
            return;
        };

        // The rest of the group is known once the undetermined child is done.
        let rest: Vec<AnimationId> = match direction {
            Direction::Forward => children[position + 1..].to_vec(),
            Direction::Backward => children[..position].iter().rev().copied().collect(),
        };
        if let Some(&neighbour) = rest.first() {
            self.seq_set_current(group, Some(neighbour), false, host);
        }
        for &other in &rest {
            let d = self.duration_of(other);
            if d == -1 {
                total = -1;
                break;
            }
            total += d;
        }

        if total >= 0 {
            self.uncontrolled_finish.insert(group, total);
        }
        if self.seq_at_end(group) {
            self.stop_node(group, host);
        }
    }

    pub(crate) fn seq_animation_inserted(
        &mut self,
        group: AnimationId,
        child: AnimationId,
        host: &mut dyn PropertyHost,
    ) {
        let children = self.children(group).to_vec();
        if self.seq(group).and_then(|s| s.current).is_none() {
            self.seq_set_current(group, children.first().copied(), false, host);
        }

        // Inserted right before a current child that has not started yet: play the
        // new child first.
        let current = self.seq(group).and_then(|s| s.current);
        let next = children
            .iter()
            .position(|&c| c == child)
            .and_then(|i| children.get(i + 1).copied());
        if let (Some(current), Some(next)) = (current, next) {
            if current == next
                && self.current_time(current) == Some(0)
                && self.current_loop(current) == Some(0)
            {
                self.seq_set_current(group, Some(child), false, host);
            }
        }
    }

    pub(crate) fn seq_animation_removed(
        &mut self,
        group: AnimationId,
        child: AnimationId,
        prev: Option<AnimationId>,
        next: Option<AnimationId>,
        host: &mut dyn PropertyHost,
    ) {
        let removing_current = self.seq(group).and_then(|s| s.current) == Some(child);
        if removing_current {
            self.seq_set_current(group, next.or(prev), false, host);
        }

        let current = self.seq(group).and_then(|s| s.current);
        let mut time = 0;
        for &other in self.children(group) {
            if Some(other) == current {
                break;
            }
            time += self.actual_total_duration(other);
        }
        if !removing_current {
            if let Some(current) = current {
                time += self.current_time(current).unwrap_or(0);
            }
        }

        let duration = self.duration_of(group);
        if let Some(node) = self.node_mut(group) {
            node.current_time = time;
            node.total_current_time = time + node.current_loop * duration.max(0);
        }
    }
}
