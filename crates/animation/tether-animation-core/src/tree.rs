//! The animation tree: node storage, the per-node state machine, time folding
//! over loops and the list of top-level animations the clock drives.
//!
//! Everything runs synchronously. A call such as [`AnimationTree::set_current_time`]
//! may cascade through children, stop nodes and notify groups before it returns;
//! observers learn about it from the drained [`AnimationEvent`]s.

use hashbrown::HashMap;
use tether_api_core::PropertyHost;

use crate::error::{AnimationError, Result};
use crate::events::{AnimationEvent, EventQueue};
use crate::ids::{AnimationId, IdAllocator};
use crate::job::{AnimationJob, JobControl};
use crate::node::{AnimationState, Direction, Node, NodeKind, NodeType, Parallel, Sequential};

/// Total duration over all loops: `-1` when undetermined or looping forever.
pub(crate) fn total_duration(duration: i32, loop_count: i32) -> i32 {
    if duration <= 0 {
        duration
    } else if loop_count < 0 {
        -1
    } else {
        duration.saturating_mul(loop_count)
    }
}

pub struct AnimationTree {
    ids: IdAllocator,
    nodes: Vec<Option<Node>>,
    /// Time at which a child with an undetermined duration reported it was done.
    pub(crate) uncontrolled_finish: HashMap<AnimationId, i32>,
    top_level: Vec<AnimationId>,
    events: EventQueue,
}

impl Default for AnimationTree {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl AnimationTree {
    pub fn new(max_events: usize) -> Self {
        Self {
            ids: IdAllocator::new(),
            nodes: Vec::new(),
            uncontrolled_finish: HashMap::new(),
            top_level: Vec::new(),
            events: EventQueue::new(max_events),
        }
    }

    fn insert_node(&mut self, kind: NodeKind) -> AnimationId {
        let id = self.ids.alloc_animation();
        let slot = id.0 as usize;
        if self.nodes.len() <= slot {
            self.nodes.resize_with(slot + 1, || None);
        }
        self.nodes[slot] = Some(Node::new(kind));
        id
    }

    pub fn add_job(&mut self, job: impl AnimationJob + 'static) -> AnimationId {
        self.add_boxed_job(Box::new(job))
    }

    pub fn add_boxed_job(&mut self, job: Box<dyn AnimationJob>) -> AnimationId {
        self.insert_node(NodeKind::Leaf(job))
    }

    pub fn add_sequential(&mut self) -> AnimationId {
        self.insert_node(NodeKind::Sequential(Sequential::default()))
    }

    pub fn add_parallel(&mut self) -> AnimationId {
        self.insert_node(NodeKind::Parallel(Parallel::default()))
    }

    // ----- lookup -----

    pub(crate) fn node(&self, id: AnimationId) -> Option<&Node> {
        self.nodes.get(id.0 as usize).and_then(Option::as_ref)
    }

    pub(crate) fn node_mut(&mut self, id: AnimationId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0 as usize).and_then(Option::as_mut)
    }

    fn get(&self, id: AnimationId) -> Result<&Node> {
        self.node(id).ok_or(AnimationError::UnknownAnimation(id))
    }

    pub fn contains(&self, id: AnimationId) -> bool {
        self.node(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn node_type(&self, id: AnimationId) -> Option<NodeType> {
        self.node(id).map(Node::node_type)
    }

    pub fn state(&self, id: AnimationId) -> Option<AnimationState> {
        self.node(id).map(|n| n.state)
    }

    pub fn direction(&self, id: AnimationId) -> Option<Direction> {
        self.node(id).map(|n| n.direction)
    }

    pub fn loop_count(&self, id: AnimationId) -> Option<i32> {
        self.node(id).map(|n| n.loop_count)
    }

    pub fn current_loop(&self, id: AnimationId) -> Option<i32> {
        self.node(id).map(|n| n.current_loop)
    }

    /// Time within the current loop.
    pub fn current_loop_time(&self, id: AnimationId) -> Option<i32> {
        self.node(id).map(|n| n.current_time)
    }

    /// Time across all loops.
    pub fn current_time(&self, id: AnimationId) -> Option<i32> {
        self.node(id).map(|n| n.total_current_time)
    }

    pub fn duration(&self, id: AnimationId) -> Option<i32> {
        self.node(id).map(|_| self.duration_of(id))
    }

    pub fn total_duration(&self, id: AnimationId) -> Option<i32> {
        self.node(id).map(|_| self.total_duration_of(id))
    }

    pub fn parent(&self, id: AnimationId) -> Option<AnimationId> {
        self.node(id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: AnimationId) -> &[AnimationId] {
        self.node(id).map_or(&[], Node::children)
    }

    /// The child a sequential group is currently playing.
    pub fn current_animation(&self, group: AnimationId) -> Option<AnimationId> {
        match &self.node(group)?.kind {
            NodeKind::Sequential(s) => s.current,
            _ => None,
        }
    }

    /// Finish time recorded for a child whose duration was undetermined.
    pub fn uncontrolled_finish_time(&self, id: AnimationId) -> Option<i32> {
        self.uncontrolled_finish.get(&id).copied()
    }

    pub fn job(&self, id: AnimationId) -> Option<&dyn AnimationJob> {
        match &self.node(id)?.kind {
            NodeKind::Leaf(job) => Some(job.as_ref()),
            _ => None,
        }
    }

    pub fn job_mut(&mut self, id: AnimationId) -> Option<&mut (dyn AnimationJob + 'static)> {
        match &mut self.node_mut(id)?.kind {
            NodeKind::Leaf(job) => Some(job.as_mut()),
            _ => None,
        }
    }

    /// Animations the clock advances directly, in registration order.
    pub fn top_level(&self) -> &[AnimationId] {
        &self.top_level
    }

    /// Events queued since the last drain.
    pub fn pending_events(&self) -> usize {
        self.events.len()
    }

    pub fn take_events(&mut self) -> Vec<AnimationEvent> {
        self.events.drain()
    }

    /// Events dropped since the last drain because the queue was full.
    pub fn dropped_events(&self) -> usize {
        self.events.dropped()
    }

    pub(crate) fn duration_of(&self, id: AnimationId) -> i32 {
        let Some(node) = self.node(id) else { return 0 };
        match &node.kind {
            NodeKind::Leaf(job) => job.duration(),
            NodeKind::Sequential(s) => {
                let mut sum = 0i32;
                for &child in &s.children {
                    let d = self.total_duration_of(child);
                    if d == -1 {
                        return -1;
                    }
                    sum = sum.saturating_add(d);
                }
                sum
            }
            NodeKind::Parallel(p) => {
                let mut longest = 0;
                for &child in &p.children {
                    let d = self.total_duration_of(child);
                    if d == -1 {
                        return -1;
                    }
                    longest = longest.max(d);
                }
                longest
            }
        }
    }

    pub(crate) fn total_duration_of(&self, id: AnimationId) -> i32 {
        let loop_count = self.node(id).map_or(1, |n| n.loop_count);
        total_duration(self.duration_of(id), loop_count)
    }

    fn is_ancestor(&self, ancestor: AnimationId, mut id: AnimationId) -> bool {
        while let Some(parent) = self.parent(id) {
            if parent == ancestor {
                return true;
            }
            id = parent;
        }
        false
    }

    // ----- public control surface -----

    pub fn set_loop_count(&mut self, id: AnimationId, loop_count: i32) -> Result<()> {
        self.node_mut(id)
            .ok_or(AnimationError::UnknownAnimation(id))?
            .loop_count = loop_count;
        Ok(())
    }

    pub fn set_direction(
        &mut self,
        id: AnimationId,
        direction: Direction,
        host: &mut dyn PropertyHost,
    ) -> Result<()> {
        self.get(id)?;
        self.set_dir(id, direction, host);
        Ok(())
    }

    pub fn set_current_time(
        &mut self,
        id: AnimationId,
        msecs: i32,
        host: &mut dyn PropertyHost,
    ) -> Result<()> {
        self.get(id)?;
        self.set_time(id, msecs, host);
        Ok(())
    }

    pub fn start(&mut self, id: AnimationId, host: &mut dyn PropertyHost) -> Result<()> {
        self.get(id)?;
        self.start_node(id, host);
        Ok(())
    }

    pub fn stop(&mut self, id: AnimationId, host: &mut dyn PropertyHost) -> Result<()> {
        self.get(id)?;
        self.stop_node(id, host);
        Ok(())
    }

    pub fn pause(&mut self, id: AnimationId, host: &mut dyn PropertyHost) -> Result<()> {
        if self.get(id)?.state == AnimationState::Stopped {
            log::warn!("{id}: cannot pause a stopped animation");
            return Err(AnimationError::PauseWhileStopped(id));
        }
        self.set_state(id, AnimationState::Paused, host);
        Ok(())
    }

    pub fn resume(&mut self, id: AnimationId, host: &mut dyn PropertyHost) -> Result<()> {
        if self.get(id)?.state != AnimationState::Paused {
            log::warn!("{id}: cannot resume an animation that is not paused");
            return Err(AnimationError::ResumeWhileNotPaused(id));
        }
        self.set_state(id, AnimationState::Running, host);
        Ok(())
    }

    pub fn append(
        &mut self,
        group: AnimationId,
        child: AnimationId,
        host: &mut dyn PropertyHost,
    ) -> Result<()> {
        let len = self.get(group)?.children().len();
        let len = if self.parent(child) == Some(group) { len - 1 } else { len };
        self.insert(group, len, child, host)
    }

    pub fn prepend(
        &mut self,
        group: AnimationId,
        child: AnimationId,
        host: &mut dyn PropertyHost,
    ) -> Result<()> {
        self.insert(group, 0, child, host)
    }

    /// Insert `child` at `position` among the group's children, taking it out of
    /// any group it belonged to first.
    pub fn insert(
        &mut self,
        group: AnimationId,
        position: usize,
        child: AnimationId,
        host: &mut dyn PropertyHost,
    ) -> Result<()> {
        let node = self.get(group)?;
        if node.node_type() == NodeType::Leaf {
            return Err(AnimationError::NotAGroup(group));
        }
        let mut len = node.children().len();
        let old_parent = self.get(child)?.parent;
        if child == group || self.is_ancestor(child, group) {
            return Err(AnimationError::WouldCycle { group, child });
        }
        if old_parent == Some(group) {
            len -= 1;
        }
        if position > len {
            return Err(AnimationError::PositionOutOfRange {
                group,
                position,
                len,
            });
        }
        if let Some(old) = old_parent {
            self.detach(old, child, host);
        }

        if let Some(children) = self.node_mut(group).and_then(Node::children_mut) {
            children.insert(position, child);
        }
        if let Some(node) = self.node_mut(child) {
            node.parent = Some(group);
        }
        if self.node_type(group) == Some(NodeType::Sequential) {
            self.seq_animation_inserted(group, child, host);
        }
        Ok(())
    }

    /// Take `child` out of `group`. The child is stopped and becomes a root.
    pub fn remove(
        &mut self,
        group: AnimationId,
        child: AnimationId,
        host: &mut dyn PropertyHost,
    ) -> Result<()> {
        let node = self.get(group)?;
        if node.node_type() == NodeType::Leaf {
            return Err(AnimationError::NotAGroup(group));
        }
        if self.get(child)?.parent == Some(group) {
            self.detach(group, child, host);
        }
        Ok(())
    }

    pub fn clear(&mut self, group: AnimationId, host: &mut dyn PropertyHost) -> Result<()> {
        if self.get(group)?.node_type() == NodeType::Leaf {
            return Err(AnimationError::NotAGroup(group));
        }
        while let Some(&child) = self.children(group).last() {
            self.detach(group, child, host);
        }
        Ok(())
    }

    /// Stop `id` and drop it together with all of its descendants.
    pub fn delete(&mut self, id: AnimationId, host: &mut dyn PropertyHost) -> Result<()> {
        let parent = self.get(id)?.parent;
        if let Some(parent) = parent {
            self.detach(parent, id, host);
        }
        self.stop_node(id, host);
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            self.unregister(next);
            self.uncontrolled_finish.remove(&next);
            if let Some(node) = self.nodes.get_mut(next.0 as usize).and_then(Option::take) {
                stack.extend_from_slice(node.children());
            }
        }
        Ok(())
    }

    /// Move every top-level running animation `delta` milliseconds along its direction.
    pub fn advance(&mut self, delta: i32, host: &mut dyn PropertyHost) {
        if delta == 0 {
            return;
        }
        // Animations registered while advancing wait for the next tick.
        let running = self.top_level.clone();
        for id in running {
            let Some(node) = self.node(id) else { continue };
            if !node.registered {
                continue;
            }
            let elapsed = node
                .total_current_time
                .saturating_add(node.direction.sign() * delta);
            self.set_time(id, elapsed, host);
        }
    }

    // ----- state machine -----

    pub(crate) fn start_node(&mut self, id: AnimationId, host: &mut dyn PropertyHost) {
        if self.state(id) != Some(AnimationState::Running) {
            self.set_state(id, AnimationState::Running, host);
        }
    }

    pub(crate) fn stop_node(&mut self, id: AnimationId, host: &mut dyn PropertyHost) {
        if matches!(self.state(id), Some(s) if s != AnimationState::Stopped) {
            self.set_state(id, AnimationState::Stopped, host);
        }
    }

    /// Pause unless stopped; used where a group drives a child that may already be done.
    pub(crate) fn pause_node(&mut self, id: AnimationId, host: &mut dyn PropertyHost) {
        if matches!(self.state(id), Some(s) if s != AnimationState::Stopped) {
            self.set_state(id, AnimationState::Paused, host);
        }
    }

    fn register(&mut self, id: AnimationId) {
        if let Some(node) = self.node_mut(id) {
            if !node.registered {
                node.registered = true;
                self.top_level.push(id);
            }
        }
    }

    fn unregister(&mut self, id: AnimationId) {
        if let Some(node) = self.node_mut(id) {
            if !node.registered {
                return;
            }
            node.registered = false;
        }
        self.top_level.retain(|&other| other != id);
    }

    pub(crate) fn set_state(
        &mut self,
        id: AnimationId,
        new: AnimationState,
        host: &mut dyn PropertyHost,
    ) {
        let Some(node) = self.node(id) else { return };
        if node.state == new || node.loop_count == 0 {
            return;
        }
        let old = node.state;
        let old_current_time = node.current_time;
        let old_current_loop = node.current_loop;
        let old_direction = node.direction;
        let loop_count = node.loop_count;
        let parent = node.parent;

        if old == AnimationState::Stopped {
            let rewind = match old_direction {
                Direction::Forward => 0,
                Direction::Backward if loop_count == -1 => self.duration_of(id),
                Direction::Backward => self.total_duration_of(id),
            };
            if let Some(node) = self.node_mut(id) {
                node.current_time = rewind;
                node.total_current_time = rewind;
            }
            if parent.is_some() {
                self.uncontrolled_finish.remove(&id);
            }
        }

        if let Some(node) = self.node_mut(id) {
            node.state = new;
        }
        let top_level = parent.map_or(true, |p| self.state(p) == Some(AnimationState::Stopped));
        if old == AnimationState::Running {
            self.unregister(id);
        } else if new == AnimationState::Running && top_level {
            self.register(id);
        }

        self.update_state(id, new, old, host);
        if self.state(id) != Some(new) {
            return;
        }
        self.events.push(AnimationEvent::StateChanged {
            animation: id,
            new,
            old,
        });

        match new {
            AnimationState::Paused => {}
            AnimationState::Running => {
                if old == AnimationState::Stopped && top_level {
                    let time = self.node(id).map_or(0, |n| n.total_current_time);
                    self.set_time(id, time, host);
                }
            }
            AnimationState::Stopped => {
                let dura = self.duration_of(id);
                let natural_end = dura == -1
                    || loop_count < 0
                    || (old_direction == Direction::Forward
                        && i64::from(old_current_time) * (i64::from(old_current_loop) + 1)
                            == i64::from(dura) * i64::from(loop_count))
                    || (old_direction == Direction::Backward && old_current_time == 0);
                if natural_end {
                    self.finished(id, host);
                }
            }
        }
    }

    fn finished(&mut self, id: AnimationId, host: &mut dyn PropertyHost) {
        self.events.push(AnimationEvent::Finished { animation: id });
        let Some(node) = self.node(id) else { return };
        let (parent, loop_count) = (node.parent, node.loop_count);
        if let Some(group) = parent {
            if self.duration_of(id) == -1 || loop_count < 0 {
                match self.node_type(group) {
                    Some(NodeType::Sequential) => self.seq_uncontrolled_finished(group, id, host),
                    Some(NodeType::Parallel) => self.par_uncontrolled_finished(group, id, host),
                    _ => {}
                }
            }
        }
    }

    fn update_state(
        &mut self,
        id: AnimationId,
        new: AnimationState,
        old: AnimationState,
        host: &mut dyn PropertyHost,
    ) {
        match self.node_type(id) {
            Some(NodeType::Leaf) => {
                if let Some(job) = self.job_mut(id) {
                    job.state_changed(new, old, host);
                }
            }
            Some(NodeType::Sequential) => self.seq_update_state(id, new, old, host),
            Some(NodeType::Parallel) => self.par_update_state(id, new, old, host),
            None => {}
        }
    }

    pub(crate) fn set_dir(&mut self, id: AnimationId, direction: Direction, host: &mut dyn PropertyHost) {
        let Some(node) = self.node(id) else { return };
        if node.direction == direction {
            return;
        }
        if node.state == AnimationState::Stopped {
            let (time, current_loop) = match direction {
                Direction::Backward => (self.duration_of(id), node.loop_count - 1),
                Direction::Forward => (0, 0),
            };
            if let Some(node) = self.node_mut(id) {
                node.current_time = time;
                node.current_loop = current_loop;
            }
        }
        if let Some(node) = self.node_mut(id) {
            node.direction = direction;
        }
        match self.node_type(id) {
            Some(NodeType::Sequential) => self.seq_update_direction(id, direction, host),
            Some(NodeType::Parallel) => self.par_update_direction(id, direction, host),
            _ => {}
        }
    }

    // ----- time -----

    pub(crate) fn set_time(&mut self, id: AnimationId, msecs: i32, host: &mut dyn PropertyHost) {
        let Some(node) = self.node(id) else { return };
        let loop_count = node.loop_count;
        let direction = node.direction;
        let dura = self.duration_of(id);
        let total_dura = total_duration(dura, loop_count);

        let mut msecs = msecs.max(0);
        if total_dura != -1 {
            msecs = msecs.min(total_dura);
        }

        let Some(node) = self.node_mut(id) else { return };
        node.total_current_time = msecs;
        let old_loop = node.current_loop;
        node.current_loop = if dura <= 0 { 0 } else { msecs / dura };
        if node.current_loop == loop_count {
            node.current_time = dura.max(0);
            node.current_loop = (loop_count - 1).max(0);
        } else if direction == Direction::Forward {
            node.current_time = if dura <= 0 { msecs } else { msecs % dura };
        } else {
            node.current_time = if dura <= 0 {
                msecs
            } else {
                ((msecs - 1) % dura) + 1
            };
            if node.current_time == dura {
                node.current_loop -= 1;
            }
        }
        let (current_time, current_loop) = (node.current_time, node.current_loop);

        self.update_current_time(id, current_time, host);

        if current_loop != old_loop {
            self.events.push(AnimationEvent::CurrentLoopChanged {
                animation: id,
                current_loop,
            });
        }

        let Some(node) = self.node(id) else { return };
        let at_end = match node.direction {
            Direction::Forward => node.total_current_time == total_dura,
            Direction::Backward => node.total_current_time == 0,
        };
        if at_end {
            self.stop_node(id, host);
        }
    }

    fn update_current_time(&mut self, id: AnimationId, time: i32, host: &mut dyn PropertyHost) {
        match self.node_type(id) {
            Some(NodeType::Leaf) => {
                let control = match self.job_mut(id) {
                    Some(job) => job.update_current_time(time, host),
                    None => JobControl::Continue,
                };
                if control == JobControl::Stop {
                    self.stop_node(id, host);
                }
            }
            Some(NodeType::Sequential) => self.seq_update_current_time(id, time, host),
            Some(NodeType::Parallel) => self.par_update_current_time(id, time, host),
            None => {}
        }
    }

    // ----- child bookkeeping shared by both group kinds -----

    fn detach(&mut self, group: AnimationId, child: AnimationId, host: &mut dyn PropertyHost) {
        let Some(children) = self.node_mut(group).and_then(Node::children_mut) else {
            return;
        };
        let Some(position) = children.iter().position(|&c| c == child) else {
            return;
        };
        let prev = position.checked_sub(1).map(|i| children[i]);
        let next = children.get(position + 1).copied();
        children.remove(position);
        let now_empty = children.is_empty();
        if let Some(node) = self.node_mut(child) {
            node.parent = None;
        }

        self.uncontrolled_finish.remove(&child);
        if now_empty {
            if let Some(node) = self.node_mut(group) {
                node.current_time = 0;
            }
            self.stop_node(group, host);
        }
        if self.node_type(group) == Some(NodeType::Sequential) {
            self.seq_animation_removed(group, child, prev, next, host);
        }
        self.stop_node(child, host);
    }
}
