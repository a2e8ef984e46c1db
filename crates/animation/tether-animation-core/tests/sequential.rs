use tether_animation_core::{
    AnimationEvent, AnimationId, AnimationJob, AnimationState, AnimationTree, Direction,
    JobControl, PauseAnimation, PropertyHost,
};
use tether_test_fixtures::RecordingHost;

use AnimationState::{Paused, Running, Stopped};

/// Runs until it decides to stop at `stop_at` milliseconds.
struct Uncontrolled {
    stop_at: i32,
}

impl AnimationJob for Uncontrolled {
    fn duration(&self) -> i32 {
        -1
    }

    fn update_current_time(&mut self, time: i32, _host: &mut dyn PropertyHost) -> JobControl {
        if time >= self.stop_at {
            JobControl::Stop
        } else {
            JobControl::Continue
        }
    }
}

fn leaf(tree: &mut AnimationTree, duration: i32) -> AnimationId {
    tree.add_job(PauseAnimation::new(duration))
}

fn sequence_of(tree: &mut AnimationTree, host: &mut RecordingHost, children: &[AnimationId]) -> AnimationId {
    let group = tree.add_sequential();
    for &child in children {
        tree.append(group, child, host).unwrap();
    }
    group
}

fn finished(events: &[AnimationEvent]) -> Vec<AnimationId> {
    events
        .iter()
        .filter_map(|e| match e {
            AnimationEvent::Finished { animation } => Some(*animation),
            _ => None,
        })
        .collect()
}

#[test]
fn seeking_finishes_skipped_children_and_clamps_at_the_end() {
    let mut host = RecordingHost::new();
    let mut tree = AnimationTree::default();
    let kids: Vec<_> = (0..3).map(|_| leaf(&mut tree, 200)).collect();
    let group = sequence_of(&mut tree, &mut host, &kids);
    assert_eq!(tree.duration(group), Some(600));

    tree.start(group, &mut host).unwrap();
    tree.pause(group, &mut host).unwrap();
    assert_eq!(tree.state(kids[0]), Some(Paused));

    tree.set_current_time(group, 250, &mut host).unwrap();
    assert_eq!(tree.current_animation(group), Some(kids[1]));
    assert_eq!(tree.current_loop_time(kids[1]), Some(50));
    assert_eq!(tree.state(kids[1]), Some(Paused));
    assert_eq!(tree.state(kids[0]), Some(Stopped));
    assert_eq!(tree.current_time(kids[0]), Some(200));

    tree.set_current_time(group, 700, &mut host).unwrap();
    assert_eq!(tree.state(group), Some(Stopped));
    assert_eq!(tree.current_time(group), Some(600));
    for &kid in &kids {
        assert_eq!(tree.state(kid), Some(Stopped));
    }

    assert!(tree.pending_events() >= 4);
    let done = finished(&tree.take_events());
    assert_eq!(done, vec![kids[0], kids[1], kids[2], group]);
    assert_eq!(tree.pending_events(), 0);
}

#[test]
fn nested_sequences_follow_the_group_time() {
    let mut host = RecordingHost::new();
    let mut tree = AnimationTree::default();
    let a1 = leaf(&mut tree, 250);
    let a2 = leaf(&mut tree, 250);
    let a3 = leaf(&mut tree, 250);
    tree.set_loop_count(a2, 3).unwrap();
    let sequence = sequence_of(&mut tree, &mut host, &[a1, a2, a3]);
    let b1 = leaf(&mut tree, 250);
    let b2 = leaf(&mut tree, 250);
    let sequence2 = sequence_of(&mut tree, &mut host, &[b1, b2]);
    let group = sequence_of(&mut tree, &mut host, &[sequence, sequence2]);

    let lt = |tree: &AnimationTree, id| tree.current_loop_time(id).unwrap();

    tree.set_current_time(group, 1, &mut host).unwrap();
    for id in [group, sequence, a1, sequence2, b1] {
        assert_eq!(tree.state(id), Some(Stopped));
    }
    assert_eq!((lt(&tree, group), lt(&tree, sequence), lt(&tree, a1)), (1, 1, 1));
    assert_eq!((lt(&tree, a2), lt(&tree, a3), lt(&tree, b1)), (0, 0, 0));

    tree.set_current_time(group, 251, &mut host).unwrap();
    assert_eq!((lt(&tree, a1), lt(&tree, a2)), (250, 1));
    assert_eq!(tree.current_loop(a2), Some(0));

    tree.set_current_time(group, 750, &mut host).unwrap();
    assert_eq!(lt(&tree, sequence), 750);
    assert_eq!(lt(&tree, a2), 0);
    assert_eq!(tree.current_loop(a2), Some(2));

    tree.set_current_time(group, 1000, &mut host).unwrap();
    assert_eq!((lt(&tree, a2), lt(&tree, a3)), (250, 0));
    assert_eq!(tree.current_loop(a2), Some(2));

    tree.set_current_time(group, 1010, &mut host).unwrap();
    assert_eq!(lt(&tree, a3), 10);

    tree.set_current_time(group, 1500, &mut host).unwrap();
    assert_eq!(lt(&tree, group), 1500);
    assert_eq!(lt(&tree, sequence), 1250);
    assert_eq!(lt(&tree, a3), 250);
    assert_eq!((lt(&tree, sequence2), lt(&tree, b1), lt(&tree, b2)), (250, 250, 0));

    tree.set_current_time(group, 2000, &mut host).unwrap();
    assert_eq!(lt(&tree, group), 1750);
    assert_eq!((lt(&tree, sequence2), lt(&tree, b2)), (500, 250));
}

#[test]
fn uncontrolled_child_reports_its_own_finish() {
    let mut host = RecordingHost::new();
    let mut tree = AnimationTree::default();
    let a1 = leaf(&mut tree, 250);
    let a2 = leaf(&mut tree, 250);
    let sequence = sequence_of(&mut tree, &mut host, &[a1, a2]);
    let not_time_driven = tree.add_job(Uncontrolled { stop_at: 250 });
    let loops_forever = leaf(&mut tree, 250);
    tree.set_loop_count(loops_forever, -1).unwrap();
    assert_eq!(tree.total_duration(not_time_driven), Some(-1));
    assert_eq!(tree.total_duration(loops_forever), Some(-1));

    let group = sequence_of(&mut tree, &mut host, &[sequence, not_time_driven, loops_forever]);
    tree.start(group, &mut host).unwrap();
    tree.pause(group, &mut host).unwrap();

    tree.set_current_time(group, 1, &mut host).unwrap();
    assert_eq!(tree.state(group), Some(Paused));
    assert_eq!(tree.state(sequence), Some(Paused));
    assert_eq!(tree.state(a1), Some(Paused));
    assert_eq!(tree.state(a2), Some(Stopped));
    assert_eq!(tree.state(not_time_driven), Some(Stopped));

    tree.set_current_time(group, 500, &mut host).unwrap();
    assert_eq!(tree.current_animation(group), Some(not_time_driven));
    assert_eq!(tree.current_loop_time(sequence), Some(500));

    tree.set_current_time(group, 505, &mut host).unwrap();
    assert_eq!(tree.current_loop_time(not_time_driven), Some(5));
    assert_eq!(tree.state(sequence), Some(Stopped));
    assert_eq!(tree.state(not_time_driven), Some(Paused));
    assert_eq!(tree.state(loops_forever), Some(Stopped));

    tree.set_current_time(group, 750, &mut host).unwrap();
    assert_eq!(tree.current_animation(group), Some(loops_forever));
    assert_eq!(tree.state(not_time_driven), Some(Stopped));
    assert_eq!(tree.current_loop_time(not_time_driven), Some(250));
    assert_eq!(tree.uncontrolled_finish_time(not_time_driven), Some(250));
    assert_eq!(tree.state(loops_forever), Some(Paused));
    assert_eq!(tree.current_loop_time(loops_forever), Some(0));

    tree.set_current_time(group, 800, &mut host).unwrap();
    assert_eq!(tree.current_loop_time(group), Some(800));
    assert_eq!(tree.current_animation(group), Some(loops_forever));
    assert_eq!(tree.current_loop_time(loops_forever), Some(50));

    tree.stop(loops_forever, &mut host).unwrap();
    for id in [group, sequence, a1, a2, not_time_driven, loops_forever] {
        assert_eq!(tree.state(id), Some(Stopped), "{id}");
    }
}

#[test]
fn adding_and_removing_children_keeps_the_time_consistent() {
    let mut host = RecordingHost::new();
    let mut tree = AnimationTree::default();
    let group = tree.add_sequential();
    assert_eq!(tree.duration(group), Some(0));

    let anim1 = leaf(&mut tree, 250);
    tree.append(group, anim1, &mut host).unwrap();
    assert_eq!(tree.current_animation(group), Some(anim1));

    let anim2 = leaf(&mut tree, 250);
    tree.append(group, anim2, &mut host).unwrap();
    assert_eq!(tree.duration(group), Some(500));
    assert_eq!(tree.current_animation(group), Some(anim1));

    // Prepending before a current child that has not started takes over.
    let anim0 = leaf(&mut tree, 250);
    tree.prepend(group, anim0, &mut host).unwrap();
    assert_eq!(tree.duration(group), Some(750));
    assert_eq!(tree.current_animation(group), Some(anim0));

    tree.set_current_time(group, 300, &mut host).unwrap();
    assert_eq!(tree.current_animation(group), Some(anim1));
    assert_eq!(tree.current_loop_time(anim1), Some(50));

    tree.remove(group, anim0, &mut host).unwrap();
    assert_eq!(tree.current_loop_time(group), Some(50));
    assert_eq!(tree.current_animation(group), Some(anim1));
    assert_eq!(tree.parent(anim0), None);

    tree.set_current_time(group, 0, &mut host).unwrap();
    tree.prepend(group, anim0, &mut host).unwrap();
    tree.set_current_time(group, 300, &mut host).unwrap();
    assert_eq!(tree.current_animation(group), Some(anim1));

    tree.remove(group, anim1, &mut host).unwrap();
    assert_eq!(tree.current_loop_time(group), Some(250));
    assert_eq!(tree.current_animation(group), Some(anim2));
    assert_eq!(tree.current_loop_time(anim0), Some(250));
    assert_eq!(tree.children(group), &[anim0, anim2]);
}

#[test]
fn zero_duration_children_are_skipped_in_both_directions() {
    let mut host = RecordingHost::new();
    let mut tree = AnimationTree::default();
    let zero1 = leaf(&mut tree, 0);
    let zero2 = leaf(&mut tree, 0);
    let anim = leaf(&mut tree, 250);
    let zero3 = leaf(&mut tree, 0);
    let zero4 = leaf(&mut tree, 0);
    let group = sequence_of(&mut tree, &mut host, &[zero1, zero2, anim, zero3, zero4]);
    assert_eq!(tree.current_animation(group), Some(zero1));

    tree.set_current_time(group, 0, &mut host).unwrap();
    assert_eq!(tree.current_animation(group), Some(anim));

    tree.set_current_time(group, 250, &mut host).unwrap();
    assert_eq!(tree.current_animation(group), Some(zero4));

    tree.set_direction(group, Direction::Backward, &mut host).unwrap();
    tree.set_current_time(group, 0, &mut host).unwrap();
    assert_eq!(tree.current_animation(group), Some(zero1));

    tree.set_current_time(group, 250, &mut host).unwrap();
    assert_eq!(tree.current_animation(group), Some(anim));
}

#[test]
fn looping_group_reports_the_new_loop() {
    let mut host = RecordingHost::new();
    let mut tree = AnimationTree::default();
    let anim = leaf(&mut tree, 250);
    let group = sequence_of(&mut tree, &mut host, &[anim]);
    tree.set_loop_count(group, 2).unwrap();
    assert_eq!(tree.total_duration(group), Some(500));

    tree.set_current_time(group, 300, &mut host).unwrap();
    assert_eq!(tree.current_loop(group), Some(1));
    assert_eq!(tree.current_loop_time(anim), Some(50));
    assert!(tree.take_events().contains(&AnimationEvent::CurrentLoopChanged {
        animation: group,
        current_loop: 1
    }));

    let late = leaf(&mut tree, 250);
    tree.append(group, late, &mut host).unwrap();
    assert_eq!(tree.duration(group), Some(500));
}

#[test]
fn pause_and_resume_follow_the_current_child() {
    let mut host = RecordingHost::new();
    let mut tree = AnimationTree::default();
    let a = leaf(&mut tree, 100);
    let b = leaf(&mut tree, 100);
    let group = sequence_of(&mut tree, &mut host, &[a, b]);

    assert!(tree.pause(group, &mut host).is_err());
    assert!(tree.resume(group, &mut host).is_err());

    tree.start(group, &mut host).unwrap();
    assert_eq!(tree.top_level(), &[group]);
    assert_eq!(tree.state(a), Some(Running));

    tree.pause(group, &mut host).unwrap();
    assert_eq!(tree.state(a), Some(Paused));
    assert!(tree.top_level().is_empty());

    tree.resume(group, &mut host).unwrap();
    assert_eq!(tree.state(a), Some(Running));
    assert_eq!(tree.top_level(), &[group]);

    tree.advance(150, &mut host);
    assert_eq!(tree.current_animation(group), Some(b));
    assert_eq!(tree.state(a), Some(Stopped));
    assert_eq!(tree.current_loop_time(b), Some(50));

    tree.stop(group, &mut host).unwrap();
    assert_eq!(tree.state(b), Some(Stopped));
    assert!(tree.top_level().is_empty());
    // An explicit early stop is not a natural end.
    assert!(!finished(&tree.take_events()).contains(&group));
}

#[test]
fn backward_run_rewinds_to_the_start() {
    let mut host = RecordingHost::new();
    let mut tree = AnimationTree::default();
    let a = leaf(&mut tree, 100);
    let b = leaf(&mut tree, 100);
    let group = sequence_of(&mut tree, &mut host, &[a, b]);
    tree.set_direction(group, Direction::Backward, &mut host).unwrap();

    tree.start(group, &mut host).unwrap();
    assert_eq!(tree.current_time(group), Some(200));
    assert_eq!(tree.current_animation(group), Some(b));

    tree.advance(150, &mut host);
    assert_eq!(tree.current_animation(group), Some(a));
    assert_eq!(tree.current_loop_time(a), Some(50));

    tree.advance(100, &mut host);
    assert_eq!(tree.state(group), Some(Stopped));
    assert_eq!(tree.current_time(group), Some(0));
    assert!(finished(&tree.take_events()).contains(&group));
}

#[test]
fn membership_errors() {
    let mut host = RecordingHost::new();
    let mut tree = AnimationTree::default();
    let outer = tree.add_sequential();
    let inner = tree.add_parallel();
    let a = leaf(&mut tree, 10);
    tree.append(outer, inner, &mut host).unwrap();
    tree.append(inner, a, &mut host).unwrap();

    assert!(tree.append(inner, outer, &mut host).is_err());
    assert!(tree.append(a, inner, &mut host).is_err());
    assert!(tree.insert(outer, 5, a, &mut host).is_err());

    // Moving a child re-parents it.
    tree.append(outer, a, &mut host).unwrap();
    assert_eq!(tree.parent(a), Some(outer));
    assert!(tree.children(inner).is_empty());

    tree.delete(outer, &mut host).unwrap();
    assert!(!tree.contains(a));
    assert!(!tree.contains(inner));
    assert!(tree.is_empty());
}
