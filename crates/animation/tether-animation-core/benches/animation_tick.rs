use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tether_animation_core::{
    AnimationScheduler, AnimationTree, Config, ObjectId, PropertyAnimation, PropertyIndex,
    SpringParams,
};
use tether_test_fixtures::RecordingHost;

/// `width` parallel tracks, each a sequence of `depth` property animations.
fn build_tree(tree: &mut AnimationTree, host: &mut RecordingHost, width: u32, depth: u32) {
    let root = tree.add_parallel();
    for track in 0..width {
        let seq = tree.add_sequential();
        for step in 0..depth {
            let anim = PropertyAnimation::new(ObjectId(track), PropertyIndex::new(step), 100.0, 250)
                .with_from(0.0);
            let id = tree.add_job(anim);
            tree.append(seq, id, host).expect("append");
        }
        tree.append(root, seq, host).expect("append");
    }
    tree.set_loop_count(root, -1).expect("loops");
    tree.start(root, host).expect("start");
}

fn bench_groups(c: &mut Criterion) {
    let mut group = c.benchmark_group("groups");
    for &(width, depth) in &[(4u32, 4u32), (32, 8), (128, 8)] {
        let mut host = RecordingHost::new();
        let mut scheduler = AnimationScheduler::new(Config::default());
        scheduler.init();
        build_tree(scheduler.tree_mut(), &mut host, width, depth);
        group.bench_function(format!("tick_{width}x{depth}"), |b| {
            b.iter(|| {
                host.clear_writes();
                black_box(scheduler.tick(16, &mut host).expect("tick"))
            })
        });
    }
    group.finish();
}

fn bench_springs(c: &mut Criterion) {
    let mut group = c.benchmark_group("springs");
    for &count in &[16u32, 256] {
        let mut host = RecordingHost::new();
        let mut scheduler = AnimationScheduler::new(Config::default());
        scheduler.init();
        let spring = scheduler.add_spring(SpringParams {
            spring: 0.3,
            damping: 0.2,
            ..SpringParams::default()
        });
        let mut goal = 0.0;
        group.bench_function(format!("retarget_{count}"), |b| {
            b.iter(|| {
                goal += 10.0;
                for obj in 0..count {
                    scheduler
                        .spring_to(spring, ObjectId(obj), PropertyIndex::new(0), goal, &mut host)
                        .expect("spring");
                }
                host.clear_writes();
                black_box(scheduler.tick(16, &mut host).expect("tick"))
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_groups, bench_springs);
criterion_main!(benches);
