use tether_animation_core::{ObjectId, PropertyIndex, SpringDriver, SpringMode, SpringParams};
use tether_api_core::WriteFlags;
use tether_test_fixtures::RecordingHost;

const OBJ: ObjectId = ObjectId(7);

fn prop() -> PropertyIndex {
    PropertyIndex::new(0)
}

fn springy() -> SpringParams {
    SpringParams {
        spring: 0.3,
        damping: 0.2,
        epsilon: 0.01,
        ..SpringParams::default()
    }
}

/// Tick in 16ms frames until the driver goes idle; returns the number of frames.
fn run_until_idle(driver: &mut SpringDriver, host: &mut RecordingHost, limit: usize) -> usize {
    for frame in 1..=limit {
        driver.tick(16, host);
        if driver.is_idle() {
            return frame;
        }
    }
    panic!("spring did not settle within {limit} frames");
}

#[test]
fn spring_settles_exactly_on_target() {
    let mut host = RecordingHost::new();
    let mut driver = SpringDriver::new(springy());
    assert_eq!(driver.mode(), SpringMode::Spring);

    driver.transition(OBJ, prop(), 100.0, Some(0.0), &mut host);
    assert!(!driver.is_idle());
    assert!(host.writes.is_empty());

    assert_eq!(run_until_idle(&mut driver, &mut host, 2000), 362);
    let writes = host.writes_to(OBJ, prop());
    assert_eq!(writes.len(), 362);
    assert!(writes.iter().all(|w| w.flags == WriteFlags::BYPASS_INTERCEPTORS));
    assert_eq!(host.number(OBJ, prop()), Some(100.0));

    // Heavily damped: the approach never turns back.
    let values: Vec<f64> = writes.iter().filter_map(|w| w.value.as_number()).collect();
    assert!(values.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn short_frames_accumulate_into_whole_substeps() {
    let mut host = RecordingHost::new();
    let mut driver = SpringDriver::new(springy());
    driver.transition(OBJ, prop(), 100.0, Some(0.0), &mut host);

    driver.tick(10, &mut host);
    assert!(host.writes.is_empty());
    driver.tick(10, &mut host);
    assert_eq!(host.writes.len(), 1);
}

#[test]
fn new_target_keeps_a_settled_property_active() {
    let mut host = RecordingHost::new();
    let mut driver = SpringDriver::new(springy());
    driver.transition(OBJ, prop(), 100.0, Some(0.0), &mut host);
    for _ in 0..361 {
        driver.tick(16, &mut host);
    }
    assert!(!driver.is_idle());

    // This step settles on 100, but the target moves before retirement.
    driver.step(16, &mut host);
    assert_eq!(host.number(OBJ, prop()), Some(100.0));
    driver.transition(OBJ, prop(), 50.0, None, &mut host);
    assert_eq!(driver.retire(), 0);
    assert_eq!(driver.active().len(), 1);

    let target = driver.target(OBJ, prop()).unwrap();
    assert_eq!((target.current, target.to), (100.0, 50.0));
}

#[test]
fn modulus_wraps_the_short_way_round() {
    let mut host = RecordingHost::new();
    let mut driver = SpringDriver::new(SpringParams {
        modulus: 360.0,
        ..springy()
    });
    driver.transition(OBJ, prop(), 10.0, Some(350.0), &mut host);

    assert_eq!(run_until_idle(&mut driver, &mut host, 2000), 303);
    let values: Vec<f64> = host
        .writes_to(OBJ, prop())
        .iter()
        .filter_map(|w| w.value.as_number())
        .collect();
    assert!(values.iter().all(|v| (0.0..360.0).contains(v)));
    // The first move goes up through 360 rather than down through 180.
    assert!(values[0] > 350.0);
    assert_eq!(host.number(OBJ, prop()), Some(10.0));
}

#[test]
fn velocity_mode_snaps_after_the_computed_duration() {
    let mut host = RecordingHost::new();
    let mut driver = SpringDriver::new(SpringParams {
        max_velocity: 100.0,
        ..SpringParams::default()
    });
    assert_eq!(driver.mode(), SpringMode::Velocity);
    driver.transition(OBJ, prop(), 10.0, Some(0.0), &mut host);

    for _ in 0..6 {
        driver.tick(16, &mut host);
    }
    assert!(!driver.is_idle());
    let partway = host.number(OBJ, prop()).unwrap();
    assert!((partway - 9.6).abs() < 1e-9, "{partway}");

    driver.tick(16, &mut host);
    assert!(driver.is_idle());
    assert_eq!(host.number(OBJ, prop()), Some(10.0));
}

#[test]
fn track_mode_writes_immediately() {
    let mut host = RecordingHost::new();
    let mut driver = SpringDriver::new(SpringParams::default());
    assert_eq!(driver.mode(), SpringMode::Track);

    driver.transition(OBJ, prop(), 42.0, None, &mut host);
    assert!(driver.is_idle());
    assert_eq!(host.number(OBJ, prop()), Some(42.0));
    assert_eq!(host.writes.len(), 1);

    driver.tick(16, &mut host);
    assert_eq!(host.writes.len(), 1);
}

#[test]
fn changing_parameters_keeps_motion_in_flight() {
    let mut host = RecordingHost::new();
    let mut driver = SpringDriver::new(springy());
    driver.transition(OBJ, prop(), 100.0, Some(0.0), &mut host);
    for _ in 0..10 {
        driver.tick(16, &mut host);
    }
    let before = driver.target(OBJ, prop()).unwrap().clone();
    assert!(before.velocity != 0.0);

    driver.set_params(SpringParams {
        spring: 1.0,
        ..springy()
    });
    let after = driver.target(OBJ, prop()).unwrap();
    assert_eq!(after.current, before.current);
    assert_eq!(after.velocity, before.velocity);
    assert_eq!(driver.params().spring, 1.0);

    run_until_idle(&mut driver, &mut host, 5000);
    assert_eq!(host.number(OBJ, prop()), Some(100.0));
}

#[test]
fn transition_without_from_reads_the_host() {
    let mut host = RecordingHost::new().with(OBJ, prop(), 30.0);
    let mut driver = SpringDriver::new(springy());
    driver.transition(OBJ, prop(), 60.0, None, &mut host);
    assert_eq!(driver.target(OBJ, prop()).unwrap().current, 30.0);

    driver.clear();
    assert!(driver.is_idle());
    driver.tick(16, &mut host);
    assert!(host.writes.is_empty());
}
