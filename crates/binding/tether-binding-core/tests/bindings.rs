use tether_api_core::{ObjectId, PropertyHost, PropertyIndex, Value, WriteFlags};
use tether_binding_core::{
    BindingError, BindingId, ClosureSource, Config, DiagnosticKind, Engine, PropertyChange, PropertyDecl,
};

fn engine() -> Engine {
    Engine::new(Config::default())
}

/// Attach and enable one script binding per `(property, source)` pair, scoped to `object`.
fn bind(engine: &mut Engine, object: ObjectId, pairs: &[(&str, &str)]) -> Vec<BindingId> {
    let closures = pairs
        .iter()
        .enumerate()
        .map(|(i, (_, src))| ClosureSource::new(*src, i as u32 + 1, 1))
        .collect();
    let program = engine.create_program("test.qml", closures);
    let mut ids = Vec::new();
    for (i, (prop, _)) in pairs.iter().enumerate() {
        let index = engine.property(object, prop).unwrap();
        let id = engine.config_binding(program, i, object, index, object).unwrap();
        engine.add_to_object(id).unwrap();
        ids.push(id);
    }
    for id in &ids {
        engine.set_enabled(*id, true, WriteFlags::empty()).unwrap();
    }
    ids
}

fn num(engine: &Engine, object: ObjectId, name: &str) -> f64 {
    engine.value(object, name).unwrap().as_number().unwrap()
}

#[test]
fn writes_propagate_through_chains() {
    let mut e = engine();
    let obj = e.create_object(
        "item",
        vec![
            PropertyDecl::plain("x", 1),
            PropertyDecl::plain("y", 0),
            PropertyDecl::plain("z", 0),
        ],
    );
    bind(&mut e, obj, &[("y", "x * 2"), ("z", "y + 1")]);
    assert_eq!(num(&e, obj, "y"), 2.0);
    assert_eq!(num(&e, obj, "z"), 3.0);

    e.set_value(obj, "x", 10).unwrap();
    assert_eq!(num(&e, obj, "y"), 20.0);
    assert_eq!(num(&e, obj, "z"), 21.0);
}

#[test]
fn subscriptions_follow_the_last_evaluation() {
    let mut e = engine();
    let obj = e.create_object(
        "item",
        vec![
            PropertyDecl::plain("flag", true),
            PropertyDecl::plain("a", 1),
            PropertyDecl::plain("b", 2),
            PropertyDecl::plain("out", 0),
        ],
    );
    bind(&mut e, obj, &[("out", "flag ? a : b")]);
    assert_eq!(num(&e, obj, "out"), 1.0);

    let before = e.stats().evaluations;
    e.set_value(obj, "b", 5).unwrap();
    assert_eq!(e.stats().evaluations, before);

    e.set_value(obj, "flag", false).unwrap();
    assert_eq!(num(&e, obj, "out"), 5.0);
    let before = e.stats().evaluations;
    e.set_value(obj, "a", 7).unwrap();
    assert_eq!(e.stats().evaluations, before);
    e.set_value(obj, "b", 6).unwrap();
    assert_eq!(num(&e, obj, "out"), 6.0);
}

#[test]
fn equal_writes_do_not_notify() {
    let mut e = engine();
    let obj = e.create_object("item", vec![PropertyDecl::plain("x", 1), PropertyDecl::plain("y", 0)]);
    bind(&mut e, obj, &[("y", "x")]);
    let before = e.stats().notifications;
    e.set_value(obj, "x", 1).unwrap();
    assert_eq!(e.stats().notifications, before);
}

#[test]
fn disabled_bindings_are_skipped() {
    let mut e = engine();
    let obj = e.create_object("item", vec![PropertyDecl::plain("x", 1), PropertyDecl::plain("y", 0)]);
    let ids = bind(&mut e, obj, &[("y", "x + 1")]);
    e.set_enabled(ids[0], false, WriteFlags::empty()).unwrap();
    e.set_value(obj, "x", 5).unwrap();
    assert_eq!(num(&e, obj, "y"), 2.0);

    e.set_enabled(ids[0], true, WriteFlags::empty()).unwrap();
    assert_eq!(num(&e, obj, "y"), 6.0);
}

#[test]
fn mutual_script_bindings_report_one_loop() {
    let mut e = engine();
    let obj = e.create_object("item", vec![PropertyDecl::plain("a", 0), PropertyDecl::plain("b", 0)]);
    bind(&mut e, obj, &[("b", "a + 1"), ("a", "b + 1")]);

    assert_eq!(e.stats().loop_detections, 1);
    assert_eq!(e.diagnostics().len(), 1);
    assert_eq!(e.diagnostics()[0].kind, DiagnosticKind::BindingLoop);
    assert_eq!(e.diagnostics()[0].message, "Binding loop detected for property \"a\"");
    assert_eq!(e.diagnostics()[0].line, 2);
    // The looping binding keeps the value it had before it started, and its
    // dependent follows the restored value.
    assert_eq!(num(&e, obj, "a"), 0.0);
    assert_eq!(num(&e, obj, "b"), 1.0);
}

#[test]
fn dependents_of_a_self_loop_see_the_restored_value() {
    let mut e = engine();
    let obj = e.create_object("item", vec![PropertyDecl::plain("a", 0), PropertyDecl::plain("b", 7)]);
    bind(&mut e, obj, &[("b", "a * 2"), ("a", "a + 1")]);

    assert_eq!(e.stats().loop_detections, 1);
    assert_eq!(e.diagnostics().len(), 1);
    assert_eq!(num(&e, obj, "a"), 0.0);
    assert_eq!(num(&e, obj, "b"), num(&e, obj, "a") * 2.0);

    // Writing the property replaces the looping binding; the dependent keeps tracking it.
    e.set_value(obj, "a", 4).unwrap();
    assert_eq!(num(&e, obj, "b"), 8.0);
    assert_eq!(e.stats().loop_detections, 1);
}

#[test]
fn mutual_property_copies_settle() {
    let mut e = engine();
    let a = e.create_object("a", vec![PropertyDecl::plain("v", 0)]);
    let b = e.create_object("b", vec![PropertyDecl::plain("v", 0)]);
    let v = PropertyIndex::new(0);
    let b_from_a = e.create_property_binding((a, v), (b, v)).unwrap();
    let a_from_b = e.create_property_binding((b, v), (a, v)).unwrap();
    for id in [b_from_a, a_from_b] {
        e.add_to_object(id).unwrap();
        e.set_enabled(id, true, WriteFlags::empty()).unwrap();
    }

    e.write(a, v, Value::from(3), WriteFlags::empty());
    assert_eq!(e.read(b, v), Value::from(3));
    assert_eq!(e.read(a, v), Value::from(3));
    assert!(e.diagnostics().is_empty());
}

#[test]
fn add_and_remove_in_any_order_keeps_lists_consistent() {
    let orders: [[usize; 6]; 3] = [[0, 1, 2, 3, 4, 5], [5, 4, 3, 2, 1, 0], [3, 0, 5, 2, 4, 1]];
    for order in orders {
        let mut e = engine();
        let src = e.create_object("src", vec![PropertyDecl::plain("q", 7)]);
        let dst = e.create_object(
            "dst",
            vec![
                PropertyDecl::plain("p", 0),
                PropertyDecl::plain("r", 0),
                PropertyDecl::value_type("font", [("size", Value::from(0)), ("weight", Value::from(0))]),
            ],
        );
        let q = PropertyIndex::new(0);
        let targets = [
            PropertyIndex::new(0),
            PropertyIndex::new(0),
            PropertyIndex::new(1),
            PropertyIndex::member(2, 0),
            PropertyIndex::member(2, 1),
            PropertyIndex::member(2, 0),
        ];
        let ids: Vec<BindingId> = targets
            .iter()
            .map(|t| {
                let id = e.create_property_binding((src, q), (dst, *t)).unwrap();
                e.add_to_object(id).unwrap();
                e.set_enabled(id, true, WriteFlags::empty()).unwrap();
                id
            })
            .collect();
        assert_eq!(e.read(dst, PropertyIndex::member(2, 1)), Value::from(7));
        assert!(matches!(e.add_to_object(ids[0]), Err(BindingError::AlreadyAttached(_))));

        let mut attached = vec![true; ids.len()];
        for &i in &order {
            e.remove_from_object(ids[i]).unwrap();
            attached[i] = false;

            let top = e.bindings_of(dst);
            let proxy = top
                .iter()
                .copied()
                .find(|id| e.binding(*id).unwrap().kind.is_proxy())
                .expect("proxy stays in the list");
            let members = e.proxy_members(proxy);
            for (j, id) in ids.iter().enumerate() {
                let listed = if targets[j].is_value_type() {
                    members.contains(id)
                } else {
                    top.contains(id)
                };
                assert_eq!(listed, attached[j], "order {order:?}, binding {j}");
                assert_eq!(e.binding(*id).unwrap().state.added_to_object, attached[j]);
            }
            for core in 0..3u32 {
                let expected = (0..ids.len()).any(|j| attached[j] && targets[j].core == core);
                assert_eq!(e.has_binding(dst, core), expected, "order {order:?}, core {core}");
            }
        }

        assert_eq!(e.bindings_of(dst).len(), 1);
        let notified = e.stats().notifications;
        e.write(src, q, Value::from(9), WriteFlags::empty());
        e.write(dst, PropertyIndex::new(0), Value::from(1), WriteFlags::empty());
        assert_eq!(e.stats().notifications, notified);
        assert_eq!(e.read(dst, PropertyIndex::new(1)), Value::from(7));

        for id in ids {
            e.destroy(id).unwrap();
        }
        assert_eq!(e.binding_count(), 1);
    }
}

#[test]
fn binding_may_destroy_itself_while_evaluating() {
    let mut e = engine();
    let obj = e.create_object("item", vec![PropertyDecl::plain("width", 0)]);
    let ids = bind(&mut e, obj, &[("width", "{ width = 5; 42 }")]);

    assert_eq!(num(&e, obj, "width"), 5.0);
    assert!(e.binding(ids[0]).is_none());
    assert_eq!(e.binding_count(), 0);
    assert_eq!(e.stats().bindings_removed_by_write, 1);
    assert!(matches!(e.update(ids[0], WriteFlags::empty()), Err(BindingError::StaleBinding(_))));
}

#[test]
fn member_assignment_removes_only_that_member_binding() {
    let mut e = engine();
    let obj = e.create_object(
        "label",
        vec![
            PropertyDecl::plain("base", 10),
            PropertyDecl::value_type("font", [("size", Value::from(0)), ("weight", Value::from(0))]),
        ],
    );
    let ids = bind(&mut e, obj, &[("font.size", "base"), ("font.weight", "base * 10")]);
    assert_eq!(num(&e, obj, "font.weight"), 100.0);

    e.set_value(obj, "font.size", 3).unwrap();
    assert!(e.binding(ids[0]).is_none());
    e.set_value(obj, "base", 2).unwrap();
    assert_eq!(num(&e, obj, "font.size"), 3.0);
    assert_eq!(num(&e, obj, "font.weight"), 20.0);

    // Assigning the whole composite clears every member binding.
    e.set_value(obj, "font", Value::object([("size", Value::from(1)), ("weight", Value::from(1))]))
        .unwrap();
    assert!(e.binding(ids[1]).is_none());
    assert!(!e.has_binding(obj, 1));
    assert_eq!(e.stats().bindings_removed_by_write, 2);
}

#[test]
fn disabling_a_proxy_disables_its_members() {
    let mut e = engine();
    let obj = e.create_object(
        "label",
        vec![
            PropertyDecl::plain("base", 1),
            PropertyDecl::value_type("font", [("size", Value::from(0))]),
        ],
    );
    let ids = bind(&mut e, obj, &[("font.size", "base + 1")]);
    let proxy = e.bindings_of(obj)[0];
    e.set_enabled(proxy, false, WriteFlags::empty()).unwrap();
    assert!(!e.binding(ids[0]).unwrap().state.enabled);
    e.set_value(obj, "base", 5).unwrap();
    assert_eq!(num(&e, obj, "font.size"), 2.0);

    e.set_enabled(proxy, true, WriteFlags::empty()).unwrap();
    assert_eq!(num(&e, obj, "font.size"), 6.0);
}

#[test]
fn interceptors_capture_unflagged_writes() {
    let mut e = engine();
    let obj = e.create_object("item", vec![PropertyDecl::plain("x", 0), PropertyDecl::plain("src", 1)]);
    let x = e.property(obj, "x").unwrap();
    e.set_interceptor(obj, x);

    assert!(e.write(obj, x, Value::from(4), WriteFlags::empty()));
    assert_eq!(e.read(obj, x), Value::from(0));

    bind(&mut e, obj, &[("x", "src * 10")]);
    assert_eq!(e.read(obj, x), Value::from(0));

    let captured = e.take_intercepted();
    assert_eq!(captured.len(), 2);
    assert_eq!(captured[0].value, Value::from(4));
    assert_eq!(captured[1].value, Value::from(10));
    assert!(e.take_intercepted().is_empty());

    e.write(obj, x, Value::from(11), WriteFlags::BYPASS_INTERCEPTORS);
    assert_eq!(e.read(obj, x), Value::from(11));

    e.clear_interceptor(obj, x);
    e.write(obj, x, Value::from(12), WriteFlags::empty());
    assert_eq!(e.read(obj, x), Value::from(12));
}

#[test]
fn dont_notify_stores_silently() {
    let mut e = engine();
    let obj = e.create_object("item", vec![PropertyDecl::plain("x", 1), PropertyDecl::plain("y", 0)]);
    bind(&mut e, obj, &[("y", "x")]);
    let x = e.property(obj, "x").unwrap();
    e.write(obj, x, Value::from(8), WriteFlags::DONT_NOTIFY);
    assert_eq!(num(&e, obj, "y"), 1.0);
}

#[test]
fn batched_changes_read_a_consistent_snapshot() {
    let mut e = engine();
    let obj = e.create_object(
        "item",
        vec![
            PropertyDecl::plain("a", 1),
            PropertyDecl::plain("b", 2),
            PropertyDecl::plain("sum", 0),
        ],
    );
    bind(&mut e, obj, &[("sum", "a * 10 + b")]);
    let (a, b) = (e.property(obj, "a").unwrap(), e.property(obj, "b").unwrap());

    let swap = [PropertyChange::expression(obj, a, "b"), PropertyChange::expression(obj, b, "a")];
    assert_eq!(e.apply_changes(None, &swap).unwrap(), 2);
    assert_eq!(num(&e, obj, "a"), 2.0);
    assert_eq!(num(&e, obj, "b"), 1.0);
    assert_eq!(num(&e, obj, "sum"), 21.0);

    let failing = [PropertyChange::value(obj, a, 9), PropertyChange::expression(obj, b, "missing + 1")];
    assert!(matches!(e.apply_changes(None, &failing), Err(BindingError::Evaluation { .. })));
    assert_eq!(num(&e, obj, "a"), 2.0);
}

#[test]
fn overflowing_delayed_errors_are_reported_immediately() {
    let cfg = Config {
        delayed_error_capacity: 1,
        ..Config::default()
    };
    let mut e = Engine::new(cfg);
    let obj = e.create_object("item", vec![PropertyDecl::plain("x", 0), PropertyDecl::plain("y", 0)]);
    bind(&mut e, obj, &[("x", "{ throw 'first' }"), ("y", "nope")]);

    let delayed = e.take_delayed_errors();
    assert_eq!(delayed.len(), 1);
    assert_eq!(delayed[0].message, "Uncaught first");
    assert_eq!(delayed[0].line, 1);
    assert!(!delayed[0].immediate);

    let immediate = e.take_diagnostics();
    assert_eq!(immediate.len(), 1);
    assert!(immediate[0].immediate);
    assert_eq!(immediate[0].line, 2);
    assert_eq!(immediate[0].message, "ReferenceError: nope is not defined");
}

#[test]
fn program_references_follow_binding_lifetime() {
    let mut e = engine();
    let obj = e.create_object("item", vec![PropertyDecl::plain("x", 0), PropertyDecl::plain("y", 0)]);
    let program = e.create_program(
        "refs.qml",
        vec![ClosureSource::new("1", 1, 1), ClosureSource::new("2", 2, 1)],
    );
    assert!(!e.is_compiled(program));
    assert_eq!(e.holds_source(program, 0), Some(true));

    let x = e.property(obj, "x").unwrap();
    let first = e.config_binding(program, 0, obj, x, obj).unwrap();
    let second = e.config_binding(program, 1, obj, x, obj).unwrap();
    assert!(e.is_compiled(program));
    assert_eq!(e.program_ref_count(program), Some(2));
    assert!(matches!(
        e.config_binding(program, 2, obj, x, obj),
        Err(BindingError::UnknownClosure { closure: 2, .. })
    ));

    e.destroy(first).unwrap();
    assert_eq!(e.program_ref_count(program), Some(1));
    assert!(e.binding(first).is_none());
    assert_eq!(e.binding(second).unwrap().ref_count, 1);
}

#[test]
fn destroying_an_object_destroys_its_bindings() {
    let mut e = engine();
    let src = e.create_object("src", vec![PropertyDecl::plain("v", 1)]);
    let dst = e.create_object(
        "dst",
        vec![
            PropertyDecl::plain("v", 0),
            PropertyDecl::value_type("pos", [("x", Value::from(0))]),
        ],
    );
    let v = PropertyIndex::new(0);
    for target in [v, PropertyIndex::member(1, 0)] {
        let id = e.create_property_binding((src, v), (dst, target)).unwrap();
        e.add_to_object(id).unwrap();
        e.set_enabled(id, true, WriteFlags::empty()).unwrap();
    }
    assert_eq!(e.binding_count(), 3);

    e.destroy_object(dst).unwrap();
    assert_eq!(e.binding_count(), 0);
    assert!(!e.write(dst, v, Value::from(1), WriteFlags::empty()));
    assert!(e.write(src, v, Value::from(2), WriteFlags::empty()));
    assert!(matches!(e.destroy_object(dst), Err(BindingError::UnknownObject(_))));
}

#[test]
fn host_view_names_members() {
    let mut e = engine();
    let obj = e.create_object("label", vec![PropertyDecl::value_type("font", [("pixelSize", Value::from(9))])]);
    assert_eq!(PropertyHost::display_name(&e, obj, PropertyIndex::member(0, 0)), "font.pixelSize");
    assert_eq!(e.object_name(obj), Some("label"));
    assert!(matches!(
        e.property(obj, "font.weight"),
        Err(BindingError::UnknownProperty { .. })
    ));
}
