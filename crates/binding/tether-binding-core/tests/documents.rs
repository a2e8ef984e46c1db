use tether_api_core::Value;
use tether_binding_core::{Config, DiagnosticKind, DocumentSpec, Engine};
use tether_test_fixtures::documents;

fn load(engine: &mut Engine, name: &str) -> tether_binding_core::LoadedDocument {
    let json = documents::json(name).expect("fixture");
    engine.load_document_json(&json).expect("load")
}

#[test]
fn self_referential_binding_is_detected_once_and_rolled_back() {
    let mut engine = Engine::new(Config::default());
    let doc = load(&mut engine, "self-loop");
    let counter = doc.object("counter").unwrap();

    assert_eq!(engine.value(counter, "a").unwrap(), Value::from(0));
    assert_eq!(engine.stats().evaluations, 1);
    assert_eq!(engine.stats().loop_detections, 1);

    let diags = engine.diagnostics();
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].kind, DiagnosticKind::BindingLoop);
    assert_eq!(diags[0].message, "Binding loop detected for property \"a\"");
    assert_eq!(diags[0].url, "qrc:/SelfLoop.qml");
    assert_eq!(diags[0].line, 3);

    // A plain assignment replaces the binding and sticks.
    assert!(engine.set_value(counter, "a", 5).unwrap());
    assert_eq!(engine.value(counter, "a").unwrap(), Value::from(5));
    assert_eq!(engine.diagnostics().len(), 1);
    assert_eq!(engine.stats().bindings_removed_by_write, 1);
    assert_eq!(engine.binding_count(), 0);
}

#[test]
fn loop_without_rollback_keeps_the_looped_value() {
    let cfg = Config {
        rollback_on_binding_loop: false,
        ..Config::default()
    };
    let mut engine = Engine::new(cfg);
    let doc = load(&mut engine, "self-loop");
    let counter = doc.object("counter").unwrap();
    assert_eq!(engine.value(counter, "a").unwrap(), Value::from(1));
    assert_eq!(engine.stats().loop_detections, 1);
}

#[test]
fn value_type_members_share_one_proxy() {
    let mut engine = Engine::new(Config::default());
    let doc = load(&mut engine, "label-layout");
    let (root, label) = (doc.object("root").unwrap(), doc.object("label").unwrap());

    assert_eq!(engine.value(label, "width").unwrap(), Value::from(100));
    assert_eq!(engine.value(label, "font.pixelSize").unwrap(), Value::from(25));
    assert_eq!(engine.value(label, "text").unwrap(), Value::from("Sans 25"));

    // Newest first: text, the font proxy, width.
    let list = engine.bindings_of(label);
    assert_eq!(list.len(), 3);
    assert_eq!(list[0], doc.bindings[2]);
    assert_eq!(list[2], doc.bindings[0]);
    assert!(engine.binding(list[1]).unwrap().kind.is_proxy());
    assert_eq!(engine.proxy_members(list[1]), vec![doc.bindings[1]]);

    engine.set_value(root, "height", 200).unwrap();
    assert_eq!(engine.value(label, "font.pixelSize").unwrap(), Value::from(50));
    assert_eq!(engine.value(label, "text").unwrap(), Value::from("Sans 50"));
    assert_eq!(engine.value(label, "width").unwrap(), Value::from(100));
}

#[test]
fn broken_closure_is_a_no_op_and_siblings_still_work() {
    let mut engine = Engine::new(Config::default());
    let doc = load(&mut engine, "broken-closure");
    let item = doc.object("item").unwrap();

    let compile: Vec<_> = engine
        .diagnostics()
        .iter()
        .filter(|d| d.kind == DiagnosticKind::Compile)
        .collect();
    assert_eq!(compile.len(), 1);
    assert_eq!(compile[0].url, "qrc:/Broken.qml");
    assert_eq!(compile[0].line, 7);
    assert!(compile[0].column.is_some());
    assert!(compile[0].message.starts_with("not parseable"), "{}", compile[0].message);

    assert_eq!(engine.value(item, "height").unwrap(), Value::from(0));
    assert_eq!(engine.value(item, "opacity").unwrap(), Value::from(0.5));

    engine.set_value(item, "width", 20).unwrap();
    assert_eq!(engine.value(item, "opacity").unwrap(), Value::from(1));
    assert_eq!(engine.value(item, "height").unwrap(), Value::from(0));

    assert!(engine.is_compiled(doc.program));
    assert_eq!(engine.holds_source(doc.program, 0), Some(false));
    assert_eq!(engine.holds_source(doc.program, 1), Some(false));
}

#[test]
fn context_ids_resolve_after_scope_and_refresh_bindings() {
    let mut engine = Engine::new(Config::default());
    let doc = load(&mut engine, "context-ids");
    let (primary, secondary, view) = (
        doc.object("primary").unwrap(),
        doc.object("secondary").unwrap(),
        doc.object("view").unwrap(),
    );
    let binding = doc.bindings[0];

    assert_eq!(engine.pending_delayed_errors(), 1);
    let delayed = engine.take_delayed_errors();
    assert_eq!(delayed.len(), 1);
    assert_eq!(engine.pending_delayed_errors(), 0);
    assert_eq!(delayed[0].kind, DiagnosticKind::Evaluation);
    assert_eq!(delayed[0].message, "ReferenceError: source is not defined");
    assert_eq!(delayed[0].line, 5);
    assert_eq!(delayed[0].column, None);
    assert!(engine.binding_error(binding).is_some());

    engine.set_context_id(doc.program, "source", primary).unwrap();
    assert_eq!(engine.value(view, "scale").unwrap(), Value::from(8));
    assert!(engine.binding_error(binding).is_none());

    engine.set_value(primary, "size", 5).unwrap();
    assert_eq!(engine.value(view, "scale").unwrap(), Value::from(10));

    engine.set_context_id(doc.program, "source", secondary).unwrap();
    assert_eq!(engine.value(view, "scale").unwrap(), Value::from(80));
    engine.set_value(primary, "size", 6).unwrap();
    assert_eq!(engine.value(view, "scale").unwrap(), Value::from(80));
}

#[test]
fn document_ids_are_visible_to_scripts() {
    let mut engine = Engine::new(Config::default());
    let doc = load(&mut engine, "context-ids");
    let view = doc.object("view").unwrap();
    let v = engine.evaluate(Some(doc.program), view, "primary.size + secondary.size").unwrap();
    assert_eq!(v, Value::from(44));
}

#[test]
fn every_document_fixture_loads() {
    for name in documents::keys() {
        let spec: DocumentSpec = documents::load(&name).expect("fixture parses");
        let mut engine = Engine::new(Config::default());
        let doc = engine.load_document(&spec).expect("document loads");
        assert_eq!(doc.bindings.len(), spec.bindings.len(), "{name}");
        assert_eq!(engine.program_ref_count(doc.program), Some(spec.bindings.len() as u32));
    }
}

#[test]
fn malformed_documents_are_rejected() {
    let mut engine = Engine::new(Config::default());
    assert!(matches!(
        engine.load_document_json("{ \"objects\": 3 }"),
        Err(tether_binding_core::BindingError::Document(_))
    ));
    let unknown = r#"{ "url": "x.qml", "bindings": [ { "target": "ghost", "property": "w", "source": "1" } ] }"#;
    assert_eq!(
        engine.load_document_json(unknown).unwrap_err(),
        tether_binding_core::BindingError::UnknownDocumentObject("ghost".into())
    );
}
