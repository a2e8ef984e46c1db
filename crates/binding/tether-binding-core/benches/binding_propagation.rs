use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tether_api_core::{Value, WriteFlags};
use tether_binding_core::{ClosureSource, Config, Engine, PropertyDecl};

/// `links` properties where `p{i}` is bound to `p{i-1} + 1`.
fn chain(links: usize) -> (Engine, tether_api_core::ObjectId) {
    let mut engine = Engine::new(Config::default());
    let decls = (0..=links).map(|i| PropertyDecl::plain(format!("p{i}"), 0)).collect();
    let obj = engine.create_object("chain", decls);
    let closures = (1..=links)
        .map(|i| ClosureSource::new(format!("p{} + 1", i - 1), i as u32, 1))
        .collect();
    let program = engine.create_program("bench.qml", closures);
    for i in 1..=links {
        let index = engine.property(obj, &format!("p{i}")).expect("declared");
        let id = engine.config_binding(program, i - 1, obj, index, obj).expect("config");
        engine.add_to_object(id).expect("attach");
        engine.set_enabled(id, true, WriteFlags::empty()).expect("enable");
    }
    (engine, obj)
}

fn bench_propagation(c: &mut Criterion) {
    let mut group = c.benchmark_group("propagation");
    for &links in &[8usize, 64, 256] {
        let (mut engine, obj) = chain(links);
        let head = engine.property(obj, "p0").expect("declared");
        let mut n = 0.0;
        group.bench_function(format!("chain_{links}"), |b| {
            b.iter(|| {
                n += 1.0;
                black_box(engine.write(obj, head, Value::Number(n), WriteFlags::empty()))
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_propagation);
criterion_main!(benches);
