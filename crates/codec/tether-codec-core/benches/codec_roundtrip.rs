use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use tether_api_core::Value;
use tether_codec_core::{deserialize, serialize};

fn sample(rows: usize) -> Value {
    Value::Array(
        (0..rows)
            .map(|i| {
                Value::object([
                    ("id", Value::from(i as i32)),
                    ("name", Value::from(format!("row {i}"))),
                    ("weight", Value::Number(i as f64 * 0.25)),
                    ("tags", Value::Array(vec![Value::from("a"), Value::Bool(i % 2 == 0)])),
                ])
            })
            .collect(),
    )
}

fn bench_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec");
    for &rows in &[16usize, 256, 4096] {
        let value = sample(rows);
        group.bench_function(format!("serialize_{rows}"), |b| {
            b.iter(|| black_box(serialize(black_box(&value))))
        });
        let encoded = serialize(&value);
        group.bench_function(format!("deserialize_{rows}"), |b| {
            b.iter_batched(
                || encoded.clone(),
                |bytes| black_box(deserialize(bytes, 1)),
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

criterion_group!(benches, bench_codec);
criterion_main!(benches);
