use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use sqlcraft::{Dialect, FieldDef, Op, Query, Renderer, Schema, Value};

/// Schema with `n` integer columns: col0, col1, ...
fn wide_schema(n: usize) -> Schema {
    Schema::resolve(
        "Wide",
        "t",
        (0..n).map(|i| FieldDef::new(format!("col{i}"), "i64", format!("col{i}"))),
    )
    .expect("valid schema")
}

/// UPDATE t SET col0 = ?, ... WHERE col0 = ? AND col1 = ? ...
fn build_update(schema: &Schema, n: usize) -> Query<Value> {
    let mut q = Query::update(schema);
    for i in 0..n {
        let col = format!("col{i}");
        q.assign(schema, &col, i as i64).expect("known column");
        q.filter(schema, &col, Op::eq(i as i64)).expect("known column");
    }
    q
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render/update");

    for n in [1, 5, 10, 50, 100] {
        let schema = wide_schema(n);
        let query = build_update(&schema, n);
        for dialect in [Dialect::MySql, Dialect::Postgres] {
            let renderer = Renderer::new(dialect);
            group.bench_with_input(
                BenchmarkId::new(dialect.name(), n),
                &query,
                |b, query| {
                    b.iter(|| black_box(renderer.render(query).expect("renders")));
                },
            );
        }
    }

    group.finish();
}

fn bench_build_and_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render/build_and_render");

    for n in [1, 10, 100] {
        let schema = wide_schema(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| {
                let query = build_update(&schema, n);
                black_box(Renderer::new(Dialect::Postgres).render(&query).expect("renders"));
            });
        });
    }

    group.finish();
}

fn bench_in_list(c: &mut Criterion) {
    let mut group = c.benchmark_group("render/in_list");
    let schema = wide_schema(1);

    for n in [1, 10, 100, 1000] {
        let mut query: Query<Value> = Query::select(&schema);
        query
            .filter(&schema, "col0", Op::in_list(0..n as i64))
            .expect("known column");
        group.bench_with_input(BenchmarkId::from_parameter(n), &query, |b, query| {
            b.iter(|| black_box(Renderer::new(Dialect::SqlServer).render(query).expect("renders")));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_render, bench_build_and_render, bench_in_list);
criterion_main!(benches);
