use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use pgstmt::prelude::*;
use pgstmt::{BoxStatement, Fragment};

struct Filter {
    conditions: usize,
    ids: Vec<i64>,
}

/// `SELECT ... WHERE c0 = ? AND c1 = ? ... AND id IN (?,?,...) LIMIT ?`
fn filter_statement(max_conditions: usize) -> impl Statement<Filter> {
    let mut conditions: Vec<BoxStatement<Filter>> = (0..max_conditions)
        .map(|i| {
            expr(move |f: &Filter| {
                Ok(if i < f.conditions {
                    Fragment::bind(format!("c{i} = ?"), i as i64)
                } else {
                    Fragment::empty()
                })
            })
            .boxed()
        })
        .collect();
    let ids = template::<Vec<i64>>("id IN (?)").bind(list_params(","));
    conditions.push(project(|f: &Filter| &f.ids, ids).boxed());

    template::<Filter>("SELECT * FROM t ? LIMIT 10").bind(where_all(conditions))
}

fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("statement/resolve");
    let statement = filter_statement(100);

    for n in [1, 10, 50, 100] {
        let filter = Filter {
            conditions: n,
            ids: (0..n as i64).collect(),
        };
        group.bench_with_input(BenchmarkId::from_parameter(n), &filter, |b, filter| {
            b.iter(|| black_box(statement.to_sql(filter)));
        });
    }

    group.finish();
}

fn bench_rewrite(c: &mut Criterion) {
    let mut group = c.benchmark_group("statement/rewrite_dollar");

    for n in [5, 20, 100, 500] {
        let markers = vec!["?"; n].join(",");
        let sql = format!("INSERT INTO t VALUES ({markers}) -- ?? kept");
        group.bench_with_input(BenchmarkId::from_parameter(n), &sql, |b, sql| {
            b.iter(|| black_box(DOLLAR.replace_placeholders(sql)));
        });
    }

    group.finish();
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("statement/query_build");
    let query = Query::<(), Filter>::new(filter_statement(20));

    for n in [1, 10, 20] {
        let filter = Filter {
            conditions: n,
            ids: vec![1, 2, 3],
        };
        group.bench_with_input(BenchmarkId::from_parameter(n), &filter, |b, filter| {
            b.iter(|| black_box(query.build(filter)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_resolve, bench_rewrite, bench_build);
criterion_main!(benches);
