use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use sqlframe::{Db, SearchPolicy, Selector, Value, escape};

/// `col0 = ? and col1 = ? ...` with `n` mixed-type args.
fn predicate(n: usize) -> (String, Vec<Value>) {
    let sql = (0..n)
        .map(|i| format!("col{i} = ?"))
        .collect::<Vec<_>>()
        .join(" and ");
    let args = (0..n)
        .map(|i| {
            if i % 2 == 0 {
                Value::from(i as i64)
            } else {
                Value::from(format!("it's value {i}"))
            }
        })
        .collect();
    (sql, args)
}

fn bench_escape(c: &mut Criterion) {
    let mut group = c.benchmark_group("sql_builder/escape");

    for n in [1, 5, 10, 50, 100] {
        let input = predicate(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &input, |b, (sql, args)| {
            b.iter(|| black_box(escape(sql, args)));
        });
    }

    group.finish();
}

fn bench_selector(c: &mut Criterion) {
    let mut group = c.benchmark_group("sql_builder/selector");
    let db = Db::new(());

    for n in [1, 5, 10, 50] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| {
                let mut s = Selector::new(&db, "post");
                s.field("id, title", vec![]);
                for i in 0..n {
                    s.search(&format!("col{i} = ?"), i as i64, SearchPolicy::WithoutZero);
                }
                s.order("id desc", vec![]).limit(40, 20);
                black_box(s.build_sql(true));
                black_box(s.build_count());
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_escape, bench_selector);
criterion_main!(benches);
