use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rowcursor::{
    CursorBuilder, CursorConfig, LazyResourceCursor, ReleaseError, ResourceHandle, ResourceName,
    ResourceStack, RowIndex,
};
use rowcursor_memory::VecRowSource;
use std::convert::Infallible;
use std::hint::black_box;

fn connection() -> impl FnMut() -> Result<(), ReleaseError> + Send + 'static {
    || Ok(())
}

fn untracked() -> CursorConfig {
    CursorConfig::default().with_leak_tracking(false)
}

/// Benchmark draining a cursor through the iterator interface
fn bench_drain(c: &mut Criterion) {
    let mut group = c.benchmark_group("drain");

    for row_count in [10_u64, 1_000, 100_000] {
        group.throughput(Throughput::Elements(row_count));

        group.bench_with_input(
            BenchmarkId::new("iterator", row_count),
            &row_count,
            |b, &count| {
                b.iter(|| {
                    let cursor = CursorBuilder::new(VecRowSource::new(0..count))
                        .resource(ResourceName::try_new("connection").unwrap(), connection())
                        .config(untracked())
                        .build(|row: u64, index: RowIndex| {
                            Ok::<_, Infallible>(row ^ u64::from(index))
                        });

                    black_box(cursor.map(Result::unwrap).sum::<u64>())
                });
            },
        );

        group.bench_with_input(
            BenchmarkId::new("has_next_take_next", row_count),
            &row_count,
            |b, &count| {
                b.iter(|| {
                    let mut cursor = CursorBuilder::new(VecRowSource::new(0..count))
                        .config(untracked())
                        .build(|row: u64, _: RowIndex| Ok::<_, Infallible>(row));

                    let mut total = 0_u64;
                    while cursor.has_next().unwrap() {
                        total += cursor.take_next().unwrap();
                    }
                    black_box(total)
                });
            },
        );
    }

    group.finish();
}

/// Benchmark opening and closing a cursor without pulling any rows
fn bench_open_close(c: &mut Criterion) {
    let mut group = c.benchmark_group("open_close");
    group.throughput(Throughput::Elements(1));

    for handle_count in [0_usize, 3, 10] {
        group.bench_with_input(
            BenchmarkId::new("handles", handle_count),
            &handle_count,
            |b, &count| {
                b.iter(|| {
                    let mut resources = ResourceStack::new();
                    for _ in 0..count {
                        resources.push(ResourceHandle::new(
                            ResourceName::try_new("handle").unwrap(),
                            connection(),
                        ));
                    }
                    let mut cursor = LazyResourceCursor::new(
                        VecRowSource::new(Vec::<u64>::new()),
                        resources,
                        |row: u64, _: RowIndex| Ok::<_, Infallible>(row),
                    );
                    cursor.close();
                    black_box(cursor.is_closed())
                });
            },
        );
    }

    group.finish();
}

/// Benchmark the cost of leak tracking on open and close
fn bench_leak_tracking(c: &mut Criterion) {
    let mut group = c.benchmark_group("leak_tracking");

    for tracked in [false, true] {
        group.bench_with_input(
            BenchmarkId::new("open_drain_close", tracked),
            &tracked,
            |b, &tracked| {
                b.iter(|| {
                    let cursor = CursorBuilder::new(VecRowSource::new(0..16_u64))
                        .config(CursorConfig::default().with_leak_tracking(tracked))
                        .build(|row: u64, _: RowIndex| Ok::<_, Infallible>(row));

                    black_box(cursor.count())
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_drain, bench_open_close, bench_leak_tracking);
criterion_main!(benches);
