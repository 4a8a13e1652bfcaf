use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use keyed_pool::{routing, Config, Executor, GroupManager};
use std::hint::black_box;

// Benchmark 1: routing cost
fn bench_routing(c: &mut Criterion) {
    let keys: Vec<String> = (0..1_000).map(|i| format!("account-{i}")).collect();
    let mut group = c.benchmark_group("routing");
    group.throughput(Throughput::Elements(keys.len() as u64));

    group.bench_function("route_1000_keys", |b| {
        b.iter(|| {
            for key in &keys {
                black_box(routing::route(black_box(key), 16));
            }
        })
    });
    group.finish();
}

// Benchmark 2: submit + wait_all round trip
fn bench_submit_wait(c: &mut Criterion) {
    let mut group = c.benchmark_group("submit_wait");

    for workers in [1, 4, num_cpus::get()] {
        let size = 10_000u64;
        group.throughput(Throughput::Elements(size));
        group.bench_with_input(BenchmarkId::new("workers", workers), &workers, |b, &workers| {
            let exec = Executor::with_config(Config::new(workers, 1_024), |_: &str, v: u64| {
                black_box(v);
            })
            .unwrap();
            let keys: Vec<String> = (0..256).map(|i| format!("k{i}")).collect();

            b.iter(|| {
                for i in 0..size {
                    exec.submit(keys[(i % 256) as usize].as_str(), i).unwrap();
                }
                exec.wait_all();
            });
            exec.shutdown();
        });
    }
    group.finish();
}

// Benchmark 3: hot single key, queue depth matters
fn bench_queue_depth(c: &mut Criterion) {
    let mut group = c.benchmark_group("queue_depth");

    for capacity in [2, 16, 256] {
        group.throughput(Throughput::Elements(5_000));
        group.bench_with_input(BenchmarkId::new("capacity", capacity), &capacity, |b, &capacity| {
            let exec = Executor::new(2, capacity, |_: &str, v: u32| {
                black_box(v);
            })
            .unwrap();

            b.iter(|| {
                for i in 0..5_000u32 {
                    exec.submit("hot", i).unwrap();
                }
                exec.wait_all();
            });
            exec.shutdown();
        });
    }
    group.finish();
}

// Benchmark 4: async completion waiting across groups
fn bench_groups_async_wait(c: &mut Criterion) {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .unwrap();
    let manager = GroupManager::with_config(Config::new(2, 256)).unwrap();
    let groups: Vec<_> = (0..4)
        .map(|_| manager.new_group(|_: &str, v: u32| {
            black_box(v);
        }))
        .collect();

    let (groups, manager) = (&groups, &manager);
    c.bench_function("groups_wait_all_async", |b| {
        b.to_async(&rt).iter(|| async move {
            for group in groups {
                for i in 0..1_000u32 {
                    group.submit("k", i).unwrap();
                }
            }
            manager.wait_all_async().await;
        })
    });
    manager.stop_all();
}

criterion_group!(
    benches,
    bench_routing,
    bench_submit_wait,
    bench_queue_depth,
    bench_groups_async_wait,
);
criterion_main!(benches);
