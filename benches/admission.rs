use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;
use vhost_throttle::{
    AdmissionController, ConnectionLimitHandler, HostId, HostRecord, Metrics, RequestInfo,
    ShardedStorage, SystemClock, VirtualHostLimitConfig, WindowStore,
};

type Controller = AdmissionController<Arc<ShardedStorage<HostId, HostRecord>>>;

fn controller(hosts: usize, config: VirtualHostLimitConfig) -> Controller {
    let storage: Arc<ShardedStorage<HostId, HostRecord>> =
        Arc::new(ShardedStorage::with_capacity(hosts));
    let store = WindowStore::new(storage);
    for i in 0..hosts {
        store
            .create_host(HostId::new(format!("host{}.example", i)), config)
            .unwrap();
    }
    AdmissionController::new(store, Arc::new(SystemClock::new()), Metrics::new())
}

/// Benchmark single-threaded decision throughput per strategy
fn bench_single_threaded_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_threaded");
    group.throughput(Throughput::Elements(1000));

    let strategies = [
        ("fixed", VirtualHostLimitConfig::fixed_window(100, 30).unwrap()),
        ("sliding", VirtualHostLimitConfig::sliding_window(30).unwrap()),
        ("disabled", VirtualHostLimitConfig::default()),
    ];

    for (name, config) in strategies.iter() {
        group.bench_with_input(BenchmarkId::new("decide", name), config, |b, config| {
            let controller = controller(1, *config);
            let mut now = 1_700_000_000u64;

            b.iter(|| {
                for _ in 0..1000 {
                    now += 1;
                    black_box(controller.decide(black_box("host0.example"), now));
                }
            })
        });
    }

    group.bench_function("handler_on_request", |b| {
        let handler = ConnectionLimitHandler::builder()
            .with_host("host0.example", VirtualHostLimitConfig::fixed_window(100, 30).unwrap())
            .build()
            .unwrap();
        let request = RequestInfo::new("host0.example").with_handler("php-script");

        b.iter(|| {
            for _ in 0..1000 {
                black_box(handler.on_request(black_box(&request)));
            }
        })
    });

    group.finish();
}

/// Benchmark multi-threaded throughput, one host per thread or all on one
fn bench_concurrent_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent");

    for num_threads in [2, 4, 8].iter() {
        group.throughput(Throughput::Elements((*num_threads as u64) * 1000));

        for (label, shared) in [("own_host", false), ("shared_host", true)] {
            group.bench_with_input(
                BenchmarkId::new(label, num_threads),
                num_threads,
                |b, &num_threads| {
                    let controller = controller(
                        num_threads,
                        VirtualHostLimitConfig::fixed_window(100, 30).unwrap(),
                    );

                    b.iter(|| {
                        let mut handles = vec![];
                        for i in 0..num_threads {
                            let controller = controller.clone();
                            let host = format!("host{}.example", if shared { 0 } else { i });
                            handles.push(std::thread::spawn(move || {
                                for _ in 0..1000 {
                                    black_box(controller.check(black_box(&host)));
                                }
                            }));
                        }

                        for handle in handles {
                            handle.join().unwrap();
                        }
                    })
                },
            );
        }
    }

    group.finish();
}

/// Benchmark status rendering as the host count grows
fn bench_status_page(c: &mut Criterion) {
    let mut group = c.benchmark_group("status_page");

    for num_hosts in [10, 100, 1000].iter() {
        group.bench_with_input(
            BenchmarkId::new("render", num_hosts),
            num_hosts,
            |b, &num_hosts| {
                let controller =
                    controller(num_hosts, VirtualHostLimitConfig::fixed_window(100, 30).unwrap());
                b.iter(|| black_box(vhost_throttle::render_html(&controller.status_now())))
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_single_threaded_throughput,
    bench_concurrent_throughput,
    bench_status_page,
);
criterion_main!(benches);
