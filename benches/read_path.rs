use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::thread;

use rcu_epoch::{RcuCell, RcuLock};

// Benchmark 1: Single-threaded read section overhead
fn bench_single_thread_read(c: &mut Criterion) {
    c.bench_function("rcu_lock_read_begin_end", |b| {
        let lock = RcuLock::new();
        b.iter(|| {
            let token = lock.read_begin();
            black_box(&token);
            lock.read_end(token);
        });
    });

    c.bench_function("rcu_lock_read_guard", |b| {
        let lock = RcuLock::new();
        b.iter(|| {
            let guard = lock.read();
            black_box(&guard);
        });
    });

    c.bench_function("std_rwlock_read", |b| {
        let lock = RwLock::new(());
        b.iter(|| {
            let guard = lock.read().unwrap();
            black_box(&guard);
        });
    });

    c.bench_function("crossbeam_epoch_pin", |b| {
        b.iter(|| {
            let guard = crossbeam_epoch::pin();
            black_box(&guard);
        });
    });
}

// Benchmark 2: Reading a shared value
fn bench_single_thread_value_read(c: &mut Criterion) {
    c.bench_function("rcu_cell_read", |b| {
        let cell = RcuCell::new(42u64);
        b.iter(|| black_box(*cell.read()));
    });

    c.bench_function("std_rwlock_value_read", |b| {
        let lock = RwLock::new(42u64);
        b.iter(|| black_box(*lock.read().unwrap()));
    });

    c.bench_function("crossbeam_epoch_value_read", |b| {
        let atomic = crossbeam_epoch::Atomic::new(42u64);
        b.iter(|| {
            let guard = crossbeam_epoch::pin();
            let shared = atomic.load(Ordering::Acquire, &guard);
            // SAFETY: never replaced, so always valid.
            black_box(unsafe { *shared.deref() })
        });
        // SAFETY: no other references remain.
        unsafe { drop(atomic.into_owned()) };
    });
}

// Benchmark 3: Concurrent read-heavy workload
fn bench_concurrent_reads(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent_reads");
    group.sample_size(10);

    for num_threads in [2, 4, 8].iter() {
        group.bench_with_input(
            BenchmarkId::new("rcu_cell", num_threads),
            num_threads,
            |b, &num_threads| {
                b.iter(|| {
                    let cell = Arc::new(RcuCell::new(0u64));
                    let counter = Arc::new(AtomicUsize::new(0));

                    let handles: Vec<_> = (0..num_threads)
                        .map(|_| {
                            let cell = cell.clone();
                            let c = counter.clone();
                            thread::spawn(move || {
                                for _ in 0..1000 {
                                    let _val = *cell.read();
                                    c.fetch_add(1, Ordering::Relaxed);
                                }
                            })
                        })
                        .collect();

                    for handle in handles {
                        let _ = handle.join();
                    }
                });
            },
        );

        group.bench_with_input(
            BenchmarkId::new("std_rwlock", num_threads),
            num_threads,
            |b, &num_threads| {
                b.iter(|| {
                    let lock = Arc::new(RwLock::new(0u64));
                    let counter = Arc::new(AtomicUsize::new(0));

                    let handles: Vec<_> = (0..num_threads)
                        .map(|_| {
                            let lock = lock.clone();
                            let c = counter.clone();
                            thread::spawn(move || {
                                for _ in 0..1000 {
                                    let _val = *lock.read().unwrap();
                                    c.fetch_add(1, Ordering::Relaxed);
                                }
                            })
                        })
                        .collect();

                    for handle in handles {
                        let _ = handle.join();
                    }
                });
            },
        );

        group.bench_with_input(
            BenchmarkId::new("crossbeam_epoch", num_threads),
            num_threads,
            |b, &num_threads| {
                b.iter(|| {
                    let atomic = Arc::new(crossbeam_epoch::Atomic::new(0u64));
                    let counter = Arc::new(AtomicUsize::new(0));

                    let handles: Vec<_> = (0..num_threads)
                        .map(|_| {
                            let a = atomic.clone();
                            let c = counter.clone();
                            thread::spawn(move || {
                                for _ in 0..1000 {
                                    let guard = crossbeam_epoch::pin();
                                    let _val = a.load(Ordering::Acquire, &guard);
                                    c.fetch_add(1, Ordering::Relaxed);
                                }
                            })
                        })
                        .collect();

                    for handle in handles {
                        let _ = handle.join();
                    }
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_single_thread_read,
    bench_single_thread_value_read,
    bench_concurrent_reads
);
criterion_main!(benches);
