//! Benchmarks for uncontended lock/unlock cost and multi-reader throughput.
//!
//! Run with: cargo bench -p xeno-du-lock

use std::sync::Arc;
use std::thread;

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use xeno_du_lock::DuLock;

fn bench_uncontended_read(c: &mut Criterion) {
	let lock = DuLock::new();
	c.bench_function("uncontended_read_acquire_release", |b| {
		b.iter(|| {
			let guard = lock.read_lock(None).unwrap();
			black_box(&guard);
		});
	});
}

fn bench_uncontended_write(c: &mut Criterion) {
	let lock = DuLock::new();
	c.bench_function("uncontended_write_acquire_release", |b| {
		b.iter(|| {
			let guard = lock.write_lock(None).unwrap();
			black_box(&guard);
		});
	});
}

fn bench_reentrant_read(c: &mut Criterion) {
	let lock = DuLock::new();
	c.bench_function("reentrant_read_depth_4", |b| {
		b.iter(|| {
			let g1 = lock.read_lock(None).unwrap();
			let g2 = lock.read_lock(None).unwrap();
			let g3 = lock.read_lock(None).unwrap();
			let g4 = lock.read_lock(None).unwrap();
			black_box((&g1, &g2, &g3, &g4));
		});
	});
}

fn bench_concurrent_readers(c: &mut Criterion) {
	let mut group = c.benchmark_group("concurrent_readers");
	for readers in [2, 4, 8] {
		group.bench_with_input(BenchmarkId::new("threads", readers), &readers, |b, &readers| {
			b.iter(|| {
				let lock = Arc::new(DuLock::new());
				let handles: Vec<_> = (0..readers)
					.map(|_| {
						let lock = Arc::clone(&lock);
						thread::spawn(move || {
							for _ in 0..100 {
								let guard = lock.read_lock(None).unwrap();
								black_box(&guard);
							}
						})
					})
					.collect();
				for handle in handles {
					handle.join().unwrap();
				}
			});
		});
	}
	group.finish();
}

criterion_group!(benches, bench_uncontended_read, bench_uncontended_write, bench_reentrant_read, bench_concurrent_readers);
criterion_main!(benches);
