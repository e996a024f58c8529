//! Basic benchmarks for the `managed_ptr` package.

#![allow(
    missing_docs,
    reason = "No need for API documentation in benchmark code"
)]

use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use managed_ptr::{SharedPtr, UniquePtr};

criterion_group!(benches, entrypoint);
criterion_main!(benches);

type TestItem = usize;
const TEST_VALUE: TestItem = 1024;

fn entrypoint(c: &mut Criterion) {
    let mut unique_group = c.benchmark_group("unique");

    unique_group.bench_function("new_drop", |b| {
        b.iter(|| {
            drop(black_box(UniquePtr::new(TEST_VALUE)));
        });
    });

    unique_group.bench_function("deref", |b| {
        let handle = UniquePtr::new(TEST_VALUE);
        b.iter(|| black_box(*handle));
    });

    unique_group.bench_function("release_rewrap", |b| {
        b.iter(|| {
            let mut handle = UniquePtr::new(TEST_VALUE);
            let raw = handle.release().expect("freshly created handle is non-empty");

            // SAFETY: `raw` came out of `release()` on a default-policy handle and
            // currently has no owner.
            unsafe { UniquePtr::<TestItem>::from_raw(raw) }
        });
    });

    unique_group.finish();

    let mut shared_group = c.benchmark_group("shared");

    shared_group.bench_function("new_drop", |b| {
        b.iter(|| {
            drop(black_box(SharedPtr::new(TEST_VALUE)));
        });
    });

    shared_group.bench_function("clone_drop", |b| {
        let handle = SharedPtr::new(TEST_VALUE);
        b.iter(|| {
            drop(black_box(handle.clone()));
        });
    });

    shared_group.bench_function("use_count", |b| {
        let handle = SharedPtr::new(TEST_VALUE);
        b.iter(|| black_box(handle.use_count()));
    });

    shared_group.bench_function("into_shared", |b| {
        b.iter(|| UniquePtr::new(TEST_VALUE).into_shared());
    });

    shared_group.finish();
}
