//! Reservation benchmarks over the emulated host memory.
//!
//! Each benchmark runs in steady state: every iteration releases what it
//! reserves, so the managed region stops growing after warmup and the
//! numbers measure list search, split, and insert rather than host growth.

use core::ptr::NonNull;
use std::hint::black_box;

use criterion::{Criterion, Throughput, criterion_group, criterion_main};

use linmem::PageReserve;
use linmem::host::EmulatedMemory;

fn make_reserve(limit_pages: usize) -> PageReserve<EmulatedMemory> {
    let host = EmulatedMemory::with_limit(0, limit_pages);
    let start = host.base() + 4096;
    unsafe { PageReserve::new(host, start) }
}

fn bench_reserve_release_cycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("reserve_release_cycle");
    for &size in &[4096usize, 65536] {
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_function(format!("{size}"), |b| {
            let pr = make_reserve(256);
            b.iter(|| {
                let addr = unsafe { pr.reserve(None, black_box(size)) }.unwrap();
                unsafe { pr.release(addr, size) }.unwrap();
                black_box(addr)
            });
        });
    }
    group.finish();
}

fn bench_exact_hint_reuse(c: &mut Criterion) {
    c.bench_function("exact_hint_reuse", |b| {
        let pr = make_reserve(256);
        let hole = unsafe { pr.reserve(None, 8192) }.unwrap();
        let _plug = unsafe { pr.reserve(None, 4096) }.unwrap();
        unsafe { pr.release(hole, 8192) }.unwrap();

        b.iter(|| {
            let addr = unsafe { pr.reserve(Some(black_box(hole)), 8192) }.unwrap();
            unsafe { pr.release(addr, 8192) }.unwrap();
            black_box(addr)
        });
    });
}

fn bench_first_fit_fragmented(c: &mut Criterion) {
    let mut group = c.benchmark_group("first_fit_fragmented");
    for &blocks in &[16usize, 64, 256] {
        group.bench_function(format!("{blocks}_blocks"), |b| {
            let pr = make_reserve(1024);

            // Checkerboard the front of the region with small free blocks
            // the bench request can never use, forcing a full walk.
            let small: Vec<NonNull<u8>> = (0..blocks * 2)
                .map(|_| unsafe { pr.reserve(None, 256) }.unwrap())
                .collect();
            for pair in small.chunks(2) {
                unsafe { pr.release(pair[0], 256) }.unwrap();
            }

            b.iter(|| {
                let addr = unsafe { pr.reserve(None, black_box(16384)) }.unwrap();
                unsafe { pr.release(addr, 16384) }.unwrap();
                black_box(addr)
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_reserve_release_cycle,
    bench_exact_hint_reuse,
    bench_first_fit_fragmented
);
criterion_main!(benches);
