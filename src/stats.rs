//! Memory-usage accounting and reservation statistics.
//!
//! All counters use `Relaxed` ordering — they are observational only and not
//! used as synchronization primitives. The allocator's spinlock provides the
//! ordering guarantees for correctness.
//!
//! [`MemStat`] is the statistics collaborator owned by the runtime above
//! this crate: `map`/`unmap` notifications increment and decrement it. It is
//! always compiled in, being part of the allocator's outbound contract.
//!
//! The remaining counters are internal instrumentation, compiled in only
//! with the `stats` feature and read through [`snapshot()`].

use core::sync::atomic::{AtomicU64, Ordering};

/// A memory-usage counter owned by the runtime and passed into the
/// allocator's map/unmap hooks.
///
/// The runtime typically keeps one per memory category (heap, stacks, GC
/// metadata) and sums them for its memory reports.
#[derive(Debug, Default)]
pub struct MemStat {
    bytes: AtomicU64,
}

impl MemStat {
    pub const fn new() -> Self {
        Self {
            bytes: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn increment(&self, amount: usize) {
        self.bytes.fetch_add(amount as u64, Ordering::Relaxed);
    }

    #[inline]
    pub fn decrement(&self, amount: usize) {
        self.bytes.fetch_sub(amount as u64, Ordering::Relaxed);
    }

    /// Bytes currently accounted to this counter.
    #[inline]
    pub fn bytes(&self) -> u64 {
        self.bytes.load(Ordering::Relaxed)
    }
}

pub(crate) struct Stats {
    /// Total calls to reserve.
    pub reserve_calls: AtomicU64,
    /// Total calls to release.
    pub release_calls: AtomicU64,
    /// Reservations placed at the requested hint address.
    pub exact_fits: AtomicU64,
    /// Reservations served by first-fit from the free list.
    pub first_fits: AtomicU64,
    /// Reservations served by bump allocation at the high-water mark.
    pub bump_reserves: AtomicU64,
    /// Grow requests issued to the host.
    pub grow_calls: AtomicU64,
    /// Pages requested from the host across all grow calls.
    pub grown_pages: AtomicU64,
    /// Grow requests the host refused.
    pub growth_refusals: AtomicU64,
    /// Free blocks split during reservation.
    pub splits: AtomicU64,
    /// Bytes given up to split remainders too small to hold a free-list
    /// header.
    pub absorbed_bytes: AtomicU64,
    /// Released regions too small to track, abandoned instead.
    pub abandoned_releases: AtomicU64,
}

impl Stats {
    const fn new() -> Self {
        Self {
            reserve_calls: AtomicU64::new(0),
            release_calls: AtomicU64::new(0),
            exact_fits: AtomicU64::new(0),
            first_fits: AtomicU64::new(0),
            bump_reserves: AtomicU64::new(0),
            grow_calls: AtomicU64::new(0),
            grown_pages: AtomicU64::new(0),
            growth_refusals: AtomicU64::new(0),
            splits: AtomicU64::new(0),
            absorbed_bytes: AtomicU64::new(0),
            abandoned_releases: AtomicU64::new(0),
        }
    }
}

pub(crate) static STATS: Stats = Stats::new();

/// A point-in-time snapshot of the reservation statistics.
///
/// Individual fields are each atomically read, but the snapshot as a whole
/// is not globally consistent — concurrent reservations may race between
/// loads. For monitoring purposes this is always sufficient.
#[derive(Clone, Copy, Debug, Default)]
pub struct Snapshot {
    pub reserve_calls: u64,
    pub release_calls: u64,
    pub exact_fits: u64,
    pub first_fits: u64,
    pub bump_reserves: u64,
    pub grow_calls: u64,
    pub grown_pages: u64,
    pub growth_refusals: u64,
    pub splits: u64,
    pub absorbed_bytes: u64,
    pub abandoned_releases: u64,
}

/// Load all counters with `Relaxed` ordering and return a [`Snapshot`].
///
/// Without the `stats` feature every field is zero.
pub fn snapshot() -> Snapshot {
    let s = &STATS;
    Snapshot {
        reserve_calls: s.reserve_calls.load(Ordering::Relaxed),
        release_calls: s.release_calls.load(Ordering::Relaxed),
        exact_fits: s.exact_fits.load(Ordering::Relaxed),
        first_fits: s.first_fits.load(Ordering::Relaxed),
        bump_reserves: s.bump_reserves.load(Ordering::Relaxed),
        grow_calls: s.grow_calls.load(Ordering::Relaxed),
        grown_pages: s.grown_pages.load(Ordering::Relaxed),
        growth_refusals: s.growth_refusals.load(Ordering::Relaxed),
        splits: s.splits.load(Ordering::Relaxed),
        absorbed_bytes: s.absorbed_bytes.load(Ordering::Relaxed),
        abandoned_releases: s.abandoned_releases.load(Ordering::Relaxed),
    }
}
