//! Emulated grow-only linear memory for non-wasm targets.
//!
//! Tests and host-side tooling can't execute `memory.grow`, so we reserve
//! one page-aligned region from `std::alloc` up front and emulate growth by
//! advancing an atomic page counter inside it. This keeps the allocator's
//! raw pointer logic exercisable under `cargo test` and Miri. A configurable
//! page limit stands in for the VM's memory limit so refusal paths can be
//! driven deterministically.

extern crate alloc;

use super::HostMemory;
use crate::config::{EMULATED_PAGES, PAGE_SIZE};
use core::alloc::Layout;
use core::sync::atomic::{AtomicUsize, Ordering};

/// A grow-only linear memory backed by a single heap region.
///
/// Each instance owns an isolated address range, so tests can run in
/// parallel without sharing a backing store.
pub struct EmulatedMemory {
    base: *mut u8,
    pages: AtomicUsize,
    limit: usize,
}

// SAFETY: the backing region is owned exclusively by this instance for its
// whole lifetime, and the page counter is atomic. Callers hand out interior
// addresses under their own synchronization (the PageReserve lock).
unsafe impl Send for EmulatedMemory {}
unsafe impl Sync for EmulatedMemory {}

impl EmulatedMemory {
    /// An emulated memory with `initial_pages` already grown and the default
    /// `EMULATED_PAGES` capacity.
    pub fn new(initial_pages: usize) -> Self {
        Self::with_limit(initial_pages, EMULATED_PAGES)
    }

    /// An emulated memory that refuses to grow past `limit` pages.
    pub fn with_limit(initial_pages: usize, limit: usize) -> Self {
        assert!(limit > 0, "emulated memory needs at least one page");
        assert!(
            initial_pages <= limit,
            "initial_pages ({initial_pages}) exceeds limit ({limit})"
        );
        let layout = layout_for(limit);
        let base = unsafe { alloc::alloc::alloc_zeroed(layout) };
        if base.is_null() {
            alloc::alloc::handle_alloc_error(layout);
        }
        Self {
            base,
            pages: AtomicUsize::new(initial_pages),
            limit,
        }
    }
}

impl HostMemory for EmulatedMemory {
    fn page_count(&self) -> usize {
        self.pages.load(Ordering::Relaxed)
    }

    fn grow(&self, additional_pages: usize) -> Option<usize> {
        self.pages
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |cur| {
                let grown = cur.checked_add(additional_pages)?;
                (grown <= self.limit).then_some(grown)
            })
            .ok()
    }

    fn base(&self) -> usize {
        self.base as usize
    }
}

impl Drop for EmulatedMemory {
    fn drop(&mut self) {
        unsafe { alloc::alloc::dealloc(self.base, layout_for(self.limit)) };
    }
}

fn layout_for(limit: usize) -> Layout {
    Layout::from_size_align(limit * PAGE_SIZE, PAGE_SIZE)
        .expect("emulated memory layout overflows")
}
