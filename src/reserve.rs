//! Region allocator: reserve/release over the grow-only backing store.
//!
//! `PageReserve` owns the free-block registry and the high-water mark, both
//! behind a single spinlock. Reservation tries the registry first (exact
//! address if hinted, then first fit), and falls back to bump allocation at
//! the high-water mark, growing the host memory to cover it.
//!
//! Every byte of the managed region is at any moment either live (owned by
//! a caller) or free (owned by the registry), never both. Abandoned
//! sub-header remainders are the one exception: unreachable until the
//! neighboring region is released, and not tracked.
//!
//! No code path here allocates, suspends, or calls back into any allocator:
//! this sits beneath the allocator the rest of the runtime uses, and may
//! run before any higher-level subsystem is initialized. The lock is
//! acquired exactly once per public call and released only by guard drop,
//! on every exit path.

use core::ptr::NonNull;

use crate::config::PAGE_SIZE;
use crate::error::ReserveError;
use crate::free_list::{FreeList, WORD};
use crate::host::HostMemory;
use crate::stats::MemStat;
use crate::sync::SpinMutex;
use crate::{stat_add, stat_inc};

#[cfg(feature = "debug")]
use std::println;

/// The page-reservation allocator for one managed region.
///
/// Constructed once at runtime startup and passed by reference to all
/// callers. The managed region runs from `region_start` (the end of the
/// statically-reserved image data) to the current high-water mark, and only
/// ever grows.
pub struct PageReserve<H: HostMemory> {
    host: H,
    inner: SpinMutex<Inner>,
}

struct Inner {
    /// First address this allocator administers. Never changes.
    region_start: usize,
    /// One past the last byte ever reserved from the host. 0 until the
    /// first reservation binds it.
    reserve_end: usize,
    free: FreeList,
}

impl<H: HostMemory> PageReserve<H> {
    /// Create the allocator for the region starting at `region_start`.
    ///
    /// # Safety
    ///
    /// `region_start` must be nonzero, word-aligned, at or above
    /// `host.base()`, and the start of address space that nothing else will
    /// ever touch: this allocator takes permanent ownership of everything
    /// from `region_start` up to wherever the host can grow.
    pub const unsafe fn new(host: H, region_start: usize) -> Self {
        Self {
            host,
            inner: SpinMutex::new(Inner {
                region_start,
                reserve_end: 0,
                free: FreeList::new(),
            }),
        }
    }

    /// Reserve a region of at least `size` bytes, preferring `hint` if a
    /// free block covers it.
    ///
    /// `size` is rounded up to the natural word size; no alignment beyond
    /// that is provided. A hint nobody can satisfy is not an error:
    /// placement falls through to first-fit and then to bump allocation at
    /// the high-water mark. Fails only if the host refuses to grow.
    ///
    /// # Safety
    ///
    /// The returned region is exclusively the caller's until passed back to
    /// [`release`](Self::release); the caller must not touch memory outside
    /// it. `size == 0` is a precondition violation.
    pub unsafe fn reserve(
        &self,
        hint: Option<NonNull<u8>>,
        size: usize,
    ) -> Result<NonNull<u8>, ReserveError> {
        assert!(size > 0, "zero-size reservation");
        let size = size.next_multiple_of(WORD);
        stat_inc!(reserve_calls);

        let mut inner = self.inner.lock();
        self.bind_mark(&mut inner)?;

        if let Some(v) = hint {
            let v = v.as_ptr() as usize;
            if unsafe { inner.free.take_at(v, size) } {
                stat_inc!(exact_fits);
                #[cfg(feature = "debug")]
                println!("[reserve] exact fit at {v:#x} ({size} bytes)");
                return Ok(unsafe { NonNull::new_unchecked(v as *mut u8) });
            }
        }

        if let Some(addr) = unsafe { inner.free.take_first_fit(size) } {
            stat_inc!(first_fits);
            #[cfg(feature = "debug")]
            println!("[reserve] first fit at {addr:#x} ({size} bytes)");
            return Ok(unsafe { NonNull::new_unchecked(addr as *mut u8) });
        }

        // Bump at the high-water mark. Grow first, advance after: a refused
        // grow must leave the mark where it was.
        let addr = inner.reserve_end;
        let new_end = addr.saturating_add(size);
        self.ensure_capacity(new_end)?;
        inner.reserve_end = new_end;
        stat_inc!(bump_reserves);
        #[cfg(feature = "debug")]
        println!("[reserve] bump at {addr:#x} ({size} bytes), mark {new_end:#x}");
        Ok(unsafe { NonNull::new_unchecked(addr as *mut u8) })
    }

    /// Return a region to the registry.
    ///
    /// `size` is rounded up to the natural word size, matching the rounding
    /// applied on reservation. Regions too small to hold a free-block
    /// header are abandoned rather than linked; that is not an error.
    /// Calling before any reservation is reported as
    /// [`ReserveError::ReleaseBeforeReserve`] and leaves the registry and
    /// mark untouched.
    ///
    /// # Safety
    ///
    /// `addr` and `size` must exactly match a prior [`reserve`](Self::reserve)
    /// that has not already been released. No runtime check enforces this;
    /// the allocator trusts its caller.
    pub unsafe fn release(&self, addr: NonNull<u8>, size: usize) -> Result<(), ReserveError> {
        stat_inc!(release_calls);
        let size = size.next_multiple_of(WORD);

        let mut inner = self.inner.lock();
        if inner.reserve_end == 0 {
            return Err(ReserveError::ReleaseBeforeReserve);
        }
        #[cfg(feature = "debug")]
        println!("[release] {:#x} ({size} bytes)", addr.as_ptr() as usize);
        let _ = unsafe { inner.free.insert(addr.as_ptr() as usize, size) };
        Ok(())
    }

    /// Reserve anywhere and account the bytes to `stat`.
    ///
    /// # Safety
    ///
    /// As [`reserve`](Self::reserve).
    pub unsafe fn alloc(&self, size: usize, stat: &MemStat) -> Result<NonNull<u8>, ReserveError> {
        let addr = unsafe { self.reserve(None, size) }?;
        self.map(addr, size, stat);
        Ok(addr)
    }

    /// Un-account the bytes from `stat` and return the region to the
    /// registry.
    ///
    /// # Safety
    ///
    /// As [`release`](Self::release).
    pub unsafe fn free(
        &self,
        addr: NonNull<u8>,
        size: usize,
        stat: &MemStat,
    ) -> Result<(), ReserveError> {
        self.unmap(addr, size, stat);
        unsafe { self.release(addr, size) }
    }

    /// Notify that a reserved region is now in use: accounts `size` bytes
    /// to `stat`. Carries no allocation semantics.
    #[inline]
    pub fn map(&self, _addr: NonNull<u8>, size: usize, stat: &MemStat) {
        stat.increment(size);
    }

    /// Notify that a region is going out of use: removes `size` bytes from
    /// `stat`. Carries no allocation semantics.
    #[inline]
    pub fn unmap(&self, _addr: NonNull<u8>, size: usize, stat: &MemStat) {
        stat.decrement(size);
    }

    /// Residency hint; a no-op on this backing store. The hook exists so
    /// the layer above can call it unconditionally.
    #[inline]
    pub fn mark_used(&self, _addr: NonNull<u8>, _size: usize) {}

    /// Residency hint; a no-op on this backing store.
    #[inline]
    pub fn mark_unused(&self, _addr: NonNull<u8>, _size: usize) {}

    /// Page protection is unavailable on this backing store; a no-op.
    #[inline]
    pub fn protect_none(&self, _addr: NonNull<u8>, _size: usize) {}

    /// First use: bind the mark to the region start and grow the store to
    /// cover it, rolling the mark back if that first grow is refused so a
    /// later call retries initialization from scratch.
    fn bind_mark(&self, inner: &mut Inner) -> Result<(), ReserveError> {
        if inner.reserve_end != 0 {
            return Ok(());
        }
        inner.reserve_end = inner.region_start;
        if let Err(e) = self.ensure_capacity(inner.reserve_end) {
            inner.reserve_end = 0;
            return Err(e);
        }
        Ok(())
    }

    /// Grow the backing store until whole pages cover `target_end`.
    fn ensure_capacity(&self, target_end: usize) -> Result<(), ReserveError> {
        let needed = (target_end - self.host.base()).div_ceil(PAGE_SIZE);
        let current = self.host.page_count();
        if current >= needed {
            return Ok(());
        }
        let deficit = needed - current;
        stat_inc!(grow_calls);
        stat_add!(grown_pages, deficit);
        #[cfg(feature = "debug")]
        println!("[grow] {deficit} pages ({current} -> {needed})");
        if self.host.grow(deficit).is_none() {
            stat_inc!(growth_refusals);
            #[cfg(feature = "debug")]
            println!("[grow] refused");
            return Err(ReserveError::GrowthRefused {
                current_pages: current,
                needed_pages: needed,
            });
        }
        Ok(())
    }

    // ---- Diagnostics ----

    /// The fixed start of the managed region.
    pub fn region_start(&self) -> usize {
        self.inner.lock().region_start
    }

    /// The high-water mark: one past the last byte ever reserved from the
    /// host, or 0 before the first reservation.
    pub fn high_water_mark(&self) -> usize {
        self.inner.lock().reserve_end
    }

    /// Total bytes currently sitting in the free-block registry.
    pub fn free_bytes(&self) -> usize {
        let inner = self.inner.lock();
        unsafe { inner.free.iter() }.map(|(_, size)| size).sum()
    }

    /// Number of blocks in the free-block registry.
    pub fn free_block_count(&self) -> usize {
        let inner = self.inner.lock();
        unsafe { inner.free.iter() }.count()
    }

    /// Visit every free block as `(address, size)`, in ascending address
    /// order. `f` runs with the allocator lock held and must not call back
    /// into this allocator.
    pub fn for_each_free_block(&self, mut f: impl FnMut(usize, usize)) {
        let inner = self.inner.lock();
        for (addr, size) in unsafe { inner.free.iter() } {
            f(addr, size);
        }
    }

    /// The host backing store.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Print the registry and mark, matching the tracing on the reserve
    /// path.
    #[cfg(feature = "debug")]
    pub fn dump_free_list(&self) {
        let inner = self.inner.lock();
        let mut wasted = 0;
        for (addr, size) in unsafe { inner.free.iter() } {
            println!(" + {addr:#x}\tsize {size}");
            wasted += size;
        }
        println!("end {:#x}", inner.reserve_end);
        println!("free {wasted}");
    }
}
