//! Host backing-store interface.
//!
//! The VM exposes exactly two primitives over its linear memory: the current
//! size in pages and "grow by N pages". There is no unmap and no protection;
//! the store never shrinks. On wasm32 the real linear memory is used; on
//! every other target an emulated grow-only memory backed by `std::alloc`
//! stands in, so the unsafe internals run under plain `cargo test` and Miri.

/// The grow-only linear memory this allocator reserves from.
///
/// Implementations must be cheap and non-blocking apart from the host's own
/// grow latency; [`PageReserve`](crate::PageReserve) calls them while holding
/// its lock.
pub trait HostMemory {
    /// Number of pages currently reserved from the host.
    fn page_count(&self) -> usize;

    /// Request `additional_pages` more pages. Returns the page count from
    /// before the grow on success, or `None` if the host refuses (memory
    /// limit reached).
    fn grow(&self, additional_pages: usize) -> Option<usize>;

    /// Address of linear-memory offset zero: 0 on wasm32, the backing
    /// buffer's address in an emulated memory. Page arithmetic is relative
    /// to this base.
    fn base(&self) -> usize;
}

cfg_if::cfg_if! {
    if #[cfg(target_arch = "wasm32")] {
        mod wasm;
        pub use wasm::WasmMemory;
    } else {
        mod emulated;
        pub use emulated::EmulatedMemory;
    }
}
