#![no_std]

//! linmem: a page-reservation allocator for grow-only linear memory.
//!
//! Sits beneath a managed-memory runtime whose sandboxed VM exposes only two
//! primitives over its linear address space: "current size in pages" and
//! "grow by N pages". No unmap, no page protection, no sparse mapping.
//! linmem synthesizes the reserve/release contract a page-level allocator
//! expects on top of that backing store:
//!
//! - Free-block registry: released regions form an address-ordered free list
//!   whose node headers live inside the freed memory itself
//! - Region allocator: exact-address and first-fit reuse, falling back to
//!   bump allocation at the high-water mark
//! - Growth controller: grows the host memory lazily, in whole pages
//!
//! All state sits behind one spinlock; no code path here allocates or calls
//! back into any allocator (linmem underlies the allocator the rest of the
//! runtime depends on).
//!
//! # Usage
//!
//! ```ignore
//! static RESERVE: linmem::PageReserve<linmem::host::WasmMemory> =
//!     unsafe { linmem::PageReserve::new(linmem::host::WasmMemory, IMAGE_END) };
//! ```

#[cfg(any(test, feature = "std"))]
extern crate std;

pub mod config;
pub mod error;
pub mod free_list;
pub mod host;
mod macros;
pub mod reserve;
pub mod stats;
pub mod sync;

pub use config::{PAGE_SHIFT, PAGE_SIZE};
pub use error::ReserveError;
pub use host::HostMemory;
pub use reserve::PageReserve;
pub use stats::MemStat;
