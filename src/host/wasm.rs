//! Real wasm32 linear memory, via the `memory.size`/`memory.grow`
//! instructions on memory index 0.

use super::HostMemory;
use core::arch::wasm32::{memory_grow, memory_size};

// The wasm grow granularity is fixed; a different page_size in linmem.toml
// would desynchronize page accounting from the instruction semantics.
const _: () = assert!(
    crate::config::PAGE_SIZE == 65536,
    "wasm32 requires page_size = 65536"
);

/// The module's single linear memory. Addresses are linear-memory offsets,
/// so `base` is 0.
pub struct WasmMemory;

impl HostMemory for WasmMemory {
    #[inline]
    fn page_count(&self) -> usize {
        memory_size::<0>()
    }

    #[inline]
    fn grow(&self, additional_pages: usize) -> Option<usize> {
        // memory.grow returns the previous size in pages, or -1 on failure.
        let prev = memory_grow::<0>(additional_pages);
        if prev == usize::MAX { None } else { Some(prev) }
    }

    #[inline]
    fn base(&self) -> usize {
        0
    }
}
