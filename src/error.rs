//! Reservation error types.

use core::fmt;

use crate::config::PAGE_SIZE;

/// Errors surfaced by [`PageReserve`](crate::PageReserve) operations.
///
/// Every failure is returned synchronously to the immediate caller; this
/// crate never retries and never treats a refused grow as fatal. The layer
/// above decides what an allocation failure means.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReserveError {
    /// The host declined to grow the backing store, typically because its
    /// memory limit was reached.
    GrowthRefused {
        /// Pages the host reported before the failing grow request.
        current_pages: usize,
        /// Pages required to cover the requested high-water mark.
        needed_pages: usize,
    },
    /// `release` was called before any reservation had initialized the
    /// managed region. The caller handed back memory this allocator never
    /// owned; writing a free-list header there would corrupt the address
    /// space, so the call is rejected instead.
    ReleaseBeforeReserve,
}

impl fmt::Display for ReserveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GrowthRefused {
                current_pages,
                needed_pages,
            } => {
                write!(
                    f,
                    "host refused to grow backing store: have {} pages, need {} ({} bytes/page)",
                    current_pages, needed_pages, PAGE_SIZE
                )
            }
            Self::ReleaseBeforeReserve => {
                write!(f, "release called before any reservation")
            }
        }
    }
}

impl core::error::Error for ReserveError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_mentions_page_counts() {
        let err = ReserveError::GrowthRefused {
            current_pages: 16,
            needed_pages: 32,
        };
        let text = std::format!("{err}");
        assert!(text.contains("16"));
        assert!(text.contains("32"));
    }
}
