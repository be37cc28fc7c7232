//! Property tests: random reserve/release sequences must preserve the
//! allocator's structural invariants after every single operation.
//!
//! - no two live regions overlap, and no live region overlaps a free block
//! - the registry is strictly ascending in address
//! - live + free bytes never exceed the reserved span (abandoned
//!   sub-header remainders are the only slack)
//! - the high-water mark never decreases

use core::ptr::NonNull;

use proptest::prelude::*;

use linmem::PageReserve;
use linmem::host::EmulatedMemory;
use linmem::HostMemory;

#[derive(Clone, Debug)]
enum Op {
    Reserve { size: usize },
    ReserveHint { offset: usize, size: usize },
    Release { pick: usize },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (1usize..512).prop_map(|words| Op::Reserve { size: words * 8 }),
        ((0usize..4096), (1usize..512)).prop_map(|(off, words)| Op::ReserveHint {
            offset: off * 8,
            size: words * 8,
        }),
        any::<usize>().prop_map(|pick| Op::Release { pick }),
    ]
}

fn nn(addr: usize) -> NonNull<u8> {
    NonNull::new(addr as *mut u8).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn invariants_hold_under_random_operations(
        ops in proptest::collection::vec(op_strategy(), 1..80)
    ) {
        let host = EmulatedMemory::with_limit(0, 64);
        let start = host.base() + 1024;
        let pr = unsafe { PageReserve::new(host, start) };

        let mut live: Vec<(usize, usize)> = Vec::new();
        let mut prev_mark = 0usize;

        for op in ops {
            match op {
                Op::Reserve { size } => {
                    if let Ok(a) = unsafe { pr.reserve(None, size) } {
                        live.push((a.as_ptr() as usize, size));
                    }
                }
                Op::ReserveHint { offset, size } => {
                    let hint = nn(start + offset);
                    if let Ok(a) = unsafe { pr.reserve(Some(hint), size) } {
                        live.push((a.as_ptr() as usize, size));
                    }
                }
                Op::Release { pick } => {
                    if !live.is_empty() {
                        let (addr, size) = live.swap_remove(pick % live.len());
                        unsafe { pr.release(nn(addr), size) }.unwrap();
                    }
                }
            }

            let mark = pr.high_water_mark();
            prop_assert!(mark >= prev_mark, "high-water mark decreased");
            prev_mark = mark;

            let mut blocks: Vec<(usize, usize)> = Vec::new();
            pr.for_each_free_block(|addr, size| blocks.push((addr, size)));

            for pair in blocks.windows(2) {
                prop_assert!(
                    pair[0].0 + pair[0].1 <= pair[1].0,
                    "registry unordered or overlapping: {pair:?}"
                );
            }
            for &(addr, size) in &blocks {
                prop_assert!(addr >= start && addr + size <= mark);
                for &(laddr, lsize) in &live {
                    prop_assert!(
                        addr + size <= laddr || laddr + lsize <= addr,
                        "free block [{addr:#x}, +{size}) overlaps live [{laddr:#x}, +{lsize})"
                    );
                }
            }

            for (i, &(laddr, lsize)) in live.iter().enumerate() {
                prop_assert!(laddr >= start && laddr + lsize <= mark);
                for &(raddr, rsize) in &live[i + 1..] {
                    prop_assert!(
                        laddr + lsize <= raddr || raddr + rsize <= laddr,
                        "live regions overlap"
                    );
                }
            }

            let live_bytes: usize = live.iter().map(|&(_, size)| size).sum();
            let free_bytes: usize = blocks.iter().map(|&(_, size)| size).sum();
            prop_assert!(live_bytes + free_bytes <= mark - start, "bytes not conserved");
        }
    }
}
