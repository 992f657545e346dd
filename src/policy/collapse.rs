//! Canonicalization: minimal CIDR decomposition
//!
//! Reduces an arbitrary block collection (possibly overlapping or
//! adjacent) to the unique minimal set of disjoint, maximally-sized
//! CIDR blocks covering the same addresses. Two phases:
//!
//! 1. Range-merge: sort by start address and fold overlapping or
//!    contiguous integer ranges into maximal covered intervals.
//! 2. Re-decomposition: greedily carve each interval into the largest
//!    aligned power-of-two blocks that fit. Choosing the maximal
//!    aligned size at every step is what makes the result minimal;
//!    any smaller choice can only increase the block count.
//!
//! Merging equal-length siblings alone is not enough once mixed prefix
//! lengths and overlaps are present, hence the interval detour.

use crate::policy::Block;

/// Collapse a raw set into canonical form.
///
/// The output is sorted ascending by base address, pairwise disjoint,
/// with no two blocks adjacent-and-mergeable. Idempotent.
pub fn collapse(set: &[Block]) -> Vec<Block> {
    if set.is_empty() {
        return Vec::new();
    }

    let mut ranges: Vec<(u32, u32)> = set.iter().map(|b| (b.first(), b.last())).collect();
    ranges.sort_unstable();

    let mut out = Vec::with_capacity(set.len());
    let (mut start, mut end) = ranges[0];
    for &(s, e) in &ranges[1..] {
        // saturating_add keeps the end-of-space interval absorbing
        if s <= end.saturating_add(1) {
            if e > end {
                end = e;
            }
        } else {
            decompose(start, end, &mut out);
            start = s;
            end = e;
        }
    }
    decompose(start, end, &mut out);
    out
}

/// Emit the minimal CIDR cover of the inclusive range `[start, end]`.
///
/// At each position take the largest block size that is both aligned
/// there and still fits in the remaining range.
fn decompose(start: u32, end: u32, out: &mut Vec<Block>) {
    let mut p = start;
    loop {
        let align = if p == 0 { 32 } else { p.trailing_zeros() };
        let remaining = (end - p) as u64 + 1;
        let fit = 63 - remaining.leading_zeros();
        let k = align.min(fit);
        out.push(Block::new_unchecked(p, (32 - k) as u8));
        let size = 1u64 << k;
        if p as u64 + size > end as u64 {
            break;
        }
        p += size as u32;
    }
}
