//! Exclusion: set subtraction over CIDR blocks
//!
//! Subtracting a block from a network set either keeps, drops, or
//! bisects each member. Bisection peels off the half not containing
//! the excluded range at every prefix step, so excluding a `/p` range
//! from a containing `/q` block yields exactly `p - q` fragments whose
//! union together with the excluded range reconstitutes the original
//! block.
//!
//! Set difference is order-independent across distinct exclusions;
//! [`subtract_all`] relies on that to process exclusions sorted.

use crate::policy::{Block, PolicyError};
use tracing::debug;

/// Subtract one block from every member of a set.
///
/// The result is the concatenation of the per-member complements, in no
/// particular order; callers canonicalize afterwards.
pub fn subtract(exclude: Block, set: &[Block]) -> Vec<Block> {
    let mut out = Vec::with_capacity(set.len() + 32);
    for &n in set {
        if !exclude.overlaps(n) {
            out.push(n);
            continue;
        }
        if exclude.contains(n) {
            continue;
        }
        // The exclusion is strictly inside n. Bisect iteratively: at
        // each prefix step keep the half that misses the exclusion and
        // descend into the other. Depth is bounded by 32.
        let mut cur = n;
        for depth in (n.prefix() + 1)..=exclude.prefix() {
            let bit = 1u32 << (32 - depth);
            let low = Block::new_unchecked(cur.first(), depth);
            let high = Block::new_unchecked(cur.first() | bit, depth);
            if high.contains(exclude) {
                out.push(low);
                cur = high;
            } else {
                out.push(high);
                cur = low;
            }
        }
    }
    out
}

/// Subtract a list of exclusions from the full address space.
///
/// The working set starts at `0.0.0.0/0` and stays sorted and disjoint
/// throughout, so each exclusion only touches a contiguous run of
/// blocks found by binary search. Exclusions are processed in sorted
/// order; the result is the same for any input order.
///
/// Fails with [`PolicyError::ResourceExhausted`] if the intermediate
/// block count ever exceeds `cap`, which guards against pathological
/// input lists.
pub fn subtract_all(exclusions: &[Block], cap: usize) -> Result<Vec<Block>, PolicyError> {
    let mut sorted = exclusions.to_vec();
    sorted.sort_unstable();

    let mut working = vec![Block::FULL];
    for (i, &e) in sorted.iter().enumerate() {
        // Blocks are disjoint and sorted, so both first() and last()
        // are monotonic and the affected run is contiguous.
        let lo = working.partition_point(|b| b.last() < e.first());
        let hi = lo + working[lo..].partition_point(|b| b.first() <= e.last());
        if lo == hi {
            continue;
        }
        let mut fragments = subtract(e, &working[lo..hi]);
        fragments.sort_unstable();
        working.splice(lo..hi, fragments);

        if working.len() > cap {
            return Err(PolicyError::ResourceExhausted {
                count: working.len(),
                cap,
            });
        }
        if (i + 1) % 500 == 0 {
            debug!(
                "Processed {}/{} exclusions, {} blocks remaining",
                i + 1,
                sorted.len(),
                working.len()
            );
        }
    }
    Ok(working)
}
