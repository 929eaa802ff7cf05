//! Region Merger
//!
//! Greedy pairwise join over the invalidation queue. Two touching areas are
//! replaced by their bounding box only when that box is strictly smaller
//! than the two areas drawn one after the other.
//!
//! This is a single pass: every pending entry is tried once as the target
//! and scans every other pending entry once. Triples that only become
//! mergeable after a later join are left alone.

use crate::area::Rect;
use crate::invalidate::InvalidationQueue;

/// Join the touching areas of `queue` where it saves pixels.
///
/// Returns the number of entries marked as joined.
pub fn join_areas(queue: &mut InvalidationQueue) -> usize {
    let mut joined = 0;

    for join_in in 0..queue.len() {
        if queue.is_joined(join_in) {
            continue;
        }

        for join_from in 0..queue.len() {
            if join_from == join_in || queue.is_joined(join_from) {
                continue;
            }

            let target = queue.entries()[join_in];
            let source = queue.entries()[join_from];
            if !target.touches(&source) {
                continue;
            }

            let candidate = target.join(&source);
            if candidate.size() < target.size() + source.size() {
                queue.set_area(join_in, candidate);
                queue.mark_joined(join_from);
                joined += 1;
            }
        }
    }

    if joined > 0 {
        log::debug!(
            "Joined {} of {} dirty areas, {} px left",
            joined,
            queue.len(),
            queue.pending_size()
        );
    }

    joined
}
