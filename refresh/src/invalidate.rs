//! Invalidation Queue
//!
//! Bounded list of dirty areas waiting for the next refresh pass. Every
//! entry carries a "joined" mark set by the region merger; joined entries
//! stay in place so indices are stable for the rest of the pass.

use alloc::vec::Vec;

use crate::area::Rect;

/// Outcome of [`InvalidationQueue::insert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insert {
    /// The area was appended.
    Added,
    /// An existing entry already contains the area.
    Covered,
    /// The queue was full and collapsed to the whole screen.
    Overflow,
}

/// Per-display queue of dirty areas.
#[derive(Debug, Clone)]
pub struct InvalidationQueue {
    /// Dirty areas in insertion order
    areas: Vec<Rect>,
    /// `joined[i]` is set when `areas[i]` was merged into another entry
    joined: Vec<bool>,
    /// Maximum number of entries
    capacity: usize,
}

impl InvalidationQueue {
    /// Create an empty queue holding at most `capacity` areas.
    pub fn new(capacity: usize) -> Self {
        debug_assert!(capacity > 0, "invalidation queue needs at least one slot");
        Self {
            areas: Vec::with_capacity(capacity),
            joined: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of entries, joined ones included.
    pub fn len(&self) -> usize {
        self.areas.len()
    }

    /// True if nothing is waiting to be redrawn.
    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.areas.clear();
        self.joined.clear();
    }

    /// Add an area that is already clipped to `screen`.
    ///
    /// Areas inside an existing entry are ignored. A full queue is replaced
    /// by a single entry covering `screen`.
    pub fn insert(&mut self, area: Rect, screen: Rect) -> Insert {
        debug_assert!(screen.contains(&area), "{:?} is outside of {:?}", area, screen);

        if self.pending().any(|existing| existing.contains(&area)) {
            return Insert::Covered;
        }

        if self.areas.len() >= self.capacity {
            self.replace_with(screen);
            return Insert::Overflow;
        }

        self.areas.push(area);
        self.joined.push(false);
        Insert::Added
    }

    /// Replace the content of the queue with a single area.
    pub fn replace_with(&mut self, area: Rect) {
        self.clear();
        self.areas.push(area);
        self.joined.push(false);
    }

    /// All entries, joined ones included.
    pub fn entries(&self) -> &[Rect] {
        &self.areas
    }

    /// Entries which were not joined into another one.
    pub fn pending(&self) -> impl Iterator<Item = &Rect> + '_ {
        self.areas
            .iter()
            .zip(self.joined.iter())
            .filter(|(_, joined)| !**joined)
            .map(|(area, _)| area)
    }

    /// Check whether the entry at `index` was joined into another one.
    pub fn is_joined(&self, index: usize) -> bool {
        self.joined[index]
    }

    /// Sum of the sizes of the entries which were not joined.
    pub fn pending_size(&self) -> u64 {
        self.pending().map(Rect::size).sum()
    }

    pub(crate) fn set_area(&mut self, index: usize, area: Rect) {
        self.areas[index] = area;
    }

    pub(crate) fn mark_joined(&mut self, index: usize) {
        self.joined[index] = true;
    }
}
