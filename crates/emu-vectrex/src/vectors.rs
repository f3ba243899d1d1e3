//! Draw and erase segment lists.
//!
//! Every segment the beam traces during a display pass lands in the draw
//! list. A hash of the endpoints finds repeats: a segment already in the
//! draw list only has its colour refreshed, and one that was drawn in the
//! previous pass is marked in the erase list so it is not erased. At the
//! end of a pass the lists trade places.

/// Segments kept per pass. Further segments are dropped.
pub const SEGMENT_CAPACITY: usize = 2048;

/// Hash table size (largest prime below 2^16).
pub const HASH_SLOTS: usize = 65_521;

/// Number of intensity levels. Also marks an erase-list entry that was
/// redrawn and must stay on screen.
pub const COLOR_RANGE: u8 = 128;

/// A straight beam path in integrator units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Segment {
    pub x0: i64,
    pub y0: i64,
    pub x1: i64,
    pub y1: i64,
    /// Intensity, 0 to 127 (or `COLOR_RANGE` in the erase list).
    pub color: u8,
}

impl Segment {
    fn same_endpoints(&self, other: &Segment) -> bool {
        self.x0 == other.x0 && self.y0 == other.y0 && self.x1 == other.x1 && self.y1 == other.y1
    }

    fn hash_slot(&self) -> usize {
        let mut key = self.x0 as u64;
        key = key.wrapping_mul(31).wrapping_add(self.y0 as u64);
        key = key.wrapping_mul(31).wrapping_add(self.x1 as u64);
        key = key.wrapping_mul(31).wrapping_add(self.y1 as u64);
        (key % HASH_SLOTS as u64) as usize
    }
}

/// Double-buffered segment arenas with endpoint deduplication.
#[derive(Clone, PartialEq, Eq)]
pub struct SegmentLists {
    draw: Box<[Segment]>,
    erase: Box<[Segment]>,
    draw_count: usize,
    erase_count: usize,
    /// Last draw-list index stored for each hash slot.
    hash: Box<[u16]>,
    dropped: u64,
}

impl SegmentLists {
    #[must_use]
    pub fn new() -> Self {
        Self {
            draw: vec![Segment::default(); SEGMENT_CAPACITY].into_boxed_slice(),
            erase: vec![Segment::default(); SEGMENT_CAPACITY].into_boxed_slice(),
            draw_count: 0,
            erase_count: 0,
            hash: vec![0; HASH_SLOTS].into_boxed_slice(),
            dropped: 0,
        }
    }

    /// Empty both lists.
    pub fn clear(&mut self) {
        self.draw_count = 0;
        self.erase_count = 0;
    }

    /// Record a finished segment.
    pub fn add(&mut self, segment: Segment) {
        let slot = segment.hash_slot();
        let index = usize::from(self.hash[slot]);

        if index < self.draw_count && self.draw[index].same_endpoints(&segment) {
            self.draw[index].color = segment.color;
            return;
        }

        if index < self.erase_count && self.erase[index].same_endpoints(&segment) {
            self.erase[index].color = COLOR_RANGE;
        }

        if self.draw_count == SEGMENT_CAPACITY {
            self.dropped += 1;
            log::trace!(
                "draw list full, dropping ({}, {})-({}, {})",
                segment.x0,
                segment.y0,
                segment.x1,
                segment.y1
            );
            return;
        }

        self.draw[self.draw_count] = segment;
        self.hash[slot] = self.draw_count as u16;
        self.draw_count += 1;
    }

    /// End a pass: the draw list becomes the erase list.
    pub fn swap(&mut self) {
        self.erase_count = self.draw_count;
        self.draw_count = 0;
        std::mem::swap(&mut self.draw, &mut self.erase);
    }

    /// Segments drawn so far in this pass.
    #[must_use]
    pub fn draw(&self) -> &[Segment] {
        &self.draw[..self.draw_count]
    }

    /// Segments drawn in the previous pass.
    #[must_use]
    pub fn erase(&self) -> &[Segment] {
        &self.erase[..self.erase_count]
    }

    /// Segments discarded because the draw list was full.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

impl Default for SegmentLists {
    fn default() -> Self {
        Self::new()
    }
}
