/// Allocates contiguous descriptor ranges inside `[0, size)`.
///
/// First-fit over a sorted free list. Freed ranges are merged with their
/// neighbours so that long-lived tables do not fragment the heap.
///
/// # Example
///
/// ```ignore
/// let mut alloc = RangeAllocator::new(16);
/// let a = alloc.allocate(4).unwrap();  // 0
/// let b = alloc.allocate(4).unwrap();  // 4
/// alloc.free(a, 4);                     // [0, 4) is free again
/// let c = alloc.allocate(2).unwrap();  // 0 (reused)
/// ```
#[derive(Debug, Clone)]
pub struct RangeAllocator {
    /// Free ranges as (offset, length), sorted by offset, never adjacent
    free_ranges: Vec<(u32, u32)>,
    size: u32,
    used: u32,
}

impl RangeAllocator {
    /// Create an allocator over `size` descriptors, all free
    pub fn new(size: u32) -> Self {
        let free_ranges = if size > 0 { vec![(0, size)] } else { Vec::new() };
        Self {
            free_ranges,
            size,
            used: 0,
        }
    }

    /// Allocate `count` contiguous descriptors, returning the first offset
    ///
    /// Returns `None` for a zero count or when no free range is large enough.
    pub fn allocate(&mut self, count: u32) -> Option<u32> {
        if count == 0 {
            return None;
        }

        let index = self.free_ranges.iter().position(|&(_, len)| len >= count)?;
        let (offset, len) = self.free_ranges[index];
        if len == count {
            self.free_ranges.remove(index);
        } else {
            self.free_ranges[index] = (offset + count, len - count);
        }
        self.used += count;
        Some(offset)
    }

    /// Return `[offset, offset + count)` to the free list
    pub fn free(&mut self, offset: u32, count: u32) {
        if count == 0 {
            return;
        }
        debug_assert!(offset + count <= self.size, "freeing a range past the end: {}+{}", offset, count);

        let index = self.free_ranges.partition_point(|&(start, _)| start < offset);
        debug_assert!(
            index == self.free_ranges.len() || offset + count <= self.free_ranges[index].0,
            "freeing a range that overlaps a free range: {}+{}", offset, count
        );

        let merges_prev = index > 0 && {
            let (start, len) = self.free_ranges[index - 1];
            start + len == offset
        };
        let merges_next = index < self.free_ranges.len() && offset + count == self.free_ranges[index].0;

        match (merges_prev, merges_next) {
            (true, true) => {
                let (_, next_len) = self.free_ranges.remove(index);
                self.free_ranges[index - 1].1 += count + next_len;
            }
            (true, false) => self.free_ranges[index - 1].1 += count,
            (false, true) => {
                let next = &mut self.free_ranges[index];
                *next = (offset, next.1 + count);
            }
            (false, false) => self.free_ranges.insert(index, (offset, count)),
        }
        self.used -= count;
    }

    /// Total number of descriptors managed
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Number of allocated descriptors
    pub fn used_size(&self) -> u32 {
        self.used
    }

    /// Number of free descriptors (possibly fragmented)
    pub fn free_size(&self) -> u32 {
        self.size - self.used
    }

    /// Number of disjoint free ranges
    pub fn free_range_count(&self) -> usize {
        self.free_ranges.len()
    }

    /// Whether nothing is allocated
    pub fn is_empty(&self) -> bool {
        self.used == 0
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "range_allocator_tests.rs"]
mod tests;
