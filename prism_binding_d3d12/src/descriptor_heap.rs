/// Shader-visible descriptor heaps
///
/// The device owns one heap per heap type. Each heap is split in two regions:
///
/// - the static region holds the tables of pipeline states and shader
///   resource bindings for as long as those objects live;
/// - the dynamic region is handed out in chunks to device contexts, which
///   fill it with dynamic descriptors at every commit and give it back at the
///   end of the frame.
///
/// A slot stores the CPU handle that was copied into it, which is all the GPU
/// would ever read from it.

use crate::d3d12_types::{CpuDescriptorHandle, DescriptorHeapType, GpuDescriptorHandle};
use crate::range_allocator::RangeAllocator;
use prism_binding::prism::Result;
use prism_binding::{engine_bail, engine_trace};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HeapRegion {
    Static,
    Dynamic,
}

#[derive(Debug)]
struct HeapState {
    slots: Vec<Option<CpuDescriptorHandle>>,
    static_region: RangeAllocator,
    dynamic_region: RangeAllocator,
}

/// One shader-visible heap
#[derive(Debug)]
pub struct GpuDescriptorHeap {
    heap_type: DescriptorHeapType,
    static_size: u32,
    state: Mutex<HeapState>,
}

impl GpuDescriptorHeap {
    pub fn new(heap_type: DescriptorHeapType, static_size: u32, dynamic_size: u32) -> Arc<Self> {
        Arc::new(Self {
            heap_type,
            static_size,
            state: Mutex::new(HeapState {
                slots: vec![None; (static_size + dynamic_size) as usize],
                static_region: RangeAllocator::new(static_size),
                dynamic_region: RangeAllocator::new(dynamic_size),
            }),
        })
    }

    fn lock(&self) -> MutexGuard<'_, HeapState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn heap_type(&self) -> DescriptorHeapType {
        self.heap_type
    }

    /// Allocate `count` descriptors from the static region
    ///
    /// # Errors
    ///
    /// Returns `Error::OutOfDescriptors` if the region has no contiguous range
    /// of that size.
    pub fn allocate(self: &Arc<Self>, count: u32) -> Result<DescriptorHeapAllocation> {
        self.allocate_in(HeapRegion::Static, count)
    }

    /// Allocate `count` descriptors from the dynamic region
    pub(crate) fn allocate_dynamic(self: &Arc<Self>, count: u32) -> Result<DescriptorHeapAllocation> {
        self.allocate_in(HeapRegion::Dynamic, count)
    }

    fn allocate_in(self: &Arc<Self>, region: HeapRegion, count: u32) -> Result<DescriptorHeapAllocation> {
        let first = {
            let mut state = self.lock();
            let allocator = match region {
                HeapRegion::Static => &mut state.static_region,
                HeapRegion::Dynamic => &mut state.dynamic_region,
            };
            allocator.allocate(count)
        };

        let Some(offset) = first else {
            engine_bail!(OutOfDescriptors => "prism::d3d12::GpuDescriptorHeap",
                "Unable to allocate {} descriptor(s) in the {:?} region of the shader-visible {} heap",
                count, region, self.heap_type.as_str());
        };

        let first = match region {
            HeapRegion::Static => offset,
            HeapRegion::Dynamic => self.static_size + offset,
        };
        Ok(DescriptorHeapAllocation {
            heap: Arc::clone(self),
            region,
            first,
            count,
        })
    }

    fn free(&self, region: HeapRegion, first: u32, count: u32) {
        let mut state = self.lock();
        let end = (first + count) as usize;
        for slot in &mut state.slots[first as usize..end] {
            *slot = None;
        }
        match region {
            HeapRegion::Static => state.static_region.free(first, count),
            HeapRegion::Dynamic => state.dynamic_region.free(first - self.static_size, count),
        }
    }

    /// Descriptor stored at `index`
    pub fn descriptor(&self, index: u32) -> Option<CpuDescriptorHandle> {
        self.lock().slots.get(index as usize).copied().flatten()
    }

    fn write(&self, index: u32, handle: Option<CpuDescriptorHandle>) {
        if let Some(slot) = self.lock().slots.get_mut(index as usize) {
            *slot = handle;
        }
    }

    pub fn static_used(&self) -> u32 {
        self.lock().static_region.used_size()
    }

    pub fn dynamic_used(&self) -> u32 {
        self.lock().dynamic_region.used_size()
    }
}

// ============================================================================
// DescriptorHeapAllocation
// ============================================================================

/// Contiguous descriptors owned until dropped
#[derive(Debug)]
pub struct DescriptorHeapAllocation {
    heap: Arc<GpuDescriptorHeap>,
    region: HeapRegion,
    first: u32,
    count: u32,
}

impl DescriptorHeapAllocation {
    pub fn heap_type(&self) -> DescriptorHeapType {
        self.heap.heap_type()
    }

    pub fn first(&self) -> u32 {
        self.first
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// GPU handle of the descriptor at `offset`
    pub fn gpu_handle(&self, offset: u32) -> GpuDescriptorHandle {
        debug_assert!(offset <= self.count, "offset {} is out of range ({} descriptors)", offset, self.count);
        GpuDescriptorHandle {
            heap_type: self.heap.heap_type(),
            index: self.first + offset,
        }
    }

    /// Copy `handle` into the descriptor at `offset`
    pub fn copy_from(&self, offset: u32, handle: Option<CpuDescriptorHandle>) {
        debug_assert!(offset < self.count, "offset {} is out of range ({} descriptors)", offset, self.count);
        self.heap.write(self.first + offset, handle);
    }

    /// Descriptor currently stored at `offset`
    pub fn descriptor(&self, offset: u32) -> Option<CpuDescriptorHandle> {
        self.heap.descriptor(self.first + offset)
    }
}

impl Drop for DescriptorHeapAllocation {
    fn drop(&mut self) {
        self.heap.free(self.region, self.first, self.count);
    }
}

// ============================================================================
// DynamicDescriptorAllocator
// ============================================================================

/// Sub-range of a dynamic chunk, valid until the chunk is released
#[derive(Debug, Clone)]
pub struct DynamicDescriptorRange {
    heap: Arc<GpuDescriptorHeap>,
    first: u32,
    count: u32,
}

impl DynamicDescriptorRange {
    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn gpu_handle(&self, offset: u32) -> GpuDescriptorHandle {
        GpuDescriptorHandle {
            heap_type: self.heap.heap_type(),
            index: self.first + offset,
        }
    }

    pub fn copy_from(&self, offset: u32, handle: Option<CpuDescriptorHandle>) {
        debug_assert!(offset < self.count, "offset {} is out of range ({} descriptors)", offset, self.count);
        self.heap.write(self.first + offset, handle);
    }

    pub fn descriptor(&self, offset: u32) -> Option<CpuDescriptorHandle> {
        self.heap.descriptor(self.first + offset)
    }
}

/// Per-context allocator of dynamic descriptors
///
/// Each device context owns one per heap type, so contexts never contend on
/// the heap except when they grab a new chunk.
#[derive(Debug)]
pub struct DynamicDescriptorAllocator {
    heap: Arc<GpuDescriptorHeap>,
    chunk_size: u32,
    /// Chunks used in the current frame; the last one is being filled
    chunks: Vec<DescriptorHeapAllocation>,
    /// Next free descriptor in the last chunk
    chunk_offset: u32,
    /// Chunks of previous frames the GPU may still read
    retired: VecDeque<Vec<DescriptorHeapAllocation>>,
    frames_in_flight: usize,
}

impl DynamicDescriptorAllocator {
    pub fn new(heap: Arc<GpuDescriptorHeap>, chunk_size: u32, frames_in_flight: u32) -> Self {
        Self {
            heap,
            chunk_size: chunk_size.max(1),
            chunks: Vec::new(),
            chunk_offset: 0,
            retired: VecDeque::new(),
            frames_in_flight: frames_in_flight.max(1) as usize,
        }
    }

    /// Allocate `count` contiguous dynamic descriptors
    ///
    /// A request larger than the chunk size gets a dedicated chunk.
    pub fn allocate(&mut self, count: u32) -> Result<DynamicDescriptorRange> {
        let fits = self.chunks.last()
            .map_or(false, |chunk| self.chunk_offset + count <= chunk.count());

        if !fits {
            let chunk = self.heap.allocate_dynamic(count.max(self.chunk_size))?;
            engine_trace!("prism::d3d12::DynamicDescriptorAllocator",
                "New {} chunk of {} descriptors at {}", self.heap.heap_type().as_str(), chunk.count(), chunk.first());
            self.chunks.push(chunk);
            self.chunk_offset = 0;
        }

        let chunk = match self.chunks.last() {
            Some(chunk) => chunk,
            None => engine_bail!("prism::d3d12::DynamicDescriptorAllocator", "No dynamic chunk available"),
        };
        let range = DynamicDescriptorRange {
            heap: Arc::clone(&self.heap),
            first: chunk.first() + self.chunk_offset,
            count,
        };
        self.chunk_offset += count;
        Ok(range)
    }

    /// Retire the chunks of the finished frame
    ///
    /// Chunks go back to the heap once `frames_in_flight` frames have passed.
    pub fn finish_frame(&mut self) {
        self.retired.push_back(std::mem::take(&mut self.chunks));
        self.chunk_offset = 0;
        while self.retired.len() >= self.frames_in_flight {
            self.retired.pop_front();
        }
    }

    /// Number of chunks used in the current frame
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "descriptor_heap_tests.rs"]
mod tests;
