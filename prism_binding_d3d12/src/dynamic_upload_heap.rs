/// DynamicUploadHeap - per-context ring of upload pages for dynamic buffers
///
/// Mapping a dynamic buffer sub-allocates from the current page and stamps the
/// mapping with the current frame. Root views of dynamic constant buffers take
/// their address from that mapping, which is only valid in the frame it was
/// made in.

use crate::d3d12_types::GpuVirtualAddress;
use prism_binding::prism::resource::{Buffer, ResourceId};
use prism_binding::prism::Result;
use prism_binding::{engine_bail, engine_err, engine_trace};
use rustc_hash::FxHashMap;
use std::collections::VecDeque;

const LOG_SOURCE: &str = "prism::d3d12::DynamicUploadHeap";

/// Placement alignment of constant buffer data
pub const CONSTANT_BUFFER_ALIGNMENT: u64 = 256;

/// Base of the synthetic address space handed out by upload pages
const UPLOAD_ADDRESS_BASE: u64 = 0x1_0000_0000;

fn align_up(value: u64, alignment: u64) -> u64 {
    (value + alignment - 1) & !(alignment - 1)
}

#[derive(Debug)]
struct UploadPage {
    base: u64,
    size: u64,
    offset: u64,
}

#[derive(Debug, Clone, Copy)]
struct DynamicAllocation {
    address: GpuVirtualAddress,
    frame: u64,
}

#[derive(Debug)]
pub struct DynamicUploadHeap {
    page_size: u64,
    frames_in_flight: usize,
    frame: u64,
    /// Pages used in the current frame; the last one is being filled
    pages: Vec<UploadPage>,
    /// Pages of previous frames the GPU may still read
    retired: VecDeque<Vec<UploadPage>>,
    /// Pages ready for reuse
    free_pages: Vec<UploadPage>,
    next_page_base: u64,
    allocations: FxHashMap<ResourceId, DynamicAllocation>,
}

impl DynamicUploadHeap {
    pub fn new(page_size: u64, frames_in_flight: u32) -> Self {
        Self {
            page_size: align_up(page_size.max(CONSTANT_BUFFER_ALIGNMENT), CONSTANT_BUFFER_ALIGNMENT),
            frames_in_flight: frames_in_flight.max(1) as usize,
            frame: 0,
            pages: Vec::new(),
            retired: VecDeque::new(),
            free_pages: Vec::new(),
            next_page_base: UPLOAD_ADDRESS_BASE,
            allocations: FxHashMap::default(),
        }
    }

    pub fn current_frame(&self) -> u64 {
        self.frame
    }

    /// Pages used in the current frame
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Allocate `size` bytes, aligned to `CONSTANT_BUFFER_ALIGNMENT`
    pub fn allocate(&mut self, size: u64) -> GpuVirtualAddress {
        let size = align_up(size.max(1), CONSTANT_BUFFER_ALIGNMENT);
        let mut page = match self.pages.pop() {
            Some(page) if page.offset + size <= page.size => page,
            full => {
                self.pages.extend(full);
                self.new_page(size)
            }
        };

        let address = GpuVirtualAddress(page.base + page.offset);
        page.offset += size;
        self.pages.push(page);
        address
    }

    fn new_page(&mut self, min_size: u64) -> UploadPage {
        let reusable = self.free_pages.iter().position(|page| page.size >= min_size);
        if let Some(index) = reusable {
            let mut page = self.free_pages.swap_remove(index);
            page.offset = 0;
            return page;
        }

        let size = self.page_size.max(min_size);
        let page = UploadPage {
            base: self.next_page_base,
            size,
            offset: 0,
        };
        self.next_page_base += size;
        engine_trace!(LOG_SOURCE, "New upload page of {} bytes at {:#x}", size, page.base);
        page
    }

    /// Give `buffer` fresh upload space for the current frame
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidResource` if the buffer does not have dynamic usage.
    pub fn map_buffer(&mut self, buffer: &Buffer) -> Result<GpuVirtualAddress> {
        if !buffer.is_dynamic() {
            engine_bail!(InvalidResource => LOG_SOURCE,
                "Buffer '{}' cannot be mapped for discard: only buffers with Usage::Dynamic use the dynamic upload heap",
                buffer.name());
        }

        let address = self.allocate(buffer.desc().size);
        self.allocations.insert(buffer.id(), DynamicAllocation { address, frame: self.frame });
        Ok(address)
    }

    /// Address of the mapping `buffer` got in the current frame
    ///
    /// # Errors
    ///
    /// Returns `Error::StaleFrame` if the buffer was never mapped or was last
    /// mapped in an earlier frame.
    pub fn address_of(&self, buffer: &Buffer) -> Result<GpuVirtualAddress> {
        match self.allocations.get(&buffer.id()) {
            Some(allocation) if allocation.frame == self.frame => Ok(allocation.address),
            Some(allocation) => Err(engine_err!(StaleFrame => LOG_SOURCE,
                "Dynamic buffer '{}' was last mapped in frame {}, but the current frame is {}. Dynamic buffers must be mapped in every frame they are used in.",
                buffer.name(), allocation.frame, self.frame)),
            None => Err(engine_err!(StaleFrame => LOG_SOURCE,
                "Dynamic buffer '{}' has not been mapped. Dynamic buffers must be mapped in every frame they are used in.",
                buffer.name())),
        }
    }

    /// Advance to the next frame
    ///
    /// Pages of the finished frame become reusable once `frames_in_flight`
    /// frames have passed. Mappings of the finished frame become stale.
    pub fn finish_frame(&mut self) {
        self.retired.push_back(std::mem::take(&mut self.pages));
        while self.retired.len() >= self.frames_in_flight {
            if let Some(pages) = self.retired.pop_front() {
                self.free_pages.extend(pages);
            }
        }

        let finished = self.frame;
        self.allocations.retain(|_, allocation| allocation.frame == finished);
        self.frame += 1;
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "dynamic_upload_heap_tests.rs"]
mod tests;
