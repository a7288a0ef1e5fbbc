/// ShaderResourceCache - storage of bound resources
///
/// A cache is a list of root tables indexed by root index. Every table is a
/// list of slots, and every slot holds a strong reference to the bound object
/// together with the CPU descriptor that was created for it. Root views are
/// stored as one-slot tables.
///
/// Caches of shader resource bindings also own shader-visible heap space for
/// their static and mutable tables; binding a resource to one of those slots
/// copies its descriptor into the heap right away. Dynamic tables and root
/// views have no heap space and are committed at every draw.

use crate::d3d12_types::{CpuDescriptorHandle, DescriptorHeapType, GpuDescriptorHandle};
use crate::descriptor_heap::DescriptorHeapAllocation;
use prism_binding::prism::resource::DeviceObject;
use prism_binding::prism::shader::ShaderResourceKind;

/// What a cache stores
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheContentType {
    /// Static resources of one pipeline stage, indexed by bind point
    StaticShaderResources,
    /// All resources of a shader resource binding, indexed by root index
    SrbResources,
}

/// One slot of a root table
#[derive(Debug, Clone, Default)]
pub struct CachedResource {
    /// Kind of the bound resource, None while unbound
    pub kind: Option<ShaderResourceKind>,
    /// CPU descriptor of the bound object; dynamic buffers have none
    pub cpu_handle: Option<CpuDescriptorHandle>,
    pub object: Option<DeviceObject>,
}

impl CachedResource {
    pub fn is_bound(&self) -> bool {
        self.object.is_some()
    }

    /// Whether the slot holds a buffer with dynamic usage
    pub fn is_dynamic_buffer(&self) -> bool {
        self.object.as_ref()
            .and_then(DeviceObject::as_buffer)
            .map_or(false, |buffer| buffer.is_dynamic())
    }
}

/// Slots of one root parameter
#[derive(Debug, Clone, Default)]
pub struct RootTable {
    resources: Vec<CachedResource>,
    /// Start of the table in the cache's shader-visible allocation
    heap_offset: Option<u32>,
}

impl RootTable {
    fn new(size: u32) -> Self {
        Self {
            resources: vec![CachedResource::default(); size as usize],
            heap_offset: None,
        }
    }

    pub fn size(&self) -> u32 {
        self.resources.len() as u32
    }

    pub fn resource(&self, offset: u32) -> &CachedResource {
        &self.resources[offset as usize]
    }

    pub fn resources(&self) -> &[CachedResource] {
        &self.resources
    }

    pub fn heap_offset(&self) -> Option<u32> {
        self.heap_offset
    }
}

/// Bound resources of a pipeline stage or of a shader resource binding
#[derive(Debug)]
pub struct ShaderResourceCache {
    content_type: CacheContentType,
    tables: Vec<RootTable>,
    cbv_srv_uav_heap_space: Option<DescriptorHeapAllocation>,
    sampler_heap_space: Option<DescriptorHeapAllocation>,
    bound_dynamic_cbs: u32,
    initialized: bool,
}

impl ShaderResourceCache {
    pub fn new(content_type: CacheContentType) -> Self {
        Self {
            content_type,
            tables: Vec::new(),
            cbv_srv_uav_heap_space: None,
            sampler_heap_space: None,
            bound_dynamic_cbs: 0,
            initialized: false,
        }
    }

    /// Create one table per entry of `table_sizes`
    ///
    /// Must be called exactly once.
    pub fn initialize(&mut self, table_sizes: &[u32]) {
        debug_assert!(!self.initialized, "Shader resource cache is already initialized");
        self.tables = table_sizes.iter().map(|&size| RootTable::new(size)).collect();
        self.initialized = true;
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn content_type(&self) -> CacheContentType {
        self.content_type
    }

    pub fn num_root_tables(&self) -> u32 {
        self.tables.len() as u32
    }

    pub fn root_table(&self, root_index: u32) -> &RootTable {
        &self.tables[root_index as usize]
    }

    pub fn resource(&self, root_index: u32, offset: u32) -> &CachedResource {
        self.tables[root_index as usize].resource(offset)
    }

    /// Slot at (`root_index`, `offset`), None if it does not exist
    pub fn try_resource(&self, root_index: u32, offset: u32) -> Option<&CachedResource> {
        self.tables.get(root_index as usize)?.resources.get(offset as usize)
    }

    /// Place the table at `heap_offset` in the shader-visible allocation
    pub(crate) fn set_table_heap_offset(&mut self, root_index: u32, heap_offset: u32) {
        self.tables[root_index as usize].heap_offset = Some(heap_offset);
    }

    pub(crate) fn set_descriptor_heap_space(
        &mut self,
        cbv_srv_uav: Option<DescriptorHeapAllocation>,
        sampler: Option<DescriptorHeapAllocation>,
    ) {
        self.cbv_srv_uav_heap_space = cbv_srv_uav;
        self.sampler_heap_space = sampler;
    }

    fn heap_space(&self, heap_type: DescriptorHeapType) -> Option<&DescriptorHeapAllocation> {
        match heap_type {
            DescriptorHeapType::CbvSrvUav => self.cbv_srv_uav_heap_space.as_ref(),
            DescriptorHeapType::Sampler => self.sampler_heap_space.as_ref(),
        }
    }

    /// Whether the slot has a shader-visible descriptor of its own
    pub fn has_shader_visible_slot(&self, root_index: u32, heap_type: DescriptorHeapType) -> bool {
        self.tables[root_index as usize].heap_offset.is_some() && self.heap_space(heap_type).is_some()
    }

    /// GPU handle of the start of a static or mutable table
    pub fn table_gpu_handle(&self, root_index: u32, heap_type: DescriptorHeapType) -> Option<GpuDescriptorHandle> {
        let heap_offset = self.tables[root_index as usize].heap_offset?;
        Some(self.heap_space(heap_type)?.gpu_handle(heap_offset))
    }

    /// Descriptor currently copied into the shader-visible slot
    pub fn shader_visible_descriptor(
        &self,
        root_index: u32,
        offset: u32,
        heap_type: DescriptorHeapType,
    ) -> Option<CpuDescriptorHandle> {
        let heap_offset = self.tables[root_index as usize].heap_offset?;
        self.heap_space(heap_type)?.descriptor(heap_offset + offset)
    }

    /// Store `object` in a slot and copy its descriptor to the shader-visible heap
    ///
    /// Keeps the dynamic constant buffer counter up to date.
    pub(crate) fn set_resource(
        &mut self,
        root_index: u32,
        offset: u32,
        heap_type: DescriptorHeapType,
        resource: CachedResource,
    ) {
        let table = &mut self.tables[root_index as usize];
        let heap_offset = table.heap_offset;
        let slot = &mut table.resources[offset as usize];

        if slot.is_dynamic_buffer() {
            debug_assert!(self.bound_dynamic_cbs > 0, "Dynamic CB is bound but the counter is zero");
            self.bound_dynamic_cbs -= 1;
        }
        if resource.is_dynamic_buffer() {
            self.bound_dynamic_cbs += 1;
        }

        let cpu_handle = resource.cpu_handle;
        let bound = resource.is_bound();
        *slot = resource;

        if let (Some(heap_offset), true) = (heap_offset, bound) {
            let space = match heap_type {
                DescriptorHeapType::CbvSrvUav => self.cbv_srv_uav_heap_space.as_ref(),
                DescriptorHeapType::Sampler => self.sampler_heap_space.as_ref(),
            };
            if let Some(space) = space {
                space.copy_from(heap_offset + offset, cpu_handle);
            }
        }
    }

    /// Reset a slot to unbound
    pub(crate) fn clear_resource(&mut self, root_index: u32, offset: u32) {
        self.set_resource(root_index, offset, DescriptorHeapType::CbvSrvUav, CachedResource::default());
    }

    /// Number of dynamic constant buffers currently bound
    pub fn bound_dynamic_cbs(&self) -> u32 {
        self.bound_dynamic_cbs
    }

    /// Recount dynamic constant buffers by walking every table
    ///
    /// Always equals [`bound_dynamic_cbs`](Self::bound_dynamic_cbs).
    pub fn count_dynamic_cbs(&self) -> u32 {
        self.tables.iter()
            .flat_map(|table| table.resources.iter())
            .filter(|res| res.is_dynamic_buffer())
            .count() as u32
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "shader_resource_cache_tests.rs"]
mod tests;
