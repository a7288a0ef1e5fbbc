/// RootSignature - binding contract shared by every stage of a pipeline
///
/// Resources are grouped into descriptor tables keyed by (stage, table type),
/// one table for static and mutable resources and one for dynamic resources,
/// with samplers in tables of their own. Non-array constant buffers become
/// root views. Immutable samplers are baked in as static samplers.
///
/// After `finalize` the signature is immutable: its hash and table layout are
/// fixed, and it commits caches built against it to a device context.

use crate::command_list::CommandList;
use crate::d3d12_types::{
    DescriptorHeapType, DescriptorRange, DescriptorRangeType, GpuVirtualAddress, RootParameterDesc,
    RootSignatureDesc, ShaderVisibility, StaticSamplerDesc, MAX_ROOT_SIGNATURE_DWORDS,
};
use crate::device::D3D12Device;
use crate::device_context::D3D12DeviceContext;
use crate::shader_resource_cache::{CachedResource, ShaderResourceCache};
use prism_binding::prism::layout::{PipelineResourceLayoutDesc, VariableType};
use prism_binding::prism::resource::{DeviceObject, ResourceState, SamplerDesc};
use prism_binding::prism::shader::{ShaderResourceAttribs, ShaderResourceKind, ShaderStage};
use prism_binding::prism::utils::{streq_suff, HashBuilder};
use prism_binding::prism::Result;
use prism_binding::{engine_bail, engine_err, engine_error};

const LOG_SOURCE: &str = "prism::d3d12::RootSignature";

// ============================================================================
// Root parameters
// ============================================================================

/// Descriptor table root parameter
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RootTable {
    root_index: u32,
    visibility: ShaderVisibility,
    /// Static (shared with mutable) or dynamic
    var_type: VariableType,
    heap_type: DescriptorHeapType,
    ranges: Vec<DescriptorRange>,
}

impl RootTable {
    pub fn root_index(&self) -> u32 {
        self.root_index
    }

    pub fn visibility(&self) -> ShaderVisibility {
        self.visibility
    }

    pub fn var_type(&self) -> VariableType {
        self.var_type
    }

    pub fn heap_type(&self) -> DescriptorHeapType {
        self.heap_type
    }

    pub fn ranges(&self) -> &[DescriptorRange] {
        &self.ranges
    }

    /// Number of descriptors in all ranges
    pub fn size(&self) -> u32 {
        self.ranges.iter().map(|r| r.num_descriptors).sum()
    }

    fn is_dynamic(&self) -> bool {
        self.var_type == VariableType::Dynamic
    }
}

/// Root constant buffer view
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RootView {
    root_index: u32,
    visibility: ShaderVisibility,
    var_type: VariableType,
    shader_register: u32,
}

impl RootView {
    pub fn root_index(&self) -> u32 {
        self.root_index
    }

    pub fn visibility(&self) -> ShaderVisibility {
        self.visibility
    }

    pub fn var_type(&self) -> VariableType {
        self.var_type
    }

    pub fn shader_register(&self) -> u32 {
        self.shader_register
    }
}

/// Immutable sampler slot, one per stage the sampler is declared for
#[derive(Debug, Clone)]
struct ImmutableSamplerAttribs {
    name: String,
    desc: SamplerDesc,
    visibility: ShaderVisibility,
    /// Set when a shader resource picks the sampler up
    shader_register: Option<u32>,
    array_size: u32,
}

/// Which tables a commit has to walk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitMode {
    /// Only static and mutable tables, all backed by the cache's heap space
    StaticMutable,
    /// Some tables are dynamic and are copied to per-draw descriptors
    WithDynamic,
}

/// Root signature of one pipeline state
#[derive(Debug)]
pub struct RootSignature {
    tables: Vec<RootTable>,
    views: Vec<RootView>,
    /// Table index per (stage, table type)
    cbv_srv_uav_table_map: [Option<usize>; ShaderStage::COUNT * VariableType::COUNT],
    sampler_table_map: [Option<usize>; ShaderStage::COUNT * VariableType::COUNT],
    immutable_samplers: Vec<ImmutableSamplerAttribs>,
    total_cbv_srv_uav_slots: [u32; VariableType::COUNT],
    total_sampler_slots: [u32; VariableType::COUNT],
    total_root_views: [u32; VariableType::COUNT],
    desc: Option<RootSignatureDesc>,
    hash: u64,
    commit_mode: CommitMode,
}

impl Default for RootSignature {
    fn default() -> Self {
        Self::new()
    }
}

impl RootSignature {
    pub fn new() -> Self {
        Self {
            tables: Vec::new(),
            views: Vec::new(),
            cbv_srv_uav_table_map: [None; ShaderStage::COUNT * VariableType::COUNT],
            sampler_table_map: [None; ShaderStage::COUNT * VariableType::COUNT],
            immutable_samplers: Vec::new(),
            total_cbv_srv_uav_slots: [0; VariableType::COUNT],
            total_sampler_slots: [0; VariableType::COUNT],
            total_root_views: [0; VariableType::COUNT],
            desc: None,
            hash: 0,
            commit_mode: CommitMode::StaticMutable,
        }
    }

    fn num_root_params(&self) -> u32 {
        (self.tables.len() + self.views.len()) as u32
    }

    // ===== CONSTRUCTION =====

    /// Create one immutable sampler slot per stage of every layout entry
    pub fn allocate_immutable_samplers(&mut self, layout: &PipelineResourceLayoutDesc) {
        for sampler in &layout.immutable_samplers {
            for stage in sampler.stages.stages() {
                self.immutable_samplers.push(ImmutableSamplerAttribs {
                    name: sampler.name.clone(),
                    desc: sampler.desc,
                    visibility: stage.into(),
                    shader_register: None,
                    array_size: 0,
                });
            }
        }
    }

    /// Assign the register of the immutable sampler matching `sampler_name` in `stage`
    pub fn init_immutable_sampler(
        &mut self,
        stage: ShaderStage,
        sampler_name: &str,
        combined_sampler_suffix: Option<&str>,
        attribs: &ShaderResourceAttribs,
    ) {
        let visibility = ShaderVisibility::from(stage);
        let sampler = self.immutable_samplers.iter_mut().find(|s| {
            s.visibility == visibility && streq_suff(sampler_name, &s.name, combined_sampler_suffix, false)
        });

        match sampler {
            Some(sampler) => {
                sampler.shader_register = Some(attribs.bind_point);
                sampler.array_size = attribs.bind_count;
            }
            None => engine_error!(LOG_SOURCE, "Unable to find immutable sampler '{}'", sampler_name),
        }
    }

    /// Place a resource and return its (root index, offset from table start)
    ///
    /// Non-array constant buffers get a root view of their own. Everything else
    /// is appended as a new range to the table of its stage and table type.
    pub fn allocate_resource_slot(
        &mut self,
        stage: ShaderStage,
        attribs: &ShaderResourceAttribs,
        var_type: VariableType,
        range_type: DescriptorRangeType,
    ) -> (u32, u32) {
        debug_assert!(self.desc.is_none(), "Root signature is already finalized");

        let visibility = ShaderVisibility::from(stage);

        if range_type == DescriptorRangeType::Cbv && attribs.bind_count == 1 {
            let root_index = self.num_root_params();
            self.views.push(RootView {
                root_index,
                visibility,
                var_type,
                shader_register: attribs.bind_point,
            });
            return (root_index, 0);
        }

        let table_type = if var_type == VariableType::Dynamic {
            VariableType::Dynamic
        } else {
            VariableType::Static
        };
        let heap_type = range_type.heap_type();
        let key = stage.index() * VariableType::COUNT + table_type.index();

        let existing = match heap_type {
            DescriptorHeapType::CbvSrvUav => self.cbv_srv_uav_table_map[key],
            DescriptorHeapType::Sampler => self.sampler_table_map[key],
        };
        let table_index = match existing {
            Some(index) => index,
            None => {
                let root_index = self.num_root_params();
                self.tables.push(RootTable {
                    root_index,
                    visibility,
                    var_type: table_type,
                    heap_type,
                    ranges: Vec::new(),
                });
                let index = self.tables.len() - 1;
                match heap_type {
                    DescriptorHeapType::CbvSrvUav => self.cbv_srv_uav_table_map[key] = Some(index),
                    DescriptorHeapType::Sampler => self.sampler_table_map[key] = Some(index),
                }
                index
            }
        };

        let table = &mut self.tables[table_index];
        let offset = table.size();
        table.ranges.push(DescriptorRange {
            range_type,
            num_descriptors: attribs.bind_count,
            base_shader_register: attribs.bind_point,
            register_space: 0,
            offset_from_table_start: offset,
        });
        (table.root_index, offset)
    }

    /// Compute totals, build the native description and the hash
    ///
    /// # Errors
    ///
    /// Returns `Error::InitializationFailed` if the root arguments exceed the
    /// 64-DWORD budget.
    pub fn finalize(&mut self) -> Result<()> {
        debug_assert!(self.desc.is_none(), "Root signature is already finalized");

        for table in &self.tables {
            let totals = match table.heap_type {
                DescriptorHeapType::CbvSrvUav => &mut self.total_cbv_srv_uav_slots,
                DescriptorHeapType::Sampler => &mut self.total_sampler_slots,
            };
            totals[table.var_type.index()] += table.size();
        }
        for view in &self.views {
            self.total_root_views[view.var_type.index()] += 1;
        }

        let mut parameters: Vec<Option<RootParameterDesc>> = vec![None; self.num_root_params() as usize];
        for table in &self.tables {
            parameters[table.root_index as usize] = Some(RootParameterDesc::DescriptorTable {
                visibility: table.visibility,
                ranges: table.ranges.clone(),
            });
        }
        for view in &self.views {
            parameters[view.root_index as usize] = Some(RootParameterDesc::ConstantBufferView {
                visibility: view.visibility,
                shader_register: view.shader_register,
                register_space: 0,
            });
        }
        let Some(parameters) = parameters.into_iter().collect::<Option<Vec<_>>>() else {
            engine_bail!(InitializationFailed => LOG_SOURCE, "Root signature has unassigned root parameters");
        };

        let mut static_samplers = Vec::new();
        for sampler in &self.immutable_samplers {
            // Samplers no shader resource picked up are not part of the signature
            let Some(register) = sampler.shader_register else {
                continue;
            };
            for element in 0..sampler.array_size {
                static_samplers.push(StaticSamplerDesc {
                    desc: sampler.desc,
                    shader_register: register + element,
                    register_space: 0,
                    visibility: sampler.visibility,
                });
            }
        }

        let desc = RootSignatureDesc { parameters, static_samplers };
        let dwords = desc.dword_cost();
        if dwords > MAX_ROOT_SIGNATURE_DWORDS {
            engine_bail!(InitializationFailed => LOG_SOURCE,
                "Root signature requires {} DWORDs ({} tables, {} root views), which exceeds the limit of {}",
                dwords, self.tables.len(), self.views.len(), MAX_ROOT_SIGNATURE_DWORDS);
        }

        let dynamic = VariableType::Dynamic.index();
        self.commit_mode = if self.total_cbv_srv_uav_slots[dynamic] > 0 || self.total_sampler_slots[dynamic] > 0 {
            CommitMode::WithDynamic
        } else {
            CommitMode::StaticMutable
        };

        let mut hash = HashBuilder::new()
            .add(&self.tables.len())
            .add(&self.views.len());
        for view in &self.views {
            hash = hash.add(view);
        }
        for table in &self.tables {
            hash = hash
                .add(&table.var_type)
                .add(&table.size())
                .add(&table.root_index)
                .add(&table.heap_type)
                .add(&table.visibility)
                .add(&table.ranges);
        }
        self.hash = hash.finish();
        self.desc = Some(desc);
        Ok(())
    }

    // ===== QUERIES =====

    pub fn is_finalized(&self) -> bool {
        self.desc.is_some()
    }

    /// Native description, available after `finalize`
    pub fn desc(&self) -> Option<&RootSignatureDesc> {
        self.desc.as_ref()
    }

    pub fn hash(&self) -> u64 {
        self.hash
    }

    pub fn commit_mode(&self) -> CommitMode {
        self.commit_mode
    }

    pub fn tables(&self) -> &[RootTable] {
        &self.tables
    }

    pub fn views(&self) -> &[RootView] {
        &self.views
    }

    pub fn total_cbv_srv_uav_slots(&self, var_type: VariableType) -> u32 {
        self.total_cbv_srv_uav_slots[var_type.index()]
    }

    pub fn total_sampler_slots(&self, var_type: VariableType) -> u32 {
        self.total_sampler_slots[var_type.index()]
    }

    pub fn total_root_views(&self, var_type: VariableType) -> u32 {
        self.total_root_views[var_type.index()]
    }

    /// Same tables and root views in the same order
    pub fn is_same_as(&self, other: &RootSignature) -> bool {
        self.tables == other.tables && self.views == other.views
    }

    /// Cache table sizes indexed by root index; a root view is one slot
    pub fn cache_table_sizes(&self) -> Vec<u32> {
        let mut sizes = vec![0u32; self.num_root_params() as usize];
        for table in &self.tables {
            sizes[table.root_index as usize] = table.size();
        }
        for view in &self.views {
            sizes[view.root_index as usize] = 1;
        }
        sizes
    }

    // ===== CACHE INITIALIZATION =====

    /// Size `cache` for this signature and give its non-dynamic tables shader-visible space
    ///
    /// # Errors
    ///
    /// Returns `Error::OutOfDescriptors` if the static region of a device heap
    /// cannot hold the static and mutable tables.
    pub fn init_resource_cache(&self, device: &D3D12Device, cache: &mut ShaderResourceCache) -> Result<()> {
        cache.initialize(&self.cache_table_sizes());

        let static_mutable = |totals: &[u32; VariableType::COUNT]| {
            totals[VariableType::Static.index()] + totals[VariableType::Mutable.index()]
        };
        let num_cbv_srv_uav = static_mutable(&self.total_cbv_srv_uav_slots);
        let num_samplers = static_mutable(&self.total_sampler_slots);

        let cbv_srv_uav_space = if num_cbv_srv_uav > 0 {
            let heap = device.gpu_descriptor_heap(DescriptorHeapType::CbvSrvUav);
            Some(heap.allocate(num_cbv_srv_uav).map_err(|_| engine_err!(OutOfDescriptors => LOG_SOURCE,
                "Failed to allocate {} GPU-visible CBV/SRV/UAV descriptor(s). Consider increasing cbv_srv_uav_static_size in D3D12DeviceConfig.",
                num_cbv_srv_uav))?)
        } else {
            None
        };

        let sampler_space = if num_samplers > 0 {
            let heap = device.gpu_descriptor_heap(DescriptorHeapType::Sampler);
            Some(heap.allocate(num_samplers).map_err(|_| engine_err!(OutOfDescriptors => LOG_SOURCE,
                "Failed to allocate {} GPU-visible Sampler descriptor(s). Consider using immutable samplers in the pipeline resource layout or increasing sampler_static_size in D3D12DeviceConfig.",
                num_samplers))?)
        } else {
            None
        };

        let mut heap_offsets = [0u32; DescriptorHeapType::COUNT];
        for table in self.tables.iter().filter(|t| !t.is_dynamic()) {
            let offset = &mut heap_offsets[table.heap_type.index()];
            cache.set_table_heap_offset(table.root_index, *offset);
            *offset += table.size();
        }
        debug_assert_eq!(heap_offsets[DescriptorHeapType::CbvSrvUav.index()], num_cbv_srv_uav);
        debug_assert_eq!(heap_offsets[DescriptorHeapType::Sampler.index()], num_samplers);

        cache.set_descriptor_heap_space(cbv_srv_uav_space, sampler_space);
        Ok(())
    }

    // ===== COMMIT =====

    /// Set every descriptor table of `cache` on the context
    ///
    /// Dynamic tables are copied to descriptors allocated from the context for
    /// this draw only. Static and mutable tables point at the cache's own space.
    pub fn commit_descriptor_handles(
        &self,
        ctx: &mut D3D12DeviceContext,
        cache: &ShaderResourceCache,
        is_compute: bool,
        transition: bool,
        validate: bool,
    ) -> Result<()> {
        match self.commit_mode {
            CommitMode::StaticMutable => self.commit_tables(ctx, cache, is_compute, transition, validate, false),
            CommitMode::WithDynamic => self.commit_tables(ctx, cache, is_compute, transition, validate, true),
        }
    }

    fn commit_tables(
        &self,
        ctx: &mut D3D12DeviceContext,
        cache: &ShaderResourceCache,
        is_compute: bool,
        transition: bool,
        validate: bool,
        with_dynamic: bool,
    ) -> Result<()> {
        let dynamic = VariableType::Dynamic.index();
        let mut dynamic_ranges = [None, None];
        if with_dynamic {
            for heap_type in DescriptorHeapType::ALL {
                let count = match heap_type {
                    DescriptorHeapType::CbvSrvUav => self.total_cbv_srv_uav_slots[dynamic],
                    DescriptorHeapType::Sampler => self.total_sampler_slots[dynamic],
                };
                if count > 0 {
                    let range = ctx.allocate_dynamic_descriptors(heap_type, count).map_err(|_| engine_err!(
                        OutOfDescriptors => LOG_SOURCE,
                        "Failed to allocate {} dynamic GPU-visible {} descriptor(s). Consider increasing the dynamic heap size or dynamic_descriptor_chunk_size in D3D12DeviceConfig.",
                        count, heap_type.as_str()))?;
                    dynamic_ranges[heap_type.index()] = Some(range);
                }
            }
        }

        let uses_heap = |heap_type: DescriptorHeapType| self.tables.iter().any(|t| t.heap_type == heap_type);
        let uses_cbv_srv_uav = uses_heap(DescriptorHeapType::CbvSrvUav);
        let uses_samplers = uses_heap(DescriptorHeapType::Sampler);
        if uses_cbv_srv_uav || uses_samplers {
            ctx.command_list_mut().set_descriptor_heaps(uses_cbv_srv_uav, uses_samplers);
        }

        let mut dynamic_offsets = [0u32; DescriptorHeapType::COUNT];
        for table in &self.tables {
            let heap = table.heap_type.index();
            let is_dynamic = table.is_dynamic();
            let dynamic_range = if is_dynamic { dynamic_ranges[heap].as_ref() } else { None };

            let handle = match dynamic_range {
                Some(range) => range.gpu_handle(dynamic_offsets[heap]),
                None if is_dynamic => {
                    engine_bail!(LOG_SOURCE, "No dynamic descriptors were allocated for root table {}", table.root_index);
                }
                None => cache.table_gpu_handle(table.root_index, table.heap_type).ok_or_else(|| engine_err!(
                    LOG_SOURCE,
                    "Root table {} has no shader-visible descriptor space. Was the cache initialized by this root signature?",
                    table.root_index))?,
            };
            ctx.command_list_mut().set_root_descriptor_table(is_compute, table.root_index, handle);
            ctx.stats_mut().tables_committed += 1;

            if !(transition || validate || is_dynamic) {
                continue;
            }

            for range in &table.ranges {
                for element in 0..range.num_descriptors {
                    let offset = range.offset_from_table_start + element;
                    let res = cache.resource(table.root_index, offset);

                    if transition {
                        transition_resource(ctx.command_list_mut(), res);
                    } else if validate {
                        #[cfg(feature = "validation")]
                        verify_resource_state(res, table.root_index, offset);
                    }

                    if let Some(range) = dynamic_range {
                        match res.cpu_handle {
                            Some(cpu_handle) => {
                                range.copy_from(dynamic_offsets[heap], Some(cpu_handle));
                                ctx.stats_mut().descriptors_copied += 1;
                            }
                            None => match table.heap_type {
                                DescriptorHeapType::CbvSrvUav => engine_error!(LOG_SOURCE,
                                    "No valid CbvSrvUav descriptor handle found for root parameter {}, descriptor slot {}",
                                    table.root_index, offset),
                                DescriptorHeapType::Sampler => engine_error!(LOG_SOURCE,
                                    "No valid sampler descriptor handle found for root parameter {}, descriptor slot {}",
                                    table.root_index, offset),
                            },
                        }
                        dynamic_offsets[heap] += 1;
                    }
                }
            }
        }

        debug_assert!(!with_dynamic || dynamic_offsets[DescriptorHeapType::CbvSrvUav.index()] == self.total_cbv_srv_uav_slots[dynamic]);
        debug_assert!(!with_dynamic || dynamic_offsets[DescriptorHeapType::Sampler.index()] == self.total_sampler_slots[dynamic]);
        Ok(())
    }

    /// Set root constant buffer views
    ///
    /// Dynamic buffers take the address of their mapping in the current frame;
    /// other buffers are transitioned or verified first.
    ///
    /// # Errors
    ///
    /// Returns `Error::StaleFrame` if a dynamic buffer has not been mapped in
    /// the current frame.
    #[allow(clippy::too_many_arguments)]
    pub fn commit_root_views(
        &self,
        cache: &ShaderResourceCache,
        ctx: &mut D3D12DeviceContext,
        is_compute: bool,
        process_dynamic: bool,
        process_non_dynamic: bool,
        transition: bool,
        validate: bool,
    ) -> Result<()> {
        for view in &self.views {
            let res = cache.resource(view.root_index, 0);
            let Some(buffer) = res.object.as_ref().and_then(DeviceObject::as_buffer) else {
                continue;
            };

            let address = if buffer.is_dynamic() {
                if !process_dynamic {
                    continue;
                }
                ctx.dynamic_buffer_address(buffer)?
            } else {
                if !process_non_dynamic {
                    continue;
                }
                if transition {
                    if buffer.is_in_known_state() && !buffer.check_state(ResourceState::CONSTANT_BUFFER) {
                        ctx.command_list_mut().transition_buffer(buffer, ResourceState::CONSTANT_BUFFER);
                    }
                } else if validate {
                    #[cfg(feature = "validation")]
                    verify_resource_state(res, view.root_index, 0);
                }
                GpuVirtualAddress::for_buffer(buffer)
            };

            ctx.command_list_mut().set_root_constant_buffer_view(is_compute, view.root_index, address);
            ctx.stats_mut().root_views_committed += 1;
        }
        Ok(())
    }

    /// Transition every bound resource of `cache` to the state its slot requires
    pub fn transition_resources(&self, cache: &ShaderResourceCache, command_list: &mut CommandList) {
        for table in &self.tables {
            for range in &table.ranges {
                for element in 0..range.num_descriptors {
                    let res = cache.resource(table.root_index, range.offset_from_table_start + element);
                    transition_resource(command_list, res);
                }
            }
        }
        for view in &self.views {
            let res = cache.resource(view.root_index, 0);
            if !res.is_dynamic_buffer() {
                transition_resource(command_list, res);
            }
        }
    }
}

// ============================================================================
// Resource states
// ============================================================================

/// Record the transition `res` needs, if its state is tracked
///
/// UAVs are always transitioned, which records a UAV barrier when the
/// resource is already in the UAV state.
fn transition_resource(command_list: &mut CommandList, res: &CachedResource) {
    let (Some(kind), Some(object)) = (res.kind, res.object.as_ref()) else {
        return;
    };

    match (kind, object) {
        (ShaderResourceKind::ConstantBuffer, DeviceObject::Buffer(buffer)) => {
            if buffer.is_in_known_state() && !buffer.check_state(ResourceState::CONSTANT_BUFFER) {
                command_list.transition_buffer(buffer, ResourceState::CONSTANT_BUFFER);
            }
        }
        (ShaderResourceKind::BufferSrv, DeviceObject::BufferView(view)) => {
            let buffer = view.buffer();
            if buffer.is_in_known_state() && !buffer.check_state(ResourceState::SHADER_RESOURCE) {
                command_list.transition_buffer(buffer, ResourceState::SHADER_RESOURCE);
            }
        }
        (ShaderResourceKind::BufferUav, DeviceObject::BufferView(view)) => {
            let buffer = view.buffer();
            if buffer.is_in_known_state() {
                command_list.transition_buffer(buffer, ResourceState::UNORDERED_ACCESS);
            }
        }
        (ShaderResourceKind::TextureSrv, DeviceObject::TextureView(view)) => {
            let texture = view.texture();
            if texture.is_in_known_state() && !texture.check_state(ResourceState::SHADER_RESOURCE) {
                command_list.transition_texture(texture, ResourceState::SHADER_RESOURCE);
            }
        }
        (ShaderResourceKind::TextureUav, DeviceObject::TextureView(view)) => {
            let texture = view.texture();
            if texture.is_in_known_state() {
                command_list.transition_texture(texture, ResourceState::UNORDERED_ACCESS);
            }
        }
        _ => {}
    }
}

/// Report a tracked resource that is not in the state its slot requires
#[cfg(feature = "validation")]
fn verify_resource_state(res: &CachedResource, root_index: u32, offset: u32) {
    let (Some(kind), Some(object)) = (res.kind, res.object.as_ref()) else {
        return;
    };

    const HINT: &str = "Call D3D12DeviceContext::transition_shader_resources(), use ResourceStateTransitionMode::Transition when committing shader resources, or transition the resource explicitly.";

    match (kind, object) {
        (ShaderResourceKind::ConstantBuffer, DeviceObject::Buffer(buffer)) => {
            if buffer.is_in_known_state() && !buffer.check_state(ResourceState::CONSTANT_BUFFER) {
                engine_error!(LOG_SOURCE,
                    "Buffer '{}' must be in RESOURCE_STATE_CONSTANT_BUFFER state. Actual state: {:?}. {}",
                    buffer.name(), buffer.state(), HINT);
            }
        }
        (ShaderResourceKind::BufferSrv, DeviceObject::BufferView(view)) => {
            let buffer = view.buffer();
            if buffer.is_in_known_state() && !buffer.check_state(ResourceState::SHADER_RESOURCE) {
                engine_error!(LOG_SOURCE,
                    "Buffer '{}' must be in RESOURCE_STATE_SHADER_RESOURCE state. Actual state: {:?}. {}",
                    buffer.name(), buffer.state(), HINT);
            }
        }
        (ShaderResourceKind::BufferUav, DeviceObject::BufferView(view)) => {
            let buffer = view.buffer();
            if buffer.is_in_known_state() && !buffer.check_state(ResourceState::UNORDERED_ACCESS) {
                engine_error!(LOG_SOURCE,
                    "Buffer '{}' must be in RESOURCE_STATE_UNORDERED_ACCESS state. Actual state: {:?}. {}",
                    buffer.name(), buffer.state(), HINT);
            }
        }
        (ShaderResourceKind::TextureSrv, DeviceObject::TextureView(view)) => {
            let texture = view.texture();
            if texture.is_in_known_state() && !texture.check_state(ResourceState::SHADER_RESOURCE) {
                engine_error!(LOG_SOURCE,
                    "Texture '{}' must be in RESOURCE_STATE_SHADER_RESOURCE state. Actual state: {:?}. {}",
                    texture.name(), texture.state(), HINT);
            }
        }
        (ShaderResourceKind::TextureUav, DeviceObject::TextureView(view)) => {
            let texture = view.texture();
            if texture.is_in_known_state() && !texture.check_state(ResourceState::UNORDERED_ACCESS) {
                engine_error!(LOG_SOURCE,
                    "Texture '{}' must be in RESOURCE_STATE_UNORDERED_ACCESS state. Actual state: {:?}. {}",
                    texture.name(), texture.state(), HINT);
            }
        }
        (ShaderResourceKind::Sampler, _) => {}
        _ => engine_error!(LOG_SOURCE,
            "Unexpected {} bound to root parameter {}, descriptor slot {}",
            object.type_name(), root_index, offset),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "root_signature_tests.rs"]
mod tests;
