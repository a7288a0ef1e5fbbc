/// ShaderResourceLayout - placement of the resources of one shader stage
///
/// A layout assigns every resource of a stage a variable type and a slot. Two
/// arrays are kept, CBV/SRV/UAV resources and samplers, each grouped by
/// variable type so that the n-th resource of a given type is found by index.
///
/// A layout is built against one of two targets:
/// - a root signature, which hands out root indices and table offsets
///   (reference layouts used by pipelines and resource bindings);
/// - a static resource cache, which uses four fixed tables indexed by range
///   type with the bind point as offset (static layouts of pipelines).

use crate::d3d12_types::{CpuDescriptorHandle, DescriptorRangeType};
use crate::root_signature::RootSignature;
use crate::shader_resource_cache::{CachedResource, ShaderResourceCache};
use prism_binding::prism::layout::{PipelineResourceLayoutDesc, VariableType, VariableTypeFlags};
use prism_binding::prism::resource::{BindFlags, BufferViewType, DeviceObject, TextureViewType};
use prism_binding::prism::shader::{ShaderResourceAttribs, ShaderResourceKind, ShaderResources, ShaderStage};
use prism_binding::prism::Result;
use prism_binding::{engine_bail, engine_error, engine_trace};

#[cfg(feature = "validation")]
use prism_binding::engine_warn;

const LOG_SOURCE: &str = "prism::d3d12::ShaderResourceLayout";

/// Placement record of one shader resource
#[derive(Debug, Clone)]
pub struct D3D12Resource {
    attribs: ShaderResourceAttribs,
    var_type: VariableType,
    range_type: DescriptorRangeType,
    root_index: u32,
    offset_from_table_start: u32,
    /// Index into the layout's samplers of the sampler combined with this texture
    sampler_index: Option<usize>,
}

impl D3D12Resource {
    pub fn attribs(&self) -> &ShaderResourceAttribs {
        &self.attribs
    }

    pub fn name(&self) -> &str {
        &self.attribs.name
    }

    pub fn var_type(&self) -> VariableType {
        self.var_type
    }

    pub fn range_type(&self) -> DescriptorRangeType {
        self.range_type
    }

    pub fn root_index(&self) -> u32 {
        self.root_index
    }

    pub fn offset_from_table_start(&self) -> u32 {
        self.offset_from_table_start
    }

    pub fn has_assigned_sampler(&self) -> bool {
        self.sampler_index.is_some()
    }
}

/// Index of a resource in a layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceRef {
    CbvSrvUav(usize),
    Sampler(usize),
}

/// Where a layout places its resources
pub enum LayoutTarget<'a> {
    RootSignature(&'a mut RootSignature),
    StaticCache(&'a mut ShaderResourceCache),
}

struct Placement<'a> {
    target: LayoutTarget<'a>,
    static_table_sizes: [u32; DescriptorRangeType::COUNT],
}

impl Placement<'_> {
    fn place(
        &mut self,
        stage: ShaderStage,
        attribs: &ShaderResourceAttribs,
        var_type: VariableType,
        range_type: DescriptorRangeType,
    ) -> (u32, u32) {
        match &mut self.target {
            LayoutTarget::RootSignature(root_sig) => root_sig.allocate_resource_slot(stage, attribs, var_type, range_type),
            LayoutTarget::StaticCache(_) => {
                let table = range_type.index();
                let size = &mut self.static_table_sizes[table];
                *size = (*size).max(attribs.bind_point + attribs.bind_count);
                (table as u32, attribs.bind_point)
            }
        }
    }

    /// Place `attribs` and record it in the bucket of its variable type
    fn add(
        &mut self,
        buckets: &mut [Vec<D3D12Resource>; VariableType::COUNT],
        stage: ShaderStage,
        attribs: &ShaderResourceAttribs,
        var_type: VariableType,
        sampler_index: Option<usize>,
    ) {
        let range_type = DescriptorRangeType::for_kind(attribs.kind);
        let (root_index, offset) = self.place(stage, attribs, var_type, range_type);
        buckets[var_type.index()].push(D3D12Resource {
            attribs: attribs.clone(),
            var_type,
            range_type,
            root_index,
            offset_from_table_start: offset,
            sampler_index,
        });
    }

    fn init_immutable_sampler(&mut self, stage: ShaderStage, attribs: &ShaderResourceAttribs, suffix: Option<&str>) {
        if let LayoutTarget::RootSignature(root_sig) = &mut self.target {
            root_sig.init_immutable_sampler(stage, &attribs.name, suffix, attribs);
        }
    }

    fn finish(self) {
        if let LayoutTarget::StaticCache(cache) = self.target {
            cache.initialize(&self.static_table_sizes);
        }
    }
}

/// Flatten per-type buckets and return the start of every type plus the end
fn flatten(buckets: [Vec<D3D12Resource>; VariableType::COUNT]) -> (Vec<D3D12Resource>, [usize; VariableType::COUNT + 1]) {
    let mut offsets = [0usize; VariableType::COUNT + 1];
    let mut resources = Vec::with_capacity(buckets.iter().map(Vec::len).sum());
    for (index, bucket) in buckets.into_iter().enumerate() {
        resources.extend(bucket);
        offsets[index + 1] = resources.len();
    }
    (resources, offsets)
}

/// Resource layout of one shader stage
#[derive(Debug)]
pub struct ShaderResourceLayout {
    shader_name: String,
    stage: ShaderStage,
    combined_sampler_suffix: Option<String>,
    cbv_srv_uav: Vec<D3D12Resource>,
    cbv_srv_uav_offsets: [usize; VariableType::COUNT + 1],
    samplers: Vec<D3D12Resource>,
    sampler_offsets: [usize; VariableType::COUNT + 1],
}

impl ShaderResourceLayout {
    /// Place every resource of `resources` whose variable type is in `allowed`
    ///
    /// Constant buffers are placed first, then samplers, then texture SRVs,
    /// texture UAVs, buffer SRVs and buffer UAVs. Samplers covered by an
    /// immutable sampler are registered with the root signature and get no slot.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidResource` if a texture and the sampler combined
    /// with it resolve to different variable types.
    pub fn new(
        target: LayoutTarget<'_>,
        resources: &ShaderResources,
        layout_desc: &PipelineResourceLayoutDesc,
        allowed: VariableTypeFlags,
    ) -> Result<Self> {
        let stage = resources.stage();
        let suffix = resources.combined_sampler_suffix();
        let var_type_of = |attribs: &ShaderResourceAttribs| layout_desc.find_variable_type(stage, attribs, suffix);
        let is_immutable = |attribs: &ShaderResourceAttribs| {
            layout_desc.find_immutable_sampler(stage, &attribs.name, suffix).is_some()
        };

        let mut placement = Placement {
            target,
            static_table_sizes: [0; DescriptorRangeType::COUNT],
        };
        let mut cbv_srv_uav_buckets: [Vec<D3D12Resource>; VariableType::COUNT] = Default::default();
        let mut sampler_buckets: [Vec<D3D12Resource>; VariableType::COUNT] = Default::default();

        for cb in resources.of_kind(ShaderResourceKind::ConstantBuffer) {
            let var_type = var_type_of(cb);
            if allowed.contains_type(var_type) {
                placement.add(&mut cbv_srv_uav_buckets, stage, cb, var_type, None);
            }
        }

        for sampler in resources.of_kind(ShaderResourceKind::Sampler) {
            let var_type = var_type_of(sampler);
            if !allowed.contains_type(var_type) {
                continue;
            }
            if is_immutable(sampler) {
                placement.init_immutable_sampler(stage, sampler, suffix);
                continue;
            }
            placement.add(&mut sampler_buckets, stage, sampler, var_type, None);
        }
        let (samplers, sampler_offsets) = flatten(sampler_buckets);

        for tex in resources.of_kind(ShaderResourceKind::TextureSrv) {
            let var_type = var_type_of(tex);
            if !allowed.contains_type(var_type) {
                continue;
            }

            let mut sampler_index = None;
            if let Some(assigned) = resources.find_assigned_sampler(tex) {
                let sampler = &resources.of_kind(ShaderResourceKind::Sampler)[assigned];
                let sampler_var_type = var_type_of(sampler);
                if sampler_var_type != var_type {
                    engine_bail!(InvalidResource => LOG_SOURCE,
                        "The type ({}) of texture SRV variable '{}' is not consistent with the type ({}) of the sampler '{}' that is assigned to it",
                        var_type.as_str(), tex.name, sampler_var_type.as_str(), sampler.name);
                }
                if !is_immutable(sampler) {
                    sampler_index = samplers.iter().position(|s| s.attribs.name == sampler.name);
                    debug_assert!(sampler_index.is_some(), "Sampler '{}' is not placed in the layout", sampler.name);
                }
            }
            placement.add(&mut cbv_srv_uav_buckets, stage, tex, var_type, sampler_index);
        }

        for kind in [ShaderResourceKind::TextureUav, ShaderResourceKind::BufferSrv, ShaderResourceKind::BufferUav] {
            for res in resources.of_kind(kind) {
                let var_type = var_type_of(res);
                if allowed.contains_type(var_type) {
                    placement.add(&mut cbv_srv_uav_buckets, stage, res, var_type, None);
                }
            }
        }

        placement.finish();
        let (cbv_srv_uav, cbv_srv_uav_offsets) = flatten(cbv_srv_uav_buckets);

        engine_trace!(LOG_SOURCE, "Shader '{}' ({}): {} CBV/SRV/UAV and {} sampler slot(s)",
            resources.shader_name(), stage.as_str(), cbv_srv_uav.len(), samplers.len());

        Ok(Self {
            shader_name: resources.shader_name().to_string(),
            stage,
            combined_sampler_suffix: suffix.map(str::to_string),
            cbv_srv_uav,
            cbv_srv_uav_offsets,
            samplers,
            sampler_offsets,
        })
    }

    // ===== ACCESSORS =====

    pub fn shader_name(&self) -> &str {
        &self.shader_name
    }

    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    pub fn is_using_combined_samplers(&self) -> bool {
        self.combined_sampler_suffix.is_some()
    }

    pub fn cbv_srv_uav_count(&self, var_type: VariableType) -> usize {
        self.cbv_srv_uav_offsets[var_type.index() + 1] - self.cbv_srv_uav_offsets[var_type.index()]
    }

    pub fn sampler_count(&self, var_type: VariableType) -> usize {
        self.sampler_offsets[var_type.index() + 1] - self.sampler_offsets[var_type.index()]
    }

    pub fn total_cbv_srv_uav_count(&self) -> usize {
        self.cbv_srv_uav.len()
    }

    pub fn total_sampler_count(&self) -> usize {
        self.samplers.len()
    }

    /// The `r`-th CBV/SRV/UAV resource of `var_type`
    pub fn cbv_srv_uav(&self, var_type: VariableType, r: usize) -> &D3D12Resource {
        debug_assert!(r < self.cbv_srv_uav_count(var_type));
        &self.cbv_srv_uav[self.cbv_srv_uav_offsets[var_type.index()] + r]
    }

    /// The `s`-th sampler of `var_type`
    pub fn sampler(&self, var_type: VariableType, s: usize) -> &D3D12Resource {
        debug_assert!(s < self.sampler_count(var_type));
        &self.samplers[self.sampler_offsets[var_type.index()] + s]
    }

    pub(crate) fn cbv_srv_uav_ref(&self, var_type: VariableType, r: usize) -> ResourceRef {
        ResourceRef::CbvSrvUav(self.cbv_srv_uav_offsets[var_type.index()] + r)
    }

    pub(crate) fn sampler_ref(&self, var_type: VariableType, s: usize) -> ResourceRef {
        ResourceRef::Sampler(self.sampler_offsets[var_type.index()] + s)
    }

    pub fn resource(&self, res_ref: ResourceRef) -> &D3D12Resource {
        match res_ref {
            ResourceRef::CbvSrvUav(index) => &self.cbv_srv_uav[index],
            ResourceRef::Sampler(index) => &self.samplers[index],
        }
    }

    /// Sampler combined with the texture `res`
    pub fn assigned_sampler(&self, res: &D3D12Resource) -> Option<&D3D12Resource> {
        res.sampler_index.map(|index| &self.samplers[index])
    }

    /// Resource named `name`, searching CBV/SRV/UAV resources before samplers
    pub fn find(&self, name: &str) -> Option<&D3D12Resource> {
        self.cbv_srv_uav.iter().chain(self.samplers.iter()).find(|r| r.attribs.name == name)
    }

    // ===== BINDING =====

    /// Bind `object` to element `array_index` of `res` in `cache`
    ///
    /// `None` resets the element. Type mismatches and attempts to rebind a
    /// non-dynamic variable are logged and leave the slot unchanged.
    pub fn bind_resource(
        &self,
        res: &D3D12Resource,
        object: Option<&DeviceObject>,
        array_index: u32,
        cache: &mut ShaderResourceCache,
    ) {
        debug_assert!(array_index < res.attribs.bind_count, "Array index is out of range");

        let Some(object) = object else {
            self.reset_resource(res, array_index, cache);
            return;
        };

        if !self.check_object(res, object, array_index) {
            return;
        }

        let cached = CachedResource {
            kind: Some(res.attribs.kind),
            cpu_handle: CpuDescriptorHandle::for_object(object),
            object: Some(object.clone()),
        };
        if !self.cache_object(res, array_index, cached, cache) {
            return;
        }

        let (Some(sampler_res), Some(view)) = (self.assigned_sampler(res), object.as_texture_view()) else {
            return;
        };
        debug_assert!(sampler_res.attribs.bind_count == 1 || sampler_res.attribs.bind_count == res.attribs.bind_count);
        let sampler_array_index = if sampler_res.attribs.bind_count > 1 { array_index } else { 0 };

        match view.sampler() {
            Some(sampler) => {
                let sampler = DeviceObject::Sampler(sampler);
                let cached = CachedResource {
                    kind: Some(ShaderResourceKind::Sampler),
                    cpu_handle: CpuDescriptorHandle::for_object(&sampler),
                    object: Some(sampler),
                };
                self.cache_object(sampler_res, sampler_array_index, cached, cache);
            }
            None => engine_error!(LOG_SOURCE,
                "Failed to bind sampler to variable '{}'. Sampler is not set in the texture view '{}'",
                sampler_res.attribs.print_name(sampler_array_index), view.name()),
        }
    }

    /// Check that `object` can be bound to `res`
    fn check_object(&self, res: &D3D12Resource, object: &DeviceObject, array_index: u32) -> bool {
        let var_name = res.attribs.print_name(array_index);
        let type_error = |expected: &str| {
            engine_error!(LOG_SOURCE,
                "Failed to bind resource '{}' to variable '{}' in shader '{}'. Invalid resource type: {} is expected.",
                object.name(), var_name, self.shader_name, expected);
            false
        };
        let view_type_error = |expected: &dyn std::fmt::Debug, actual: &dyn std::fmt::Debug| {
            engine_error!(LOG_SOURCE,
                "Failed to bind resource '{}' to variable '{}' in shader '{}'. Incorrect view type: {:?} is expected, {:?} provided.",
                object.name(), var_name, self.shader_name, expected, actual);
            false
        };

        match res.attribs.kind {
            ShaderResourceKind::ConstantBuffer => match object.as_buffer() {
                Some(buffer) if !buffer.desc().bind_flags.contains(BindFlags::UNIFORM_BUFFER) => {
                    engine_error!(LOG_SOURCE,
                        "Failed to bind buffer '{}' to variable '{}' in shader '{}'. The buffer was not created with BindFlags::UNIFORM_BUFFER flag.",
                        buffer.name(), var_name, self.shader_name);
                    false
                }
                Some(_) => true,
                None => type_error("buffer"),
            },
            ShaderResourceKind::TextureSrv | ShaderResourceKind::TextureUav => {
                let expected = if res.attribs.kind == ShaderResourceKind::TextureSrv {
                    TextureViewType::ShaderResource
                } else {
                    TextureViewType::UnorderedAccess
                };
                match object.as_texture_view() {
                    Some(view) if view.view_type() != expected => view_type_error(&expected, &view.view_type()),
                    Some(_) => true,
                    None => type_error("texture view"),
                }
            }
            ShaderResourceKind::BufferSrv | ShaderResourceKind::BufferUav => {
                let expected = if res.attribs.kind == ShaderResourceKind::BufferSrv {
                    BufferViewType::ShaderResource
                } else {
                    BufferViewType::UnorderedAccess
                };
                match object.as_buffer_view() {
                    Some(view) if view.view_type() != expected => view_type_error(&expected, &view.view_type()),
                    Some(_) => true,
                    None => type_error("buffer view"),
                }
            }
            ShaderResourceKind::Sampler => {
                if self.is_using_combined_samplers() {
                    engine_error!(LOG_SOURCE,
                        "Sampler '{}' cannot be bound to variable '{}' in shader '{}': samplers are combined with textures. Set the sampler in the texture view instead.",
                        object.name(), var_name, self.shader_name);
                    return false;
                }
                match object.as_sampler() {
                    Some(_) => true,
                    None => type_error("sampler"),
                }
            }
        }
    }

    /// Store `cached` unless a non-dynamic slot is already bound
    ///
    /// Returns whether the slot was written.
    fn cache_object(&self, res: &D3D12Resource, array_index: u32, cached: CachedResource, cache: &mut ShaderResourceCache) -> bool {
        let offset = res.offset_from_table_start + array_index;
        let dst = cache.resource(res.root_index, offset);

        if res.var_type != VariableType::Dynamic && dst.is_bound() {
            if dst.object != cached.object {
                let what = if res.attribs.kind == ShaderResourceKind::Sampler { "sampler" } else { "resource" };
                engine_error!(LOG_SOURCE,
                    "Non-null {} is already bound to {} shader variable '{}' in shader '{}'. Attempting to bind another resource ('{}') is an error and may cause unpredicted behavior. Use another shader resource binding instance or label the variable as dynamic.",
                    what, res.var_type.as_str(), res.attribs.print_name(array_index), self.shader_name,
                    cached.object.as_ref().map_or("", DeviceObject::name));
            }
            return false;
        }

        cache.set_resource(res.root_index, offset, res.range_type.heap_type(), cached);
        true
    }

    fn reset_resource(&self, res: &D3D12Resource, array_index: u32, cache: &mut ShaderResourceCache) {
        let offset = res.offset_from_table_start + array_index;
        if res.var_type != VariableType::Dynamic && cache.resource(res.root_index, offset).is_bound() {
            engine_error!(LOG_SOURCE,
                "Shader variable '{}' in shader '{}' is not dynamic but is being reset to null. This is an error and may cause unpredicted behavior. Use another shader resource binding instance or label the variable as dynamic if you need to bind another resource.",
                res.attribs.print_name(array_index), self.shader_name);
        }
        cache.clear_resource(res.root_index, offset);

        if let Some(sampler_res) = self.assigned_sampler(res) {
            let sampler_array_index = if sampler_res.attribs.bind_count > 1 { array_index } else { 0 };
            let sampler_offset = sampler_res.offset_from_table_start + sampler_array_index;
            if sampler_res.var_type != VariableType::Dynamic && cache.resource(sampler_res.root_index, sampler_offset).is_bound() {
                engine_error!(LOG_SOURCE,
                    "Sampler variable '{}' in shader '{}' is not dynamic but is being reset to null. This is an error and may cause unpredicted behavior. Use another shader resource binding instance or label the variable as dynamic if you need to bind another sampler.",
                    sampler_res.attribs.print_name(sampler_array_index), self.shader_name);
            }
            cache.clear_resource(sampler_res.root_index, sampler_offset);
        }
    }

    /// Whether element `array_index` of `res` holds an object in `cache`
    pub fn is_bound(&self, res: &D3D12Resource, array_index: u32, cache: &ShaderResourceCache) -> bool {
        cache
            .try_resource(res.root_index, res.offset_from_table_start + array_index)
            .map_or(false, CachedResource::is_bound)
    }

    // ===== STATIC RESOURCES =====

    /// Copy the static resources of `dst_layout` from this static layout's cache
    ///
    /// Every static element of `dst_layout` is looked up in `src_cache` by
    /// range type and bind point. Elements with nothing bound are reported and
    /// skipped; the rest are copied unless the destination already holds the
    /// same object.
    pub fn copy_static_resource_desc_handles(
        &self,
        src_cache: &ShaderResourceCache,
        dst_layout: &ShaderResourceLayout,
        dst_cache: &mut ShaderResourceCache,
    ) {
        let copy = |res: &D3D12Resource, dst_cache: &mut ShaderResourceCache, is_sampler: bool| {
            for element in 0..res.attribs.bind_count {
                let src_root = res.range_type.index() as u32;
                let src = src_cache
                    .try_resource(src_root, res.attribs.bind_point + element)
                    .filter(|src| src.is_bound());
                let Some(src) = src else {
                    if is_sampler {
                        engine_error!(LOG_SOURCE, "No sampler assigned to static shader variable '{}' in shader '{}'.",
                            res.attribs.print_name(element), self.shader_name);
                    } else {
                        engine_error!(LOG_SOURCE, "No resource is assigned to static shader variable '{}' in shader '{}'.",
                            res.attribs.print_name(element), self.shader_name);
                    }
                    continue;
                };

                let dst_offset = res.offset_from_table_start + element;
                if dst_cache.resource(res.root_index, dst_offset).object != src.object {
                    dst_cache.set_resource(res.root_index, dst_offset, res.range_type.heap_type(), src.clone());
                }
            }
        };

        for r in 0..dst_layout.cbv_srv_uav_count(VariableType::Static) {
            copy(dst_layout.cbv_srv_uav(VariableType::Static, r), dst_cache, false);
        }
        for s in 0..dst_layout.sampler_count(VariableType::Static) {
            copy(dst_layout.sampler(VariableType::Static, s), dst_cache, true);
        }
    }

    // ===== VALIDATION =====

    /// Report every element of this layout that has nothing bound in `cache`
    ///
    /// Also reports texture arrays sharing one sampler whose views carry
    /// different samplers. Returns true if no problem was found.
    #[cfg(feature = "validation")]
    pub fn verify_bindings(&self, cache: &ShaderResourceCache) -> bool {
        let mut ok = true;

        for res in &self.cbv_srv_uav {
            for element in 0..res.attribs.bind_count {
                let slot = cache.resource(res.root_index, res.offset_from_table_start + element);
                let has_descriptor = slot.cpu_handle.is_some()
                    || (res.attribs.kind == ShaderResourceKind::ConstantBuffer && slot.is_dynamic_buffer());
                if !slot.is_bound() || !has_descriptor {
                    engine_error!(LOG_SOURCE, "No resource is bound to {} variable '{}' in shader '{}'",
                        res.var_type.as_str(), res.attribs.print_name(element), self.shader_name);
                    ok = false;
                }

                let Some(sampler_res) = self.assigned_sampler(res) else {
                    continue;
                };
                if sampler_res.attribs.bind_count != 1 || res.attribs.bind_count == 1 {
                    continue;
                }
                let bound_sampler = cache.resource(sampler_res.root_index, sampler_res.offset_from_table_start).object.clone();
                let view_sampler = slot.object.as_ref()
                    .and_then(DeviceObject::as_texture_view)
                    .and_then(|view| view.sampler())
                    .map(DeviceObject::Sampler);
                if let (Some(bound), Some(from_view)) = (bound_sampler, view_sampler) {
                    if bound != from_view {
                        engine_warn!(LOG_SOURCE,
                            "All elements of texture array '{}' in shader '{}' share the same sampler. However, the sampler set in view for element {} does not match bound sampler. This may cause incorrect behavior on GL platform.",
                            res.attribs.name, self.shader_name, element);
                    }
                }
            }
        }

        for res in &self.samplers {
            for element in 0..res.attribs.bind_count {
                let slot = cache.resource(res.root_index, res.offset_from_table_start + element);
                if slot.is_bound() {
                    continue;
                }
                ok = false;
                match self.combined_sampler_suffix.as_deref() {
                    Some(suffix) => {
                        let texture_name = res.attribs.name.strip_suffix(suffix).unwrap_or(res.attribs.name.as_str());
                        engine_error!(LOG_SOURCE, "No sampler is assigned to texture variable '{}' in shader '{}'",
                            texture_name, self.shader_name);
                    }
                    None => engine_error!(LOG_SOURCE, "No sampler is bound to sampler variable '{}' in shader '{}'",
                        res.attribs.print_name(element), self.shader_name),
                }
            }
        }

        ok
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "shader_resource_layout_tests.rs"]
mod tests;
