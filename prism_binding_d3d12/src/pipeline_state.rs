/// D3D12PipelineState - binding contract of a set of shader stages
///
/// A pipeline state builds, for every stage, a reference layout through its
/// root signature and a static layout with its own static cache. The static
/// caches hold what the application binds to static variables; resource
/// bindings copy from them when their static resources are initialized.

use crate::device::D3D12Device;
use crate::device_context::D3D12DeviceContext;
use crate::root_signature::RootSignature;
use crate::shader_resource_binding::D3D12ShaderResourceBinding;
use crate::shader_resource_cache::{CacheContentType, ShaderResourceCache};
use crate::shader_resource_layout::{LayoutTarget, ShaderResourceLayout};
use crate::shader_variable::ShaderVariableManager;
use prism_binding::prism::binding::{
    BindShaderResourcesFlags, PipelineState, ResourceStateTransitionMode, ShaderResourceVariable,
};
use prism_binding::prism::layout::{PipelineResourceLayoutDesc, VariableTypeFlags};
use prism_binding::prism::resource::ResourceMapping;
use prism_binding::prism::shader::{Shader, ShaderResources, ShaderStage, ShaderStageFlags};
use prism_binding::prism::Result;
use prism_binding::{engine_bail, engine_info, engine_warn};
use std::sync::{Arc, Mutex};

#[cfg(feature = "validation")]
use crate::shader_variable::lock_cache;
#[cfg(feature = "validation")]
use prism_binding::prism::binding::ShaderResourceBinding;
#[cfg(feature = "validation")]
use prism_binding::engine_error;

const LOG_SOURCE: &str = "prism::d3d12::PipelineState";

/// Pipeline state creation parameters
#[derive(Debug, Clone, Default)]
pub struct D3D12PipelineStateDesc {
    pub name: String,
    /// One shader per stage; a compute shader cannot be combined with others
    pub shaders: Vec<Arc<Shader>>,
    pub resource_layout: PipelineResourceLayoutDesc,
    /// Fail creation if a layout entry matches no shader resource
    pub strict_resource_layout: bool,
}

/// Layouts and static resources of one stage
pub(crate) struct StageResources {
    shader: Arc<Shader>,
    layout: Arc<ShaderResourceLayout>,
    static_layout: Arc<ShaderResourceLayout>,
    static_cache: Arc<Mutex<ShaderResourceCache>>,
    static_vars: ShaderVariableManager,
}

impl StageResources {
    pub(crate) fn shader(&self) -> &Arc<Shader> {
        &self.shader
    }

    /// Reference layout, covering every variable type
    pub(crate) fn layout(&self) -> &Arc<ShaderResourceLayout> {
        &self.layout
    }

    pub(crate) fn static_layout(&self) -> &Arc<ShaderResourceLayout> {
        &self.static_layout
    }

    pub(crate) fn static_cache(&self) -> &Arc<Mutex<ShaderResourceCache>> {
        &self.static_cache
    }
}

pub struct D3D12PipelineState {
    name: String,
    device: Arc<D3D12Device>,
    is_compute: bool,
    root_signature: RootSignature,
    stages: Vec<StageResources>,
    stage_index: [Option<usize>; ShaderStage::COUNT],
    has_static_resources: bool,
}

impl D3D12PipelineState {
    /// Build the layouts of every stage and finalize the root signature
    ///
    /// # Errors
    ///
    /// - `Error::InitializationFailed` for an empty, duplicated or mixed
    ///   compute/graphics stage set, or a root signature over the DWORD budget
    /// - `Error::InvalidResource` for inconsistent texture and sampler types, or
    ///   unmatched layout entries when `strict_resource_layout` is set
    pub fn new(device: &Arc<D3D12Device>, desc: D3D12PipelineStateDesc) -> Result<Arc<Self>> {
        if desc.shaders.is_empty() {
            engine_bail!(InitializationFailed => LOG_SOURCE, "Pipeline state '{}' has no shaders", desc.name);
        }

        let mut stage_index = [None; ShaderStage::COUNT];
        for (index, shader) in desc.shaders.iter().enumerate() {
            let slot = &mut stage_index[shader.stage().index()];
            if slot.is_some() {
                engine_bail!(InitializationFailed => LOG_SOURCE,
                    "Pipeline state '{}' has more than one {} shader", desc.name, shader.stage().as_str());
            }
            *slot = Some(index);
        }

        let is_compute = stage_index[ShaderStage::Compute.index()].is_some();
        if is_compute && desc.shaders.len() > 1 {
            engine_bail!(InitializationFailed => LOG_SOURCE,
                "Pipeline state '{}' combines a compute shader with graphics shaders", desc.name);
        }

        let all_resources: Vec<&ShaderResources> = desc.shaders.iter().map(|s| s.resources().as_ref()).collect();
        desc.resource_layout.verify(&all_resources, desc.strict_resource_layout)?;

        let mut root_signature = RootSignature::new();
        root_signature.allocate_immutable_samplers(&desc.resource_layout);

        let mut stages = Vec::with_capacity(desc.shaders.len());
        for shader in &desc.shaders {
            let layout = ShaderResourceLayout::new(
                LayoutTarget::RootSignature(&mut root_signature),
                shader.resources(),
                &desc.resource_layout,
                VariableTypeFlags::ALL,
            )?;

            let mut static_cache = ShaderResourceCache::new(CacheContentType::StaticShaderResources);
            let static_layout = Arc::new(ShaderResourceLayout::new(
                LayoutTarget::StaticCache(&mut static_cache),
                shader.resources(),
                &desc.resource_layout,
                VariableTypeFlags::STATIC,
            )?);
            let static_cache = Arc::new(Mutex::new(static_cache));
            let static_vars = ShaderVariableManager::new(
                Arc::clone(&static_layout),
                Arc::clone(&static_cache),
                VariableTypeFlags::STATIC,
            );

            stages.push(StageResources {
                shader: Arc::clone(shader),
                layout: Arc::new(layout),
                static_layout,
                static_cache,
                static_vars,
            });
        }

        root_signature.finalize()?;

        let has_static_resources = stages.iter()
            .any(|s| s.static_layout.total_cbv_srv_uav_count() + s.static_layout.total_sampler_count() > 0);

        engine_info!(LOG_SOURCE, "Pipeline state '{}' created: {} stage(s), {} root table(s), {} root view(s), hash {:#018x}",
            desc.name, stages.len(), root_signature.tables().len(), root_signature.views().len(), root_signature.hash());

        Ok(Arc::new(Self {
            name: desc.name,
            device: Arc::clone(device),
            is_compute,
            root_signature,
            stages,
            stage_index,
            has_static_resources,
        }))
    }

    // ===== ACCESSORS =====

    pub fn device(&self) -> &Arc<D3D12Device> {
        &self.device
    }

    pub fn is_compute(&self) -> bool {
        self.is_compute
    }

    pub fn root_signature(&self) -> &RootSignature {
        &self.root_signature
    }

    pub(crate) fn stages(&self) -> &[StageResources] {
        &self.stages
    }

    pub(crate) fn stage(&self, stage: ShaderStage) -> Option<&StageResources> {
        self.stage_index[stage.index()].map(|index| &self.stages[index])
    }

    pub fn active_stages(&self) -> ShaderStageFlags {
        self.stages.iter().fold(ShaderStageFlags::empty(), |acc, s| acc | s.shader.stage().flag())
    }

    /// Reference layout of `stage`
    pub fn resource_layout(&self, stage: ShaderStage) -> Option<&Arc<ShaderResourceLayout>> {
        self.stage(stage).map(|s| &s.layout)
    }

    /// Whether a binding created by `other` can be committed with this pipeline
    pub fn is_compatible_with(&self, other: &D3D12PipelineState) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        self.root_signature.hash() == other.root_signature.hash() && self.root_signature.is_same_as(&other.root_signature)
    }

    // ===== RESOURCE BINDINGS =====

    /// Create a binding for the mutable and dynamic variables of this pipeline
    ///
    /// With `init_static_resources` the static resources bound so far are
    /// copied right away.
    pub fn create_shader_resource_binding(
        self: &Arc<Self>,
        init_static_resources: bool,
    ) -> Result<Arc<D3D12ShaderResourceBinding>> {
        let srb = D3D12ShaderResourceBinding::new(Arc::clone(self))?;
        if init_static_resources {
            srb.initialize_static_resources(self)?;
        }
        Ok(srb)
    }

    /// Set the root signature and every table and non-dynamic root view of `srb`
    ///
    /// Dynamic constant buffers are set by the context at every draw. With
    /// `ResourceStateTransitionMode::Transition` resources with a tracked state
    /// are transitioned; with `Verify` they are only checked.
    ///
    /// # Errors
    ///
    /// - `Error::Incompatible` if `srb` was created by an incompatible pipeline
    /// - `Error::OutOfDescriptors` if dynamic tables cannot get descriptors
    pub fn commit_and_transition_shader_resources(
        &self,
        ctx: &mut D3D12DeviceContext,
        srb: &D3D12ShaderResourceBinding,
        mode: ResourceStateTransitionMode,
    ) -> Result<()> {
        if !self.is_compatible_with(srb.pipeline_state()) {
            engine_bail!(Incompatible => LOG_SOURCE,
                "Shader resource binding is incompatible with the pipeline state '{}'. Operation will be ignored.",
                self.name);
        }

        #[cfg(feature = "validation")]
        self.verify_shader_resources(srb);

        let cache = srb.lock_cache();
        ctx.command_list_mut().set_root_signature(self.is_compute, self.root_signature.hash());

        let transition = mode == ResourceStateTransitionMode::Transition;
        let validate = mode == ResourceStateTransitionMode::Verify;
        self.root_signature.commit_descriptor_handles(ctx, &cache, self.is_compute, transition, validate)?;
        self.root_signature.commit_root_views(&cache, ctx, self.is_compute, false, true, transition, validate)?;
        Ok(())
    }

    /// Report uninitialized static resources and missing bindings of `srb`
    #[cfg(feature = "validation")]
    fn verify_shader_resources(&self, srb: &D3D12ShaderResourceBinding) {
        if self.has_static_resources && !srb.static_resources_initialized() {
            engine_error!(LOG_SOURCE,
                "Static resources have not been initialized in the shader resource binding object being committed for pipeline state '{}'. Please call initialize_static_resources().",
                self.name);
        }

        let cache = lock_cache(srb.cache());
        for stage in &self.stages {
            stage.layout.verify_bindings(&cache);
        }
    }

    fn warn_inactive_stage(&self, stage: ShaderStage) {
        engine_warn!(LOG_SOURCE, "Shader stage {} is inactive in pipeline state '{}'", stage.as_str(), self.name);
    }
}

impl PipelineState for D3D12PipelineState {
    fn name(&self) -> &str {
        &self.name
    }

    fn binding_hash(&self) -> u64 {
        self.root_signature.hash()
    }

    fn bind_static_resources(&self, stages: ShaderStageFlags, mapping: &ResourceMapping, flags: BindShaderResourcesFlags) {
        for stage in &self.stages {
            if stages.contains_stage(stage.shader.stage()) {
                stage.static_vars.bind_resources(mapping, flags);
            }
        }
    }

    fn static_variable_by_name(&self, stage: ShaderStage, name: &str) -> Option<Arc<dyn ShaderResourceVariable>> {
        match self.stage(stage) {
            Some(s) => s.static_vars.variable_by_name(name),
            None => {
                self.warn_inactive_stage(stage);
                None
            }
        }
    }

    fn static_variable_by_index(&self, stage: ShaderStage, index: u32) -> Option<Arc<dyn ShaderResourceVariable>> {
        match self.stage(stage) {
            Some(s) => s.static_vars.variable_by_index(index),
            None => {
                self.warn_inactive_stage(stage);
                None
            }
        }
    }

    fn static_variable_count(&self, stage: ShaderStage) -> u32 {
        self.stage(stage).map_or(0, |s| s.static_vars.variable_count())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "pipeline_state_tests.rs"]
mod tests;
