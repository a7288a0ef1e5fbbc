/// GlPipelineState - linked programs and static resources of a set of stages
///
/// All stages link into one program, or into one program per stage when the
/// device uses separable programs. Every program resource gets a binding
/// from counters shared by the programs of the pipeline, so one flat cache
/// covers the whole pipeline. The static cache holds what the application
/// binds to static variables; resource bindings copy from it when their
/// static resources are initialized.

use crate::device::GlDevice;
use crate::gl_types::{GlProgramObject, ProgramId, ProgramPipelineId};
use crate::pipeline_resource_layout::PipelineResourceLayout;
use crate::program_resource_cache::ProgramResourceCache;
use crate::program_resources::{BindingCounters, ProgramResources};
use crate::shader_resource_binding::GlShaderResourceBinding;
use crate::shader_variable::ShaderVariableManager;
use prism_binding::prism::binding::{BindShaderResourcesFlags, PipelineState, ShaderResourceVariable};
use prism_binding::prism::layout::{PipelineResourceLayoutDesc, VariableTypeFlags};
use prism_binding::prism::resource::{ResourceMapping, Sampler};
use prism_binding::prism::shader::{Shader, ShaderResources, ShaderStage, ShaderStageFlags};
use prism_binding::prism::utils::hash_combine;
use prism_binding::prism::Result;
use prism_binding::{engine_bail, engine_info, engine_warn};
use std::sync::{Arc, Mutex};

const LOG_SOURCE: &str = "prism::gl::PipelineState";

/// Pipeline state creation parameters
#[derive(Debug, Clone, Default)]
pub struct GlPipelineStateDesc {
    pub name: String,
    /// One shader per stage; a compute shader cannot be combined with others
    pub shaders: Vec<Arc<Shader>>,
    pub resource_layout: PipelineResourceLayoutDesc,
    /// Fail creation if a layout entry matches no shader resource
    pub strict_resource_layout: bool,
}

pub struct GlPipelineState {
    name: String,
    device: Arc<GlDevice>,
    is_compute: bool,
    active_stages: ShaderStageFlags,
    programs: Vec<ProgramResources>,
    program_object: GlProgramObject,
    /// Every variable type; sizes binding caches and validates commits
    layout: Arc<PipelineResourceLayout>,
    srb_layout: Arc<PipelineResourceLayout>,
    static_layout: Arc<PipelineResourceLayout>,
    static_cache: Arc<Mutex<ProgramResourceCache>>,
    static_vars: Vec<ShaderVariableManager>,
    immutable_samplers: Vec<Arc<Sampler>>,
    hash: u64,
}

impl GlPipelineState {
    /// Reflect and link the shaders of `desc` and build the layouts
    ///
    /// # Errors
    ///
    /// - `Error::InitializationFailed` for an empty, duplicated or mixed
    ///   compute/graphics stage set
    /// - `Error::InvalidResource` for a resource declared with different kinds
    ///   or sizes in linked stages, or unmatched layout entries when
    ///   `strict_resource_layout` is set
    pub fn new(device: &Arc<GlDevice>, desc: GlPipelineStateDesc) -> Result<Arc<Self>> {
        if desc.shaders.is_empty() {
            engine_bail!(InitializationFailed => LOG_SOURCE, "Pipeline state '{}' has no shaders", desc.name);
        }

        let mut active_stages = ShaderStageFlags::empty();
        for shader in &desc.shaders {
            if active_stages.contains_stage(shader.stage()) {
                engine_bail!(InitializationFailed => LOG_SOURCE,
                    "Pipeline state '{}' has more than one {} shader", desc.name, shader.stage().as_str());
            }
            active_stages |= shader.stage().flag();
        }

        let is_compute = active_stages.contains_stage(ShaderStage::Compute);
        if is_compute && desc.shaders.len() > 1 {
            engine_bail!(InitializationFailed => LOG_SOURCE,
                "Pipeline state '{}' combines a compute shader with graphics shaders", desc.name);
        }

        let all_resources: Vec<&ShaderResources> = desc.shaders.iter().map(|s| s.resources().as_ref()).collect();
        desc.resource_layout.verify(&all_resources, desc.strict_resource_layout)?;

        let mut counters = BindingCounters::new();
        let separable = device.config().separable_programs && desc.shaders.len() > 1;
        let programs = if separable {
            all_resources.iter()
                .map(|res| ProgramResources::new(std::slice::from_ref(res), &mut counters))
                .collect::<Result<Vec<_>>>()?
        } else {
            vec![ProgramResources::new(&all_resources, &mut counters)?]
        };

        let program_object = if separable {
            GlProgramObject::Pipeline {
                pipeline: ProgramPipelineId::next(),
                programs: programs.iter().map(|_| ProgramId::next()).collect(),
            }
        } else {
            GlProgramObject::Program(ProgramId::next())
        };

        let mut hash = 0u64;
        for program in &programs {
            hash_combine(&mut hash, &program.hash());
        }

        let immutable_samplers: Vec<Arc<Sampler>> = desc.resource_layout.immutable_samplers.iter()
            .map(|s| device.sampler_registry().get_or_create(&s.name, &s.desc))
            .collect();

        let layout_for = |allowed| Arc::new(PipelineResourceLayout::new(&desc.name, &programs, &desc.resource_layout, allowed));
        let layout = layout_for(VariableTypeFlags::ALL);
        let srb_layout = layout_for(VariableTypeFlags::MUTABLE_DYNAMIC);
        let static_layout = layout_for(VariableTypeFlags::STATIC);

        let mut static_cache = ProgramResourceCache::new();
        static_layout.init_cache(&mut static_cache);
        static_layout.init_immutable_samplers(&mut static_cache, &immutable_samplers);
        let static_cache = Arc::new(Mutex::new(static_cache));

        let static_vars = desc.shaders.iter()
            .map(|shader| ShaderVariableManager::new(Arc::clone(&static_layout), shader.stage(), Arc::clone(&static_cache)))
            .collect();

        engine_info!(LOG_SOURCE, "Pipeline state '{}' created: {} stage(s), {} program(s), {} variable(s), hash {:#018x}",
            desc.name, desc.shaders.len(), programs.len(), layout.total_variable_count(), hash);

        Ok(Arc::new(Self {
            name: desc.name,
            device: Arc::clone(device),
            is_compute,
            active_stages,
            programs,
            program_object,
            layout,
            srb_layout,
            static_layout,
            static_cache,
            static_vars,
            immutable_samplers,
            hash,
        }))
    }

    // ===== ACCESSORS =====

    pub fn device(&self) -> &Arc<GlDevice> {
        &self.device
    }

    pub fn is_compute(&self) -> bool {
        self.is_compute
    }

    pub fn active_stages(&self) -> ShaderStageFlags {
        self.active_stages
    }

    pub fn programs(&self) -> &[ProgramResources] {
        &self.programs
    }

    pub fn program_object(&self) -> &GlProgramObject {
        &self.program_object
    }

    /// Layout of every variable type
    pub fn resource_layout(&self) -> &Arc<PipelineResourceLayout> {
        &self.layout
    }

    pub(crate) fn srb_layout(&self) -> &Arc<PipelineResourceLayout> {
        &self.srb_layout
    }

    pub(crate) fn static_layout(&self) -> &Arc<PipelineResourceLayout> {
        &self.static_layout
    }

    pub(crate) fn static_cache(&self) -> &Arc<Mutex<ProgramResourceCache>> {
        &self.static_cache
    }

    pub fn immutable_samplers(&self) -> &[Arc<Sampler>] {
        &self.immutable_samplers
    }

    pub fn has_static_resources(&self) -> bool {
        self.static_layout.total_variable_count() > 0
    }

    /// Whether a binding created by `other` can be committed with this pipeline
    pub fn is_compatible_with(&self, other: &GlPipelineState) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        self.hash == other.hash
            && self.programs.len() == other.programs.len()
            && self.programs.iter().zip(&other.programs).all(|(a, b)| a.is_compatible_with(b))
    }

    /// Empty cache sized for every variable, with the immutable samplers written in
    pub(crate) fn new_binding_cache(&self) -> ProgramResourceCache {
        let mut cache = ProgramResourceCache::new();
        self.layout.init_cache(&mut cache);
        self.layout.init_immutable_samplers(&mut cache, &self.immutable_samplers);
        cache
    }

    // ===== RESOURCE BINDINGS =====

    /// Create a binding for the mutable and dynamic variables of this pipeline
    ///
    /// With `init_static_resources` the static resources bound so far are
    /// copied right away.
    pub fn create_shader_resource_binding(
        self: &Arc<Self>,
        init_static_resources: bool,
    ) -> Result<Arc<GlShaderResourceBinding>> {
        let srb = GlShaderResourceBinding::new(Arc::clone(self));
        if init_static_resources {
            srb.initialize_static_resources(self)?;
        }
        Ok(srb)
    }

    fn static_manager(&self, stage: ShaderStage) -> Option<&ShaderVariableManager> {
        let vars = self.static_vars.iter().find(|m| m.stage() == stage);
        if vars.is_none() {
            engine_warn!(LOG_SOURCE, "Shader stage {} is inactive in pipeline state '{}'", stage.as_str(), self.name);
        }
        vars
    }
}

impl PipelineState for GlPipelineState {
    fn name(&self) -> &str {
        &self.name
    }

    fn binding_hash(&self) -> u64 {
        self.hash
    }

    fn bind_static_resources(&self, stages: ShaderStageFlags, mapping: &ResourceMapping, flags: BindShaderResourcesFlags) {
        for vars in &self.static_vars {
            if stages.contains_stage(vars.stage()) {
                vars.bind_resources(mapping, flags);
            }
        }
    }

    fn static_variable_by_name(&self, stage: ShaderStage, name: &str) -> Option<Arc<dyn ShaderResourceVariable>> {
        self.static_manager(stage)?.variable_by_name(name)
    }

    fn static_variable_by_index(&self, stage: ShaderStage, index: u32) -> Option<Arc<dyn ShaderResourceVariable>> {
        self.static_manager(stage)?.variable_by_index(index)
    }

    fn static_variable_count(&self, stage: ShaderStage) -> u32 {
        self.static_vars.iter().find(|m| m.stage() == stage).map_or(0, ShaderVariableManager::variable_count)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "pipeline_state_tests.rs"]
mod tests;
