/// GlShaderResourceBinding - one instance of the mutable and dynamic bindings
///
/// The binding owns a cache sized for every variable of its pipeline, so
/// static resources copied from the pipeline land at the same bindings the
/// pipeline uses.

use crate::pipeline_state::GlPipelineState;
use crate::program_resource_cache::ProgramResourceCache;
use crate::shader_variable::{lock_cache, ShaderVariableManager};
use prism_binding::prism::binding::{BindShaderResourcesFlags, PipelineState, ShaderResourceBinding, ShaderResourceVariable};
use prism_binding::prism::resource::ResourceMapping;
use prism_binding::prism::shader::{ShaderStage, ShaderStageFlags};
use prism_binding::prism::Result;
use prism_binding::{engine_bail, engine_error, engine_trace, engine_warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};


const LOG_SOURCE: &str = "prism::gl::ShaderResourceBinding";

pub struct GlShaderResourceBinding {
    pipeline_state: Arc<GlPipelineState>,
    cache: Arc<Mutex<ProgramResourceCache>>,
    managers: Vec<ShaderVariableManager>,
    static_resources_initialized: AtomicBool,
}

impl GlShaderResourceBinding {
    pub fn new(pipeline_state: Arc<GlPipelineState>) -> Arc<Self> {
        let cache = Arc::new(Mutex::new(pipeline_state.new_binding_cache()));
        let managers = pipeline_state.active_stages().stages()
            .map(|stage| ShaderVariableManager::new(Arc::clone(pipeline_state.srb_layout()), stage, Arc::clone(&cache)))
            .collect();

        Arc::new(Self {
            pipeline_state,
            cache,
            managers,
            static_resources_initialized: AtomicBool::new(false),
        })
    }

    pub fn pipeline_state(&self) -> &Arc<GlPipelineState> {
        &self.pipeline_state
    }

    pub fn lock_cache(&self) -> MutexGuard<'_, ProgramResourceCache> {
        lock_cache(&self.cache)
    }

    fn manager(&self, stage: ShaderStage) -> Option<&ShaderVariableManager> {
        self.managers.iter().find(|m| m.stage() == stage)
    }

    /// Copy the static resources of `pipeline_state` into this binding
    ///
    /// Runs once; later calls only warn. Static variables with nothing bound
    /// are reported and copied as empty slots.
    ///
    /// # Errors
    ///
    /// Returns `Error::Incompatible` if `pipeline_state` is not compatible with
    /// the pipeline this binding was created from.
    pub fn initialize_static_resources(&self, pipeline_state: &GlPipelineState) -> Result<()> {
        if self.static_resources_initialized.load(Ordering::Acquire) {
            engine_warn!(LOG_SOURCE, "Static resources have already been initialized in this shader resource binding object. The operation will be ignored.");
            return Ok(());
        }

        if !pipeline_state.is_compatible_with(&self.pipeline_state) {
            engine_bail!(Incompatible => LOG_SOURCE,
                "Pipeline state '{}' is not compatible with the pipeline state this shader resource binding was created from. Static resources cannot be copied.",
                pipeline_state.name());
        }

        let static_cache = lock_cache(pipeline_state.static_cache());

        if !pipeline_state.static_layout().verify_bindings(&static_cache) {
            engine_error!(LOG_SOURCE,
                "Static resources in the shader resource binding of pipeline state '{}' will not be successfully initialized because not all static resource bindings are valid. Bind all static resources to the pipeline state before initializing static resources.",
                pipeline_state.name());
        }

        let mut cache = self.lock_cache();
        pipeline_state.static_layout().copy_resources(&static_cache, &mut cache);

        self.static_resources_initialized.store(true, Ordering::Release);
        engine_trace!(LOG_SOURCE, "Static resources initialized from pipeline state '{}'", pipeline_state.name());
        Ok(())
    }
}

impl ShaderResourceBinding for GlShaderResourceBinding {
    fn bind_resources(&self, stages: ShaderStageFlags, mapping: &ResourceMapping, flags: BindShaderResourcesFlags) {
        for manager in &self.managers {
            if stages.contains_stage(manager.stage()) {
                manager.bind_resources(mapping, flags);
            }
        }
    }

    fn variable_by_name(&self, stage: ShaderStage, name: &str) -> Option<Arc<dyn ShaderResourceVariable>> {
        self.manager(stage)?.variable_by_name(name)
    }

    fn variable_by_index(&self, stage: ShaderStage, index: u32) -> Option<Arc<dyn ShaderResourceVariable>> {
        self.manager(stage)?.variable_by_index(index)
    }

    fn variable_count(&self, stage: ShaderStage) -> u32 {
        self.manager(stage).map_or(0, ShaderVariableManager::variable_count)
    }

    fn static_resources_initialized(&self) -> bool {
        self.static_resources_initialized.load(Ordering::Acquire)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "shader_resource_binding_tests.rs"]
mod tests;
