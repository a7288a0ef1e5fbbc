/// D3D12ShaderResourceBinding - one instance of the mutable and dynamic bindings
///
/// The binding owns a cache sized by the root signature of the pipeline it was
/// created from, with shader-visible space for its static and mutable tables.
/// Static resources are copied in once from the pipeline's static caches.

use crate::pipeline_state::D3D12PipelineState;
use crate::shader_resource_cache::{CacheContentType, ShaderResourceCache};
use crate::shader_variable::{lock_cache, ShaderVariableManager};
use prism_binding::prism::binding::{BindShaderResourcesFlags, PipelineState, ShaderResourceBinding, ShaderResourceVariable};
use prism_binding::prism::layout::VariableTypeFlags;
use prism_binding::prism::resource::ResourceMapping;
use prism_binding::prism::shader::{ShaderStage, ShaderStageFlags};
use prism_binding::prism::Result;
use prism_binding::{engine_bail, engine_trace, engine_warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

const LOG_SOURCE: &str = "prism::d3d12::ShaderResourceBinding";

pub struct D3D12ShaderResourceBinding {
    pipeline_state: Arc<D3D12PipelineState>,
    cache: Arc<Mutex<ShaderResourceCache>>,
    /// Mutable and dynamic variables, parallel to the pipeline's stages
    managers: Vec<(ShaderStage, ShaderVariableManager)>,
    static_resources_initialized: AtomicBool,
}

impl D3D12ShaderResourceBinding {
    /// Create a binding for `pipeline_state`
    ///
    /// # Errors
    ///
    /// Returns `Error::OutOfDescriptors` if the device heaps cannot hold the
    /// static and mutable tables of the binding.
    pub fn new(pipeline_state: Arc<D3D12PipelineState>) -> Result<Arc<Self>> {
        let mut cache = ShaderResourceCache::new(CacheContentType::SrbResources);
        pipeline_state.root_signature().init_resource_cache(pipeline_state.device(), &mut cache)?;
        let cache = Arc::new(Mutex::new(cache));

        let managers = pipeline_state.stages().iter()
            .map(|stage| {
                let manager = ShaderVariableManager::new(
                    Arc::clone(stage.layout()),
                    Arc::clone(&cache),
                    VariableTypeFlags::MUTABLE_DYNAMIC,
                );
                (stage.shader().stage(), manager)
            })
            .collect();

        Ok(Arc::new(Self {
            pipeline_state,
            cache,
            managers,
            static_resources_initialized: AtomicBool::new(false),
        }))
    }

    pub fn pipeline_state(&self) -> &Arc<D3D12PipelineState> {
        &self.pipeline_state
    }

    pub(crate) fn cache(&self) -> &Arc<Mutex<ShaderResourceCache>> {
        &self.cache
    }

    pub fn lock_cache(&self) -> MutexGuard<'_, ShaderResourceCache> {
        lock_cache(&self.cache)
    }

    fn manager(&self, stage: ShaderStage) -> Option<&ShaderVariableManager> {
        self.managers.iter().find(|(s, _)| *s == stage).map(|(_, manager)| manager)
    }

    /// Copy the static resources of `pipeline_state` into this binding
    ///
    /// Runs once; later calls only warn. Static variables with nothing bound
    /// are reported and left empty.
    ///
    /// # Errors
    ///
    /// Returns `Error::Incompatible` if `pipeline_state` is not compatible with
    /// the pipeline this binding was created from.
    pub fn initialize_static_resources(&self, pipeline_state: &D3D12PipelineState) -> Result<()> {
        if self.static_resources_initialized.load(Ordering::Acquire) {
            engine_warn!(LOG_SOURCE, "Static resources have already been initialized in this shader resource binding object. The operation will be ignored.");
            return Ok(());
        }

        if !pipeline_state.is_compatible_with(&self.pipeline_state) {
            engine_bail!(Incompatible => LOG_SOURCE,
                "Pipeline state '{}' is not compatible with the pipeline state this shader resource binding was created from. Static resources cannot be copied.",
                pipeline_state.name());
        }

        let mut cache = self.lock_cache();
        for dst in self.pipeline_state.stages() {
            let Some(src) = pipeline_state.stage(dst.shader().stage()) else {
                continue;
            };
            let static_cache = lock_cache(src.static_cache());
            src.static_layout().copy_static_resource_desc_handles(&static_cache, dst.layout(), &mut cache);
        }

        self.static_resources_initialized.store(true, Ordering::Release);
        engine_trace!(LOG_SOURCE, "Static resources initialized from pipeline state '{}'",
            pipeline_state.name());
        Ok(())
    }
}

impl ShaderResourceBinding for D3D12ShaderResourceBinding {
    fn bind_resources(&self, stages: ShaderStageFlags, mapping: &ResourceMapping, flags: BindShaderResourcesFlags) {
        for (stage, manager) in &self.managers {
            if stages.contains_stage(*stage) {
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
