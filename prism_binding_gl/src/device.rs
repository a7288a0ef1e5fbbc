/// GlDevice - pipeline factory and owner of the shared samplers

use crate::device_context::GlDeviceContext;
use crate::pipeline_state::{GlPipelineState, GlPipelineStateDesc};
use prism_binding::prism::resource::{Sampler, SamplerDesc, SamplerRegistry};
use prism_binding::prism::Result;
use prism_binding::engine_info;
use std::sync::Arc;

const LOG_SOURCE: &str = "prism::gl::Device";

/// Device configuration
#[derive(Debug, Clone, Default)]
pub struct GlDeviceConfig {
    /// Link every stage of a graphics pipeline into its own program and bind
    /// them through a program pipeline object
    pub separable_programs: bool,
}

/// Binding device
pub struct GlDevice {
    config: GlDeviceConfig,
    samplers: SamplerRegistry,
}

impl GlDevice {
    pub fn new(config: GlDeviceConfig) -> Arc<Self> {
        engine_info!(LOG_SOURCE, "Device created: separable programs {}",
            if config.separable_programs { "enabled" } else { "disabled" });

        Arc::new(Self {
            config,
            samplers: SamplerRegistry::new(),
        })
    }

    pub fn config(&self) -> &GlDeviceConfig {
        &self.config
    }

    pub fn sampler_registry(&self) -> &SamplerRegistry {
        &self.samplers
    }

    /// Shared sampler for `desc`; equal descriptions return the same instance
    pub fn create_sampler(&self, name: &str, desc: &SamplerDesc) -> Arc<Sampler> {
        self.samplers.get_or_create(name, desc)
    }

    pub fn create_pipeline_state(self: &Arc<Self>, desc: GlPipelineStateDesc) -> Result<Arc<GlPipelineState>> {
        GlPipelineState::new(self, desc)
    }

    pub fn create_device_context(self: &Arc<Self>) -> GlDeviceContext {
        GlDeviceContext::new(self)
    }
}
