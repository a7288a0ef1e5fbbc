/// D3D12Device - owner of the shader-visible heaps and shared samplers
///
/// Pipelines and resource bindings allocate their table space from the
/// device heaps. Every device context gets its own dynamic descriptor
/// allocator and upload heap on top of the same heaps.

use crate::d3d12_types::DescriptorHeapType;
use crate::descriptor_heap::GpuDescriptorHeap;
use crate::device_context::D3D12DeviceContext;
use crate::pipeline_state::{D3D12PipelineState, D3D12PipelineStateDesc};
use prism_binding::prism::resource::{Sampler, SamplerDesc, SamplerRegistry};
use prism_binding::prism::Result;
use prism_binding::engine_info;
use std::sync::Arc;

const LOG_SOURCE: &str = "prism::d3d12::Device";

/// Device configuration
#[derive(Debug, Clone)]
pub struct D3D12DeviceConfig {
    /// Static region of the CBV/SRV/UAV heap (SRB and pipeline tables)
    pub cbv_srv_uav_static_size: u32,
    /// Dynamic region of the CBV/SRV/UAV heap (per-draw tables)
    pub cbv_srv_uav_dynamic_size: u32,
    pub sampler_static_size: u32,
    pub sampler_dynamic_size: u32,
    /// Descriptors a context takes from a dynamic region at a time
    pub dynamic_descriptor_chunk_size: u32,
    /// Size in bytes of one page of the dynamic upload heap
    pub upload_page_size: u64,
    /// Frames the GPU may lag behind; dynamic space is recycled after that many frames
    pub frames_in_flight: u32,
}

impl Default for D3D12DeviceConfig {
    fn default() -> Self {
        Self {
            cbv_srv_uav_static_size: 16384,
            cbv_srv_uav_dynamic_size: 16384,
            sampler_static_size: 1024,
            sampler_dynamic_size: 1024,
            dynamic_descriptor_chunk_size: 256,
            upload_page_size: 64 * 1024,
            frames_in_flight: 1,
        }
    }
}

/// Binding device
pub struct D3D12Device {
    config: D3D12DeviceConfig,
    heaps: [Arc<GpuDescriptorHeap>; DescriptorHeapType::COUNT],
    samplers: SamplerRegistry,
}

impl D3D12Device {
    pub fn new(config: D3D12DeviceConfig) -> Arc<Self> {
        let heaps = [
            GpuDescriptorHeap::new(DescriptorHeapType::CbvSrvUav, config.cbv_srv_uav_static_size, config.cbv_srv_uav_dynamic_size),
            GpuDescriptorHeap::new(DescriptorHeapType::Sampler, config.sampler_static_size, config.sampler_dynamic_size),
        ];
        engine_info!(LOG_SOURCE, "Device created: CBV/SRV/UAV heap {}+{}, sampler heap {}+{}, {} frame(s) in flight",
            config.cbv_srv_uav_static_size, config.cbv_srv_uav_dynamic_size,
            config.sampler_static_size, config.sampler_dynamic_size, config.frames_in_flight);

        Arc::new(Self {
            config,
            heaps,
            samplers: SamplerRegistry::new(),
        })
    }

    pub fn config(&self) -> &D3D12DeviceConfig {
        &self.config
    }

    pub fn gpu_descriptor_heap(&self, heap_type: DescriptorHeapType) -> &Arc<GpuDescriptorHeap> {
        &self.heaps[heap_type.index()]
    }

    pub fn sampler_registry(&self) -> &SamplerRegistry {
        &self.samplers
    }

    /// Shared sampler for `desc`; equal descriptions return the same instance
    pub fn create_sampler(&self, name: &str, desc: &SamplerDesc) -> Arc<Sampler> {
        self.samplers.get_or_create(name, desc)
    }

    pub fn create_pipeline_state(self: &Arc<Self>, desc: D3D12PipelineStateDesc) -> Result<Arc<D3D12PipelineState>> {
        D3D12PipelineState::new(self, desc)
    }

    pub fn create_device_context(self: &Arc<Self>) -> D3D12DeviceContext {
        D3D12DeviceContext::new(self)
    }
}
