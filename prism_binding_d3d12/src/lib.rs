/*!
# Prism Binding - D3D12 Backend

D3D12-flavoured implementation of the Prism shader resource binding engine.

Resources of every shader stage are placed into root descriptor tables and root
constant buffer views of one root signature per pipeline state. Static and
mutable tables live in shader-visible heap space owned by each shader resource
binding; dynamic tables are copied into per-draw descriptors at commit time, and
dynamic constant buffers get a fresh root view address at every draw.

No driver is involved: heaps hold copied descriptor handles and the device
context records its commands, so every effect of a commit can be inspected.
*/

// Native object model
mod d3d12_types;
mod command_list;
mod range_allocator;
mod descriptor_heap;
mod dynamic_upload_heap;
mod debug;

// Binding model
mod root_signature;
mod shader_resource_cache;
mod shader_resource_layout;
mod shader_variable;
mod pipeline_state;
mod shader_resource_binding;

// Device
mod device;
mod device_context;

#[cfg(test)]
pub(crate) mod test_utils;

pub use d3d12_types::{
    CpuDescriptorHandle, DescriptorHeapType, DescriptorRange, DescriptorRangeType, GpuDescriptorHandle,
    GpuVirtualAddress, ResourceBarrier, RootParameterDesc, RootSignatureDesc, ShaderVisibility, StaticSamplerDesc,
    MAX_ROOT_SIGNATURE_DWORDS,
};
pub use command_list::{CommandList, D3D12Command};
pub use range_allocator::RangeAllocator;
pub use descriptor_heap::{DescriptorHeapAllocation, DynamicDescriptorAllocator, DynamicDescriptorRange, GpuDescriptorHeap};
pub use dynamic_upload_heap::{DynamicUploadHeap, CONSTANT_BUFFER_ALIGNMENT};
pub use root_signature::{CommitMode, RootSignature, RootTable, RootView};
pub use shader_resource_cache::{CacheContentType, CachedResource, ShaderResourceCache};
pub use shader_resource_layout::{D3D12Resource, LayoutTarget, ResourceRef, ShaderResourceLayout};
pub use shader_variable::{D3D12ShaderVariable, ShaderVariableManager};
pub use pipeline_state::{D3D12PipelineState, D3D12PipelineStateDesc};
pub use shader_resource_binding::D3D12ShaderResourceBinding;
pub use device::{D3D12Device, D3D12DeviceConfig};
pub use device_context::D3D12DeviceContext;

// Re-export debug utilities
pub use debug::{print_commit_stats_report, CommitStats};
