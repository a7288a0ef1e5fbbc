/// In-memory model of the native D3D12 binding objects
///
/// Nothing here talks to a driver. Descriptor handles are derived from the
/// process-unique id of the object they describe, so copying a handle into a
/// shader-visible heap and reading it back is observable in tests.

use prism_binding::prism::resource::{Buffer, DeviceObject, ResourceId, ResourceState, SamplerDesc};
use prism_binding::prism::shader::{ShaderResourceKind, ShaderStage};

/// Root argument space available to a root signature, in DWORDs
pub const MAX_ROOT_SIGNATURE_DWORDS: u32 = 64;

/// Range type of a descriptor table entry
///
/// The discriminants double as the root indices of the artificial tables
/// used by static resource caches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptorRangeType {
    Srv,
    Uav,
    Cbv,
    Sampler,
}

impl DescriptorRangeType {
    pub const COUNT: usize = 4;

    pub fn index(self) -> usize {
        match self {
            DescriptorRangeType::Srv => 0,
            DescriptorRangeType::Uav => 1,
            DescriptorRangeType::Cbv => 2,
            DescriptorRangeType::Sampler => 3,
        }
    }

    pub fn heap_type(self) -> DescriptorHeapType {
        match self {
            DescriptorRangeType::Sampler => DescriptorHeapType::Sampler,
            _ => DescriptorHeapType::CbvSrvUav,
        }
    }

    pub fn for_kind(kind: ShaderResourceKind) -> Self {
        match kind {
            ShaderResourceKind::ConstantBuffer => DescriptorRangeType::Cbv,
            ShaderResourceKind::TextureSrv | ShaderResourceKind::BufferSrv => DescriptorRangeType::Srv,
            ShaderResourceKind::TextureUav | ShaderResourceKind::BufferUav => DescriptorRangeType::Uav,
            ShaderResourceKind::Sampler => DescriptorRangeType::Sampler,
        }
    }
}

/// Shader-visible descriptor heap kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptorHeapType {
    CbvSrvUav,
    Sampler,
}

impl DescriptorHeapType {
    pub const COUNT: usize = 2;

    pub const ALL: [DescriptorHeapType; Self::COUNT] = [
        DescriptorHeapType::CbvSrvUav,
        DescriptorHeapType::Sampler,
    ];

    pub fn index(self) -> usize {
        match self {
            DescriptorHeapType::CbvSrvUav => 0,
            DescriptorHeapType::Sampler => 1,
        }
    }

    pub fn for_kind(kind: ShaderResourceKind) -> Self {
        DescriptorRangeType::for_kind(kind).heap_type()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DescriptorHeapType::CbvSrvUav => "CBV/SRV/UAV",
            DescriptorHeapType::Sampler => "Sampler",
        }
    }
}

/// Stages that can see a root parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderVisibility {
    All,
    Vertex,
    Pixel,
    Geometry,
    Hull,
    Domain,
}

impl From<ShaderStage> for ShaderVisibility {
    fn from(stage: ShaderStage) -> Self {
        match stage {
            ShaderStage::Vertex => ShaderVisibility::Vertex,
            ShaderStage::Pixel => ShaderVisibility::Pixel,
            ShaderStage::Geometry => ShaderVisibility::Geometry,
            ShaderStage::Hull => ShaderVisibility::Hull,
            ShaderStage::Domain => ShaderVisibility::Domain,
            // Compute root signatures only know ALL
            ShaderStage::Compute => ShaderVisibility::All,
        }
    }
}

// ============================================================================
// Handles and addresses
// ============================================================================

/// CPU descriptor of a view, sampler or constant buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CpuDescriptorHandle(u64);

impl CpuDescriptorHandle {
    pub fn from_id(id: ResourceId) -> Self {
        Self(id.raw())
    }

    /// Descriptor created for `object`
    ///
    /// Dynamic buffers live in the upload ring and have no CBV descriptor.
    pub fn for_object(object: &DeviceObject) -> Option<Self> {
        match object {
            DeviceObject::Buffer(buffer) if buffer.is_dynamic() => None,
            _ => Some(Self::from_id(object.id())),
        }
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Position of a descriptor in a shader-visible heap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GpuDescriptorHandle {
    pub heap_type: DescriptorHeapType,
    pub index: u32,
}

/// GPU address of constant buffer data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GpuVirtualAddress(pub u64);

impl GpuVirtualAddress {
    /// Address of a buffer that lives in its own default-heap allocation
    pub fn for_buffer(buffer: &Buffer) -> Self {
        Self(buffer.id().raw() << 16)
    }
}

// ============================================================================
// Root signature description
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DescriptorRange {
    pub range_type: DescriptorRangeType,
    pub num_descriptors: u32,
    pub base_shader_register: u32,
    pub register_space: u32,
    pub offset_from_table_start: u32,
}

/// One slot of the native root signature
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RootParameterDesc {
    DescriptorTable {
        visibility: ShaderVisibility,
        ranges: Vec<DescriptorRange>,
    },
    ConstantBufferView {
        visibility: ShaderVisibility,
        shader_register: u32,
        register_space: u32,
    },
}

impl RootParameterDesc {
    /// Root argument cost in DWORDs
    pub fn dword_cost(&self) -> u32 {
        match self {
            RootParameterDesc::DescriptorTable { .. } => 1,
            RootParameterDesc::ConstantBufferView { .. } => 2,
        }
    }
}

/// Sampler baked into the root signature
#[derive(Debug, Clone, PartialEq)]
pub struct StaticSamplerDesc {
    pub desc: SamplerDesc,
    pub shader_register: u32,
    pub register_space: u32,
    pub visibility: ShaderVisibility,
}

/// Serialized form of a finalized root signature
#[derive(Debug, Clone, PartialEq)]
pub struct RootSignatureDesc {
    /// Parameters in root index order
    pub parameters: Vec<RootParameterDesc>,
    pub static_samplers: Vec<StaticSamplerDesc>,
}

impl RootSignatureDesc {
    pub fn dword_cost(&self) -> u32 {
        self.parameters.iter().map(RootParameterDesc::dword_cost).sum()
    }
}

// ============================================================================
// Barriers
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceBarrier {
    Transition {
        resource: ResourceId,
        name: String,
        before: ResourceState,
        after: ResourceState,
    },
    /// Orders UAV accesses to a resource that stays in the UAV state
    Uav {
        resource: ResourceId,
        name: String,
    },
}

impl ResourceBarrier {
    pub fn resource(&self) -> ResourceId {
        match self {
            ResourceBarrier::Transition { resource, .. } => *resource,
            ResourceBarrier::Uav { resource, .. } => *resource,
        }
    }
}
