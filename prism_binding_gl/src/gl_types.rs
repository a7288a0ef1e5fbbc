/// In-memory model of the native GL binding objects
///
/// Program and program pipeline names are handed out from process-wide
/// counters the way a driver would, and every bind call the context makes is
/// recorded as a `GlCommand`.

use bitflags::bitflags;
use prism_binding::prism::resource::ResourceId;
use prism_binding::prism::shader::ShaderResourceKind;
use std::sync::atomic::{AtomicU32, Ordering};

/// Name of a linked program object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramId(u32);

impl ProgramId {
    pub(crate) fn next() -> Self {
        static NEXT_PROGRAM: AtomicU32 = AtomicU32::new(1);
        Self(NEXT_PROGRAM.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(self) -> u32 {
        self.0
    }
}

/// Name of a program pipeline object combining separable programs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramPipelineId(u32);

impl ProgramPipelineId {
    pub(crate) fn next() -> Self {
        static NEXT_PIPELINE: AtomicU32 = AtomicU32::new(1);
        Self(NEXT_PIPELINE.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(self) -> u32 {
        self.0
    }
}

/// What a pipeline state binds before drawing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GlProgramObject {
    /// All stages linked into one program
    Program(ProgramId),
    /// One separable program per stage
    Pipeline {
        pipeline: ProgramPipelineId,
        programs: Vec<ProgramId>,
    },
}

/// Binding-slot category of a program resource
///
/// Every category has its own binding space, numbered from zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GlResourceCategory {
    UniformBlock,
    Sampler,
    Image,
    StorageBlock,
}

impl GlResourceCategory {
    pub const COUNT: usize = 4;

    pub const ALL: [GlResourceCategory; Self::COUNT] = [
        GlResourceCategory::UniformBlock,
        GlResourceCategory::Sampler,
        GlResourceCategory::Image,
        GlResourceCategory::StorageBlock,
    ];

    pub fn index(self) -> usize {
        match self {
            GlResourceCategory::UniformBlock => 0,
            GlResourceCategory::Sampler => 1,
            GlResourceCategory::Image => 2,
            GlResourceCategory::StorageBlock => 3,
        }
    }

    /// Category a shader resource is bound through; separate samplers have none
    pub fn for_kind(kind: ShaderResourceKind) -> Option<Self> {
        match kind {
            ShaderResourceKind::ConstantBuffer => Some(GlResourceCategory::UniformBlock),
            ShaderResourceKind::TextureSrv => Some(GlResourceCategory::Sampler),
            ShaderResourceKind::TextureUav => Some(GlResourceCategory::Image),
            ShaderResourceKind::BufferSrv | ShaderResourceKind::BufferUav => Some(GlResourceCategory::StorageBlock),
            ShaderResourceKind::Sampler => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GlResourceCategory::UniformBlock => "uniform block",
            GlResourceCategory::Sampler => "sampler",
            GlResourceCategory::Image => "image",
            GlResourceCategory::StorageBlock => "storage block",
        }
    }
}

bitflags! {
    /// glMemoryBarrier bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MemoryBarrier: u32 {
        const VERTEX_ATTRIB_ARRAY  = 0x0001;
        const ELEMENT_ARRAY        = 0x0002;
        const UNIFORM              = 0x0004;
        const TEXTURE_FETCH        = 0x0008;
        const SHADER_IMAGE_ACCESS  = 0x0020;
        const COMMAND              = 0x0040;
        const PIXEL_BUFFER         = 0x0080;
        const TEXTURE_UPDATE       = 0x0100;
        const BUFFER_UPDATE        = 0x0200;
        const FRAMEBUFFER          = 0x0400;
        const TRANSFORM_FEEDBACK   = 0x0800;
        const ATOMIC_COUNTER       = 0x1000;
        const SHADER_STORAGE       = 0x2000;
        const CLIENT_MAPPED_BUFFER = 0x4000;

        /// Required before any later access to a texture written through an image
        const TEXTURE_WRITE = Self::TEXTURE_UPDATE.bits()
            | Self::TEXTURE_FETCH.bits()
            | Self::PIXEL_BUFFER.bits()
            | Self::FRAMEBUFFER.bits()
            | Self::SHADER_IMAGE_ACCESS.bits();

        /// Required before any later access to a buffer written by a shader
        const BUFFER_WRITE = Self::VERTEX_ATTRIB_ARRAY.bits()
            | Self::ELEMENT_ARRAY.bits()
            | Self::UNIFORM.bits()
            | Self::COMMAND.bits()
            | Self::BUFFER_UPDATE.bits()
            | Self::CLIENT_MAPPED_BUFFER.bits()
            | Self::SHADER_STORAGE.bits()
            | Self::TEXTURE_FETCH.bits()
            | Self::SHADER_IMAGE_ACCESS.bits();
    }
}

/// One recorded GL call
#[derive(Debug, Clone, PartialEq)]
pub enum GlCommand {
    UseProgram(ProgramId),
    BindProgramPipeline(ProgramPipelineId),
    BindUniformBuffer {
        binding: u32,
        buffer: ResourceId,
    },
    BindTexture {
        unit: u32,
        view: ResourceId,
    },
    /// `None` restores the sampling parameters of the texture
    BindSampler {
        unit: u32,
        sampler: Option<ResourceId>,
    },
    BindImage {
        unit: u32,
        view: ResourceId,
    },
    BindStorageBlock {
        binding: u32,
        view: ResourceId,
    },
    MemoryBarrier(MemoryBarrier),
    Draw {
        vertex_count: u32,
        first_vertex: u32,
    },
    Dispatch {
        x: u32,
        y: u32,
        z: u32,
    },
}
