/// Shader stages and stage masks

use bitflags::bitflags;

/// A single programmable pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShaderStage {
    /// Vertex shader
    Vertex,
    /// Pixel (fragment) shader
    Pixel,
    /// Geometry shader
    Geometry,
    /// Hull (tessellation control) shader
    Hull,
    /// Domain (tessellation evaluation) shader
    Domain,
    /// Compute shader
    Compute,
}

impl ShaderStage {
    /// Number of distinct stages
    pub const COUNT: usize = 6;

    /// Every stage, in index order
    pub const ALL: [ShaderStage; Self::COUNT] = [
        ShaderStage::Vertex,
        ShaderStage::Pixel,
        ShaderStage::Geometry,
        ShaderStage::Hull,
        ShaderStage::Domain,
        ShaderStage::Compute,
    ];

    /// Dense index in `0..COUNT`
    pub fn index(self) -> usize {
        match self {
            ShaderStage::Vertex => 0,
            ShaderStage::Pixel => 1,
            ShaderStage::Geometry => 2,
            ShaderStage::Hull => 3,
            ShaderStage::Domain => 4,
            ShaderStage::Compute => 5,
        }
    }

    pub fn flag(self) -> ShaderStageFlags {
        match self {
            ShaderStage::Vertex => ShaderStageFlags::VERTEX,
            ShaderStage::Pixel => ShaderStageFlags::PIXEL,
            ShaderStage::Geometry => ShaderStageFlags::GEOMETRY,
            ShaderStage::Hull => ShaderStageFlags::HULL,
            ShaderStage::Domain => ShaderStageFlags::DOMAIN,
            ShaderStage::Compute => ShaderStageFlags::COMPUTE,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Pixel => "pixel",
            ShaderStage::Geometry => "geometry",
            ShaderStage::Hull => "hull",
            ShaderStage::Domain => "domain",
            ShaderStage::Compute => "compute",
        }
    }
}

bitflags! {
    /// Set of shader stages a resource or layout entry applies to
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ShaderStageFlags: u32 {
        const VERTEX   = 0x01;
        const PIXEL    = 0x02;
        const GEOMETRY = 0x04;
        const HULL     = 0x08;
        const DOMAIN   = 0x10;
        const COMPUTE  = 0x20;
        const ALL_GRAPHICS = Self::VERTEX.bits()
            | Self::PIXEL.bits()
            | Self::GEOMETRY.bits()
            | Self::HULL.bits()
            | Self::DOMAIN.bits();
    }
}

impl ShaderStageFlags {
    /// Whether the mask includes `stage`
    pub fn contains_stage(self, stage: ShaderStage) -> bool {
        self.contains(stage.flag())
    }

    /// Iterate over the individual stages in index order
    pub fn stages(self) -> impl Iterator<Item = ShaderStage> {
        ShaderStage::ALL.into_iter().filter(move |s| self.contains(s.flag()))
    }
}

impl From<ShaderStage> for ShaderStageFlags {
    fn from(stage: ShaderStage) -> Self {
        stage.flag()
    }
}
