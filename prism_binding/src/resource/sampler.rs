/// Samplers and sampler descriptions

use crate::resource::ResourceId;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Texture filtering mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterType {
    Point,
    Linear,
    Anisotropic,
}

/// Texture coordinate addressing mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressMode {
    Wrap,
    Mirror,
    Clamp,
    Border,
}

/// Comparison function for shadow samplers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonFunc {
    Never,
    Less,
    Equal,
    LessEqual,
    Greater,
    NotEqual,
    GreaterEqual,
    Always,
}

/// Full sampler state
///
/// Float fields are compared and hashed by bit pattern so the description can
/// key the sampler registry.
#[derive(Debug, Clone, Copy)]
pub struct SamplerDesc {
    pub min_filter: FilterType,
    pub mag_filter: FilterType,
    pub mip_filter: FilterType,
    pub address_u: AddressMode,
    pub address_v: AddressMode,
    pub address_w: AddressMode,
    pub mip_lod_bias: f32,
    pub max_anisotropy: u32,
    pub comparison_func: ComparisonFunc,
    pub border_color: [f32; 4],
    pub min_lod: f32,
    pub max_lod: f32,
}

impl Default for SamplerDesc {
    fn default() -> Self {
        Self {
            min_filter: FilterType::Linear,
            mag_filter: FilterType::Linear,
            mip_filter: FilterType::Linear,
            address_u: AddressMode::Clamp,
            address_v: AddressMode::Clamp,
            address_w: AddressMode::Clamp,
            mip_lod_bias: 0.0,
            max_anisotropy: 0,
            comparison_func: ComparisonFunc::Never,
            border_color: [0.0; 4],
            min_lod: 0.0,
            max_lod: f32::MAX,
        }
    }
}

impl SamplerDesc {
    fn float_bits(&self) -> [u32; 7] {
        [
            self.mip_lod_bias.to_bits(),
            self.border_color[0].to_bits(),
            self.border_color[1].to_bits(),
            self.border_color[2].to_bits(),
            self.border_color[3].to_bits(),
            self.min_lod.to_bits(),
            self.max_lod.to_bits(),
        ]
    }
}

impl PartialEq for SamplerDesc {
    fn eq(&self, other: &Self) -> bool {
        self.min_filter == other.min_filter
            && self.mag_filter == other.mag_filter
            && self.mip_filter == other.mip_filter
            && self.address_u == other.address_u
            && self.address_v == other.address_v
            && self.address_w == other.address_w
            && self.max_anisotropy == other.max_anisotropy
            && self.comparison_func == other.comparison_func
            && self.float_bits() == other.float_bits()
    }
}

impl Eq for SamplerDesc {}

impl Hash for SamplerDesc {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.min_filter.hash(state);
        self.mag_filter.hash(state);
        self.mip_filter.hash(state);
        self.address_u.hash(state);
        self.address_v.hash(state);
        self.address_w.hash(state);
        self.max_anisotropy.hash(state);
        self.comparison_func.hash(state);
        self.float_bits().hash(state);
    }
}

/// A sampler object
#[derive(Debug)]
pub struct Sampler {
    id: ResourceId,
    name: String,
    desc: SamplerDesc,
}

impl Sampler {
    pub fn new(name: impl Into<String>, desc: SamplerDesc) -> Arc<Self> {
        Arc::new(Self {
            id: ResourceId::next(),
            name: name.into(),
            desc,
        })
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn desc(&self) -> &SamplerDesc {
        &self.desc
    }
}
