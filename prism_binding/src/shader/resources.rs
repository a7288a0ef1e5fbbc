/// Reflected shader resources
///
/// `ShaderResources` is the read-only reflection of one shader stage, shared by
/// every layout built from that shader. Resources are kept in a canonical order
/// (kind, bind point, name) so that the order in which a compiler reports them
/// never leaks into root signatures or program hashes.

use crate::error::Result;
use crate::shader::ShaderStage;
use crate::engine_bail;
use rustc_hash::FxHashSet;

/// Kind of a reflected shader resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShaderResourceKind {
    /// Constant (uniform) buffer
    ConstantBuffer,
    /// Read-only texture view
    TextureSrv,
    /// Read-write texture view
    TextureUav,
    /// Read-only buffer view
    BufferSrv,
    /// Read-write buffer view
    BufferUav,
    /// Separate sampler object
    Sampler,
}

impl ShaderResourceKind {
    /// Every kind in canonical order
    pub const ALL: [ShaderResourceKind; 6] = [
        ShaderResourceKind::ConstantBuffer,
        ShaderResourceKind::TextureSrv,
        ShaderResourceKind::TextureUav,
        ShaderResourceKind::BufferSrv,
        ShaderResourceKind::BufferUav,
        ShaderResourceKind::Sampler,
    ];

    pub fn index(self) -> usize {
        match self {
            ShaderResourceKind::ConstantBuffer => 0,
            ShaderResourceKind::TextureSrv => 1,
            ShaderResourceKind::TextureUav => 2,
            ShaderResourceKind::BufferSrv => 3,
            ShaderResourceKind::BufferUav => 4,
            ShaderResourceKind::Sampler => 5,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ShaderResourceKind::ConstantBuffer => "constant buffer",
            ShaderResourceKind::TextureSrv => "texture SRV",
            ShaderResourceKind::TextureUav => "texture UAV",
            ShaderResourceKind::BufferSrv => "buffer SRV",
            ShaderResourceKind::BufferUav => "buffer UAV",
            ShaderResourceKind::Sampler => "sampler",
        }
    }

    pub fn is_uav(self) -> bool {
        matches!(self, ShaderResourceKind::TextureUav | ShaderResourceKind::BufferUav)
    }
}

/// Reflection record of a single resource
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShaderResourceAttribs {
    /// Resource name as declared in the shader
    pub name: String,
    /// Resource kind
    pub kind: ShaderResourceKind,
    /// First register / binding point
    pub bind_point: u32,
    /// Array size (1 for non-arrays)
    pub bind_count: u32,
}

impl ShaderResourceAttribs {
    pub fn new(name: impl Into<String>, kind: ShaderResourceKind, bind_point: u32, bind_count: u32) -> Self {
        Self {
            name: name.into(),
            kind,
            bind_point,
            bind_count,
        }
    }

    pub fn is_array(&self) -> bool {
        self.bind_count > 1
    }

    /// Name used in diagnostics: `g_Tex[2]` for array elements, `g_Tex` otherwise
    pub fn print_name(&self, array_index: u32) -> String {
        if self.bind_count > 1 {
            format!("{}[{}]", self.name, array_index)
        } else {
            self.name.clone()
        }
    }
}

/// Reflected resources of one shader stage
#[derive(Debug, Clone)]
pub struct ShaderResources {
    shader_name: String,
    stage: ShaderStage,
    resources: Vec<ShaderResourceAttribs>,
    /// Start index of each kind in `resources`, plus the end
    kind_offsets: [usize; 7],
    combined_sampler_suffix: Option<String>,
}

impl ShaderResources {
    /// Build the reflection of one stage
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidResource` if two resources share a name or a
    /// resource has an array size of zero.
    pub fn new(
        shader_name: impl Into<String>,
        stage: ShaderStage,
        mut resources: Vec<ShaderResourceAttribs>,
        combined_sampler_suffix: Option<String>,
    ) -> Result<Self> {
        let shader_name = shader_name.into();

        {
            let mut names = FxHashSet::default();
            for res in &resources {
                if res.bind_count == 0 {
                    engine_bail!(InvalidResource => "prism::ShaderResources",
                        "Resource '{}' in shader '{}' has zero array size", res.name, shader_name);
                }
                if !names.insert(res.name.as_str()) {
                    engine_bail!(InvalidResource => "prism::ShaderResources",
                        "Shader '{}' declares resource '{}' more than once", shader_name, res.name);
                }
            }
        }

        resources.sort_by(|a, b| {
            (a.kind, a.bind_point, &a.name).cmp(&(b.kind, b.bind_point, &b.name))
        });

        let mut kind_offsets = [0usize; 7];
        for kind in ShaderResourceKind::ALL {
            kind_offsets[kind.index() + 1] = kind_offsets[kind.index()]
                + resources.iter().filter(|r| r.kind == kind).count();
        }

        Ok(Self {
            shader_name,
            stage,
            resources,
            kind_offsets,
            combined_sampler_suffix: combined_sampler_suffix.filter(|s| !s.is_empty()),
        })
    }

    pub fn shader_name(&self) -> &str {
        &self.shader_name
    }

    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// All resources in canonical order
    pub fn resources(&self) -> &[ShaderResourceAttribs] {
        &self.resources
    }

    pub fn resource(&self, index: usize) -> &ShaderResourceAttribs {
        &self.resources[index]
    }

    /// Contiguous slice of the resources of one kind
    pub fn of_kind(&self, kind: ShaderResourceKind) -> &[ShaderResourceAttribs] {
        &self.resources[self.kind_offsets[kind.index()]..self.kind_offsets[kind.index() + 1]]
    }

    pub fn count(&self, kind: ShaderResourceKind) -> usize {
        self.kind_offsets[kind.index() + 1] - self.kind_offsets[kind.index()]
    }

    /// Index of the resource called `name`
    pub fn find(&self, name: &str) -> Option<usize> {
        self.resources.iter().position(|r| r.name == name)
    }

    pub fn combined_sampler_suffix(&self) -> Option<&str> {
        self.combined_sampler_suffix.as_deref()
    }

    /// Textures are paired with `<texture><suffix>` samplers
    pub fn is_using_combined_samplers(&self) -> bool {
        self.combined_sampler_suffix.is_some()
    }

    /// Index (within [`of_kind`](Self::of_kind)`(Sampler)`) of the sampler paired with `texture`
    pub fn find_assigned_sampler(&self, texture: &ShaderResourceAttribs) -> Option<usize> {
        let suffix = self.combined_sampler_suffix.as_deref()?;
        if texture.kind != ShaderResourceKind::TextureSrv {
            return None;
        }
        self.of_kind(ShaderResourceKind::Sampler)
            .iter()
            .position(|s| s.name.len() == texture.name.len() + suffix.len()
                && s.name.starts_with(texture.name.as_str())
                && s.name.ends_with(suffix))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "resources_tests.rs"]
mod tests;
