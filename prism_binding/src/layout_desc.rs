//! Resource layout configuration
//!
//! A pipeline decides how often each shader resource changes by matching the
//! resource name against a list of overrides. Anything not listed falls back to
//! the default variable type. Immutable samplers are listed here as well and are
//! baked into the pipeline instead of being bindable.

use bitflags::bitflags;
use crate::error::Result;
use crate::resource::SamplerDesc;
use crate::shader::{ShaderResourceAttribs, ShaderResourceKind, ShaderResources, ShaderStage, ShaderStageFlags};
use crate::utils::streq_suff;
use crate::{engine_bail, engine_warn};

// ============================================================================
// Variable types
// ============================================================================

/// Binding frequency of a shader resource variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VariableType {
    /// Bound once on the pipeline state, copied into every binding object
    Static,
    /// Bound once per shader resource binding object
    Mutable,
    /// May be rebound between draws on the same binding object
    Dynamic,
}

impl VariableType {
    pub const COUNT: usize = 3;

    pub const ALL: [VariableType; Self::COUNT] = [
        VariableType::Static,
        VariableType::Mutable,
        VariableType::Dynamic,
    ];

    pub fn index(self) -> usize {
        match self {
            VariableType::Static => 0,
            VariableType::Mutable => 1,
            VariableType::Dynamic => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            VariableType::Static => "static",
            VariableType::Mutable => "mutable",
            VariableType::Dynamic => "dynamic",
        }
    }

    pub fn flag(self) -> VariableTypeFlags {
        match self {
            VariableType::Static => VariableTypeFlags::STATIC,
            VariableType::Mutable => VariableTypeFlags::MUTABLE,
            VariableType::Dynamic => VariableTypeFlags::DYNAMIC,
        }
    }
}

bitflags! {
    /// Filter selecting which variable types a layout or manager handles
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct VariableTypeFlags: u32 {
        const STATIC  = 0x01;
        const MUTABLE = 0x02;
        const DYNAMIC = 0x04;
        const MUTABLE_DYNAMIC = Self::MUTABLE.bits() | Self::DYNAMIC.bits();
        const ALL = Self::STATIC.bits() | Self::MUTABLE.bits() | Self::DYNAMIC.bits();
    }
}

impl VariableTypeFlags {
    pub fn contains_type(self, var_type: VariableType) -> bool {
        self.contains(var_type.flag())
    }

    pub fn from_types(types: &[VariableType]) -> Self {
        types.iter().fold(Self::empty(), |acc, t| acc | t.flag())
    }
}

// ============================================================================
// Layout description
// ============================================================================

/// Variable type override for one name or name pattern
///
/// A name ending with `*` is a prefix pattern (`"g_Light*"`).
#[derive(Debug, Clone)]
pub struct ShaderVariableDesc {
    pub name: String,
    pub stages: ShaderStageFlags,
    pub var_type: VariableType,
}

impl ShaderVariableDesc {
    pub fn new(name: impl Into<String>, stages: ShaderStageFlags, var_type: VariableType) -> Self {
        Self { name: name.into(), stages, var_type }
    }
}

/// Sampler baked into the pipeline for a sampler or texture name
#[derive(Debug, Clone)]
pub struct ImmutableSamplerDesc {
    /// Sampler name, or texture name when combined samplers are used
    pub name: String,
    pub stages: ShaderStageFlags,
    pub desc: SamplerDesc,
}

impl ImmutableSamplerDesc {
    pub fn new(name: impl Into<String>, stages: ShaderStageFlags, desc: SamplerDesc) -> Self {
        Self { name: name.into(), stages, desc }
    }
}

/// How the resources of a pipeline are classified
#[derive(Debug, Clone)]
pub struct PipelineResourceLayoutDesc {
    /// Type of every resource not matched by `variables`
    pub default_variable_type: VariableType,
    /// Per-name overrides
    pub variables: Vec<ShaderVariableDesc>,
    /// Samplers baked into the pipeline
    pub immutable_samplers: Vec<ImmutableSamplerDesc>,
}

impl Default for PipelineResourceLayoutDesc {
    fn default() -> Self {
        Self {
            default_variable_type: VariableType::Static,
            variables: Vec::new(),
            immutable_samplers: Vec::new(),
        }
    }
}

/// Strength of a name match; larger wins
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum MatchRank {
    Prefix(usize),
    Exact,
}

fn match_rank(pattern: &str, name: &str, sampler_suffix: Option<&str>) -> Option<MatchRank> {
    if let Some(prefix) = pattern.strip_suffix('*') {
        return name.starts_with(prefix).then_some(MatchRank::Prefix(prefix.len()));
    }
    if pattern == name {
        return Some(MatchRank::Exact);
    }
    // A sampler inherits the type of the texture it is combined with
    if sampler_suffix.is_some() && streq_suff(name, pattern, sampler_suffix, true) {
        return Some(MatchRank::Exact);
    }
    None
}

impl PipelineResourceLayoutDesc {
    /// Resolve the variable type of `resource` in `stage`
    ///
    /// Only overrides whose stages include `stage` are considered. An exact
    /// name wins over any pattern and a longer pattern prefix wins over a
    /// shorter one. Ties go to the override declared first.
    pub fn find_variable_type(
        &self,
        stage: ShaderStage,
        resource: &ShaderResourceAttribs,
        combined_sampler_suffix: Option<&str>,
    ) -> VariableType {
        let sampler_suffix = if resource.kind == ShaderResourceKind::Sampler {
            combined_sampler_suffix
        } else {
            None
        };

        let mut best: Option<(MatchRank, VariableType)> = None;
        for var in self.variables.iter().filter(|v| v.stages.contains_stage(stage)) {
            if let Some(rank) = match_rank(&var.name, &resource.name, sampler_suffix) {
                if best.map_or(true, |(best_rank, _)| rank > best_rank) {
                    best = Some((rank, var.var_type));
                }
            }
        }
        best.map_or(self.default_variable_type, |(_, var_type)| var_type)
    }

    /// Index of the immutable sampler assigned to `resource_name` in `stage`
    ///
    /// Sampler `Tex_sampler` matches an entry named `Tex` or `Tex_sampler`;
    /// texture `Tex` matches an entry named `Tex` or `Tex<suffix>`.
    pub fn find_immutable_sampler(
        &self,
        stage: ShaderStage,
        resource_name: &str,
        combined_sampler_suffix: Option<&str>,
    ) -> Option<usize> {
        self.immutable_samplers.iter().position(|s| {
            s.stages.contains_stage(stage)
                && (streq_suff(resource_name, &s.name, combined_sampler_suffix, false)
                    || (combined_sampler_suffix.is_some()
                        && streq_suff(&s.name, resource_name, combined_sampler_suffix, true)))
        })
    }

    /// Report overrides and immutable samplers that match nothing
    ///
    /// Every unmatched entry is logged as a warning.
    ///
    /// # Errors
    ///
    /// In `strict` mode returns `Error::InvalidResource` if any entry is unmatched.
    pub fn verify(&self, shaders: &[&ShaderResources], strict: bool) -> Result<()> {
        let mut unmatched = 0usize;

        for var in &self.variables {
            let found = shaders.iter()
                .filter(|res| var.stages.contains_stage(res.stage()))
                .any(|res| res.resources().iter().any(|r| {
                    let suffix = if r.kind == ShaderResourceKind::Sampler {
                        res.combined_sampler_suffix()
                    } else {
                        None
                    };
                    match_rank(&var.name, &r.name, suffix).is_some()
                }));
            if !found {
                unmatched += 1;
                engine_warn!("prism::PipelineResourceLayoutDesc",
                    "Variable '{}' defined in the resource layout is not found in any of the designated shader stages",
                    var.name);
            }
        }

        for (index, sampler) in self.immutable_samplers.iter().enumerate() {
            let found = shaders.iter()
                .filter(|res| sampler.stages.contains_stage(res.stage()))
                .any(|res| res.resources().iter()
                    .filter(|r| matches!(r.kind, ShaderResourceKind::Sampler | ShaderResourceKind::TextureSrv))
                    .any(|r| self.find_immutable_sampler(res.stage(), &r.name, res.combined_sampler_suffix()) == Some(index)));
            if !found {
                unmatched += 1;
                engine_warn!("prism::PipelineResourceLayoutDesc",
                    "Immutable sampler '{}' is not assigned to any resource in the designated shader stages",
                    sampler.name);
            }
        }

        if strict && unmatched > 0 {
            engine_bail!(InvalidResource => "prism::PipelineResourceLayoutDesc",
                "{} resource layout entries do not match any shader resource", unmatched);
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "layout_desc_tests.rs"]
mod tests;
