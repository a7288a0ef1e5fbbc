/// ProgramResources - reflected resources of one linked program
///
/// A program covers one stage (separable programs) or every stage of a
/// pipeline. Resources are split into the four GL binding categories and
/// given binding slots in order, starting from counters that the pipeline
/// state shares between its programs, so no two programs of one pipeline
/// use the same slot.

use crate::gl_types::GlResourceCategory;
use prism_binding::prism::shader::{ShaderResourceKind, ShaderResources, ShaderStageFlags};
use prism_binding::prism::utils::HashBuilder;
use prism_binding::prism::Result;
use prism_binding::{engine_bail, engine_trace};

const LOG_SOURCE: &str = "prism::gl::ProgramResources";

/// One uniform block, sampler, image or storage block of a program
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GlResourceAttribs {
    pub name: String,
    /// Every stage of the program that declares the resource
    pub stages: ShaderStageFlags,
    pub kind: ShaderResourceKind,
    /// First binding slot in the space of the resource's category
    pub binding: u32,
    pub array_size: u32,
}

impl GlResourceAttribs {
    pub fn category(&self) -> GlResourceCategory {
        match GlResourceCategory::for_kind(self.kind) {
            Some(category) => category,
            None => unreachable!("separate samplers are never program resources"),
        }
    }

    pub fn print_name(&self, array_index: u32) -> String {
        if self.array_size > 1 {
            format!("{}[{}]", self.name, array_index)
        } else {
            self.name.clone()
        }
    }

    pub fn is_compatible_with(&self, other: &GlResourceAttribs) -> bool {
        self.name == other.name
            && self.stages == other.stages
            && self.kind == other.kind
            && self.binding == other.binding
            && self.array_size == other.array_size
    }
}

/// Next free binding slot of every category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BindingCounters([u32; GlResourceCategory::COUNT]);

impl BindingCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, category: GlResourceCategory) -> u32 {
        self.0[category.index()]
    }

    fn take(&mut self, category: GlResourceCategory, array_size: u32) -> u32 {
        let binding = self.0[category.index()];
        self.0[category.index()] += array_size;
        binding
    }
}

/// Resources of one program, grouped by category
#[derive(Debug, Clone)]
pub struct ProgramResources {
    stages: ShaderStageFlags,
    shader_names: Vec<String>,
    combined_sampler_suffix: Option<String>,
    resources: [Vec<GlResourceAttribs>; GlResourceCategory::COUNT],
    hash: u64,
}

impl ProgramResources {
    /// Merge the resources of `shaders` into one program and assign bindings
    ///
    /// A resource declared by several shaders is one program resource used by
    /// all of their stages. Separate samplers take no slot; the texture they
    /// are combined with is sampled through its own unit.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidResource` if two shaders declare the same name
    /// with a different kind or array size.
    pub fn new(shaders: &[&ShaderResources], counters: &mut BindingCounters) -> Result<Self> {
        let mut stages = ShaderStageFlags::empty();
        let mut merged: Vec<GlResourceAttribs> = Vec::new();
        let mut combined_sampler_suffix = None;

        for shader in shaders {
            stages |= shader.stage().flag();
            if combined_sampler_suffix.is_none() {
                combined_sampler_suffix = shader.combined_sampler_suffix().map(str::to_string);
            }

            for res in shader.resources().iter().filter(|r| r.kind != ShaderResourceKind::Sampler) {
                match merged.iter_mut().find(|m| m.name == res.name) {
                    Some(existing) => {
                        if existing.kind != res.kind || existing.array_size != res.bind_count {
                            engine_bail!(InvalidResource => LOG_SOURCE,
                                "Resource '{}' is declared as {} [{}] in one shader and as {} [{}] in shader '{}'",
                                res.name, existing.kind.as_str(), existing.array_size,
                                res.kind.as_str(), res.bind_count, shader.shader_name());
                        }
                        existing.stages |= shader.stage().flag();
                    }
                    None => merged.push(GlResourceAttribs {
                        name: res.name.clone(),
                        stages: shader.stage().flag(),
                        kind: res.kind,
                        binding: 0,
                        array_size: res.bind_count,
                    }),
                }
            }
        }

        let mut resources: [Vec<GlResourceAttribs>; GlResourceCategory::COUNT] = Default::default();
        for mut res in merged {
            let category = res.category();
            res.binding = counters.take(category, res.array_size);
            resources[category.index()].push(res);
        }

        let mut hash = HashBuilder::new().add(&stages.bits());
        for res in resources.iter().flatten() {
            hash = hash.add(&res.name).add(&res.kind).add(&res.binding).add(&res.array_size).add(&res.stages.bits());
        }

        let program = Self {
            stages,
            shader_names: shaders.iter().map(|s| s.shader_name().to_string()).collect(),
            combined_sampler_suffix,
            resources,
            hash: hash.finish(),
        };
        engine_trace!(LOG_SOURCE, "Program [{}]: {} uniform block(s), {} sampler(s), {} image(s), {} storage block(s)",
            program.shader_names.join(", "),
            program.uniform_blocks().len(), program.samplers().len(),
            program.images().len(), program.storage_blocks().len());
        Ok(program)
    }

    pub fn stages(&self) -> ShaderStageFlags {
        self.stages
    }

    pub fn shader_names(&self) -> &[String] {
        &self.shader_names
    }

    /// Name used in diagnostics
    pub fn name(&self) -> String {
        self.shader_names.join("+")
    }

    pub fn combined_sampler_suffix(&self) -> Option<&str> {
        self.combined_sampler_suffix.as_deref()
    }

    pub fn resources(&self, category: GlResourceCategory) -> &[GlResourceAttribs] {
        &self.resources[category.index()]
    }

    pub fn uniform_blocks(&self) -> &[GlResourceAttribs] {
        self.resources(GlResourceCategory::UniformBlock)
    }

    pub fn samplers(&self) -> &[GlResourceAttribs] {
        self.resources(GlResourceCategory::Sampler)
    }

    pub fn images(&self) -> &[GlResourceAttribs] {
        self.resources(GlResourceCategory::Image)
    }

    pub fn storage_blocks(&self) -> &[GlResourceAttribs] {
        self.resources(GlResourceCategory::StorageBlock)
    }

    /// Every resource, category by category
    pub fn iter(&self) -> impl Iterator<Item = &GlResourceAttribs> {
        self.resources.iter().flatten()
    }

    pub fn len(&self) -> usize {
        self.resources.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn find(&self, name: &str) -> Option<&GlResourceAttribs> {
        self.iter().find(|r| r.name == name)
    }

    pub fn hash(&self) -> u64 {
        self.hash
    }

    /// Same stages and the same resources in the same slots
    pub fn is_compatible_with(&self, other: &ProgramResources) -> bool {
        if self.hash != other.hash || self.stages != other.stages {
            return false;
        }
        self.resources.iter().zip(other.resources.iter()).all(|(a, b)| {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.is_compatible_with(y))
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "program_resources_tests.rs"]
mod tests;
