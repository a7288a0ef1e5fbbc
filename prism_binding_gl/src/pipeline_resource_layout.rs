/// PipelineResourceLayout - variables of every program of a pipeline state
///
/// The layout classifies the resources of the programs by variable type,
/// keeps those of the allowed types and records where each one lives in a
/// `ProgramResourceCache`. Placement is the binding assigned when the
/// programs were reflected, so the same layout works with any cache sized
/// by `cache_sizes()`.
///
/// Immutable samplers are looked up once per texture here, while the
/// variables are placed.

use crate::gl_types::GlResourceCategory;
use crate::program_resource_cache::ProgramResourceCache;
use crate::program_resources::{GlResourceAttribs, ProgramResources};
use prism_binding::prism::layout::{PipelineResourceLayoutDesc, VariableType, VariableTypeFlags};
use prism_binding::prism::resource::{BindFlags, BufferViewType, DeviceObject, ResourceId, Sampler, TextureViewType};
use prism_binding::prism::shader::{ShaderResourceAttribs, ShaderResourceKind, ShaderStage};
use prism_binding::{engine_error, engine_trace};
use std::sync::Arc;

const LOG_SOURCE: &str = "prism::gl::PipelineResourceLayout";

/// One program resource exposed as a variable
#[derive(Debug, Clone)]
pub struct GlVariable {
    attribs: GlResourceAttribs,
    var_type: VariableType,
    /// Index into the immutable samplers of the layout description
    immutable_sampler: Option<usize>,
    program: usize,
}

impl GlVariable {
    pub fn attribs(&self) -> &GlResourceAttribs {
        &self.attribs
    }

    pub fn name(&self) -> &str {
        &self.attribs.name
    }

    pub fn var_type(&self) -> VariableType {
        self.var_type
    }

    pub fn category(&self) -> GlResourceCategory {
        self.attribs.category()
    }

    pub fn immutable_sampler(&self) -> Option<usize> {
        self.immutable_sampler
    }

    pub fn program(&self) -> usize {
        self.program
    }

    fn bindings(&self) -> std::ops::Range<u32> {
        self.attribs.binding..self.attribs.binding + self.attribs.array_size
    }
}

/// Position of a variable in a layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariableRef {
    category: GlResourceCategory,
    index: usize,
}

/// Variable type of a program resource declared in several stages
///
/// The first stage whose overrides change the type decides it.
fn resolve_variable_type(layout_desc: &PipelineResourceLayoutDesc, attribs: &GlResourceAttribs) -> VariableType {
    let reflected = ShaderResourceAttribs::new(attribs.name.as_str(), attribs.kind, attribs.binding, attribs.array_size);
    attribs.stages.stages()
        .map(|stage| layout_desc.find_variable_type(stage, &reflected, None))
        .find(|&var_type| var_type != layout_desc.default_variable_type)
        .unwrap_or(layout_desc.default_variable_type)
}

#[derive(Debug)]
pub struct PipelineResourceLayout {
    pipeline_name: String,
    program_names: Vec<String>,
    variables: [Vec<GlVariable>; GlResourceCategory::COUNT],
    stage_variables: [Vec<VariableRef>; ShaderStage::COUNT],
    cache_sizes: [u32; GlResourceCategory::COUNT],
}

impl PipelineResourceLayout {
    /// Expose every resource of `programs` whose variable type is in `allowed`
    pub fn new(
        pipeline_name: &str,
        programs: &[ProgramResources],
        layout_desc: &PipelineResourceLayoutDesc,
        allowed: VariableTypeFlags,
    ) -> Self {
        let mut variables: [Vec<GlVariable>; GlResourceCategory::COUNT] = Default::default();
        let mut cache_sizes = [0u32; GlResourceCategory::COUNT];

        for (program_index, program) in programs.iter().enumerate() {
            for attribs in program.iter() {
                let var_type = resolve_variable_type(layout_desc, attribs);
                if !allowed.contains_type(var_type) {
                    continue;
                }

                let immutable_sampler = if attribs.kind == ShaderResourceKind::TextureSrv {
                    attribs.stages.stages().find_map(|stage| {
                        layout_desc.find_immutable_sampler(stage, &attribs.name, program.combined_sampler_suffix())
                    })
                } else {
                    None
                };

                let category = attribs.category();
                let size = &mut cache_sizes[category.index()];
                *size = (*size).max(attribs.binding + attribs.array_size);
                variables[category.index()].push(GlVariable {
                    attribs: attribs.clone(),
                    var_type,
                    immutable_sampler,
                    program: program_index,
                });
            }
        }

        let mut stage_variables: [Vec<VariableRef>; ShaderStage::COUNT] = Default::default();
        for category in GlResourceCategory::ALL {
            for (index, var) in variables[category.index()].iter().enumerate() {
                for stage in var.attribs.stages.stages() {
                    stage_variables[stage.index()].push(VariableRef { category, index });
                }
            }
        }

        engine_trace!(LOG_SOURCE, "Pipeline '{}' ({:?}): {} variable(s), cache slots {:?}",
            pipeline_name, allowed, variables.iter().map(Vec::len).sum::<usize>(), cache_sizes);

        Self {
            pipeline_name: pipeline_name.to_string(),
            program_names: programs.iter().map(ProgramResources::name).collect(),
            variables,
            stage_variables,
            cache_sizes,
        }
    }

    // ===== ACCESSORS =====

    pub fn pipeline_name(&self) -> &str {
        &self.pipeline_name
    }

    /// Slots per category a cache needs to hold every variable of this layout
    pub fn cache_sizes(&self) -> [u32; GlResourceCategory::COUNT] {
        self.cache_sizes
    }

    /// Size `cache` for this layout unless it is sized already
    pub fn init_cache(&self, cache: &mut ProgramResourceCache) {
        if !cache.is_initialized() {
            cache.initialize(self.cache_sizes);
        }
    }

    pub fn variables(&self, category: GlResourceCategory) -> &[GlVariable] {
        &self.variables[category.index()]
    }

    pub fn total_variable_count(&self) -> usize {
        self.variables.iter().map(Vec::len).sum()
    }

    pub fn variable(&self, var_ref: VariableRef) -> &GlVariable {
        &self.variables[var_ref.category.index()][var_ref.index]
    }

    /// Variables used by `stage`, uniform blocks first
    pub fn stage_variables(&self, stage: ShaderStage) -> &[VariableRef] {
        &self.stage_variables[stage.index()]
    }

    /// Variable named `name` in `stage`
    pub fn find(&self, stage: ShaderStage, name: &str) -> Option<&GlVariable> {
        self.stage_variables(stage).iter().map(|&r| self.variable(r)).find(|v| v.attribs.name == name)
    }

    fn program_name(&self, var: &GlVariable) -> &str {
        &self.program_names[var.program]
    }

    // ===== BINDING =====

    /// Bind `object` to element `array_index` of `var` in `cache`
    ///
    /// `None` resets the element. Type mismatches and attempts to rebind a
    /// non-dynamic variable are logged and leave the slot unchanged.
    pub fn bind_resource(
        &self,
        var: &GlVariable,
        object: Option<&DeviceObject>,
        array_index: u32,
        cache: &mut ProgramResourceCache,
    ) {
        debug_assert!(array_index < var.attribs.array_size, "Array index is out of range");
        let binding = var.attribs.binding + array_index;
        let category = var.category();

        let Some(object) = object else {
            if var.var_type != VariableType::Dynamic && cache.is_bound(category, binding) {
                engine_error!(LOG_SOURCE,
                    "Shader variable '{}' in shader '{}' is not dynamic but is being reset to null. This is an error and may cause unpredicted behavior. Use another shader resource binding instance or label the variable as dynamic if you need to bind another resource.",
                    var.attribs.print_name(array_index), self.program_name(var));
            }
            self.write_slot(var, binding, None, cache);
            return;
        };

        if !self.check_object(var, object, array_index) {
            return;
        }

        if var.var_type != VariableType::Dynamic && cache.is_bound(category, binding) {
            if bound_object_id(cache, category, binding) != Some(object.id()) {
                engine_error!(LOG_SOURCE,
                    "Non-null {} is already bound to {} shader variable '{}' in shader '{}'. Attempting to bind another resource ('{}') is an error and may cause unpredicted behavior. Use another shader resource binding instance or label the variable as dynamic.",
                    category.as_str(), var.var_type.as_str(), var.attribs.print_name(array_index),
                    self.program_name(var), object.name());
            }
            return;
        }

        self.write_slot(var, binding, Some(object), cache);
    }

    fn write_slot(&self, var: &GlVariable, binding: u32, object: Option<&DeviceObject>, cache: &mut ProgramResourceCache) {
        match var.category() {
            GlResourceCategory::UniformBlock => {
                cache.set_uniform_buffer(binding, object.and_then(DeviceObject::as_buffer).cloned());
            }
            GlResourceCategory::Sampler => {
                let view = object.and_then(DeviceObject::as_texture_view).cloned();
                cache.set_tex_sampler(binding, view, var.immutable_sampler.is_none());
            }
            GlResourceCategory::Image => {
                cache.set_tex_image(binding, object.and_then(DeviceObject::as_texture_view).cloned());
            }
            GlResourceCategory::StorageBlock => {
                cache.set_ssbo(binding, object.and_then(DeviceObject::as_buffer_view).cloned());
            }
        }
    }

    /// Check that `object` can be bound to `var`
    fn check_object(&self, var: &GlVariable, object: &DeviceObject, array_index: u32) -> bool {
        let var_name = var.attribs.print_name(array_index);
        let type_error = |expected: &str| {
            engine_error!(LOG_SOURCE,
                "Failed to bind resource '{}' to variable '{}' in shader '{}'. Invalid resource type: {} is expected.",
                object.name(), var_name, self.program_name(var), expected);
            false
        };
        let view_type_error = |expected: &dyn std::fmt::Debug, actual: &dyn std::fmt::Debug| {
            engine_error!(LOG_SOURCE,
                "Error binding '{}' to variable '{}' in shader '{}'. Incorrect view type: {:?} is expected, {:?} is provided.",
                object.name(), var_name, self.program_name(var), expected, actual);
            false
        };

        match var.attribs.kind {
            ShaderResourceKind::ConstantBuffer => match object.as_buffer() {
                Some(buffer) if !buffer.desc().bind_flags.contains(BindFlags::UNIFORM_BUFFER) => {
                    engine_error!(LOG_SOURCE,
                        "Error binding buffer '{}' to variable '{}' in shader '{}'. The buffer was not created with BindFlags::UNIFORM_BUFFER flag.",
                        buffer.name(), var_name, self.program_name(var));
                    false
                }
                Some(_) => true,
                None => type_error("buffer"),
            },
            ShaderResourceKind::TextureSrv | ShaderResourceKind::TextureUav => {
                let expected = if var.attribs.kind == ShaderResourceKind::TextureSrv {
                    TextureViewType::ShaderResource
                } else {
                    TextureViewType::UnorderedAccess
                };
                match object.as_texture_view() {
                    Some(view) if view.view_type() != expected => view_type_error(&expected, &view.view_type()),
                    Some(_) => true,
                    None => type_error("texture view"),
                }
            }
            ShaderResourceKind::BufferSrv | ShaderResourceKind::BufferUav => {
                let expected = if var.attribs.kind == ShaderResourceKind::BufferSrv {
                    BufferViewType::ShaderResource
                } else {
                    BufferViewType::UnorderedAccess
                };
                match object.as_buffer_view() {
                    Some(view) if view.view_type() != expected => view_type_error(&expected, &view.view_type()),
                    Some(_) => true,
                    None => type_error("buffer view"),
                }
            }
            ShaderResourceKind::Sampler => type_error("sampler"),
        }
    }

    /// Whether element `array_index` of `var` holds an object in `cache`
    pub fn is_bound(&self, var: &GlVariable, array_index: u32, cache: &ProgramResourceCache) -> bool {
        array_index < var.attribs.array_size && cache.is_bound(var.category(), var.attribs.binding + array_index)
    }

    /// Write the immutable samplers of this layout's textures into `cache`
    ///
    /// `samplers` is indexed like the immutable samplers of the layout
    /// description the layout was built from.
    pub fn init_immutable_samplers(&self, cache: &mut ProgramResourceCache, samplers: &[Arc<Sampler>]) {
        for var in self.variables(GlResourceCategory::Sampler) {
            let Some(sampler) = var.immutable_sampler.and_then(|index| samplers.get(index)) else {
                continue;
            };
            for binding in var.bindings() {
                cache.set_immutable_sampler(binding, Arc::clone(sampler));
            }
        }
    }

    // ===== STATIC RESOURCES =====

    /// Copy every slot of this layout's variables from `src` into `dst`
    ///
    /// Both caches must come from compatible pipelines, which place every
    /// variable at the same binding.
    pub fn copy_resources(&self, src: &ProgramResourceCache, dst: &mut ProgramResourceCache) {
        for category in GlResourceCategory::ALL {
            debug_assert!(dst.count(category) >= src.count(category), "Destination cache is too small");
            for var in self.variables(category) {
                for binding in var.bindings() {
                    dst.copy_from(src, category, binding);
                }
            }
        }
    }

    // ===== VALIDATION =====

    /// Report every element of this layout that has nothing bound in `cache`
    ///
    /// Textures with an immutable sampler are also reported when the sampler
    /// is missing from their unit. Returns true if no problem was found.
    pub fn verify_bindings(&self, cache: &ProgramResourceCache) -> bool {
        let mut ok = true;
        for category in GlResourceCategory::ALL {
            for var in self.variables(category) {
                for binding in var.bindings() {
                    let element = binding - var.attribs.binding;
                    if !cache.is_bound(category, binding) {
                        engine_error!(LOG_SOURCE, "No resource is bound to {} variable '{}' in shader '{}'",
                            var.var_type.as_str(), var.attribs.print_name(element), self.program_name(var));
                        ok = false;
                        continue;
                    }
                    if category == GlResourceCategory::Sampler
                        && var.immutable_sampler.is_some()
                        && cache.sampler(binding).sampler.is_none()
                    {
                        engine_error!(LOG_SOURCE, "Immutable sampler is not initialized for texture '{}' in shader '{}'",
                            var.attribs.name, self.program_name(var));
                        ok = false;
                    }
                }
            }
        }
        ok
    }
}

/// Id of the object bound to a slot, used to tell a rebind from a repeat
fn bound_object_id(cache: &ProgramResourceCache, category: GlResourceCategory, binding: u32) -> Option<ResourceId> {
    match category {
        GlResourceCategory::UniformBlock => cache.uniform_buffer(binding).buffer.as_ref().map(|b| b.id()),
        GlResourceCategory::Sampler => cache.sampler(binding).view.as_ref().map(|v| v.id()),
        GlResourceCategory::Image => cache.image(binding).view.as_ref().map(|v| v.id()),
        GlResourceCategory::StorageBlock => cache.ssbo(binding).view.as_ref().map(|v| v.id()),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "pipeline_resource_layout_tests.rs"]
mod tests;
