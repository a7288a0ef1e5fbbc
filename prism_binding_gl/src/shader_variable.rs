/// ShaderVariable - application handles to the variables of one stage
///
/// A resource shared by several stages of a linked program gets one handle
/// per stage. The handles point at the same layout variable and cache slots,
/// so binding through either is the same operation.

use crate::pipeline_resource_layout::{GlVariable, PipelineResourceLayout, VariableRef};
use crate::program_resource_cache::ProgramResourceCache;
use prism_binding::prism::binding::{bind_variable_from_mapping, BindShaderResourcesFlags, ShaderResourceVariable};
use prism_binding::prism::layout::VariableType;
use prism_binding::prism::resource::{DeviceObject, ResourceMapping};
use prism_binding::prism::shader::{ShaderResourceKind, ShaderStage};
use prism_binding::engine_error;
use rustc_hash::FxHashMap;
use std::sync::{Arc, Mutex, MutexGuard};

const LOG_SOURCE: &str = "prism::gl::ShaderVariable";

pub(crate) fn lock_cache(cache: &Mutex<ProgramResourceCache>) -> MutexGuard<'_, ProgramResourceCache> {
    cache.lock().unwrap_or_else(|e| e.into_inner())
}

pub struct GlShaderVariable {
    layout: Arc<PipelineResourceLayout>,
    var_ref: VariableRef,
    cache: Arc<Mutex<ProgramResourceCache>>,
    index: u32,
}

impl GlShaderVariable {
    fn variable(&self) -> &GlVariable {
        self.layout.variable(self.var_ref)
    }
}

impl ShaderResourceVariable for GlShaderVariable {
    fn set_array(&self, objects: &[Option<DeviceObject>], first_element: u32) {
        let var = self.variable();
        let array_size = var.attribs().array_size;
        if first_element >= array_size {
            engine_error!(LOG_SOURCE, "Array index {} is out of range for variable '{}' of size {}",
                first_element, var.name(), array_size);
            return;
        }
        let mut cache = lock_cache(&self.cache);
        for (offset, object) in objects.iter().enumerate() {
            let element = match u32::try_from(offset).ok().and_then(|o| first_element.checked_add(o)) {
                Some(element) if element < array_size => element,
                _ => {
                    engine_error!(LOG_SOURCE, "Array index {} is out of range for variable '{}' of size {}",
                        first_element as u64 + offset as u64, var.name(), array_size);
                    break;
                }
            };
            self.layout.bind_resource(var, object.as_ref(), element, &mut cache);
        }
    }

    fn variable_type(&self) -> VariableType {
        self.variable().var_type()
    }

    fn resource_kind(&self) -> ShaderResourceKind {
        self.variable().attribs().kind
    }

    fn name(&self) -> &str {
        self.variable().name()
    }

    fn array_size(&self) -> u32 {
        self.variable().attribs().array_size
    }

    fn index(&self) -> u32 {
        self.index
    }

    fn is_bound(&self, array_index: u32) -> bool {
        let cache = lock_cache(&self.cache);
        self.layout.is_bound(self.variable(), array_index, &cache)
    }
}

/// Variables of one stage of a layout
pub struct ShaderVariableManager {
    stage: ShaderStage,
    variables: Vec<Arc<GlShaderVariable>>,
    by_name: FxHashMap<String, usize>,
}

impl ShaderVariableManager {
    pub fn new(layout: Arc<PipelineResourceLayout>, stage: ShaderStage, cache: Arc<Mutex<ProgramResourceCache>>) -> Self {
        let refs = layout.stage_variables(stage).to_vec();
        let mut variables = Vec::with_capacity(refs.len());
        let mut by_name = FxHashMap::default();
        for (index, var_ref) in refs.into_iter().enumerate() {
            by_name.insert(layout.variable(var_ref).name().to_string(), index);
            variables.push(Arc::new(GlShaderVariable {
                layout: Arc::clone(&layout),
                var_ref,
                cache: Arc::clone(&cache),
                index: index as u32,
            }));
        }

        Self { stage, variables, by_name }
    }

    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    pub fn variable_by_name(&self, name: &str) -> Option<Arc<dyn ShaderResourceVariable>> {
        self.by_name
            .get(name)
            .map(|&index| Arc::clone(&self.variables[index]) as Arc<dyn ShaderResourceVariable>)
    }

    pub fn variable_by_index(&self, index: u32) -> Option<Arc<dyn ShaderResourceVariable>> {
        match self.variables.get(index as usize) {
            Some(var) => Some(Arc::clone(var) as Arc<dyn ShaderResourceVariable>),
            None => {
                engine_error!(LOG_SOURCE, "Index {} is out of range. Total variable count: {}", index, self.variables.len());
                None
            }
        }
    }

    pub fn variable_count(&self) -> u32 {
        self.variables.len() as u32
    }

    pub fn bind_resources(&self, mapping: &ResourceMapping, flags: BindShaderResourcesFlags) {
        for var in &self.variables {
            bind_variable_from_mapping(var.as_ref(), mapping, flags);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "shader_variable_tests.rs"]
mod tests;
