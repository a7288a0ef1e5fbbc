/// ShaderVariable - application handles to the resources of one stage
///
/// A variable is a thin handle (layout, resource index, cache). All binding
/// logic lives in `ShaderResourceLayout`; the variable only locks the cache and
/// forwards.

use crate::shader_resource_cache::ShaderResourceCache;
use crate::shader_resource_layout::{D3D12Resource, ResourceRef, ShaderResourceLayout};
use prism_binding::prism::binding::{bind_variable_from_mapping, BindShaderResourcesFlags, ShaderResourceVariable};
use prism_binding::prism::layout::{VariableType, VariableTypeFlags};
use prism_binding::prism::resource::{DeviceObject, ResourceMapping};
use prism_binding::prism::shader::ShaderResourceKind;
use prism_binding::engine_error;
use rustc_hash::FxHashMap;
use std::sync::{Arc, Mutex, MutexGuard};

const LOG_SOURCE: &str = "prism::d3d12::ShaderVariable";

pub(crate) fn lock_cache(cache: &Mutex<ShaderResourceCache>) -> MutexGuard<'_, ShaderResourceCache> {
    cache.lock().unwrap_or_else(|e| e.into_inner())
}

/// Handle to one resource of a layout
pub struct D3D12ShaderVariable {
    layout: Arc<ShaderResourceLayout>,
    res_ref: ResourceRef,
    cache: Arc<Mutex<ShaderResourceCache>>,
    index: u32,
}

impl D3D12ShaderVariable {
    fn resource(&self) -> &D3D12Resource {
        self.layout.resource(self.res_ref)
    }
}

impl ShaderResourceVariable for D3D12ShaderVariable {
    fn set_array(&self, objects: &[Option<DeviceObject>], first_element: u32) {
        let res = self.resource();
        let array_size = res.attribs().bind_count;
        if first_element >= array_size {
            engine_error!(LOG_SOURCE, "Array index {} is out of range for variable '{}' of size {}",
                first_element, res.name(), array_size);
            return;
        }
        let mut cache = lock_cache(&self.cache);
        for (offset, object) in objects.iter().enumerate() {
            let element = match u32::try_from(offset).ok().and_then(|o| first_element.checked_add(o)) {
                Some(element) if element < array_size => element,
                _ => {
                    engine_error!(LOG_SOURCE, "Array index {} is out of range for variable '{}' of size {}",
                        first_element as u64 + offset as u64, res.name(), array_size);
                    break;
                }
            };
            self.layout.bind_resource(res, object.as_ref(), element, &mut cache);
        }
    }

    fn variable_type(&self) -> VariableType {
        self.resource().var_type()
    }

    fn resource_kind(&self) -> ShaderResourceKind {
        self.resource().attribs().kind
    }

    fn name(&self) -> &str {
        self.resource().name()
    }

    fn array_size(&self) -> u32 {
        self.resource().attribs().bind_count
    }

    fn index(&self) -> u32 {
        self.index
    }

    fn is_bound(&self, array_index: u32) -> bool {
        if array_index >= self.array_size() {
            return false;
        }
        let cache = lock_cache(&self.cache);
        self.layout.is_bound(self.resource(), array_index, &cache)
    }
}

/// Variables of one stage for a set of variable types
///
/// Sampler variables exist only when the shader does not combine samplers with
/// textures; combined samplers are set through the texture view.
pub struct ShaderVariableManager {
    variables: Vec<Arc<D3D12ShaderVariable>>,
    by_name: FxHashMap<String, usize>,
}

impl ShaderVariableManager {
    pub fn new(
        layout: Arc<ShaderResourceLayout>,
        cache: Arc<Mutex<ShaderResourceCache>>,
        allowed: VariableTypeFlags,
    ) -> Self {
        let mut refs = Vec::new();
        for var_type in VariableType::ALL.into_iter().filter(|&t| allowed.contains_type(t)) {
            refs.extend((0..layout.cbv_srv_uav_count(var_type)).map(|r| layout.cbv_srv_uav_ref(var_type, r)));
            if !layout.is_using_combined_samplers() {
                refs.extend((0..layout.sampler_count(var_type)).map(|s| layout.sampler_ref(var_type, s)));
            }
        }

        let mut variables = Vec::with_capacity(refs.len());
        let mut by_name = FxHashMap::default();
        for (index, res_ref) in refs.into_iter().enumerate() {
            by_name.insert(layout.resource(res_ref).name().to_string(), index);
            variables.push(Arc::new(D3D12ShaderVariable {
                layout: Arc::clone(&layout),
                res_ref,
                cache: Arc::clone(&cache),
                index: index as u32,
            }));
        }

        Self { variables, by_name }
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
