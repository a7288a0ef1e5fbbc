//! Application-facing binding API
//!
//! Backends implement these traits on their shader variables, binding objects
//! and pipeline states. The application sees the same surface regardless of
//! whether resources end up in descriptor tables or in GL binding slots.

use bitflags::bitflags;
use crate::layout_desc::VariableType;
use crate::resource::DeviceObject;
use crate::resource_mapping::ResourceMapping;
use crate::shader::{ShaderResourceKind, ShaderStage, ShaderStageFlags};
use crate::engine_error;
use std::sync::Arc;

bitflags! {
    /// Controls which variables `bind_resources` touches
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BindShaderResourcesFlags: u32 {
        const UPDATE_STATIC  = 0x01;
        const UPDATE_MUTABLE = 0x02;
        const UPDATE_DYNAMIC = 0x04;
        const UPDATE_ALL = Self::UPDATE_STATIC.bits() | Self::UPDATE_MUTABLE.bits() | Self::UPDATE_DYNAMIC.bits();
        /// Leave already bound elements untouched
        const KEEP_EXISTING = 0x08;
        /// Report every element the mapping cannot resolve
        const VERIFY_ALL_RESOLVED = 0x10;
    }
}

impl BindShaderResourcesFlags {
    /// Whether variables of `var_type` are updated; no UPDATE bit means all types
    pub fn updates(self, var_type: VariableType) -> bool {
        let update = self & Self::UPDATE_ALL;
        if update.is_empty() {
            return true;
        }
        match var_type {
            VariableType::Static => update.contains(Self::UPDATE_STATIC),
            VariableType::Mutable => update.contains(Self::UPDATE_MUTABLE),
            VariableType::Dynamic => update.contains(Self::UPDATE_DYNAMIC),
        }
    }
}

/// What committing resources does about resource states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceStateTransitionMode {
    /// Leave states alone
    None,
    /// Transition every resource with a known state to the state the shader needs
    Transition,
    /// Only report resources that are not in the required state
    Verify,
}

// ============================================================================
// ShaderResourceVariable trait
// ============================================================================

/// Handle to one shader resource (possibly an array)
pub trait ShaderResourceVariable: Send + Sync {
    /// Bind `objects` to elements `first_element..`; `None` unbinds
    fn set_array(&self, objects: &[Option<DeviceObject>], first_element: u32);

    /// Bind element 0
    fn set(&self, object: Option<DeviceObject>) {
        self.set_array(std::slice::from_ref(&object), 0);
    }

    fn variable_type(&self) -> VariableType;

    fn resource_kind(&self) -> ShaderResourceKind;

    fn name(&self) -> &str;

    fn array_size(&self) -> u32;

    /// Position of the variable in its manager
    fn index(&self) -> u32;

    fn is_bound(&self, array_index: u32) -> bool;
}

/// Bind every element of `var` that `mapping` resolves
///
/// Shared by every variable manager. Elements the mapping does not resolve are
/// left unchanged and only reported when `VERIFY_ALL_RESOLVED` is set.
pub fn bind_variable_from_mapping(
    var: &dyn ShaderResourceVariable,
    mapping: &ResourceMapping,
    flags: BindShaderResourcesFlags,
) {
    if !flags.updates(var.variable_type()) {
        return;
    }

    for element in 0..var.array_size() {
        if flags.contains(BindShaderResourcesFlags::KEEP_EXISTING) && var.is_bound(element) {
            continue;
        }

        match mapping.get_resource(var.name(), element) {
            Some(object) => var.set_array(&[Some(object.clone())], element),
            None => {
                if flags.contains(BindShaderResourcesFlags::VERIFY_ALL_RESOLVED) && !var.is_bound(element) {
                    engine_error!("prism::binding",
                        "Unable to bind resource to shader variable '{}': resource is not found in the resource mapping",
                        var.name());
                }
            }
        }
    }
}

// ============================================================================
// ShaderResourceBinding trait
// ============================================================================

/// An instance of mutable and dynamic bindings for one pipeline
pub trait ShaderResourceBinding: Send + Sync {
    /// Bind variables of the stages in `stages` from `mapping`
    fn bind_resources(&self, stages: ShaderStageFlags, mapping: &ResourceMapping, flags: BindShaderResourcesFlags);

    fn variable_by_name(&self, stage: ShaderStage, name: &str) -> Option<Arc<dyn ShaderResourceVariable>>;

    fn variable_by_index(&self, stage: ShaderStage, index: u32) -> Option<Arc<dyn ShaderResourceVariable>>;

    fn variable_count(&self, stage: ShaderStage) -> u32;

    /// Whether static resources have been copied from the pipeline
    fn static_resources_initialized(&self) -> bool;
}

// ============================================================================
// PipelineState trait
// ============================================================================

/// Static-variable surface of a pipeline state
pub trait PipelineState: Send + Sync {
    fn name(&self) -> &str;

    /// Hash of the binding contract, equal for compatible pipelines
    fn binding_hash(&self) -> u64;

    fn bind_static_resources(&self, stages: ShaderStageFlags, mapping: &ResourceMapping, flags: BindShaderResourcesFlags);

    fn static_variable_by_name(&self, stage: ShaderStage, name: &str) -> Option<Arc<dyn ShaderResourceVariable>>;

    fn static_variable_by_index(&self, stage: ShaderStage, index: u32) -> Option<Arc<dyn ShaderResourceVariable>>;

    fn static_variable_count(&self, stage: ShaderStage) -> u32;
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "binding_tests.rs"]
mod tests;
