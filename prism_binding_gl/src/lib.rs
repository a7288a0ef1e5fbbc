/*!
# Prism Binding - GL Backend

GL-flavoured implementation of the Prism shader resource binding engine.

The shaders of a pipeline state link into one program, or into one separable
program per stage. Every program resource is assigned a binding in one of four
binding spaces (uniform blocks, texture units, image units, storage blocks),
and shader resource bindings keep a flat slot cache per space. Committing a
binding issues one bind call per occupied slot; memory barriers for resources
written through images and storage blocks are deferred until the resource is
bound again.

No driver is involved: the device context records the GL calls it would make,
so every effect of a commit can be inspected.
*/

// Native object model
mod gl_types;
mod context_state;
mod debug;

// Binding model
mod program_resources;
mod program_resource_cache;
mod pipeline_resource_layout;
mod shader_variable;
mod pipeline_state;
mod shader_resource_binding;

// Device
mod device;
mod device_context;

#[cfg(test)]
pub(crate) mod test_utils;

pub use gl_types::{GlCommand, GlProgramObject, GlResourceCategory, MemoryBarrier, ProgramId, ProgramPipelineId};
pub use context_state::GlContextState;
pub use program_resources::{BindingCounters, GlResourceAttribs, ProgramResources};
pub use program_resource_cache::{
    CachedImage, CachedSampler, CachedStorageBlock, CachedUniformBuffer, ProgramResourceCache,
};
pub use pipeline_resource_layout::{GlVariable, PipelineResourceLayout, VariableRef};
pub use shader_variable::{GlShaderVariable, ShaderVariableManager};
pub use pipeline_state::{GlPipelineState, GlPipelineStateDesc};
pub use shader_resource_binding::GlShaderResourceBinding;
pub use device::{GlDevice, GlDeviceConfig};
pub use device_context::GlDeviceContext;

// Re-export debug utilities
pub use debug::{print_commit_stats_report, CommitStats};
