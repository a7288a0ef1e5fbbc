/*!
# Prism Binding

Core types for the Prism shader resource binding engine.

This crate provides the backend-agnostic half of the binding model: how shader
resources are described, how a pipeline decides which resources are static,
mutable or dynamic, and the objects an application binds to them. Backend crates
(`prism_binding_d3d12`, `prism_binding_gl`) map these onto root signatures and
descriptor heaps or onto flat GL binding slots.

## Architecture

- **PipelineResourceLayoutDesc**: Name to variable type overrides and immutable samplers
- **ShaderResources**: Reflected resource list of one shader stage
- **DeviceObject**: Buffers, views and samplers that can be bound
- **SamplerRegistry**: Content-addressed cache of shared samplers
- **ResourceMapping**: Name-indexed resources for bulk binding
- **ShaderResourceVariable / ShaderResourceBinding**: Application-facing binding traits

Backend implementations provide the concrete layouts, caches and pipelines.
*/

// Internal modules
mod error;
mod engine;
pub mod log;
pub mod layout_desc;
pub mod shader;
pub mod resource;
pub mod sampler_registry;
pub mod resource_mapping;
pub mod binding;
pub mod utils;

// Main prism namespace module
pub mod prism {
    // Error types
    pub use crate::error::{Error, Result};

    // Logger host
    pub use crate::engine::Engine;

    // Logging sub-module (types only, macros live at the crate root)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
    }

    // Layout configuration
    pub mod layout {
        pub use crate::layout_desc::*;
    }

    // Shader reflection
    pub mod shader {
        pub use crate::shader::*;
    }

    // Bindable device objects
    pub mod resource {
        pub use crate::resource::*;
        pub use crate::sampler_registry::SamplerRegistry;
        pub use crate::resource_mapping::ResourceMapping;
    }

    // Application-facing binding API
    pub mod binding {
        pub use crate::binding::*;
    }

    // Shared helpers for backends
    pub mod utils {
        pub use crate::utils::*;
    }
}
