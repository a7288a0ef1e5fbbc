/// Shader object as seen by the binding engine
///
/// Compilation is out of scope: a shader here is a named stage plus its
/// reflected resources.

use crate::error::Result;
use crate::shader::{ShaderResourceAttribs, ShaderResources, ShaderStage};
use std::sync::Arc;

/// Descriptor for creating a shader
#[derive(Debug, Clone)]
pub struct ShaderDesc {
    /// Debug name, reported in binding diagnostics
    pub name: String,
    /// Pipeline stage
    pub stage: ShaderStage,
    /// Reflected resources in any order
    pub resources: Vec<ShaderResourceAttribs>,
    /// Suffix pairing textures with samplers (`"_sampler"`), or None for separate samplers
    pub combined_sampler_suffix: Option<String>,
}

/// A reflected shader stage
#[derive(Debug)]
pub struct Shader {
    name: String,
    stage: ShaderStage,
    resources: Arc<ShaderResources>,
}

impl Shader {
    /// Create a shader from its reflection
    ///
    /// # Errors
    ///
    /// Returns an error if the reflection is invalid (see [`ShaderResources::new`]).
    pub fn new(desc: ShaderDesc) -> Result<Self> {
        let resources = ShaderResources::new(
            desc.name.clone(),
            desc.stage,
            desc.resources,
            desc.combined_sampler_suffix,
        )?;
        Ok(Self {
            name: desc.name,
            stage: desc.stage,
            resources: Arc::new(resources),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    pub fn resources(&self) -> &Arc<ShaderResources> {
        &self.resources
    }
}
