/// Textures and texture views

use crate::error::Result;
use crate::resource::{BindFlags, ResourceId, ResourceState, Sampler, StateCell};
use crate::engine_bail;
use std::sync::{Arc, RwLock};

/// Texture creation descriptor
#[derive(Debug, Clone)]
pub struct TextureDesc {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub array_size: u32,
    pub mip_levels: u32,
    pub bind_flags: BindFlags,
}

/// A GPU texture
#[derive(Debug)]
pub struct Texture {
    id: ResourceId,
    desc: TextureDesc,
    state: StateCell,
}

impl Texture {
    pub fn new(desc: TextureDesc, initial_state: ResourceState) -> Arc<Self> {
        Arc::new(Self {
            id: ResourceId::next(),
            desc,
            state: StateCell::new(initial_state),
        })
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn desc(&self) -> &TextureDesc {
        &self.desc
    }

    pub fn name(&self) -> &str {
        &self.desc.name
    }

    pub fn state(&self) -> ResourceState {
        self.state.get()
    }

    pub fn set_state(&self, state: ResourceState) {
        self.state.set(state);
    }

    pub fn is_in_known_state(&self) -> bool {
        self.state.get().is_known()
    }

    pub fn check_state(&self, required: ResourceState) -> bool {
        self.state.get().contains(required)
    }
}

/// Access type of a texture view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureViewType {
    ShaderResource,
    UnorderedAccess,
}

/// A typed view of a texture
///
/// A shader resource view may carry the sampler used when the view is bound to
/// a texture that is combined with a sampler.
#[derive(Debug)]
pub struct TextureView {
    id: ResourceId,
    name: String,
    texture: Arc<Texture>,
    view_type: TextureViewType,
    sampler: RwLock<Option<Arc<Sampler>>>,
}

impl TextureView {
    /// Create a view of `texture`
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidResource` if the texture lacks the bind flag the view type needs.
    pub fn new(texture: Arc<Texture>, view_type: TextureViewType) -> Result<Arc<Self>> {
        let required = match view_type {
            TextureViewType::ShaderResource => BindFlags::SHADER_RESOURCE,
            TextureViewType::UnorderedAccess => BindFlags::UNORDERED_ACCESS,
        };
        if !texture.desc().bind_flags.contains(required) {
            engine_bail!(InvalidResource => "prism::TextureView",
                "Texture '{}' was not created with {:?} bind flag required by a {:?} view",
                texture.name(), required, view_type);
        }
        let name = match view_type {
            TextureViewType::ShaderResource => format!("{} SRV", texture.name()),
            TextureViewType::UnorderedAccess => format!("{} UAV", texture.name()),
        };
        Ok(Arc::new(Self {
            id: ResourceId::next(),
            name,
            texture,
            view_type,
            sampler: RwLock::new(None),
        }))
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn texture(&self) -> &Arc<Texture> {
        &self.texture
    }

    pub fn view_type(&self) -> TextureViewType {
        self.view_type
    }

    /// Sampler used when this view is bound to a combined texture
    pub fn sampler(&self) -> Option<Arc<Sampler>> {
        match self.sampler.read() {
            Ok(lock) => (*lock).clone(),
            Err(e) => (*e.into_inner()).clone(),
        }
    }

    pub fn set_sampler(&self, sampler: Option<Arc<Sampler>>) {
        match self.sampler.write() {
            Ok(mut lock) => *lock = sampler,
            Err(e) => *e.into_inner() = sampler,
        }
    }
}
