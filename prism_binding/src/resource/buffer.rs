/// Buffers and buffer views

use crate::error::Result;
use crate::resource::{BindFlags, ResourceId, ResourceState, StateCell, Usage};
use crate::engine_bail;
use std::sync::Arc;

/// Buffer creation descriptor
#[derive(Debug, Clone)]
pub struct BufferDesc {
    pub name: String,
    pub size: u64,
    pub usage: Usage,
    pub bind_flags: BindFlags,
}

/// A GPU buffer
#[derive(Debug)]
pub struct Buffer {
    id: ResourceId,
    desc: BufferDesc,
    state: StateCell,
}

impl Buffer {
    /// Create a buffer in `initial_state` (empty for untracked)
    pub fn new(desc: BufferDesc, initial_state: ResourceState) -> Arc<Self> {
        Arc::new(Self {
            id: ResourceId::next(),
            desc,
            state: StateCell::new(initial_state),
        })
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn desc(&self) -> &BufferDesc {
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

    pub fn is_dynamic(&self) -> bool {
        self.desc.usage == Usage::Dynamic
    }
}

/// Access type of a buffer view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferViewType {
    ShaderResource,
    UnorderedAccess,
}

/// A typed view of a buffer
#[derive(Debug)]
pub struct BufferView {
    id: ResourceId,
    name: String,
    buffer: Arc<Buffer>,
    view_type: BufferViewType,
}

impl BufferView {
    /// Create a view of `buffer`
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidResource` if the buffer lacks the bind flag the view type needs.
    pub fn new(buffer: Arc<Buffer>, view_type: BufferViewType) -> Result<Arc<Self>> {
        let required = match view_type {
            BufferViewType::ShaderResource => BindFlags::SHADER_RESOURCE,
            BufferViewType::UnorderedAccess => BindFlags::UNORDERED_ACCESS,
        };
        if !buffer.desc().bind_flags.contains(required) {
            engine_bail!(InvalidResource => "prism::BufferView",
                "Buffer '{}' was not created with {:?} bind flag required by a {:?} view",
                buffer.name(), required, view_type);
        }
        let name = match view_type {
            BufferViewType::ShaderResource => format!("{} SRV", buffer.name()),
            BufferViewType::UnorderedAccess => format!("{} UAV", buffer.name()),
        };
        Ok(Arc::new(Self {
            id: ResourceId::next(),
            name,
            buffer,
            view_type,
        }))
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn buffer(&self) -> &Arc<Buffer> {
        &self.buffer
    }

    pub fn view_type(&self) -> BufferViewType {
        self.view_type
    }
}
