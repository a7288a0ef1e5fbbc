/// Tagged union of everything that can be bound to a shader variable

use crate::resource::{Buffer, BufferView, ResourceId, Sampler, TextureView};
use std::sync::Arc;

/// A bindable device object
///
/// Cloning is cheap (one reference count increment). Two objects are equal when
/// they are the same underlying object.
#[derive(Debug, Clone)]
pub enum DeviceObject {
    /// Constant buffers bind the buffer itself
    Buffer(Arc<Buffer>),
    BufferView(Arc<BufferView>),
    TextureView(Arc<TextureView>),
    Sampler(Arc<Sampler>),
}

impl DeviceObject {
    pub fn id(&self) -> ResourceId {
        match self {
            DeviceObject::Buffer(b) => b.id(),
            DeviceObject::BufferView(v) => v.id(),
            DeviceObject::TextureView(v) => v.id(),
            DeviceObject::Sampler(s) => s.id(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            DeviceObject::Buffer(b) => b.name(),
            DeviceObject::BufferView(v) => v.name(),
            DeviceObject::TextureView(v) => v.name(),
            DeviceObject::Sampler(s) => s.name(),
        }
    }

    /// Human-readable object kind for diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            DeviceObject::Buffer(_) => "buffer",
            DeviceObject::BufferView(_) => "buffer view",
            DeviceObject::TextureView(_) => "texture view",
            DeviceObject::Sampler(_) => "sampler",
        }
    }

    pub fn as_buffer(&self) -> Option<&Arc<Buffer>> {
        match self {
            DeviceObject::Buffer(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_buffer_view(&self) -> Option<&Arc<BufferView>> {
        match self {
            DeviceObject::BufferView(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_texture_view(&self) -> Option<&Arc<TextureView>> {
        match self {
            DeviceObject::TextureView(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_sampler(&self) -> Option<&Arc<Sampler>> {
        match self {
            DeviceObject::Sampler(s) => Some(s),
            _ => None,
        }
    }
}

impl PartialEq for DeviceObject {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for DeviceObject {}

impl From<Arc<Buffer>> for DeviceObject {
    fn from(buffer: Arc<Buffer>) -> Self {
        DeviceObject::Buffer(buffer)
    }
}

impl From<Arc<BufferView>> for DeviceObject {
    fn from(view: Arc<BufferView>) -> Self {
        DeviceObject::BufferView(view)
    }
}

impl From<Arc<TextureView>> for DeviceObject {
    fn from(view: Arc<TextureView>) -> Self {
        DeviceObject::TextureView(view)
    }
}

impl From<Arc<Sampler>> for DeviceObject {
    fn from(sampler: Arc<Sampler>) -> Self {
        DeviceObject::Sampler(sampler)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "resource_tests.rs"]
mod tests;
