//! Shared helpers for the unit tests of this crate

use prism_binding::prism::log::{LogEntry, LogSeverity, Logger};
use prism_binding::prism::resource::{
    BindFlags, Buffer, BufferDesc, BufferView, BufferViewType, ResourceState, Sampler, SamplerDesc, Texture,
    TextureDesc, TextureView, TextureViewType, Usage,
};
use prism_binding::prism::shader::{Shader, ShaderDesc, ShaderResourceAttribs, ShaderStage};
use prism_binding::prism::Engine;
use std::sync::{Arc, Mutex};

// ============================================================================
// Log capture
// ============================================================================

/// Logger that keeps every entry for inspection
///
/// Installing it replaces the global logger, so tests using it must be `#[serial]`
/// and call `Engine::reset_logger()` when done.
#[derive(Clone, Default)]
pub(crate) struct CaptureLogger {
    entries: Arc<Mutex<Vec<(LogSeverity, String)>>>,
}

impl CaptureLogger {
    pub(crate) fn install() -> Self {
        let logger = Self::default();
        Engine::set_logger(logger.clone());
        logger
    }

    pub(crate) fn contains(&self, severity: LogSeverity, text: &str) -> bool {
        self.entries.lock().unwrap().iter().any(|(s, m)| *s == severity && m.contains(text))
    }

    pub(crate) fn count(&self, severity: LogSeverity) -> usize {
        self.entries.lock().unwrap().iter().filter(|(s, _)| *s == severity).count()
    }

    pub(crate) fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }
}

impl Logger for CaptureLogger {
    fn log(&self, entry: &LogEntry) {
        self.entries.lock().unwrap().push((entry.severity, entry.message.clone()));
    }
}

// ============================================================================
// Object builders
// ============================================================================

pub(crate) fn shader(
    name: &str,
    stage: ShaderStage,
    resources: Vec<ShaderResourceAttribs>,
    combined_sampler_suffix: Option<&str>,
) -> Arc<Shader> {
    Arc::new(
        Shader::new(ShaderDesc {
            name: name.to_string(),
            stage,
            resources,
            combined_sampler_suffix: combined_sampler_suffix.map(str::to_string),
        })
        .unwrap(),
    )
}

pub(crate) fn constant_buffer(name: &str, usage: Usage) -> Arc<Buffer> {
    Buffer::new(
        BufferDesc {
            name: name.to_string(),
            size: 256,
            usage,
            bind_flags: BindFlags::UNIFORM_BUFFER,
        },
        if usage == Usage::Dynamic { ResourceState::GENERIC_READ } else { ResourceState::COPY_DEST },
    )
}

pub(crate) fn structured_buffer_view(name: &str, view_type: BufferViewType) -> Arc<BufferView> {
    let buffer = Buffer::new(
        BufferDesc {
            name: name.to_string(),
            size: 4096,
            usage: Usage::Default,
            bind_flags: BindFlags::SHADER_RESOURCE | BindFlags::UNORDERED_ACCESS,
        },
        ResourceState::COPY_DEST,
    );
    BufferView::new(buffer, view_type).unwrap()
}

pub(crate) fn texture_view(name: &str, view_type: TextureViewType) -> Arc<TextureView> {
    let texture = Texture::new(
        TextureDesc {
            name: name.to_string(),
            width: 64,
            height: 64,
            array_size: 1,
            mip_levels: 1,
            bind_flags: BindFlags::SHADER_RESOURCE | BindFlags::UNORDERED_ACCESS,
        },
        ResourceState::COPY_DEST,
    );
    TextureView::new(texture, view_type).unwrap()
}

/// Shader resource view carrying a sampler of its own
pub(crate) fn sampled_texture_view(name: &str) -> Arc<TextureView> {
    let view = texture_view(name, TextureViewType::ShaderResource);
    view.set_sampler(Some(Sampler::new(format!("{} sampler", name), SamplerDesc::default())));
    view
}
