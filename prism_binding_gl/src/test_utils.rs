//! Fixtures shared by the unit tests of the GL backend

use prism_binding::prism::log::{LogEntry, LogSeverity, Logger};
use prism_binding::prism::resource::{
    BindFlags, Buffer, BufferDesc, BufferView, BufferViewType, ResourceState, Sampler, SamplerDesc, Texture,
    TextureDesc, TextureView, TextureViewType, Usage,
};
use prism_binding::prism::shader::{Shader, ShaderDesc, ShaderResourceAttribs, ShaderStage};
use prism_binding::prism::Engine;
use std::sync::{Arc, Mutex};

/// Global logger that records messages
///
/// Tests installing it must be `#[serial]` and end with `Engine::reset_logger()`.
#[derive(Clone, Default)]
pub(crate) struct CaptureLogger {
    messages: Arc<Mutex<Vec<(LogSeverity, String)>>>,
}

impl CaptureLogger {
    pub(crate) fn install() -> Self {
        let logger = Self::default();
        Engine::set_logger(logger.clone());
        logger
    }

    pub(crate) fn contains(&self, severity: LogSeverity, text: &str) -> bool {
        self.messages.lock().unwrap().iter().any(|(s, m)| *s == severity && m.contains(text))
    }

    pub(crate) fn count(&self, severity: LogSeverity) -> usize {
        self.messages.lock().unwrap().iter().filter(|(s, _)| *s == severity).count()
    }
}

impl Logger for CaptureLogger {
    fn log(&self, entry: &LogEntry) {
        self.messages.lock().unwrap().push((entry.severity, entry.message.clone()));
    }
}

pub(crate) fn shader(
    name: &str,
    stage: ShaderStage,
    resources: Vec<ShaderResourceAttribs>,
    combined_sampler_suffix: Option<&str>,
) -> Arc<Shader> {
    let desc = ShaderDesc {
        name: name.to_string(),
        stage,
        resources,
        combined_sampler_suffix: combined_sampler_suffix.map(str::to_string),
    };
    Arc::new(Shader::new(desc).unwrap())
}

pub(crate) fn uniform_buffer(name: &str) -> Arc<Buffer> {
    let desc = BufferDesc {
        name: name.to_string(),
        size: 256,
        usage: Usage::Default,
        bind_flags: BindFlags::UNIFORM_BUFFER,
    };
    Buffer::new(desc, ResourceState::CONSTANT_BUFFER)
}

pub(crate) fn storage_buffer_view(name: &str, view_type: BufferViewType) -> Arc<BufferView> {
    let desc = BufferDesc {
        name: name.to_string(),
        size: 4096,
        usage: Usage::Default,
        bind_flags: BindFlags::SHADER_RESOURCE | BindFlags::UNORDERED_ACCESS,
    };
    BufferView::new(Buffer::new(desc, ResourceState::SHADER_RESOURCE), view_type).unwrap()
}

pub(crate) fn texture_view(name: &str, view_type: TextureViewType) -> Arc<TextureView> {
    let desc = TextureDesc {
        name: name.to_string(),
        width: 128,
        height: 128,
        array_size: 1,
        mip_levels: 1,
        bind_flags: BindFlags::SHADER_RESOURCE | BindFlags::UNORDERED_ACCESS,
    };
    TextureView::new(Texture::new(desc, ResourceState::SHADER_RESOURCE), view_type).unwrap()
}

/// Shader resource view with a sampler of its own
pub(crate) fn sampled_texture_view(name: &str) -> Arc<TextureView> {
    let view = texture_view(name, TextureViewType::ShaderResource);
    view.set_sampler(Some(Sampler::new(format!("{} sampler", name), SamplerDesc::default())));
    view
}
