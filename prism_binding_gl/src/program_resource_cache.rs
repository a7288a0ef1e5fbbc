/// ProgramResourceCache - flat binding slots of one pipeline or binding object
///
/// Slots are laid out as |uniform blocks|samplers|images|storage blocks| and
/// indexed by binding. A cache is sized once; pipeline states and resource
/// bindings of compatible pipelines use identical bindings, so slots are
/// copied between their caches by binding without translation.

use crate::gl_types::GlResourceCategory;
use prism_binding::prism::resource::{Buffer, BufferView, Sampler, Texture, TextureView};
use std::sync::Arc;

/// Uniform buffer bound to a uniform block slot
#[derive(Debug, Clone, Default)]
pub struct CachedUniformBuffer {
    pub buffer: Option<Arc<Buffer>>,
}

/// Texture unit: the view plus the sampler it is sampled with
#[derive(Debug, Clone, Default)]
pub struct CachedSampler {
    pub view: Option<Arc<TextureView>>,
    pub sampler: Option<Arc<Sampler>>,
}

impl CachedSampler {
    pub fn texture(&self) -> Option<&Arc<Texture>> {
        self.view.as_ref().map(|view| view.texture())
    }
}

/// Image unit
#[derive(Debug, Clone, Default)]
pub struct CachedImage {
    pub view: Option<Arc<TextureView>>,
}

/// Storage block slot
#[derive(Debug, Clone, Default)]
pub struct CachedStorageBlock {
    pub view: Option<Arc<BufferView>>,
}

#[derive(Debug, Default)]
pub struct ProgramResourceCache {
    uniform_buffers: Vec<CachedUniformBuffer>,
    samplers: Vec<CachedSampler>,
    images: Vec<CachedImage>,
    storage_blocks: Vec<CachedStorageBlock>,
    initialized: bool,
}

impl ProgramResourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate `counts[c]` empty slots for every category `c`
    pub fn initialize(&mut self, counts: [u32; GlResourceCategory::COUNT]) {
        debug_assert!(!self.initialized, "Resource cache has already been initialized");
        let [ubs, samplers, images, ssbos] = counts.map(|c| c as usize);
        self.uniform_buffers = vec![CachedUniformBuffer::default(); ubs];
        self.samplers = vec![CachedSampler::default(); samplers];
        self.images = vec![CachedImage::default(); images];
        self.storage_blocks = vec![CachedStorageBlock::default(); ssbos];
        self.initialized = true;
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn count(&self, category: GlResourceCategory) -> u32 {
        let count = match category {
            GlResourceCategory::UniformBlock => self.uniform_buffers.len(),
            GlResourceCategory::Sampler => self.samplers.len(),
            GlResourceCategory::Image => self.images.len(),
            GlResourceCategory::StorageBlock => self.storage_blocks.len(),
        };
        count as u32
    }

    // ===== SETTERS =====

    pub fn set_uniform_buffer(&mut self, binding: u32, buffer: Option<Arc<Buffer>>) {
        self.uniform_buffers[binding as usize].buffer = buffer;
    }

    /// Bind `view` to a texture unit
    ///
    /// With `set_sampler` the unit also takes the sampler of the view; without
    /// it the sampler already in the slot (an immutable sampler) is kept.
    pub fn set_tex_sampler(&mut self, binding: u32, view: Option<Arc<TextureView>>, set_sampler: bool) {
        let slot = &mut self.samplers[binding as usize];
        if set_sampler {
            slot.sampler = view.as_ref().and_then(|v| v.sampler());
        }
        slot.view = view;
    }

    pub fn set_immutable_sampler(&mut self, binding: u32, sampler: Arc<Sampler>) {
        self.samplers[binding as usize].sampler = Some(sampler);
    }

    pub fn set_tex_image(&mut self, binding: u32, view: Option<Arc<TextureView>>) {
        self.images[binding as usize].view = view;
    }

    pub fn set_ssbo(&mut self, binding: u32, view: Option<Arc<BufferView>>) {
        self.storage_blocks[binding as usize].view = view;
    }

    /// Copy slot `binding` of `category` from `src`
    ///
    /// Texture units keep their immutable sampler when `src` has none.
    pub fn copy_from(&mut self, src: &ProgramResourceCache, category: GlResourceCategory, binding: u32) {
        let b = binding as usize;
        match category {
            GlResourceCategory::UniformBlock => self.uniform_buffers[b] = src.uniform_buffers[b].clone(),
            GlResourceCategory::Sampler => {
                let src_slot = &src.samplers[b];
                let dst_slot = &mut self.samplers[b];
                dst_slot.view = src_slot.view.clone();
                if src_slot.sampler.is_some() {
                    dst_slot.sampler = src_slot.sampler.clone();
                }
            }
            GlResourceCategory::Image => self.images[b] = src.images[b].clone(),
            GlResourceCategory::StorageBlock => self.storage_blocks[b] = src.storage_blocks[b].clone(),
        }
    }

    // ===== GETTERS =====

    pub fn uniform_buffer(&self, binding: u32) -> &CachedUniformBuffer {
        &self.uniform_buffers[binding as usize]
    }

    pub fn sampler(&self, binding: u32) -> &CachedSampler {
        &self.samplers[binding as usize]
    }

    pub fn image(&self, binding: u32) -> &CachedImage {
        &self.images[binding as usize]
    }

    pub fn ssbo(&self, binding: u32) -> &CachedStorageBlock {
        &self.storage_blocks[binding as usize]
    }

    pub fn uniform_buffers(&self) -> &[CachedUniformBuffer] {
        &self.uniform_buffers
    }

    pub fn samplers(&self) -> &[CachedSampler] {
        &self.samplers
    }

    pub fn images(&self) -> &[CachedImage] {
        &self.images
    }

    pub fn storage_blocks(&self) -> &[CachedStorageBlock] {
        &self.storage_blocks
    }

    // ===== BOUND CHECKS =====
    // Out-of-range bindings are reported as unbound

    pub fn is_ub_bound(&self, binding: u32) -> bool {
        self.uniform_buffers.get(binding as usize).map_or(false, |s| s.buffer.is_some())
    }

    pub fn is_sampler_bound(&self, binding: u32) -> bool {
        self.samplers.get(binding as usize).map_or(false, |s| s.view.is_some())
    }

    pub fn is_image_bound(&self, binding: u32) -> bool {
        self.images.get(binding as usize).map_or(false, |s| s.view.is_some())
    }

    pub fn is_ssbo_bound(&self, binding: u32) -> bool {
        self.storage_blocks.get(binding as usize).map_or(false, |s| s.view.is_some())
    }

    pub fn is_bound(&self, category: GlResourceCategory, binding: u32) -> bool {
        match category {
            GlResourceCategory::UniformBlock => self.is_ub_bound(binding),
            GlResourceCategory::Sampler => self.is_sampler_bound(binding),
            GlResourceCategory::Image => self.is_image_bound(binding),
            GlResourceCategory::StorageBlock => self.is_ssbo_bound(binding),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "program_resource_cache_tests.rs"]
mod tests;
