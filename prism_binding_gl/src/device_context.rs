/// GlDeviceContext - binds program resources and records draws
///
/// Committing a resource binding issues a bind call for every occupied slot
/// of its cache. Resources written through images and storage blocks need a
/// memory barrier before they are accessed again; the context collects those
/// barriers at commit time and makes them pending only after the next draw or
/// dispatch, since they describe what that command writes.

use crate::context_state::GlContextState;
use crate::debug::CommitStats;
use crate::device::GlDevice;
use crate::gl_types::{GlCommand, MemoryBarrier};
use crate::pipeline_state::GlPipelineState;
use crate::shader_resource_binding::GlShaderResourceBinding;
use prism_binding::prism::binding::{PipelineState, ResourceStateTransitionMode};
use prism_binding::prism::resource::{Buffer, BufferViewType, ResourceState, Texture};
use prism_binding::prism::Result;
use prism_binding::{engine_bail, engine_error, engine_info};
use std::sync::Arc;

#[cfg(feature = "validation")]
use prism_binding::prism::binding::ShaderResourceBinding;

const LOG_SOURCE: &str = "prism::gl::DeviceContext";

const STATE_HINT: &str = "Use ResourceStateTransitionMode::Transition when committing shader resources, or set the resource state explicitly.";

pub struct GlDeviceContext {
    device: Arc<GlDevice>,
    state: GlContextState,
    pipeline_state: Option<Arc<GlPipelineState>>,
    committed_srb: Option<Arc<GlShaderResourceBinding>>,
    /// Barriers the next draw or dispatch makes pending
    tentative_barriers: MemoryBarrier,
    stats: CommitStats,
    redundant_base: u32,
    barrier_base: u32,
}

impl GlDeviceContext {
    pub fn new(device: &Arc<GlDevice>) -> Self {
        Self {
            device: Arc::clone(device),
            state: GlContextState::new(),
            pipeline_state: None,
            committed_srb: None,
            tentative_barriers: MemoryBarrier::empty(),
            stats: CommitStats::default(),
            redundant_base: 0,
            barrier_base: 0,
        }
    }

    pub fn device(&self) -> &Arc<GlDevice> {
        &self.device
    }

    // ===== STATE =====

    /// Bind `pipeline_state` and its program; shader resources must be committed again
    pub fn set_pipeline_state(&mut self, pipeline_state: &Arc<GlPipelineState>) {
        self.state.set_program(pipeline_state.program_object());
        self.pipeline_state = Some(Arc::clone(pipeline_state));
        self.committed_srb = None;
    }

    pub fn pipeline_state(&self) -> Option<&Arc<GlPipelineState>> {
        self.pipeline_state.as_ref()
    }

    pub fn context_state(&self) -> &GlContextState {
        &self.state
    }

    /// Forget the cached GL state, e.g. after foreign code touched the context
    pub fn invalidate_state(&mut self) {
        self.state.invalidate();
        if let Some(pipeline_state) = &self.pipeline_state {
            self.state.set_program(pipeline_state.program_object());
        }
    }

    /// Bind every resource of `srb` with the bound pipeline state
    ///
    /// With `ResourceStateTransitionMode::Transition` resources with a tracked
    /// state are moved to the state their slot requires; with `Verify` they
    /// are only checked.
    ///
    /// # Errors
    ///
    /// Fails if no pipeline state is bound, or with `Error::Incompatible` if
    /// `srb` was created by an incompatible pipeline.
    pub fn commit_shader_resources(
        &mut self,
        srb: &Arc<GlShaderResourceBinding>,
        mode: ResourceStateTransitionMode,
    ) -> Result<()> {
        let Some(pipeline_state) = self.pipeline_state.clone() else {
            engine_bail!(LOG_SOURCE, "No pipeline state is bound. Call set_pipeline_state() before committing shader resources.");
        };

        if !pipeline_state.is_compatible_with(srb.pipeline_state()) {
            engine_bail!(Incompatible => LOG_SOURCE,
                "Shader resource binding is incompatible with the pipeline state '{}'. Operation will be ignored.",
                pipeline_state.name());
        }

        #[cfg(feature = "validation")]
        self.verify_shader_resources(&pipeline_state, srb);

        if !self.tentative_barriers.is_empty() {
            engine_info!(LOG_SOURCE,
                "Not all tentative memory barriers have been executed since the last call to commit_shader_resources(). Did you forget to call draw() or dispatch()?");
        }
        self.tentative_barriers = self.bind_program_resources(srb, mode);

        self.committed_srb = Some(Arc::clone(srb));
        self.stats.commits += 1;
        Ok(())
    }

    #[cfg(feature = "validation")]
    fn verify_shader_resources(&self, pipeline_state: &GlPipelineState, srb: &GlShaderResourceBinding) {
        if pipeline_state.has_static_resources() && !srb.static_resources_initialized() {
            engine_error!(LOG_SOURCE,
                "Static resources have not been initialized in the shader resource binding object being committed for pipeline state '{}'. Please call initialize_static_resources().",
                pipeline_state.name());
        }
        let cache = srb.lock_cache();
        pipeline_state.resource_layout().verify_bindings(&cache);
    }

    /// Bind every occupied slot of `srb` and return the barriers its writes need
    fn bind_program_resources(&mut self, srb: &GlShaderResourceBinding, mode: ResourceStateTransitionMode) -> MemoryBarrier {
        let cache = srb.lock_cache();
        let mut new_barriers = MemoryBarrier::empty();
        let mut written_textures: Vec<&Arc<Texture>> = Vec::new();
        let mut written_buffers: Vec<&Arc<Buffer>> = Vec::new();

        for (binding, slot) in (0u32..).zip(cache.uniform_buffers()) {
            let Some(buffer) = &slot.buffer else {
                continue;
            };
            require_buffer_state(buffer, ResourceState::CONSTANT_BUFFER, mode);
            self.state.ensure_memory_barrier(MemoryBarrier::UNIFORM, Some(buffer.id()));
            self.state.bind_uniform_buffer(binding, buffer.id());
            self.stats.uniform_buffers_bound += 1;
        }

        for (unit, slot) in (0u32..).zip(cache.samplers()) {
            let Some(view) = &slot.view else {
                continue;
            };
            let texture = view.texture();
            require_texture_state(texture, ResourceState::SHADER_RESOURCE, mode);
            self.state.bind_texture(unit, view.id());
            self.state.ensure_memory_barrier(MemoryBarrier::TEXTURE_FETCH, Some(texture.id()));
            self.state.bind_sampler(unit, slot.sampler.as_ref().map(|s| s.id()));
            self.stats.textures_bound += 1;
        }

        for (unit, slot) in (0u32..).zip(cache.images()) {
            let Some(view) = &slot.view else {
                continue;
            };
            let texture = view.texture();
            require_texture_state(texture, ResourceState::UNORDERED_ACCESS, mode);
            self.state.ensure_memory_barrier(MemoryBarrier::SHADER_IMAGE_ACCESS, Some(texture.id()));
            // A texture bound to two units is marked once the binds are done
            written_textures.push(texture);
            self.state.bind_image(unit, view.id());
            self.stats.images_bound += 1;
        }

        for (binding, slot) in (0u32..).zip(cache.storage_blocks()) {
            let Some(view) = &slot.view else {
                continue;
            };
            let buffer = view.buffer();
            let writable = view.view_type() == BufferViewType::UnorderedAccess;
            let required = if writable { ResourceState::UNORDERED_ACCESS } else { ResourceState::SHADER_RESOURCE };
            require_buffer_state(buffer, required, mode);
            self.state.ensure_memory_barrier(MemoryBarrier::SHADER_STORAGE, Some(buffer.id()));
            self.state.bind_storage_block(binding, view.id());
            if writable {
                written_buffers.push(buffer);
            }
            self.stats.storage_blocks_bound += 1;
        }

        for texture in written_textures {
            new_barriers |= MemoryBarrier::TEXTURE_WRITE;
            self.state.set_resource_pending_barriers(texture.id(), MemoryBarrier::TEXTURE_WRITE);
        }
        for buffer in written_buffers {
            new_barriers |= MemoryBarrier::BUFFER_WRITE;
            self.state.set_resource_pending_barriers(buffer.id(), MemoryBarrier::BUFFER_WRITE);
        }

        new_barriers
    }

    // ===== COMMANDS =====

    /// Record a draw
    ///
    /// # Errors
    ///
    /// Fails if no graphics pipeline is bound.
    pub fn draw(&mut self, vertex_count: u32, first_vertex: u32) -> Result<()> {
        self.prepare_for_command(false)?;
        self.state.record(GlCommand::Draw { vertex_count, first_vertex });
        self.post_command();
        self.stats.draws += 1;
        Ok(())
    }

    /// Record a dispatch; fails if no compute pipeline is bound
    pub fn dispatch(&mut self, x: u32, y: u32, z: u32) -> Result<()> {
        self.prepare_for_command(true)?;
        self.state.record(GlCommand::Dispatch { x, y, z });
        self.post_command();
        self.stats.dispatches += 1;
        Ok(())
    }

    fn prepare_for_command(&mut self, is_compute: bool) -> Result<()> {
        let Some(pipeline_state) = &self.pipeline_state else {
            engine_bail!(LOG_SOURCE, "No pipeline state is bound");
        };
        if pipeline_state.is_compute() != is_compute {
            let (expected, command) = if is_compute { ("compute", "Dispatch") } else { ("graphics", "Draw") };
            engine_bail!(LOG_SOURCE, "{} requires a {} pipeline, but pipeline state '{}' is bound",
                command, expected, pipeline_state.name());
        }
        Ok(())
    }

    /// Barriers for what the command just recorded wrote apply from now on
    fn post_command(&mut self) {
        self.state.set_pending_memory_barriers(self.tentative_barriers);
        self.tentative_barriers = MemoryBarrier::empty();
    }

    pub fn commands(&self) -> &[GlCommand] {
        self.state.commands()
    }

    pub fn take_commands(&mut self) -> Vec<GlCommand> {
        self.state.take_commands()
    }

    pub fn stats(&self) -> CommitStats {
        CommitStats {
            redundant_binds: self.state.redundant_binds() - self.redundant_base,
            memory_barriers: self.state.barriers_issued() - self.barrier_base,
            ..self.stats
        }
    }

    pub fn reset_stats(&mut self) {
        self.stats = CommitStats::default();
        self.redundant_base = self.state.redundant_binds();
        self.barrier_base = self.state.barriers_issued();
    }
}

// ============================================================================
// Resource states
// ============================================================================

fn require_buffer_state(buffer: &Buffer, required: ResourceState, mode: ResourceStateTransitionMode) {
    if !buffer.is_in_known_state() || buffer.check_state(required) {
        return;
    }
    match mode {
        ResourceStateTransitionMode::Transition => buffer.set_state(required),
        ResourceStateTransitionMode::Verify => {
            engine_error!(LOG_SOURCE, "Buffer '{}' must be in {:?} state. Actual state: {:?}. {}",
                buffer.name(), required, buffer.state(), STATE_HINT);
        }
        ResourceStateTransitionMode::None => {}
    }
}

fn require_texture_state(texture: &Texture, required: ResourceState, mode: ResourceStateTransitionMode) {
    if !texture.is_in_known_state() || texture.check_state(required) {
        return;
    }
    match mode {
        ResourceStateTransitionMode::Transition => texture.set_state(required),
        ResourceStateTransitionMode::Verify => {
            engine_error!(LOG_SOURCE, "Texture '{}' must be in {:?} state. Actual state: {:?}. {}",
                texture.name(), required, texture.state(), STATE_HINT);
        }
        ResourceStateTransitionMode::None => {}
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "device_context_tests.rs"]
mod tests;
