/// D3D12DeviceContext - records commands and commits shader resources
///
/// A context owns everything that changes per draw: the command list, one
/// dynamic descriptor allocator per heap type and the upload heap for
/// dynamic buffers. Contexts never share these, so several contexts can
/// commit in parallel.

use crate::command_list::{CommandList, D3D12Command};
use crate::d3d12_types::{DescriptorHeapType, GpuVirtualAddress};
use crate::debug::CommitStats;
use crate::descriptor_heap::{DynamicDescriptorAllocator, DynamicDescriptorRange};
use crate::device::D3D12Device;
use crate::dynamic_upload_heap::DynamicUploadHeap;
use crate::pipeline_state::D3D12PipelineState;
use crate::shader_resource_binding::D3D12ShaderResourceBinding;
use prism_binding::prism::binding::{PipelineState, ResourceStateTransitionMode};
use prism_binding::prism::resource::Buffer;
use prism_binding::prism::Result;
use prism_binding::{engine_bail, engine_debug};
use std::sync::Arc;

const LOG_SOURCE: &str = "prism::d3d12::DeviceContext";

pub struct D3D12DeviceContext {
    device: Arc<D3D12Device>,
    command_list: CommandList,
    dynamic_descriptors: [DynamicDescriptorAllocator; DescriptorHeapType::COUNT],
    upload_heap: DynamicUploadHeap,
    pipeline_state: Option<Arc<D3D12PipelineState>>,
    committed_srb: Option<Arc<D3D12ShaderResourceBinding>>,
    stats: CommitStats,
    /// Barrier count of the command list when the stats were last reset
    barrier_base: u64,
}

impl D3D12DeviceContext {
    pub fn new(device: &Arc<D3D12Device>) -> Self {
        let config = device.config();
        let allocator = |heap_type| DynamicDescriptorAllocator::new(
            Arc::clone(device.gpu_descriptor_heap(heap_type)),
            config.dynamic_descriptor_chunk_size,
            config.frames_in_flight,
        );

        Self {
            device: Arc::clone(device),
            command_list: CommandList::new(),
            dynamic_descriptors: [allocator(DescriptorHeapType::CbvSrvUav), allocator(DescriptorHeapType::Sampler)],
            upload_heap: DynamicUploadHeap::new(config.upload_page_size, config.frames_in_flight),
            pipeline_state: None,
            committed_srb: None,
            stats: CommitStats::default(),
            barrier_base: 0,
        }
    }

    pub fn device(&self) -> &Arc<D3D12Device> {
        &self.device
    }

    // ===== STATE =====

    /// Bind `pipeline_state`; shader resources must be committed again
    pub fn set_pipeline_state(&mut self, pipeline_state: &Arc<D3D12PipelineState>) {
        self.pipeline_state = Some(Arc::clone(pipeline_state));
        self.committed_srb = None;
    }

    pub fn pipeline_state(&self) -> Option<&Arc<D3D12PipelineState>> {
        self.pipeline_state.as_ref()
    }

    /// Give a dynamic buffer fresh space for the current frame
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidResource` if the buffer is not dynamic.
    pub fn map_dynamic_buffer(&mut self, buffer: &Buffer) -> Result<GpuVirtualAddress> {
        self.upload_heap.map_buffer(buffer)
    }

    /// Commit `srb` with the bound pipeline state
    ///
    /// # Errors
    ///
    /// Fails if no pipeline state is bound or if committing fails (see
    /// [`D3D12PipelineState::commit_and_transition_shader_resources`]).
    pub fn commit_shader_resources(
        &mut self,
        srb: &Arc<D3D12ShaderResourceBinding>,
        mode: ResourceStateTransitionMode,
    ) -> Result<()> {
        let Some(pipeline_state) = self.pipeline_state.clone() else {
            engine_bail!(LOG_SOURCE, "No pipeline state is bound. Call set_pipeline_state() before committing shader resources.");
        };

        pipeline_state.commit_and_transition_shader_resources(self, srb, mode)?;
        self.committed_srb = Some(Arc::clone(srb));
        self.stats.commits += 1;
        Ok(())
    }

    /// Transition every resource bound to `srb` to the state its shaders need
    pub fn transition_shader_resources(&mut self, pipeline_state: &D3D12PipelineState, srb: &D3D12ShaderResourceBinding) {
        let cache = srb.lock_cache();
        pipeline_state.root_signature().transition_resources(&cache, &mut self.command_list);
    }

    // ===== COMMANDS =====

    /// Record a draw
    ///
    /// # Errors
    ///
    /// Fails if no graphics pipeline is bound, or with `Error::StaleFrame` if a
    /// bound dynamic constant buffer has not been mapped in this frame.
    pub fn draw(&mut self, vertex_count: u32, first_vertex: u32) -> Result<()> {
        self.prepare_for_command(false)?;
        self.command_list.draw(vertex_count, first_vertex);
        self.stats.draws += 1;
        Ok(())
    }

    /// Record a dispatch; same errors as [`draw`](Self::draw) for compute pipelines
    pub fn dispatch(&mut self, x: u32, y: u32, z: u32) -> Result<()> {
        self.prepare_for_command(true)?;
        self.command_list.dispatch(x, y, z);
        self.stats.dispatches += 1;
        Ok(())
    }

    /// Set the root views of the dynamic constant buffers of the committed binding
    fn prepare_for_command(&mut self, is_compute: bool) -> Result<()> {
        let Some(pipeline_state) = self.pipeline_state.clone() else {
            engine_bail!(LOG_SOURCE, "No pipeline state is bound");
        };
        if pipeline_state.is_compute() != is_compute {
            let (expected, command) = if is_compute { ("compute", "Dispatch") } else { ("graphics", "Draw") };
            engine_bail!(LOG_SOURCE, "{} requires a {} pipeline, but pipeline state '{}' is bound",
                command, expected, pipeline_state.name());
        }

        let Some(srb) = self.committed_srb.clone() else {
            return Ok(());
        };
        let cache = srb.lock_cache();
        if cache.bound_dynamic_cbs() > 0 {
            pipeline_state.root_signature().commit_root_views(&cache, self, is_compute, true, false, false, false)?;
        }
        Ok(())
    }

    /// Advance to the next frame
    ///
    /// Dynamic descriptors and upload pages of the finished frame are recycled
    /// once the GPU is done with them; dynamic buffers must be mapped again.
    pub fn finish_frame(&mut self) {
        for allocator in &mut self.dynamic_descriptors {
            allocator.finish_frame();
        }
        self.upload_heap.finish_frame();
        engine_debug!(LOG_SOURCE, "Frame {} finished", self.upload_heap.current_frame() - 1);
    }

    pub fn current_frame(&self) -> u64 {
        self.upload_heap.current_frame()
    }

    pub fn commands(&self) -> &[D3D12Command] {
        self.command_list.commands()
    }

    pub fn take_commands(&mut self) -> Vec<D3D12Command> {
        self.command_list.take_commands()
    }

    pub fn command_list(&self) -> &CommandList {
        &self.command_list
    }

    pub fn stats(&self) -> CommitStats {
        CommitStats {
            barriers: (self.command_list.barrier_count() - self.barrier_base) as u32,
            ..self.stats
        }
    }

    pub fn reset_stats(&mut self) {
        self.stats = CommitStats::default();
        self.barrier_base = self.command_list.barrier_count();
    }

    // ===== COMMIT SUPPORT =====

    pub(crate) fn command_list_mut(&mut self) -> &mut CommandList {
        &mut self.command_list
    }

    pub(crate) fn stats_mut(&mut self) -> &mut CommitStats {
        &mut self.stats
    }

    pub(crate) fn allocate_dynamic_descriptors(
        &mut self,
        heap_type: DescriptorHeapType,
        count: u32,
    ) -> Result<DynamicDescriptorRange> {
        self.dynamic_descriptors[heap_type.index()].allocate(count)
    }

    pub(crate) fn dynamic_buffer_address(&self, buffer: &Buffer) -> Result<GpuVirtualAddress> {
        self.upload_heap.address_of(buffer)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "device_context_tests.rs"]
mod tests;
