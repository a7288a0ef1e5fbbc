/// Recorded D3D12 command stream
///
/// Commands are recorded in order and never executed. State transitions are
/// applied to the resource at record time, the way the D3D12 backend tracks
/// states on the CPU timeline.

use crate::d3d12_types::{GpuDescriptorHandle, GpuVirtualAddress, ResourceBarrier};
use prism_binding::prism::resource::{Buffer, ResourceId, ResourceState, Texture};

/// One recorded command
#[derive(Debug, Clone, PartialEq)]
pub enum D3D12Command {
    SetRootSignature {
        compute: bool,
        hash: u64,
    },
    SetDescriptorHeaps {
        cbv_srv_uav: bool,
        sampler: bool,
    },
    SetRootDescriptorTable {
        compute: bool,
        root_index: u32,
        handle: GpuDescriptorHandle,
    },
    SetRootConstantBufferView {
        compute: bool,
        root_index: u32,
        address: GpuVirtualAddress,
    },
    ResourceBarrier(ResourceBarrier),
    Draw {
        vertex_count: u32,
        first_vertex: u32,
    },
    Dispatch {
        x: u32,
        y: u32,
        z: u32,
    },
}

/// Command recorder of one device context
#[derive(Debug, Default)]
pub struct CommandList {
    commands: Vec<D3D12Command>,
    /// Barriers recorded since creation, kept across `take_commands`
    barrier_count: u64,
}

impl CommandList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[D3D12Command] {
        &self.commands
    }

    /// Remove and return everything recorded so far
    pub fn take_commands(&mut self) -> Vec<D3D12Command> {
        std::mem::take(&mut self.commands)
    }

    pub fn set_root_signature(&mut self, compute: bool, hash: u64) {
        self.commands.push(D3D12Command::SetRootSignature { compute, hash });
    }

    pub fn set_descriptor_heaps(&mut self, cbv_srv_uav: bool, sampler: bool) {
        self.commands.push(D3D12Command::SetDescriptorHeaps { cbv_srv_uav, sampler });
    }

    pub fn set_root_descriptor_table(&mut self, compute: bool, root_index: u32, handle: GpuDescriptorHandle) {
        self.commands.push(D3D12Command::SetRootDescriptorTable { compute, root_index, handle });
    }

    pub fn set_root_constant_buffer_view(&mut self, compute: bool, root_index: u32, address: GpuVirtualAddress) {
        self.commands.push(D3D12Command::SetRootConstantBufferView { compute, root_index, address });
    }

    /// Transition `buffer` to `new_state`
    ///
    /// A resource that is already in the UAV state and is transitioned to it
    /// again gets a UAV barrier.
    pub fn transition_buffer(&mut self, buffer: &Buffer, new_state: ResourceState) {
        if let Some(state) = self.transition(buffer.id(), buffer.name(), buffer.state(), new_state) {
            buffer.set_state(state);
        }
    }

    /// Transition `texture` to `new_state`
    pub fn transition_texture(&mut self, texture: &Texture, new_state: ResourceState) {
        if let Some(state) = self.transition(texture.id(), texture.name(), texture.state(), new_state) {
            texture.set_state(state);
        }
    }

    fn transition(
        &mut self,
        resource: ResourceId,
        name: &str,
        old_state: ResourceState,
        new_state: ResourceState,
    ) -> Option<ResourceState> {
        debug_assert!(old_state.is_known(), "Resource '{}' state can't be unknown", name);

        if old_state == ResourceState::UNORDERED_ACCESS && new_state == ResourceState::UNORDERED_ACCESS {
            self.commands.push(D3D12Command::ResourceBarrier(ResourceBarrier::Uav {
                resource,
                name: name.to_string(),
            }));
            self.barrier_count += 1;
            return None;
        }

        if old_state == new_state {
            return None;
        }

        self.commands.push(D3D12Command::ResourceBarrier(ResourceBarrier::Transition {
            resource,
            name: name.to_string(),
            before: old_state,
            after: new_state,
        }));
        self.barrier_count += 1;
        Some(new_state)
    }

    pub fn draw(&mut self, vertex_count: u32, first_vertex: u32) {
        self.commands.push(D3D12Command::Draw { vertex_count, first_vertex });
    }

    pub fn dispatch(&mut self, x: u32, y: u32, z: u32) {
        self.commands.push(D3D12Command::Dispatch { x, y, z });
    }

    pub fn barrier_count(&self) -> u64 {
        self.barrier_count
    }

    pub fn barriers(&self) -> impl Iterator<Item = &ResourceBarrier> {
        self.commands.iter().filter_map(|cmd| match cmd {
            D3D12Command::ResourceBarrier(barrier) => Some(barrier),
            _ => None,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "command_list_tests.rs"]
mod tests;
