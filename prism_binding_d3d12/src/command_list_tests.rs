//! Unit tests for command_list.rs

use super::*;
use prism_binding::prism::resource::{BindFlags, BufferDesc, Usage};
use std::sync::Arc;

fn storage_buffer(state: ResourceState) -> Arc<Buffer> {
    Buffer::new(
        BufferDesc {
            name: "particles".to_string(),
            size: 1024,
            usage: Usage::Default,
            bind_flags: BindFlags::SHADER_RESOURCE | BindFlags::UNORDERED_ACCESS,
        },
        state,
    )
}

// ============================================================================
// Transition tests
// ============================================================================

#[test]
fn test_transition_records_barrier_and_updates_state() {
    let buffer = storage_buffer(ResourceState::COPY_DEST);
    let mut list = CommandList::new();

    list.transition_buffer(&buffer, ResourceState::SHADER_RESOURCE);

    assert_eq!(buffer.state(), ResourceState::SHADER_RESOURCE);
    let barriers: Vec<_> = list.barriers().collect();
    assert_eq!(barriers.len(), 1);
    assert!(matches!(barriers[0], ResourceBarrier::Transition { before, after, .. }
        if *before == ResourceState::COPY_DEST && *after == ResourceState::SHADER_RESOURCE));
}

#[test]
fn test_uav_to_uav_records_uav_barrier() {
    let buffer = storage_buffer(ResourceState::UNORDERED_ACCESS);
    let mut list = CommandList::new();

    list.transition_buffer(&buffer, ResourceState::UNORDERED_ACCESS);

    assert_eq!(buffer.state(), ResourceState::UNORDERED_ACCESS);
    assert_eq!(list.commands(), &[D3D12Command::ResourceBarrier(ResourceBarrier::Uav {
        resource: buffer.id(),
        name: "particles".to_string(),
    })]);
}

#[test]
fn test_same_state_records_nothing() {
    let buffer = storage_buffer(ResourceState::SHADER_RESOURCE);
    let mut list = CommandList::new();
    list.transition_buffer(&buffer, ResourceState::SHADER_RESOURCE);
    assert!(list.commands().is_empty());
}

#[test]
fn test_take_commands_empties_list() {
    let mut list = CommandList::new();
    list.draw(3, 0);
    list.dispatch(1, 2, 3);
    let taken = list.take_commands();
    assert_eq!(taken.len(), 2);
    assert_eq!(taken[1], D3D12Command::Dispatch { x: 1, y: 2, z: 3 });
    assert!(list.commands().is_empty());
}
