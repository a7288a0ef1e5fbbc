/// GlContextState - bound GL state of one context and its pending memory barriers
///
/// Binds that would not change the cached state are skipped. Memory
/// barriers are lazy: a barrier bit becomes pending in the context after a
/// command writes through a shader, and in every resource that command
/// wrote. It is issued only when a resource with the same pending bit is
/// bound again.

use crate::gl_types::{GlCommand, GlProgramObject, MemoryBarrier};
use prism_binding::prism::resource::ResourceId;
use rustc_hash::FxHashMap;

/// Last value bound to each slot of one binding space
#[derive(Debug)]
struct SlotCache<T> {
    slots: Vec<Option<T>>,
}

impl<T> Default for SlotCache<T> {
    fn default() -> Self {
        Self { slots: Vec::new() }
    }
}

impl<T: PartialEq + Copy> SlotCache<T> {
    /// Record `value` in `slot`; false if the slot already held it
    fn update(&mut self, slot: u32, value: T) -> bool {
        let slot = slot as usize;
        if slot >= self.slots.len() {
            self.slots.resize_with(slot + 1, || None);
        }
        if self.slots[slot] == Some(value) {
            return false;
        }
        self.slots[slot] = Some(value);
        true
    }

    fn clear(&mut self) {
        self.slots.clear();
    }
}

#[derive(Debug, Default)]
pub struct GlContextState {
    commands: Vec<GlCommand>,
    program: Option<GlProgramObject>,
    uniform_buffers: SlotCache<ResourceId>,
    textures: SlotCache<ResourceId>,
    samplers: SlotCache<Option<ResourceId>>,
    images: SlotCache<ResourceId>,
    storage_blocks: SlotCache<ResourceId>,
    pending_barriers: MemoryBarrier,
    resource_barriers: FxHashMap<ResourceId, MemoryBarrier>,
    redundant_binds: u32,
    barriers_issued: u32,
}

impl GlContextState {
    pub fn new() -> Self {
        Self::default()
    }

    // ===== BINDING =====

    pub fn set_program(&mut self, program: &GlProgramObject) {
        if self.program.as_ref() == Some(program) {
            self.redundant_binds += 1;
            return;
        }
        let command = match program {
            GlProgramObject::Program(id) => GlCommand::UseProgram(*id),
            GlProgramObject::Pipeline { pipeline, .. } => GlCommand::BindProgramPipeline(*pipeline),
        };
        self.commands.push(command);
        self.program = Some(program.clone());
    }

    pub fn bind_uniform_buffer(&mut self, binding: u32, buffer: ResourceId) {
        if self.uniform_buffers.update(binding, buffer) {
            self.commands.push(GlCommand::BindUniformBuffer { binding, buffer });
        } else {
            self.redundant_binds += 1;
        }
    }

    pub fn bind_texture(&mut self, unit: u32, view: ResourceId) {
        if self.textures.update(unit, view) {
            self.commands.push(GlCommand::BindTexture { unit, view });
        } else {
            self.redundant_binds += 1;
        }
    }

    /// `None` unbinds the sampler object so the texture's own parameters apply
    pub fn bind_sampler(&mut self, unit: u32, sampler: Option<ResourceId>) {
        if self.samplers.update(unit, sampler) {
            self.commands.push(GlCommand::BindSampler { unit, sampler });
        } else {
            self.redundant_binds += 1;
        }
    }

    pub fn bind_image(&mut self, unit: u32, view: ResourceId) {
        if self.images.update(unit, view) {
            self.commands.push(GlCommand::BindImage { unit, view });
        } else {
            self.redundant_binds += 1;
        }
    }

    pub fn bind_storage_block(&mut self, binding: u32, view: ResourceId) {
        if self.storage_blocks.update(binding, view) {
            self.commands.push(GlCommand::BindStorageBlock { binding, view });
        } else {
            self.redundant_binds += 1;
        }
    }

    /// Forget every cached binding; the next binds are all issued
    pub fn invalidate(&mut self) {
        self.program = None;
        self.uniform_buffers.clear();
        self.textures.clear();
        self.samplers.clear();
        self.images.clear();
        self.storage_blocks.clear();
    }

    pub(crate) fn record(&mut self, command: GlCommand) {
        self.commands.push(command);
    }

    // ===== MEMORY BARRIERS =====

    /// Issue the bits of `required` that are still pending
    ///
    /// With a resource, only bits pending in that resource count, and the
    /// resource keeps only bits that remain pending in the context.
    pub fn ensure_memory_barrier(&mut self, required: MemoryBarrier, resource: Option<ResourceId>) {
        let mut required = required & self.pending_barriers;
        if let Some(id) = resource {
            required &= self.resource_pending_barriers(id);
        }

        if !required.is_empty() {
            self.commands.push(GlCommand::MemoryBarrier(required));
            self.pending_barriers.remove(required);
            self.barriers_issued += 1;
        }

        if let Some(id) = resource {
            if let Some(bits) = self.resource_barriers.get_mut(&id) {
                *bits &= self.pending_barriers;
                if bits.is_empty() {
                    self.resource_barriers.remove(&id);
                }
            }
        }
    }

    /// Mark `barriers` as required by commands that follow
    pub fn set_pending_memory_barriers(&mut self, barriers: MemoryBarrier) {
        self.pending_barriers |= barriers;
    }

    /// Mark `barriers` as required before `resource` is accessed again
    pub fn set_resource_pending_barriers(&mut self, resource: ResourceId, barriers: MemoryBarrier) {
        *self.resource_barriers.entry(resource).or_insert(MemoryBarrier::empty()) |= barriers;
    }

    pub fn pending_memory_barriers(&self) -> MemoryBarrier {
        self.pending_barriers
    }

    pub fn resource_pending_barriers(&self, resource: ResourceId) -> MemoryBarrier {
        self.resource_barriers.get(&resource).copied().unwrap_or(MemoryBarrier::empty())
    }

    // ===== RECORDED COMMANDS =====

    pub fn commands(&self) -> &[GlCommand] {
        &self.commands
    }

    pub fn take_commands(&mut self) -> Vec<GlCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn redundant_binds(&self) -> u32 {
        self.redundant_binds
    }

    pub fn barriers_issued(&self) -> u32 {
        self.barriers_issued
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "context_state_tests.rs"]
mod tests;
