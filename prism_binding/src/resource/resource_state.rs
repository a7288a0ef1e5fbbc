/// Identity, usage and state tracking shared by all device objects

use bitflags::bitflags;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

/// Process-unique identity of a device object
///
/// Backends key descriptors, dynamic allocations and pending barriers on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(u64);

impl ResourceId {
    pub(crate) fn next() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Expected update frequency of a buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Usage {
    /// GPU read/write, updated occasionally
    Default,
    /// Initialized once at creation
    Immutable,
    /// Rewritten by the CPU every frame through a per-context upload ring
    Dynamic,
    /// CPU-accessible copy source/destination
    Staging,
}

bitflags! {
    /// Ways a resource may be bound to the pipeline
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BindFlags: u32 {
        const VERTEX_BUFFER    = 0x01;
        const INDEX_BUFFER     = 0x02;
        const UNIFORM_BUFFER   = 0x04;
        const SHADER_RESOURCE  = 0x08;
        const UNORDERED_ACCESS = 0x10;
        const RENDER_TARGET    = 0x20;
        const DEPTH_STENCIL    = 0x40;
    }
}

bitflags! {
    /// GPU usage state of a resource
    ///
    /// The empty set means the state is unknown and is not tracked by the engine.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ResourceState: u32 {
        const VERTEX_BUFFER    = 0x0001;
        const CONSTANT_BUFFER  = 0x0002;
        const INDEX_BUFFER     = 0x0004;
        const RENDER_TARGET    = 0x0008;
        const UNORDERED_ACCESS = 0x0010;
        const DEPTH_WRITE      = 0x0020;
        const SHADER_RESOURCE  = 0x0040;
        const COPY_DEST        = 0x0080;
        const COPY_SOURCE      = 0x0100;
        const GENERIC_READ = Self::VERTEX_BUFFER.bits()
            | Self::CONSTANT_BUFFER.bits()
            | Self::INDEX_BUFFER.bits()
            | Self::SHADER_RESOURCE.bits()
            | Self::COPY_SOURCE.bits();
    }
}

impl ResourceState {
    pub fn is_known(self) -> bool {
        !self.is_empty()
    }
}

/// Interior-mutable resource state
#[derive(Debug)]
pub(crate) struct StateCell(AtomicU32);

impl StateCell {
    pub(crate) fn new(state: ResourceState) -> Self {
        Self(AtomicU32::new(state.bits()))
    }

    pub(crate) fn get(&self) -> ResourceState {
        ResourceState::from_bits_truncate(self.0.load(Ordering::Acquire))
    }

    pub(crate) fn set(&self, state: ResourceState) {
        self.0.store(state.bits(), Ordering::Release);
    }
}
