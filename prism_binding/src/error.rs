//! Error types for the Prism binding engine
//!
//! This module defines the error types used throughout the engine,
//! including layout construction, descriptor allocation and commit validation.

use std::fmt;

/// Result type for Prism operations
pub type Result<T> = std::result::Result<T, Error>;

/// Prism binding errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Backend-specific error (D3D12, GL)
    BackendError(String),

    /// Out of GPU memory
    OutOfMemory,

    /// Invalid resource (shader, buffer, view, layout entry, etc.)
    InvalidResource(String),

    /// Initialization failed (device, pipeline state, root signature)
    InitializationFailed(String),

    /// A shader-visible descriptor heap has no room for the requested range
    OutOfDescriptors(String),

    /// Pipeline state and shader resource binding do not share a binding contract
    Incompatible(String),

    /// A dynamic resource was used without being mapped in the current frame
    StaleFrame(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::OutOfDescriptors(msg) => write!(f, "Out of descriptors: {}", msg),
            Error::Incompatible(msg) => write!(f, "Incompatible binding: {}", msg),
            Error::StaleFrame(msg) => write!(f, "Stale dynamic resource: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
