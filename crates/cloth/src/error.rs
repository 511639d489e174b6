//! Error types for engine construction.
//!
//! Only construction can fail. Once an engine exists every per-frame
//! operation is total over finite inputs.

use wiggle_config::ConfigError;

/// Defects in the mesh handed to the engine.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MeshError {
    #[error("mesh has no vertices")]
    Empty,

    #[error("flat position buffer length {0} is not a multiple of 3")]
    RaggedPositions(usize),

    #[error("rest position of vertex {index} is not finite")]
    NonFinite { index: usize },

    #[error("index buffer length {0} is not a multiple of 3")]
    RaggedIndices(usize),

    #[error("triangle index {index} out of bounds (vertex count: {count})")]
    IndexOutOfBounds { index: u32, count: usize },
}

/// Errors that prevent an engine from being constructed.
///
/// A host seeing either variant should display the mesh undeformed.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Invalid mesh: {0}")]
    InvalidMesh(#[from] MeshError),

    #[error("Invalid config: {0}")]
    InvalidConfig(#[from] ConfigError),
}
