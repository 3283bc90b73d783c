//! Error types for maskmesh.
//!
//! All fallible operations in the crate return [`Result`], and errors
//! propagate synchronously to the caller: either a complete, consistent
//! result is produced or an error is raised and nothing is returned.

use thiserror::Error;

/// Result type alias using [`MaskMeshError`].
pub type Result<T> = std::result::Result<T, MaskMeshError>;

/// Errors that can occur while turning a mask into a mesh.
#[derive(Error, Debug)]
pub enum MaskMeshError {
    /// The configuration is invalid. Raised before any volume or mesh
    /// processing begins; never retried.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A GPU backend was requested but no compatible adapter or device
    /// is available. The backend never silently substitutes the CPU.
    #[error("accelerator unavailable: no compatible GPU adapter or device found")]
    AcceleratorUnavailable,

    /// The mask contains no foreground voxels.
    #[error("mask contains no foreground voxels (no value == 1)")]
    EmptyMask,

    /// Isosurface extraction produced no triangles.
    #[error("isosurface extraction produced no triangles")]
    EmptySurface,

    /// The volume data length does not match its dimensions.
    #[error("volume data length {len} does not match dims {dims:?}")]
    VolumeShape {
        /// Number of voxels provided.
        len: usize,
        /// Expected dimensions.
        dims: [usize; 3],
    },

    /// A triangle references a vertex index outside the vertex array.
    #[error("triangle {triangle} references invalid vertex index {vertex}")]
    InvalidVertexIndex {
        /// The triangle index.
        triangle: usize,
        /// The out-of-bounds vertex index.
        vertex: usize,
    },

    /// GPU command submission, execution, or readback failed.
    #[error("GPU execution failed: {0}")]
    Gpu(String),

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
