//! # maskmesh
//!
//! Turn binary volumetric segmentation masks into smoothed triangle
//! meshes.
//!
//! The pipeline runs four stages: validate the mask, optionally
//! resample it to an isotropic voxel spacing, extract the foreground
//! isosurface, and smooth the resulting mesh with a uniform-Laplacian
//! scheme (plain Laplacian relaxation or Taubin shrink/inflate pairs).
//! Smoothing only moves vertices; the triangle connectivity produced by
//! extraction is never altered.
//!
//! ## Quick Start
//!
//! ```no_run
//! use maskmesh::prelude::*;
//!
//! let config = maskmesh::config::load_config("config.json").unwrap();
//! let volume = BinaryVolume::from_raw_file("mask.raw", [64, 64, 64], [1.0, 1.0, 1.0]).unwrap();
//!
//! let pair = maskmesh::pipeline::run(&volume, &config).unwrap();
//! println!("raw: {} triangles", pair.raw.num_triangles());
//! ```
//!
//! ## Smoothing a Mesh Directly
//!
//! ```
//! use maskmesh::prelude::*;
//! use nalgebra::Point3;
//!
//! let mesh = TriangleMesh::new(
//!     vec![
//!         Point3::new(0.0, 0.0, 0.0),
//!         Point3::new(1.0, 0.0, 0.0),
//!         Point3::new(0.5, 1.0, 0.0),
//!         Point3::new(0.5, 0.5, 1.0),
//!     ],
//!     vec![[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]],
//! )
//! .unwrap();
//!
//! let adjacency = VertexAdjacency::from_mesh(&mesh);
//! let config = SmoothConfig::default();
//! let positions = smooth_positions(&mesh, &adjacency, &config).unwrap();
//! assert_eq!(positions.len(), mesh.num_vertices());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adjacency;
pub mod backend;
pub mod config;
pub mod error;
pub mod extract;
pub mod io;
pub mod mesh;
pub mod pipeline;
pub mod smooth;
pub mod volume;

/// Prelude module for convenient imports.
///
/// ```
/// use maskmesh::prelude::*;
/// ```
pub mod prelude {
    pub use crate::adjacency::VertexAdjacency;
    pub use crate::config::{Device, MeshConfig, SmoothConfig, SmoothMethod};
    pub use crate::error::{MaskMeshError, Result};
    pub use crate::mesh::TriangleMesh;
    pub use crate::pipeline::MeshPair;
    pub use crate::smooth::smooth_positions;
    pub use crate::volume::BinaryVolume;
}

// Re-export nalgebra types for convenience
pub use nalgebra;
