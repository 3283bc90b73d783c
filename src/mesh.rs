//! Indexed triangle mesh.
//!
//! The mesh is a flat face-vertex representation: an ordered vertex
//! position array and an ordered list of index triples into it. This is
//! the shape isosurface extractors emit and the only structure the
//! smoother needs; connectivity queries go through
//! [`crate::adjacency::VertexAdjacency`].

use nalgebra::Point3;

use crate::error::{MaskMeshError, Result};

/// An indexed triangle mesh with `f32` positions.
#[derive(Debug, Clone)]
pub struct TriangleMesh {
    /// Vertex positions, one per vertex index.
    pub positions: Vec<Point3<f32>>,
    /// Triangles as vertex index triples.
    ///
    /// Indices may repeat across triangles (shared vertices). A
    /// triangle with repeated indices is degenerate; extraction is not
    /// expected to produce one, but every stage tolerates them.
    pub triangles: Vec<[u32; 3]>,
}

impl TriangleMesh {
    /// Create a mesh, validating that every triangle index is in
    /// bounds of the position array.
    pub fn new(positions: Vec<Point3<f32>>, triangles: Vec<[u32; 3]>) -> Result<Self> {
        let num_vertices = positions.len();
        for (ti, tri) in triangles.iter().enumerate() {
            for &vi in tri {
                if vi as usize >= num_vertices {
                    return Err(MaskMeshError::InvalidVertexIndex {
                        triangle: ti,
                        vertex: vi as usize,
                    });
                }
            }
        }
        Ok(Self {
            positions,
            triangles,
        })
    }

    /// Number of vertices.
    pub fn num_vertices(&self) -> usize {
        self.positions.len()
    }

    /// Number of triangles.
    pub fn num_triangles(&self) -> usize {
        self.triangles.len()
    }

    /// Axis-aligned bounding box, or `None` for an empty mesh.
    pub fn bounding_box(&self) -> Option<(Point3<f32>, Point3<f32>)> {
        let first = self.positions.first()?;
        let mut min = *first;
        let mut max = *first;
        for p in &self.positions[1..] {
            for i in 0..3 {
                min[i] = min[i].min(p[i]);
                max[i] = max[i].max(p[i]);
            }
        }
        Some((min, max))
    }
}
