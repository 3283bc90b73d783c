//! Vertex-vertex adjacency in compressed sparse row form.
//!
//! The smoother needs, for every vertex, the set of vertices sharing a
//! triangle edge with it. That set is derived once from the triangle
//! list and reused unchanged across all smoothing iterations and both
//! execution backends: the CPU path gathers over the CSR lists
//! directly, the GPU path uploads the two flat arrays as storage
//! buffers.

use crate::mesh::TriangleMesh;

/// Per-vertex neighbor sets, stored as CSR offsets + flat neighbor list.
///
/// Neighbor lists are sorted and deduplicated, so enumeration order is
/// stable within a run. Vertices unreferenced by any triangle have an
/// empty list.
#[derive(Debug, Clone)]
pub struct VertexAdjacency {
    offsets: Vec<u32>,
    neighbors: Vec<u32>,
}

impl VertexAdjacency {
    /// Build adjacency from a mesh's triangle list.
    pub fn from_mesh(mesh: &TriangleMesh) -> Self {
        Self::from_triangles(mesh.num_vertices(), &mesh.triangles)
    }

    /// Build adjacency covering `num_vertices` vertices from triangle
    /// index triples.
    ///
    /// Each triangle registers its three unordered edge pairs in both
    /// directions; duplicates from shared edges collapse in the dedup
    /// pass. Degenerate triangles contribute their (possibly repeated)
    /// pairs like any other triangle.
    pub fn from_triangles(num_vertices: usize, triangles: &[[u32; 3]]) -> Self {
        let mut pairs: Vec<(u32, u32)> = Vec::with_capacity(triangles.len() * 6);
        for tri in triangles {
            for (a, b) in [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])] {
                pairs.push((a, b));
                pairs.push((b, a));
            }
        }
        pairs.sort_unstable();
        pairs.dedup();

        let mut offsets = vec![0u32; num_vertices + 1];
        for &(src, _) in &pairs {
            offsets[src as usize + 1] += 1;
        }
        for i in 0..num_vertices {
            offsets[i + 1] += offsets[i];
        }
        // Pairs are sorted by source, so destinations land in CSR order.
        let neighbors = pairs.into_iter().map(|(_, dst)| dst).collect();

        Self { offsets, neighbors }
    }

    /// Number of vertices covered.
    pub fn num_vertices(&self) -> usize {
        self.offsets.len() - 1
    }

    /// Neighbor indices of vertex `v`, sorted ascending.
    pub fn neighbors(&self, v: usize) -> &[u32] {
        let start = self.offsets[v] as usize;
        let end = self.offsets[v + 1] as usize;
        &self.neighbors[start..end]
    }

    /// Number of neighbors of vertex `v`.
    pub fn degree(&self, v: usize) -> usize {
        (self.offsets[v + 1] - self.offsets[v]) as usize
    }

    /// Raw CSR offsets (length `num_vertices + 1`).
    pub fn offsets(&self) -> &[u32] {
        &self.offsets
    }

    /// Raw flat neighbor array.
    pub fn flat_neighbors(&self) -> &[u32] {
        &self.neighbors
    }
}
