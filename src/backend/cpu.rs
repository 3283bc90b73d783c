//! CPU averaging backend.

use rayon::prelude::*;

use crate::adjacency::VertexAdjacency;
use crate::error::Result;

use super::AveragingBackend;

/// Minimum vertex count before rayon parallelism pays for itself.
const PARALLEL_THRESHOLD: usize = 4096;

/// Rayon-parallel neighbor averaging over borrowed CSR adjacency.
pub struct CpuBackend<'a> {
    adjacency: &'a VertexAdjacency,
}

impl<'a> CpuBackend<'a> {
    /// Create a backend over `adjacency`.
    pub fn new(adjacency: &'a VertexAdjacency) -> Self {
        Self { adjacency }
    }

    fn mean_of(&self, v: usize, positions: &[[f32; 3]]) -> [f32; 3] {
        let neighbors = self.adjacency.neighbors(v);
        if neighbors.is_empty() {
            return positions[v];
        }
        let mut sum = [0.0f32; 3];
        for &n in neighbors {
            let p = positions[n as usize];
            sum[0] += p[0];
            sum[1] += p[1];
            sum[2] += p[2];
        }
        let inv = 1.0 / neighbors.len() as f32;
        [sum[0] * inv, sum[1] * inv, sum[2] * inv]
    }
}

impl AveragingBackend for CpuBackend<'_> {
    fn mean_neighbors(&mut self, positions: &[[f32; 3]]) -> Result<Vec<[f32; 3]>> {
        let n = self.adjacency.num_vertices();
        debug_assert_eq!(positions.len(), n);
        let means = if n >= PARALLEL_THRESHOLD {
            (0..n)
                .into_par_iter()
                .map(|v| self.mean_of(v, positions))
                .collect()
        } else {
            (0..n).map(|v| self.mean_of(v, positions)).collect()
        };
        Ok(means)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adjacency::VertexAdjacency;

    #[test]
    fn test_mean_of_triangle() {
        let positions = [[0.0, 0.0, 0.0], [3.0, 0.0, 0.0], [0.0, 3.0, 0.0]];
        let adj = VertexAdjacency::from_triangles(3, &[[0, 1, 2]]);
        let mut backend = CpuBackend::new(&adj);
        let means = backend.mean_neighbors(&positions).unwrap();
        // Vertex 0 averages vertices 1 and 2.
        assert_eq!(means[0], [1.5, 1.5, 0.0]);
        assert_eq!(means[1], [0.0, 1.5, 0.0]);
        assert_eq!(means[2], [1.5, 0.0, 0.0]);
    }

    #[test]
    fn test_isolated_vertex_returns_own_position() {
        let positions = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [9.0, 9.0, 9.0]];
        let adj = VertexAdjacency::from_triangles(4, &[[0, 1, 2]]);
        let mut backend = CpuBackend::new(&adj);
        let means = backend.mean_neighbors(&positions).unwrap();
        assert_eq!(means[3], [9.0, 9.0, 9.0]);
    }

    #[test]
    fn test_large_mesh_takes_parallel_path() {
        // A strip of triangles long enough to cross the rayon threshold.
        let n = PARALLEL_THRESHOLD + 10;
        let positions: Vec<[f32; 3]> = (0..n).map(|i| [i as f32, 0.0, 0.0]).collect();
        let triangles: Vec<[u32; 3]> = (0..n as u32 - 2)
            .map(|i| [i, i + 1, i + 2])
            .collect();
        let adj = VertexAdjacency::from_triangles(n, &triangles);
        let mut backend = CpuBackend::new(&adj);
        let means = backend.mean_neighbors(&positions).unwrap();
        assert_eq!(means.len(), n);
        // An interior vertex of the strip has neighbors i-2, i-1, i+1, i+2.
        let i = n / 2;
        assert!((means[i][0] - i as f32).abs() < 1e-5);
    }
}
