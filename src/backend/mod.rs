//! Execution backends for the neighbor-averaging operator.
//!
//! Neighbor averaging is the only numerically heavy primitive in the
//! smoother, so it is the only thing a backend has to provide. Both
//! backends compute the same function over the same CSR adjacency; the
//! iteration loop, scheme selection, and step application stay on the
//! CPU in [`crate::smooth`] regardless of device.

mod cpu;
mod gpu;

pub use cpu::CpuBackend;
pub use gpu::GpuBackend;

use crate::adjacency::VertexAdjacency;
use crate::config::Device;
use crate::error::Result;

/// The per-iteration averaging primitive.
///
/// Given the current vertex positions, compute for every vertex the
/// arithmetic mean of its neighbors' positions. A vertex with no
/// neighbors yields its own position, so the Laplacian there is zero
/// and every smoothing scheme leaves it fixed.
pub trait AveragingBackend {
    /// Compute per-vertex neighbor means. `positions` must have exactly
    /// one entry per vertex of the adjacency this backend was built
    /// with.
    fn mean_neighbors(&mut self, positions: &[[f32; 3]]) -> Result<Vec<[f32; 3]>>;
}

/// Construct the backend for `device` over a fixed adjacency.
///
/// Adjacency is uploaded (GPU) or borrowed (CPU) once at construction
/// and reused across all iterations. A [`Device::Gpu`] request fails
/// with [`crate::error::MaskMeshError::AcceleratorUnavailable`] when no
/// compatible adapter exists; it never falls back to the CPU.
pub fn create_backend<'a>(
    device: Device,
    adjacency: &'a VertexAdjacency,
) -> Result<Box<dyn AveragingBackend + 'a>> {
    match device {
        Device::Cpu => Ok(Box::new(CpuBackend::new(adjacency))),
        Device::Gpu => Ok(Box::new(GpuBackend::new(adjacency)?)),
    }
}
