//! Isosurface extraction from a binary volume.
//!
//! The 0/1 mask is turned into a scalar field sampled at voxel centers
//! and meshed with surface nets at the 0.5 level, placing the surface
//! halfway between foreground and background voxels. The field is
//! padded with two background voxels on every side: surface nets skips
//! cubes on the domain boundary, so one voxel of padding leaves masks
//! touching the volume edge open. Two keeps them closed.

use fast_surface_nets::ndshape::Shape;
use fast_surface_nets::{surface_nets, SurfaceNetsBuffer};
use nalgebra::Point3;
use tracing::debug;

use crate::error::{MaskMeshError, Result};
use crate::mesh::TriangleMesh;
use crate::volume::BinaryVolume;

/// Isovalue between background (0) and foreground (1).
const ISO_LEVEL: f32 = 0.5;

#[derive(Clone, Copy)]
struct GridShape {
    nx: u32,
    ny: u32,
    nz: u32,
}

impl Shape<3> for GridShape {
    type Coord = u32;

    #[inline]
    fn as_array(&self) -> [Self::Coord; 3] {
        [self.nx, self.ny, self.nz]
    }

    fn size(&self) -> Self::Coord {
        self.nx * self.ny * self.nz
    }

    fn usize(&self) -> usize {
        (self.nx * self.ny * self.nz) as usize
    }

    fn linearize(&self, [x, y, z]: [Self::Coord; 3]) -> Self::Coord {
        (z * self.ny + y) * self.nx + x
    }

    fn delinearize(&self, i: Self::Coord) -> [Self::Coord; 3] {
        let x = i % self.nx;
        let yz = i / self.nx;
        [x, yz % self.ny, yz / self.ny]
    }
}

/// Extract the foreground surface of `volume` as a triangle mesh in
/// world (millimeter) coordinates.
///
/// Errors with [`MaskMeshError::EmptySurface`] when no level crossing
/// exists, which for a binary mask means no foreground voxels.
pub fn extract_surface(volume: &BinaryVolume) -> Result<TriangleMesh> {
    let [nx, ny, nz] = volume.dims();
    let spacing = volume.spacing_mm();

    // Two-voxel background pad on every side; the outermost cube ring
    // is not meshed by surface nets.
    const PAD: usize = 2;
    let shape = GridShape {
        nx: (nx + 2 * PAD) as u32,
        ny: (ny + 2 * PAD) as u32,
        nz: (nz + 2 * PAD) as u32,
    };

    // Negative inside, positive outside, in the x-fastest order the
    // shape's linearize expects.
    let mut field = vec![ISO_LEVEL; shape.usize()];
    for z in 0..nz {
        for y in 0..ny {
            for x in 0..nx {
                let i =
                    shape.linearize([(x + PAD) as u32, (y + PAD) as u32, (z + PAD) as u32]);
                field[i as usize] = ISO_LEVEL - f32::from(volume.get(x, y, z));
            }
        }
    }

    let mut buffer = SurfaceNetsBuffer::default();
    surface_nets(
        &field,
        &shape,
        [0, 0, 0],
        [shape.nx - 1, shape.ny - 1, shape.nz - 1],
        &mut buffer,
    );

    if buffer.indices.is_empty() {
        return Err(MaskMeshError::EmptySurface);
    }

    // Undo the pad offset, then scale voxel coordinates to millimeters.
    let positions: Vec<Point3<f32>> = buffer
        .positions
        .iter()
        .map(|p| {
            Point3::new(
                (p[0] - PAD as f32) * spacing[0],
                (p[1] - PAD as f32) * spacing[1],
                (p[2] - PAD as f32) * spacing[2],
            )
        })
        .collect();

    let triangles: Vec<[u32; 3]> = buffer
        .indices
        .chunks_exact(3)
        .map(|c| [c[0], c[1], c[2]])
        .collect();

    debug!(
        vertices = positions.len(),
        triangles = triangles.len(),
        dims = ?volume.dims(),
        "extracted isosurface"
    );

    TriangleMesh::new(positions, triangles)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cube_volume(n: usize, spacing: f32) -> BinaryVolume {
        let mut data = vec![0u8; n * n * n];
        for z in 1..n - 1 {
            for y in 1..n - 1 {
                for x in 1..n - 1 {
                    data[x + n * (y + n * z)] = 1;
                }
            }
        }
        BinaryVolume::new(data, [n, n, n], [spacing; 3]).unwrap()
    }

    #[test]
    fn test_empty_volume_yields_empty_surface_error() {
        let v = BinaryVolume::new(vec![0u8; 27], [3, 3, 3], [1.0; 3]).unwrap();
        assert!(matches!(
            extract_surface(&v).unwrap_err(),
            MaskMeshError::EmptySurface
        ));
    }

    #[test]
    fn test_cube_produces_closed_mesh() {
        let v = cube_volume(8, 1.0);
        let mesh = extract_surface(&v).unwrap();
        assert!(mesh.num_vertices() > 0);
        assert!(mesh.num_triangles() > 0);
        // A closed surface satisfies Euler's formula for genus zero:
        // V - E + F = 2 with E = 3F/2.
        let v_count = mesh.num_vertices() as i64;
        let f_count = mesh.num_triangles() as i64;
        assert_eq!(v_count - 3 * f_count / 2 + f_count, 2);
    }

    #[test]
    fn test_surface_bounds_track_foreground() {
        let v = cube_volume(8, 1.0);
        let mesh = extract_surface(&v).unwrap();
        let (min, max) = mesh.bounding_box().unwrap();
        // Foreground occupies voxels 1..=6; the surface lies within
        // half a voxel of that band.
        for i in 0..3 {
            assert!(min[i] > 0.0 && min[i] < 1.5, "min[{i}] = {}", min[i]);
            assert!(max[i] > 5.5 && max[i] < 7.0, "max[{i}] = {}", max[i]);
        }
    }

    #[test]
    fn test_spacing_scales_world_coordinates() {
        let v1 = cube_volume(8, 1.0);
        let v2 = cube_volume(8, 2.5);
        let (min1, max1) = extract_surface(&v1).unwrap().bounding_box().unwrap();
        let (min2, max2) = extract_surface(&v2).unwrap().bounding_box().unwrap();
        for i in 0..3 {
            assert!((min2[i] - min1[i] * 2.5).abs() < 1e-4);
            assert!((max2[i] - max1[i] * 2.5).abs() < 1e-4);
        }
    }

    #[test]
    fn test_mask_touching_boundary_still_closed() {
        // All-foreground volume; without padding this would produce an
        // open (or empty) surface.
        let v = BinaryVolume::new(vec![1u8; 64], [4, 4, 4], [1.0; 3]).unwrap();
        let mesh = extract_surface(&v).unwrap();
        let v_count = mesh.num_vertices() as i64;
        let f_count = mesh.num_triangles() as i64;
        assert_eq!(v_count - 3 * f_count / 2 + f_count, 2);
        // The padding offset cancels: the surface straddles the voxel
        // band 0..=3 by half a voxel on each side.
        let (min, max) = mesh.bounding_box().unwrap();
        for i in 0..3 {
            assert!(min[i] > -1.0 && min[i] < 0.0, "min[{i}] = {}", min[i]);
            assert!(max[i] > 3.0 && max[i] < 4.0, "max[{i}] = {}", max[i]);
        }
    }
}
