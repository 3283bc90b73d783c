//! Binary volume container and resampling.
//!
//! Volume file-format parsing (NIfTI and friends) lives outside this
//! crate; what arrives here is a dense 0/1 voxel array with its spacing
//! already extracted, optionally reoriented to canonical axes by the
//! provider.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{MaskMeshError, Result};

/// A dense binary segmentation mask with voxel spacing in millimeters.
///
/// Voxels are stored x-fastest: index `x + nx * (y + ny * z)`.
#[derive(Debug, Clone)]
pub struct BinaryVolume {
    data: Vec<u8>,
    dims: [usize; 3],
    spacing_mm: [f32; 3],
}

impl BinaryVolume {
    /// Create a volume, checking that the data length matches the
    /// dimensions.
    pub fn new(data: Vec<u8>, dims: [usize; 3], spacing_mm: [f32; 3]) -> Result<Self> {
        let expected = dims[0] * dims[1] * dims[2];
        if data.len() != expected {
            return Err(MaskMeshError::VolumeShape {
                len: data.len(),
                dims,
            });
        }
        Ok(Self {
            data,
            dims,
            spacing_mm,
        })
    }

    /// Read a raw 8-bit volume file (one byte per voxel, x-fastest).
    pub fn from_raw_file<P: AsRef<Path>>(
        path: P,
        dims: [usize; 3],
        spacing_mm: [f32; 3],
    ) -> Result<Self> {
        let data = fs::read(path)?;
        Self::new(data, dims, spacing_mm)
    }

    /// Volume dimensions `[nx, ny, nz]`.
    pub fn dims(&self) -> [usize; 3] {
        self.dims
    }

    /// Voxel spacing in millimeters.
    pub fn spacing_mm(&self) -> [f32; 3] {
        self.spacing_mm
    }

    /// Voxel value at `(x, y, z)`. Panics when out of bounds.
    pub fn get(&self, x: usize, y: usize, z: usize) -> u8 {
        self.data[x + self.dims[0] * (y + self.dims[1] * z)]
    }

    /// Error when the mask has no foreground voxels.
    pub fn assert_non_empty(&self) -> Result<()> {
        if self.data.iter().any(|&v| v == 1) {
            Ok(())
        } else {
            Err(MaskMeshError::EmptyMask)
        }
    }

    /// Nearest-neighbor resample to a target voxel spacing.
    ///
    /// Label values are preserved exactly (no interpolation). The zoom
    /// factor per axis is `spacing / target`; each output voxel takes
    /// the value of the input voxel whose center is nearest.
    pub fn resample_to(&self, target_mm: [f32; 3]) -> BinaryVolume {
        let factors = [
            self.spacing_mm[0] / target_mm[0],
            self.spacing_mm[1] / target_mm[1],
            self.spacing_mm[2] / target_mm[2],
        ];
        let out_dims = [
            ((self.dims[0] as f32 * factors[0]).round() as usize).max(1),
            ((self.dims[1] as f32 * factors[1]).round() as usize).max(1),
            ((self.dims[2] as f32 * factors[2]).round() as usize).max(1),
        ];

        let mut data = Vec::with_capacity(out_dims[0] * out_dims[1] * out_dims[2]);
        for z in 0..out_dims[2] {
            let sz = nearest_source(z, factors[2], self.dims[2]);
            for y in 0..out_dims[1] {
                let sy = nearest_source(y, factors[1], self.dims[1]);
                for x in 0..out_dims[0] {
                    let sx = nearest_source(x, factors[0], self.dims[0]);
                    data.push(self.get(sx, sy, sz));
                }
            }
        }

        debug!(from = ?self.dims, to = ?out_dims, target_mm = ?target_mm, "resampled volume");
        BinaryVolume {
            data,
            dims: out_dims,
            spacing_mm: target_mm,
        }
    }
}

/// Map an output index to the nearest input index (pixel-center mapping).
fn nearest_source(i: usize, factor: f32, len: usize) -> usize {
    let src = ((i as f32 + 0.5) / factor) as usize;
    src.min(len - 1)
}
