//! Mask-to-mesh pipeline coordinator.
//!
//! Orders the stages and routes data between them; all geometry and
//! numeric work lives in the stage modules. Any stage error aborts the
//! run before any output file is written by a later stage.

use tracing::{debug, info};

use crate::adjacency::VertexAdjacency;
use crate::config::MeshConfig;
use crate::error::Result;
use crate::extract::extract_surface;
use crate::io::save_obj;
use crate::mesh::TriangleMesh;
use crate::smooth::smooth_positions;
use crate::volume::BinaryVolume;

/// The meshes a pipeline run produces.
#[derive(Debug, Clone)]
pub struct MeshPair {
    /// The extracted surface before smoothing.
    pub raw: TriangleMesh,
    /// The smoothed surface; `None` when smoothing is inactive.
    pub smoothed: Option<TriangleMesh>,
}

impl MeshPair {
    /// The mesh a consumer of the "final" surface should use: the
    /// smoothed mesh when one exists, the raw mesh otherwise.
    pub fn best(&self) -> &TriangleMesh {
        self.smoothed.as_ref().unwrap_or(&self.raw)
    }
}

/// Run the in-memory pipeline: validate, resample, extract, smooth.
pub fn generate_mesh(volume: &BinaryVolume, config: &MeshConfig) -> Result<MeshPair> {
    config.validate()?;
    volume.assert_non_empty()?;

    let resampled;
    let working = match config.target_resolution_mm {
        Some(target) if target != volume.spacing_mm() => {
            resampled = volume.resample_to(target);
            // Resampling can drop a thin mask entirely.
            resampled.assert_non_empty()?;
            &resampled
        }
        _ => volume,
    };

    let raw = extract_surface(working)?;

    let smoothed = if config.smooth.is_active() {
        let adjacency = VertexAdjacency::from_mesh(&raw);
        debug!(
            vertices = adjacency.num_vertices(),
            edges = adjacency.flat_neighbors().len() / 2,
            "built vertex adjacency"
        );
        let positions = smooth_positions(&raw, &adjacency, &config.smooth)?;
        Some(TriangleMesh::new(positions, raw.triangles.clone())?)
    } else {
        None
    };

    info!(
        vertices = raw.num_vertices(),
        triangles = raw.num_triangles(),
        smoothed = smoothed.is_some(),
        "mesh generation complete"
    );

    Ok(MeshPair { raw, smoothed })
}

/// Run the full pipeline and write the configured outputs.
///
/// The smoothed output path receives the raw mesh when smoothing is
/// inactive, so a downstream consumer can always read that path.
pub fn run(volume: &BinaryVolume, config: &MeshConfig) -> Result<MeshPair> {
    let pair = generate_mesh(volume, config)?;

    if let Some(path) = &config.output.mesh_unsmoothed_path {
        save_obj(path, &pair.raw)?;
    }
    if let Some(path) = &config.output.mesh_smoothed_path {
        save_obj(path, pair.best())?;
    }

    Ok(pair)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{OutputConfig, SmoothMethod};
    use crate::error::MaskMeshError;
    use nalgebra::Point3;
    use std::fs;
    use std::path::PathBuf;

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

    fn sphere_volume(n: usize, radius: f32) -> BinaryVolume {
        let c = (n as f32 - 1.0) / 2.0;
        let mut data = vec![0u8; n * n * n];
        for z in 0..n {
            for y in 0..n {
                for x in 0..n {
                    let d2 = (x as f32 - c).powi(2)
                        + (y as f32 - c).powi(2)
                        + (z as f32 - c).powi(2);
                    if d2 < radius * radius {
                        data[x + n * (y + n * z)] = 1;
                    }
                }
            }
        }
        BinaryVolume::new(data, [n, n, n], [1.0; 3]).unwrap()
    }

    fn test_config() -> MeshConfig {
        let mut cfg = MeshConfig::default();
        cfg.target_resolution_mm = None;
        cfg.output = OutputConfig {
            mesh_unsmoothed_path: Some(PathBuf::from("raw.obj")),
            mesh_smoothed_path: Some(PathBuf::from("smooth.obj")),
        };
        cfg
    }

    #[test]
    fn test_generate_produces_both_meshes() {
        let pair = generate_mesh(&cube_volume(8, 1.0), &test_config()).unwrap();
        let smoothed = pair.smoothed.as_ref().unwrap();
        // Connectivity is shared; only positions differ.
        assert_eq!(smoothed.triangles, pair.raw.triangles);
        assert_eq!(smoothed.num_vertices(), pair.raw.num_vertices());
        assert_ne!(smoothed.positions, pair.raw.positions);
    }

    #[test]
    fn test_smoothing_inactive_yields_raw_only() {
        let mut cfg = test_config();
        cfg.smooth.enabled = false;
        let pair = generate_mesh(&cube_volume(8, 1.0), &cfg).unwrap();
        assert!(pair.smoothed.is_none());
        assert_eq!(pair.best().num_vertices(), pair.raw.num_vertices());
    }

    #[test]
    fn test_empty_mask_aborts() {
        let v = BinaryVolume::new(vec![0u8; 27], [3, 3, 3], [1.0; 3]).unwrap();
        assert!(matches!(
            generate_mesh(&v, &test_config()).unwrap_err(),
            MaskMeshError::EmptyMask
        ));
    }

    #[test]
    fn test_invalid_config_aborts_before_processing() {
        let mut cfg = test_config();
        cfg.output = OutputConfig::default();
        assert!(matches!(
            generate_mesh(&cube_volume(8, 1.0), &cfg).unwrap_err(),
            MaskMeshError::Config(_)
        ));
    }

    #[test]
    fn test_resampling_changes_resolution() {
        let mut cfg = test_config();
        cfg.target_resolution_mm = Some([1.0, 1.0, 1.0]);
        let coarse = cube_volume(8, 2.0);
        let pair = generate_mesh(&coarse, &cfg).unwrap();
        let no_resample = generate_mesh(&coarse, &test_config()).unwrap();
        // Upsampling to 1 mm yields a denser surface than meshing the
        // 2 mm grid directly.
        assert!(pair.raw.num_vertices() > no_resample.raw.num_vertices());
    }

    #[test]
    fn test_taubin_end_to_end() {
        let mut cfg = test_config();
        cfg.smooth.method = SmoothMethod::Taubin;
        let pair = generate_mesh(&cube_volume(10, 1.0), &cfg).unwrap();
        let smoothed = pair.smoothed.unwrap();
        let (raw_min, raw_max) = pair.raw.bounding_box().unwrap();
        let (s_min, s_max) = smoothed.bounding_box().unwrap();
        let raw_diag = (raw_max - raw_min).norm();
        let s_diag = (s_max - s_min).norm();
        // Taubin keeps the extent close to the original.
        assert!((s_diag - raw_diag).abs() < raw_diag * 0.15);
    }

    #[test]
    fn test_sphere_mask_end_to_end() {
        let pair = generate_mesh(&sphere_volume(16, 6.0), &test_config()).unwrap();
        let smoothed = pair.smoothed.as_ref().unwrap();

        // The surface stays roughly spherical: every smoothed vertex is
        // within a sane radius band around the mask center.
        let c = Point3::new(7.5f32, 7.5, 7.5);
        for p in &smoothed.positions {
            let r = (p - c).norm();
            assert!(r > 3.0 && r < 8.0, "vertex {p:?} at radius {r}");
        }
        // Smoothing reduces the staircase spread of radii.
        let spread = |mesh: &TriangleMesh| {
            let radii: Vec<f32> = mesh.positions.iter().map(|p| (p - c).norm()).collect();
            let mean = radii.iter().sum::<f32>() / radii.len() as f32;
            radii.iter().map(|r| (r - mean).powi(2)).sum::<f32>() / radii.len() as f32
        };
        assert!(spread(smoothed) < spread(&pair.raw));
    }

    #[test]
    fn test_run_writes_raw_to_smoothed_path_when_inactive() {
        let dir = std::env::temp_dir().join("maskmesh_pipeline_test");
        let mut cfg = test_config();
        cfg.smooth.enabled = false;
        cfg.output = OutputConfig {
            mesh_unsmoothed_path: Some(dir.join("raw.obj")),
            mesh_smoothed_path: Some(dir.join("smooth.obj")),
        };

        run(&cube_volume(6, 1.0), &cfg).unwrap();
        let raw = fs::read_to_string(dir.join("raw.obj")).unwrap();
        let smooth = fs::read_to_string(dir.join("smooth.obj")).unwrap();
        assert_eq!(raw, smooth);
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_run_writes_distinct_outputs_when_active() {
        let dir = std::env::temp_dir().join("maskmesh_pipeline_active");
        let mut cfg = test_config();
        cfg.output = OutputConfig {
            mesh_unsmoothed_path: Some(dir.join("raw.obj")),
            mesh_smoothed_path: Some(dir.join("smooth.obj")),
        };

        run(&cube_volume(8, 1.0), &cfg).unwrap();
        let raw = fs::read_to_string(dir.join("raw.obj")).unwrap();
        let smooth = fs::read_to_string(dir.join("smooth.obj")).unwrap();
        assert_ne!(raw, smooth);
        fs::remove_dir_all(&dir).ok();
    }
}
