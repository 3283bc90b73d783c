//! Pipeline configuration.
//!
//! Configuration is a JSON document mirroring the structure consumed by
//! the pipeline: resampling target, smoothing parameters, and output
//! destinations. Parsing and validation both happen before any volume
//! or mesh work starts, so a bad configuration fails fast.
//!
//! ```json
//! {
//!   "target_resolution_mm": [1.0, 1.0, 1.0],
//!   "reorient_canonical": true,
//!   "smooth": {
//!     "enabled": true,
//!     "method": "laplacian",
//!     "num_iter": 10,
//!     "weight": 0.1,
//!     "lambda": 0.5,
//!     "mu": -0.53,
//!     "device": "cpu"
//!   },
//!   "output": {
//!     "mesh_unsmoothed_path": "mesh_raw.obj",
//!     "mesh_smoothed_path": "mesh_smooth.obj"
//!   }
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{MaskMeshError, Result};

/// Default Laplacian step size. Small values keep the explicit update
/// stable over many iterations (Field's recommendation of conservative
/// relaxation factors for iterative mesh smoothing).
pub const DEFAULT_WEIGHT: f32 = 0.1;

/// Default Taubin shrink factor, from Taubin, "A signal processing
/// approach to fair surface design", SIGGRAPH '95.
pub const DEFAULT_LAMBDA: f32 = 0.5;

/// Default Taubin inflate factor; negative, with magnitude slightly
/// larger than [`DEFAULT_LAMBDA`] so net shrinkage cancels (same
/// provenance as the lambda default).
pub const DEFAULT_MU: f32 = -0.53;

/// Default iteration count for both schemes.
pub const DEFAULT_NUM_ITER: i64 = 10;

/// Smoothing scheme selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SmoothMethod {
    /// Identity: positions are returned unchanged.
    None,
    /// Uniform Laplacian relaxation (may shrink the mesh).
    Laplacian,
    /// Taubin shrink/inflate pairs (resists net volume loss).
    Taubin,
}

/// Execution device for the averaging operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    /// Sequential/rayon-parallel CPU execution.
    Cpu,
    /// wgpu compute execution. Requesting this without a compatible
    /// adapter fails explicitly; there is no silent CPU fallback.
    Gpu,
}

/// Smoothing parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothConfig {
    /// Master switch; when false no smoothed mesh is produced.
    pub enabled: bool,
    /// Which scheme to run.
    pub method: SmoothMethod,
    /// Number of iterations (Taubin counts shrink+inflate pairs).
    /// Stored signed so a negative value is a reportable configuration
    /// error rather than a parse failure.
    pub num_iter: i64,
    /// Laplacian step size, recommended range [0, 1].
    pub weight: f32,
    /// Taubin shrink factor.
    pub lambda: f32,
    /// Taubin inflate factor, conventionally negative.
    pub mu: f32,
    /// Execution backend.
    pub device: Device,
}

impl Default for SmoothConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            method: SmoothMethod::Laplacian,
            num_iter: DEFAULT_NUM_ITER,
            weight: DEFAULT_WEIGHT,
            lambda: DEFAULT_LAMBDA,
            mu: DEFAULT_MU,
            device: Device::Cpu,
        }
    }
}

impl SmoothConfig {
    /// Validated iteration count as an unsigned loop bound.
    pub fn iterations(&self) -> usize {
        self.num_iter.max(0) as usize
    }

    /// Whether this configuration produces a smoothed mesh at all.
    pub fn is_active(&self) -> bool {
        self.enabled && self.method != SmoothMethod::None && self.num_iter > 0
    }
}

/// Output destinations. At least one path must be set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Destination for the raw (pre-smoothing) mesh.
    pub mesh_unsmoothed_path: Option<PathBuf>,
    /// Destination for the smoothed mesh. When smoothing is disabled
    /// the raw mesh is written here instead.
    pub mesh_smoothed_path: Option<PathBuf>,
}

/// Top-level pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshConfig {
    /// Target voxel spacing in mm, or `None` to skip resampling.
    pub target_resolution_mm: Option<[f32; 3]>,
    /// Whether the volume provider reoriented to canonical axes.
    /// Recorded for provenance; reorientation itself happens before
    /// the volume reaches this crate.
    pub reorient_canonical: bool,
    /// Smoothing parameters.
    pub smooth: SmoothConfig,
    /// Output destinations.
    pub output: OutputConfig,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            target_resolution_mm: Some([1.0, 1.0, 1.0]),
            reorient_canonical: true,
            smooth: SmoothConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl MeshConfig {
    /// Check the fail-fast configuration rules.
    ///
    /// Invalid `method`/`device` strings are already rejected at parse
    /// time; this covers the semantic rules: a positive resampling
    /// target, a non-negative iteration count, and at least one output
    /// destination.
    pub fn validate(&self) -> Result<()> {
        if let Some(target) = self.target_resolution_mm {
            if target.iter().any(|&t| !t.is_finite() || t <= 0.0) {
                return Err(MaskMeshError::Config(format!(
                    "target_resolution_mm components must be > 0, got {target:?}"
                )));
            }
        }
        if self.smooth.num_iter < 0 {
            return Err(MaskMeshError::Config(format!(
                "smooth.num_iter must be >= 0, got {}",
                self.smooth.num_iter
            )));
        }
        if self.output.mesh_unsmoothed_path.is_none() && self.output.mesh_smoothed_path.is_none() {
            return Err(MaskMeshError::Config(
                "output must specify at least one of mesh_unsmoothed_path or mesh_smoothed_path"
                    .into(),
            ));
        }
        Ok(())
    }
}

/// Load and validate a configuration from a JSON file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<MeshConfig> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| {
        MaskMeshError::Config(format!("cannot read config {}: {e}", path.display()))
    })?;
    let cfg: MeshConfig = serde_json::from_str(&text).map_err(|e| {
        MaskMeshError::Config(format!("invalid config {}: {e}", path.display()))
    })?;
    cfg.validate()?;
    Ok(cfg)
}

/// The default configuration template, with both output paths filled in.
pub fn default_config() -> MeshConfig {
    MeshConfig {
        output: OutputConfig {
            mesh_unsmoothed_path: Some(PathBuf::from("mesh_raw.obj")),
            mesh_smoothed_path: Some(PathBuf::from("mesh_smooth.obj")),
        },
        ..MeshConfig::default()
    }
}

/// Write the default configuration template as pretty-printed JSON.
pub fn write_default_config<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let text = serde_json::to_string_pretty(&default_config())
        .map_err(|e| MaskMeshError::Config(format!("cannot serialize default config: {e}")))?;
    fs::write(path, text + "\n")?;
    Ok(())
}
