//! Iterative mesh smoothing schemes.
//!
//! Both schemes move vertices along the uniform Laplacian direction
//! `L(v) = mean(neighbors(v)) - v`:
//!
//! - **Laplacian**: `v += weight * L(v)` per iteration. Simple
//!   relaxation; repeated application shrinks closed surfaces.
//! - **Taubin**: a shrink step `v += lambda * L(v)` followed by an
//!   inflate step `v += mu * L(v)` with `mu < 0`, recomputing the
//!   Laplacian between the two. The pair largely cancels net volume
//!   loss (Taubin, SIGGRAPH '95).
//!
//! All updates are applied simultaneously per step: the means for a
//! step are computed from a snapshot of the positions, never from
//! partially updated ones.

use nalgebra::Point3;
use tracing::{debug, warn};

use crate::adjacency::VertexAdjacency;
use crate::backend::create_backend;
use crate::config::{SmoothConfig, SmoothMethod};
use crate::error::Result;
use crate::mesh::TriangleMesh;

/// Run the configured smoothing scheme and return the new positions.
///
/// Connectivity is never modified; the result has exactly one position
/// per input vertex, in the same order. Returns the input positions
/// unchanged when the configuration is inactive (disabled, method
/// `none`, zero iterations) or when a Laplacian weight of zero makes
/// every step an identity.
pub fn smooth_positions(
    mesh: &TriangleMesh,
    adjacency: &VertexAdjacency,
    config: &SmoothConfig,
) -> Result<Vec<Point3<f32>>> {
    if !config.is_active() {
        return Ok(mesh.positions.clone());
    }
    if config.method == SmoothMethod::Laplacian && config.weight == 0.0 {
        return Ok(mesh.positions.clone());
    }

    warn_on_unstable_parameters(config);

    let mut positions: Vec<[f32; 3]> = mesh.positions.iter().map(|p| [p.x, p.y, p.z]).collect();
    let mut backend = create_backend(config.device, adjacency)?;
    let iterations = config.iterations();

    debug!(
        method = ?config.method,
        iterations,
        device = ?config.device,
        vertices = positions.len(),
        "smoothing mesh"
    );

    for _ in 0..iterations {
        match config.method {
            SmoothMethod::None => unreachable!("is_active excludes method none"),
            SmoothMethod::Laplacian => {
                let means = backend.mean_neighbors(&positions)?;
                apply_step(&mut positions, &means, config.weight);
            }
            SmoothMethod::Taubin => {
                let means = backend.mean_neighbors(&positions)?;
                apply_step(&mut positions, &means, config.lambda);
                let means = backend.mean_neighbors(&positions)?;
                apply_step(&mut positions, &means, config.mu);
            }
        }
    }

    Ok(positions
        .into_iter()
        .map(|p| Point3::new(p[0], p[1], p[2]))
        .collect())
}

/// `p += factor * (mean - p)` for every vertex.
fn apply_step(positions: &mut [[f32; 3]], means: &[[f32; 3]], factor: f32) {
    for (p, m) in positions.iter_mut().zip(means) {
        for i in 0..3 {
            p[i] += factor * (m[i] - p[i]);
        }
    }
}

/// Warn about parameter choices known to behave badly. Advisory only:
/// the run proceeds with the values as given.
fn warn_on_unstable_parameters(config: &SmoothConfig) {
    match config.method {
        SmoothMethod::Laplacian => {
            if !(0.0..=1.0).contains(&config.weight) {
                warn!(
                    weight = config.weight,
                    "laplacian weight outside [0, 1] may oscillate or diverge"
                );
            }
        }
        SmoothMethod::Taubin => {
            if config.lambda * config.mu >= 0.0 {
                warn!(
                    lambda = config.lambda,
                    mu = config.mu,
                    "taubin expects lambda and mu with opposite signs; same signs lose the anti-shrink property"
                );
            }
        }
        SmoothMethod::None => {}
    }
}
