//! Wavefront OBJ export.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::info;

use crate::error::Result;
use crate::mesh::TriangleMesh;

/// Write a mesh as ASCII OBJ: one `v` line per vertex with six decimal
/// places, then one `f` line per triangle with 1-based indices.
///
/// Missing parent directories are created.
pub fn save_obj<P: AsRef<Path>>(path: P, mesh: &TriangleMesh) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    for p in &mesh.positions {
        writeln!(writer, "v {:.6} {:.6} {:.6}", p.x, p.y, p.z)?;
    }
    for tri in &mesh.triangles {
        writeln!(writer, "f {} {} {}", tri[0] + 1, tri[1] + 1, tri[2] + 1)?;
    }
    writer.flush()?;

    info!(
        path = %path.display(),
        vertices = mesh.num_vertices(),
        triangles = mesh.num_triangles(),
        "wrote OBJ mesh"
    );
    Ok(())
}
