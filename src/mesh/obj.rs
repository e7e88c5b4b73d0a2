use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use tracing::debug;

use super::{Mesh, MeshError};

/// Load mesh from OBJ file. Polygons are triangulated and every object is merged
/// into one mesh.
pub fn load_obj(path: &Path) -> Result<Mesh, MeshError> {
    let (models, _materials) = tobj::load_obj(
        path,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
    )
    .map_err(|e| MeshError::Parse {
        path: path.to_path_buf(),
        details: e.to_string(),
    })?;

    if models.is_empty() {
        return Err(MeshError::EmptyMesh {
            details: "OBJ file contains no models".to_string(),
        });
    }

    let mut mesh = Mesh::new();
    for model in &models {
        let offset = mesh.vertices.len() as u32;
        let obj_mesh = &model.mesh;

        mesh.vertices.extend(
            obj_mesh
                .positions
                .chunks_exact(3)
                .map(|p| [p[0], p[1], p[2]]),
        );
        mesh.faces.extend(
            obj_mesh
                .indices
                .chunks_exact(3)
                .map(|i| [i[0] + offset, i[1] + offset, i[2] + offset]),
        );
    }

    debug!(
        vertices = mesh.vertex_count(),
        faces = mesh.face_count(),
        models = models.len(),
        "parsed obj"
    );

    Ok(mesh)
}

/// Save mesh to OBJ file (ASCII, positions and faces only).
pub fn save_obj(mesh: &Mesh, path: &Path) -> Result<(), MeshError> {
    let write_error = |source: io::Error| MeshError::Write {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(write_error)?;
    let mut writer = BufWriter::new(file);
    write_obj(mesh, &mut writer).map_err(write_error)?;
    writer.flush().map_err(write_error)
}

pub fn write_obj<W: Write>(mesh: &Mesh, writer: &mut W) -> io::Result<()> {
    writeln!(writer, "# {} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))?;
    writeln!(writer, "# vertices: {}", mesh.vertex_count())?;
    writeln!(writer, "# faces: {}", mesh.face_count())?;

    for [x, y, z] in &mesh.vertices {
        writeln!(writer, "v {x} {y} {z}")?;
    }

    for face in &mesh.faces {
        if face.iter().any(|&i| i as usize >= mesh.vertex_count()) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("face {face:?} references a missing vertex"),
            ));
        }
        // OBJ indices are 1-based
        writeln!(writer, "f {} {} {}", face[0] + 1, face[1] + 1, face[2] + 1)?;
    }

    Ok(())
}
