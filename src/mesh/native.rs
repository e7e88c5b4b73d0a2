use std::path::Path;

use async_trait::async_trait;
use tracing::info;

use super::{obj, stl, Mesh, MeshConverter, MeshError, MeshFormat};

/// Converter backed by `stl_io` and `tobj`. File work runs on the blocking pool so a
/// large mesh never stalls the async workers serving other requests.
#[derive(Debug, Default)]
pub struct NativeMeshConverter;

impl NativeMeshConverter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MeshConverter for NativeMeshConverter {
    async fn load(&self, path: &Path) -> Result<Mesh, MeshError> {
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || load_mesh(&path))
            .await
            .map_err(|err| MeshError::Task(err.to_string()))?
    }

    async fn export(&self, mesh: Mesh, path: &Path, format: MeshFormat) -> Result<(), MeshError> {
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || save_mesh(&mesh, &path, format))
            .await
            .map_err(|err| MeshError::Task(err.to_string()))?
    }
}

/// Load a mesh from file, detecting the format from the extension.
pub fn load_mesh(path: &Path) -> Result<Mesh, MeshError> {
    let format = MeshFormat::from_path(path).ok_or_else(|| MeshError::unsupported(path))?;

    let mesh = match format {
        MeshFormat::Stl => stl::load_stl(path)?,
        MeshFormat::Obj => obj::load_obj(path)?,
    };

    if mesh.vertices.is_empty() || mesh.faces.is_empty() {
        return Err(MeshError::EmptyMesh {
            details: "mesh has no vertices or faces".to_string(),
        });
    }

    info!(
        path = %path.display(),
        format = %format,
        vertices = mesh.vertex_count(),
        faces = mesh.face_count(),
        "loaded mesh"
    );

    Ok(mesh)
}

pub fn save_mesh(mesh: &Mesh, path: &Path, format: MeshFormat) -> Result<(), MeshError> {
    match format {
        MeshFormat::Stl => stl::save_stl(mesh, path)?,
        MeshFormat::Obj => obj::save_obj(mesh, path)?,
    }

    info!(
        path = %path.display(),
        format = %format,
        faces = mesh.face_count(),
        "exported mesh"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRIANGLE_OBJ: &str = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";

    #[tokio::test]
    async fn obj_to_stl_and_back_keeps_geometry() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = dir.path().join("tri.obj");
        std::fs::write(&source, TRIANGLE_OBJ).expect("write fixture");

        let converter = NativeMeshConverter::new();
        let mesh = converter.load(&source).await.expect("obj loads");

        let stl_path = dir.path().join("tri.stl");
        converter
            .export(mesh.clone(), &stl_path, MeshFormat::Stl)
            .await
            .expect("stl export");

        let reloaded = converter.load(&stl_path).await.expect("stl loads");
        assert_eq!(reloaded.face_count(), 1);
        assert_eq!(reloaded.vertex_count(), 3);
        let mut expected = mesh.vertices.clone();
        let mut actual = reloaded.vertices.clone();
        expected.sort_by(|a, b| a.partial_cmp(b).expect("finite"));
        actual.sort_by(|a, b| a.partial_cmp(b).expect("finite"));
        assert_eq!(actual, expected);
    }

    #[tokio::test]
    async fn unknown_extension_is_unsupported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = dir.path().join("scan.ply");
        std::fs::write(&source, "ply\n").expect("write fixture");

        let err = NativeMeshConverter::new()
            .load(&source)
            .await
            .expect_err("ply is not handled");
        assert_eq!(err.to_string(), "unsupported mesh format: ply");
    }

    #[test]
    fn empty_ascii_stl_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = dir.path().join("empty.stl");
        std::fs::write(&source, "solid empty\nendsolid empty\n").expect("write fixture");

        let err = load_mesh(&source).expect_err("no faces");
        assert!(matches!(err, MeshError::EmptyMesh { .. }));
    }
}
