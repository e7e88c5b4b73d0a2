//! Mesh conversion capability
//!
//! The HTTP layer only sees the [`MeshConverter`] trait: load a mesh from a path, export
//! it to another path in a requested format. [`NativeMeshConverter`] backs it with
//! `stl_io` and `tobj`.

use std::{fmt, path::Path, path::PathBuf};

use async_trait::async_trait;
use thiserror::Error;

pub mod native;
pub mod obj;
pub mod stl;

pub use native::NativeMeshConverter;

/// Formats accepted as conversion targets.
pub const ALLOWED_FORMATS: [MeshFormat; 2] = [MeshFormat::Stl, MeshFormat::Obj];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshFormat {
    Stl,
    Obj,
}

impl MeshFormat {
    /// Parses a format token such as `STL` or `obj`, ignoring case.
    pub fn from_token(token: &str) -> Option<Self> {
        let normalized = token.to_ascii_lowercase();
        ALLOWED_FORMATS
            .into_iter()
            .find(|format| format.extension() == normalized)
    }

    /// Detect format from file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_token)
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Stl => "stl",
            Self::Obj => "obj",
        }
    }
}

impl fmt::Display for MeshFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

#[derive(Debug, Error)]
pub enum MeshError {
    #[error("unsupported mesh format: {}", .extension.as_deref().unwrap_or("<none>"))]
    UnsupportedFormat { extension: Option<String> },
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {}: {details}", .path.display())]
    Parse { path: PathBuf, details: String },
    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("empty mesh: {details}")]
    EmptyMesh { details: String },
    #[error("conversion worker failed: {0}")]
    Task(String),
}

impl MeshError {
    pub fn unsupported(path: &Path) -> Self {
        Self::UnsupportedFormat {
            extension: path.extension().and_then(|e| e.to_str()).map(String::from),
        }
    }
}

/// Indexed triangle mesh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<[f32; 3]>,
    pub faces: Vec<[u32; 3]>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(vertex_count: usize, face_count: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertex_count),
            faces: Vec::with_capacity(face_count),
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Corner positions of a face, or `None` if it references a missing vertex.
    pub fn triangle(&self, face: &[u32; 3]) -> Option<[[f32; 3]; 3]> {
        let a = *self.vertices.get(face[0] as usize)?;
        let b = *self.vertices.get(face[1] as usize)?;
        let c = *self.vertices.get(face[2] as usize)?;
        Some([a, b, c])
    }

    /// Unit normal from counter-clockwise winding; zero for degenerate triangles.
    pub fn face_normal(corners: &[[f32; 3]; 3]) -> [f32; 3] {
        let [a, b, c] = corners;
        let u = [b[0] - a[0], b[1] - a[1], b[2] - a[2]];
        let v = [c[0] - a[0], c[1] - a[1], c[2] - a[2]];
        let n = [
            u[1] * v[2] - u[2] * v[1],
            u[2] * v[0] - u[0] * v[2],
            u[0] * v[1] - u[1] * v[0],
        ];
        let length = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
        if length > f32::EPSILON {
            [n[0] / length, n[1] / length, n[2] / length]
        } else {
            [0.0, 0.0, 0.0]
        }
    }
}

#[async_trait]
pub trait MeshConverter: Send + Sync {
    async fn load(&self, path: &Path) -> Result<Mesh, MeshError>;

    async fn export(&self, mesh: Mesh, path: &Path, format: MeshFormat) -> Result<(), MeshError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_tokens_ignore_case() {
        assert_eq!(MeshFormat::from_token("STL"), Some(MeshFormat::Stl));
        assert_eq!(MeshFormat::from_token("Obj"), Some(MeshFormat::Obj));
        assert_eq!(MeshFormat::from_token("ply"), None);
        assert_eq!(MeshFormat::from_token(""), None);
        assert_eq!(MeshFormat::from_token(" stl"), None);
    }

    #[test]
    fn format_from_path_uses_last_extension() {
        assert_eq!(
            MeshFormat::from_path(Path::new("uploads/part.v2.OBJ")),
            Some(MeshFormat::Obj)
        );
        assert_eq!(MeshFormat::from_path(Path::new("uploads/part")), None);
    }

    #[test]
    fn unsupported_error_names_extension() {
        assert_eq!(
            MeshError::unsupported(Path::new("scan.ply")).to_string(),
            "unsupported mesh format: ply"
        );
        assert_eq!(
            MeshError::unsupported(Path::new("scan")).to_string(),
            "unsupported mesh format: <none>"
        );
    }

    #[test]
    fn face_normal_follows_winding() {
        let corners = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        assert_eq!(Mesh::face_normal(&corners), [0.0, 0.0, 1.0]);

        let degenerate = [[1.0, 1.0, 1.0]; 3];
        assert_eq!(Mesh::face_normal(&degenerate), [0.0, 0.0, 0.0]);
    }

    #[test]
    fn triangle_rejects_dangling_index() {
        let mesh = Mesh {
            vertices: vec![[0.0; 3], [1.0; 3]],
            faces: vec![[0, 1, 2]],
        };
        assert!(mesh.triangle(&mesh.faces[0]).is_none());
    }
}
