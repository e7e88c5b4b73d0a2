use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Seek, Write};
use std::path::Path;

use tracing::debug;

use super::{Mesh, MeshError};

/// Load mesh from STL file (binary or ASCII).
pub fn load_stl(path: &Path) -> Result<Mesh, MeshError> {
    let file = File::open(path).map_err(|source| MeshError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = BufReader::new(file);

    read_stl(&mut reader).map_err(|err| MeshError::Parse {
        path: path.to_path_buf(),
        details: err.to_string(),
    })
}

pub fn read_stl<R: Read + Seek>(reader: &mut R) -> io::Result<Mesh> {
    let stl = stl_io::read_stl(reader)?;

    debug!(
        vertices = stl.vertices.len(),
        triangles = stl.faces.len(),
        "parsed stl"
    );

    let mut mesh = Mesh::with_capacity(stl.vertices.len(), stl.faces.len());
    for v in &stl.vertices {
        mesh.vertices.push([v.0[0], v.0[1], v.0[2]]);
    }
    for face in &stl.faces {
        mesh.faces.push([
            face.vertices[0] as u32,
            face.vertices[1] as u32,
            face.vertices[2] as u32,
        ]);
    }

    Ok(mesh)
}

/// Save mesh to STL file (binary format). Facet normals are recomputed from winding.
pub fn save_stl(mesh: &Mesh, path: &Path) -> Result<(), MeshError> {
    let write_error = |source: io::Error| MeshError::Write {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(write_error)?;
    let mut writer = BufWriter::new(file);
    write_stl(mesh, &mut writer).map_err(write_error)?;
    writer.flush().map_err(write_error)
}

pub fn write_stl<W: Write>(mesh: &Mesh, writer: &mut W) -> io::Result<()> {
    let triangles = mesh
        .faces
        .iter()
        .map(|face| {
            let corners = mesh.triangle(face).ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("face {face:?} references a missing vertex"),
                )
            })?;
            Ok(stl_io::Triangle {
                normal: stl_io::Normal::new(Mesh::face_normal(&corners)),
                vertices: corners.map(stl_io::Vertex::new),
            })
        })
        .collect::<io::Result<Vec<_>>>()?;

    stl_io::write_stl(writer, triangles.iter())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    const TETRA_ASCII: &[u8] = b"solid tetra
facet normal 0 0 -1
  outer loop
    vertex 0 0 0
    vertex 0 1 0
    vertex 1 0 0
  endloop
endfacet
facet normal 0 -1 0
  outer loop
    vertex 0 0 0
    vertex 1 0 0
    vertex 0 0 1
  endloop
endfacet
facet normal -1 0 0
  outer loop
    vertex 0 0 0
    vertex 0 0 1
    vertex 0 1 0
  endloop
endfacet
facet normal 0.577 0.577 0.577
  outer loop
    vertex 1 0 0
    vertex 0 1 0
    vertex 0 0 1
  endloop
endfacet
endsolid tetra
";

    #[test]
    fn reads_ascii_stl_as_indexed_mesh() {
        let mesh = read_stl(&mut Cursor::new(TETRA_ASCII)).expect("tetra parses");
        assert_eq!(mesh.face_count(), 4);
        assert_eq!(mesh.vertex_count(), 4);
    }

    #[test]
    fn binary_output_reads_back_with_same_topology() {
        let mesh = read_stl(&mut Cursor::new(TETRA_ASCII)).expect("tetra parses");

        let mut binary = Vec::new();
        write_stl(&mesh, &mut binary).expect("binary stl written");
        assert_eq!(binary.len(), 80 + 4 + 4 * 50);

        let reread = read_stl(&mut Cursor::new(binary)).expect("binary stl parses");
        assert_eq!(reread.face_count(), mesh.face_count());
        assert_eq!(reread.vertex_count(), mesh.vertex_count());
    }

    #[test]
    fn dangling_face_is_rejected_on_write() {
        let mesh = Mesh {
            vertices: vec![[0.0; 3]],
            faces: vec![[0, 1, 2]],
        };
        let err = write_stl(&mesh, &mut Vec::new()).expect_err("dangling index");
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn missing_file_is_read_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = load_stl(&dir.path().join("absent.stl")).expect_err("missing file");
        assert!(matches!(err, MeshError::Read { .. }));
    }
}
