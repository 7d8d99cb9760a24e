//! Wavefront OBJ reader (geometry only, material libraries are ignored)

use super::{MeshData, MeshError};

/// Decode an OBJ file into one mesh per object/group
pub fn read_obj(bytes: &[u8]) -> Result<Vec<MeshData>, MeshError> {
    let load_opts = tobj::LoadOptions {
        triangulate: true,
        single_index: true,
        ignore_points: true,
        ignore_lines: true,
        ..Default::default()
    };
    let mut reader = bytes;
    let (models, _materials) = tobj::load_obj_buf(&mut reader, &load_opts, |_| {
        Ok((Vec::new(), Default::default()))
    })
    .map_err(|e| MeshError::Parse {
        format: "OBJ",
        detail: e.to_string(),
    })?;

    let meshes: Vec<MeshData> = models
        .into_iter()
        .filter(|m| !m.mesh.indices.is_empty())
        .map(|m| {
            let positions: Vec<[f32; 3]> = m
                .mesh
                .positions
                .chunks_exact(3)
                .map(|p| [p[0], p[1], p[2]])
                .collect();
            let has_normals = m.mesh.normals.len() == m.mesh.positions.len();
            let mut mesh = MeshData {
                name: (!m.name.is_empty()).then_some(m.name),
                normals: if has_normals {
                    m.mesh
                        .normals
                        .chunks_exact(3)
                        .map(|n| [n[0], n[1], n[2]])
                        .collect()
                } else {
                    Vec::new()
                },
                positions,
                indices: m.mesh.indices,
            };
            if !has_normals {
                mesh.compute_normals();
            }
            mesh
        })
        .collect();

    if meshes.is_empty() {
        return Err(MeshError::Parse {
            format: "OBJ",
            detail: "no faces found".to_string(),
        });
    }

    Ok(meshes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_objects_quad_triangulated() {
        let text = "\
o floor
v 0 0 0
v 1 0 0
v 1 0 -1
v 0 0 -1
f 1 2 3 4
o post
v 0 0 0
v 0 2 0
v 0.1 0 0
f 5 6 7
";
        let meshes = read_obj(text.as_bytes()).unwrap();
        assert_eq!(meshes.len(), 2);
        assert_eq!(meshes[0].name.as_deref(), Some("floor"));
        assert_eq!(meshes[0].triangle_count(), 2);
        assert_eq!(meshes[0].normals.len(), meshes[0].positions.len());
        assert_eq!(meshes[1].triangle_count(), 1);
        let bounds = meshes[1].bounds().unwrap();
        assert_eq!(bounds.max.y, 2.0);
    }

    #[test]
    fn test_no_faces() {
        let text = "v 0 0 0\nv 1 0 0\n";
        assert!(matches!(read_obj(text.as_bytes()), Err(MeshError::Parse { .. })));
    }
}
