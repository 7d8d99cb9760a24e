//! Mesh readers for formats the rendering host has no loader for
//!
//! STL, OBJ, and binary FBX files are decoded into plain triangle lists
//! ([`MeshData`]). They carry no materials the viewer uses, so the host wraps
//! them with a default material.

pub mod fbx;
pub mod obj;
pub mod stl;

use glam::Vec3;
use thiserror::Error;

use crate::format::ModelFormat;
use crate::geometry::Aabb;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MeshError {
    #[error("{format} file is truncated: {detail}")]
    Truncated { format: &'static str, detail: String },
    #[error("{format} parse error: {detail}")]
    Parse { format: &'static str, detail: String },
    #[error("Unsupported {format} variant: {detail}")]
    Unsupported { format: &'static str, detail: String },
    #[error("{0} is not a plain mesh format")]
    NotAMeshFormat(ModelFormat),
}

/// An indexed triangle list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    /// Object/group name from the file, if any
    pub name: Option<String>,
    pub positions: Vec<[f32; 3]>,
    /// One normal per position
    pub normals: Vec<[f32; 3]>,
    /// Triangle indices into `positions`
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.indices.len() < 3 || self.positions.is_empty()
    }

    pub fn bounds(&self) -> Option<Aabb> {
        Aabb::from_points(self.positions.iter().map(|p| Vec3::from_array(*p)))
    }

    /// Replace the normals with area-weighted vertex normals from the faces
    pub fn compute_normals(&mut self) {
        let mut normals = vec![Vec3::ZERO; self.positions.len()];
        for tri in self.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            if a >= normals.len() || b >= normals.len() || c >= normals.len() {
                continue;
            }
            let pa = Vec3::from_array(self.positions[a]);
            let pb = Vec3::from_array(self.positions[b]);
            let pc = Vec3::from_array(self.positions[c]);
            let face = (pb - pa).cross(pc - pa);
            normals[a] += face;
            normals[b] += face;
            normals[c] += face;
        }
        self.normals = normals
            .into_iter()
            .map(|n| n.normalize_or(Vec3::Y).to_array())
            .collect();
    }
}

/// Decode a mesh-only file into one or more triangle lists
pub fn read_mesh(format: ModelFormat, bytes: &[u8]) -> Result<Vec<MeshData>, MeshError> {
    match format {
        ModelFormat::Stl => stl::read_stl(bytes).map(|mesh| vec![mesh]),
        ModelFormat::Obj => obj::read_obj(bytes),
        ModelFormat::Fbx => fbx::read_fbx(bytes),
        ModelFormat::Glb | ModelFormat::Gltf => Err(MeshError::NotAMeshFormat(format)),
    }
}

/// Normal of triangle (a, b, c), or `None` when it is degenerate
pub(crate) fn face_normal(a: Vec3, b: Vec3, c: Vec3) -> Option<Vec3> {
    (b - a).cross(c - a).try_normalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_normals_flat_quad() {
        let mut mesh = MeshData {
            name: None,
            positions: vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [1.0, 0.0, -1.0],
                [0.0, 0.0, -1.0],
            ],
            normals: vec![],
            indices: vec![0, 1, 2, 0, 2, 3],
        };
        mesh.compute_normals();
        assert_eq!(mesh.normals.len(), 4);
        for n in &mesh.normals {
            assert!((Vec3::from_array(*n) - Vec3::Y).length() < 1e-5);
        }
    }

    #[test]
    fn test_gltf_is_not_a_mesh_format() {
        assert_eq!(
            read_mesh(ModelFormat::Glb, &[]),
            Err(MeshError::NotAMeshFormat(ModelFormat::Glb))
        );
    }
}
