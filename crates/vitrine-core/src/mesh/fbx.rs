//! Binary FBX reader
//!
//! Only static geometry is extracted: every `Objects/Geometry` node that
//! carries `Vertices` and `PolygonVertexIndex` becomes one mesh. Model
//! transforms, materials, skinning, and animation stacks are not read.
//! The node tree itself comes from `fbxcel`, which handles 7.4 and 7.5
//! offsets and compressed arrays.

use fbxcel::low::v7400::AttributeValue;
use fbxcel::tree::any::AnyTree;
use fbxcel::tree::v7400::NodeHandle;
use std::io::Cursor;

use super::{MeshData, MeshError};

const MAGIC: &[u8] = b"Kaydara FBX Binary  \0";

/// Decode a binary FBX file into one mesh per geometry object
pub fn read_fbx(bytes: &[u8]) -> Result<Vec<MeshData>, MeshError> {
    if !bytes.starts_with(MAGIC) {
        let text_start = bytes.iter().take(64).all(|b| b.is_ascii());
        return Err(if text_start {
            MeshError::Unsupported {
                format: "FBX",
                detail: "ASCII FBX files are not supported, export as binary".to_string(),
            }
        } else {
            parse_error("missing binary FBX magic")
        });
    }

    let tree = match AnyTree::from_seekable_reader(Cursor::new(bytes)) {
        Ok(AnyTree::V7400(version, tree, _footer)) => {
            tracing::debug!(?version, size = bytes.len(), "Reading binary FBX");
            tree
        }
        Ok(_) => {
            return Err(MeshError::Unsupported {
                format: "FBX",
                detail: "unknown FBX version".to_string(),
            })
        }
        Err(e) => return Err(parse_error(&e.to_string())),
    };

    let objects = child(tree.root(), "Objects").ok_or_else(|| parse_error("no Objects section"))?;

    let meshes: Vec<MeshData> = objects
        .children()
        .filter(|n| n.name() == "Geometry")
        .filter_map(|g| geometry_to_mesh(g).transpose())
        .collect::<Result<_, _>>()?;

    if meshes.is_empty() {
        return Err(parse_error("no mesh geometry found"));
    }
    Ok(meshes)
}

fn child<'a>(node: NodeHandle<'a>, name: &str) -> Option<NodeHandle<'a>> {
    node.children().find(|c| c.name() == name)
}

fn geometry_to_mesh(geometry: NodeHandle<'_>) -> Result<Option<MeshData>, MeshError> {
    let (Some(vertices), Some(polygons)) = (
        child(geometry, "Vertices"),
        child(geometry, "PolygonVertexIndex"),
    ) else {
        // Shapes, NURBS, and other non-mesh geometry
        return Ok(None);
    };

    let positions: Vec<[f32; 3]> = match vertices.attributes().first() {
        Some(AttributeValue::ArrF64(v)) => v
            .chunks_exact(3)
            .map(|c| [c[0] as f32, c[1] as f32, c[2] as f32])
            .collect(),
        Some(AttributeValue::ArrF32(v)) => v.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect(),
        _ => return Err(parse_error("Vertices is not a float array")),
    };
    let polygon_indices: &[i32] = match polygons.attributes().first() {
        Some(AttributeValue::ArrI32(v)) => v.as_slice(),
        _ => return Err(parse_error("PolygonVertexIndex is not an int array")),
    };

    let mut indices = Vec::with_capacity(polygon_indices.len() * 2);
    let mut polygon: Vec<u32> = Vec::with_capacity(4);
    for &raw in polygon_indices {
        // A negative index closes the polygon and is stored bitwise-negated
        let (index, last) = if raw < 0 { (!raw, true) } else { (raw, false) };
        let index = index as u32;
        if index as usize >= positions.len() {
            return Err(parse_error(&format!(
                "polygon index {} out of range for {} vertices",
                index,
                positions.len()
            )));
        }
        polygon.push(index);
        if last {
            for i in 1..polygon.len().saturating_sub(1) {
                indices.extend_from_slice(&[polygon[0], polygon[i], polygon[i + 1]]);
            }
            polygon.clear();
        }
    }

    let name = geometry.attributes().get(1).and_then(|p| match p {
        // "Name\0\x01Geometry"
        AttributeValue::String(s) => s.split('\0').next().filter(|n| !n.is_empty()).map(String::from),
        _ => None,
    });

    let mut mesh = MeshData {
        name,
        positions,
        normals: Vec::new(),
        indices,
    };
    mesh.compute_normals();
    Ok(Some(mesh))
}

fn parse_error(detail: &str) -> MeshError {
    MeshError::Parse {
        format: "FBX",
        detail: detail.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::ZlibEncoder;
    use flate2::Compression;
    use std::io::Write;

    /// Minimal writer for 7.4 (32-bit offset) binary files
    struct Writer {
        out: Vec<u8>,
    }

    enum TestProp<'a> {
        Long(i64),
        Str(&'a str),
        Doubles(&'a [f64], bool),
        Ints(&'a [i32]),
        /// Compressed doubles array declaring `count` elements
        Deflated(u32, &'a [u8]),
    }

    impl Writer {
        fn new() -> Self {
            let mut out = MAGIC.to_vec();
            out.extend_from_slice(&[0x1a, 0x00]);
            out.extend_from_slice(&7400u32.to_le_bytes());
            Self { out }
        }

        fn node(&mut self, name: &str, props: &[TestProp], children: impl FnOnce(&mut Self)) {
            let start = self.out.len();
            self.out.extend_from_slice(&[0u8; 12]);
            self.out.push(name.len() as u8);
            self.out.extend_from_slice(name.as_bytes());
            let props_start = self.out.len();
            for p in props {
                self.prop(p);
            }
            let props_len = (self.out.len() - props_start) as u32;
            let before_children = self.out.len();
            children(self);
            if self.out.len() != before_children {
                self.null_record();
            }
            let end = self.out.len() as u32;
            self.out[start..start + 4].copy_from_slice(&end.to_le_bytes());
            self.out[start + 4..start + 8].copy_from_slice(&(props.len() as u32).to_le_bytes());
            self.out[start + 8..start + 12].copy_from_slice(&props_len.to_le_bytes());
        }

        fn null_record(&mut self) {
            self.out.extend_from_slice(&[0u8; 13]);
        }

        fn prop(&mut self, p: &TestProp) {
            match p {
                TestProp::Long(v) => {
                    self.out.push(b'L');
                    self.out.extend_from_slice(&v.to_le_bytes());
                }
                TestProp::Str(s) => {
                    self.out.push(b'S');
                    self.out.extend_from_slice(&(s.len() as u32).to_le_bytes());
                    self.out.extend_from_slice(s.as_bytes());
                }
                TestProp::Doubles(values, compress) => {
                    let raw: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
                    self.out.push(b'd');
                    self.out.extend_from_slice(&(values.len() as u32).to_le_bytes());
                    let payload = if *compress {
                        let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
                        enc.write_all(&raw).unwrap();
                        enc.finish().unwrap()
                    } else {
                        raw
                    };
                    self.out.extend_from_slice(&(*compress as u32).to_le_bytes());
                    self.out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
                    self.out.extend_from_slice(&payload);
                }
                TestProp::Deflated(count, payload) => {
                    self.out.push(b'd');
                    self.out.extend_from_slice(&count.to_le_bytes());
                    self.out.extend_from_slice(&1u32.to_le_bytes());
                    self.out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
                    self.out.extend_from_slice(payload);
                }
                TestProp::Ints(values) => {
                    self.out.push(b'i');
                    self.out.extend_from_slice(&(values.len() as u32).to_le_bytes());
                    self.out.extend_from_slice(&0u32.to_le_bytes());
                    self.out.extend_from_slice(&((values.len() * 4) as u32).to_le_bytes());
                    for v in *values {
                        self.out.extend_from_slice(&v.to_le_bytes());
                    }
                }
            }
        }

        fn finish(mut self) -> Vec<u8> {
            self.null_record();
            self.out
        }
    }

    fn quad_geometry(w: &mut Writer, name: &str, compress: bool) {
        let vertices = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, -1.0, 0.0, 0.0, -1.0];
        // One quad: 0 1 2 !3
        let polygons = [0, 1, 2, -4];
        let full_name = format!("{}\0\x01Geometry", name);
        w.node(
            "Geometry",
            &[TestProp::Long(1), TestProp::Str(&full_name), TestProp::Str("Mesh")],
            |w| {
                w.node("Vertices", &[TestProp::Doubles(&vertices, compress)], |_| {});
                w.node("PolygonVertexIndex", &[TestProp::Ints(&polygons)], |_| {});
            },
        );
    }

    #[test]
    fn test_reads_quad_geometry() {
        let mut w = Writer::new();
        w.node("FBXHeaderExtension", &[], |_| {});
        w.node("Objects", &[], |w| {
            quad_geometry(w, "Floor", false);
            quad_geometry(w, "Lid", true);
        });
        let meshes = read_fbx(&w.finish()).unwrap();

        assert_eq!(meshes.len(), 2);
        assert_eq!(meshes[0].name.as_deref(), Some("Floor"));
        assert_eq!(meshes[0].indices, vec![0, 1, 2, 0, 2, 3]);
        assert_eq!(meshes[1].positions, meshes[0].positions);
        let n = meshes[0].normals[0];
        assert!((n[1] - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_ascii_fbx_rejected() {
        let text = b"; FBX 7.4.0 project file\nFBXHeaderExtension:  {\n}";
        assert!(matches!(read_fbx(text), Err(MeshError::Unsupported { .. })));
    }

    #[test]
    fn test_truncated_file() {
        let mut w = Writer::new();
        w.node("Objects", &[], |w| quad_geometry(w, "Floor", false));
        let mut bytes = w.finish();
        bytes.truncate(bytes.len() - 40);
        assert!(read_fbx(&bytes).is_err());
    }

    #[test]
    fn test_out_of_range_index() {
        let mut w = Writer::new();
        w.node("Objects", &[], |w| {
            w.node("Geometry", &[TestProp::Long(1)], |w| {
                w.node("Vertices", &[TestProp::Doubles(&[0.0, 0.0, 0.0], false)], |_| {});
                w.node("PolygonVertexIndex", &[TestProp::Ints(&[0, 1, -3])], |_| {});
            });
        });
        assert!(matches!(read_fbx(&w.finish()), Err(MeshError::Parse { .. })));
    }

    #[test]
    fn test_deeply_nested_records_fail_cleanly() {
        const DEPTH: usize = 100_000;
        const RECORD_LEN: usize = 14;
        let mut bytes = MAGIC.to_vec();
        bytes.extend_from_slice(&[0x1a, 0x00]);
        bytes.extend_from_slice(&7400u32.to_le_bytes());
        let end = (bytes.len() + DEPTH * RECORD_LEN) as u32;
        for _ in 0..DEPTH {
            bytes.extend_from_slice(&end.to_le_bytes());
            bytes.extend_from_slice(&0u32.to_le_bytes());
            bytes.extend_from_slice(&0u32.to_le_bytes());
            bytes.push(1);
            bytes.push(b'N');
        }
        assert!(read_fbx(&bytes).is_err());
    }

    #[test]
    fn test_compressed_array_is_bounded_by_declared_count() {
        let zeros = vec![0u8; 8 << 20];
        let mut enc = ZlibEncoder::new(Vec::new(), Compression::best());
        enc.write_all(&zeros).unwrap();
        let payload = enc.finish().unwrap();

        let mut w = Writer::new();
        w.node("Objects", &[], |w| {
            w.node("Geometry", &[TestProp::Long(1)], |w| {
                w.node("Vertices", &[TestProp::Deflated(1, &payload)], |_| {});
                w.node("PolygonVertexIndex", &[TestProp::Ints(&[0, 1, -3])], |_| {});
            });
        });
        // One declared element yields no whole vertex, never 8 MiB of them
        assert!(read_fbx(&w.finish()).is_err());
    }
}
