//! STL reader (binary and ASCII)

use glam::Vec3;

use super::{face_normal, MeshData, MeshError};

const HEADER_LEN: usize = 80;
const TRIANGLE_LEN: usize = 50;

/// Decode an STL file. Every facet gets its own three vertices so the
/// model renders flat-shaded, the way STL is meant to look.
pub fn read_stl(bytes: &[u8]) -> Result<MeshData, MeshError> {
    if looks_ascii(bytes) {
        let text = std::str::from_utf8(bytes).map_err(|e| MeshError::Parse {
            format: "STL",
            detail: format!("ASCII STL is not valid UTF-8: {}", e),
        })?;
        read_ascii(text)
    } else {
        read_binary(bytes)
    }
}

/// Binary files may also start with "solid" in their header, so the size
/// implied by the triangle count decides.
fn looks_ascii(bytes: &[u8]) -> bool {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    if !bytes[start..].starts_with(b"solid") {
        return false;
    }
    match binary_triangle_count(bytes).and_then(binary_len) {
        Some(len) => len != bytes.len(),
        None => true,
    }
}

/// File size a binary STL with `count` triangles must have, if addressable
fn binary_len(count: usize) -> Option<usize> {
    count
        .checked_mul(TRIANGLE_LEN)
        .and_then(|len| len.checked_add(HEADER_LEN + 4))
}

fn binary_triangle_count(bytes: &[u8]) -> Option<usize> {
    let raw = bytes.get(HEADER_LEN..HEADER_LEN + 4)?;
    Some(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]) as usize)
}

fn read_binary(bytes: &[u8]) -> Result<MeshData, MeshError> {
    let count = binary_triangle_count(bytes).ok_or_else(|| MeshError::Truncated {
        format: "STL",
        detail: format!("{} bytes is too small for header + triangle count", bytes.len()),
    })?;

    let expected = binary_len(count).ok_or_else(|| MeshError::Truncated {
        format: "STL",
        detail: format!("triangle count {} exceeds addressable size", count),
    })?;
    if bytes.len() < expected {
        return Err(MeshError::Truncated {
            format: "STL",
            detail: format!(
                "expected {} bytes for {} triangles, got {}",
                expected,
                count,
                bytes.len()
            ),
        });
    }

    let mut builder = FacetBuilder::with_capacity(count);
    let mut offset = HEADER_LEN + 4;
    for _ in 0..count {
        let normal = read_vec3(bytes, offset);
        let a = read_vec3(bytes, offset + 12);
        let b = read_vec3(bytes, offset + 24);
        let c = read_vec3(bytes, offset + 36);
        builder.push(normal, [a, b, c]);
        offset += TRIANGLE_LEN; // includes the 2-byte attribute count
    }

    Ok(builder.finish(None))
}

fn read_vec3(bytes: &[u8], offset: usize) -> Vec3 {
    let f = |o: usize| f32::from_le_bytes([bytes[o], bytes[o + 1], bytes[o + 2], bytes[o + 3]]);
    Vec3::new(f(offset), f(offset + 4), f(offset + 8))
}

fn read_ascii(text: &str) -> Result<MeshData, MeshError> {
    let mut name = None;
    let mut builder = FacetBuilder::with_capacity(0);
    let mut normal = Vec3::ZERO;
    let mut corners: Vec<Vec3> = Vec::with_capacity(3);

    for (line_no, line) in text.lines().enumerate() {
        let mut tokens = line.split_whitespace();
        match tokens.next() {
            Some("solid") => {
                let rest: Vec<&str> = tokens.collect();
                if !rest.is_empty() && name.is_none() {
                    name = Some(rest.join(" "));
                }
            }
            Some("facet") => {
                // facet normal nx ny nz
                let values: Vec<&str> = tokens.skip(1).collect();
                normal = parse_vec3(&values, line_no)?;
                corners.clear();
            }
            Some("vertex") => {
                let values: Vec<&str> = tokens.collect();
                corners.push(parse_vec3(&values, line_no)?);
            }
            Some("endfacet") => {
                if corners.len() != 3 {
                    return Err(MeshError::Parse {
                        format: "STL",
                        detail: format!(
                            "line {}: facet has {} vertices, expected 3",
                            line_no + 1,
                            corners.len()
                        ),
                    });
                }
                builder.push(normal, [corners[0], corners[1], corners[2]]);
                corners.clear();
            }
            _ => {}
        }
    }

    Ok(builder.finish(name))
}

fn parse_vec3(values: &[&str], line_no: usize) -> Result<Vec3, MeshError> {
    if values.len() < 3 {
        return Err(MeshError::Parse {
            format: "STL",
            detail: format!("line {}: expected 3 coordinates", line_no + 1),
        });
    }
    let mut out = [0.0f32; 3];
    for (slot, value) in out.iter_mut().zip(values) {
        *slot = value.parse().map_err(|_| MeshError::Parse {
            format: "STL",
            detail: format!("line {}: invalid number '{}'", line_no + 1, value),
        })?;
    }
    Ok(Vec3::from_array(out))
}

struct FacetBuilder {
    positions: Vec<[f32; 3]>,
    normals: Vec<[f32; 3]>,
}

impl FacetBuilder {
    fn with_capacity(triangles: usize) -> Self {
        Self {
            positions: Vec::with_capacity(triangles * 3),
            normals: Vec::with_capacity(triangles * 3),
        }
    }

    fn push(&mut self, normal: Vec3, corners: [Vec3; 3]) {
        // Many exporters write zero normals
        let normal = normal
            .try_normalize()
            .or_else(|| face_normal(corners[0], corners[1], corners[2]))
            .unwrap_or(Vec3::Y);
        for corner in corners {
            self.positions.push(corner.to_array());
            self.normals.push(normal.to_array());
        }
    }

    fn finish(self, name: Option<String>) -> MeshData {
        let indices = (0..self.positions.len() as u32).collect();
        MeshData {
            name,
            positions: self.positions,
            normals: self.normals,
            indices,
        }
    }
}
