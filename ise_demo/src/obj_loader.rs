/// Minimal Wavefront OBJ reader
///
/// Reads positions (`v`), texture coordinates (`vt`) and faces (`f`);
/// everything else (normals, groups, materials) is skipped. Polygons are
/// triangulated as fans. The V texture coordinate is flipped so that images
/// stored top row first map the right way up, and every vertex is white.
/// Identical face corners share one vertex.

use std::path::Path;

use ise_engine::glam::{Vec2, Vec3};
use ise_engine::ise::resource::{MeshData, Vertex, VertexKey};
use ise_engine::ise::{Error, Result};
use rustc_hash::FxHashMap;

/// Load and parse an OBJ file
pub fn load_obj(path: &Path) -> Result<MeshData> {
    let source = std::fs::read_to_string(path)
        .map_err(|e| Error::Load(format!("cannot read model {}: {}", path.display(), e)))?;
    parse_obj(&source).map_err(|e| match e {
        Error::Load(msg) => Error::Load(format!("{}: {}", path.display(), msg)),
        other => other,
    })
}

/// Parse OBJ text into an indexed mesh
pub fn parse_obj(source: &str) -> Result<MeshData> {
    let mut positions: Vec<Vec3> = Vec::new();
    let mut tex_coords: Vec<Vec2> = Vec::new();
    let mut mesh = MeshData::default();
    let mut unique: FxHashMap<VertexKey, u32> = FxHashMap::default();

    for (line_index, raw_line) in source.lines().enumerate() {
        let line_number = line_index + 1;
        let line = raw_line.split('#').next().unwrap_or("").trim();
        let mut parts = line.split_whitespace();
        let Some(keyword) = parts.next() else {
            continue;
        };

        match keyword {
            "v" => {
                let [x, y, z] = parse_floats::<3>(&mut parts, line_number)?;
                positions.push(Vec3::new(x, y, z));
            }
            "vt" => {
                let [u, v] = parse_floats::<2>(&mut parts, line_number)?;
                tex_coords.push(Vec2::new(u, 1.0 - v));
            }
            "f" => {
                let corners: Vec<&str> = parts.collect();
                if corners.len() < 3 {
                    return Err(Error::Load(format!(
                        "line {}: face needs at least 3 vertices, got {}",
                        line_number,
                        corners.len()
                    )));
                }

                let mut face = Vec::with_capacity(corners.len());
                for corner in corners {
                    let vertex = parse_corner(corner, &positions, &tex_coords, line_number)?;
                    let next_index = mesh.vertices.len() as u32;
                    let index = *unique.entry(vertex.key()).or_insert_with(|| {
                        mesh.vertices.push(vertex);
                        next_index
                    });
                    face.push(index);
                }

                for i in 1..face.len() - 1 {
                    mesh.indices.extend_from_slice(&[face[0], face[i], face[i + 1]]);
                }
            }
            _ => {}
        }
    }

    if mesh.indices.is_empty() {
        return Err(Error::Load("model contains no faces".to_string()));
    }
    Ok(mesh)
}

fn parse_floats<'a, const N: usize>(
    parts: &mut impl Iterator<Item = &'a str>,
    line_number: usize,
) -> Result<[f32; N]> {
    let mut values = [0.0f32; N];
    for value in values.iter_mut() {
        let token = parts
            .next()
            .ok_or_else(|| Error::Load(format!("line {}: expected {} numbers", line_number, N)))?;
        *value = token
            .parse()
            .map_err(|_| Error::Load(format!("line {}: {:?} is not a number", line_number, token)))?;
    }
    Ok(values)
}

/// `v`, `v/vt`, `v//vn` or `v/vt/vn`
fn parse_corner(corner: &str, positions: &[Vec3], tex_coords: &[Vec2], line_number: usize) -> Result<Vertex> {
    let mut fields = corner.split('/');
    let position_field = fields.next().unwrap_or("");
    let tex_field = fields.next().unwrap_or("");

    let position = *resolve_index(position_field, positions, line_number)?;
    let tex_coord = if tex_field.is_empty() {
        Vec2::ZERO
    } else {
        *resolve_index(tex_field, tex_coords, line_number)?
    };

    Ok(Vertex::new(position, Vec3::ONE, tex_coord))
}

/// OBJ indices are 1-based; negative ones count back from the last element
fn resolve_index<'a, T>(field: &str, items: &'a [T], line_number: usize) -> Result<&'a T> {
    let index: i64 = field
        .parse()
        .map_err(|_| Error::Load(format!("line {}: bad index {:?}", line_number, field)))?;
    let resolved = match index {
        0 => None,
        i if i > 0 => Some(i as usize - 1),
        i => (items.len() as i64 + i).try_into().ok(),
    };
    resolved.and_then(|i| items.get(i)).ok_or_else(|| {
        Error::Load(format!(
            "line {}: index {} out of range ({} defined)",
            line_number,
            index,
            items.len()
        ))
    })
}

#[cfg(test)]
#[path = "obj_loader_tests.rs"]
mod tests;
