/// Vertex format and CPU-side mesh/image data handed to the renderer

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};

use crate::error::{Error, Result};
use crate::graphics_device::{VertexAttribute, VertexFormat, VertexLayout};

/// Interleaved vertex: position, color, texture coordinate
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub pos: Vec3,
    pub color: Vec3,
    pub tex_coord: Vec2,
}

/// Exact identity of a vertex (bit patterns of every component)
pub type VertexKey = [u32; 8];

impl Vertex {
    pub fn new(pos: Vec3, color: Vec3, tex_coord: Vec2) -> Self {
        Self { pos, color, tex_coord }
    }

    /// Bitwise identity used for deduplication
    ///
    /// Two vertices share a key only if every float has the same bit
    /// pattern, so `0.0` and `-0.0` stay distinct and NaNs never merge
    /// with numbers.
    pub fn key(&self) -> VertexKey {
        [
            self.pos.x.to_bits(),
            self.pos.y.to_bits(),
            self.pos.z.to_bits(),
            self.color.x.to_bits(),
            self.color.y.to_bits(),
            self.color.z.to_bits(),
            self.tex_coord.x.to_bits(),
            self.tex_coord.y.to_bits(),
        ]
    }

    /// Pipeline vertex input layout (locations 0, 1, 2)
    pub fn layout() -> VertexLayout {
        VertexLayout {
            stride: std::mem::size_of::<Vertex>() as u32,
            attributes: vec![
                VertexAttribute { location: 0, format: VertexFormat::Float3, offset: 0 },
                VertexAttribute { location: 1, format: VertexFormat::Float3, offset: 12 },
                VertexAttribute { location: 2, format: VertexFormat::Float2, offset: 24 },
            ],
        }
    }
}

/// Indexed triangle mesh
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// Reject empty meshes and indices pointing past the vertex list
    pub fn validate(&self) -> Result<()> {
        if self.vertices.is_empty() || self.indices.is_empty() {
            return Err(Error::InvalidResource(format!(
                "mesh is empty ({} vertices, {} indices)",
                self.vertices.len(),
                self.indices.len()
            )));
        }
        if let Some(bad) = self.indices.iter().find(|&&index| index as usize >= self.vertices.len()) {
            return Err(Error::InvalidResource(format!(
                "index {} references a missing vertex (mesh has {})",
                bad,
                self.vertices.len()
            )));
        }
        Ok(())
    }
}

/// Tightly packed RGBA8 image
#[derive(Debug, Clone)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl ImageData {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self { width, height, pixels }
    }

    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::InvalidResource(format!(
                "image has an empty extent ({}x{})",
                self.width, self.height
            )));
        }
        let expected = self.width as usize * self.height as usize * 4;
        if self.pixels.len() != expected {
            return Err(Error::InvalidResource(format!(
                "image is {} bytes, expected {} for {}x{} RGBA8",
                self.pixels.len(),
                expected,
                self.width,
                self.height
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "vertex_tests.rs"]
mod tests;
