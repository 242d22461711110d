/// Shared vertex/index buffers and the CPU-side geometry they mirror
///
/// Every geometry load appends to the CPU arrays and rebuilds both GPU
/// buffers from scratch through a host-visible staging buffer.

use std::sync::Arc;

use glam::Mat4;
use rustc_hash::FxHashMap;

use crate::error::Result;
use crate::graphics_device::{Buffer, BufferDesc, BufferUsage, GraphicsDevice, MemoryLocation};
use crate::resource::{DrawRange, MeshData, Vertex, VertexKey};
use crate::engine_debug;

pub struct BufferSynchronizer {
    vertex_buffer: Option<Arc<dyn Buffer>>,
    index_buffer: Option<Arc<dyn Buffer>>,
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    unique: FxHashMap<VertexKey, u32>,
}

impl BufferSynchronizer {
    pub fn new() -> Self {
        Self {
            vertex_buffer: None,
            index_buffer: None,
            vertices: Vec::new(),
            indices: Vec::new(),
            unique: FxHashMap::default(),
        }
    }

    /// Append a mesh transformed by `offset` and upload the result
    ///
    /// Vertices equal to one already loaded (by any earlier call) reuse its
    /// index; new vertices are numbered in first-seen order. Returns the
    /// index range the mesh occupies.
    pub fn load_geometry(
        &mut self,
        device: &mut dyn GraphicsDevice,
        mesh: &MeshData,
        offset: Mat4,
    ) -> Result<DrawRange> {
        mesh.validate()?;

        let first_index = self.indices.len() as u32;
        let vertices_before = self.vertices.len();
        for &source_index in &mesh.indices {
            let mut vertex = mesh.vertices[source_index as usize];
            vertex.pos = offset.transform_point3(vertex.pos);

            let next = self.vertices.len() as u32;
            let index = *self.unique.entry(vertex.key()).or_insert(next);
            if index == next {
                self.vertices.push(vertex);
            }
            self.indices.push(index);
        }
        let range = DrawRange {
            first_index,
            index_count: mesh.indices.len() as u32,
        };

        if let Err(err) = self.rebuild(device) {
            self.rollback(vertices_before, first_index as usize);
            return Err(err);
        }

        engine_debug!(
            "ise::BufferSynchronizer",
            "Loaded {} indices, {} new vertices ({} total)",
            range.index_count,
            self.vertices.len() - vertices_before,
            self.vertices.len()
        );
        Ok(range)
    }

    /// Recreate both device-local buffers from the CPU arrays
    ///
    /// The current buffers stay in place until both new ones are uploaded.
    fn rebuild(&mut self, device: &mut dyn GraphicsDevice) -> Result<()> {
        let vertex_buffer =
            Self::upload(device, bytemuck::cast_slice(&self.vertices), BufferUsage::Vertex)?;
        let index_buffer =
            Self::upload(device, bytemuck::cast_slice(&self.indices), BufferUsage::Index)?;

        device.wait_idle()?;
        self.vertex_buffer = Some(vertex_buffer);
        self.index_buffer = Some(index_buffer);
        Ok(())
    }

    /// Forget everything appended since the arrays had these lengths
    fn rollback(&mut self, vertex_count: usize, index_count: usize) {
        for vertex in self.vertices.drain(vertex_count..) {
            self.unique.remove(&vertex.key());
        }
        self.indices.truncate(index_count);
    }

    fn upload(
        device: &mut dyn GraphicsDevice,
        bytes: &[u8],
        usage: BufferUsage,
    ) -> Result<Arc<dyn Buffer>> {
        let size = bytes.len() as u64;
        let staging = device.create_buffer(&BufferDesc {
            size,
            usage: BufferUsage::Staging,
            location: MemoryLocation::CpuToGpu,
        })?;
        staging.update(0, bytes)?;

        let buffer = device.create_buffer(&BufferDesc {
            size,
            usage,
            location: MemoryLocation::GpuOnly,
        })?;
        device.copy_buffer(staging.as_ref(), buffer.as_ref(), size)?;
        Ok(buffer)
    }

    pub fn vertex_buffer(&self) -> Option<&Arc<dyn Buffer>> {
        self.vertex_buffer.as_ref()
    }

    pub fn index_buffer(&self) -> Option<&Arc<dyn Buffer>> {
        self.index_buffer.as_ref()
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    /// Drop the GPU buffers and forget all geometry
    pub(crate) fn clear(&mut self) {
        self.vertex_buffer = None;
        self.index_buffer = None;
        self.vertices.clear();
        self.indices.clear();
        self.unique.clear();
    }
}

impl Default for BufferSynchronizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "buffer_synchronizer_tests.rs"]
mod tests;
