/// Buffer - Vulkan implementation of the Buffer trait

use ash::vk;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};
use ise_engine::ise::graphics_device::{Buffer as GraphicsBuffer, BufferDesc, BufferUsage, MemoryLocation};
use ise_engine::ise::{Error, Result};
use ise_engine::{engine_bail, engine_error};
use std::any::Any;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;
use crate::vulkan_format::vk_status;

/// Vulkan buffer implementation
pub struct Buffer {
    ctx: Arc<GpuContext>,
    pub(crate) buffer: vk::Buffer,
    allocation: Option<Allocation>,
    size: u64,
}

impl Buffer {
    pub(crate) fn new(ctx: Arc<GpuContext>, desc: &BufferDesc) -> Result<Self> {
        if desc.size == 0 {
            engine_bail!("ise::vulkan", "Cannot create a buffer of size 0");
        }

        let usage = match desc.usage {
            BufferUsage::Vertex => vk::BufferUsageFlags::VERTEX_BUFFER | vk::BufferUsageFlags::TRANSFER_DST,
            BufferUsage::Index => vk::BufferUsageFlags::INDEX_BUFFER | vk::BufferUsageFlags::TRANSFER_DST,
            BufferUsage::Uniform => vk::BufferUsageFlags::UNIFORM_BUFFER,
            BufferUsage::Staging => vk::BufferUsageFlags::TRANSFER_SRC,
        };
        let location = match desc.location {
            MemoryLocation::GpuOnly => gpu_allocator::MemoryLocation::GpuOnly,
            MemoryLocation::CpuToGpu => gpu_allocator::MemoryLocation::CpuToGpu,
        };

        unsafe {
            let create_info = vk::BufferCreateInfo::default()
                .size(desc.size)
                .usage(usage)
                .sharing_mode(vk::SharingMode::EXCLUSIVE);
            let buffer = ctx
                .device
                .create_buffer(&create_info, None)
                .map_err(|e| vk_status("Failed to create buffer", e))?;

            let requirements = ctx.device.get_buffer_memory_requirements(buffer);
            let allocated = ctx.allocator().and_then(|mut allocator| {
                allocator
                    .allocate(&AllocationCreateDesc {
                        name: "buffer",
                        requirements,
                        location,
                        linear: true,
                        allocation_scheme: AllocationScheme::GpuAllocatorManaged,
                    })
                    .map_err(|e| {
                        engine_error!("ise::vulkan", "Out of GPU memory for {} byte buffer: {:?}", desc.size, e);
                        Error::OutOfMemory
                    })
            });
            let allocation = match allocated {
                Ok(allocation) => allocation,
                Err(e) => {
                    ctx.device.destroy_buffer(buffer, None);
                    return Err(e);
                }
            };

            if let Err(e) = ctx.device.bind_buffer_memory(buffer, allocation.memory(), allocation.offset()) {
                if let Ok(mut allocator) = ctx.allocator() {
                    allocator.free(allocation).ok();
                }
                ctx.device.destroy_buffer(buffer, None);
                return Err(vk_status("Failed to bind buffer memory", e));
            }

            Ok(Self { ctx, buffer, allocation: Some(allocation), size: desc.size })
        }
    }

    pub(crate) fn from_dyn(buffer: &dyn GraphicsBuffer) -> Result<&Buffer> {
        buffer
            .as_any()
            .downcast_ref::<Buffer>()
            .ok_or_else(|| Error::BackendError("Buffer was not created by the Vulkan backend".to_string()))
    }
}

impl GraphicsBuffer for Buffer {
    fn size(&self) -> u64 {
        self.size
    }

    fn update(&self, offset: u64, data: &[u8]) -> Result<()> {
        let end = offset.checked_add(data.len() as u64);
        if end.map_or(true, |end| end > self.size) {
            engine_bail!(
                "ise::vulkan",
                "Buffer update out of bounds: offset {} + {} bytes > size {}",
                offset,
                data.len(),
                self.size
            );
        }

        let allocation = self
            .allocation
            .as_ref()
            .ok_or_else(|| Error::BackendError("Buffer has no allocation".to_string()))?;
        let mapped_ptr = allocation
            .mapped_ptr()
            .ok_or_else(|| Error::BackendError("Buffer is not CPU-accessible".to_string()))?
            .as_ptr() as *mut u8;

        unsafe {
            std::ptr::copy_nonoverlapping(data.as_ptr(), mapped_ptr.add(offset as usize), data.len());
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        unsafe {
            if let Some(allocation) = self.allocation.take() {
                // Don't panic if lock fails - we still need to destroy the buffer
                if let Ok(mut allocator) = self.ctx.allocator() {
                    allocator.free(allocation).ok();
                }
            }
            self.ctx.device.destroy_buffer(self.buffer, None);
        }
    }
}
