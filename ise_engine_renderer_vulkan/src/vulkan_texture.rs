/// Texture - Vulkan implementation of the Texture trait
///
/// Sampled textures are uploaded through a staging buffer; when more than
/// one mip level is requested the chain is generated with linear blits from
/// level 0. Attachments are created empty.

use ash::vk;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};
use ise_engine::ise::graphics_device::{
    Buffer as GraphicsBuffer, BufferDesc, BufferUsage, MemoryLocation, Texture as GraphicsTexture,
    TextureDesc, TextureInfo, TextureUsage,
};
use ise_engine::ise::{Error, Result};
use ise_engine::{engine_bail, engine_error, engine_trace};
use std::any::Any;
use std::sync::Arc;

use crate::vulkan_buffer::Buffer;
use crate::vulkan_context::GpuContext;
use crate::vulkan_format::{aspect_mask, format_to_vk, sample_count_to_vk, vk_status};

/// Vulkan texture implementation (image + view)
pub struct Texture {
    ctx: Arc<GpuContext>,
    pub(crate) image: vk::Image,
    pub(crate) view: vk::ImageView,
    allocation: Option<Allocation>,
    info: TextureInfo,
}

impl Texture {
    pub(crate) fn new(ctx: Arc<GpuContext>, desc: &TextureDesc<'_>) -> Result<Self> {
        if desc.width == 0 || desc.height == 0 {
            engine_bail!("ise::vulkan", "Texture extent {}x{} is empty", desc.width, desc.height);
        }
        let mip_levels = desc.mip_levels.max(1);
        let format = format_to_vk(desc.format);

        let usage = match desc.usage {
            TextureUsage::Sampled => {
                vk::ImageUsageFlags::SAMPLED
                    | vk::ImageUsageFlags::TRANSFER_DST
                    | vk::ImageUsageFlags::TRANSFER_SRC
            }
            TextureUsage::ColorAttachment => {
                vk::ImageUsageFlags::COLOR_ATTACHMENT | vk::ImageUsageFlags::TRANSIENT_ATTACHMENT
            }
            TextureUsage::DepthAttachment => vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT,
        };

        if desc.usage == TextureUsage::Sampled && mip_levels > 1 {
            let properties = unsafe {
                ctx.instance
                    .get_physical_device_format_properties(ctx.physical_device, format)
            };
            if !properties
                .optimal_tiling_features
                .contains(vk::FormatFeatureFlags::SAMPLED_IMAGE_FILTER_LINEAR)
            {
                engine_bail!("ise::vulkan", "Texture format {:?} does not support linear blitting", desc.format);
            }
        }

        let texture = unsafe {
            let image_info = vk::ImageCreateInfo::default()
                .image_type(vk::ImageType::TYPE_2D)
                .format(format)
                .extent(vk::Extent3D { width: desc.width, height: desc.height, depth: 1 })
                .mip_levels(mip_levels)
                .array_layers(1)
                .samples(sample_count_to_vk(desc.samples))
                .tiling(vk::ImageTiling::OPTIMAL)
                .usage(usage)
                .sharing_mode(vk::SharingMode::EXCLUSIVE)
                .initial_layout(vk::ImageLayout::UNDEFINED);

            let image = ctx
                .device
                .create_image(&image_info, None)
                .map_err(|e| vk_status("Failed to create image", e))?;

            // From here on Drop cleans up whatever was created
            let mut texture = Self {
                ctx: Arc::clone(&ctx),
                image,
                view: vk::ImageView::null(),
                allocation: None,
                info: TextureInfo::from_desc(desc),
            };
            texture.info.mip_levels = mip_levels;

            let requirements = ctx.device.get_image_memory_requirements(image);
            let allocation = ctx.allocator()?.allocate(&AllocationCreateDesc {
                name: "texture",
                requirements,
                location: gpu_allocator::MemoryLocation::GpuOnly,
                linear: false,
                allocation_scheme: AllocationScheme::GpuAllocatorManaged,
            });
            let allocation = allocation.map_err(|e| {
                let size_mb = requirements.size as f64 / (1024.0 * 1024.0);
                engine_error!("ise::vulkan", "Out of GPU memory for texture ({:.2} MB): {:?}", size_mb, e);
                Error::OutOfMemory
            })?;
            ctx.device
                .bind_image_memory(image, allocation.memory(), allocation.offset())
                .map_err(|e| vk_status("Failed to bind image memory", e))?;
            texture.allocation = Some(allocation);

            let view_info = vk::ImageViewCreateInfo::default()
                .image(image)
                .view_type(vk::ImageViewType::TYPE_2D)
                .format(format)
                .subresource_range(vk::ImageSubresourceRange {
                    aspect_mask: aspect_mask(desc.format),
                    base_mip_level: 0,
                    level_count: mip_levels,
                    base_array_layer: 0,
                    layer_count: 1,
                });
            texture.view = ctx
                .device
                .create_image_view(&view_info, None)
                .map_err(|e| vk_status("Failed to create image view", e))?;
            texture
        };

        if let Some(data) = desc.data {
            texture.upload(data)?;
        }
        Ok(texture)
    }

    /// Copy level 0 from `data` and fill the remaining mip levels
    fn upload(&self, data: &[u8]) -> Result<()> {
        let expected = self.info.width as u64 * self.info.height as u64 * 4;
        if data.len() as u64 != expected {
            engine_bail!(
                "ise::vulkan",
                "Texture data is {} bytes, expected {} for {}x{}",
                data.len(),
                expected,
                self.info.width,
                self.info.height
            );
        }

        let staging = Buffer::new(
            Arc::clone(&self.ctx),
            &BufferDesc {
                size: data.len() as u64,
                usage: BufferUsage::Staging,
                location: MemoryLocation::CpuToGpu,
            },
        )?;
        staging.update(0, data)?;

        let device = &self.ctx.device;
        let image = self.image;
        let (width, height, mip_levels) = (self.info.width, self.info.height, self.info.mip_levels);

        self.ctx.submit_one_shot(|cmd| unsafe {
            transition(
                device,
                cmd,
                image,
                (0, mip_levels),
                (vk::ImageLayout::UNDEFINED, vk::ImageLayout::TRANSFER_DST_OPTIMAL),
                (vk::AccessFlags::empty(), vk::AccessFlags::TRANSFER_WRITE),
                (vk::PipelineStageFlags::TOP_OF_PIPE, vk::PipelineStageFlags::TRANSFER),
            );

            let region = vk::BufferImageCopy::default()
                .image_subresource(color_layers(0))
                .image_extent(vk::Extent3D { width, height, depth: 1 });
            device.cmd_copy_buffer_to_image(
                cmd,
                staging.buffer,
                image,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                &[region],
            );

            for mip in 1..mip_levels {
                let src_mip = mip - 1;
                transition(
                    device,
                    cmd,
                    image,
                    (src_mip, 1),
                    (vk::ImageLayout::TRANSFER_DST_OPTIMAL, vk::ImageLayout::TRANSFER_SRC_OPTIMAL),
                    (vk::AccessFlags::TRANSFER_WRITE, vk::AccessFlags::TRANSFER_READ),
                    (vk::PipelineStageFlags::TRANSFER, vk::PipelineStageFlags::TRANSFER),
                );

                let blit = vk::ImageBlit::default()
                    .src_subresource(color_layers(src_mip))
                    .src_offsets([vk::Offset3D::default(), mip_extent(width, height, src_mip)])
                    .dst_subresource(color_layers(mip))
                    .dst_offsets([vk::Offset3D::default(), mip_extent(width, height, mip)]);
                device.cmd_blit_image(
                    cmd,
                    image,
                    vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
                    image,
                    vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                    &[blit],
                    vk::Filter::LINEAR,
                );

                transition(
                    device,
                    cmd,
                    image,
                    (src_mip, 1),
                    (vk::ImageLayout::TRANSFER_SRC_OPTIMAL, vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL),
                    (vk::AccessFlags::TRANSFER_READ, vk::AccessFlags::SHADER_READ),
                    (vk::PipelineStageFlags::TRANSFER, vk::PipelineStageFlags::FRAGMENT_SHADER),
                );
            }

            // Last level was only ever written
            transition(
                device,
                cmd,
                image,
                (mip_levels - 1, 1),
                (vk::ImageLayout::TRANSFER_DST_OPTIMAL, vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL),
                (vk::AccessFlags::TRANSFER_WRITE, vk::AccessFlags::SHADER_READ),
                (vk::PipelineStageFlags::TRANSFER, vk::PipelineStageFlags::FRAGMENT_SHADER),
            );
        })?;

        engine_trace!("ise::vulkan", "Uploaded {}x{} texture with {} mip levels", width, height, mip_levels);
        Ok(())
    }

    pub(crate) fn from_dyn(texture: &dyn GraphicsTexture) -> Result<&Texture> {
        texture
            .as_any()
            .downcast_ref::<Texture>()
            .ok_or_else(|| Error::BackendError("Texture was not created by the Vulkan backend".to_string()))
    }
}

fn color_layers(mip_level: u32) -> vk::ImageSubresourceLayers {
    vk::ImageSubresourceLayers {
        aspect_mask: vk::ImageAspectFlags::COLOR,
        mip_level,
        base_array_layer: 0,
        layer_count: 1,
    }
}

fn mip_extent(width: u32, height: u32, mip: u32) -> vk::Offset3D {
    vk::Offset3D {
        x: (width >> mip).max(1) as i32,
        y: (height >> mip).max(1) as i32,
        z: 1,
    }
}

/// Layout transition of `levels` = (base, count) color mip levels
unsafe fn transition(
    device: &ash::Device,
    cmd: vk::CommandBuffer,
    image: vk::Image,
    levels: (u32, u32),
    layouts: (vk::ImageLayout, vk::ImageLayout),
    access: (vk::AccessFlags, vk::AccessFlags),
    stages: (vk::PipelineStageFlags, vk::PipelineStageFlags),
) {
    let barrier = vk::ImageMemoryBarrier::default()
        .old_layout(layouts.0)
        .new_layout(layouts.1)
        .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
        .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
        .image(image)
        .subresource_range(vk::ImageSubresourceRange {
            aspect_mask: vk::ImageAspectFlags::COLOR,
            base_mip_level: levels.0,
            level_count: levels.1,
            base_array_layer: 0,
            layer_count: 1,
        })
        .src_access_mask(access.0)
        .dst_access_mask(access.1);

    device.cmd_pipeline_barrier(
        cmd,
        stages.0,
        stages.1,
        vk::DependencyFlags::empty(),
        &[],
        &[],
        &[barrier],
    );
}

impl GraphicsTexture for Texture {
    fn info(&self) -> &TextureInfo {
        &self.info
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        unsafe {
            if self.view != vk::ImageView::null() {
                self.ctx.device.destroy_image_view(self.view, None);
            }
            if let Some(allocation) = self.allocation.take() {
                if let Ok(mut allocator) = self.ctx.allocator() {
                    allocator.free(allocation).ok();
                }
            }
            self.ctx.device.destroy_image(self.image, None);
        }
    }
}
