/// DescriptorSet - Vulkan implementation of the DescriptorSet trait
///
/// Sets come from the context's shared pool (created with
/// FREE_DESCRIPTOR_SET) and are handed back to it when dropped.

use ash::vk;
use ise_engine::ise::graphics_device::{
    Buffer as GraphicsBuffer, DescriptorSet as GraphicsDescriptorSet, TextureBinding,
};
use ise_engine::ise::{Error, Result};
use ise_engine::{engine_bail, engine_warn};
use std::any::Any;
use std::sync::Arc;

use crate::vulkan_buffer::Buffer;
use crate::vulkan_context::GpuContext;
use crate::vulkan_format::vk_status;
use crate::vulkan_sampler::Sampler;
use crate::vulkan_texture::Texture;

pub struct DescriptorSet {
    ctx: Arc<GpuContext>,
    pub(crate) set: vk::DescriptorSet,
    binding_count: u32,
}

impl DescriptorSet {
    fn allocate(ctx: Arc<GpuContext>, layout: vk::DescriptorSetLayout, binding_count: u32) -> Result<Self> {
        let pool = ctx
            .descriptor_pool
            .lock()
            .map_err(|_| Error::BackendError("descriptor pool lock poisoned".to_string()))?;
        let layouts = [layout];
        let alloc_info = vk::DescriptorSetAllocateInfo::default()
            .descriptor_pool(*pool)
            .set_layouts(&layouts);

        let set = unsafe {
            match ctx.device.allocate_descriptor_sets(&alloc_info) {
                Ok(sets) => sets[0],
                Err(vk::Result::ERROR_OUT_OF_POOL_MEMORY) | Err(vk::Result::ERROR_FRAGMENTED_POOL) => {
                    engine_bail!("ise::vulkan", "Descriptor pool exhausted");
                }
                Err(e) => return Err(vk_status("Failed to allocate descriptor set", e)),
            }
        };
        drop(pool);

        Ok(Self { ctx, set, binding_count })
    }

    /// Allocate a uniform set and point binding 0 at the whole of `buffer`
    pub(crate) fn uniform(
        ctx: Arc<GpuContext>,
        layout: vk::DescriptorSetLayout,
        buffer: &dyn GraphicsBuffer,
    ) -> Result<Self> {
        let vk_buffer = Buffer::from_dyn(buffer)?;
        let set = Self::allocate(ctx, layout, 1)?;

        let buffer_infos = [vk::DescriptorBufferInfo {
            buffer: vk_buffer.buffer,
            offset: 0,
            range: buffer.size(),
        }];
        let write = vk::WriteDescriptorSet::default()
            .dst_set(set.set)
            .dst_binding(0)
            .dst_array_element(0)
            .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
            .buffer_info(&buffer_infos);

        unsafe {
            set.ctx.device.update_descriptor_sets(&[write], &[]);
        }
        Ok(set)
    }

    /// Allocate a texture set of `textures_per_set` samplers
    ///
    /// Array slots past the end of `textures` repeat the first texture, so
    /// every element the layout declares holds a valid descriptor.
    pub(crate) fn textures(
        ctx: Arc<GpuContext>,
        layout: vk::DescriptorSetLayout,
        textures_per_set: u32,
        textures: &[TextureBinding<'_>],
    ) -> Result<Self> {
        if textures.is_empty() {
            engine_bail!("ise::vulkan", "Texture set needs at least one texture");
        }
        if textures.len() > textures_per_set as usize {
            engine_bail!(
                "ise::vulkan",
                "{} textures exceed the {} slots of the texture set",
                textures.len(),
                textures_per_set
            );
        }

        let mut image_infos = Vec::with_capacity(textures_per_set as usize);
        for binding in textures {
            image_infos.push(image_info(binding)?);
        }
        let first = image_infos[0];
        image_infos.resize(textures_per_set as usize, first);

        let set = Self::allocate(ctx, layout, textures.len() as u32)?;
        let write = vk::WriteDescriptorSet::default()
            .dst_set(set.set)
            .dst_binding(0)
            .dst_array_element(0)
            .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
            .image_info(&image_infos);

        unsafe {
            set.ctx.device.update_descriptor_sets(&[write], &[]);
        }
        Ok(set)
    }

    pub(crate) fn from_dyn(set: &dyn GraphicsDescriptorSet) -> Result<&DescriptorSet> {
        set.as_any()
            .downcast_ref::<DescriptorSet>()
            .ok_or_else(|| Error::BackendError("DescriptorSet was not created by the Vulkan backend".to_string()))
    }
}

fn image_info(binding: &TextureBinding<'_>) -> Result<vk::DescriptorImageInfo> {
    let texture = Texture::from_dyn(binding.texture)?;
    let sampler = Sampler::from_dyn(binding.sampler)?;
    Ok(vk::DescriptorImageInfo {
        sampler: sampler.sampler,
        image_view: texture.view,
        image_layout: vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
    })
}

impl GraphicsDescriptorSet for DescriptorSet {
    fn binding_count(&self) -> u32 {
        self.binding_count
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for DescriptorSet {
    fn drop(&mut self) {
        match self.ctx.descriptor_pool.lock() {
            Ok(pool) => unsafe {
                if let Err(e) = self.ctx.device.free_descriptor_sets(*pool, &[self.set]) {
                    engine_warn!("ise::vulkan", "Failed to free descriptor set: {:?}", e);
                }
            },
            Err(_) => engine_warn!("ise::vulkan", "Descriptor pool lock poisoned, descriptor set leaked"),
        }
    }
}
