/// Sampler - Vulkan implementation of the Sampler trait

use ash::vk;
use ise_engine::ise::graphics_device::{Sampler as GraphicsSampler, SamplerDesc};
use ise_engine::ise::{Error, Result};
use std::any::Any;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;
use crate::vulkan_format::{address_mode_to_vk, filter_to_vk, mipmap_filter_to_vk, vk_status};

pub struct Sampler {
    ctx: Arc<GpuContext>,
    pub(crate) sampler: vk::Sampler,
    desc: SamplerDesc,
}

impl Sampler {
    pub(crate) fn new(ctx: Arc<GpuContext>, desc: &SamplerDesc) -> Result<Self> {
        let address_mode = address_mode_to_vk(desc.address_mode);
        let create_info = vk::SamplerCreateInfo::default()
            .mag_filter(filter_to_vk(desc.mag_filter))
            .min_filter(filter_to_vk(desc.min_filter))
            .mipmap_mode(mipmap_filter_to_vk(desc.mipmap_filter))
            .address_mode_u(address_mode)
            .address_mode_v(address_mode)
            .address_mode_w(address_mode)
            .anisotropy_enable(desc.anisotropy.is_some())
            .max_anisotropy(desc.anisotropy.unwrap_or(1.0))
            .border_color(vk::BorderColor::INT_OPAQUE_BLACK)
            .unnormalized_coordinates(false)
            .compare_enable(false)
            .compare_op(vk::CompareOp::ALWAYS)
            .mip_lod_bias(0.0)
            .min_lod(desc.min_lod)
            .max_lod(desc.max_lod);

        let sampler = unsafe {
            ctx.device
                .create_sampler(&create_info, None)
                .map_err(|e| vk_status("Failed to create sampler", e))?
        };
        Ok(Self { ctx, sampler, desc: desc.clone() })
    }

    pub(crate) fn from_dyn(sampler: &dyn GraphicsSampler) -> Result<&Sampler> {
        sampler
            .as_any()
            .downcast_ref::<Sampler>()
            .ok_or_else(|| Error::BackendError("Sampler was not created by the Vulkan backend".to_string()))
    }
}

impl GraphicsSampler for Sampler {
    fn desc(&self) -> &SamplerDesc {
        &self.desc
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for Sampler {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_sampler(self.sampler, None);
        }
    }
}
