/// RenderPass and Framebuffer - Vulkan implementations
///
/// Single-sample pass: [swapchain color, depth].
/// Multisampled pass: [MSAA color, MSAA depth, swapchain resolve].

use ash::vk;
use ise_engine::ise::graphics_device::{
    Extent2D, Framebuffer as GraphicsFramebuffer, FramebufferDesc, RenderPass as GraphicsRenderPass,
    RenderPassDesc, Texture as GraphicsTexture,
};
use ise_engine::ise::{Error, Result};
use ise_engine::engine_bail;
use std::any::Any;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;
use crate::vulkan_format::{format_to_vk, sample_count_to_vk, vk_status};
use crate::vulkan_swapchain::Swapchain;
use crate::vulkan_texture::Texture;

pub struct RenderPass {
    ctx: Arc<GpuContext>,
    pub(crate) render_pass: vk::RenderPass,
    desc: RenderPassDesc,
}

impl RenderPass {
    pub(crate) fn new(ctx: Arc<GpuContext>, desc: &RenderPassDesc) -> Result<Self> {
        let samples = sample_count_to_vk(desc.samples());
        let color_format = format_to_vk(desc.color_format());
        let depth_format = format_to_vk(desc.depth_format());
        let multisampled = desc.needs_color_attachment();

        let color = vk::AttachmentDescription::default()
            .format(color_format)
            .samples(samples)
            .load_op(vk::AttachmentLoadOp::CLEAR)
            .store_op(if multisampled {
                vk::AttachmentStoreOp::DONT_CARE
            } else {
                vk::AttachmentStoreOp::STORE
            })
            .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
            .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
            .initial_layout(vk::ImageLayout::UNDEFINED)
            .final_layout(if multisampled {
                vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL
            } else {
                vk::ImageLayout::PRESENT_SRC_KHR
            });

        let depth = vk::AttachmentDescription::default()
            .format(depth_format)
            .samples(samples)
            .load_op(vk::AttachmentLoadOp::CLEAR)
            .store_op(vk::AttachmentStoreOp::DONT_CARE)
            .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
            .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
            .initial_layout(vk::ImageLayout::UNDEFINED)
            .final_layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL);

        let resolve = vk::AttachmentDescription::default()
            .format(color_format)
            .samples(vk::SampleCountFlags::TYPE_1)
            .load_op(vk::AttachmentLoadOp::DONT_CARE)
            .store_op(vk::AttachmentStoreOp::STORE)
            .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
            .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
            .initial_layout(vk::ImageLayout::UNDEFINED)
            .final_layout(vk::ImageLayout::PRESENT_SRC_KHR);

        let color_refs = [vk::AttachmentReference {
            attachment: 0,
            layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
        }];
        let depth_ref = vk::AttachmentReference {
            attachment: 1,
            layout: vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
        };
        let resolve_refs = [vk::AttachmentReference {
            attachment: 2,
            layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
        }];

        let mut subpass = vk::SubpassDescription::default()
            .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
            .color_attachments(&color_refs)
            .depth_stencil_attachment(&depth_ref);
        if multisampled {
            subpass = subpass.resolve_attachments(&resolve_refs);
        }

        let dependency = vk::SubpassDependency::default()
            .src_subpass(vk::SUBPASS_EXTERNAL)
            .dst_subpass(0)
            .src_stage_mask(
                vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT | vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS,
            )
            .src_access_mask(vk::AccessFlags::empty())
            .dst_stage_mask(
                vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT | vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS,
            )
            .dst_access_mask(
                vk::AccessFlags::COLOR_ATTACHMENT_WRITE | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
            );

        let attachments: Vec<vk::AttachmentDescription> = if multisampled {
            vec![color, depth, resolve]
        } else {
            vec![color, depth]
        };
        let subpasses = [subpass];
        let dependencies = [dependency];
        let create_info = vk::RenderPassCreateInfo::default()
            .attachments(&attachments)
            .subpasses(&subpasses)
            .dependencies(&dependencies);

        let render_pass = unsafe {
            ctx.device
                .create_render_pass(&create_info, None)
                .map_err(|e| vk_status("Failed to create render pass", e))?
        };
        Ok(Self { ctx, render_pass, desc: *desc })
    }

    pub(crate) fn from_dyn(render_pass: &dyn GraphicsRenderPass) -> Result<&RenderPass> {
        render_pass
            .as_any()
            .downcast_ref::<RenderPass>()
            .ok_or_else(|| Error::BackendError("RenderPass was not created by the Vulkan backend".to_string()))
    }
}

impl GraphicsRenderPass for RenderPass {
    fn desc(&self) -> &RenderPassDesc {
        &self.desc
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for RenderPass {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_render_pass(self.render_pass, None);
        }
    }
}

/// Vulkan framebuffer over one swapchain image
pub struct Framebuffer {
    ctx: Arc<GpuContext>,
    pub(crate) framebuffer: vk::Framebuffer,
    extent: Extent2D,
}

impl Framebuffer {
    pub(crate) fn new(ctx: Arc<GpuContext>, desc: &FramebufferDesc<'_>) -> Result<Self> {
        let render_pass = RenderPass::from_dyn(desc.render_pass)?;
        let swapchain = desc
            .swapchain
            .as_any()
            .downcast_ref::<Swapchain>()
            .ok_or_else(|| Error::BackendError("Swapchain was not created by the Vulkan backend".to_string()))?;

        let swapchain_view = *swapchain
            .image_views
            .get(desc.image_index as usize)
            .ok_or_else(|| Error::InvalidResource(format!("swapchain image {} does not exist", desc.image_index)))?;
        let depth_view = texture_view(desc.depth_attachment)?;

        let attachments = match (render_pass.desc.needs_color_attachment(), desc.color_attachment) {
            (true, Some(color)) => vec![texture_view(color)?, depth_view, swapchain_view],
            (false, None) => vec![swapchain_view, depth_view],
            (true, None) => {
                engine_bail!("ise::vulkan", "Multisampled render pass needs a color attachment");
            }
            (false, Some(_)) => {
                engine_bail!("ise::vulkan", "Single-sample render pass takes no color attachment");
            }
        };

        let create_info = vk::FramebufferCreateInfo::default()
            .render_pass(render_pass.render_pass)
            .attachments(&attachments)
            .width(desc.extent.width)
            .height(desc.extent.height)
            .layers(1);

        let framebuffer = unsafe {
            ctx.device
                .create_framebuffer(&create_info, None)
                .map_err(|e| vk_status("Failed to create framebuffer", e))?
        };
        Ok(Self { ctx, framebuffer, extent: desc.extent })
    }

    pub(crate) fn from_dyn(framebuffer: &dyn GraphicsFramebuffer) -> Result<&Framebuffer> {
        framebuffer
            .as_any()
            .downcast_ref::<Framebuffer>()
            .ok_or_else(|| Error::BackendError("Framebuffer was not created by the Vulkan backend".to_string()))
    }
}

fn texture_view(texture: &dyn GraphicsTexture) -> Result<vk::ImageView> {
    Texture::from_dyn(texture).map(|texture| texture.view)
}

impl GraphicsFramebuffer for Framebuffer {
    fn extent(&self) -> Extent2D {
        self.extent
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for Framebuffer {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_framebuffer(self.framebuffer, None);
        }
    }
}
