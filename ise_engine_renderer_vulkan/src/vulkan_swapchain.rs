/// Swapchain - Vulkan implementation of the Swapchain trait
///
/// Out-of-date and suboptimal results from acquire and present are reported
/// as values; only real failures become errors.

use ash::vk;
use ise_engine::ise::graphics_device::{
    AcquireResult, Extent2D, FrameSync as GraphicsFrameSync, PresentResult, Swapchain as GraphicsSwapchain,
    SwapchainDesc, TextureFormat,
};
use ise_engine::ise::Result;
use ise_engine::{engine_debug, engine_trace};
use std::any::Any;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;
use crate::vulkan_format::{color_space_to_vk, format_to_vk, present_mode_to_vk, vk_status};
use crate::vulkan_frame_sync::FrameSync;

pub struct Swapchain {
    ctx: Arc<GpuContext>,
    swapchain: vk::SwapchainKHR,
    images: Vec<vk::Image>,
    pub(crate) image_views: Vec<vk::ImageView>,
    format: TextureFormat,
    extent: Extent2D,
}

impl Swapchain {
    pub(crate) fn new(ctx: Arc<GpuContext>, desc: &SwapchainDesc) -> Result<Self> {
        let mut swapchain = Self {
            ctx,
            swapchain: vk::SwapchainKHR::null(),
            images: Vec::new(),
            image_views: Vec::new(),
            format: desc.surface_format.format,
            extent: desc.extent,
        };
        swapchain.build(desc)?;
        Ok(swapchain)
    }

    /// Create the swapchain (handing over the current one) and its views
    fn build(&mut self, desc: &SwapchainDesc) -> Result<()> {
        let ctx = Arc::clone(&self.ctx);
        let old_swapchain = self.swapchain;

        unsafe {
            let capabilities = ctx
                .surface_loader
                .get_physical_device_surface_capabilities(ctx.physical_device, ctx.surface)
                .map_err(|e| vk_status("Failed to get surface capabilities", e))?;

            let queue_families = [ctx.graphics_queue_family, ctx.present_queue_family];
            let concurrent = queue_families[0] != queue_families[1];

            let mut create_info = vk::SwapchainCreateInfoKHR::default()
                .surface(ctx.surface)
                .min_image_count(desc.image_count)
                .image_format(format_to_vk(desc.surface_format.format))
                .image_color_space(color_space_to_vk(desc.surface_format.color_space))
                .image_extent(vk::Extent2D { width: desc.extent.width, height: desc.extent.height })
                .image_array_layers(1)
                .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
                .pre_transform(capabilities.current_transform)
                .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
                .present_mode(present_mode_to_vk(desc.present_mode))
                .clipped(true)
                .old_swapchain(old_swapchain);
            create_info = if concurrent {
                create_info
                    .image_sharing_mode(vk::SharingMode::CONCURRENT)
                    .queue_family_indices(&queue_families)
            } else {
                create_info.image_sharing_mode(vk::SharingMode::EXCLUSIVE)
            };

            let swapchain = ctx
                .swapchain_loader
                .create_swapchain(&create_info, None)
                .map_err(|e| vk_status("Failed to create swapchain", e))?;

            // The old swapchain and its views are retired once the new one exists
            self.destroy_views();
            if old_swapchain != vk::SwapchainKHR::null() {
                ctx.swapchain_loader.destroy_swapchain(old_swapchain, None);
            }
            self.swapchain = swapchain;
            self.format = desc.surface_format.format;
            self.extent = desc.extent;

            self.images = ctx
                .swapchain_loader
                .get_swapchain_images(swapchain)
                .map_err(|e| vk_status("Failed to get swapchain images", e))?;

            for &image in &self.images {
                let view_info = vk::ImageViewCreateInfo::default()
                    .image(image)
                    .view_type(vk::ImageViewType::TYPE_2D)
                    .format(format_to_vk(desc.surface_format.format))
                    .subresource_range(vk::ImageSubresourceRange {
                        aspect_mask: vk::ImageAspectFlags::COLOR,
                        base_mip_level: 0,
                        level_count: 1,
                        base_array_layer: 0,
                        layer_count: 1,
                    });
                let view = ctx
                    .device
                    .create_image_view(&view_info, None)
                    .map_err(|e| vk_status("Failed to create swapchain image view", e))?;
                self.image_views.push(view);
            }
        }

        engine_debug!(
            "ise::vulkan",
            "Swapchain built: {}x{}, {} images, {:?}",
            desc.extent.width,
            desc.extent.height,
            self.images.len(),
            desc.present_mode
        );
        Ok(())
    }

    fn destroy_views(&mut self) {
        unsafe {
            for view in self.image_views.drain(..) {
                self.ctx.device.destroy_image_view(view, None);
            }
        }
        self.images.clear();
    }
}

impl GraphicsSwapchain for Swapchain {
    fn acquire_next_image(&mut self, sync: &dyn GraphicsFrameSync) -> Result<AcquireResult> {
        let sync = FrameSync::from_dyn(sync)?;
        let acquired = unsafe {
            self.ctx.swapchain_loader.acquire_next_image(
                self.swapchain,
                u64::MAX,
                sync.image_available,
                vk::Fence::null(),
            )
        };

        match acquired {
            Ok((image_index, suboptimal)) => Ok(AcquireResult::Acquired { image_index, suboptimal }),
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => {
                engine_trace!("ise::vulkan", "Swapchain out of date during acquire");
                Ok(AcquireResult::OutOfDate)
            }
            Err(e) => Err(vk_status("Failed to acquire swapchain image", e)),
        }
    }

    fn present(&mut self, sync: &dyn GraphicsFrameSync, image_index: u32) -> Result<PresentResult> {
        let sync = FrameSync::from_dyn(sync)?;
        let wait_semaphores = [sync.render_finished];
        let swapchains = [self.swapchain];
        let image_indices = [image_index];
        let present_info = vk::PresentInfoKHR::default()
            .wait_semaphores(&wait_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);

        let presented = {
            let _queue = self.ctx.lock_queue();
            unsafe { self.ctx.swapchain_loader.queue_present(self.ctx.present_queue, &present_info) }
        };

        match presented {
            Ok(false) => Ok(PresentResult::Presented),
            Ok(true) | Err(vk::Result::SUBOPTIMAL_KHR) => Ok(PresentResult::Suboptimal),
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(PresentResult::OutOfDate),
            Err(e) => Err(vk_status("Failed to present swapchain image", e)),
        }
    }

    fn recreate(&mut self, desc: &SwapchainDesc) -> Result<()> {
        self.build(desc)
    }

    fn image_count(&self) -> usize {
        self.image_views.len()
    }

    fn extent(&self) -> Extent2D {
        self.extent
    }

    fn format(&self) -> TextureFormat {
        self.format
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for Swapchain {
    fn drop(&mut self) {
        self.destroy_views();
        unsafe {
            if self.swapchain != vk::SwapchainKHR::null() {
                self.ctx.swapchain_loader.destroy_swapchain(self.swapchain, None);
            }
        }
    }
}
