/// FrameSync - semaphores and fence of one frame slot

use ash::vk;
use ise_engine::ise::graphics_device::FrameSync as GraphicsFrameSync;
use ise_engine::ise::{Error, Result};
use std::any::Any;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;
use crate::vulkan_format::vk_status;

pub struct FrameSync {
    ctx: Arc<GpuContext>,
    /// Signaled by acquire, waited on by submit
    pub(crate) image_available: vk::Semaphore,
    /// Signaled by submit, waited on by present
    pub(crate) render_finished: vk::Semaphore,
    /// Signaled when the slot's submission completes
    pub(crate) in_flight: vk::Fence,
}

impl FrameSync {
    pub(crate) fn new(ctx: Arc<GpuContext>) -> Result<Self> {
        let mut sync = Self {
            ctx,
            image_available: vk::Semaphore::null(),
            render_finished: vk::Semaphore::null(),
            in_flight: vk::Fence::null(),
        };

        unsafe {
            let semaphore_info = vk::SemaphoreCreateInfo::default();
            sync.image_available = sync
                .ctx
                .device
                .create_semaphore(&semaphore_info, None)
                .map_err(|e| vk_status("Failed to create image-available semaphore", e))?;
            sync.render_finished = sync
                .ctx
                .device
                .create_semaphore(&semaphore_info, None)
                .map_err(|e| vk_status("Failed to create render-finished semaphore", e))?;

            // Signaled so the first wait on a fresh slot returns immediately
            let fence_info = vk::FenceCreateInfo::default().flags(vk::FenceCreateFlags::SIGNALED);
            sync.in_flight = sync
                .ctx
                .device
                .create_fence(&fence_info, None)
                .map_err(|e| vk_status("Failed to create in-flight fence", e))?;
        }
        Ok(sync)
    }

    /// Downcast an engine frame sync created by this backend
    pub(crate) fn from_dyn(sync: &dyn GraphicsFrameSync) -> Result<&FrameSync> {
        sync.as_any()
            .downcast_ref::<FrameSync>()
            .ok_or_else(|| Error::BackendError("FrameSync was not created by the Vulkan backend".to_string()))
    }
}

impl GraphicsFrameSync for FrameSync {
    fn wait(&self) -> Result<()> {
        unsafe {
            self.ctx
                .device
                .wait_for_fences(&[self.in_flight], true, u64::MAX)
                .map_err(|e| vk_status("Failed to wait for in-flight fence", e))
        }
    }

    fn reset(&self) -> Result<()> {
        unsafe {
            self.ctx
                .device
                .reset_fences(&[self.in_flight])
                .map_err(|e| vk_status("Failed to reset in-flight fence", e))
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for FrameSync {
    fn drop(&mut self) {
        unsafe {
            let device = &self.ctx.device;
            if self.in_flight != vk::Fence::null() {
                device.destroy_fence(self.in_flight, None);
            }
            if self.render_finished != vk::Semaphore::null() {
                device.destroy_semaphore(self.render_finished, None);
            }
            if self.image_available != vk::Semaphore::null() {
                device.destroy_semaphore(self.image_available, None);
            }
        }
    }
}
