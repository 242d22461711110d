/// GpuContext - Vulkan objects shared by every resource of one device
///
/// Every resource keeps an `Arc<GpuContext>`, so the context (and with it
/// the allocator, device, surface and instance) is destroyed only after the
/// last buffer, texture or pipeline created from it has been dropped.

use ash::vk;
use gpu_allocator::vulkan::Allocator;
use ise_engine::ise::{Error, Result};
use ise_engine::{engine_debug, engine_warn};
use std::mem::ManuallyDrop;
use std::sync::{Mutex, MutexGuard};

use crate::vulkan_format::vk_status;

pub struct GpuContext {
    /// Loader entry points; must outlive the instance
    pub(crate) _entry: ash::Entry,
    pub(crate) instance: ash::Instance,
    pub(crate) physical_device: vk::PhysicalDevice,
    pub(crate) device: ash::Device,

    pub(crate) surface: vk::SurfaceKHR,
    pub(crate) surface_loader: ash::khr::surface::Instance,
    pub(crate) swapchain_loader: ash::khr::swapchain::Device,

    /// Dropped by hand before the device is destroyed
    pub(crate) allocator: ManuallyDrop<Mutex<Allocator>>,

    pub(crate) graphics_queue: vk::Queue,
    pub(crate) graphics_queue_family: u32,
    pub(crate) present_queue: vk::Queue,
    pub(crate) present_queue_family: u32,
    /// Serializes queue submission and presentation
    queue_lock: Mutex<()>,

    /// Transient pool for one-shot upload and copy commands
    pub(crate) upload_command_pool: Mutex<vk::CommandPool>,
    /// Pool every descriptor set is allocated from (sets are freed individually)
    pub(crate) descriptor_pool: Mutex<vk::DescriptorPool>,

    pub(crate) debug_utils_loader: Option<ash::ext::debug_utils::Instance>,
    pub(crate) debug_messenger: Option<vk::DebugUtilsMessengerEXT>,
}

/// Objects created during device setup, before the context exists
pub(crate) struct GpuContextParts {
    pub entry: ash::Entry,
    pub instance: ash::Instance,
    pub physical_device: vk::PhysicalDevice,
    pub device: ash::Device,
    pub surface: vk::SurfaceKHR,
    pub surface_loader: ash::khr::surface::Instance,
    pub allocator: Allocator,
    pub graphics_queue: vk::Queue,
    pub graphics_queue_family: u32,
    pub present_queue: vk::Queue,
    pub present_queue_family: u32,
    pub upload_command_pool: vk::CommandPool,
    pub descriptor_pool: vk::DescriptorPool,
    pub debug_utils_loader: Option<ash::ext::debug_utils::Instance>,
    pub debug_messenger: Option<vk::DebugUtilsMessengerEXT>,
}

impl GpuContext {
    pub(crate) fn new(parts: GpuContextParts) -> Self {
        let swapchain_loader = ash::khr::swapchain::Device::new(&parts.instance, &parts.device);
        Self {
            _entry: parts.entry,
            instance: parts.instance,
            physical_device: parts.physical_device,
            device: parts.device,
            surface: parts.surface,
            surface_loader: parts.surface_loader,
            swapchain_loader,
            allocator: ManuallyDrop::new(Mutex::new(parts.allocator)),
            graphics_queue: parts.graphics_queue,
            graphics_queue_family: parts.graphics_queue_family,
            present_queue: parts.present_queue,
            present_queue_family: parts.present_queue_family,
            queue_lock: Mutex::new(()),
            upload_command_pool: Mutex::new(parts.upload_command_pool),
            descriptor_pool: Mutex::new(parts.descriptor_pool),
            debug_utils_loader: parts.debug_utils_loader,
            debug_messenger: parts.debug_messenger,
        }
    }

    pub(crate) fn allocator(&self) -> Result<MutexGuard<'_, Allocator>> {
        self.allocator
            .lock()
            .map_err(|_| Error::BackendError("GPU allocator lock poisoned".to_string()))
    }

    pub(crate) fn lock_queue(&self) -> MutexGuard<'_, ()> {
        match self.queue_lock.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Record commands into a temporary command buffer, submit them on the
    /// graphics queue and block until they have executed
    pub(crate) fn submit_one_shot<F>(&self, record: F) -> Result<()>
    where
        F: FnOnce(vk::CommandBuffer),
    {
        let pool = self
            .upload_command_pool
            .lock()
            .map_err(|_| Error::BackendError("upload command pool lock poisoned".to_string()))?;

        unsafe {
            let alloc_info = vk::CommandBufferAllocateInfo::default()
                .command_pool(*pool)
                .level(vk::CommandBufferLevel::PRIMARY)
                .command_buffer_count(1);
            let command_buffer = self
                .device
                .allocate_command_buffers(&alloc_info)
                .map_err(|e| vk_status("Failed to allocate upload command buffer", e))?[0];

            let result = self.record_and_wait(command_buffer, record);
            self.device.free_command_buffers(*pool, &[command_buffer]);
            result
        }
    }

    unsafe fn record_and_wait<F>(&self, command_buffer: vk::CommandBuffer, record: F) -> Result<()>
    where
        F: FnOnce(vk::CommandBuffer),
    {
        let begin_info = vk::CommandBufferBeginInfo::default()
            .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
        self.device
            .begin_command_buffer(command_buffer, &begin_info)
            .map_err(|e| vk_status("Failed to begin upload command buffer", e))?;

        record(command_buffer);

        self.device
            .end_command_buffer(command_buffer)
            .map_err(|e| vk_status("Failed to end upload command buffer", e))?;

        let fence = self
            .device
            .create_fence(&vk::FenceCreateInfo::default(), None)
            .map_err(|e| vk_status("Failed to create upload fence", e))?;

        let command_buffers = [command_buffer];
        let submit_info = vk::SubmitInfo::default().command_buffers(&command_buffers);
        let submitted = {
            let _queue = self.lock_queue();
            self.device.queue_submit(self.graphics_queue, &[submit_info], fence)
        };
        let result = submitted
            .map_err(|e| vk_status("Failed to submit upload commands", e))
            .and_then(|_| {
                self.device
                    .wait_for_fences(&[fence], true, u64::MAX)
                    .map_err(|e| vk_status("Failed to wait for upload fence", e))
            });

        self.device.destroy_fence(fence, None);
        result
    }
}

impl Drop for GpuContext {
    fn drop(&mut self) {
        unsafe {
            if let Err(e) = self.device.device_wait_idle() {
                engine_warn!("ise::vulkan", "device_wait_idle failed during teardown: {:?}", e);
            }

            if let Ok(pool) = self.descriptor_pool.get_mut() {
                self.device.destroy_descriptor_pool(*pool, None);
            }
            if let Ok(pool) = self.upload_command_pool.get_mut() {
                self.device.destroy_command_pool(*pool, None);
            }

            // Allocator frees its memory blocks through the device
            ManuallyDrop::drop(&mut self.allocator);

            if let (Some(debug_utils), Some(messenger)) = (&self.debug_utils_loader, self.debug_messenger) {
                debug_utils.destroy_debug_utils_messenger(messenger, None);
            }

            self.device.destroy_device(None);
            self.surface_loader.destroy_surface(self.surface, None);
            self.instance.destroy_instance(None);
        }
        engine_debug!("ise::vulkan", "Vulkan device, surface and instance destroyed");
    }
}
