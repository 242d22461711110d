/// VulkanGraphicsDevice - Vulkan implementation of the GraphicsDevice trait
///
/// Creation walks the usual chain: instance (with validation when asked
/// for), debug messenger, window surface, physical device, logical device,
/// allocator and pools. Everything after that lives in the shared
/// `GpuContext`, which every created resource keeps alive.

use ash::vk;
use gpu_allocator::vulkan::{Allocator, AllocatorCreateDesc};
use ise_engine::ise::graphics_device::{
    Buffer as GraphicsBuffer, BufferDesc, CommandList as GraphicsCommandList, DescriptorSet as GraphicsDescriptorSet,
    DeviceFactory, DeviceLimits, Extent2D, Framebuffer as GraphicsFramebuffer, FramebufferDesc,
    FrameSync as GraphicsFrameSync, GraphicsDevice, Pipeline as GraphicsPipeline, PipelineDesc,
    RenderPass as GraphicsRenderPass, RenderPassDesc, Sampler as GraphicsSampler, SamplerDesc,
    Shader as GraphicsShader, ShaderDesc, SurfaceCapabilities, SurfaceFormat, SurfaceSupport, Swapchain as GraphicsSwapchain,
    SwapchainDesc, Texture as GraphicsTexture, TextureBinding, TextureDesc, TextureFormat, TEXTURE_SET_INDEX,
    UNIFORM_SET_INDEX,
};
use ise_engine::ise::{Error, RendererConfig, Result};
use ise_engine::{engine_bail, engine_debug, engine_error, engine_info, engine_warn};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use std::ffi::{CStr, CString};
use std::sync::Arc;
use winit::window::Window;

use crate::vulkan_buffer::Buffer;
use crate::vulkan_command_list::CommandList;
use crate::vulkan_context::{GpuContext, GpuContextParts};
use crate::vulkan_debug::messenger_create_info;
use crate::vulkan_descriptor_set::DescriptorSet;
use crate::vulkan_format::{color_space_from_vk, format_from_vk, format_to_vk, present_mode_from_vk, vk_status};
use crate::vulkan_frame_sync::FrameSync;
use crate::vulkan_pipeline::Pipeline;
use crate::vulkan_render_pass::{Framebuffer, RenderPass};
use crate::vulkan_sampler::Sampler;
use crate::vulkan_shader::Shader;
use crate::vulkan_swapchain::Swapchain;
use crate::vulkan_texture::Texture;

const VALIDATION_LAYER: &CStr = c"VK_LAYER_KHRONOS_validation";

/// Depth formats probed at startup, in order of preference
const DEPTH_FORMAT_CANDIDATES: [TextureFormat; 3] = [
    TextureFormat::D32_FLOAT,
    TextureFormat::D32_FLOAT_S8_UINT,
    TextureFormat::D24_UNORM_S8_UINT,
];

const DESCRIPTOR_POOL_MAX_SETS: u32 = 1024;
const DESCRIPTOR_POOL_MAX_SAMPLERS: u32 = 16 * 1024;

/// Vulkan graphics device bound to one window
pub struct VulkanGraphicsDevice {
    ctx: Arc<GpuContext>,
    window: Arc<Window>,
    limits: DeviceLimits,
}

/// Build a device factory for `window`
///
/// Each call of the factory creates a fresh Vulkan device for the same
/// window. To move rendering to another window, hand the renderer a new
/// factory.
pub fn vulkan_device_factory(window: Arc<Window>) -> DeviceFactory {
    Box::new(move |config: &RendererConfig| {
        let device = VulkanGraphicsDevice::new(Arc::clone(&window), config)?;
        Ok(Box::new(device) as Box<dyn GraphicsDevice>)
    })
}

/// Instance-level objects created before the logical device
///
/// Destroys whatever it holds unless `disarm` was called, so an early
/// return during setup leaks nothing.
struct InstanceObjects {
    entry: ash::Entry,
    instance: ash::Instance,
    surface_loader: ash::khr::surface::Instance,
    surface: vk::SurfaceKHR,
    debug_utils_loader: Option<ash::ext::debug_utils::Instance>,
    debug_messenger: Option<vk::DebugUtilsMessengerEXT>,
    armed: bool,
}

impl InstanceObjects {
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for InstanceObjects {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        unsafe {
            if self.surface != vk::SurfaceKHR::null() {
                self.surface_loader.destroy_surface(self.surface, None);
            }
            if let (Some(debug_utils), Some(messenger)) = (&self.debug_utils_loader, self.debug_messenger) {
                debug_utils.destroy_debug_utils_messenger(messenger, None);
            }
            self.instance.destroy_instance(None);
        }
    }
}

/// Physical device chosen for rendering
struct SelectedDevice {
    physical_device: vk::PhysicalDevice,
    graphics_queue_family: u32,
    present_queue_family: u32,
    name: String,
}

impl VulkanGraphicsDevice {
    /// Create a Vulkan device presenting to `window`
    pub fn new(window: Arc<Window>, config: &RendererConfig) -> Result<Self> {
        let entry = unsafe { ash::Entry::load() }.map_err(|e| {
            engine_error!("ise::vulkan", "Failed to load Vulkan library: {:?}", e);
            Error::InitializationFailed(format!("Failed to load Vulkan library: {:?}", e))
        })?;

        let mut objects = Self::create_instance(entry, &window, config)?;
        let selected = Self::select_physical_device(&objects)?;
        engine_info!("ise::vulkan", "Using GPU: {}", selected.name);

        let device = Self::create_logical_device(&objects.instance, &selected)?;
        let (allocator, upload_command_pool, descriptor_pool) =
            match Self::create_device_resources(&objects.instance, &device, &selected) {
                Ok(resources) => resources,
                Err(e) => {
                    unsafe { device.destroy_device(None) };
                    return Err(e);
                }
            };

        let limits = Self::query_limits(&objects.instance, selected.physical_device);
        let (graphics_queue, present_queue) = unsafe {
            (
                device.get_device_queue(selected.graphics_queue_family, 0),
                device.get_device_queue(selected.present_queue_family, 0),
            )
        };

        // From here on the context owns (and destroys) the instance objects
        objects.disarm();
        let ctx = Arc::new(GpuContext::new(GpuContextParts {
            entry: objects.entry.clone(),
            instance: objects.instance.clone(),
            physical_device: selected.physical_device,
            device,
            surface: objects.surface,
            surface_loader: objects.surface_loader.clone(),
            allocator,
            graphics_queue,
            graphics_queue_family: selected.graphics_queue_family,
            present_queue,
            present_queue_family: selected.present_queue_family,
            upload_command_pool,
            descriptor_pool,
            debug_utils_loader: objects.debug_utils_loader.clone(),
            debug_messenger: objects.debug_messenger,
        }));

        engine_debug!(
            "ise::vulkan",
            "Vulkan device ready (graphics family {}, present family {}, max {} samples)",
            selected.graphics_queue_family,
            selected.present_queue_family,
            limits.max_usable_sample_count()
        );
        Ok(Self { ctx, window, limits })
    }

    fn create_instance(entry: ash::Entry, window: &Window, config: &RendererConfig) -> Result<InstanceObjects> {
        let display_handle = window.display_handle().map_err(|e| {
            engine_error!("ise::vulkan", "Failed to get display handle: {}", e);
            Error::InitializationFailed(format!("Failed to get display handle: {}", e))
        })?;
        let window_handle = window.window_handle().map_err(|e| {
            engine_error!("ise::vulkan", "Failed to get window handle: {}", e);
            Error::InitializationFailed(format!("Failed to get window handle: {}", e))
        })?;

        let mut validation = config.enable_validation || cfg!(feature = "vulkan-validation");
        if validation && !Self::validation_layer_available(&entry) {
            engine_warn!("ise::vulkan", "Validation requested but VK_LAYER_KHRONOS_validation is not installed");
            validation = false;
        }

        let app_name = CString::new(config.app_name.as_str())
            .map_err(|_| Error::InitializationFailed(format!("invalid application name {:?}", config.app_name)))?;
        let app_info = vk::ApplicationInfo::default()
            .application_name(&app_name)
            .application_version(vk::make_api_version(0, 1, 0, 0))
            .engine_name(c"ISE")
            .engine_version(vk::make_api_version(0, 0, 1, 0))
            .api_version(vk::API_VERSION_1_0);

        let mut extension_names = ash_window::enumerate_required_extensions(display_handle.as_raw())
            .map_err(|e| vk_status("Failed to get required surface extensions", e))?
            .to_vec();
        let layer_names = if validation {
            extension_names.push(ash::ext::debug_utils::NAME.as_ptr());
            vec![VALIDATION_LAYER.as_ptr()]
        } else {
            vec![]
        };

        let create_info = vk::InstanceCreateInfo::default()
            .application_info(&app_info)
            .enabled_layer_names(&layer_names)
            .enabled_extension_names(&extension_names);

        let instance = unsafe {
            entry
                .create_instance(&create_info, None)
                .map_err(|e| vk_status("Failed to create Vulkan instance", e))?
        };
        let surface_loader = ash::khr::surface::Instance::new(&entry, &instance);

        let mut objects = InstanceObjects {
            entry,
            instance,
            surface_loader,
            surface: vk::SurfaceKHR::null(),
            debug_utils_loader: None,
            debug_messenger: None,
            armed: true,
        };

        if validation {
            let debug_utils = ash::ext::debug_utils::Instance::new(&objects.entry, &objects.instance);
            let messenger = unsafe {
                debug_utils
                    .create_debug_utils_messenger(&messenger_create_info(), None)
                    .map_err(|e| vk_status("Failed to create debug messenger", e))?
            };
            objects.debug_utils_loader = Some(debug_utils);
            objects.debug_messenger = Some(messenger);
            engine_debug!("ise::vulkan", "Validation layers enabled");
        }

        objects.surface = unsafe {
            ash_window::create_surface(
                &objects.entry,
                &objects.instance,
                display_handle.as_raw(),
                window_handle.as_raw(),
                None,
            )
            .map_err(|e| vk_status("Failed to create window surface", e))?
        };

        Ok(objects)
    }

    fn validation_layer_available(entry: &ash::Entry) -> bool {
        let layers = match unsafe { entry.enumerate_instance_layer_properties() } {
            Ok(layers) => layers,
            Err(_) => return false,
        };
        layers
            .iter()
            .any(|layer| layer.layer_name_as_c_str().map_or(false, |name| name == VALIDATION_LAYER))
    }

    /// Pick a GPU that can render and present to the surface
    ///
    /// Discrete GPUs win over integrated ones, which win over the rest.
    fn select_physical_device(objects: &InstanceObjects) -> Result<SelectedDevice> {
        let physical_devices = unsafe {
            objects
                .instance
                .enumerate_physical_devices()
                .map_err(|e| vk_status("Failed to enumerate physical devices", e))?
        };

        let mut best: Option<(u32, SelectedDevice)> = None;
        for physical_device in physical_devices {
            let Some(candidate) = Self::evaluate_physical_device(objects, physical_device) else {
                continue;
            };
            let properties = unsafe { objects.instance.get_physical_device_properties(physical_device) };
            let score = match properties.device_type {
                vk::PhysicalDeviceType::DISCRETE_GPU => 3,
                vk::PhysicalDeviceType::INTEGRATED_GPU => 2,
                vk::PhysicalDeviceType::VIRTUAL_GPU => 1,
                _ => 0,
            };
            if best.as_ref().map_or(true, |(best_score, _)| score > *best_score) {
                best = Some((score, candidate));
            }
        }

        best.map(|(_, selected)| selected).ok_or_else(|| {
            engine_error!("ise::vulkan", "No GPU supports rendering to this window");
            Error::InitializationFailed("No suitable GPU found".to_string())
        })
    }

    fn evaluate_physical_device(objects: &InstanceObjects, physical_device: vk::PhysicalDevice) -> Option<SelectedDevice> {
        unsafe {
            let instance = &objects.instance;
            let properties = instance.get_physical_device_properties(physical_device);
            let name = properties
                .device_name_as_c_str()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|_| "Unknown GPU".to_string());

            let features = instance.get_physical_device_features(physical_device);
            if features.sampler_anisotropy == vk::FALSE {
                engine_debug!("ise::vulkan", "Skipping {}: no sampler anisotropy", name);
                return None;
            }

            let extensions = instance.enumerate_device_extension_properties(physical_device).ok()?;
            let has_swapchain = extensions
                .iter()
                .any(|ext| ext.extension_name_as_c_str().map_or(false, |ext| ext == ash::khr::swapchain::NAME));
            if !has_swapchain {
                engine_debug!("ise::vulkan", "Skipping {}: no swapchain extension", name);
                return None;
            }

            let families = instance.get_physical_device_queue_family_properties(physical_device);
            let graphics_queue_family = families
                .iter()
                .position(|family| family.queue_flags.contains(vk::QueueFlags::GRAPHICS))? as u32;
            let supports_present = |index: u32| {
                objects
                    .surface_loader
                    .get_physical_device_surface_support(physical_device, index, objects.surface)
                    .unwrap_or(false)
            };
            // Prefer a family that does both
            let present_queue_family = if supports_present(graphics_queue_family) {
                graphics_queue_family
            } else {
                (0..families.len() as u32).find(|&index| supports_present(index))?
            };

            let formats = objects
                .surface_loader
                .get_physical_device_surface_formats(physical_device, objects.surface)
                .unwrap_or_default();
            let present_modes = objects
                .surface_loader
                .get_physical_device_surface_present_modes(physical_device, objects.surface)
                .unwrap_or_default();
            if formats.is_empty() || present_modes.is_empty() {
                engine_debug!("ise::vulkan", "Skipping {}: surface has no formats or present modes", name);
                return None;
            }

            Some(SelectedDevice { physical_device, graphics_queue_family, present_queue_family, name })
        }
    }

    fn create_logical_device(instance: &ash::Instance, selected: &SelectedDevice) -> Result<ash::Device> {
        let queue_priorities = [1.0];
        let mut queue_create_infos = vec![vk::DeviceQueueCreateInfo::default()
            .queue_family_index(selected.graphics_queue_family)
            .queue_priorities(&queue_priorities)];
        if selected.present_queue_family != selected.graphics_queue_family {
            queue_create_infos.push(
                vk::DeviceQueueCreateInfo::default()
                    .queue_family_index(selected.present_queue_family)
                    .queue_priorities(&queue_priorities),
            );
        }

        let extension_names = [ash::khr::swapchain::NAME.as_ptr()];
        let features = vk::PhysicalDeviceFeatures::default().sampler_anisotropy(true);
        let create_info = vk::DeviceCreateInfo::default()
            .queue_create_infos(&queue_create_infos)
            .enabled_extension_names(&extension_names)
            .enabled_features(&features);

        unsafe {
            instance
                .create_device(selected.physical_device, &create_info, None)
                .map_err(|e| vk_status("Failed to create logical device", e))
        }
    }

    fn create_device_resources(
        instance: &ash::Instance,
        device: &ash::Device,
        selected: &SelectedDevice,
    ) -> Result<(Allocator, vk::CommandPool, vk::DescriptorPool)> {
        let allocator = Allocator::new(&AllocatorCreateDesc {
            instance: instance.clone(),
            device: device.clone(),
            physical_device: selected.physical_device,
            debug_settings: Default::default(),
            buffer_device_address: false,
            allocation_sizes: Default::default(),
        })
        .map_err(|e| {
            engine_error!("ise::vulkan", "Failed to create GPU allocator: {:?}", e);
            Error::InitializationFailed(format!("Failed to create GPU allocator: {:?}", e))
        })?;

        unsafe {
            let pool_info = vk::CommandPoolCreateInfo::default()
                .queue_family_index(selected.graphics_queue_family)
                .flags(vk::CommandPoolCreateFlags::TRANSIENT | vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);
            let upload_command_pool = device
                .create_command_pool(&pool_info, None)
                .map_err(|e| vk_status("Failed to create upload command pool", e))?;

            let pool_sizes = [
                vk::DescriptorPoolSize {
                    ty: vk::DescriptorType::UNIFORM_BUFFER,
                    descriptor_count: DESCRIPTOR_POOL_MAX_SETS,
                },
                vk::DescriptorPoolSize {
                    ty: vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
                    descriptor_count: DESCRIPTOR_POOL_MAX_SAMPLERS,
                },
            ];
            let descriptor_pool_info = vk::DescriptorPoolCreateInfo::default()
                .flags(vk::DescriptorPoolCreateFlags::FREE_DESCRIPTOR_SET)
                .pool_sizes(&pool_sizes)
                .max_sets(DESCRIPTOR_POOL_MAX_SETS);
            let descriptor_pool = match device.create_descriptor_pool(&descriptor_pool_info, None) {
                Ok(pool) => pool,
                Err(e) => {
                    device.destroy_command_pool(upload_command_pool, None);
                    return Err(vk_status("Failed to create descriptor pool", e));
                }
            };

            Ok((allocator, upload_command_pool, descriptor_pool))
        }
    }

    fn query_limits(instance: &ash::Instance, physical_device: vk::PhysicalDevice) -> DeviceLimits {
        let properties = unsafe { instance.get_physical_device_properties(physical_device) };
        let limits = properties.limits;

        let supported_depth_formats = DEPTH_FORMAT_CANDIDATES
            .iter()
            .copied()
            .filter(|&format| {
                let format_properties =
                    unsafe { instance.get_physical_device_format_properties(physical_device, format_to_vk(format)) };
                format_properties
                    .optimal_tiling_features
                    .contains(vk::FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT)
            })
            .collect();

        DeviceLimits {
            max_sampler_anisotropy: limits.max_sampler_anisotropy,
            max_per_stage_descriptor_samplers: limits.max_per_stage_descriptor_samplers,
            framebuffer_color_sample_counts: limits.framebuffer_color_sample_counts.as_raw(),
            framebuffer_depth_sample_counts: limits.framebuffer_depth_sample_counts.as_raw(),
            supported_depth_formats,
        }
    }

    /// Window this device presents to
    pub fn window(&self) -> &Arc<Window> {
        &self.window
    }
}

impl GraphicsDevice for VulkanGraphicsDevice {
    fn limits(&self) -> &DeviceLimits {
        &self.limits
    }

    fn drawable_extent(&self) -> Extent2D {
        let size = self.window.inner_size();
        Extent2D::new(size.width, size.height)
    }

    fn surface_support(&self) -> Result<SurfaceSupport> {
        let ctx = &self.ctx;
        unsafe {
            let caps = ctx
                .surface_loader
                .get_physical_device_surface_capabilities(ctx.physical_device, ctx.surface)
                .map_err(|e| vk_status("Failed to get surface capabilities", e))?;
            let vk_formats = ctx
                .surface_loader
                .get_physical_device_surface_formats(ctx.physical_device, ctx.surface)
                .map_err(|e| vk_status("Failed to get surface formats", e))?;
            let vk_modes = ctx
                .surface_loader
                .get_physical_device_surface_present_modes(ctx.physical_device, ctx.surface)
                .map_err(|e| vk_status("Failed to get surface present modes", e))?;

            // Formats the engine has no name for are left out
            let formats = vk_formats
                .iter()
                .filter_map(|surface_format| {
                    format_from_vk(surface_format.format).map(|format| SurfaceFormat {
                        format,
                        color_space: color_space_from_vk(surface_format.color_space),
                    })
                })
                .collect();
            let present_modes = vk_modes.iter().filter_map(|&mode| present_mode_from_vk(mode)).collect();

            Ok(SurfaceSupport {
                capabilities: SurfaceCapabilities {
                    min_image_count: caps.min_image_count,
                    max_image_count: caps.max_image_count,
                    current_extent: Extent2D::new(caps.current_extent.width, caps.current_extent.height),
                    min_extent: Extent2D::new(caps.min_image_extent.width, caps.min_image_extent.height),
                    max_extent: Extent2D::new(caps.max_image_extent.width, caps.max_image_extent.height),
                },
                formats,
                present_modes,
            })
        }
    }

    fn create_swapchain(&mut self, desc: &SwapchainDesc) -> Result<Box<dyn GraphicsSwapchain>> {
        Ok(Box::new(Swapchain::new(Arc::clone(&self.ctx), desc)?))
    }

    fn create_render_pass(&mut self, desc: &RenderPassDesc) -> Result<Arc<dyn GraphicsRenderPass>> {
        Ok(Arc::new(RenderPass::new(Arc::clone(&self.ctx), desc)?))
    }

    fn create_framebuffer(&mut self, desc: &FramebufferDesc) -> Result<Arc<dyn GraphicsFramebuffer>> {
        Ok(Arc::new(Framebuffer::new(Arc::clone(&self.ctx), desc)?))
    }

    fn create_texture(&mut self, desc: &TextureDesc) -> Result<Arc<dyn GraphicsTexture>> {
        Ok(Arc::new(Texture::new(Arc::clone(&self.ctx), desc)?))
    }

    fn create_sampler(&mut self, desc: &SamplerDesc) -> Result<Arc<dyn GraphicsSampler>> {
        Ok(Arc::new(Sampler::new(Arc::clone(&self.ctx), desc)?))
    }

    fn create_buffer(&mut self, desc: &BufferDesc) -> Result<Arc<dyn GraphicsBuffer>> {
        Ok(Arc::new(Buffer::new(Arc::clone(&self.ctx), desc)?))
    }

    fn copy_buffer(&mut self, src: &dyn GraphicsBuffer, dst: &dyn GraphicsBuffer, size: u64) -> Result<()> {
        if size > src.size() || size > dst.size() {
            engine_bail!(
                "ise::vulkan",
                "Buffer copy of {} bytes exceeds source ({}) or destination ({})",
                size,
                src.size(),
                dst.size()
            );
        }
        if size == 0 {
            return Ok(());
        }
        let src = Buffer::from_dyn(src)?.buffer;
        let dst = Buffer::from_dyn(dst)?.buffer;
        let device = &self.ctx.device;
        self.ctx.submit_one_shot(|cmd| unsafe {
            let region = vk::BufferCopy { src_offset: 0, dst_offset: 0, size };
            device.cmd_copy_buffer(cmd, src, dst, &[region]);
        })
    }

    fn create_shader(&mut self, desc: &ShaderDesc) -> Result<Arc<dyn GraphicsShader>> {
        Ok(Arc::new(Shader::new(Arc::clone(&self.ctx), desc)?))
    }

    fn create_pipeline(&mut self, desc: &PipelineDesc) -> Result<Arc<dyn GraphicsPipeline>> {
        Ok(Arc::new(Pipeline::new(Arc::clone(&self.ctx), desc)?))
    }

    fn create_uniform_set(
        &mut self,
        pipeline: &dyn GraphicsPipeline,
        buffer: &dyn GraphicsBuffer,
    ) -> Result<Arc<dyn GraphicsDescriptorSet>> {
        let layout = Pipeline::from_dyn(pipeline)?.set_layouts[UNIFORM_SET_INDEX as usize];
        Ok(Arc::new(DescriptorSet::uniform(Arc::clone(&self.ctx), layout, buffer)?))
    }

    fn create_texture_set(
        &mut self,
        pipeline: &dyn GraphicsPipeline,
        textures: &[TextureBinding<'_>],
    ) -> Result<Arc<dyn GraphicsDescriptorSet>> {
        let vk_pipeline = Pipeline::from_dyn(pipeline)?;
        let layout = vk_pipeline.set_layouts[TEXTURE_SET_INDEX as usize];
        Ok(Arc::new(DescriptorSet::textures(
            Arc::clone(&self.ctx),
            layout,
            pipeline.textures_per_set(),
            textures,
        )?))
    }

    fn create_frame_sync(&mut self) -> Result<Box<dyn GraphicsFrameSync>> {
        Ok(Box::new(FrameSync::new(Arc::clone(&self.ctx))?))
    }

    fn create_command_list(&mut self) -> Result<Box<dyn GraphicsCommandList>> {
        Ok(Box::new(CommandList::new(Arc::clone(&self.ctx))?))
    }

    fn submit(&mut self, commands: &dyn GraphicsCommandList, sync: &dyn GraphicsFrameSync) -> Result<()> {
        let commands = CommandList::from_dyn(commands)?;
        if commands.is_recording() {
            engine_bail!("ise::vulkan", "Cannot submit a command list that is still recording");
        }
        let sync = FrameSync::from_dyn(sync)?;

        let wait_semaphores = [sync.image_available];
        let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let command_buffers = [commands.command_buffer];
        let signal_semaphores = [sync.render_finished];
        let submit_info = vk::SubmitInfo::default()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores);

        let _queue = self.ctx.lock_queue();
        unsafe {
            self.ctx
                .device
                .queue_submit(self.ctx.graphics_queue, &[submit_info], sync.in_flight)
                .map_err(|e| vk_status("Failed to submit frame commands", e))
        }
    }

    fn wait_idle(&self) -> Result<()> {
        unsafe {
            self.ctx
                .device
                .device_wait_idle()
                .map_err(|e| vk_status("Failed to wait for device idle", e))
        }
    }
}
