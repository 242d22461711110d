/// GraphicsDevice trait - factory for every GPU object the renderer owns

use std::sync::Arc;

use crate::config::RendererConfig;
use crate::error::Result;
use crate::graphics_device::{
    Buffer, BufferDesc, CommandList, DescriptorSet, Framebuffer, FramebufferDesc, FrameSync,
    Pipeline, PipelineDesc, RenderPass, RenderPassDesc, Sampler, SamplerDesc, Shader, ShaderDesc,
    Extent2D, SurfaceSupport, Swapchain, SwapchainDesc, Texture, TextureBinding, TextureDesc,
    TextureFormat,
};

/// Hardware limits the renderer core needs for its policies
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceLimits {
    /// Upper bound for sampler anisotropy
    pub max_sampler_anisotropy: f32,
    /// Max combined image samplers a single shader stage can access
    pub max_per_stage_descriptor_samplers: u32,
    /// Bitmask of supported color attachment sample counts (bit N = 2^N samples)
    pub framebuffer_color_sample_counts: u32,
    /// Bitmask of supported depth attachment sample counts (bit N = 2^N samples)
    pub framebuffer_depth_sample_counts: u32,
    /// Depth formats usable as optimal-tiling depth attachments
    pub supported_depth_formats: Vec<TextureFormat>,
}

impl DeviceLimits {
    /// Highest sample count supported by both color and depth attachments
    pub fn max_usable_sample_count(&self) -> u32 {
        let counts = self.framebuffer_color_sample_counts & self.framebuffer_depth_sample_counts;
        if counts == 0 {
            return 1;
        }
        1 << (31 - counts.leading_zeros())
    }
}

/// Creates a device for the given configuration
///
/// Called once at setup and again on every full renderer recreation. A new
/// native window is introduced by handing the renderer a new factory.
pub type DeviceFactory =
    Box<dyn FnMut(&RendererConfig) -> Result<Box<dyn GraphicsDevice>> + Send>;

/// GPU device abstraction
///
/// Owns the instance, surface, logical device, queues and memory allocator.
/// Dropping it destroys device, surface and instance in that order, so every
/// object created from it must be dropped first.
pub trait GraphicsDevice: Send {
    /// Hardware limits queried at device creation
    fn limits(&self) -> &DeviceLimits;

    /// Current drawable size of the window in pixels
    fn drawable_extent(&self) -> Extent2D;

    /// Surface capabilities, formats and present modes
    fn surface_support(&self) -> Result<SurfaceSupport>;

    /// Create the swapchain for the device surface
    fn create_swapchain(&mut self, desc: &SwapchainDesc) -> Result<Box<dyn Swapchain>>;

    /// Create a render pass
    fn create_render_pass(&mut self, desc: &RenderPassDesc) -> Result<Arc<dyn RenderPass>>;

    /// Create a framebuffer for one swapchain image
    fn create_framebuffer(&mut self, desc: &FramebufferDesc) -> Result<Arc<dyn Framebuffer>>;

    /// Create a texture, uploading `desc.data` when present
    ///
    /// Sampled textures with more than one mip level get their chain
    /// generated on the GPU from level 0.
    fn create_texture(&mut self, desc: &TextureDesc) -> Result<Arc<dyn Texture>>;

    /// Create a sampler
    fn create_sampler(&mut self, desc: &SamplerDesc) -> Result<Arc<dyn Sampler>>;

    /// Create a buffer
    fn create_buffer(&mut self, desc: &BufferDesc) -> Result<Arc<dyn Buffer>>;

    /// Copy `size` bytes from `src` to `dst` and wait for completion
    fn copy_buffer(&mut self, src: &dyn Buffer, dst: &dyn Buffer, size: u64) -> Result<()>;

    /// Create a shader module from SPIR-V
    fn create_shader(&mut self, desc: &ShaderDesc) -> Result<Arc<dyn Shader>>;

    /// Create the graphics pipeline
    fn create_pipeline(&mut self, desc: &PipelineDesc) -> Result<Arc<dyn Pipeline>>;

    /// Allocate the per-frame uniform descriptor set (set 0) for `buffer`
    fn create_uniform_set(
        &mut self,
        pipeline: &dyn Pipeline,
        buffer: &dyn Buffer,
    ) -> Result<Arc<dyn DescriptorSet>>;

    /// Allocate a texture descriptor set (set 1) with one combined image
    /// sampler per entry of `textures`
    fn create_texture_set(
        &mut self,
        pipeline: &dyn Pipeline,
        textures: &[TextureBinding<'_>],
    ) -> Result<Arc<dyn DescriptorSet>>;

    /// Create the synchronization objects of one frame slot
    fn create_frame_sync(&mut self) -> Result<Box<dyn FrameSync>>;

    /// Create a command list
    fn create_command_list(&mut self) -> Result<Box<dyn CommandList>>;

    /// Submit a recorded command list on the graphics queue
    ///
    /// Waits on the slot's image-available semaphore, signals its
    /// render-finished semaphore and its in-flight fence.
    fn submit(&mut self, commands: &dyn CommandList, sync: &dyn FrameSync) -> Result<()>;

    /// Block until the device has finished all submitted work
    fn wait_idle(&self) -> Result<()>;
}
