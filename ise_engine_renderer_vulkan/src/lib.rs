/*!
# ISE Engine - Vulkan Backend

Vulkan implementation of the `ise_engine` graphics device traits, built on
`ash` for the API bindings and `gpu-allocator` for memory management.

The renderer core never sees a Vulkan type: hand it the factory returned by
[`ise::vulkan_device_factory`] and it creates (and recreates) the device on
its own thread.

```no_run
use std::sync::Arc;
use ise_engine::ise::{Renderer, RendererConfig};
use ise_engine_renderer_vulkan::ise::vulkan_device_factory;
# fn demo(window: Arc<winit::window::Window>, shaders: ise_engine::ise::ShaderSources) -> ise_engine::ise::Result<()> {
let mut renderer = Renderer::new(vulkan_device_factory(window), shaders, RendererConfig::default())?;
renderer.start()?;
# Ok(())
# }
```
*/

mod vulkan_context;
mod vulkan_format;
mod vulkan_debug;
mod vulkan_buffer;
mod vulkan_texture;
mod vulkan_sampler;
mod vulkan_shader;
mod vulkan_pipeline;
mod vulkan_render_pass;
mod vulkan_swapchain;
mod vulkan_frame_sync;
mod vulkan_descriptor_set;
mod vulkan_command_list;
mod vulkan_graphics_device;

pub mod ise {
    pub use crate::vulkan_graphics_device::{vulkan_device_factory, VulkanGraphicsDevice};

    // Validation layer message counters
    pub use crate::vulkan_debug::{reset_validation_stats, validation_stats, ValidationStats};
}
