/// Graphics device module - the seam between the renderer core and a GPU backend
///
/// The renderer core only talks to these traits. The Vulkan crate implements
/// them for real hardware; `mock_graphics_device` implements them for tests.

// Module declarations
pub mod graphics_device;
pub mod buffer;
pub mod texture;
pub mod swapchain;
pub mod render_pass;
pub mod pipeline;
pub mod descriptor_set;
pub mod frame_sync;
pub mod command_list;

// Re-export everything from graphics_device.rs
pub use graphics_device::*;

// Re-export from other modules
pub use buffer::*;
pub use texture::*;
pub use swapchain::*;
pub use render_pass::*;
pub use pipeline::*;
pub use descriptor_set::*;
pub use frame_sync::*;
pub use command_list::*;

// Mock graphics device for tests (no GPU required)
#[cfg(test)]
pub mod mock_graphics_device;
