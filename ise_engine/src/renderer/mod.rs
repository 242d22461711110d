/// Renderer module - lifecycle controller, frame scheduling and swapchain management

// Module declarations
pub mod renderer;
pub mod renderer_state;
pub mod frame_scheduler;
pub mod swapchain_manager;
pub mod uniforms;

// Re-export everything from renderer.rs
pub use renderer::*;

// Re-export from other modules
pub use renderer_state::*;
pub use frame_scheduler::*;
pub use swapchain_manager::*;
pub use uniforms::*;
