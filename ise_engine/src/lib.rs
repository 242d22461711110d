/*!
# ISE Engine

Renderer lifecycle and frame presentation core of the ISE 3D engine.

This crate owns everything between "a window exists" and "pixels reach the
screen", independent of the GPU API. Backends (Vulkan) implement the
`graphics_device` traits and hand a `DeviceFactory` to the `Renderer`.

## Architecture

- **Renderer**: lifecycle controller (start / stop / recreate) and render thread
- **FrameScheduler**: frames-in-flight rotation, uniform updates, command recording
- **SwapchainManager**: swapchain and per-image render targets, recreated on resize
- **ResourceManager**: named textures and render objects with their texture bindings
- **BufferSynchronizer**: shared deduplicated vertex / index buffers
- **EventPump**: window event thread forwarding resizes and lifecycle requests
*/

// Internal modules
pub mod error;
pub mod log;
pub mod config;
pub mod clock;
pub mod graphics_device;
pub mod resource;
pub mod renderer;
pub mod event;

// Main ise namespace module
pub mod ise {
    // Error types
    pub use crate::error::{Error, Result};

    // Configuration
    pub use crate::config::{MsaaSamples, Projection, RendererConfig, TextureFiltering};

    // Time sources
    pub use crate::clock::{Clock, SystemClock};

    // Lifecycle controller
    pub use crate::renderer::{FrameStats, LifecycleState, Renderer, ResizeHandle, ShaderSources};

    // Logging sub-module (types and functions, macros live at the crate root)
    pub mod log {
        pub use crate::log::{
            enabled, log, log_detailed, min_severity, reset_logger, set_logger, set_min_severity, DefaultLogger,
            LogEntry, LogSeverity, Logger,
        };
    }

    // Backend-facing traits and descriptors
    pub mod graphics_device {
        pub use crate::graphics_device::*;
    }

    // Resource sub-module
    pub mod resource {
        pub use crate::resource::*;
    }

    // Frame, swapchain and uniform types
    pub mod render {
        pub use crate::renderer::*;
    }

    // Window event forwarding
    pub mod event {
        pub use crate::event::*;
    }
}

// Re-export math library at crate root
pub use glam;
