/// Swapchain trait - for window presentation

use std::any::Any;

use crate::error::Result;
use crate::graphics_device::{FrameSync, TextureFormat};

/// Size in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Extent2D {
    pub width: u32,
    pub height: u32,
}

impl Extent2D {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Zero in either dimension (minimized window)
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Color space of a presentable format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    SrgbNonlinear,
    Other,
}

/// Format + color space pair reported by the surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceFormat {
    pub format: TextureFormat,
    pub color_space: ColorSpace,
}

/// Presentation mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentMode {
    Immediate,
    Mailbox,
    Fifo,
    FifoRelaxed,
}

/// Surface capabilities relevant to swapchain sizing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceCapabilities {
    pub min_image_count: u32,
    /// 0 means "no limit"
    pub max_image_count: u32,
    /// `u32::MAX` in both dimensions means the surface size follows the swapchain
    pub current_extent: Extent2D,
    pub min_extent: Extent2D,
    pub max_extent: Extent2D,
}

/// Everything the surface supports
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceSupport {
    pub capabilities: SurfaceCapabilities,
    pub formats: Vec<SurfaceFormat>,
    pub present_modes: Vec<PresentMode>,
}

/// Parameters for (re)creating a swapchain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapchainDesc {
    pub surface_format: SurfaceFormat,
    pub present_mode: PresentMode,
    pub extent: Extent2D,
    pub image_count: u32,
}

/// Outcome of acquiring a swapchain image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireResult {
    /// Image acquired; `suboptimal` still allows rendering this frame
    Acquired { image_index: u32, suboptimal: bool },
    /// The swapchain no longer matches the surface and must be recreated
    OutOfDate,
}

/// Outcome of presenting a swapchain image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentResult {
    Presented,
    Suboptimal,
    OutOfDate,
}

/// Swapchain for presenting rendered images to a window
///
/// Out-of-date and suboptimal results are values, not errors: the caller
/// routes them to recreation.
pub trait Swapchain: Send {
    /// Acquire the next image, signaling the slot's image-available semaphore
    fn acquire_next_image(&mut self, sync: &dyn FrameSync) -> Result<AcquireResult>;

    /// Present `image_index`, waiting on the slot's render-finished semaphore
    fn present(&mut self, sync: &dyn FrameSync, image_index: u32) -> Result<PresentResult>;

    /// Rebuild the swapchain and its image views in place
    ///
    /// The old swapchain is handed to the new one and destroyed afterwards.
    /// The caller must have waited for device idle and released every
    /// framebuffer built on the old image views.
    fn recreate(&mut self, desc: &SwapchainDesc) -> Result<()>;

    /// Get the number of images in the swapchain
    fn image_count(&self) -> usize;

    /// Size of the swapchain images
    fn extent(&self) -> Extent2D;

    /// Pixel format of the swapchain images
    fn format(&self) -> TextureFormat;

    fn as_any(&self) -> &dyn Any;
}
