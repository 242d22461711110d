/// RenderPass and Framebuffer traits

use std::any::Any;

use crate::graphics_device::{Extent2D, Swapchain, Texture, TextureFormat};

/// Render pass structure
///
/// The two variants differ in attachment layout: a multisampled pass renders
/// into a dedicated color image and resolves into the swapchain image, a
/// single-sample pass renders into the swapchain image directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderPassDesc {
    /// Attachments: swapchain color, depth
    SingleSample {
        color_format: TextureFormat,
        depth_format: TextureFormat,
    },
    /// Attachments: MSAA color, MSAA depth, swapchain resolve target
    Multisampled {
        color_format: TextureFormat,
        depth_format: TextureFormat,
        samples: u32,
    },
}

impl RenderPassDesc {
    /// Pick the variant for an effective sample count
    pub fn for_samples(color_format: TextureFormat, depth_format: TextureFormat, samples: u32) -> Self {
        if samples > 1 {
            RenderPassDesc::Multisampled { color_format, depth_format, samples }
        } else {
            RenderPassDesc::SingleSample { color_format, depth_format }
        }
    }

    pub fn samples(&self) -> u32 {
        match self {
            RenderPassDesc::SingleSample { .. } => 1,
            RenderPassDesc::Multisampled { samples, .. } => *samples,
        }
    }

    pub fn color_format(&self) -> TextureFormat {
        match self {
            RenderPassDesc::SingleSample { color_format, .. }
            | RenderPassDesc::Multisampled { color_format, .. } => *color_format,
        }
    }

    pub fn depth_format(&self) -> TextureFormat {
        match self {
            RenderPassDesc::SingleSample { depth_format, .. }
            | RenderPassDesc::Multisampled { depth_format, .. } => *depth_format,
        }
    }

    /// Whether a dedicated multisampled color attachment is needed
    pub fn needs_color_attachment(&self) -> bool {
        matches!(self, RenderPassDesc::Multisampled { .. })
    }
}

/// Render pass resource
pub trait RenderPass: Send + Sync {
    fn desc(&self) -> &RenderPassDesc;

    fn as_any(&self) -> &dyn Any;
}

/// Descriptor for creating a framebuffer over one swapchain image
pub struct FramebufferDesc<'a> {
    pub render_pass: &'a dyn RenderPass,
    pub swapchain: &'a dyn Swapchain,
    pub image_index: u32,
    /// Multisampled color image (multisampled passes only)
    pub color_attachment: Option<&'a dyn Texture>,
    pub depth_attachment: &'a dyn Texture,
    pub extent: Extent2D,
}

/// Framebuffer resource
pub trait Framebuffer: Send + Sync {
    fn extent(&self) -> Extent2D;

    fn as_any(&self) -> &dyn Any;
}
