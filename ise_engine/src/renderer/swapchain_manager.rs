/// Swapchain manager - swapchain plus everything derived from it
///
/// The swapchain images, their views, the color (MSAA) and depth
/// attachments and one framebuffer per image are destroyed and rebuilt as a
/// unit after a device-idle wait.

use std::sync::Arc;

use crate::config::{MsaaSamples, RendererConfig};
use crate::error::{Error, Result};
use crate::graphics_device::{
    AcquireResult, ColorSpace, DeviceLimits, Extent2D, Framebuffer, FramebufferDesc, FrameSync,
    GraphicsDevice, PresentMode, PresentResult, RenderPass, RenderPassDesc, SurfaceCapabilities,
    SurfaceFormat, Swapchain, SwapchainDesc, Texture, TextureDesc, TextureFormat, TextureUsage,
};
use crate::{engine_debug, engine_info};

// ===== SELECTION POLICIES =====

/// Depth formats in order of preference
pub const DEPTH_FORMAT_CANDIDATES: [TextureFormat; 3] = [
    TextureFormat::D32_FLOAT,
    TextureFormat::D32_FLOAT_S8_UINT,
    TextureFormat::D24_UNORM_S8_UINT,
];

/// Prefer B8G8R8A8_SRGB with sRGB-nonlinear, else the first reported format
pub fn choose_surface_format(formats: &[SurfaceFormat]) -> Result<SurfaceFormat> {
    formats
        .iter()
        .find(|f| f.format == TextureFormat::B8G8R8A8_SRGB && f.color_space == ColorSpace::SrgbNonlinear)
        .or_else(|| formats.first())
        .copied()
        .ok_or_else(|| Error::InitializationFailed("surface reports no formats".to_string()))
}

/// V-sync: mailbox when available, else FIFO. Otherwise immediate when
/// available, else FIFO (always supported).
pub fn choose_present_mode(modes: &[PresentMode], v_sync: bool) -> PresentMode {
    let wanted = if v_sync { PresentMode::Mailbox } else { PresentMode::Immediate };
    if modes.contains(&wanted) {
        wanted
    } else {
        PresentMode::Fifo
    }
}

/// The surface's current extent, or the drawable size clamped to the
/// surface bounds when the surface leaves it to the swapchain
pub fn choose_extent(capabilities: &SurfaceCapabilities, drawable: Extent2D) -> Extent2D {
    if capabilities.current_extent.width != u32::MAX {
        return capabilities.current_extent;
    }
    Extent2D::new(
        drawable.width.clamp(capabilities.min_extent.width, capabilities.max_extent.width),
        drawable.height.clamp(capabilities.min_extent.height, capabilities.max_extent.height),
    )
}

/// One more than the minimum, bounded by the maximum when there is one
pub fn choose_image_count(capabilities: &SurfaceCapabilities) -> u32 {
    let count = capabilities.min_image_count + 1;
    if capabilities.max_image_count > 0 {
        count.min(capabilities.max_image_count)
    } else {
        count
    }
}

/// First supported depth format in preference order
pub fn choose_depth_format(supported: &[TextureFormat]) -> Result<TextureFormat> {
    DEPTH_FORMAT_CANDIDATES
        .iter()
        .copied()
        .find(|format| supported.contains(format))
        .ok_or_else(|| Error::InitializationFailed("no supported depth format".to_string()))
}

/// Configured MSAA target capped by the device's usable sample count
pub fn effective_sample_count(msaa: MsaaSamples, limits: &DeviceLimits) -> u32 {
    msaa.requested_count().min(limits.max_usable_sample_count())
}

/// Whether a recreation actually happened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecreateOutcome {
    Recreated,
    /// Drawable area is empty (minimized window); retry later
    Deferred,
}

// ===== SWAPCHAIN MANAGER =====

pub struct SwapchainManager {
    framebuffers: Vec<Arc<dyn Framebuffer>>,
    color_attachment: Option<Arc<dyn Texture>>,
    depth_attachment: Option<Arc<dyn Texture>>,
    swapchain: Box<dyn Swapchain>,
    surface_format: SurfaceFormat,
    depth_format: TextureFormat,
    samples: u32,
    recreations: u64,
}

impl SwapchainManager {
    /// Create the swapchain; attachments and framebuffers come with
    /// `build_targets` once the render pass exists
    pub fn new(device: &mut dyn GraphicsDevice, config: &RendererConfig) -> Result<Self> {
        let support = device.surface_support()?;
        let surface_format = choose_surface_format(&support.formats)?;
        let depth_format = choose_depth_format(&device.limits().supported_depth_formats)?;
        let samples = effective_sample_count(config.msaa, device.limits());

        let desc = Self::swapchain_desc(device, config, surface_format)?.ok_or_else(|| {
            Error::InitializationFailed("window has an empty drawable area".to_string())
        })?;
        let swapchain = device.create_swapchain(&desc)?;

        engine_info!(
            "ise::SwapchainManager",
            "Swapchain created: {}x{}, {} images, {:?}, {:?}, {}x MSAA",
            desc.extent.width,
            desc.extent.height,
            desc.image_count,
            surface_format.format,
            desc.present_mode,
            samples
        );

        Ok(Self {
            framebuffers: Vec::new(),
            color_attachment: None,
            depth_attachment: None,
            swapchain,
            surface_format,
            depth_format,
            samples,
            recreations: 0,
        })
    }

    /// Swapchain parameters for the current surface state, `None` when the
    /// drawable area is empty
    fn swapchain_desc(
        device: &dyn GraphicsDevice,
        config: &RendererConfig,
        surface_format: SurfaceFormat,
    ) -> Result<Option<SwapchainDesc>> {
        let support = device.surface_support()?;
        let extent = choose_extent(&support.capabilities, device.drawable_extent());
        if extent.is_empty() {
            return Ok(None);
        }
        Ok(Some(SwapchainDesc {
            surface_format,
            present_mode: choose_present_mode(&support.present_modes, config.v_sync),
            extent,
            image_count: choose_image_count(&support.capabilities),
        }))
    }

    /// Render pass layout matching the chosen formats and sample count
    pub fn render_pass_desc(&self) -> RenderPassDesc {
        RenderPassDesc::for_samples(self.surface_format.format, self.depth_format, self.samples)
    }

    /// Create the attachments and one framebuffer per swapchain image
    pub fn build_targets(&mut self, device: &mut dyn GraphicsDevice, render_pass: &dyn RenderPass) -> Result<()> {
        let extent = self.swapchain.extent();

        let color_attachment = if render_pass.desc().needs_color_attachment() {
            Some(device.create_texture(&TextureDesc {
                width: extent.width,
                height: extent.height,
                format: self.surface_format.format,
                usage: TextureUsage::ColorAttachment,
                samples: self.samples,
                mip_levels: 1,
                data: None,
            })?)
        } else {
            None
        };
        let depth_attachment = device.create_texture(&TextureDesc {
            width: extent.width,
            height: extent.height,
            format: self.depth_format,
            usage: TextureUsage::DepthAttachment,
            samples: self.samples,
            mip_levels: 1,
            data: None,
        })?;

        let mut framebuffers = Vec::with_capacity(self.swapchain.image_count());
        for image_index in 0..self.swapchain.image_count() as u32 {
            framebuffers.push(device.create_framebuffer(&FramebufferDesc {
                render_pass,
                swapchain: self.swapchain.as_ref(),
                image_index,
                color_attachment: color_attachment.as_deref(),
                depth_attachment: depth_attachment.as_ref(),
                extent,
            })?);
        }

        self.color_attachment = color_attachment;
        self.depth_attachment = Some(depth_attachment);
        self.framebuffers = framebuffers;
        Ok(())
    }

    /// Framebuffers first, then the attachments they reference
    pub(crate) fn destroy_targets(&mut self) {
        self.framebuffers.clear();
        self.color_attachment = None;
        self.depth_attachment = None;
    }

    /// Rebuild the swapchain and every derived resource
    pub fn recreate(
        &mut self,
        device: &mut dyn GraphicsDevice,
        render_pass: &dyn RenderPass,
        config: &RendererConfig,
    ) -> Result<RecreateOutcome> {
        let Some(desc) = Self::swapchain_desc(device, config, self.surface_format)? else {
            engine_debug!("ise::SwapchainManager", "Drawable area is empty, recreation deferred");
            return Ok(RecreateOutcome::Deferred);
        };

        device.wait_idle()?;
        self.destroy_targets();
        self.swapchain.recreate(&desc)?;
        self.build_targets(device, render_pass)?;
        self.recreations += 1;

        engine_info!(
            "ise::SwapchainManager",
            "Swapchain recreated: {}x{}, {} images",
            desc.extent.width,
            desc.extent.height,
            desc.image_count
        );
        Ok(RecreateOutcome::Recreated)
    }

    pub fn acquire_next_image(&mut self, sync: &dyn FrameSync) -> Result<AcquireResult> {
        self.swapchain.acquire_next_image(sync)
    }

    pub fn present(&mut self, sync: &dyn FrameSync, image_index: u32) -> Result<PresentResult> {
        self.swapchain.present(sync, image_index)
    }

    pub fn framebuffer(&self, image_index: u32) -> Result<&dyn Framebuffer> {
        self.framebuffers
            .get(image_index as usize)
            .map(|framebuffer| framebuffer.as_ref())
            .ok_or_else(|| {
                Error::InvalidState(format!("no framebuffer for swapchain image {}", image_index))
            })
    }

    pub fn extent(&self) -> Extent2D {
        self.swapchain.extent()
    }

    pub fn image_count(&self) -> usize {
        self.swapchain.image_count()
    }

    pub fn surface_format(&self) -> SurfaceFormat {
        self.surface_format
    }

    pub fn depth_format(&self) -> TextureFormat {
        self.depth_format
    }

    pub fn samples(&self) -> u32 {
        self.samples
    }

    /// Number of completed recreations
    pub fn recreations(&self) -> u64 {
        self.recreations
    }
}

#[cfg(test)]
#[path = "swapchain_manager_tests.rs"]
mod tests;
