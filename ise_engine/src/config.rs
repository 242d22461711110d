//! Renderer configuration
//!
//! In-memory settings consumed at setup and at every swapchain recreation.
//! Nothing here is persisted.

use crate::error::{Error, Result};

/// Multisample anti-aliasing target
///
/// The effective sample count is the minimum of this target and the highest
/// count the device supports for both color and depth attachments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MsaaSamples {
    /// Single-sample rendering (no color resolve attachment)
    Disabled,
    X2,
    X4,
    X8,
    X16,
    /// Highest count supported by the device
    Max,
}

impl MsaaSamples {
    /// Requested sample count (`u32::MAX` for `Max`)
    pub fn requested_count(&self) -> u32 {
        match self {
            MsaaSamples::Disabled => 1,
            MsaaSamples::X2 => 2,
            MsaaSamples::X4 => 4,
            MsaaSamples::X8 => 8,
            MsaaSamples::X16 => 16,
            MsaaSamples::Max => u32::MAX,
        }
    }
}

/// Texture filtering policy applied to every sampler the renderer creates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureFiltering {
    /// Nearest magnification/minification, nearest mip selection
    Nearest,
    /// Linear magnification/minification, nearest mip selection
    Bilinear,
    /// Linear magnification/minification, linear mip blending
    Trilinear,
    /// Nearest magnification, linear minification, nearest mip selection
    HybridNearBilinear,
    /// Nearest magnification, linear minification, linear mip blending
    HybridNearTrilinear,
}

/// Projection used to build the uniform projection matrix
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    /// Perspective projection with a vertical field of view in degrees
    Perspective { fov_y_degrees: f32 },
    /// Orthographic projection spanning `[-scale, scale]` on both axes
    Orthographic { scale: f32 },
}

/// Renderer configuration
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Application name reported to the graphics driver
    pub app_name: String,
    /// Present with vertical sync (mailbox when available, else FIFO)
    pub v_sync: bool,
    /// Number of frame slots (frames the CPU may record ahead of the GPU)
    pub max_frames_in_flight: usize,
    /// MSAA target
    pub msaa: MsaaSamples,
    /// Requested max anisotropy; 0 disables anisotropic filtering
    pub max_anisotropy: f32,
    /// Sampler filtering policy
    pub texture_filtering: TextureFiltering,
    /// Projection type
    pub projection: Projection,
    /// Near clip plane
    pub near_plane: f32,
    /// Far clip plane
    pub far_plane: f32,
    /// Target frames per second for the render loop pacing
    pub target_fps: u32,
    /// Max textures a single render object may bind (clamped by the device limit)
    pub max_textures_per_object: u32,
    /// Clear color for the color attachment
    pub clear_color: [f32; 4],
    /// Enable graphics API validation layers
    pub enable_validation: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            app_name: "ISE Application".to_string(),
            v_sync: true,
            max_frames_in_flight: 3,
            msaa: MsaaSamples::Max,
            max_anisotropy: 16.0,
            texture_filtering: TextureFiltering::Trilinear,
            projection: Projection::Orthographic { scale: 2.0 },
            near_plane: 0.1,
            far_plane: 10000.0,
            target_fps: 90,
            max_textures_per_object: 16,
            clear_color: [0.0, 0.0, 0.0, 1.0],
            enable_validation: cfg!(debug_assertions),
        }
    }
}

impl RendererConfig {
    /// Reject configurations the renderer cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.max_frames_in_flight == 0 {
            return Err(Error::InitializationFailed(
                "max_frames_in_flight must be at least 1".to_string(),
            ));
        }
        if self.target_fps == 0 {
            return Err(Error::InitializationFailed("target_fps must be at least 1".to_string()));
        }
        if !self.max_anisotropy.is_finite() || self.max_anisotropy < 0.0 {
            return Err(Error::InitializationFailed(format!(
                "max_anisotropy must be a non-negative number (got {})",
                self.max_anisotropy
            )));
        }
        if self.max_textures_per_object == 0 {
            return Err(Error::InitializationFailed(
                "max_textures_per_object must be at least 1".to_string(),
            ));
        }
        if !(self.near_plane < self.far_plane) {
            return Err(Error::InitializationFailed(format!(
                "near plane ({}) must be closer than far plane ({})",
                self.near_plane, self.far_plane
            )));
        }
        match self.projection {
            Projection::Perspective { fov_y_degrees } => {
                if self.near_plane <= 0.0 {
                    return Err(Error::InitializationFailed(
                        "perspective projection needs a positive near plane".to_string(),
                    ));
                }
                if !(fov_y_degrees > 0.0 && fov_y_degrees < 180.0) {
                    return Err(Error::InitializationFailed(format!(
                        "field of view must be in (0, 180) degrees (got {})",
                        fov_y_degrees
                    )));
                }
            }
            Projection::Orthographic { scale } => {
                if !(scale > 0.0) {
                    return Err(Error::InitializationFailed(format!(
                        "orthographic scale must be positive (got {})",
                        scale
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
