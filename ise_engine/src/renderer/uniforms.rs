/// Per-frame uniform block and the camera matrices that fill it

use std::time::Duration;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use crate::config::{Projection, RendererConfig};
use crate::graphics_device::Extent2D;

/// Model rotation speed about +Z, in degrees per second
pub const ROTATION_DEGREES_PER_SECOND: f32 = 90.0;

/// Uniform block bound at set 0, binding 0 (vertex stage)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct UniformBufferObject {
    pub model: Mat4,
    pub view: Mat4,
    pub proj: Mat4,
}

impl UniformBufferObject {
    /// Uniform block at animation time `time`
    pub fn at_time(time: Duration, proj: Mat4) -> Self {
        Self {
            model: model_matrix(time),
            view: view_matrix(),
            proj,
        }
    }
}

/// Rotation about +Z by 90 degrees per elapsed second
pub fn model_matrix(time: Duration) -> Mat4 {
    Mat4::from_rotation_z((time.as_secs_f32() * ROTATION_DEGREES_PER_SECOND).to_radians())
}

/// Fixed camera at (2, 2, 2) looking at the origin, Z up
pub fn view_matrix() -> Mat4 {
    Mat4::look_at_rh(Vec3::new(2.0, 2.0, 2.0), Vec3::ZERO, Vec3::Z)
}

/// Projection for the configured variant and swapchain extent
///
/// Y is flipped: clip space Y points down on the presentation target.
pub fn projection_matrix(config: &RendererConfig, extent: Extent2D) -> Mat4 {
    let mut proj = match config.projection {
        Projection::Perspective { fov_y_degrees } => {
            perspective(fov_y_degrees, extent, config.near_plane, config.far_plane)
        }
        Projection::Orthographic { scale } => {
            orthographic(scale, config.near_plane, config.far_plane)
        }
    };
    proj.y_axis.y *= -1.0;
    proj
}

fn perspective(fov_y_degrees: f32, extent: Extent2D, near: f32, far: f32) -> Mat4 {
    let aspect = if extent.is_empty() {
        1.0
    } else {
        extent.width as f32 / extent.height as f32
    };
    Mat4::perspective_rh(fov_y_degrees.to_radians(), aspect, near, far)
}

fn orthographic(scale: f32, near: f32, far: f32) -> Mat4 {
    Mat4::orthographic_rh(-scale, scale, -scale, scale, near, far)
}

#[cfg(test)]
#[path = "uniforms_tests.rs"]
mod tests;
