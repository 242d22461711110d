/// Tests for the uniform block matrices

use super::*;
use glam::Vec4;

fn approx(a: Vec3, b: Vec3) -> bool {
    (a - b).length() < 1e-5
}

#[test]
fn test_uniform_block_size() {
    assert_eq!(std::mem::size_of::<UniformBufferObject>(), 192);
}

#[test]
fn test_model_rotates_quarter_turn_per_second() {
    let model = model_matrix(Duration::from_secs(1));
    assert!(approx(model.transform_point3(Vec3::X), Vec3::Y));

    let model = model_matrix(Duration::ZERO);
    assert_eq!(model, Mat4::IDENTITY);
}

#[test]
fn test_view_looks_at_origin() {
    let view = view_matrix();
    let origin = view.transform_point3(Vec3::ZERO);
    // Origin lies straight ahead (-Z in view space) at distance |(2,2,2)|
    assert!(origin.x.abs() < 1e-5);
    assert!(origin.y.abs() < 1e-5);
    assert!((origin.z + 12.0f32.sqrt()).abs() < 1e-5);
}

#[test]
fn test_orthographic_projection_is_flipped() {
    let config = RendererConfig::default();
    let proj = projection_matrix(&config, Extent2D::new(800, 600));

    let top = proj * Vec4::new(0.0, 2.0, -1.0, 1.0);
    assert!((top.y + 1.0).abs() < 1e-5);
    let right = proj * Vec4::new(2.0, 0.0, -1.0, 1.0);
    assert!((right.x - 1.0).abs() < 1e-5);
}

#[test]
fn test_perspective_uses_extent_aspect() {
    let config = RendererConfig {
        projection: Projection::Perspective { fov_y_degrees: 45.0 },
        ..Default::default()
    };
    let wide = projection_matrix(&config, Extent2D::new(1600, 800));
    let square = projection_matrix(&config, Extent2D::new(800, 800));

    assert!((square.x_axis.x / wide.x_axis.x - 2.0).abs() < 1e-4);
    assert!(wide.y_axis.y < 0.0);
}

#[test]
fn test_perspective_with_empty_extent_does_not_divide_by_zero() {
    let config = RendererConfig {
        projection: Projection::Perspective { fov_y_degrees: 60.0 },
        ..Default::default()
    };
    let proj = projection_matrix(&config, Extent2D::new(0, 0));
    assert!(proj.is_finite());
}
