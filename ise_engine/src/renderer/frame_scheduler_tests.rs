/// Tests for FrameScheduler
///
/// Frames run on a RendererState built over MockGraphicsDevice.

use super::*;
use crate::graphics_device::mock_graphics_device::MockHandle;
use crate::graphics_device::{AcquireResult, Extent2D, PresentResult};
use crate::renderer::{RendererState, ShaderSources};
use crate::resource::{ImageData, MeshData, Vertex};
use glam::{Vec2, Vec3};

// ============================================================================
// Helper Functions
// ============================================================================

fn create_state(config: RendererConfig) -> (RendererState, MockHandle) {
    let handle = MockHandle::new();
    let device = Box::new(handle.device().unwrap());
    let shaders = ShaderSources::new(vec![0; 16], vec![0; 16]);
    let state = RendererState::new(device, &shaders, &config).unwrap();
    (state, handle)
}

fn populate(state: &mut RendererState) {
    state.create_texture("checker", &ImageData::new(2, 2, vec![255; 16])).unwrap();
    let object = state.create_render_object("triangle");
    state.set_object_textures(object, &["checker"]).unwrap();
    state.bind_object_textures(object).unwrap();
    let mesh = MeshData::new(
        vec![
            Vertex::new(Vec3::ZERO, Vec3::ONE, Vec2::ZERO),
            Vertex::new(Vec3::X, Vec3::ONE, Vec2::X),
            Vertex::new(Vec3::Y, Vec3::ONE, Vec2::Y),
        ],
        vec![0, 1, 2],
    );
    state.load_geometry(object, &mesh, Mat4::IDENTITY).unwrap();
}

fn frame(state: &mut RendererState) -> FrameOutcome {
    state.draw_frame(Duration::from_millis(16), false).unwrap()
}

// ============================================================================
// Slot Rotation Tests
// ============================================================================

#[test]
fn test_slot_index_cycles_with_frames_in_flight() {
    let (mut state, handle) = create_state(RendererConfig { max_frames_in_flight: 3, ..Default::default() });

    let mut seen = Vec::new();
    for _ in 0..7 {
        assert_eq!(frame(&mut state), FrameOutcome::Presented);
        seen.push(state.frames().current_slot());
    }

    assert_eq!(seen, vec![1, 2, 0, 1, 2, 0, 1]);
    assert_eq!(state.stats().frames_presented, 7);
    assert!(handle.max_outstanding_at_wait() <= 1);
}

#[test]
fn test_single_slot_waits_every_frame() {
    let (mut state, handle) = create_state(RendererConfig { max_frames_in_flight: 1, ..Default::default() });

    for _ in 0..4 {
        frame(&mut state);
    }

    assert_eq!(state.frames().current_slot(), 0);
    assert_eq!(handle.max_outstanding_at_wait(), 1);
    assert_eq!(handle.count_events("fence_wait"), 4);
}

#[test]
fn test_frame_step_order() {
    let (mut state, handle) = create_state(RendererConfig::default());
    frame(&mut state);

    let events: Vec<String> = handle
        .events()
        .into_iter()
        .filter(|e| matches!(e.as_str(), "fence_wait" | "acquire" | "fence_reset" | "submit" | "present"))
        .collect();
    assert_eq!(events, vec!["fence_wait", "acquire", "fence_reset", "submit", "present"]);
    assert_eq!(handle.uniform_writes(), 1);
}

// ============================================================================
// Recording Tests
// ============================================================================

#[test]
fn test_empty_scene_records_pass_without_draws() {
    let (mut state, handle) = create_state(RendererConfig::default());
    frame(&mut state);

    let commands = handle.submitted().pop().unwrap();
    assert_eq!(commands.first().map(String::as_str), Some("begin"));
    assert!(commands.contains(&"begin_render_pass".to_string()));
    assert!(!commands.iter().any(|c| c.starts_with("draw_indexed")));
    assert_eq!(state.stats().draw_calls_last_frame, 0);
}

#[test]
fn test_bound_object_is_drawn() {
    let (mut state, handle) = create_state(RendererConfig::default());
    populate(&mut state);
    frame(&mut state);

    let commands = handle.submitted().pop().unwrap();
    assert!(commands.contains(&"bind_descriptor_set:0".to_string()));
    assert!(commands.contains(&"bind_descriptor_set:1".to_string()));
    assert!(commands.contains(&"draw_indexed:0:3".to_string()));
    assert_eq!(state.stats().draw_calls_last_frame, 1);
}

#[test]
fn test_unbound_object_is_not_drawn() {
    let (mut state, handle) = create_state(RendererConfig::default());
    populate(&mut state);
    state.destroy_texture("checker").unwrap();
    frame(&mut state);

    let commands = handle.submitted().pop().unwrap();
    assert!(!commands.iter().any(|c| c.starts_with("draw_indexed")));
}

// ============================================================================
// Swapchain Invalidation Tests
// ============================================================================

#[test]
fn test_out_of_date_acquire_skips_and_recreates() {
    let (mut state, handle) = create_state(RendererConfig::default());
    frame(&mut state);
    let slot_before = state.frames().current_slot();
    let presents_before = handle.count_events("present");

    handle.push_acquire(AcquireResult::OutOfDate);
    assert_eq!(frame(&mut state), FrameOutcome::Skipped);

    assert_eq!(handle.count_events("present"), presents_before);
    assert_eq!(state.frames().current_slot(), slot_before);
    assert_eq!(state.stats().frames_skipped, 1);
    assert_eq!(state.stats().swapchain_recreations, 1);
    assert_eq!(handle.live("framebuffer"), 3);
    assert_eq!(handle.live("depth_attachment"), 1);
    assert_eq!(handle.live("swapchain_image_view"), 3);

    // Cadence resumes
    assert_eq!(frame(&mut state), FrameOutcome::Presented);
    assert_eq!(state.stats().frames_presented, 2);
}

#[test]
fn test_suboptimal_present_recreates_after_presenting() {
    let (mut state, handle) = create_state(RendererConfig::default());
    handle.push_present(PresentResult::Suboptimal);

    assert_eq!(frame(&mut state), FrameOutcome::Presented);
    assert_eq!(state.stats().frames_presented, 1);
    assert_eq!(state.stats().swapchain_recreations, 1);
}

#[test]
fn test_out_of_date_present_recreates() {
    let (mut state, handle) = create_state(RendererConfig::default());
    handle.push_present(PresentResult::OutOfDate);

    frame(&mut state);

    assert_eq!(state.stats().frames_presented, 0);
    assert_eq!(state.stats().swapchain_recreations, 1);
    assert_eq!(state.frames().current_slot(), 1);
}

#[test]
fn test_resize_request_recreates_with_new_extent() {
    let (mut state, handle) = create_state(RendererConfig::default());
    handle.set_drawable_extent(Extent2D::new(1024, 768));

    state.draw_frame(Duration::ZERO, true).unwrap();

    assert_eq!(state.swapchain().extent(), Extent2D::new(1024, 768));
    assert_eq!(state.stats().swapchain_recreations, 1);
}

#[test]
fn test_minimized_window_defers_recreation() {
    let (mut state, handle) = create_state(RendererConfig::default());
    handle.set_drawable_extent(Extent2D::new(0, 0));

    assert_eq!(state.draw_frame(Duration::ZERO, true).unwrap(), FrameOutcome::Skipped);
    assert_eq!(frame(&mut state), FrameOutcome::Skipped);
    assert!(state.frames().recreate_pending());
    assert_eq!(state.stats().swapchain_recreations, 0);
    assert_eq!(handle.count_events("acquire"), 0);

    handle.set_drawable_extent(Extent2D::new(640, 480));
    assert_eq!(frame(&mut state), FrameOutcome::Presented);
    assert!(!state.frames().recreate_pending());
    assert_eq!(state.swapchain().extent(), Extent2D::new(640, 480));
}

#[test]
fn test_deferred_recreation_and_resize_rebuild_once() {
    let (mut state, handle) = create_state(RendererConfig::default());
    handle.set_drawable_extent(Extent2D::new(0, 0));
    assert_eq!(state.draw_frame(Duration::ZERO, true).unwrap(), FrameOutcome::Skipped);

    handle.set_drawable_extent(Extent2D::new(640, 480));
    assert_eq!(state.draw_frame(Duration::ZERO, true).unwrap(), FrameOutcome::Presented);

    assert_eq!(state.stats().swapchain_recreations, 1);
    assert_eq!(handle.count_events("recreate_swapchain"), 1);
}
