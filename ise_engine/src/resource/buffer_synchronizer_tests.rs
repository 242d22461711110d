/// Tests for BufferSynchronizer

use super::*;
use crate::error::Error;
use crate::graphics_device::mock_graphics_device::{MockBuffer, MockGraphicsDevice};
use crate::graphics_device::{BufferUsage, MemoryLocation};
use glam::{Vec2, Vec3};

// ============================================================================
// Helper Functions
// ============================================================================

fn triangle() -> MeshData {
    let white = Vec3::ONE;
    MeshData::new(
        vec![
            Vertex::new(Vec3::new(0.0, 0.0, 0.0), white, Vec2::new(0.0, 0.0)),
            Vertex::new(Vec3::new(1.0, 0.0, 0.0), white, Vec2::new(1.0, 0.0)),
            Vertex::new(Vec3::new(0.0, 1.0, 0.0), white, Vec2::new(0.0, 1.0)),
        ],
        vec![0, 1, 2],
    )
}

/// Quad with a duplicated corner in its vertex list
fn quad_with_duplicates() -> MeshData {
    let white = Vec3::ONE;
    let a = Vertex::new(Vec3::new(0.0, 0.0, 0.0), white, Vec2::new(0.0, 0.0));
    let b = Vertex::new(Vec3::new(1.0, 0.0, 0.0), white, Vec2::new(1.0, 0.0));
    let c = Vertex::new(Vec3::new(1.0, 1.0, 0.0), white, Vec2::new(1.0, 1.0));
    let d = Vertex::new(Vec3::new(0.0, 1.0, 0.0), white, Vec2::new(0.0, 1.0));
    MeshData::new(vec![a, b, c, c, d, a], vec![0, 1, 2, 3, 4, 5])
}

// ============================================================================
// Deduplication Tests
// ============================================================================

#[test]
fn test_load_same_triangle_twice_keeps_unique_vertices() {
    let (mut device, _handle) = MockGraphicsDevice::new().unwrap();
    let mut sync = BufferSynchronizer::new();

    let first = sync.load_geometry(&mut device, &triangle(), Mat4::IDENTITY).unwrap();
    let second = sync.load_geometry(&mut device, &triangle(), Mat4::IDENTITY).unwrap();

    assert_eq!(sync.vertex_count(), 3);
    assert_eq!(sync.index_count(), 6);
    assert_eq!(sync.indices(), &[0, 1, 2, 0, 1, 2]);
    assert_eq!(first, DrawRange { first_index: 0, index_count: 3 });
    assert_eq!(second, DrawRange { first_index: 3, index_count: 3 });
}

#[test]
fn test_duplicates_within_a_mesh_collapse_in_first_seen_order() {
    let (mut device, _handle) = MockGraphicsDevice::new().unwrap();
    let mut sync = BufferSynchronizer::new();

    sync.load_geometry(&mut device, &quad_with_duplicates(), Mat4::IDENTITY).unwrap();

    assert_eq!(sync.vertex_count(), 4);
    assert_eq!(sync.indices(), &[0, 1, 2, 2, 3, 0]);
}

#[test]
fn test_offset_transforms_positions() {
    let (mut device, _handle) = MockGraphicsDevice::new().unwrap();
    let mut sync = BufferSynchronizer::new();
    let offset = Mat4::from_translation(Vec3::new(5.0, 0.0, 0.0));

    sync.load_geometry(&mut device, &triangle(), Mat4::IDENTITY).unwrap();
    sync.load_geometry(&mut device, &triangle(), offset).unwrap();

    assert_eq!(sync.vertex_count(), 6);
    assert_eq!(sync.vertices()[3].pos, Vec3::new(5.0, 0.0, 0.0));
    assert_eq!(sync.vertices()[4].pos, Vec3::new(6.0, 0.0, 0.0));
}

// ============================================================================
// Upload Tests
// ============================================================================

#[test]
fn test_rebuild_replaces_gpu_buffers() {
    let (mut device, handle) = MockGraphicsDevice::new().unwrap();
    let mut sync = BufferSynchronizer::new();

    sync.load_geometry(&mut device, &triangle(), Mat4::IDENTITY).unwrap();
    sync.load_geometry(&mut device, &quad_with_duplicates(), Mat4::IDENTITY).unwrap();

    // Staging buffers are gone, only vertex + index buffers remain
    assert_eq!(handle.live("buffer"), 2);
    assert_eq!(handle.count_events("copy_buffer"), 4);
    assert_eq!(handle.count_events("wait_idle"), 2);

    let index_buffer = sync.index_buffer().unwrap();
    let mock = index_buffer.as_any().downcast_ref::<MockBuffer>().unwrap();
    let uploaded: Vec<u32> = mock
        .contents()
        .chunks_exact(4)
        .map(|bytes| u32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
        .collect();
    assert_eq!(uploaded, sync.indices());
}

#[test]
fn test_invalid_mesh_leaves_state_untouched() {
    let (mut device, handle) = MockGraphicsDevice::new().unwrap();
    let mut sync = BufferSynchronizer::new();
    sync.load_geometry(&mut device, &triangle(), Mat4::IDENTITY).unwrap();

    let mut broken = triangle();
    broken.indices.push(7);
    let result = sync.load_geometry(&mut device, &broken, Mat4::IDENTITY);

    assert!(matches!(result, Err(Error::InvalidResource(_))));
    assert_eq!(sync.index_count(), 3);
    assert!(matches!(
        sync.load_geometry(&mut device, &MeshData::default(), Mat4::IDENTITY),
        Err(Error::InvalidResource(_))
    ));
    assert_eq!(handle.live("buffer"), 2);
}

#[test]
fn test_failed_upload_restores_previous_geometry() {
    let (mut device, handle) = MockGraphicsDevice::new().unwrap();
    let mut sync = BufferSynchronizer::new();
    sync.load_geometry(&mut device, &triangle(), Mat4::IDENTITY).unwrap();
    let old_index_buffer = Arc::clone(sync.index_buffer().unwrap());

    handle.fail_buffer_creation(Some((BufferUsage::Index, MemoryLocation::GpuOnly)));
    let shifted = Mat4::from_translation(Vec3::new(3.0, 0.0, 0.0));
    let result = sync.load_geometry(&mut device, &triangle(), shifted);

    assert!(matches!(result, Err(Error::OutOfMemory)));
    assert_eq!(sync.vertex_count(), 3);
    assert_eq!(sync.index_count(), 3);
    assert!(sync.vertex_buffer().is_some());
    assert!(Arc::ptr_eq(sync.index_buffer().unwrap(), &old_index_buffer));
    drop(old_index_buffer);
    assert_eq!(handle.live("buffer"), 2);

    // The retry sees none of the failed load
    handle.fail_buffer_creation(None);
    let range = sync.load_geometry(&mut device, &triangle(), shifted).unwrap();
    assert_eq!(range, DrawRange { first_index: 3, index_count: 3 });
    assert_eq!(sync.vertex_count(), 6);
    assert_eq!(sync.indices(), &[0, 1, 2, 3, 4, 5]);
}

#[test]
fn test_failed_upload_forgets_new_vertices_for_dedup() {
    let (mut device, handle) = MockGraphicsDevice::new().unwrap();
    let mut sync = BufferSynchronizer::new();

    handle.fail_buffer_creation(Some((BufferUsage::Vertex, MemoryLocation::GpuOnly)));
    assert!(sync.load_geometry(&mut device, &triangle(), Mat4::IDENTITY).is_err());
    assert_eq!(sync.vertex_count(), 0);
    assert!(sync.vertex_buffer().is_none());
    assert_eq!(handle.live("buffer"), 0);

    handle.fail_buffer_creation(None);
    sync.load_geometry(&mut device, &quad_with_duplicates(), Mat4::IDENTITY).unwrap();
    assert_eq!(sync.indices(), &[0, 1, 2, 2, 3, 0]);
}

#[test]
fn test_clear_releases_buffers() {
    let (mut device, handle) = MockGraphicsDevice::new().unwrap();
    let mut sync = BufferSynchronizer::new();
    sync.load_geometry(&mut device, &triangle(), Mat4::IDENTITY).unwrap();

    sync.clear();

    assert_eq!(handle.live("buffer"), 0);
    assert_eq!(sync.vertex_count(), 0);
    assert!(sync.vertex_buffer().is_none());
}
