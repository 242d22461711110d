/// Unit tests for MockGraphicsDevice and associated mock types.
///
/// The renderer tests rely on the mock's bookkeeping, so it gets checked on
/// its own first.

use crate::graphics_device::mock_graphics_device::*;
use crate::graphics_device::{
    AcquireResult, BufferDesc, BufferUsage, ColorSpace, FramebufferDesc, GraphicsDevice,
    MemoryLocation, PresentMode, PresentResult, RenderPassDesc, SurfaceFormat,
    SwapchainDesc, TextureDesc, TextureFormat, TextureUsage, Extent2D,
};

// ============================================================================
// Helper Functions
// ============================================================================

fn swapchain_desc(image_count: u32) -> SwapchainDesc {
    SwapchainDesc {
        surface_format: SurfaceFormat {
            format: TextureFormat::B8G8R8A8_SRGB,
            color_space: ColorSpace::SrgbNonlinear,
        },
        present_mode: PresentMode::Fifo,
        extent: Extent2D::new(800, 600),
        image_count,
    }
}

fn depth_desc() -> TextureDesc<'static> {
    TextureDesc {
        width: 800,
        height: 600,
        format: TextureFormat::D32_FLOAT,
        usage: TextureUsage::DepthAttachment,
        samples: 1,
        mip_levels: 1,
        data: None,
    }
}

// ============================================================================
// Bookkeeping Tests
// ============================================================================

#[test]
fn test_live_counts_follow_drops() {
    let (mut device, handle) = MockGraphicsDevice::new().unwrap();
    assert_eq!(handle.live("device"), 1);

    let buffer = device
        .create_buffer(&BufferDesc { size: 64, usage: BufferUsage::Vertex, location: MemoryLocation::GpuOnly })
        .unwrap();
    assert_eq!(handle.live("buffer"), 1);

    drop(buffer);
    assert_eq!(handle.live("buffer"), 0);
    assert_eq!(handle.created("buffer"), 1);

    drop(device);
    assert_eq!(handle.total_live(), 0);
    assert_eq!(handle.count_events("destroy_device"), 1);
}

#[test]
fn test_failed_device_creation() {
    let handle = MockHandle::new();
    handle.fail_device_creation(true);
    assert!(handle.device().is_err());
    assert_eq!(handle.live("device"), 0);
}

#[test]
fn test_buffer_update_bounds() {
    let (mut device, _handle) = MockGraphicsDevice::new().unwrap();
    let buffer = device
        .create_buffer(&BufferDesc { size: 8, usage: BufferUsage::Staging, location: MemoryLocation::CpuToGpu })
        .unwrap();

    assert!(buffer.update(4, &[1, 2, 3, 4]).is_ok());
    assert!(buffer.update(6, &[1, 2, 3, 4]).is_err());
}

#[test]
fn test_copy_buffer_moves_bytes() {
    let (mut device, handle) = MockGraphicsDevice::new().unwrap();
    let src = device
        .create_buffer(&BufferDesc { size: 4, usage: BufferUsage::Staging, location: MemoryLocation::CpuToGpu })
        .unwrap();
    let dst = device
        .create_buffer(&BufferDesc { size: 4, usage: BufferUsage::Index, location: MemoryLocation::GpuOnly })
        .unwrap();
    src.update(0, &[9, 8, 7, 6]).unwrap();

    device.copy_buffer(src.as_ref(), dst.as_ref(), 4).unwrap();

    let dst = dst.as_any().downcast_ref::<MockBuffer>().unwrap();
    assert_eq!(dst.contents(), vec![9, 8, 7, 6]);
    assert_eq!(handle.count_events("copy_buffer"), 1);
}

#[test]
fn test_texture_data_size_checked() {
    let (mut device, _handle) = MockGraphicsDevice::new().unwrap();
    let pixels = vec![0u8; 15];
    let desc = TextureDesc {
        width: 2,
        height: 2,
        format: TextureFormat::R8G8B8A8_SRGB,
        usage: TextureUsage::Sampled,
        samples: 1,
        mip_levels: 2,
        data: Some(&pixels),
    };
    assert!(device.create_texture(&desc).is_err());
}

// ============================================================================
// Swapchain Tests
// ============================================================================

#[test]
fn test_acquire_cycles_images_by_default() {
    let (mut device, _handle) = MockGraphicsDevice::new().unwrap();
    let mut swapchain = device.create_swapchain(&swapchain_desc(3)).unwrap();
    let sync = device.create_frame_sync().unwrap();

    let indices: Vec<u32> = (0..4)
        .map(|_| match swapchain.acquire_next_image(sync.as_ref()).unwrap() {
            AcquireResult::Acquired { image_index, .. } => image_index,
            AcquireResult::OutOfDate => panic!("unexpected out of date"),
        })
        .collect();
    assert_eq!(indices, vec![0, 1, 2, 0]);
}

#[test]
fn test_scripted_results() {
    let (mut device, handle) = MockGraphicsDevice::new().unwrap();
    let mut swapchain = device.create_swapchain(&swapchain_desc(2)).unwrap();
    let sync = device.create_frame_sync().unwrap();

    handle.push_acquire(AcquireResult::OutOfDate);
    handle.push_present(PresentResult::Suboptimal);

    assert_eq!(swapchain.acquire_next_image(sync.as_ref()).unwrap(), AcquireResult::OutOfDate);
    assert_eq!(swapchain.present(sync.as_ref(), 0).unwrap(), PresentResult::Suboptimal);
    assert_eq!(swapchain.present(sync.as_ref(), 0).unwrap(), PresentResult::Presented);
}

#[test]
fn test_swapchain_recreate_rebuilds_views() {
    let (mut device, handle) = MockGraphicsDevice::new().unwrap();
    let mut swapchain = device.create_swapchain(&swapchain_desc(2)).unwrap();
    assert_eq!(handle.live("swapchain_image_view"), 2);

    let mut desc = swapchain_desc(4);
    desc.extent = Extent2D::new(1024, 768);
    swapchain.recreate(&desc).unwrap();

    assert_eq!(handle.live("swapchain_image_view"), 4);
    assert_eq!(handle.created("swapchain_image_view"), 6);
    assert_eq!(swapchain.extent(), Extent2D::new(1024, 768));
    assert_eq!(handle.live("swapchain"), 1);
}

#[test]
fn test_framebuffer_attachments_must_match_pass() {
    let (mut device, _handle) = MockGraphicsDevice::new().unwrap();
    let swapchain = device.create_swapchain(&swapchain_desc(2)).unwrap();
    let depth = device.create_texture(&depth_desc()).unwrap();
    let pass = device
        .create_render_pass(&RenderPassDesc::for_samples(
            TextureFormat::B8G8R8A8_SRGB,
            TextureFormat::D32_FLOAT,
            4,
        ))
        .unwrap();

    let missing_color = FramebufferDesc {
        render_pass: pass.as_ref(),
        swapchain: swapchain.as_ref(),
        image_index: 0,
        color_attachment: None,
        depth_attachment: depth.as_ref(),
        extent: Extent2D::new(800, 600),
    };
    assert!(device.create_framebuffer(&missing_color).is_err());
}

// ============================================================================
// Submission Tests
// ============================================================================

#[test]
fn test_fence_wait_observes_outstanding_submissions() {
    let (mut device, handle) = MockGraphicsDevice::new().unwrap();
    let sync = device.create_frame_sync().unwrap();
    let mut commands = device.create_command_list().unwrap();
    commands.begin().unwrap();
    commands.end().unwrap();

    device.submit(commands.as_ref(), sync.as_ref()).unwrap();
    sync.wait().unwrap();
    assert_eq!(handle.max_outstanding_at_wait(), 1);

    device.submit(commands.as_ref(), sync.as_ref()).unwrap();
    device.submit(commands.as_ref(), sync.as_ref()).unwrap();
    sync.wait().unwrap();
    assert_eq!(handle.max_outstanding_at_wait(), 2);

    assert_eq!(handle.submitted().len(), 3);
    assert_eq!(handle.submitted()[0], vec!["begin".to_string(), "end".to_string()]);
}

#[test]
fn test_wait_idle_completes_all_work() {
    let (mut device, handle) = MockGraphicsDevice::new().unwrap();
    let sync = device.create_frame_sync().unwrap();
    let commands = device.create_command_list().unwrap();

    device.submit(commands.as_ref(), sync.as_ref()).unwrap();
    device.wait_idle().unwrap();
    sync.wait().unwrap();

    assert_eq!(handle.max_outstanding_at_wait(), 0);
}
