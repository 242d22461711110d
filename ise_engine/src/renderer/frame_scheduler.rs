/// Frame scheduler - drives one frame through its slot
///
/// N frame slots rotate round-robin. A slot is reused only after its fence
/// has signaled, so at most one submission per slot is ever outstanding.
/// Stale swapchain results are routed to the swapchain manager instead of
/// being treated as errors.

use std::sync::Arc;
use std::time::Duration;

use glam::Mat4;

use crate::config::RendererConfig;
use crate::error::Result;
use crate::graphics_device::{
    AcquireResult, Buffer, BufferDesc, BufferUsage, ClearValue, CommandList, DescriptorSet,
    Framebuffer, FrameSync, GraphicsDevice, IndexType, MemoryLocation, Pipeline, PresentResult,
    Rect2D, RenderPass, Viewport, TEXTURE_SET_INDEX, UNIFORM_SET_INDEX,
};
use crate::renderer::{projection_matrix, RecreateOutcome, SwapchainManager, UniformBufferObject};
use crate::resource::{BufferSynchronizer, ResourceManager};
use crate::engine_trace;

/// Synchronization, command recording and uniform storage of one frame
pub struct FrameSlot {
    uniform_set: Arc<dyn DescriptorSet>,
    uniform_buffer: Arc<dyn Buffer>,
    command_list: Box<dyn CommandList>,
    sync: Box<dyn FrameSync>,
}

/// Counters exposed through `Renderer::stats`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub frames_presented: u64,
    pub frames_skipped: u64,
    pub swapchain_recreations: u64,
    pub draw_calls_last_frame: u32,
    pub current_slot: usize,
}

/// What happened to one `draw_frame` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Presented,
    /// Nothing was submitted (stale swapchain or empty drawable area)
    Skipped,
}

/// Everything a frame borrows from the renderer state
pub struct FrameContext<'a> {
    pub device: &'a mut dyn GraphicsDevice,
    pub swapchain: &'a mut SwapchainManager,
    pub render_pass: &'a dyn RenderPass,
    pub pipeline: &'a dyn Pipeline,
    pub resources: &'a ResourceManager,
    pub geometry: &'a BufferSynchronizer,
    pub config: &'a RendererConfig,
    /// Animation time
    pub time: Duration,
    /// A resize notification was consumed for this frame
    pub resize_requested: bool,
}

pub struct FrameScheduler {
    slots: Vec<FrameSlot>,
    current_slot: usize,
    projection: Mat4,
    pending_recreate: bool,
    stats: FrameStats,
}

impl FrameScheduler {
    /// Create `config.max_frames_in_flight` slots
    pub fn new(
        device: &mut dyn GraphicsDevice,
        pipeline: &dyn Pipeline,
        swapchain: &SwapchainManager,
        config: &RendererConfig,
    ) -> Result<Self> {
        let mut slots = Vec::with_capacity(config.max_frames_in_flight);
        for _ in 0..config.max_frames_in_flight {
            let sync = device.create_frame_sync()?;
            let command_list = device.create_command_list()?;
            let uniform_buffer = device.create_buffer(&BufferDesc {
                size: std::mem::size_of::<UniformBufferObject>() as u64,
                usage: BufferUsage::Uniform,
                location: MemoryLocation::CpuToGpu,
            })?;
            let uniform_set = device.create_uniform_set(pipeline, uniform_buffer.as_ref())?;
            slots.push(FrameSlot { uniform_set, uniform_buffer, command_list, sync });
        }

        Ok(Self {
            slots,
            current_slot: 0,
            projection: projection_matrix(config, swapchain.extent()),
            pending_recreate: false,
            stats: FrameStats::default(),
        })
    }

    /// Run one frame: wait, acquire, update uniforms, record, submit,
    /// present, advance
    pub fn draw_frame(&mut self, frame: FrameContext<'_>) -> Result<FrameOutcome> {
        let FrameContext {
            device,
            swapchain,
            render_pass,
            pipeline,
            resources,
            geometry,
            config,
            time,
            mut resize_requested,
        } = frame;

        if self.pending_recreate || (resize_requested && swapchain_is_minimized(device)) {
            if self.recreate_swapchain(device, swapchain, render_pass, config)? == RecreateOutcome::Deferred {
                self.stats.frames_skipped += 1;
                return Ok(FrameOutcome::Skipped);
            }
            // The rebuilt swapchain already has the new size
            resize_requested = false;
        }

        let slot_index = self.current_slot;
        self.slots[slot_index].sync.wait()?;

        let image_index = match swapchain.acquire_next_image(self.slots[slot_index].sync.as_ref())? {
            AcquireResult::Acquired { image_index, .. } => image_index,
            AcquireResult::OutOfDate => {
                engine_trace!("ise::FrameScheduler", "Swapchain out of date on acquire, frame skipped");
                self.recreate_swapchain(device, swapchain, render_pass, config)?;
                self.stats.frames_skipped += 1;
                return Ok(FrameOutcome::Skipped);
            }
        };

        let ubo = UniformBufferObject::at_time(time, self.projection);
        let slot = &mut self.slots[slot_index];
        slot.uniform_buffer.update(0, bytemuck::bytes_of(&ubo))?;

        slot.sync.reset()?;
        let framebuffer = swapchain.framebuffer(image_index)?;
        let draw_calls = record_commands(slot, framebuffer, render_pass, pipeline, resources, geometry, config)?;
        device.submit(slot.command_list.as_ref(), slot.sync.as_ref())?;

        let presented = swapchain.present(slot.sync.as_ref(), image_index)?;
        if presented != PresentResult::OutOfDate {
            self.stats.frames_presented += 1;
        }
        self.stats.draw_calls_last_frame = draw_calls;

        if presented != PresentResult::Presented || resize_requested {
            self.recreate_swapchain(device, swapchain, render_pass, config)?;
        }

        self.current_slot = (self.current_slot + 1) % self.slots.len();
        self.stats.current_slot = self.current_slot;
        Ok(FrameOutcome::Presented)
    }

    fn recreate_swapchain(
        &mut self,
        device: &mut dyn GraphicsDevice,
        swapchain: &mut SwapchainManager,
        render_pass: &dyn RenderPass,
        config: &RendererConfig,
    ) -> Result<RecreateOutcome> {
        let outcome = swapchain.recreate(device, render_pass, config)?;
        match outcome {
            RecreateOutcome::Recreated => {
                self.pending_recreate = false;
                self.projection = projection_matrix(config, swapchain.extent());
                self.stats.swapchain_recreations += 1;
            }
            RecreateOutcome::Deferred => self.pending_recreate = true,
        }
        Ok(outcome)
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn current_slot(&self) -> usize {
        self.current_slot
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    /// Projection cached at the last swapchain (re)creation
    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    /// A recreation was deferred and will be retried next frame
    pub fn recreate_pending(&self) -> bool {
        self.pending_recreate
    }
}

fn swapchain_is_minimized(device: &dyn GraphicsDevice) -> bool {
    device.drawable_extent().is_empty()
}

/// Record the frame; returns the number of draw calls
fn record_commands(
    slot: &mut FrameSlot,
    framebuffer: &dyn Framebuffer,
    render_pass: &dyn RenderPass,
    pipeline: &dyn Pipeline,
    resources: &ResourceManager,
    geometry: &BufferSynchronizer,
    config: &RendererConfig,
) -> Result<u32> {
    let extent = framebuffer.extent();
    let commands = slot.command_list.as_mut();

    commands.begin()?;
    commands.begin_render_pass(
        render_pass,
        framebuffer,
        &[
            ClearValue::Color(config.clear_color),
            ClearValue::DepthStencil { depth: 1.0, stencil: 0 },
        ],
    )?;
    commands.bind_pipeline(pipeline)?;
    commands.set_viewport(Viewport {
        x: 0.0,
        y: 0.0,
        width: extent.width as f32,
        height: extent.height as f32,
        min_depth: 0.0,
        max_depth: 1.0,
    })?;
    commands.set_scissor(Rect2D { x: 0, y: 0, width: extent.width, height: extent.height })?;

    let mut draw_calls = 0;
    if let (Some(vertices), Some(indices)) = (geometry.vertex_buffer(), geometry.index_buffer()) {
        commands.bind_vertex_buffer(vertices.as_ref(), 0)?;
        commands.bind_index_buffer(indices.as_ref(), 0, IndexType::U32)?;
        commands.bind_descriptor_set(pipeline, UNIFORM_SET_INDEX, slot.uniform_set.as_ref())?;

        for object in resources.render_objects().filter(|object| object.is_drawable()) {
            let Some(texture_set) = object.texture_set.as_ref() else {
                continue;
            };
            commands.bind_descriptor_set(pipeline, TEXTURE_SET_INDEX, texture_set.as_ref())?;
            for range in object.draw_ranges() {
                commands.draw_indexed(range.index_count, range.first_index, 0)?;
                draw_calls += 1;
            }
        }
    }

    commands.end_render_pass()?;
    commands.end()?;
    Ok(draw_calls)
}

#[cfg(test)]
#[path = "frame_scheduler_tests.rs"]
mod tests;
