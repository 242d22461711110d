/// CommandList - Vulkan implementation of the CommandList trait
///
/// Each command list owns its pool and a single primary command buffer,
/// reset at every `begin`.

use ash::vk;
use ise_engine::ise::graphics_device::{
    Buffer as GraphicsBuffer, ClearValue, CommandList as GraphicsCommandList,
    DescriptorSet as GraphicsDescriptorSet, Framebuffer as GraphicsFramebuffer, IndexType,
    Pipeline as GraphicsPipeline, Rect2D, RenderPass as GraphicsRenderPass, Viewport,
};
use ise_engine::ise::{Error, Result};
use ise_engine::engine_bail;
use std::any::Any;
use std::sync::Arc;

use crate::vulkan_buffer::Buffer;
use crate::vulkan_context::GpuContext;
use crate::vulkan_descriptor_set::DescriptorSet;
use crate::vulkan_format::vk_status;
use crate::vulkan_pipeline::Pipeline;
use crate::vulkan_render_pass::{Framebuffer, RenderPass};

pub struct CommandList {
    ctx: Arc<GpuContext>,
    command_pool: vk::CommandPool,
    pub(crate) command_buffer: vk::CommandBuffer,
    is_recording: bool,
    in_render_pass: bool,
}

impl CommandList {
    pub(crate) fn new(ctx: Arc<GpuContext>) -> Result<Self> {
        unsafe {
            let pool_info = vk::CommandPoolCreateInfo::default()
                .queue_family_index(ctx.graphics_queue_family)
                .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);
            let command_pool = ctx
                .device
                .create_command_pool(&pool_info, None)
                .map_err(|e| vk_status("Failed to create command pool", e))?;

            let alloc_info = vk::CommandBufferAllocateInfo::default()
                .command_pool(command_pool)
                .level(vk::CommandBufferLevel::PRIMARY)
                .command_buffer_count(1);
            let command_buffer = match ctx.device.allocate_command_buffers(&alloc_info) {
                Ok(buffers) => buffers[0],
                Err(e) => {
                    ctx.device.destroy_command_pool(command_pool, None);
                    return Err(vk_status("Failed to allocate command buffer", e));
                }
            };

            Ok(Self {
                ctx,
                command_pool,
                command_buffer,
                is_recording: false,
                in_render_pass: false,
            })
        }
    }

    pub(crate) fn from_dyn(commands: &dyn GraphicsCommandList) -> Result<&CommandList> {
        commands
            .as_any()
            .downcast_ref::<CommandList>()
            .ok_or_else(|| Error::BackendError("CommandList was not created by the Vulkan backend".to_string()))
    }

    fn check_recording(&self, command: &str) -> Result<()> {
        if !self.is_recording {
            engine_bail!("ise::vulkan", "{} called on a command list that is not recording", command);
        }
        Ok(())
    }

    pub(crate) fn is_recording(&self) -> bool {
        self.is_recording
    }
}

impl GraphicsCommandList for CommandList {
    fn begin(&mut self) -> Result<()> {
        unsafe {
            self.ctx
                .device
                .reset_command_buffer(self.command_buffer, vk::CommandBufferResetFlags::empty())
                .map_err(|e| vk_status("Failed to reset command buffer", e))?;

            let begin_info = vk::CommandBufferBeginInfo::default()
                .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
            self.ctx
                .device
                .begin_command_buffer(self.command_buffer, &begin_info)
                .map_err(|e| vk_status("Failed to begin command buffer", e))?;
        }
        self.is_recording = true;
        self.in_render_pass = false;
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        self.check_recording("end")?;
        if self.in_render_pass {
            engine_bail!("ise::vulkan", "Command list ended inside a render pass");
        }
        unsafe {
            self.ctx
                .device
                .end_command_buffer(self.command_buffer)
                .map_err(|e| vk_status("Failed to end command buffer", e))?;
        }
        self.is_recording = false;
        Ok(())
    }

    fn begin_render_pass(
        &mut self,
        render_pass: &dyn GraphicsRenderPass,
        framebuffer: &dyn GraphicsFramebuffer,
        clear_values: &[ClearValue],
    ) -> Result<()> {
        self.check_recording("begin_render_pass")?;
        let vk_render_pass = RenderPass::from_dyn(render_pass)?;
        let vk_framebuffer = Framebuffer::from_dyn(framebuffer)?;
        let extent = framebuffer.extent();

        let mut vk_clear_values: Vec<vk::ClearValue> = clear_values
            .iter()
            .map(|value| match *value {
                ClearValue::Color(color) => vk::ClearValue {
                    color: vk::ClearColorValue { float32: color },
                },
                ClearValue::DepthStencil { depth, stencil } => vk::ClearValue {
                    depth_stencil: vk::ClearDepthStencilValue { depth, stencil },
                },
            })
            .collect();
        // The resolve attachment of a multisampled pass is never cleared
        if render_pass.desc().needs_color_attachment() {
            vk_clear_values.push(vk::ClearValue::default());
        }

        let begin_info = vk::RenderPassBeginInfo::default()
            .render_pass(vk_render_pass.render_pass)
            .framebuffer(vk_framebuffer.framebuffer)
            .render_area(vk::Rect2D {
                offset: vk::Offset2D { x: 0, y: 0 },
                extent: vk::Extent2D { width: extent.width, height: extent.height },
            })
            .clear_values(&vk_clear_values);

        unsafe {
            self.ctx
                .device
                .cmd_begin_render_pass(self.command_buffer, &begin_info, vk::SubpassContents::INLINE);
        }
        self.in_render_pass = true;
        Ok(())
    }

    fn end_render_pass(&mut self) -> Result<()> {
        self.check_recording("end_render_pass")?;
        if !self.in_render_pass {
            engine_bail!("ise::vulkan", "end_render_pass without a matching begin_render_pass");
        }
        unsafe {
            self.ctx.device.cmd_end_render_pass(self.command_buffer);
        }
        self.in_render_pass = false;
        Ok(())
    }

    fn set_viewport(&mut self, viewport: Viewport) -> Result<()> {
        self.check_recording("set_viewport")?;
        let vk_viewport = vk::Viewport {
            x: viewport.x,
            y: viewport.y,
            width: viewport.width,
            height: viewport.height,
            min_depth: viewport.min_depth,
            max_depth: viewport.max_depth,
        };
        unsafe {
            self.ctx.device.cmd_set_viewport(self.command_buffer, 0, &[vk_viewport]);
        }
        Ok(())
    }

    fn set_scissor(&mut self, scissor: Rect2D) -> Result<()> {
        self.check_recording("set_scissor")?;
        let vk_scissor = vk::Rect2D {
            offset: vk::Offset2D { x: scissor.x, y: scissor.y },
            extent: vk::Extent2D { width: scissor.width, height: scissor.height },
        };
        unsafe {
            self.ctx.device.cmd_set_scissor(self.command_buffer, 0, &[vk_scissor]);
        }
        Ok(())
    }

    fn bind_pipeline(&mut self, pipeline: &dyn GraphicsPipeline) -> Result<()> {
        self.check_recording("bind_pipeline")?;
        let vk_pipeline = Pipeline::from_dyn(pipeline)?;
        unsafe {
            self.ctx.device.cmd_bind_pipeline(
                self.command_buffer,
                vk::PipelineBindPoint::GRAPHICS,
                vk_pipeline.pipeline,
            );
        }
        Ok(())
    }

    fn bind_vertex_buffer(&mut self, buffer: &dyn GraphicsBuffer, offset: u64) -> Result<()> {
        self.check_recording("bind_vertex_buffer")?;
        let vk_buffer = Buffer::from_dyn(buffer)?;
        unsafe {
            self.ctx
                .device
                .cmd_bind_vertex_buffers(self.command_buffer, 0, &[vk_buffer.buffer], &[offset]);
        }
        Ok(())
    }

    fn bind_index_buffer(&mut self, buffer: &dyn GraphicsBuffer, offset: u64, index_type: IndexType) -> Result<()> {
        self.check_recording("bind_index_buffer")?;
        let vk_buffer = Buffer::from_dyn(buffer)?;
        let vk_index_type = match index_type {
            IndexType::U16 => vk::IndexType::UINT16,
            IndexType::U32 => vk::IndexType::UINT32,
        };
        unsafe {
            self.ctx
                .device
                .cmd_bind_index_buffer(self.command_buffer, vk_buffer.buffer, offset, vk_index_type);
        }
        Ok(())
    }

    fn bind_descriptor_set(
        &mut self,
        pipeline: &dyn GraphicsPipeline,
        set_index: u32,
        set: &dyn GraphicsDescriptorSet,
    ) -> Result<()> {
        self.check_recording("bind_descriptor_set")?;
        let vk_pipeline = Pipeline::from_dyn(pipeline)?;
        let vk_set = DescriptorSet::from_dyn(set)?;
        unsafe {
            self.ctx.device.cmd_bind_descriptor_sets(
                self.command_buffer,
                vk::PipelineBindPoint::GRAPHICS,
                vk_pipeline.layout,
                set_index,
                &[vk_set.set],
                &[],
            );
        }
        Ok(())
    }

    fn draw_indexed(&mut self, index_count: u32, first_index: u32, vertex_offset: i32) -> Result<()> {
        self.check_recording("draw_indexed")?;
        if !self.in_render_pass {
            engine_bail!("ise::vulkan", "draw_indexed outside of a render pass");
        }
        unsafe {
            self.ctx
                .device
                .cmd_draw_indexed(self.command_buffer, index_count, 1, first_index, vertex_offset, 0);
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for CommandList {
    fn drop(&mut self) {
        unsafe {
            // Freeing the pool frees its command buffer
            self.ctx.device.destroy_command_pool(self.command_pool, None);
        }
    }
}
