/// Pipeline - Vulkan graphics pipeline with its descriptor set layouts
///
/// Set 0: one uniform buffer (vertex stage).
/// Set 1: `textures_per_set` combined image samplers (fragment stage).

use ash::vk;
use ise_engine::ise::graphics_device::{
    Pipeline as GraphicsPipeline, PipelineDesc, Shader as GraphicsShader, ShaderStage, TEXTURE_SET_INDEX,
    UNIFORM_SET_INDEX,
};
use ise_engine::ise::{Error, Result};
use ise_engine::{engine_bail, engine_debug};
use std::any::Any;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;
use crate::vulkan_format::{sample_count_to_vk, shader_stage_to_vk, vertex_format_to_vk, vk_status};
use crate::vulkan_render_pass::RenderPass;
use crate::vulkan_shader::Shader;

pub struct Pipeline {
    ctx: Arc<GpuContext>,
    pub(crate) pipeline: vk::Pipeline,
    pub(crate) layout: vk::PipelineLayout,
    /// Indexed by set number
    pub(crate) set_layouts: [vk::DescriptorSetLayout; 2],
    textures_per_set: u32,
}

impl Pipeline {
    pub(crate) fn new(ctx: Arc<GpuContext>, desc: &PipelineDesc<'_>) -> Result<Self> {
        if desc.textures_per_set == 0 {
            engine_bail!("ise::vulkan", "Pipeline needs at least one texture per set");
        }
        if desc.samples != desc.render_pass.desc().samples() {
            engine_bail!(
                "ise::vulkan",
                "Pipeline sample count {} does not match render pass ({})",
                desc.samples,
                desc.render_pass.desc().samples()
            );
        }

        let vertex_shader = Shader::from_dyn(desc.vertex_shader)?;
        let fragment_shader = Shader::from_dyn(desc.fragment_shader)?;
        if vertex_shader.stage() != ShaderStage::Vertex || fragment_shader.stage() != ShaderStage::Fragment {
            engine_bail!("ise::vulkan", "Pipeline shaders are bound to the wrong stages");
        }
        let render_pass = RenderPass::from_dyn(desc.render_pass)?;

        // Handles are filled in as they are created; Drop releases the non-null ones
        let mut pipeline = Self {
            ctx,
            pipeline: vk::Pipeline::null(),
            layout: vk::PipelineLayout::null(),
            set_layouts: [vk::DescriptorSetLayout::null(); 2],
            textures_per_set: desc.textures_per_set,
        };
        let device = &pipeline.ctx.device;

        unsafe {
            let uniform_bindings = [vk::DescriptorSetLayoutBinding::default()
                .binding(0)
                .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
                .descriptor_count(1)
                .stage_flags(vk::ShaderStageFlags::VERTEX)];
            pipeline.set_layouts[UNIFORM_SET_INDEX as usize] = device
                .create_descriptor_set_layout(
                    &vk::DescriptorSetLayoutCreateInfo::default().bindings(&uniform_bindings),
                    None,
                )
                .map_err(|e| vk_status("Failed to create uniform set layout", e))?;

            let texture_bindings = [vk::DescriptorSetLayoutBinding::default()
                .binding(0)
                .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
                .descriptor_count(desc.textures_per_set)
                .stage_flags(vk::ShaderStageFlags::FRAGMENT)];
            pipeline.set_layouts[TEXTURE_SET_INDEX as usize] = device
                .create_descriptor_set_layout(
                    &vk::DescriptorSetLayoutCreateInfo::default().bindings(&texture_bindings),
                    None,
                )
                .map_err(|e| vk_status("Failed to create texture set layout", e))?;

            pipeline.layout = device
                .create_pipeline_layout(
                    &vk::PipelineLayoutCreateInfo::default().set_layouts(&pipeline.set_layouts),
                    None,
                )
                .map_err(|e| vk_status("Failed to create pipeline layout", e))?;

            let stages = [
                vk::PipelineShaderStageCreateInfo::default()
                    .stage(shader_stage_to_vk(ShaderStage::Vertex))
                    .module(vertex_shader.module)
                    .name(&vertex_shader.entry_point),
                vk::PipelineShaderStageCreateInfo::default()
                    .stage(shader_stage_to_vk(ShaderStage::Fragment))
                    .module(fragment_shader.module)
                    .name(&fragment_shader.entry_point),
            ];

            let binding_descriptions = [vk::VertexInputBindingDescription {
                binding: 0,
                stride: desc.vertex_layout.stride,
                input_rate: vk::VertexInputRate::VERTEX,
            }];
            let attribute_descriptions: Vec<vk::VertexInputAttributeDescription> = desc
                .vertex_layout
                .attributes
                .iter()
                .map(|attribute| vk::VertexInputAttributeDescription {
                    location: attribute.location,
                    binding: 0,
                    format: vertex_format_to_vk(attribute.format),
                    offset: attribute.offset,
                })
                .collect();
            let vertex_input = vk::PipelineVertexInputStateCreateInfo::default()
                .vertex_binding_descriptions(&binding_descriptions)
                .vertex_attribute_descriptions(&attribute_descriptions);

            let input_assembly = vk::PipelineInputAssemblyStateCreateInfo::default()
                .topology(vk::PrimitiveTopology::TRIANGLE_LIST)
                .primitive_restart_enable(false);

            // Viewport and scissor are dynamic
            let viewport_state = vk::PipelineViewportStateCreateInfo::default()
                .viewport_count(1)
                .scissor_count(1);

            let rasterizer = vk::PipelineRasterizationStateCreateInfo::default()
                .depth_clamp_enable(false)
                .rasterizer_discard_enable(false)
                .polygon_mode(vk::PolygonMode::FILL)
                .line_width(1.0)
                .cull_mode(vk::CullModeFlags::BACK)
                .front_face(vk::FrontFace::COUNTER_CLOCKWISE)
                .depth_bias_enable(false);

            let multisampling = vk::PipelineMultisampleStateCreateInfo::default()
                .sample_shading_enable(false)
                .rasterization_samples(sample_count_to_vk(desc.samples));

            let depth_stencil = vk::PipelineDepthStencilStateCreateInfo::default()
                .depth_test_enable(true)
                .depth_write_enable(true)
                .depth_compare_op(vk::CompareOp::LESS)
                .depth_bounds_test_enable(false)
                .stencil_test_enable(false);

            let blend_attachments = [vk::PipelineColorBlendAttachmentState::default()
                .color_write_mask(vk::ColorComponentFlags::RGBA)
                .blend_enable(false)];
            let color_blending = vk::PipelineColorBlendStateCreateInfo::default()
                .logic_op_enable(false)
                .attachments(&blend_attachments);

            let dynamic_states = [vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR];
            let dynamic_state = vk::PipelineDynamicStateCreateInfo::default().dynamic_states(&dynamic_states);

            let create_info = vk::GraphicsPipelineCreateInfo::default()
                .stages(&stages)
                .vertex_input_state(&vertex_input)
                .input_assembly_state(&input_assembly)
                .viewport_state(&viewport_state)
                .rasterization_state(&rasterizer)
                .multisample_state(&multisampling)
                .depth_stencil_state(&depth_stencil)
                .color_blend_state(&color_blending)
                .dynamic_state(&dynamic_state)
                .layout(pipeline.layout)
                .render_pass(render_pass.render_pass)
                .subpass(0);

            let pipelines = device
                .create_graphics_pipelines(vk::PipelineCache::null(), &[create_info], None)
                .map_err(|(_, e)| vk_status("Failed to create graphics pipeline", e))?;
            pipeline.pipeline = pipelines
                .into_iter()
                .next()
                .ok_or_else(|| Error::BackendError("vkCreateGraphicsPipelines returned no pipeline".to_string()))?;
        }

        engine_debug!(
            "ise::vulkan",
            "Graphics pipeline created ({} samples, {} textures per set)",
            desc.samples,
            desc.textures_per_set
        );
        Ok(pipeline)
    }

    pub(crate) fn from_dyn(pipeline: &dyn GraphicsPipeline) -> Result<&Pipeline> {
        pipeline
            .as_any()
            .downcast_ref::<Pipeline>()
            .ok_or_else(|| Error::BackendError("Pipeline was not created by the Vulkan backend".to_string()))
    }
}

impl GraphicsPipeline for Pipeline {
    fn textures_per_set(&self) -> u32 {
        self.textures_per_set
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        unsafe {
            let device = &self.ctx.device;
            if self.pipeline != vk::Pipeline::null() {
                device.destroy_pipeline(self.pipeline, None);
            }
            if self.layout != vk::PipelineLayout::null() {
                device.destroy_pipeline_layout(self.layout, None);
            }
            for layout in self.set_layouts {
                if layout != vk::DescriptorSetLayout::null() {
                    device.destroy_descriptor_set_layout(layout, None);
                }
            }
        }
    }
}
