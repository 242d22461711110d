/// Shader - Vulkan shader module

use ash::vk;
use ise_engine::ise::graphics_device::{Shader as GraphicsShader, ShaderDesc, ShaderStage};
use ise_engine::ise::{Error, Result};
use ise_engine::engine_bail;
use std::any::Any;
use std::ffi::CString;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;
use crate::vulkan_format::vk_status;

pub struct Shader {
    ctx: Arc<GpuContext>,
    pub(crate) module: vk::ShaderModule,
    pub(crate) entry_point: CString,
    stage: ShaderStage,
}

impl Shader {
    pub(crate) fn new(ctx: Arc<GpuContext>, desc: &ShaderDesc<'_>) -> Result<Self> {
        if desc.code.is_empty() || desc.code.len() % 4 != 0 {
            engine_bail!(
                "ise::vulkan",
                "SPIR-V code size ({} bytes) must be a non-zero multiple of 4",
                desc.code.len()
            );
        }
        let entry_point = CString::new(desc.entry_point)
            .map_err(|_| Error::InvalidResource(format!("invalid shader entry point {:?}", desc.entry_point)))?;

        // Copy into u32 words; the byte slice carries no alignment guarantee
        let code: Vec<u32> = desc
            .code
            .chunks_exact(4)
            .map(|word| u32::from_ne_bytes([word[0], word[1], word[2], word[3]]))
            .collect();

        let create_info = vk::ShaderModuleCreateInfo::default().code(&code);
        let module = unsafe {
            ctx.device
                .create_shader_module(&create_info, None)
                .map_err(|e| vk_status("Failed to create shader module", e))?
        };

        Ok(Self { ctx, module, entry_point, stage: desc.stage })
    }

    pub(crate) fn from_dyn(shader: &dyn GraphicsShader) -> Result<&Shader> {
        shader
            .as_any()
            .downcast_ref::<Shader>()
            .ok_or_else(|| Error::BackendError("Shader was not created by the Vulkan backend".to_string()))
    }
}

impl GraphicsShader for Shader {
    fn stage(&self) -> ShaderStage {
        self.stage
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for Shader {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_shader_module(self.module, None);
        }
    }
}
