/// DescriptorSet trait

use std::any::Any;

use crate::graphics_device::{Sampler, Texture};

/// One texture + sampler pair written into a texture descriptor set
#[derive(Clone, Copy)]
pub struct TextureBinding<'a> {
    pub texture: &'a dyn Texture,
    pub sampler: &'a dyn Sampler,
}

/// Allocated descriptor set
///
/// Returned to its pool when dropped.
pub trait DescriptorSet: Send + Sync {
    /// Number of descriptors written by the caller
    fn binding_count(&self) -> u32;

    fn as_any(&self) -> &dyn Any;
}
