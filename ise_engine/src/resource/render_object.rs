/// Render object: a named geometry + texture-binding unit

use std::sync::Arc;

use slotmap::new_key_type;

use crate::graphics_device::DescriptorSet;

new_key_type! {
    /// Stable key of a render object
    pub struct RenderObjectKey;
}

/// Range of the shared index buffer drawn by one geometry load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawRange {
    pub first_index: u32,
    pub index_count: u32,
}

pub struct RenderObject {
    name: String,
    pub(crate) texture_keys: Vec<String>,
    pub(crate) texture_set: Option<Arc<dyn DescriptorSet>>,
    pub(crate) draw_ranges: Vec<DrawRange>,
}

impl RenderObject {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            texture_keys: Vec::new(),
            texture_set: None,
            draw_ranges: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Texture keys in binding order
    pub fn texture_keys(&self) -> &[String] {
        &self.texture_keys
    }

    pub fn is_bound(&self) -> bool {
        self.texture_set.is_some()
    }

    pub fn draw_ranges(&self) -> &[DrawRange] {
        &self.draw_ranges
    }

    /// Drawn only once textures are bound and geometry is loaded
    pub fn is_drawable(&self) -> bool {
        self.texture_set.is_some() && !self.draw_ranges.is_empty()
    }

    pub(crate) fn references(&self, texture_key: &str) -> bool {
        self.texture_keys.iter().any(|key| key == texture_key)
    }
}
