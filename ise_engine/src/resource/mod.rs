/// Resource module - textures, render objects and shared geometry buffers

pub mod vertex;
pub mod render_texture;
pub mod render_object;
pub mod resource_manager;
pub mod buffer_synchronizer;

pub use vertex::*;
pub use render_texture::*;
pub use render_object::*;
pub use resource_manager::*;
pub use buffer_synchronizer::*;
