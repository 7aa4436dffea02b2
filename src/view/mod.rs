// VIEW: GPU set-up, assets and drawing
pub mod gpu_init;
pub mod mesh;
pub mod overlay;
pub mod render;
pub mod texture;

pub use gpu_init::GpuContext;
pub use mesh::{Aabb, MeshData, MeshLibrary, Vertex};
pub use overlay::{layout_texts, OverlayFrame, TextOverlay};
pub use render::Renderer;
pub use texture::TextureSet;
