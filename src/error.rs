use std::path::PathBuf;

use thiserror::Error;

/// Failures while loading meshes, textures or shaders from disk.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}:{line}: {message}", path.display())]
    Obj {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("{} contains no triangles", path.display())]
    EmptyMesh { path: PathBuf },

    #[error("failed to decode image {}: {source}", path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("mesh `{0}` is not loaded")]
    MissingMesh(String),

    #[error("shader compilation failed: {0}")]
    Shader(String),
}

/// Failures while bringing up the surface, adapter and device.
#[derive(Debug, Error)]
pub enum GpuError {
    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("no suitable GPU adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),

    #[error("failed to request device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("surface reports no supported formats for this adapter")]
    NoSurfaceFormat,
}
