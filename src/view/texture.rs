use std::path::Path;

use image::imageops::FilterType;
use image::RgbaImage;

use crate::error::AssetError;
use crate::model::TextureSlot;

/// Full chain down to 1x1.
pub fn mip_level_count(width: u32, height: u32) -> u32 {
    32 - width.max(height).max(1).leading_zeros()
}

/// Triangle-filtered mip levels, base level first.
pub fn mip_chain(base: RgbaImage) -> Vec<RgbaImage> {
    let levels = mip_level_count(base.width(), base.height());
    let mut chain = Vec::with_capacity(levels as usize);
    chain.push(base);
    for _ in 1..levels {
        let Some(prev) = chain.last() else { break };
        let w = (prev.width() / 2).max(1);
        let h = (prev.height() / 2).max(1);
        let next = image::imageops::resize(prev, w, h, FilterType::Triangle);
        chain.push(next);
    }
    chain
}

pub fn decode_rgba(path: &Path) -> Result<RgbaImage, AssetError> {
    let bytes = std::fs::read(path).map_err(|source| AssetError::Io { path: path.to_path_buf(), source })?;
    let image = image::load_from_memory(&bytes).map_err(|source| AssetError::Image { path: path.to_path_buf(), source })?;
    Ok(image.to_rgba8())
}

fn upload_levels(device: &wgpu::Device, queue: &wgpu::Queue, label: &str, levels: &[RgbaImage]) -> wgpu::Texture {
    let (width, height) = levels.first().map(|l| l.dimensions()).unwrap_or((1, 1));
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
        mip_level_count: levels.len().max(1) as u32,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    for (mip_level, level) in levels.iter().enumerate() {
        let (w, h) = level.dimensions();
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: mip_level as u32,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            level.as_raw(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * w),
                rows_per_image: Some(h),
            },
            wgpu::Extent3d { width: w, height: h, depth_or_array_layers: 1 },
        );
    }
    texture
}

/// All level textures, indexed by slot, sharing one sampler
pub struct TextureSet {
    views: Vec<wgpu::TextureView>,
    pub sampler: wgpu::Sampler,
}

impl TextureSet {
    pub fn load(device: &wgpu::Device, queue: &wgpu::Queue, dir: &Path) -> Result<Self, AssetError> {
        let mut views = Vec::with_capacity(TextureSlot::ALL.len());
        for slot in TextureSlot::ALL {
            let path = dir.join(slot.file_name());
            let base = decode_rgba(&path)?;
            let (w, h) = base.dimensions();
            let levels = mip_chain(base);
            let texture = upload_levels(device, queue, slot.file_name(), &levels);
            views.push(texture.create_view(&wgpu::TextureViewDescriptor::default()));
            tracing::info!(path = %path.display(), width = w, height = h, mips = levels.len(), "loaded texture");
        }

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("texture_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Ok(Self { views, sampler })
    }

    pub fn view(&self, slot: TextureSlot) -> &wgpu::TextureView {
        &self.views[slot.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mip_level_count() {
        assert_eq!(mip_level_count(1, 1), 1);
        assert_eq!(mip_level_count(2, 2), 2);
        assert_eq!(mip_level_count(256, 256), 9);
        assert_eq!(mip_level_count(300, 17), 9);
        assert_eq!(mip_level_count(0, 0), 1);
    }

    #[test]
    fn test_mip_chain_halves_to_one() {
        let chain = mip_chain(RgbaImage::new(8, 2));
        let dims: Vec<_> = chain.iter().map(|l| l.dimensions()).collect();
        assert_eq!(dims, vec![(8, 2), (4, 1), (2, 1), (1, 1)]);
    }

    #[test]
    fn test_mip_chain_keeps_flat_color() {
        let base = RgbaImage::from_pixel(4, 4, image::Rgba([200, 100, 50, 255]));
        let chain = mip_chain(base);
        let last = &chain[chain.len() - 1];
        assert_eq!(last.get_pixel(0, 0), &image::Rgba([200, 100, 50, 255]));
    }

    #[test]
    fn test_decode_missing_file_is_io_error() {
        match decode_rgba(Path::new("definitely/not/here.png")) {
            Err(AssetError::Io { .. }) => {}
            other => panic!("expected io error, got {:?}", other.map(|i| i.dimensions())),
        }
    }
}
