// Source image loading and GPU texture upload.
// The mesh core treats the texture as opaque; it only supplies UVs.

use std::path::Path;

use image::GenericImageView;

#[derive(Debug, thiserror::Error)]
pub enum TextureError {
    #[error("failed to load image: {0}")]
    Decode(#[from] image::ImageError),
}

/// Decoded RGBA8 pixel data, not yet on the GPU.
pub struct TextureData {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl TextureData {
    /// Decode an image file into RGBA8.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TextureError> {
        let img = image::open(path)?;
        let (width, height) = img.dimensions();
        let data = img.to_rgba8().into_raw();
        Ok(Self { width, height, data })
    }

    /// Generated checkerboard, used when no image path is given so the tool
    /// always has something to warp.
    pub fn checkerboard(size: u32, color1: [u8; 4], color2: [u8; 4]) -> Self {
        let mut data = Vec::with_capacity((size * size * 4) as usize);

        for y in 0..size {
            for x in 0..size {
                let is_even = ((x / 8) + (y / 8)) % 2 == 0;
                let color = if is_even { color1 } else { color2 };
                data.extend_from_slice(&color);
            }
        }

        Self { width: size, height: size, data }
    }
}

/// Uploaded texture with its view and sampler.
pub struct ImageTexture {
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

impl ImageTexture {
    /// Create the GPU texture and write the pixel data.
    /// Sampling state: clamp-to-edge addressing, linear filtering.
    pub fn upload(device: &wgpu::Device, queue: &wgpu::Queue, data: &TextureData) -> Self {
        let size = wgpu::Extent3d {
            width: data.width,
            height: data.height,
            depth_or_array_layers: 1,
        };

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Source Image"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &data.data,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * data.width),
                rows_per_image: Some(data.height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Source Image Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Self { view, sampler }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkerboard_fills_every_pixel() {
        let tex = TextureData::checkerboard(32, [255, 255, 255, 255], [40, 40, 40, 255]);
        assert_eq!(tex.width, 32);
        assert_eq!(tex.height, 32);
        assert_eq!(tex.data.len(), 32 * 32 * 4);
        // First 8×8 block uses color1, the next block along x uses color2.
        assert_eq!(&tex.data[..4], &[255, 255, 255, 255]);
        assert_eq!(&tex.data[8 * 4..8 * 4 + 4], &[40, 40, 40, 255]);
    }
}
