//! Texture resource management for wgpu
//!
//! Depth buffers for the main pass and RGBA8 material maps decoded with the
//! `image` crate.

use std::path::Path;

use crate::error::AssetError;

/// GPU texture plus the default view shaders sample it through
#[derive(Clone)]
pub struct TextureResource {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

impl TextureResource {
    /// Standard depth buffer format used throughout the sandbox
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    /// Creates a depth buffer matching the surface dimensions
    pub fn create_depth_texture(
        device: &wgpu::Device,
        config: &wgpu::SurfaceConfiguration,
        label: &str,
    ) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: config.width.max(1),
                height: config.height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self { texture, view }
    }

    /// Uploads tightly packed RGBA8 pixels. Values are sampled as stored, with
    /// no sRGB decode.
    pub fn create_from_rgba_data(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        data: &[u8],
        width: u32,
        height: u32,
        label: &str,
    ) -> Self {
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self { texture, view }
    }

    /// A 1x1 texture, bound in slots that have no material map
    pub fn solid_color(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        rgba: [u8; 4],
        label: &str,
    ) -> Self {
        Self::create_from_rgba_data(device, queue, &rgba, 1, 1, label)
    }

    /// Decodes an image file and uploads it
    pub fn from_path(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        path: &Path,
        flip_vertically: bool,
    ) -> Result<Self, AssetError> {
        let image = decode_rgba(path, flip_vertically)?;
        let label = path.display().to_string();
        Ok(Self::create_from_rgba_data(
            device,
            queue,
            image.as_raw(),
            image.width(),
            image.height(),
            &label,
        ))
    }
}

/// Reads `path` into RGBA8. Flipping moves the first row to the bottom, so
/// UV (0, 0) samples the image's bottom-left corner.
pub fn decode_rgba(path: &Path, flip_vertically: bool) -> Result<image::RgbaImage, AssetError> {
    let image = image::open(path).map_err(|e| AssetError::Texture {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let image = if flip_vertically { image.flipv() } else { image };
    let rgba = image.to_rgba8();
    if rgba.width() == 0 || rgba.height() == 0 {
        return Err(AssetError::Texture {
            path: path.to_path_buf(),
            message: "image has no pixels".to_string(),
        });
    }
    Ok(rgba)
}
