use crate::context::GpuContext;
use std::sync::Arc;
use tessel_assets::{AssetRoot, ImageData};
use tessel_render::{RenderError, TextureLoader};

/// GPU-resident RGBA texture with its bind group ready for the batch pipeline.
#[derive(Debug)]
pub struct GpuTexture {
    key: String,
    width: u32,
    height: u32,
    bind_group: wgpu::BindGroup,
    _texture: wgpu::Texture,
}

impl GpuTexture {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub(crate) fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }
}

/// Upload a decoded image as an sRGB texture.
pub fn upload_image(ctx: &GpuContext, key: &str, image: &ImageData) -> Arc<GpuTexture> {
    let size = wgpu::Extent3d {
        width: image.width,
        height: image.height,
        depth_or_array_layers: 1,
    };
    let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
        label: Some(key),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    ctx.queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        &image.pixels,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(image.width * 4),
            rows_per_image: Some(image.height),
        },
        size,
    );

    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(key),
        layout: &ctx.texture_layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(&ctx.sampler),
            },
        ],
    });

    tracing::debug!(key, width = image.width, height = image.height, "texture uploaded");
    Arc::new(GpuTexture {
        key: key.to_owned(),
        width: image.width,
        height: image.height,
        bind_group,
        _texture: texture,
    })
}

/// Loads texture keys from an asset root onto the GPU.
///
/// Wrap in a [`tessel_render::TextureCache`] so each key is decoded once.
#[derive(Debug, Clone)]
pub struct WgpuTextureLoader {
    ctx: GpuContext,
    assets: AssetRoot,
}

impl WgpuTextureLoader {
    pub fn new(ctx: GpuContext, assets: AssetRoot) -> Self {
        Self { ctx, assets }
    }
}

impl TextureLoader for WgpuTextureLoader {
    type Handle = Arc<GpuTexture>;

    fn load(&mut self, key: &str) -> Result<Arc<GpuTexture>, RenderError> {
        let image = self
            .assets
            .load_image(key)
            .map_err(|err| RenderError::resource_missing(key, err))?;
        Ok(upload_image(&self.ctx, key, &image))
    }
}
