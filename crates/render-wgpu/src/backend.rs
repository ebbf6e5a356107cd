use crate::context::GpuContext;
use crate::shaders;
use crate::target::{OffscreenTarget, TARGET_FORMAT};
use crate::texture::GpuTexture;
use crate::GpuError;
use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use std::sync::Arc;
use tessel_assets::ImageData;
use tessel_common::Color;
use tessel_render::{GpuBackend, RendererConfig, VERTICES_PER_QUAD, VertexLayout};
use wgpu::util::DeviceExt;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Uniforms {
    view_proj: [[f32; 4]; 4],
}

const TEXTURED_ATTRIBUTES: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
    0 => Float32x3,
    1 => Float32x2,
];

const TINTED_ATTRIBUTES: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
    0 => Float32x3,
    1 => Float32x2,
    2 => Float32x4,
];

/// Vertex attributes and shader entry point matching a staging layout.
pub fn vertex_attributes(layout: VertexLayout) -> (&'static [wgpu::VertexAttribute], &'static str) {
    match layout {
        VertexLayout::Textured => (&TEXTURED_ATTRIBUTES, "vs_textured"),
        VertexLayout::Tinted => (&TINTED_ATTRIBUTES, "vs_tinted"),
    }
}

fn to_wgpu_color(color: Color) -> wgpu::Color {
    let [r, g, b, a] = color.to_f32_array();
    wgpu::Color {
        r: r as f64,
        g: g as f64,
        b: b as f64,
        a: a as f64,
    }
}

/// [`GpuBackend`] drawing into an [`OffscreenTarget`].
///
/// Every `draw_indexed` is its own submission: a vertex upload lands at the
/// next submit, so each chunk must be submitted before the staging buffer is
/// overwritten by the following one.
pub struct WgpuBackend {
    ctx: GpuContext,
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    vertex_buffer: wgpu::Buffer,
    index_buffer: Option<wgpu::Buffer>,
    target: OffscreenTarget,
    bound: Option<Arc<GpuTexture>>,
    pending_clear: Option<wgpu::Color>,
    submissions: usize,
}

impl WgpuBackend {
    pub fn new(ctx: &GpuContext, config: &RendererConfig, target: OffscreenTarget) -> Self {
        let device = &ctx.device;

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("uniform_buffer"),
            contents: bytemuck::bytes_of(&Uniforms {
                view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            }),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("uniform_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("uniform_bind_group"),
            layout: &uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("batch_pipeline_layout"),
            bind_group_layouts: &[&uniform_layout, &ctx.texture_layout],
            push_constant_ranges: &[],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("batch_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::BATCH_SHADER.into()),
        });

        let layout = config.vertex_layout;
        let (attributes, vertex_entry) = vertex_attributes(layout);
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("batch_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some(vertex_entry),
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: layout.stride_bytes() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes,
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: TARGET_FORMAT,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        let vertex_bytes =
            config.max_quads_per_batch * VERTICES_PER_QUAD * layout.stride_bytes();
        let vertex_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("batch_vertex_buffer"),
            size: vertex_bytes as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            ctx: ctx.clone(),
            pipeline,
            uniform_buffer,
            uniform_bind_group,
            vertex_buffer,
            index_buffer: None,
            target,
            bound: None,
            pending_clear: None,
            submissions: 0,
        }
    }

    /// Set the camera and clear color for the next frame. The clear is
    /// folded into the first draw, or issued alone by [`finish_frame`](Self::finish_frame).
    pub fn begin_frame(&mut self, view_proj: Mat4, clear: Color) {
        self.ctx.queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::bytes_of(&Uniforms {
                view_proj: view_proj.to_cols_array_2d(),
            }),
        );
        self.pending_clear = Some(to_wgpu_color(clear));
        self.bound = None;
        self.submissions = 0;
    }

    /// Flush a clear that no draw consumed. Returns the number of GPU submissions this frame.
    pub fn finish_frame(&mut self) -> usize {
        if self.pending_clear.is_some() {
            let mut encoder = self.encoder();
            drop(begin_pass(
                &mut encoder,
                self.target.view(),
                self.pending_clear.take(),
            ));
            self.ctx.queue.submit(std::iter::once(encoder.finish()));
            self.submissions += 1;
        }
        self.submissions
    }

    pub fn target(&self) -> &OffscreenTarget {
        &self.target
    }

    pub fn read_pixels(&self) -> Result<ImageData, GpuError> {
        self.target.read_pixels(&self.ctx)
    }

    fn encoder(&self) -> wgpu::CommandEncoder {
        self.ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("batch_encoder"),
            })
    }
}

/// Render pass over `view` that clears when `clear` is set and loads otherwise.
fn begin_pass<'e>(
    encoder: &'e mut wgpu::CommandEncoder,
    view: &wgpu::TextureView,
    clear: Option<wgpu::Color>,
) -> wgpu::RenderPass<'e> {
    let load = match clear {
        Some(color) => wgpu::LoadOp::Clear(color),
        None => wgpu::LoadOp::Load,
    };
    encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("batch_pass"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view,
            resolve_target: None,
            ops: wgpu::Operations {
                load,
                store: wgpu::StoreOp::Store,
            },
        })],
        ..Default::default()
    })
}

impl GpuBackend for WgpuBackend {
    type Texture = Arc<GpuTexture>;

    fn upload_indices(&mut self, indices: &[u32]) {
        let buffer = self
            .ctx
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("batch_index_buffer"),
                contents: bytemuck::cast_slice(indices),
                usage: wgpu::BufferUsages::INDEX,
            });
        self.index_buffer = Some(buffer);
    }

    fn bind_texture(&mut self, texture: &Arc<GpuTexture>) {
        self.bound = Some(Arc::clone(texture));
    }

    fn upload_vertices(&mut self, offset: usize, bytes: &[u8]) {
        self.ctx
            .queue
            .write_buffer(&self.vertex_buffer, offset as u64, bytes);
    }

    fn draw_indexed(&mut self, index_count: u32) {
        let (Some(texture), Some(index_buffer)) = (self.bound.clone(), self.index_buffer.as_ref())
        else {
            tracing::warn!(index_count, "draw without bound texture or index buffer skipped");
            return;
        };
        let index_buffer = index_buffer.slice(..);

        let mut encoder = self.encoder();
        {
            let mut pass = begin_pass(
                &mut encoder,
                self.target.view(),
                self.pending_clear.take(),
            );
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            pass.set_bind_group(1, texture.bind_group(), &[]);
            pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
            pass.set_index_buffer(index_buffer, wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..index_count, 0, 0..1);
        }
        self.ctx.queue.submit(std::iter::once(encoder.finish()));
        self.submissions += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attributes_cover_the_staging_stride() {
        for layout in [VertexLayout::Textured, VertexLayout::Tinted] {
            let (attributes, _) = vertex_attributes(layout);
            let bytes: u64 = attributes.iter().map(|a| a.format.size()).sum();
            assert_eq!(bytes as usize, layout.stride_bytes(), "{layout:?}");
            let last = attributes[attributes.len() - 1];
            assert_eq!(
                (last.offset + last.format.size()) as usize,
                layout.stride_bytes()
            );
        }
    }

    #[test]
    fn entry_points_match_layout() {
        assert_eq!(vertex_attributes(VertexLayout::Textured).1, "vs_textured");
        assert_eq!(vertex_attributes(VertexLayout::Tinted).1, "vs_tinted");
    }

    #[test]
    fn clear_color_is_normalized() {
        let c = to_wgpu_color(Color::rgba(255, 0, 51, 255));
        assert_eq!((c.r, c.g, c.a), (1.0, 0.0, 1.0));
        assert!((c.b - 0.2).abs() < 1e-6);
    }
}
