use crate::backend::GpuBackend;
use crate::batch::BatchSubmission;
use crate::config::{RendererConfig, VertexLayout};
use glam::Vec3;

pub const VERTICES_PER_QUAD: usize = 4;
pub const INDICES_PER_QUAD: usize = 6;

/// Unit quad centered on the origin: top-right, bottom-right, bottom-left, top-left.
pub const QUAD_CORNERS: [Vec3; VERTICES_PER_QUAD] = [
    Vec3::new(0.5, 0.5, 0.0),
    Vec3::new(0.5, -0.5, 0.0),
    Vec3::new(-0.5, -0.5, 0.0),
    Vec3::new(-0.5, 0.5, 0.0),
];

/// Index pattern for `max_quads` quads: two triangles per quad sharing the
/// TR-BL diagonal, `4i, 4i+1, 4i+3, 4i+1, 4i+2, 4i+3`.
pub fn quad_indices(max_quads: usize) -> Vec<u32> {
    (0..max_quads as u32)
        .flat_map(|quad| {
            let v = quad * VERTICES_PER_QUAD as u32;
            [v, v + 1, v + 3, v + 1, v + 2, v + 3]
        })
        .collect()
}

/// Counters for one flushed group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushStats {
    pub draw_calls: usize,
    pub quads: usize,
}

/// Turns texture groups into chunked draw calls.
///
/// The staging buffer is sized for one full batch and reused for every chunk,
/// so a group of `n` quads costs `ceil(n / max_quads)` uploads and draws.
#[derive(Debug)]
pub struct BatchFlusher {
    max_quads: usize,
    layout: VertexLayout,
    indices: Vec<u32>,
    staging: Vec<f32>,
}

impl BatchFlusher {
    /// Panics on a config that fails [`RendererConfig::validate`].
    pub fn new(config: &RendererConfig) -> Self {
        if let Err(err) = config.validate() {
            panic!("batch flusher needs a valid config: {err}");
        }
        let max_quads = config.max_quads_per_batch;
        let layout = config.vertex_layout;
        Self {
            max_quads,
            layout,
            indices: quad_indices(max_quads),
            staging: vec![0.0; max_quads * VERTICES_PER_QUAD * layout.floats_per_vertex()],
        }
    }

    pub fn max_quads(&self) -> usize {
        self.max_quads
    }

    pub fn layout(&self) -> VertexLayout {
        self.layout
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Bytes needed for a vertex buffer that holds one full batch.
    pub fn vertex_buffer_size(&self) -> usize {
        self.staging.len() * std::mem::size_of::<f32>()
    }

    pub fn upload_indices<B: GpuBackend>(&self, backend: &mut B) {
        backend.upload_indices(&self.indices);
    }

    /// Bind `texture` once and draw `submissions` in chunks of at most
    /// `max_quads`, preserving order. An empty group issues nothing.
    pub fn flush_group<B: GpuBackend>(
        &mut self,
        backend: &mut B,
        texture: &B::Texture,
        submissions: &[BatchSubmission],
    ) -> FlushStats {
        let mut stats = FlushStats::default();
        if submissions.is_empty() {
            return stats;
        }

        backend.bind_texture(texture);
        for chunk in submissions.chunks(self.max_quads) {
            let floats = self.write_chunk(chunk);
            backend.upload_vertices(0, bytemuck::cast_slice(&self.staging[..floats]));
            backend.draw_indexed((chunk.len() * INDICES_PER_QUAD) as u32);
            stats.draw_calls += 1;
            stats.quads += chunk.len();
            tracing::trace!(quads = chunk.len(), "batch chunk drawn");
        }
        stats
    }

    /// Fill the staging prefix for `chunk`; returns the number of floats written.
    fn write_chunk(&mut self, chunk: &[BatchSubmission]) -> usize {
        let stride = self.layout.floats_per_vertex();
        let tinted = self.layout == VertexLayout::Tinted;
        for (quad, submission) in chunk.iter().enumerate() {
            let uvs = submission.uv.corners();
            let tint = submission.tint.to_f32_array();
            for (corner, local) in QUAD_CORNERS.iter().enumerate() {
                let start = (quad * VERTICES_PER_QUAD + corner) * stride;
                let vertex = &mut self.staging[start..start + stride];
                let p = submission.transform.transform_point3(*local);
                vertex[..3].copy_from_slice(&p.to_array());
                vertex[3] = uvs[corner].x;
                vertex[4] = uvs[corner].y;
                if tinted {
                    vertex[5..9].copy_from_slice(&tint);
                }
            }
        }
        chunk.len() * VERTICES_PER_QUAD * stride
    }
}
