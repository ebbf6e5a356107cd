use crate::backend::{GpuBackend, TextureSource};
use crate::batch::{BatchAccumulator, BatchSubmission, QuadSink};
use crate::config::RendererConfig;
use crate::error::RenderError;
use crate::flusher::BatchFlusher;
use glam::Mat4;

/// A group whose texture could not be resolved and was not drawn.
#[derive(Debug)]
pub struct SkippedGroup {
    pub key: String,
    pub quads: usize,
    pub error: RenderError,
}

/// What one `end_frame` drew.
#[derive(Debug, Default)]
pub struct FrameReport {
    pub groups: usize,
    pub draw_calls: usize,
    pub quads: usize,
    pub skipped: Vec<SkippedGroup>,
}

impl FrameReport {
    pub fn skipped_quads(&self) -> usize {
        self.skipped.iter().map(|s| s.quads).sum()
    }
}

/// Batching renderer: accumulate a frame, then flush it group by group.
///
/// Each frame is `begin_frame`, any number of `submit`s, then `end_frame`,
/// which resolves every group's texture and issues its draws. A group whose
/// texture fails to resolve is skipped and the rest of the frame still draws.
pub struct BatchRenderer<B, S>
where
    B: GpuBackend,
    S: TextureSource<Handle = B::Texture>,
{
    backend: B,
    textures: S,
    accumulator: BatchAccumulator,
    flusher: BatchFlusher,
}

impl<B, S> BatchRenderer<B, S>
where
    B: GpuBackend,
    S: TextureSource<Handle = B::Texture>,
{
    pub fn new(config: &RendererConfig, mut backend: B, textures: S) -> Result<Self, RenderError> {
        config.validate()?;
        let flusher = BatchFlusher::new(config);
        flusher.upload_indices(&mut backend);
        tracing::info!(
            max_quads = config.max_quads_per_batch,
            layout = ?config.vertex_layout,
            "batch renderer initialized"
        );
        Ok(Self {
            backend,
            textures,
            accumulator: BatchAccumulator::new(),
            flusher,
        })
    }

    pub fn begin_frame(&mut self) {
        self.accumulator.begin_frame();
    }

    pub fn submit(&mut self, texture: &str, submission: BatchSubmission) {
        self.accumulator.submit(texture, submission);
    }

    pub fn submit_quad(&mut self, transform: Mat4, texture: &str) {
        self.accumulator.submit_quad(transform, texture);
    }

    /// Flush every group in first-seen texture order.
    pub fn end_frame(&mut self) -> FrameReport {
        let _span = tracing::debug_span!("batch_flush").entered();
        let groups = self.accumulator.end_frame();
        let mut report = FrameReport {
            groups: groups.len(),
            ..FrameReport::default()
        };

        for group in groups {
            match self.textures.resolve(&group.key) {
                Ok(handle) => {
                    let stats = self
                        .flusher
                        .flush_group(&mut self.backend, &handle, &group.submissions);
                    report.draw_calls += stats.draw_calls;
                    report.quads += stats.quads;
                }
                Err(error) => {
                    tracing::warn!(key = %group.key, %error, "texture group skipped");
                    report.skipped.push(SkippedGroup {
                        key: group.key.clone(),
                        quads: group.submissions.len(),
                        error,
                    });
                }
            }
        }

        tracing::debug!(
            groups = report.groups,
            draw_calls = report.draw_calls,
            quads = report.quads,
            "frame flushed"
        );
        report
    }

    pub fn max_quads(&self) -> usize {
        self.flusher.max_quads()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn textures(&self) -> &S {
        &self.textures
    }

    pub fn textures_mut(&mut self) -> &mut S {
        &mut self.textures
    }

    pub fn into_parts(self) -> (B, S) {
        (self.backend, self.textures)
    }
}

impl<B, S> QuadSink for BatchRenderer<B, S>
where
    B: GpuBackend,
    S: TextureSource<Handle = B::Texture>,
{
    fn submit(&mut self, texture: &str, submission: BatchSubmission) {
        self.accumulator.submit(texture, submission);
    }
}
