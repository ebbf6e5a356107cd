//! Texture-grouped quad batching over a pluggable GPU backend.
//!
//! A frame is recorded into a [`BatchAccumulator`], which groups submissions
//! by texture key, then flushed by a [`BatchFlusher`] that binds each texture
//! once and draws its quads in chunks of at most `max_quads_per_batch`.
//! [`BatchRenderer`] ties the two together with a [`GpuBackend`] and a
//! [`TextureSource`].
//!
//! # Invariants
//! - Every submission of a frame lands in exactly one group.
//! - Groups flush in first-seen texture order; submissions keep their order within a group.
//! - A group of `n` quads issues `ceil(n / max_quads_per_batch)` draws and one texture bind.
//! - Render systems read the world; they never mutate it.

mod backend;
mod batch;
mod components;
mod config;
mod error;
mod flusher;
pub mod recording;
mod renderer;
mod systems;
pub mod text;

pub use backend::{GpuBackend, TextureCache, TextureLoader, TextureSource};
pub use batch::{BatchAccumulator, BatchSubmission, QuadSink, TextureGroup};
pub use components::{Animation, AnimationFrame, AnimationState, Sprite, Text};
pub use config::{RendererConfig, VertexLayout};
pub use error::RenderError;
pub use flusher::{
    BatchFlusher, FlushStats, INDICES_PER_QUAD, QUAD_CORNERS, VERTICES_PER_QUAD, quad_indices,
};
pub use renderer::{BatchRenderer, FrameReport, SkippedGroup};
pub use systems::{AnimationSystem, SpriteRenderSystem, TextRenderSystem, advance};

pub fn crate_info() -> &'static str {
    "tessel-render v0.1.0"
}
