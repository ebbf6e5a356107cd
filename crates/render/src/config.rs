use crate::error::RenderError;
use crate::flusher::INDICES_PER_QUAD;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Per-vertex attribute layout written into the staging buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VertexLayout {
    /// position (3) + texcoord (2)
    #[default]
    Textured,
    /// position (3) + texcoord (2) + RGBA tint (4), used for glyphs and colored sprites
    Tinted,
}

impl VertexLayout {
    pub const fn floats_per_vertex(self) -> usize {
        match self {
            VertexLayout::Textured => 5,
            VertexLayout::Tinted => 9,
        }
    }

    pub const fn stride_bytes(self) -> usize {
        self.floats_per_vertex() * std::mem::size_of::<f32>()
    }
}

/// Batching renderer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Quads per draw call; also the capacity of the staging and index buffers.
    pub max_quads_per_batch: usize,
    pub vertex_layout: VertexLayout,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            max_quads_per_batch: 1000,
            vertex_layout: VertexLayout::Textured,
        }
    }
}

impl RendererConfig {
    pub fn with_max_quads(mut self, max_quads_per_batch: usize) -> Self {
        self.max_quads_per_batch = max_quads_per_batch;
        self
    }

    pub fn with_layout(mut self, vertex_layout: VertexLayout) -> Self {
        self.vertex_layout = vertex_layout;
        self
    }

    /// The batch must hold at least one quad, and a full batch's index count
    /// must fit in a `u32`. That also bounds every vertex index.
    pub fn validate(&self) -> Result<(), RenderError> {
        if self.max_quads_per_batch == 0 {
            return Err(RenderError::InvalidConfig(
                "max_quads_per_batch must be at least 1".into(),
            ));
        }
        let max_indices = self.max_quads_per_batch.checked_mul(INDICES_PER_QUAD);
        if max_indices.is_none_or(|n| n > u32::MAX as usize) {
            return Err(RenderError::InvalidConfig(format!(
                "max_quads_per_batch {} overflows 32-bit index counts",
                self.max_quads_per_batch
            )));
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self, RenderError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RenderError> {
        let data = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&data)
    }
}
