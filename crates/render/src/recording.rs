//! GPU-free backend that records every call. Used by tests and the headless
//! `batch` command.

use crate::backend::{GpuBackend, TextureSource};
use crate::error::RenderError;
use crate::flusher::INDICES_PER_QUAD;
use rustc_hash::FxHashSet;

#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    BindTexture(String),
    UploadVertices { offset: usize, floats: Vec<f32> },
    DrawIndexed { index_count: u32 },
}

#[derive(Debug, Default)]
pub struct RecordingBackend {
    indices: Vec<u32>,
    calls: Vec<RecordedCall>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn calls(&self) -> &[RecordedCall] {
        &self.calls
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }

    pub fn draw_index_counts(&self) -> Vec<u32> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                RecordedCall::DrawIndexed { index_count } => Some(*index_count),
                _ => None,
            })
            .collect()
    }

    pub fn quads_per_draw(&self) -> Vec<usize> {
        self.draw_index_counts()
            .into_iter()
            .map(|count| count as usize / INDICES_PER_QUAD)
            .collect()
    }

    pub fn bound_textures(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                RecordedCall::BindTexture(key) => Some(key.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Floats of the `n`th vertex upload.
    pub fn uploaded_vertices(&self, n: usize) -> Option<&[f32]> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                RecordedCall::UploadVertices { floats, .. } => Some(floats.as_slice()),
                _ => None,
            })
            .nth(n)
    }
}

impl GpuBackend for RecordingBackend {
    type Texture = String;

    fn upload_indices(&mut self, indices: &[u32]) {
        self.indices = indices.to_vec();
    }

    fn bind_texture(&mut self, texture: &String) {
        self.calls.push(RecordedCall::BindTexture(texture.clone()));
    }

    fn upload_vertices(&mut self, offset: usize, bytes: &[u8]) {
        self.calls.push(RecordedCall::UploadVertices {
            offset,
            floats: bytes
                .chunks_exact(4)
                .map(|b| f32::from_ne_bytes([b[0], b[1], b[2], b[3]]))
                .collect(),
        });
    }

    fn draw_indexed(&mut self, index_count: u32) {
        self.calls.push(RecordedCall::DrawIndexed { index_count });
    }
}

/// Resolves keys to themselves, failing for keys that were never registered.
#[derive(Debug, Default, Clone)]
pub struct KnownTextures {
    keys: FxHashSet<String>,
}

impl KnownTextures {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    pub fn register(&mut self, key: impl Into<String>) {
        self.keys.insert(key.into());
    }
}

impl TextureSource for KnownTextures {
    type Handle = String;

    fn resolve(&mut self, key: &str) -> Result<String, RenderError> {
        if self.keys.contains(key) {
            Ok(key.to_owned())
        } else {
            Err(RenderError::resource_missing(key, "texture not registered"))
        }
    }
}
