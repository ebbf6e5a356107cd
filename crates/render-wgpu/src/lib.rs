//! wgpu backend for the batching renderer.
//!
//! Implements the `GpuBackend` and texture loading capabilities of
//! `tessel-render` on a headless wgpu device and renders into an offscreen
//! target that can be read back as an image.
//!
//! # Invariants
//! - One GPU submission per batch chunk, so each vertex upload is consumed before it is overwritten.
//! - Textures are uploaded once per key; the batch renderer's cache holds the handles.
//! - The renderer never mutates world state.

mod backend;
mod context;
mod shaders;
mod target;
mod texture;

pub use backend::{WgpuBackend, vertex_attributes};
pub use context::GpuContext;
pub use shaders::BATCH_SHADER;
pub use target::{OffscreenTarget, TARGET_FORMAT, padded_bytes_per_row, unpad_rows};
pub use texture::{GpuTexture, WgpuTextureLoader, upload_image};

/// Errors from device setup and readback.
#[derive(Debug, thiserror::Error)]
pub enum GpuError {
    #[error("no compatible GPU adapter found")]
    NoAdapter,
    #[error("failed to open GPU device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
    #[error("frame readback failed: {0}")]
    Readback(String),
}

pub fn crate_info() -> &'static str {
    "tessel-render-wgpu v0.1.0"
}
