//! Texture assets: resolve keys under an asset root and decode them to RGBA8.
//!
//! The renderer consumes textures by key, never by raw file paths. Keys map
//! to files through an optional JSON manifest; `builtin:` keys produce
//! procedural textures without touching the disk.

mod image_data;
mod root;

pub use image_data::ImageData;
pub use root::{AssetRoot, BUILTIN_PREFIX, TextureManifest, builtin};

/// Errors from asset operations.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("asset not found: {0}")]
    NotFound(String),
    #[error("asset key escapes the asset root: {0}")]
    InvalidKey(String),
    #[error("image decode error: {0}")]
    Decode(#[from] image::ImageError),
    #[error("pixel buffer of {len} bytes does not match {width}x{height} RGBA")]
    InvalidDimensions { width: u32, height: u32, len: usize },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn crate_info() -> &'static str {
    "tessel-assets v0.1.0"
}
