//! Shared value types used by every tessel crate.
//!
//! # Invariants
//! - All types here are plain `Copy` values with no engine state attached.
//! - Matrices follow glam's column-major, column-vector convention.

mod camera;
mod types;

pub use camera::Camera2D;
pub use types::{Color, Transform2D, UvRect};

pub fn crate_info() -> &'static str {
    "tessel-common v0.1.0"
}
