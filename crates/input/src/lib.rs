//! Keyboard input owned by the application and mapped to actions.
//!
//! # Invariants
//! - No process-wide input state: every `Keyboard` is an ordinary value.
//! - Bound actions fire only on press/release edges, never on auto-repeat.
//! - The winit mapping is optional and does not change the core types.

mod key;
mod keyboard;
#[cfg(feature = "winit")]
pub mod winit_keys;

pub use key::{Key, ParseKeyError};
pub use keyboard::{KeyInput, Keyboard, axis};

pub fn crate_info() -> &'static str {
    "tessel-input v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("input"));
    }
}
