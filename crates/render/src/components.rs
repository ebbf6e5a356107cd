use crate::error::RenderError;
use serde::{Deserialize, Serialize};
use tessel_common::{Color, UvRect};

/// Textured quad drawn at the entity's `Transform2D`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sprite {
    pub texture: String,
    #[serde(default)]
    pub uv: UvRect,
    #[serde(default)]
    pub tint: Color,
}

impl Sprite {
    pub fn new(texture: impl Into<String>) -> Self {
        Self {
            texture: texture.into(),
            uv: UvRect::FULL,
            tint: Color::WHITE,
        }
    }

    pub fn with_tint(mut self, tint: Color) -> Self {
        self.tint = tint;
        self
    }
}

/// Single line of text anchored at the entity's `Transform2D`, baseline at the origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Text {
    pub content: String,
    pub font_size: u32,
    pub color: Color,
}

impl Text {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            font_size: 48,
            color: Color::WHITE,
        }
    }

    pub fn with_size(mut self, font_size: u32) -> Self {
        self.font_size = font_size;
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationFrame {
    pub texture: String,
    /// Seconds this frame stays on screen.
    pub duration: f32,
}

impl AnimationFrame {
    pub fn new(texture: impl Into<String>, duration: f32) -> Self {
        Self {
            texture: texture.into(),
            duration,
        }
    }
}

/// Flip-book of sprite textures. Always holds at least one frame and every
/// frame lasts a positive, finite time.
#[derive(Debug, Clone, PartialEq)]
pub struct Animation {
    frames: Vec<AnimationFrame>,
    looping: bool,
}

impl Animation {
    pub fn new(frames: Vec<AnimationFrame>, looping: bool) -> Result<Self, RenderError> {
        if frames.is_empty() {
            return Err(RenderError::InvalidAnimation("animation has no frames"));
        }
        if frames
            .iter()
            .any(|f| !f.duration.is_finite() || f.duration <= 0.0)
        {
            return Err(RenderError::InvalidAnimation(
                "frame duration must be positive and finite",
            ));
        }
        Ok(Self { frames, looping })
    }

    pub fn frames(&self) -> &[AnimationFrame] {
        &self.frames
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    pub fn total_duration(&self) -> f32 {
        self.frames.iter().map(|f| f.duration).sum()
    }
}

/// Playback position of an [`Animation`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AnimationState {
    pub frame_index: usize,
    /// Seconds spent in the current frame.
    pub elapsed: f32,
    /// Set once a non-looping animation reaches its last frame.
    pub finished: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn animation_rejects_empty_and_degenerate_frames() {
        assert!(Animation::new(vec![], true).is_err());
        assert!(Animation::new(vec![AnimationFrame::new("a", 0.0)], true).is_err());
        assert!(Animation::new(vec![AnimationFrame::new("a", f32::NAN)], false).is_err());
        let anim = Animation::new(
            vec![AnimationFrame::new("a", 0.1), AnimationFrame::new("b", 0.2)],
            true,
        )
        .unwrap();
        assert!((anim.total_duration() - 0.3).abs() < 1e-6);
        assert!(anim.is_looping());
    }

    #[test]
    fn sprite_deserializes_with_defaults() {
        let sprite: Sprite = serde_json::from_str(r#"{ "texture": "player.png" }"#).unwrap();
        assert_eq!(sprite, Sprite::new("player.png"));
    }

    #[test]
    fn text_builder() {
        let t = Text::new("score").with_size(24).with_color(Color::GREEN);
        assert_eq!(t.font_size, 24);
        assert_eq!(t.color, Color::GREEN);
    }
}
