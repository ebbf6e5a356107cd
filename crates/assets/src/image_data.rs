use crate::AssetError;
use std::path::Path;
use tessel_common::Color;

/// Decoded RGBA8 image, rows top to bottom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl ImageData {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, AssetError> {
        let expected = width as usize * height as usize * 4;
        if width == 0 || height == 0 || pixels.len() != expected {
            return Err(AssetError::InvalidDimensions {
                width,
                height,
                len: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Decode any supported encoded image (PNG, JPEG) into RGBA8.
    pub fn decode(bytes: &[u8]) -> Result<Self, AssetError> {
        let rgba = image::load_from_memory(bytes)?.to_rgba8();
        let (width, height) = rgba.dimensions();
        Self::new(width, height, rgba.into_raw())
    }

    /// Single-color image. Dimensions are raised to at least one pixel.
    pub fn solid(width: u32, height: u32, color: Color) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let pixel = [color.r, color.g, color.b, color.a];
        Self {
            width,
            height,
            pixels: pixel.repeat(width as usize * height as usize),
        }
    }

    /// Two-color checkerboard with square `cell`-pixel tiles. `size` is at least one pixel.
    pub fn checkerboard(size: u32, cell: u32, a: Color, b: Color) -> Self {
        let size = size.max(1);
        let cell = cell.max(1);
        let mut pixels = Vec::with_capacity(size as usize * size as usize * 4);
        for y in 0..size {
            for x in 0..size {
                let c = if (x / cell + y / cell) % 2 == 0 { a } else { b };
                pixels.extend_from_slice(&[c.r, c.g, c.b, c.a]);
            }
        }
        Self {
            width: size,
            height: size,
            pixels,
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        let p = &self.pixels[i..i + 4];
        Some(Color::rgba(p[0], p[1], p[2], p[3]))
    }

    /// Copy `src` into this image with its top-left corner at `(x, y)`. Pixels
    /// falling outside are clipped.
    pub fn blit(&mut self, src: &ImageData, x: u32, y: u32) {
        if x >= self.width || y >= self.height {
            return;
        }
        let w = src.width.min(self.width.saturating_sub(x)) as usize;
        for row in 0..src.height.min(self.height.saturating_sub(y)) {
            let s = row as usize * src.width as usize * 4;
            let d = ((y + row) as usize * self.width as usize + x as usize) * 4;
            self.pixels[d..d + w * 4].copy_from_slice(&src.pixels[s..s + w * 4]);
        }
    }

    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<(), AssetError> {
        let buffer = image::RgbaImage::from_raw(self.width, self.height, self.pixels.clone())
            .ok_or(AssetError::InvalidDimensions {
                width: self.width,
                height: self.height,
                len: self.pixels.len(),
            })?;
        buffer.save_with_format(path.as_ref(), image::ImageFormat::Png)?;
        tracing::debug!(path = %path.as_ref().display(), "image written");
        Ok(())
    }
}
