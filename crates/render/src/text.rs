//! Text shaping and glyph atlas layout.
//!
//! Shaping output uses 26.6 fixed point, as produced by common shaping
//! engines: divide by 64 for pixels. Glyph metrics are in pixels at the
//! atlas cell size and are scaled to the requested font size at layout time.

use crate::batch::BatchSubmission;
use glam::{Mat4, Vec2, Vec3};
use rustc_hash::FxHashMap;
use tessel_common::{Color, UvRect};

/// One positioned glyph from a shaping run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapedGlyph {
    pub glyph_id: u32,
    /// Byte offset of the source character.
    pub cluster: u32,
    pub x_advance: i32,
    pub y_advance: i32,
    pub x_offset: i32,
    pub y_offset: i32,
}

/// Pixel metrics of a rasterized glyph.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphMetrics {
    pub size: Vec2,
    /// Offset from the pen position to the bitmap's left edge and top.
    pub bearing: Vec2,
    pub advance: f32,
}

/// Shaping and glyph metrics for one font face.
pub trait TextShaper {
    fn shape(&self, text: &str, font_size: u32) -> Vec<ShapedGlyph>;

    fn glyph_metrics(&self, glyph_id: u32, font_size: u32) -> GlyphMetrics;
}

/// Fixed-pitch shaper: one glyph per `char`, glyph id is the code point.
#[derive(Debug, Clone, Copy)]
pub struct MonospaceShaper {
    pub advance_ratio: f32,
    pub height_ratio: f32,
}

impl Default for MonospaceShaper {
    fn default() -> Self {
        Self {
            advance_ratio: 0.6,
            height_ratio: 0.8,
        }
    }
}

impl TextShaper for MonospaceShaper {
    fn shape(&self, text: &str, font_size: u32) -> Vec<ShapedGlyph> {
        let advance = (self.advance_ratio * font_size as f32 * 64.0).round() as i32;
        text.char_indices()
            .map(|(cluster, ch)| ShapedGlyph {
                glyph_id: ch as u32,
                cluster: cluster as u32,
                x_advance: advance,
                y_advance: 0,
                x_offset: 0,
                y_offset: 0,
            })
            .collect()
    }

    fn glyph_metrics(&self, _glyph_id: u32, font_size: u32) -> GlyphMetrics {
        let fs = font_size as f32;
        GlyphMetrics {
            size: Vec2::new(self.advance_ratio * fs, self.height_ratio * fs),
            bearing: Vec2::new(0.0, self.height_ratio * fs),
            advance: self.advance_ratio * fs,
        }
    }
}

/// A glyph's slot in the atlas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AtlasGlyph {
    pub metrics: GlyphMetrics,
    pub uv: UvRect,
    /// Top-left pixel of the cell, where the rasterizer writes the bitmap.
    pub origin: (u32, u32),
}

/// Square texture divided into a grid of `cell_size` cells, one glyph per cell.
///
/// The atlas only tracks placement; rasterized coverage is uploaded into the
/// texture registered under [`texture_key`](Self::texture_key).
#[derive(Debug, Clone)]
pub struct GlyphAtlas {
    texture_key: String,
    atlas_size: u32,
    cell_size: u32,
    glyphs: FxHashMap<u32, AtlasGlyph>,
}

impl GlyphAtlas {
    pub const DEFAULT_SIZE: u32 = 512;

    pub fn new(texture_key: impl Into<String>, cell_size: u32, atlas_size: u32) -> Self {
        assert!(
            cell_size > 0 && cell_size <= atlas_size,
            "glyph cell must fit the atlas"
        );
        Self {
            texture_key: texture_key.into(),
            atlas_size,
            cell_size,
            glyphs: FxHashMap::default(),
        }
    }

    pub fn texture_key(&self) -> &str {
        &self.texture_key
    }

    pub fn cell_size(&self) -> u32 {
        self.cell_size
    }

    pub fn atlas_size(&self) -> u32 {
        self.atlas_size
    }

    pub fn capacity(&self) -> usize {
        let per_row = (self.atlas_size / self.cell_size) as usize;
        per_row * per_row
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    pub fn get(&self, glyph_id: u32) -> Option<&AtlasGlyph> {
        self.glyphs.get(&glyph_id)
    }

    /// Placed glyphs in no particular order.
    pub fn glyphs(&self) -> impl Iterator<Item = (u32, &AtlasGlyph)> + '_ {
        self.glyphs.iter().map(|(&id, glyph)| (id, glyph))
    }

    /// Place `glyph_id` in the next free cell, row by row. Already placed
    /// glyphs keep their cell. `None` once the atlas is full.
    pub fn insert(&mut self, glyph_id: u32, metrics: GlyphMetrics) -> Option<AtlasGlyph> {
        if let Some(existing) = self.glyphs.get(&glyph_id) {
            return Some(*existing);
        }
        let slot = self.glyphs.len();
        if slot >= self.capacity() {
            tracing::warn!(glyph_id, atlas = %self.texture_key, "glyph atlas full");
            return None;
        }
        let per_row = (self.atlas_size / self.cell_size) as usize;
        let x = (slot % per_row) as u32 * self.cell_size;
        let y = (slot / per_row) as u32 * self.cell_size;
        let size = self.atlas_size as f32;
        let cell = self.cell_size as f32;
        let glyph = AtlasGlyph {
            metrics,
            uv: UvRect::new(
                Vec2::new(x as f32 / size, y as f32 / size),
                Vec2::new((x as f32 + cell) / size, (y as f32 + cell) / size),
            ),
            origin: (x, y),
        };
        self.glyphs.insert(glyph_id, glyph);
        Some(glyph)
    }
}

/// Lay out a shaped run as tinted quads in the space of `transform`.
///
/// The pen starts at the origin on the baseline. Glyphs missing from the
/// atlas are not drawn but still advance the pen. This departs from the
/// reference text renderer, which skipped the advance as well and so pulled
/// the rest of the run left over the gap.
pub fn layout_glyphs(
    glyphs: &[ShapedGlyph],
    atlas: &GlyphAtlas,
    font_size: u32,
    transform: Mat4,
    tint: Color,
) -> Vec<BatchSubmission> {
    let scale = font_size as f32 / atlas.cell_size() as f32;
    let mut pen = Vec2::ZERO;
    let mut out = Vec::with_capacity(glyphs.len());

    for glyph in glyphs {
        if let Some(placed) = atlas.get(glyph.glyph_id) {
            let size = placed.metrics.size * scale;
            let bearing = placed.metrics.bearing * scale;
            let x = pen.x + glyph.x_offset as f32 / 64.0 + bearing.x;
            let y = pen.y + glyph.y_offset as f32 / 64.0 - (size.y - bearing.y);
            if size.x > 0.0 && size.y > 0.0 {
                let local = Mat4::from_translation(Vec3::new(x + size.x / 2.0, y + size.y / 2.0, 0.0))
                    * Mat4::from_scale(size.extend(1.0));
                out.push(
                    BatchSubmission::quad(transform * local)
                        .with_uv(placed.uv)
                        .with_tint(tint),
                );
            }
        }
        pen.x += glyph.x_advance as f32 / 64.0;
        pen.y += glyph.y_advance as f32 / 64.0;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).abs().max_element() < 1e-4
    }

    #[test]
    fn monospace_shaping_advances_by_ratio() {
        let glyphs = MonospaceShaper::default().shape("Hé!", 10);
        assert_eq!(glyphs.len(), 3);
        assert_eq!(glyphs[0].glyph_id, 'H' as u32);
        assert_eq!(glyphs[1].cluster, 1);
        assert_eq!(glyphs[2].cluster, 3);
        assert!(glyphs.iter().all(|g| g.x_advance == 384));
    }

    #[test]
    fn monospace_metrics() {
        let m = MonospaceShaper::default().glyph_metrics('A' as u32, 48);
        assert!((m.size - Vec2::new(28.8, 38.4)).abs().max_element() < 1e-4);
        assert!((m.bearing.y - 38.4).abs() < 1e-4);
    }

    #[test]
    fn atlas_fills_row_by_row() {
        let metrics = MonospaceShaper::default().glyph_metrics(0, 16);
        let mut atlas = GlyphAtlas::new("font", 16, 64);
        assert_eq!(atlas.capacity(), 16);
        for id in 0..5 {
            atlas.insert(id, metrics).unwrap();
        }
        assert_eq!(atlas.get(3).unwrap().origin, (48, 0));
        assert_eq!(atlas.get(4).unwrap().origin, (0, 16));
        let uv = atlas.get(4).unwrap().uv;
        assert_eq!(uv.min, Vec2::new(0.0, 0.25));
        assert_eq!(uv.max, Vec2::new(0.25, 0.5));
    }

    #[test]
    fn atlas_reinsert_keeps_slot_and_stops_when_full() {
        let metrics = MonospaceShaper::default().glyph_metrics(0, 32);
        let mut atlas = GlyphAtlas::new("font", 32, 64);
        let first = atlas.insert(7, metrics).unwrap();
        assert_eq!(atlas.insert(7, metrics), Some(first));
        for id in 100..103 {
            assert!(atlas.insert(id, metrics).is_some());
        }
        assert_eq!(atlas.len(), 4);
        assert!(atlas.insert(999, metrics).is_none());
    }

    #[test]
    fn glyph_quads_sit_on_baseline_and_advance() {
        let shaper = MonospaceShaper::default();
        let mut atlas = GlyphAtlas::new("font", 10, 100);
        let glyphs = shaper.shape("ab", 10);
        for g in &glyphs {
            atlas.insert(g.glyph_id, shaper.glyph_metrics(g.glyph_id, 10));
        }
        let quads = layout_glyphs(&glyphs, &atlas, 10, Mat4::IDENTITY, Color::WHITE);
        assert_eq!(quads.len(), 2);

        // size (6, 8), bearing (0, 8): bottom-left at (0, 0), top-right at (6, 8)
        let tr = quads[0].transform.transform_point3(Vec3::new(0.5, 0.5, 0.0));
        let bl = quads[0].transform.transform_point3(Vec3::new(-0.5, -0.5, 0.0));
        assert!(approx(tr, Vec3::new(6.0, 8.0, 0.0)));
        assert!(approx(bl, Vec3::ZERO));

        let bl2 = quads[1].transform.transform_point3(Vec3::new(-0.5, -0.5, 0.0));
        assert!(approx(bl2, Vec3::new(6.0, 0.0, 0.0)));
        assert_eq!(quads[1].uv, atlas.get('b' as u32).unwrap().uv);
    }

    #[test]
    fn metrics_scale_to_requested_size() {
        let shaper = MonospaceShaper::default();
        let mut atlas = GlyphAtlas::new("font", 10, 100);
        atlas.insert('x' as u32, shaper.glyph_metrics('x' as u32, 10));
        let glyphs = shaper.shape("x", 20);
        let quads = layout_glyphs(&glyphs, &atlas, 20, Mat4::IDENTITY, Color::RED);
        let tr = quads[0].transform.transform_point3(Vec3::new(0.5, 0.5, 0.0));
        assert!(approx(tr, Vec3::new(12.0, 16.0, 0.0)));
        assert_eq!(quads[0].tint, Color::RED);
    }

    #[test]
    fn missing_glyph_is_skipped_but_advances() {
        let shaper = MonospaceShaper::default();
        let mut atlas = GlyphAtlas::new("font", 10, 100);
        atlas.insert('b' as u32, shaper.glyph_metrics('b' as u32, 10));
        let quads = layout_glyphs(&shaper.shape("ab", 10), &atlas, 10, Mat4::IDENTITY, Color::WHITE);
        assert_eq!(quads.len(), 1);
        let bl = quads[0].transform.transform_point3(Vec3::new(-0.5, -0.5, 0.0));
        assert!(approx(bl, Vec3::new(6.0, 0.0, 0.0)));
    }
}
