use crate::batch::{BatchSubmission, QuadSink};
use crate::components::{Animation, AnimationState, Sprite, Text};
use crate::text::{GlyphAtlas, TextShaper, layout_glyphs};
use tessel_common::Transform2D;
use tessel_ecs::{Entity, World};

/// Submits one quad per entity holding a `Sprite` and a `Transform2D`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SpriteRenderSystem;

impl SpriteRenderSystem {
    /// Returns the number of quads submitted.
    pub fn run(&self, world: &World, sink: &mut impl QuadSink) -> usize {
        let mut submitted = 0;
        for (_, sprite, transform) in world.query::<(Sprite, Transform2D)>() {
            sink.submit(
                &sprite.texture,
                BatchSubmission::quad(transform.matrix())
                    .with_uv(sprite.uv)
                    .with_tint(sprite.tint),
            );
            submitted += 1;
        }
        submitted
    }
}

/// Shapes every `Text` and submits its glyphs against the atlas texture.
///
/// Glyphs are added to the atlas the first time they are seen. Expects a
/// renderer configured with the tinted vertex layout.
#[derive(Debug)]
pub struct TextRenderSystem<S: TextShaper> {
    shaper: S,
    atlas: GlyphAtlas,
}

impl<S: TextShaper> TextRenderSystem<S> {
    pub fn new(shaper: S, atlas: GlyphAtlas) -> Self {
        Self { shaper, atlas }
    }

    pub fn atlas(&self) -> &GlyphAtlas {
        &self.atlas
    }

    /// Returns the number of glyph quads submitted.
    pub fn run(&mut self, world: &World, sink: &mut impl QuadSink) -> usize {
        let mut submitted = 0;
        for (_, text, transform) in world.query::<(Text, Transform2D)>() {
            if text.content.is_empty() {
                continue;
            }
            let glyphs = self.shaper.shape(&text.content, text.font_size);
            for glyph in &glyphs {
                if self.atlas.get(glyph.glyph_id).is_none() {
                    let metrics = self
                        .shaper
                        .glyph_metrics(glyph.glyph_id, self.atlas.cell_size());
                    self.atlas.insert(glyph.glyph_id, metrics);
                }
            }
            let quads = layout_glyphs(
                &glyphs,
                &self.atlas,
                text.font_size,
                transform.matrix(),
                text.color,
            );
            for quad in quads {
                sink.submit(self.atlas.texture_key(), quad);
                submitted += 1;
            }
        }
        submitted
    }
}

/// Advances flip-book animations and swaps the sprite texture on frame change.
#[derive(Debug, Default, Clone, Copy)]
pub struct AnimationSystem;

impl AnimationSystem {
    /// Step every animated entity by `dt` seconds. Returns how many sprites changed texture.
    pub fn update(&self, world: &mut World, dt: f32) -> usize {
        let mut changes: Vec<(Entity, AnimationState, Option<String>)> = Vec::new();
        for (entity, animation, state) in world.query::<(Animation, AnimationState)>() {
            let next = advance(animation, state, dt);
            if next == *state {
                continue;
            }
            let texture = (next.frame_index != state.frame_index)
                .then(|| animation.frames()[next.frame_index].texture.clone());
            changes.push((entity, next, texture));
        }

        let mut swapped = 0;
        for (entity, next, texture) in changes {
            world.update::<AnimationState>(entity, |state| *state = next);
            let Some(texture) = texture else { continue };
            let updated = world.update::<Sprite>(entity, |sprite| sprite.texture = texture.clone());
            if !updated {
                if let Err(err) = world.add_component(entity, Sprite::new(texture)) {
                    tracing::warn!(%err, "animated sprite not attached");
                    continue;
                }
            }
            swapped += 1;
        }
        swapped
    }
}

/// Pure playback step. Finished animations do not move.
///
/// Looping playback first wraps the position into a single cycle, so the
/// frame walk below takes at most one pass over the frames for any `dt`.
pub fn advance(animation: &Animation, state: &AnimationState, dt: f32) -> AnimationState {
    if state.finished && !animation.is_looping() {
        return *state;
    }
    let frames = animation.frames();
    let last = frames.len() - 1;
    let mut next = *state;
    next.frame_index = next.frame_index.min(last);
    next.elapsed += dt;

    if animation.is_looping() {
        let total = animation.total_duration();
        let into_cycle = frames[..next.frame_index]
            .iter()
            .map(|f| f.duration)
            .sum::<f32>()
            + next.elapsed;
        if into_cycle >= total {
            next.frame_index = 0;
            next.elapsed = into_cycle % total;
        }
    }

    while next.elapsed >= frames[next.frame_index].duration {
        next.elapsed -= frames[next.frame_index].duration;
        if next.frame_index < last {
            next.frame_index += 1;
        } else if animation.is_looping() {
            next.frame_index = 0;
        } else {
            next.finished = true;
            break;
        }
    }
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::BatchAccumulator;
    use crate::components::AnimationFrame;
    use crate::text::MonospaceShaper;
    use glam::Vec2;
    use tessel_common::Color;

    fn walk(looping: bool) -> Animation {
        Animation::new(
            vec![
                AnimationFrame::new("walk_0", 0.1),
                AnimationFrame::new("walk_1", 0.1),
                AnimationFrame::new("walk_2", 0.2),
            ],
            looping,
        )
        .unwrap()
    }

    #[test]
    fn sprite_system_groups_by_texture() {
        let mut world = World::new();
        for (i, tex) in ["tex1", "tex2", "tex1"].into_iter().enumerate() {
            let e = world.create_entity();
            world.add_component(e, Sprite::new(tex)).unwrap();
            world
                .add_component(e, Transform2D::from_position(Vec2::new(i as f32, 0.0)))
                .unwrap();
        }
        let bare = world.create_entity();
        world.add_component(bare, Sprite::new("tex3")).unwrap();

        let mut acc = BatchAccumulator::new();
        acc.begin_frame();
        assert_eq!(SpriteRenderSystem.run(&world, &mut acc), 3);
        let groups = acc.end_frame();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].submissions.len() + groups[1].submissions.len(), 3);
    }

    #[test]
    fn text_system_submits_visible_glyphs_to_atlas_texture() {
        let mut world = World::new();
        let e = world.create_entity();
        world
            .add_component(e, Text::new("hi").with_size(24).with_color(Color::BLUE))
            .unwrap();
        world.add_component(e, Transform2D::default()).unwrap();
        let empty = world.create_entity();
        world.add_component(empty, Text::new("")).unwrap();
        world.add_component(empty, Transform2D::default()).unwrap();

        let mut system =
            TextRenderSystem::new(MonospaceShaper::default(), GlyphAtlas::new("font", 48, 512));
        let mut acc = BatchAccumulator::new();
        acc.begin_frame();
        assert_eq!(system.run(&world, &mut acc), 2);
        let groups = acc.end_frame();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].key, "font");
        assert!(groups[0].submissions.iter().all(|s| s.tint == Color::BLUE));
        assert_eq!(system.atlas().len(), 2);
    }

    #[test]
    fn advance_steps_through_frames() {
        let anim = walk(true);
        let s = advance(&anim, &AnimationState::default(), 0.05);
        assert_eq!((s.frame_index, s.finished), (0, false));
        let s = advance(&anim, &s, 0.06);
        assert_eq!(s.frame_index, 1);
        assert!((s.elapsed - 0.01).abs() < 1e-5);
    }

    #[test]
    fn large_step_skips_frames_and_loops() {
        let anim = walk(true);
        let s = advance(&anim, &AnimationState::default(), 0.45);
        assert_eq!(s.frame_index, 0);
        assert!(!s.finished);
        assert!((s.elapsed - 0.05).abs() < 1e-5);
    }

    #[test]
    fn huge_step_wraps_looping_playback() {
        let anim = Animation::new(
            vec![AnimationFrame::new("a", 0.1), AnimationFrame::new("b", 0.1)],
            true,
        )
        .unwrap();
        let s = advance(&anim, &AnimationState::default(), 1.0e8);
        assert!(s.frame_index < 2);
        assert!(!s.finished);
        assert!(s.elapsed >= 0.0 && s.elapsed < 0.1 + 1e-5);

        let s = advance(&walk(true), &s, f32::MAX);
        assert!(s.frame_index < 3);
        assert!(s.elapsed.is_finite());
    }

    #[test]
    fn non_looping_stops_on_last_frame() {
        let anim = walk(false);
        let s = advance(&anim, &AnimationState::default(), 1.0);
        assert_eq!(s.frame_index, 2);
        assert!(s.finished);
        assert_eq!(advance(&anim, &s, 5.0), s);
    }

    #[test]
    fn out_of_range_index_is_clamped() {
        let anim = walk(true);
        let state = AnimationState {
            frame_index: 9,
            ..Default::default()
        };
        assert_eq!(advance(&anim, &state, 0.0).frame_index, 2);
    }

    #[test]
    fn system_swaps_texture_only_on_frame_change() {
        let mut world = World::new();
        let e = world.create_entity();
        world.add_component(e, walk(true)).unwrap();
        world.add_component(e, AnimationState::default()).unwrap();
        world.add_component(e, Sprite::new("walk_0")).unwrap();

        assert_eq!(AnimationSystem.update(&mut world, 0.05), 0);
        assert_eq!(world.try_get::<Sprite>(e).unwrap().texture, "walk_0");
        assert_eq!(AnimationSystem.update(&mut world, 0.05), 1);
        assert_eq!(world.try_get::<Sprite>(e).unwrap().texture, "walk_1");
        assert_eq!(world.try_get::<AnimationState>(e).unwrap().frame_index, 1);
    }

    #[test]
    fn system_attaches_sprite_when_missing() {
        let mut world = World::new();
        let e = world.create_entity();
        world.add_component(e, walk(false)).unwrap();
        world.add_component(e, AnimationState::default()).unwrap();

        assert_eq!(AnimationSystem.update(&mut world, 0.1), 1);
        assert_eq!(world.try_get::<Sprite>(e).unwrap().texture, "walk_1");
    }
}
