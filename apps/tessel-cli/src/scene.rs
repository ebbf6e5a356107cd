//! Bouncing-sprite demo scene shared by the `batch` and `render` commands.

use anyhow::{Context, bail};
use glam::Vec2;
use std::f32::consts::TAU;
use tessel_assets::ImageData;
use tessel_common::{Color, Transform2D};
use tessel_ecs::{Entity, World};
use tessel_input::{Key, Keyboard};
use tessel_render::text::GlyphAtlas;
use tessel_render::{Animation, AnimationFrame, AnimationState, Sprite};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Velocity(pub Vec2);

/// Radians per second.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationSpeed(pub f32);

/// Deterministic splitmix64 stream, so a seed always builds the same scene.
#[derive(Debug, Clone)]
pub struct SceneRng {
    state: u64,
}

impl SceneRng {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9e37_79b9_7f4a_7c15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        z ^ (z >> 31)
    }

    /// Uniform in `[0, 1)`.
    pub fn next_f32(&mut self) -> f32 {
        (self.next_u64() >> 40) as f32 / (1u64 << 24) as f32
    }

    pub fn range(&mut self, min: f32, max: f32) -> f32 {
        min + (max - min) * self.next_f32()
    }
}

#[derive(Debug, Clone)]
pub struct SceneConfig {
    pub sprites: usize,
    pub bounds: Vec2,
    pub seed: u64,
    pub textures: Vec<String>,
    /// Every `animate_every`th sprite cycles through the textures. 0 disables.
    pub animate_every: usize,
}

/// Spawn the bouncing sprites. Texture keys are assigned round-robin.
pub fn spawn_sprites(world: &mut World, config: &SceneConfig) -> anyhow::Result<Vec<Entity>> {
    if config.textures.is_empty() {
        bail!("scene needs at least one texture");
    }
    let mut rng = SceneRng::new(config.seed);
    let speed = config.bounds.min_element() * 0.25;
    let mut spawned = Vec::with_capacity(config.sprites);

    for i in 0..config.sprites {
        let position = Vec2::new(
            rng.range(0.0, config.bounds.x),
            rng.range(0.0, config.bounds.y),
        );
        let velocity = Vec2::new(rng.range(-speed, speed), rng.range(-speed, speed));
        let size = rng.range(0.02, 0.07) * config.bounds.min_element();
        let tint = Color::rgb(
            128 + (rng.next_u64() % 128) as u8,
            128 + (rng.next_u64() % 128) as u8,
            128 + (rng.next_u64() % 128) as u8,
        );

        let entity = world.create_entity();
        let texture = &config.textures[i % config.textures.len()];
        world.add_component(
            entity,
            Transform2D::new(position, rng.range(0.0, TAU), Vec2::splat(size)),
        )?;
        world.add_component(entity, Velocity(velocity))?;
        world.add_component(entity, RotationSpeed(rng.range(-1.0, 1.0)))?;
        world.add_component(entity, Sprite::new(texture.clone()).with_tint(tint))?;

        if config.animate_every > 0 && i % config.animate_every == 0 {
            let frames = config
                .textures
                .iter()
                .map(|t| AnimationFrame::new(t.clone(), 0.25))
                .collect();
            world.add_component(entity, Animation::new(frames, true)?)?;
            world.add_component(entity, AnimationState::default())?;
        }
        spawned.push(entity);
    }
    tracing::info!(sprites = spawned.len(), seed = config.seed, "scene spawned");
    Ok(spawned)
}

/// Integrates velocity and spin, bouncing off the `[0, bounds]` box.
#[derive(Debug, Clone, Copy)]
pub struct PhysicsSystem {
    pub bounds: Vec2,
}

impl PhysicsSystem {
    pub fn update(&self, world: &mut World, dt: f32) {
        let moving: Vec<Entity> = world
            .query::<(Transform2D, Velocity, RotationSpeed)>()
            .map(|(entity, ..)| entity)
            .collect();

        for entity in moving {
            let Some(&RotationSpeed(spin)) = world.try_get::<RotationSpeed>(entity) else {
                continue;
            };
            let Some(&Velocity(mut v)) = world.try_get::<Velocity>(entity) else {
                continue;
            };
            let mut position = Vec2::ZERO;
            let bounds = self.bounds;
            world.update::<Transform2D>(entity, |t| {
                t.position += v * dt;
                t.rotation += spin * dt;
                if t.position.x < 0.0 || t.position.x > bounds.x {
                    v.x = -v.x;
                    t.position.x = t.position.x.clamp(0.0, bounds.x);
                }
                if t.position.y < 0.0 || t.position.y > bounds.y {
                    v.y = -v.y;
                    t.position.y = t.position.y.clamp(0.0, bounds.y);
                }
                position = t.position;
            });
            world.update::<Velocity>(entity, |vel| vel.0 = v);
            tracing::trace!(%entity, x = position.x, y = position.y, "moved");
        }
    }
}

/// Keys tapped on given frames, parsed from `frame:key` pairs such as `3:space,10:escape`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeyScript {
    taps: Vec<(usize, Key)>,
}

impl KeyScript {
    pub fn parse(script: &str) -> anyhow::Result<Self> {
        let mut taps = Vec::new();
        for entry in script.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (frame, key) = entry
                .split_once(':')
                .with_context(|| format!("expected frame:key, got {entry:?}"))?;
            let frame: usize = frame
                .trim()
                .parse()
                .with_context(|| format!("bad frame number in {entry:?}"))?;
            taps.push((frame, key.trim().parse::<Key>()?));
        }
        taps.sort_by_key(|&(frame, _)| frame);
        Ok(Self { taps })
    }

    pub fn taps_at(&self, frame: usize) -> impl Iterator<Item = Key> + '_ {
        self.taps
            .iter()
            .filter(move |&&(f, _)| f == frame)
            .map(|&(_, key)| key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemoAction {
    ToggleBatching,
    Quit,
}

/// Space toggles batching, Escape quits.
pub fn demo_keyboard() -> Keyboard<DemoAction> {
    let mut keyboard = Keyboard::new();
    keyboard.bind_down(Key::Space, DemoAction::ToggleBatching);
    keyboard.bind_down(Key::Escape, DemoAction::Quit);
    keyboard
}

/// Rasterize every placed glyph as a solid block filling its atlas cell.
///
/// Stands in for a font rasterizer. Glyph quads sample their whole cell, so
/// each block leaves the last texel column empty to keep neighbours apart.
/// Covered texels are white so the text tint shows through unchanged.
pub fn rasterize_block_atlas(atlas: &GlyphAtlas) -> ImageData {
    let size = atlas.atlas_size();
    let cell = atlas.cell_size();
    let mut image = ImageData::solid(size, size, Color::TRANSPARENT);
    let block = ImageData::solid(cell.saturating_sub(1).max(1), cell, Color::WHITE);
    for (glyph_id, glyph) in atlas.glyphs() {
        if char::from_u32(glyph_id).is_some_and(char::is_whitespace) {
            continue;
        }
        let (x, y) = glyph.origin;
        image.blit(&block, x, y);
    }
    image
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(sprites: usize) -> SceneConfig {
        SceneConfig {
            sprites,
            bounds: Vec2::new(640.0, 480.0),
            seed: 42,
            textures: vec!["a".into(), "b".into()],
            animate_every: 0,
        }
    }

    #[test]
    fn rng_is_deterministic_and_bounded() {
        let mut a = SceneRng::new(7);
        let mut b = SceneRng::new(7);
        for _ in 0..100 {
            let x = a.next_f32();
            assert_eq!(x, b.next_f32());
            assert!((0.0..1.0).contains(&x));
        }
        assert_ne!(SceneRng::new(1).next_u64(), SceneRng::new(2).next_u64());
    }

    #[test]
    fn spawn_assigns_textures_round_robin() {
        let mut world = World::new();
        let entities = spawn_sprites(&mut world, &config(5)).unwrap();
        assert_eq!(entities.len(), 5);
        let textures: Vec<_> = entities
            .iter()
            .map(|&e| world.get::<Sprite>(e).unwrap().texture.clone())
            .collect();
        assert_eq!(textures, vec!["a", "b", "a", "b", "a"]);
        assert_eq!(world.query::<(Transform2D, Velocity, RotationSpeed)>().count(), 5);
    }

    #[test]
    fn same_seed_same_scene() {
        let mut w1 = World::new();
        let mut w2 = World::new();
        let e1 = spawn_sprites(&mut w1, &config(3)).unwrap();
        let e2 = spawn_sprites(&mut w2, &config(3)).unwrap();
        for (a, b) in e1.into_iter().zip(e2) {
            assert_eq!(w1.get::<Transform2D>(a).unwrap(), w2.get::<Transform2D>(b).unwrap());
        }
    }

    #[test]
    fn animated_sprites_get_state() {
        let mut world = World::new();
        let cfg = SceneConfig {
            animate_every: 2,
            ..config(5)
        };
        spawn_sprites(&mut world, &cfg).unwrap();
        assert_eq!(world.query::<(Animation, AnimationState)>().count(), 3);
    }

    #[test]
    fn empty_texture_list_is_rejected() {
        let mut world = World::new();
        let cfg = SceneConfig {
            textures: vec![],
            ..config(1)
        };
        assert!(spawn_sprites(&mut world, &cfg).is_err());
    }

    #[test]
    fn physics_bounces_off_both_walls() {
        let mut world = World::new();
        let e = world.create_entity();
        world
            .add_component(e, Transform2D::from_position(Vec2::new(99.0, 1.0)))
            .unwrap();
        world.add_component(e, Velocity(Vec2::new(100.0, -100.0))).unwrap();
        world.add_component(e, RotationSpeed(2.0)).unwrap();

        let physics = PhysicsSystem {
            bounds: Vec2::new(100.0, 100.0),
        };
        physics.update(&mut world, 0.1);

        let t = world.get::<Transform2D>(e).unwrap();
        assert_eq!(t.position, Vec2::new(100.0, 0.0));
        assert!((t.rotation - 0.2).abs() < 1e-6);
        assert_eq!(world.get::<Velocity>(e).unwrap().0, Vec2::new(-100.0, 100.0));
    }

    #[test]
    fn demo_keyboard_fires_on_press_edge() {
        let mut keyboard = demo_keyboard();
        assert_eq!(keyboard.press(Key::Space), Some(DemoAction::ToggleBatching));
        assert_eq!(keyboard.press(Key::Space), None);
        keyboard.release(Key::Space);
        assert_eq!(keyboard.press(Key::Space), Some(DemoAction::ToggleBatching));
        assert_eq!(keyboard.press(Key::Escape), Some(DemoAction::Quit));
        assert_eq!(keyboard.press(Key::A), None);
    }

    #[test]
    fn block_atlas_covers_glyph_cells() {
        use tessel_render::text::{MonospaceShaper, TextShaper};

        let shaper = MonospaceShaper::default();
        let mut atlas = GlyphAtlas::new("font", 10, 40);
        atlas.insert('A' as u32, shaper.glyph_metrics('A' as u32, 10));
        atlas.insert(' ' as u32, shaper.glyph_metrics(' ' as u32, 10));
        let image = rasterize_block_atlas(&atlas);
        assert_eq!((image.width, image.height), (40, 40));

        // 'A' fills cell (0, 0) but its last column; the space in cell (10, 0) stays empty.
        assert_eq!(image.pixel(0, 0), Some(Color::WHITE));
        assert_eq!(image.pixel(8, 9), Some(Color::WHITE));
        assert_eq!(image.pixel(9, 5), Some(Color::TRANSPARENT));
        assert_eq!(image.pixel(12, 5), Some(Color::TRANSPARENT));
        assert_eq!(image.pixel(0, 12), Some(Color::TRANSPARENT));
    }

    #[test]
    fn key_script_parses_and_filters_by_frame() {
        let script = KeyScript::parse("10:escape, 3:space,3:w").unwrap();
        assert_eq!(script.taps_at(3).collect::<Vec<_>>(), vec![Key::Space, Key::W]);
        assert_eq!(script.taps_at(10).collect::<Vec<_>>(), vec![Key::Escape]);
        assert_eq!(script.taps_at(4).count(), 0);
        assert_eq!(KeyScript::parse("").unwrap(), KeyScript::default());
        assert!(KeyScript::parse("space").is_err());
        assert!(KeyScript::parse("x:space").is_err());
        assert!(KeyScript::parse("1:hyper").is_err());
    }
}
