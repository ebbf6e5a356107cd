use std::hint::black_box;
use std::time::Instant;

use tessel_ecs::World;

#[derive(Clone, Copy)]
struct Position([f32; 2]);
#[derive(Clone, Copy)]
struct Velocity([f32; 2]);
#[derive(Clone, Copy)]
struct Marker;

/// Every entity gets a position, one in `velocity_every` a velocity and one in
/// `marker_every` a marker.
fn make_world(entity_count: usize, velocity_every: usize, marker_every: usize) -> World {
    let mut world = World::new();
    for i in 0..entity_count {
        let e = world.create_entity();
        world
            .add_component(e, Position([i as f32, 0.0]))
            .expect("entity is alive");
        if i % velocity_every == 0 {
            world
                .add_component(e, Velocity([1.0, 0.5]))
                .expect("entity is alive");
        }
        if i % marker_every == 0 {
            world.add_component(e, Marker).expect("entity is alive");
        }
    }
    world
}

fn bench_two_way(entity_count: usize, velocity_every: usize, iterations: usize) {
    let world = make_world(entity_count, velocity_every, usize::MAX);
    let start = Instant::now();
    let mut matched = 0;
    for _ in 0..iterations {
        matched = black_box(&world)
            .query::<(Position, Velocity)>()
            .map(|(_, p, v)| black_box(p.0[0] + v.0[0]))
            .count();
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;
    println!(
        "  (Position, Velocity) ({entity_count} entities, {matched} matches, {iterations} iters): {per_iter:?}/iter"
    );
}

fn bench_selective(entity_count: usize, marker_every: usize, iterations: usize) {
    let world = make_world(entity_count, 1, marker_every);
    let start = Instant::now();
    let mut matched = 0;
    for _ in 0..iterations {
        matched = black_box(&world)
            .query::<(Position, Velocity, Marker)>()
            .count();
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;
    println!(
        "  (Position, Velocity, Marker) ({entity_count} entities, {matched} matches, {iterations} iters): {per_iter:?}/iter"
    );
}

fn bench_destroy(entity_count: usize) {
    let mut world = make_world(entity_count, 2, 3);
    let entities: Vec<_> = world.entities().collect();
    let start = Instant::now();
    for e in entities {
        world.destroy_entity(black_box(e));
    }
    let elapsed = start.elapsed();
    println!("  destroy cascade ({entity_count} entities): {elapsed:?} total");
}

fn main() {
    println!("=== ECS Query Benchmarks ===\n");

    println!("Two-way intersection:");
    bench_two_way(1_000, 2, 1000);
    bench_two_way(10_000, 2, 100);
    bench_two_way(100_000, 10, 10);

    println!("\nSelective three-way (anchored on smallest store):");
    bench_selective(10_000, 100, 1000);
    bench_selective(100_000, 1000, 100);

    println!("\nDestroy:");
    bench_destroy(10_000);
    bench_destroy(100_000);

    println!("\n=== Done ===");
}
