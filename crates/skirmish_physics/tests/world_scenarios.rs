//! # World Scenario Integration Test
//!
//! Grid round-trips, directional detection, resolution and the wall-contact
//! scenario, driven through the public world API.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use skirmish_core::{EntityManager, Group, GroupMask};
use skirmish_physics::{Aabb, BodyDesc, BodyId, BodyKind, Vec2f, Vec2i, World, WorldConfig};

const SOLID: Group = Group::new(0);
const PLAYER: Group = Group::new(1);
const ENEMY: Group = Group::new(2);
const PLATE: Group = Group::new(3);
const DEBRIS: Group = Group::new(4);

/// Frame time used by every scenario.
const DT: f32 = 1.0 / 60.0;

fn world() -> World {
    World::new(WorldConfig::default()).unwrap()
}

/// Records every (detector, other) pair a body's handler sees.
fn record(world: &mut World, id: BodyId) -> Rc<RefCell<Vec<BodyId>>> {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let log = Rc::clone(&seen);
    world.on_detection(id, move |info, _| log.borrow_mut().push(info.other));
    seen
}

/// Test: a body is always found in its own bounds and never after leaving.
#[test]
fn test_spatial_round_trip() {
    let mut world = world();
    let desc = BodyDesc::new(Vec2i::new(-1250, 3999), Vec2i::new(750, 1));
    let id = world.create_body(desc).unwrap();

    let bounds = *world.body(id).unwrap().shape();
    assert!(world.query_region(bounds).any(|found| found == id));

    assert!(world.set_position(id, Vec2i::new(20_000, 20_000)));
    assert!(world.query_region(bounds).all(|found| found != id));

    let moved = *world.body(id).unwrap().shape();
    assert_eq!(world.query_region(moved).collect::<Vec<_>>(), vec![id]);
}

/// Test: A checks B, B does not check A. Only A hears about it.
#[test]
fn test_detection_is_directional() {
    let mut world = world();
    let mut entities = EntityManager::default();

    let hunter = world
        .create_body(
            BodyDesc::new(Vec2i::new(500, 500), Vec2i::new(200, 200))
                .dynamic()
                .group(ENEMY.mask())
                .check(PLAYER.mask()),
        )
        .unwrap();
    let player = world
        .create_body(
            BodyDesc::new(Vec2i::new(600, 500), Vec2i::new(200, 200))
                .dynamic()
                .group(PLAYER.mask())
                .check(SOLID.mask()),
        )
        .unwrap();

    let hunter_log = record(&mut world, hunter);
    let player_log = record(&mut world, player);

    assert_eq!(world.update(DT, &mut entities), 1);
    assert_eq!(*hunter_log.borrow(), vec![player]);
    assert!(player_log.borrow().is_empty());
}

/// Test: a target that checks the mover hears about it whatever the mover
/// itself checks, including nothing.
#[test]
fn test_checking_target_hears_any_mover() {
    for mover_check in [DEBRIS.mask(), GroupMask::NONE] {
        let mut world = world();
        let mut entities = EntityManager::default();

        let plate = world
            .create_body(
                BodyDesc::new(Vec2i::new(500, 500), Vec2i::new(400, 400))
                    .group(PLATE.mask())
                    .check(PLAYER.mask()),
            )
            .unwrap();
        let walker = world
            .create_body(
                BodyDesc::new(Vec2i::new(600, 500), Vec2i::new(200, 200))
                    .dynamic()
                    .group(PLAYER.mask())
                    .check(mover_check),
            )
            .unwrap();
        let plate_log = record(&mut world, plate);
        let walker_log = record(&mut world, walker);

        for _ in 0..2 {
            world.update(DT, &mut entities);
        }
        assert_eq!(*plate_log.borrow(), vec![walker, walker], "walker checks {mover_check:?}");
        assert!(walker_log.borrow().is_empty());
    }
}

/// Test: a pair first reported from the other body's pass still reports the
/// push applied in the detector's own pass.
#[test]
fn test_resolution_flag_when_pair_reported_early() {
    let mut world = world();
    let mut entities = EntityManager::default();

    // Created first, so its pass runs first; it does not check the slime
    let block = world
        .create_body(
            BodyDesc::new(Vec2i::new(0, 0), Vec2i::new(500, 500))
                .dynamic()
                .group(SOLID.mask())
                .check(DEBRIS.mask())
                .resolve(true),
        )
        .unwrap();
    let slime = world
        .create_body(
            BodyDesc::new(Vec2i::new(-650, 0), Vec2i::new(200, 200))
                .dynamic()
                .group(ENEMY.mask())
                .check(SOLID.mask())
                .resolve(true),
        )
        .unwrap();

    let seen = Rc::new(RefCell::new(Vec::new()));
    let log = Rc::clone(&seen);
    world.on_detection(slime, move |info, _| {
        log.borrow_mut().push((info.other, info.resolved, info.penetration));
    });

    world.step(DT);
    assert_eq!(world.pending_detections().len(), 1);
    world.dispatch_detections(&mut entities);

    assert_eq!(*seen.borrow(), vec![(block, true, Vec2i::new(-50, 0))]);
    assert_eq!(world.body(slime).unwrap().position(), Vec2i::new(-700, 0));
    assert_eq!(world.body(block).unwrap().position(), Vec2i::ZERO);
}

/// Test: mutual checks fire each direction once per tick.
#[test]
fn test_mutual_detection_fires_once_per_direction() {
    let mut world = world();
    let mut entities = EntityManager::default();

    let a = world
        .create_body(
            BodyDesc::new(Vec2i::new(500, 500), Vec2i::new(900, 100))
                .dynamic()
                .group(PLAYER.mask())
                .check(ENEMY.mask()),
        )
        .unwrap();
    let b = world
        .create_body(
            BodyDesc::new(Vec2i::new(700, 500), Vec2i::new(900, 100))
                .dynamic()
                .group(ENEMY.mask())
                .check(PLAYER.mask()),
        )
        .unwrap();
    let a_log = record(&mut world, a);
    let b_log = record(&mut world, b);

    for _ in 0..3 {
        world.update(DT, &mut entities);
    }
    assert_eq!(*a_log.borrow(), vec![b, b, b]);
    assert_eq!(*b_log.borrow(), vec![a, a, a]);
}

/// Test: one resolution pass removes the penetration; a second is a no-op.
#[test]
fn test_resolution_is_idempotent() {
    let mut world = world();
    let mut entities = EntityManager::default();

    let wall = world
        .create_body(
            BodyDesc::new(Vec2i::new(0, 0), Vec2i::new(500, 500))
                .group(SOLID.mask())
                .resolve(true),
        )
        .unwrap();
    let crate_box = world
        .create_body(
            BodyDesc::new(Vec2i::new(-820, 100), Vec2i::new(400, 400))
                .dynamic()
                .check(SOLID.mask())
                .resolve(true),
        )
        .unwrap();

    world.update(DT, &mut entities);
    let after_first = *world.body(crate_box).unwrap().shape();
    let wall_shape = *world.body(wall).unwrap().shape();
    assert!(!after_first.overlaps(&wall_shape));
    assert_eq!(after_first.right(), wall_shape.left());
    assert_eq!(after_first.min_penetration(&wall_shape), None);

    world.step(DT);
    assert!(world.pending_detections().is_empty());
    assert_eq!(*world.body(crate_box).unwrap().shape(), after_first);
}

/// Test: a body driven into a tile wall stops flush against its left edge.
///
/// Tile (5, 5) is 10x10 pixels centered on (55, 55); at 100 units per pixel
/// that is center (5500, 5500) with half extent 500.
#[test]
fn test_player_stops_at_wall() {
    let mut world = world();
    let mut entities = EntityManager::default();
    let units = world.config().units_per_pixel;

    let tile_center = world.to_coords(Vec2f::new(55.0, 55.0));
    let wall = world
        .create_body(
            BodyDesc::new(tile_center, Vec2i::new(5 * units, 5 * units))
                .group(SOLID.mask())
                .resolve(true),
        )
        .unwrap();
    let player = world
        .create_body(
            BodyDesc::new(Vec2i::new(1500, 5500), Vec2i::new(400, 400))
                .dynamic()
                .group(PLAYER.mask())
                .check(SOLID.mask())
                .resolve(true)
                .velocity(world.to_coords(Vec2f::new(50.0, 0.0)).into()),
        )
        .unwrap();

    let contacts = record(&mut world, player);
    for _ in 0..120 {
        world.update(DT, &mut entities);
    }

    let body = world.body(player).unwrap();
    let wall_left = world.body(wall).unwrap().shape().left();
    assert_eq!(wall_left, 5000);
    assert_eq!(body.position().x, wall_left - 400);
    assert_eq!(body.position().y, 5500);
    assert_eq!(body.velocity().x, 0.0);
    assert_eq!(contacts.borrow().first(), Some(&wall));
    assert!((world.to_pixels(body.position()).x - 46.0).abs() < f32::EPSILON);
}

/// Test: distance queries see bodies move in and out of range.
#[test]
fn test_distance_query_follows_movement() {
    let mut world = world();
    let mut entities = EntityManager::default();
    let plate_center = Vec2i::new(3000, 3000);

    let walker = world
        .create_body(
            BodyDesc::new(Vec2i::new(1000, 3000), Vec2i::new(100, 100))
                .dynamic()
                .velocity(Vec2f::new(6000.0, 0.0)),
        )
        .unwrap();

    assert_eq!(world.query_distance(plate_center, 500).count(), 0);
    for _ in 0..20 {
        world.update(DT, &mut entities);
    }
    // 20 ticks at 100 units per tick
    assert_eq!(world.body(walker).unwrap().position().x, 3000);
    assert_eq!(world.query_distance(plate_center, 500).collect::<Vec<_>>(), vec![walker]);

    for _ in 0..10 {
        world.update(DT, &mut entities);
    }
    assert_eq!(world.query_distance(plate_center, 500).count(), 0);
}

/// Test: dense random overlap keeps the grid and the event buffer consistent.
#[test]
fn test_dense_overlap_invariants() {
    let mut rng = ChaCha8Rng::seed_from_u64(0x5EED);
    let mut world = world();
    let mut entities = EntityManager::default();

    for _ in 0..20 {
        let center = Vec2i::new(rng.gen_range(0..10_000), rng.gen_range(0..10_000));
        world
            .create_body(
                BodyDesc::new(center, Vec2i::new(500, 500))
                    .group(SOLID.mask())
                    .resolve(true),
            )
            .unwrap();
    }
    for i in 0..200 {
        let center = Vec2i::new(rng.gen_range(0..10_000), rng.gen_range(0..10_000));
        let velocity = Vec2f::new(rng.gen_range(-3000.0..3000.0), rng.gen_range(-3000.0..3000.0));
        let kind = if i % 10 == 0 { BodyKind::Sensor } else { BodyKind::Dynamic };
        world
            .create_body(
                BodyDesc::new(center, Vec2i::new(rng.gen_range(50..400), rng.gen_range(50..400)))
                    .kind(kind)
                    .group(PLAYER.mask())
                    .check(SOLID | PLAYER)
                    .resolve(true)
                    .velocity(velocity),
            )
            .unwrap();
    }

    for _ in 0..30 {
        world.step(DT);

        let mut pairs = HashSet::new();
        for info in world.pending_detections() {
            assert!(pairs.insert((info.body, info.other)), "pair fired twice");
            let detector = world.body(info.body).unwrap();
            assert!(detector.check_mask().intersects(info.other_group));
        }
        world.dispatch_detections(&mut entities);
        world.reclaim(&entities);

        for body in world.iter() {
            let bounds: Aabb = *body.shape();
            assert!(
                world.query_region(bounds).any(|found| found == body.id()),
                "{} lost from the grid",
                body.id()
            );
        }
    }

    assert_eq!(world.stats().bodies, 220);
    assert_eq!(world.stats().sensors, 20);
}
