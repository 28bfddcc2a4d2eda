//! # Arena
//!
//! Headless demo of the simulation driver. Builds a walled tile room with a
//! patrolling player, a pressure plate, bouncing slimes and a spike trap,
//! runs it for ten simulated seconds and logs frame statistics.
//!
//! ```bash
//! # Default configuration
//! cargo run --bin arena
//!
//! # Custom configuration, verbose
//! RUST_LOG=skirmish=trace cargo run --bin arena -- arena.toml
//! ```

use std::process::ExitCode;

use skirmish::ecs::{Component, Group};
use skirmish::physics::{BodyDesc, BodyRef, Vec2f, Vec2i, World};
use skirmish::{Simulation, SimulationConfig, SimulationResult, SystemContext};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const SOLID: Group = Group::new(0);
const PLAYER: Group = Group::new(1);
const ENEMY: Group = Group::new(2);
const TRIGGER: Group = Group::new(3);

/// Room size in tiles, border included.
const ROOM_WIDTH: i32 = 16;
const ROOM_HEIGHT: i32 = 12;
/// Tile edge in pixels.
const TILE_PIXELS: f32 = 10.0;

const DT: f32 = 1.0 / 60.0;
const FRAMES: u64 = 600;
/// Player changes heading every this many frames.
const PATROL_LEG: u64 = 90;
const SLIME_SPEED: f32 = 3000.0;

struct Player {
    speed: f32,
}
impl Component for Player {}

struct Plate {
    pressed_ticks: u32,
}
impl Component for Plate {}

struct Slime {
    speed: f32,
}
impl Component for Slime {}

struct Spikes {
    kills: u32,
}
impl Component for Spikes {}

/// Center of tile `(x, y)` in world coordinates.
fn tile_center(world: &World, x: i32, y: i32) -> Vec2i {
    world.to_coords(Vec2f::new(
        (x as f32 + 0.5) * TILE_PIXELS,
        (y as f32 + 0.5) * TILE_PIXELS,
    ))
}

fn tile_half(world: &World) -> Vec2i {
    world.to_coords(Vec2f::new(TILE_PIXELS / 2.0, TILE_PIXELS / 2.0))
}

fn build_walls(sim: &mut Simulation) -> SimulationResult<()> {
    let world = sim.world_mut();
    let half = tile_half(world);
    for y in 0..ROOM_HEIGHT {
        for x in 0..ROOM_WIDTH {
            let border = x == 0 || y == 0 || x == ROOM_WIDTH - 1 || y == ROOM_HEIGHT - 1;
            if !border {
                continue;
            }
            let center = tile_center(world, x, y);
            world.create_body(BodyDesc::new(center, half).group(SOLID.mask()).resolve(true))?;
        }
    }
    Ok(())
}

fn spawn_player(sim: &mut Simulation) -> SimulationResult<()> {
    let (entities, world) = sim.parts_mut();
    let player = entities.spawn(Player { speed: 4000.0 })?;
    entities.add_groups(player, PLAYER.mask());
    entities.set_draw_priority(player, 10);

    let desc = BodyDesc::new(tile_center(world, 2, 2), Vec2i::new(400, 400))
        .dynamic()
        .group(PLAYER.mask())
        .check(SOLID.mask())
        .resolve(true);
    world.attach_body(entities, player, desc)?;
    Ok(())
}

fn spawn_plate(sim: &mut Simulation) -> SimulationResult<()> {
    let (entities, world) = sim.parts_mut();
    let plate = entities.spawn(Plate { pressed_ticks: 0 })?;
    let desc = BodyDesc::new(tile_center(world, 8, 8), tile_half(world))
        .sensor()
        .group(TRIGGER.mask())
        .check(PLAYER.mask());
    let body = world.attach_body(entities, plate, desc)?;

    world.on_detection(body, |info, ctx| {
        if let Some(plate) = ctx.entities.get_mut::<Plate>(info.owner) {
            if plate.pressed_ticks == 0 {
                info!(by = %info.other_owner, "Plate pressed");
            }
            plate.pressed_ticks += 1;
        }
    });
    Ok(())
}

fn spawn_slimes(sim: &mut Simulation) -> SimulationResult<()> {
    for (i, x) in [3, 6, 9, 12].into_iter().enumerate() {
        let (entities, world) = sim.parts_mut();
        let slime = entities.spawn(Slime { speed: SLIME_SPEED })?;
        entities.add_groups(slime, ENEMY.mask());

        let direction = if i % 2 == 0 { 1.0 } else { -1.0 };
        let desc = BodyDesc::new(tile_center(world, x, 5), Vec2i::new(300, 300))
            .dynamic()
            .group(ENEMY.mask())
            .check(SOLID.mask())
            .resolve(true)
            .velocity(Vec2f::new(SLIME_SPEED * direction, 0.0));
        let body = world.attach_body(entities, slime, desc)?;

        // Resolution zeroed the pushed axis; head back the way we were pushed
        world.on_detection(body, |info, ctx| {
            if !info.resolved || info.penetration.x == 0 {
                return;
            }
            if let Some(slime) = ctx.entities.get::<Slime>(info.owner) {
                let away = (info.penetration.x as f32).signum();
                ctx.world.set_velocity(info.body, Vec2f::new(slime.speed * away, 0.0));
            }
        });
    }
    Ok(())
}

fn spawn_spikes(sim: &mut Simulation) -> SimulationResult<()> {
    let (entities, world) = sim.parts_mut();
    let spikes = entities.spawn(Spikes { kills: 0 })?;
    let desc = BodyDesc::new(tile_center(world, 13, 5), tile_half(world))
        .sensor()
        .group(TRIGGER.mask())
        .check(ENEMY.mask());
    let body = world.attach_body(entities, spikes, desc)?;

    world.on_detection(body, |info, ctx| {
        // The slime's body is reclaimed with it at the end of the tick
        if ctx.entities.destroy(info.other_owner) {
            info!(victim = %info.other_owner, "Slime impaled");
            if let Some(spikes) = ctx.entities.get_mut::<Spikes>(info.owner) {
                spikes.kills += 1;
            }
        }
    });
    Ok(())
}

fn run() -> SimulationResult<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => SimulationConfig::load(path)?,
        None => SimulationConfig::default(),
    };

    let mut sim = Simulation::new(config)?;
    build_walls(&mut sim)?;
    spawn_player(&mut sim)?;
    spawn_plate(&mut sim)?;
    spawn_slimes(&mut sim)?;
    spawn_spikes(&mut sim)?;

    let players = sim.entities_mut().query::<(Player, BodyRef)>()?;
    sim.add_system(move |ctx: &mut SystemContext<'_>, _dt: f32| {
        let heading = match (ctx.frame / PATROL_LEG) % 4 {
            0 => Vec2f::new(1.0, 0.0),
            1 => Vec2f::new(0.0, 1.0),
            2 => Vec2f::new(-1.0, 0.0),
            _ => Vec2f::new(0.0, -1.0),
        };
        for id in ctx.entities.get_entities(&players) {
            let (Some(player), Some(body)) =
                (ctx.entities.get::<Player>(id), ctx.entities.get::<BodyRef>(id))
            else {
                continue;
            };
            ctx.world.set_velocity(body.0, heading * player.speed);
        }
    });

    info!(
        bodies = sim.world().len(),
        entities = sim.entities().len(),
        "Arena built"
    );

    for _ in 0..FRAMES {
        let stats = sim.tick(DT)?;
        if stats.frame % 60 == 0 {
            info!("{stats}");
        }
    }

    let entities = sim.entities();
    let pressed = entities
        .iter()
        .find_map(|id| entities.get::<Plate>(id))
        .map_or(0, |plate| plate.pressed_ticks);
    let kills = entities
        .iter()
        .find_map(|id| entities.get::<Spikes>(id))
        .map_or(0, |spikes| spikes.kills);
    let slimes = entities.iter().filter(|id| entities.has::<Slime>(*id)).count();
    info!(
        frames = sim.frame(),
        plate_ticks = pressed,
        kills,
        slimes_left = slimes,
        "Arena finished"
    );
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "Arena failed");
            ExitCode::FAILURE
        }
    }
}
