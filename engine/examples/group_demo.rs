//! Walkthrough of component storage and groups.
//!
//! This example shows:
//! - Registering components and creating entities
//! - An owned group joining a non-owned component
//! - Sorting a group by a component field
//! - Partitioning a group by team
//! - Runtime-defined components stored as raw bytes
//! - A unique frame clock shared by every mover
//!
//! Run with `RUST_LOG=trace` to see group bookkeeping.

use sparse_ecs::ecs::{Result, World};
use sparse_macros::{Component, Unique};

// ============================================================================
// Components
// ============================================================================

#[derive(Component, Debug)]
struct Position {
    x: f32,
    y: f32,
}

#[derive(Component, Debug)]
struct Velocity {
    dx: f32,
    dy: f32,
}

#[derive(Component, Debug)]
struct Health {
    current: i32,
}

#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Team {
    Red,
    Blue,
}

#[derive(Unique, Debug)]
struct FrameTime {
    delta: f32,
}

fn main() -> Result<()> {
    env_logger::init();

    let mut world = World::new();
    world.register_component::<Position>()?;
    world.register_component::<Velocity>()?;
    world.register_component::<Health>()?;
    world.register_component::<Team>()?;
    world.register_unique(FrameTime { delta: 0.5 })?;

    // ------------------------------------------------------------------------
    // Populate
    // ------------------------------------------------------------------------

    for (i, entity) in world.create_entities(8)?.into_iter().enumerate() {
        let i = i as f32;
        world.add_component(entity, Position { x: i, y: 0.0 })?;
        world.add_component(entity, Health { current: 100 - (i as i32 * 7) % 40 })?;
        world.add_component(entity, if i as u32 % 3 == 0 { Team::Blue } else { Team::Red })?;
        // Every other entity moves
        if i as u32 % 2 == 0 {
            world.add_component(entity, Velocity { dx: 1.0, dy: 0.5 })?;
        }
    }

    // ------------------------------------------------------------------------
    // Movement: owns Position and Velocity, joins Health
    // ------------------------------------------------------------------------

    let delta = world.get_unique::<FrameTime>()?.delta;
    let mut movers = world.register_group::<(Position, Velocity), Health>()?;
    println!("\n=== Movers ({}) ===", movers.len());
    movers.each(|_, (position, velocity), _| {
        position.x += velocity.dx * delta;
        position.y += velocity.dy * delta;
    })?;

    movers.sort_by(|health: &Health| health.current, true)?;
    for (entity, (position, _), health) in &movers {
        println!(
            "  {entity}: ({:.1}, {:.1}) health {}",
            position.x, position.y, health.current
        );
    }
    drop(movers);

    // ------------------------------------------------------------------------
    // Teams: a second group over Health, partitioned by the joined Team
    // ------------------------------------------------------------------------

    let mut teams = world.register_group::<Health, Team>()?;
    let mut view = teams.partition_view(|team: &Team| *team)?;
    for team in view.keys() {
        println!("\n=== {team:?} ({}) ===", view.entities(&team).len());
        view.each(&team, |entity, health, _| {
            health.current -= 10;
            println!("  {entity}: health {}", health.current);
        })?;
    }
    drop(teams);

    // ------------------------------------------------------------------------
    // Runtime-defined layout
    // ------------------------------------------------------------------------

    let tag = world.register_dynamic_component("tag", 4)?;
    let tagged = world.create_entity()?;
    world.add_raw_component(tagged, tag, &42u32.to_le_bytes())?;
    println!(
        "\n=== Dynamic ===\n  {tagged}: {:?}",
        world.components().get_raw_component(tagged, tag)?
    );

    println!(
        "\n{} entities alive, {} bytes of component storage",
        world.living(),
        world.components().memory_usage()
    );
    Ok(())
}
