//! Component types shared by the benchmarks.
//!
//! Sizes are kept close to real game components so the numbers reflect realistic cache
//! behavior.

use sparse_macros::Component;

/// 3D position component (12 bytes).
#[derive(Component, Clone, Copy, Debug, Default, PartialEq)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// 3D velocity component (12 bytes).
#[derive(Component, Clone, Copy, Debug, Default, PartialEq)]
pub struct Velocity {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// 3D acceleration component (12 bytes).
#[derive(Component, Clone, Copy, Debug, Default, PartialEq)]
pub struct Acceleration {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// Health of a damageable entity, the usual sort key.
#[derive(Component, Clone, Copy, Debug, Default, PartialEq)]
pub struct Health {
    pub current: f32,
    pub max: f32,
}

/// Team/faction identifier, the usual partition key.
#[derive(Component, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Team {
    pub id: u32,
}

/// Remaining lifetime, churned in and out by the add/remove benchmarks.
#[derive(Component, Clone, Copy, Debug, Default, PartialEq)]
pub struct Lifetime {
    pub remaining: f32,
    pub total: f32,
}

/// Size in bytes of the runtime-defined `tag` layout.
pub const TAG_SIZE: usize = 16;
