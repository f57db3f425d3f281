//! Seeded worlds for the benchmarks.
//!
//! Every fixture is built from a [`FixtureConfig`] and a ChaCha RNG, so two runs with the same
//! seed see the same entities, component values and churn sequence.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sparse_ecs::ecs::{ComponentType, Entity, Result, World};

use crate::components::{Acceleration, Health, Lifetime, Position, TAG_SIZE, Team, Velocity};

/// Configuration for a benchmark fixture.
#[derive(Debug, Clone)]
pub struct FixtureConfig {
    /// Number of entities to create.
    pub entity_count: usize,
    /// Number of distinct teams to spread entities over.
    pub team_count: u32,
    /// Fraction of entities that get a `Velocity`.
    pub moving_ratio: f64,
    /// Random seed for reproducibility.
    pub seed: u64,
}

impl Default for FixtureConfig {
    fn default() -> Self {
        Self {
            entity_count: 10_000,
            team_count: 4,
            moving_ratio: 0.5,
            seed: 12345,
        }
    }
}

impl FixtureConfig {
    pub fn with_entities(entity_count: usize) -> Self {
        Self {
            entity_count,
            ..Default::default()
        }
    }
}

/// A populated world plus the RNG that built it.
pub struct Fixture {
    pub world: World,
    pub entities: Vec<Entity>,
    pub tag: ComponentType,
    rng: ChaCha8Rng,
}

impl Fixture {
    /// Build a world where every entity has `Position`, `Health` and `Team`, and a share of
    /// them also move.
    pub fn new(config: &FixtureConfig) -> Result<Self> {
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let mut world = World::new();
        world.register_component::<Position>()?;
        world.register_component::<Velocity>()?;
        world.register_component::<Acceleration>()?;
        world.register_component::<Health>()?;
        world.register_component::<Team>()?;
        world.register_component::<Lifetime>()?;
        let tag = world.register_dynamic_component("tag", TAG_SIZE)?;

        let entities = world.create_entities(config.entity_count)?;
        for &entity in &entities {
            world.add_component(
                entity,
                Position {
                    x: rng.gen_range(-100.0..100.0),
                    y: rng.gen_range(-100.0..100.0),
                    z: 0.0,
                },
            )?;
            world.add_component(
                entity,
                Health {
                    current: rng.gen_range(1.0..100.0),
                    max: 100.0,
                },
            )?;
            world.add_component(
                entity,
                Team {
                    id: rng.gen_range(0..config.team_count.max(1)),
                },
            )?;
            if rng.gen_bool(config.moving_ratio) {
                world.add_component(
                    entity,
                    Velocity {
                        x: rng.gen_range(-1.0..1.0),
                        y: rng.gen_range(-1.0..1.0),
                        z: 0.0,
                    },
                )?;
                world.add_component(entity, Acceleration::default())?;
            }
        }

        Ok(Self {
            world,
            entities,
            tag,
            rng,
        })
    }

    /// Toggle `Lifetime` on `count` random entities.
    pub fn churn(&mut self, count: usize) -> Result<()> {
        for _ in 0..count {
            let entity = self.entities[self.rng.gen_range(0..self.entities.len())];
            if !self.world.try_remove_component::<Lifetime>(entity)? {
                let total = self.rng.gen_range(1.0..10.0);
                self.world.add_component(
                    entity,
                    Lifetime {
                        remaining: total,
                        total,
                    },
                )?;
            }
        }
        Ok(())
    }

    /// Random bytes for one `tag` record.
    pub fn random_tag(&mut self) -> [u8; TAG_SIZE] {
        let mut bytes = [0u8; TAG_SIZE];
        self.rng.fill(&mut bytes);
        bytes
    }
}
