//! ECS microbenchmarks using Criterion.
//!
//! These benchmarks measure individual storage and group operations in isolation:
//! - Component insert/remove churn
//! - Owned group iteration
//! - Group sorting
//! - Partition rebuilds

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use sparse_bench::{
    components::*,
    fixtures::{Fixture, FixtureConfig},
};
use sparse_ecs::ecs::{ComponentArray, Entity};

const COUNTS: [usize; 3] = [100, 1_000, 10_000];

fn fixture(count: usize) -> Fixture {
    match Fixture::new(&FixtureConfig::with_entities(count)) {
        Ok(fixture) => fixture,
        Err(err) => panic!("failed to build fixture: {err}"),
    }
}

// =============================================================================
// Storage Benchmarks
// =============================================================================

fn bench_array(c: &mut Criterion) {
    let mut group = c.benchmark_group("array");

    for count in COUNTS {
        group.throughput(Throughput::Elements(count as u64));

        group.bench_with_input(BenchmarkId::new("insert", count), &count, |b, &n| {
            b.iter(|| {
                let mut array = ComponentArray::<Position>::new();
                for id in 0..n as u32 {
                    array.insert(Entity::new(id), Position::default()).unwrap();
                }
                black_box(array);
            });
        });

        group.bench_with_input(BenchmarkId::new("get", count), &count, |b, &n| {
            let mut array = ComponentArray::<Position>::new();
            for id in 0..n as u32 {
                array.insert(Entity::new(id), Position::default()).unwrap();
            }
            b.iter(|| {
                let mut sum = 0.0;
                for id in 0..n as u32 {
                    sum += array.get(Entity::new(id)).unwrap().x;
                }
                black_box(sum)
            });
        });

        group.bench_with_input(BenchmarkId::new("raw_insert", count), &count, |b, &n| {
            b.iter_batched(
                || fixture(n),
                |mut fixture| {
                    for index in 0..fixture.entities.len() {
                        let bytes = fixture.random_tag();
                        let entity = fixture.entities[index];
                        fixture
                            .world
                            .add_raw_component(entity, fixture.tag, &bytes)
                            .unwrap();
                    }
                },
                criterion::BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

fn bench_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("churn");

    for count in COUNTS {
        group.throughput(Throughput::Elements(count as u64));

        // Toggle a component with no group watching it
        group.bench_with_input(BenchmarkId::new("ungrouped", count), &count, |b, &n| {
            b.iter_batched(
                || fixture(n),
                |mut fixture| fixture.churn(n).unwrap(),
                criterion::BatchSize::SmallInput,
            );
        });

        // Toggle a component owned by a group, so every change moves group boundaries
        group.bench_with_input(BenchmarkId::new("grouped", count), &count, |b, &n| {
            b.iter_batched(
                || {
                    let mut fixture = fixture(n);
                    fixture
                        .world
                        .register_group::<(Lifetime, Position), Health>()
                        .unwrap();
                    fixture
                },
                |mut fixture| fixture.churn(n).unwrap(),
                criterion::BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

// =============================================================================
// Group Benchmarks
// =============================================================================

fn bench_group_iter(c: &mut Criterion) {
    let mut group = c.benchmark_group("group_iter");

    for count in COUNTS {
        group.throughput(Throughput::Elements(count as u64));

        group.bench_with_input(BenchmarkId::new("owned", count), &count, |b, &n| {
            let mut fixture = fixture(n);
            let mut movers = fixture
                .world
                .register_group::<(Position, Velocity, Acceleration), ()>()
                .unwrap();
            b.iter(|| {
                movers
                    .each(|_, (position, velocity, acceleration), ()| {
                        velocity.x += acceleration.x;
                        velocity.y += acceleration.y;
                        position.x += velocity.x;
                        position.y += velocity.y;
                    })
                    .unwrap();
            });
        });

        group.bench_with_input(BenchmarkId::new("joined", count), &count, |b, &n| {
            let mut fixture = fixture(n);
            let movers = fixture
                .world
                .register_group::<(Position, Velocity), (Health, Team)>()
                .unwrap();
            b.iter(|| {
                let mut sum = 0.0;
                for (_, (position, _), (health, _)) in &movers {
                    sum += position.x * health.current;
                }
                black_box(sum)
            });
        });
    }

    group.finish();
}

fn bench_group_sort(c: &mut Criterion) {
    let mut group = c.benchmark_group("group_sort");

    for count in COUNTS {
        group.throughput(Throughput::Elements(count as u64));

        group.bench_with_input(BenchmarkId::new("by_joined_health", count), &count, |b, &n| {
            let mut fixture = fixture(n);
            let mut movers = fixture
                .world
                .register_group::<(Position, Velocity), Health>()
                .unwrap();
            b.iter(|| {
                movers.invalidate_sorting();
                movers
                    .sort_by(|health: &Health| health.current, true)
                    .unwrap();
            });
        });

        // A repeat sort with a clean cache should be free
        group.bench_with_input(BenchmarkId::new("cached", count), &count, |b, &n| {
            let mut fixture = fixture(n);
            let mut movers = fixture
                .world
                .register_group::<(Position, Velocity), Health>()
                .unwrap();
            b.iter(|| {
                movers
                    .sort_by(|health: &Health| health.current, false)
                    .unwrap();
            });
        });
    }

    group.finish();
}

fn bench_partition(c: &mut Criterion) {
    let mut group = c.benchmark_group("partition");

    for count in COUNTS {
        group.throughput(Throughput::Elements(count as u64));

        group.bench_with_input(BenchmarkId::new("rebuild", count), &count, |b, &n| {
            let mut fixture = fixture(n);
            let mut teams = fixture.world.register_group::<Position, Team>().unwrap();
            b.iter(|| {
                teams.invalidate_partitions();
                let view = teams.partition_view(|team: &Team| team.id).unwrap();
                black_box(view.len());
            });
        });

        group.bench_with_input(BenchmarkId::new("each_team", count), &count, |b, &n| {
            let mut fixture = fixture(n);
            let mut teams = fixture.world.register_group::<Position, Team>().unwrap();
            b.iter(|| {
                let mut view = teams.partition_view(|team: &Team| team.id).unwrap();
                for key in view.keys() {
                    view.each(&key, |_, position, _| position.z += 1.0).unwrap();
                }
            });
        });
    }

    group.finish();
}

// =============================================================================
// Criterion Configuration
// =============================================================================

criterion_group!(
    benches,
    bench_array,
    bench_churn,
    bench_group_iter,
    bench_group_sort,
    bench_partition,
);

criterion_main!(benches);
