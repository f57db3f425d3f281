//! Benchmark utilities for the sparse-set ECS.
//!
//! This crate provides the shared setup for the criterion benchmarks:
//!
//! - **Components**: representative component types ([`components`])
//! - **Fixtures**: seeded, reproducible worlds ([`fixtures`])
//!
//! # Running Benchmarks
//!
//! ```bash
//! # Run all benchmarks
//! cargo bench -p sparse_bench
//!
//! # Run specific benchmark group
//! cargo bench -p sparse_bench -- group_sort
//! ```
//!
//! Results are written to `target/criterion/` with HTML reports for visualization.

pub mod components;
pub mod fixtures;
