//! Sparse-set component storage with owned groups.
//!
//! Components live in per-type sparse sets. Groups take ownership of the front of their owned
//! arrays so that every grouped entity sits in the same dense slot across all of them, which
//! makes group iteration a linear walk with no lookups into the owned arrays.

// Allows the derive macros to refer to `::sparse_ecs` from inside this crate.
extern crate self as sparse_ecs;

pub mod ecs;
