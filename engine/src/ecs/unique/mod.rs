//! Unique (singleton) values.
//!
//! A unique is a value the world holds exactly once per type, outside of any entity. Typical
//! uses are frame timing, input state or global settings read by the code that walks groups.
//!
//! | Aspect | Unique | Component |
//! |--------|--------|-----------|
//! | Cardinality | One per type per world | One per entity per type |
//! | Access | Direct by type | By entity, or through groups |
//! | Signatures and groups | Not tracked | Tracked |
//!
//! ```ignore
//! use sparse_macros::Unique;
//!
//! #[derive(Unique)]
//! struct FrameTime {
//!     delta: f32,
//! }
//!
//! world.register_unique(FrameTime { delta: 0.016 })?;
//! let delta = world.get_unique::<FrameTime>()?.delta;
//! ```

/// A type stored once per world.
///
/// Use `#[derive(Unique)]` from `sparse_macros` to implement it.
pub trait Unique: 'static + Send + Sync {}
