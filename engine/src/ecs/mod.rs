pub mod component;
pub mod entity;
pub mod error;
pub mod group;
pub mod manager;
pub mod storage;
pub mod unique;
pub(crate) mod util;
pub mod world;

pub use component::{Component, ComponentType, Signature, TypeRegistry};
pub use entity::Entity;
pub use error::{Error, Result};
pub use group::{Group, GroupIter, GroupKey, Partition, PartitionView};
pub use manager::{ComponentManager, Config};
pub use storage::{ComponentArray, ComponentStorage, ErasedComponentArray, Uniques};
pub use unique::Unique;
pub use world::World;
