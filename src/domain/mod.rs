//! Domain layer: entities and hierarchy building
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod builder;
pub mod entity;
pub mod entity_ref;
pub mod error;

pub use arena::{Forest, NestedNode, Node, Outline, MAX_NESTING_DEPTH};
pub use builder::{build_hierarchies, BuildPolicy, Diagnostics, HierarchyBuilder};
pub use entity::{records_from_values, Entity, EntityId, FieldNames, Record};
pub use entity_ref::EntityRef;
pub use error::{DomainError, DomainResult};
