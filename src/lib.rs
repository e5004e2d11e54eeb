//! Catalogue hierarchies: build navigable forests from flat records whose
//! only structure is an optional parent reference.
//!
//! ```
//! use taxon::domain::{build_hierarchies, EntityId, Record};
//!
//! let forest = build_hierarchies(vec![
//!     Record::new(EntityId::Number(1), None),
//!     Record::new(EntityId::Number(2), Some(EntityId::Number(1))),
//!     Record::new(EntityId::Number(4), Some(EntityId::Number(9))),
//! ]);
//! assert_eq!(forest.root_indices().len(), 2);
//! assert_eq!(forest.find(&EntityId::Number(1)).unwrap().children.len(), 1);
//! ```

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
