//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on I/O boundary traits (FileSystem, Catalog)
//! but are themselves concrete structs, not traits.

mod catalog;
mod taxonomy;

pub use catalog::CatalogService;
pub use taxonomy::{TaxonomyService, DATA_TYPE_DIAGRAM_KIND, DATA_TYPE_PANEL_GROUP};
