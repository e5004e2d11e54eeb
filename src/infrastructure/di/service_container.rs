//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::path::Path;
use std::sync::Arc;

use crate::application::services::{CatalogService, TaxonomyService};
use crate::config::Settings;
use crate::domain::HierarchyBuilder;
use crate::infrastructure::endpoints::Endpoints;
use crate::infrastructure::traits::{
    Catalog, FileCatalog, FileSystem, RealFileSystem, Selector, SkimSelector,
};

/// Container holding all application services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,

    /// Interactive node selection
    pub selector: Arc<dyn Selector>,

    pub catalog: Arc<CatalogService>,

    pub taxonomy: TaxonomyService,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    ///
    /// The catalog mirror is `settings.catalog_dir`, else `default_catalog_dir`.
    pub fn new(settings: Settings, default_catalog_dir: &Path) -> Self {
        let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
        let catalog = Arc::new(FileCatalog::new(
            settings.catalog_dir_or(default_catalog_dir),
            Arc::clone(&fs),
        ));
        Self::with_deps(settings, fs, catalog, Arc::new(SkimSelector))
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(
        settings: Settings,
        fs: Arc<dyn FileSystem>,
        catalog: Arc<dyn Catalog>,
        selector: Arc<dyn Selector>,
    ) -> Self {
        let settings = Arc::new(settings);
        let catalog = Arc::new(CatalogService::new(
            catalog,
            Endpoints::new(settings.base_path.clone()),
            settings.fields.clone(),
        ));
        let taxonomy = TaxonomyService::new(
            Arc::clone(&fs),
            Arc::clone(&catalog),
            HierarchyBuilder::new(settings.policy),
            settings.fields.clone(),
        );

        Self {
            settings,
            fs,
            selector,
            catalog,
            taxonomy,
        }
    }
}
