//! Catalog stores
//!
//! Thin lookups over the `Catalog` collaborator: template the resource path,
//! fetch, and turn hierarchy-bearing resources into `Record`s.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, instrument};

use crate::application::{ApplicationResult, IoResultExt};
use crate::domain::{records_from_values, EntityRef, FieldNames, Record};
use crate::infrastructure::endpoints::Endpoints;
use crate::infrastructure::traits::Catalog;

pub struct CatalogService {
    catalog: Arc<dyn Catalog>,
    endpoints: Endpoints,
    fields: FieldNames,
}

impl CatalogService {
    pub fn new(catalog: Arc<dyn Catalog>, endpoints: Endpoints, fields: FieldNames) -> Self {
        Self {
            catalog,
            endpoints,
            fields,
        }
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    fn fetch(&self, path: &str) -> ApplicationResult<Vec<Value>> {
        let values = self.catalog.fetch(path).with_resource(path)?;
        debug!("fetched {} records from {}", values.len(), path);
        Ok(values)
    }

    fn records(&self, path: &str) -> ApplicationResult<Vec<Record>> {
        Ok(records_from_values(self.fetch(path)?, &self.fields)?)
    }

    #[instrument(level = "debug", skip(self))]
    pub fn data_types(&self) -> ApplicationResult<Vec<Record>> {
        self.records(&self.endpoints.data_types_all())
    }

    #[instrument(level = "debug", skip(self))]
    pub fn measurables(&self) -> ApplicationResult<Vec<Record>> {
        self.records(&self.endpoints.measurables_all())
    }

    /// Measurables linked to one entity, e.g. an application.
    #[instrument(level = "debug", skip(self))]
    pub fn measurables_related_to(&self, entity: &EntityRef) -> ApplicationResult<Vec<Record>> {
        self.records(&self.endpoints.measurables_related_to(entity))
    }

    #[instrument(level = "debug", skip(self))]
    pub fn diagrams_by_kind(&self, kind: &str) -> ApplicationResult<Vec<Value>> {
        self.fetch(&self.endpoints.diagrams_by_kind(kind))
    }

    #[instrument(level = "debug", skip(self))]
    pub fn panels_by_group(&self, group: &str) -> ApplicationResult<Vec<Value>> {
        self.fetch(&self.endpoints.panels_by_group(group))
    }

    #[instrument(level = "debug", skip(self))]
    pub fn lineage_flows(&self) -> ApplicationResult<Vec<Value>> {
        self.fetch(&self.endpoints.lineage_flows())
    }

    #[instrument(level = "debug", skip(self))]
    pub fn lineage_specifications(&self) -> ApplicationResult<Vec<Value>> {
        self.fetch(&self.endpoints.lineage_specifications())
    }
}
