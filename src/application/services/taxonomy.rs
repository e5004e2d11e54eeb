//! Taxonomy service
//!
//! Loads flat records, builds forests with the configured policy and
//! assembles the data-type view from independent catalog lookups.

use std::path::Path;
use std::sync::mpsc;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::application::services::CatalogService;
use crate::application::view::{DataTypeView, ViewUpdate};
use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::domain::{records_from_values, FieldNames, Forest, HierarchyBuilder, Record};
use crate::infrastructure::traits::FileSystem;

/// Diagram kind shown next to the data-type trees.
pub const DATA_TYPE_DIAGRAM_KIND: &str = "DATA_TYPE";
/// Static panel group shown next to the data-type trees.
pub const DATA_TYPE_PANEL_GROUP: &str = "HOME.DATA-TYPE";

type Lookup<'a> = Box<dyn FnOnce() -> ApplicationResult<ViewUpdate> + Send + 'a>;

pub struct TaxonomyService {
    fs: Arc<dyn FileSystem>,
    catalog: Arc<CatalogService>,
    builder: HierarchyBuilder,
    fields: FieldNames,
}

impl TaxonomyService {
    pub fn new(
        fs: Arc<dyn FileSystem>,
        catalog: Arc<CatalogService>,
        builder: HierarchyBuilder,
        fields: FieldNames,
    ) -> Self {
        Self {
            fs,
            catalog,
            builder,
            fields,
        }
    }

    /// Read records from a JSON array file or a TOML file with a `records` array.
    #[instrument(level = "debug", skip(self))]
    pub fn load_records(&self, path: &Path) -> ApplicationResult<Vec<Record>> {
        let content = self
            .fs
            .read_to_string(path)
            .with_path_context("read records", path)?;

        let is_toml = path.extension().is_some_and(|ext| ext == "toml");
        let document: Value = if is_toml {
            let table: toml::Table = toml::from_str(&content).map_err(|e| invalid(path, e))?;
            let records = table
                .get("records")
                .cloned()
                .ok_or_else(|| invalid(path, "missing 'records' array"))?;
            serde_json::to_value(records).map_err(|e| invalid(path, e))?
        } else {
            serde_json::from_str(&content).map_err(|e| invalid(path, e))?
        };

        let Value::Array(values) = document else {
            return Err(invalid(path, "expected an array of records"));
        };
        debug!("loaded {} records from {}", values.len(), path.display());
        Ok(records_from_values(values, &self.fields)?)
    }

    pub fn build(&self, records: Vec<Record>) -> ApplicationResult<Forest<Record>> {
        Ok(self.builder.build(records)?)
    }

    pub fn load_forest(&self, path: &Path) -> ApplicationResult<Forest<Record>> {
        let records = self.load_records(path)?;
        self.build(records)
    }

    /// Build the data-type trees, then run the side lookups concurrently.
    ///
    /// A failing data-type fetch fails the view. A failing side lookup is
    /// logged and leaves its field empty. Updates are applied in arrival order.
    #[instrument(level = "debug", skip(self))]
    pub fn load_data_type_view(&self) -> ApplicationResult<DataTypeView> {
        let trees = self.build(self.catalog.data_types()?)?;

        let catalog = self.catalog.as_ref();
        let lookups: Vec<(&'static str, Lookup<'_>)> = vec![
            (
                "diagrams",
                Box::new(move || {
                    catalog
                        .diagrams_by_kind(DATA_TYPE_DIAGRAM_KIND)
                        .map(ViewUpdate::Diagrams)
                }),
            ),
            (
                "panels",
                Box::new(move || {
                    catalog
                        .panels_by_group(DATA_TYPE_PANEL_GROUP)
                        .map(ViewUpdate::Panels)
                }),
            ),
            (
                "lineage flows",
                Box::new(move || catalog.lineage_flows().map(ViewUpdate::LineageFlows)),
            ),
            (
                "lineage specifications",
                Box::new(move || {
                    catalog
                        .lineage_specifications()
                        .map(ViewUpdate::LineageSpecs)
                }),
            ),
        ];

        let (tx, rx) = mpsc::channel();
        rayon::scope(|s| {
            for (name, lookup) in lookups {
                let tx = tx.clone();
                s.spawn(move |_| {
                    // Receiver outlives the scope
                    let _ = tx.send((name, lookup()));
                });
            }
        });
        drop(tx);

        let view = rx
            .into_iter()
            .fold(DataTypeView::new(trees), |view, (name, result)| match result {
                Ok(update) => view.apply(update),
                Err(e) => {
                    warn!("{} lookup failed: {}", name, e);
                    view
                }
            });
        Ok(view)
    }
}

fn invalid(path: &Path, message: impl ToString) -> ApplicationError {
    ApplicationError::InvalidInput {
        path: path.to_path_buf(),
        message: message.to_string(),
    }
}
