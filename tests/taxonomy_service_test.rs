//! Tests for TaxonomyService and CatalogService

use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use serde_json::{json, Value};
use tempfile::TempDir;

use taxon::application::ApplicationError;
use taxon::config::Settings;
use taxon::domain::{BuildPolicy, DomainError, Entity, EntityId, EntityRef, FieldNames};
use taxon::infrastructure::di::ServiceContainer;
use taxon::infrastructure::traits::{
    Catalog, FileCatalog, RealFileSystem, SelectionItem, Selector,
};

/// In-memory catalog; unknown resources fail like a missing file.
#[derive(Default)]
struct MockCatalog {
    resources: HashMap<String, Vec<Value>>,
    requested: Mutex<Vec<String>>,
}

impl MockCatalog {
    fn with(mut self, path: &str, values: Value) -> Self {
        let values = values.as_array().cloned().unwrap_or_default();
        self.resources.insert(path.to_string(), values);
        self
    }
}

impl Catalog for MockCatalog {
    fn fetch(&self, path: &str) -> io::Result<Vec<Value>> {
        self.requested.lock().unwrap().push(path.to_string());
        self.resources
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.to_string()))
    }
}

struct NoSelector;

impl Selector for NoSelector {
    fn select_one(&self, _items: &[SelectionItem], _prompt: &str) -> Result<Option<SelectionItem>, String> {
        Ok(None)
    }
}

fn container(settings: Settings, catalog: Arc<MockCatalog>) -> ServiceContainer {
    ServiceContainer::with_deps(settings, Arc::new(RealFileSystem), catalog, Arc::new(NoSelector))
}

fn data_types() -> Value {
    json!([
        {"id": 1, "name": "Book Data"},
        {"id": 2, "parentId": 1, "name": "Reference Data"},
        {"id": 3, "parentId": 9, "name": "Orphan"}
    ])
}

fn write_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("write records file");
    path
}

// ============================================================
// Loading records
// ============================================================

#[test]
fn given_json_array_file_when_loading_forest_then_builds_hierarchy() {
    let temp = TempDir::new().unwrap();
    let path = write_file(&temp, "types.json", &data_types().to_string());
    let services = container(Settings::default(), Arc::new(MockCatalog::default()));

    let forest = services.taxonomy.load_forest(&path).unwrap();

    assert_eq!(forest.len(), 3);
    assert_eq!(forest.root_indices().len(), 2);
    assert_eq!(forest.diagnostics().dangling.len(), 1);
}

#[test]
fn given_toml_records_file_when_loading_then_reads_records_array() {
    let temp = TempDir::new().unwrap();
    let path = write_file(
        &temp,
        "types.toml",
        r#"
[[records]]
code = "REF"
title = "Reference"

[[records]]
code = "CPTY"
parentCode = "REF"
title = "Counterparty"
"#,
    );
    let mut settings = Settings::default();
    settings.fields = FieldNames {
        id: "code".into(),
        parent: "parentCode".into(),
        label: "title".into(),
    };
    let services = container(settings, Arc::new(MockCatalog::default()));

    let forest = services.taxonomy.load_forest(&path).unwrap();

    let root = forest.find(&EntityId::from("REF")).unwrap();
    assert_eq!(root.entity.label(), "Reference");
    assert_eq!(root.children.len(), 1);
}

#[test]
fn given_json_object_file_when_loading_then_invalid_input() {
    let temp = TempDir::new().unwrap();
    let path = write_file(&temp, "types.json", r#"{"id": 1}"#);
    let services = container(Settings::default(), Arc::new(MockCatalog::default()));

    let err = services.taxonomy.load_records(&path).unwrap_err();
    assert!(matches!(err, ApplicationError::InvalidInput { .. }));
}

#[test]
fn given_record_without_id_when_loading_then_domain_error_names_position() {
    let temp = TempDir::new().unwrap();
    let path = write_file(&temp, "types.json", r#"[{"id": 1}, {"name": "no id"}]"#);
    let services = container(Settings::default(), Arc::new(MockCatalog::default()));

    let err = services.taxonomy.load_records(&path).unwrap_err();
    assert!(matches!(
        err,
        ApplicationError::Domain(DomainError::InvalidRecord { position: 1, .. })
    ));
}

#[test]
fn given_missing_file_when_loading_then_operation_failed() {
    let services = container(Settings::default(), Arc::new(MockCatalog::default()));
    let err = services
        .taxonomy
        .load_records(&PathBuf::from("/nonexistent/types.json"))
        .unwrap_err();
    assert!(matches!(err, ApplicationError::OperationFailed { .. }));
}

#[test]
fn given_strict_settings_when_loading_dangling_records_then_errors() {
    let temp = TempDir::new().unwrap();
    let path = write_file(&temp, "types.json", &data_types().to_string());
    let settings = Settings {
        policy: BuildPolicy::Strict,
        ..Settings::default()
    };
    let services = container(settings, Arc::new(MockCatalog::default()));

    let err = services.taxonomy.load_forest(&path).unwrap_err();
    assert!(matches!(
        err,
        ApplicationError::Domain(DomainError::DanglingParentReference { .. })
    ));
}

#[test]
fn given_non_integer_parent_when_loading_strictly_then_invalid_record() {
    let temp = TempDir::new().unwrap();
    let path = write_file(
        &temp,
        "types.json",
        r#"[{"id": 1}, {"id": 2, "parentId": 1.0}, {"id": 3, "parentId": true}]"#,
    );
    let settings = Settings {
        policy: BuildPolicy::Strict,
        ..Settings::default()
    };
    let services = container(settings, Arc::new(MockCatalog::default()));

    let err = services.taxonomy.load_forest(&path).unwrap_err();
    assert!(matches!(
        err,
        ApplicationError::Domain(DomainError::InvalidRecord { position: 1, .. })
    ));
}

// ============================================================
// Data-type view
// ============================================================

#[test]
fn given_all_lookups_available_when_loading_view_then_every_field_populated() {
    let catalog = Arc::new(
        MockCatalog::default()
            .with("data-types/all", data_types())
            .with("svg-diagram/kind/DATA_TYPE", json!([{"id": 10}]))
            .with("static-panel/group/HOME.DATA-TYPE", json!([{"id": 20}, {"id": 21}]))
            .with("physical-flow/described-lineage", json!([]))
            .with("physical-specification/described-lineage", json!([{"id": 30}])),
    );
    let services = container(Settings::default(), Arc::clone(&catalog));

    let view = services.taxonomy.load_data_type_view().unwrap();

    assert_eq!(view.trees.len(), 3);
    assert_eq!(view.diagrams.as_ref().map(Vec::len), Some(1));
    assert_eq!(view.panels.as_ref().map(Vec::len), Some(2));
    assert_eq!(view.lineage_flows.as_ref().map(Vec::len), Some(0));
    assert_eq!(view.lineage_specs.as_ref().map(Vec::len), Some(1));
    assert!(view.selected.is_none());
    assert_eq!(catalog.requested.lock().unwrap().len(), 5);
}

#[test]
fn given_failing_side_lookups_when_loading_view_then_fields_stay_empty() {
    let catalog = Arc::new(
        MockCatalog::default()
            .with("data-types/all", data_types())
            .with("static-panel/group/HOME.DATA-TYPE", json!([{"id": 20}])),
    );
    let services = container(Settings::default(), catalog);

    let view = services.taxonomy.load_data_type_view().unwrap();

    assert_eq!(view.trees.root_indices().len(), 2);
    assert!(view.diagrams.is_none());
    assert!(view.lineage_flows.is_none());
    assert!(view.lineage_specs.is_none());
    assert_eq!(view.panels.as_ref().map(Vec::len), Some(1));
}

#[test]
fn given_failing_data_types_when_loading_view_then_errors() {
    let services = container(Settings::default(), Arc::new(MockCatalog::default()));
    let err = services.taxonomy.load_data_type_view().unwrap_err();
    assert!(matches!(err, ApplicationError::Catalog { ref resource, .. } if resource == "data-types/all"));
}

// ============================================================
// Measurables
// ============================================================

#[test]
fn given_entity_ref_when_fetching_related_measurables_then_uses_templated_path() {
    let catalog = Arc::new(MockCatalog::default().with(
        "api/measurable/entity/APPLICATION/12",
        json!([{"id": 100, "name": "Capability"}, {"id": 101, "parentId": 100}]),
    ));
    let settings = Settings {
        base_path: "api".into(),
        ..Settings::default()
    };
    let services = container(settings, Arc::clone(&catalog));

    let records = services
        .catalog
        .measurables_related_to(&EntityRef::new("APPLICATION", EntityId::Number(12)))
        .unwrap();
    let forest = services.taxonomy.build(records).unwrap();

    assert_eq!(forest.root_indices().len(), 1);
    assert_eq!(
        catalog.requested.lock().unwrap().as_slice(),
        ["api/measurable/entity/APPLICATION/12".to_string()]
    );
}

#[test]
fn given_file_catalog_mirror_when_fetching_measurables_then_reads_json_file() {
    let temp = TempDir::new().unwrap();
    std::fs::create_dir_all(temp.path().join("measurable")).unwrap();
    std::fs::write(
        temp.path().join("measurable/all.json"),
        r#"[{"id": 1, "name": "Business"}, {"id": 2, "parentId": 1, "name": "Trading"}]"#,
    )
    .unwrap();
    let fs = Arc::new(RealFileSystem);
    let services = ServiceContainer::with_deps(
        Settings::default(),
        fs.clone(),
        Arc::new(FileCatalog::new(temp.path(), fs)),
        Arc::new(NoSelector),
    );

    let records = services.catalog.measurables().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].parent_id(), Some(&EntityId::Number(1)));
}
