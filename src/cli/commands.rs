//! Command dispatch

use std::io;
use std::path::Path;

use clap::CommandFactory;
use itertools::Itertools;
use tracing::{debug, instrument};

use crate::application::DataTypeView;
use crate::cli::args::{Cli, Commands};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::Settings;
use crate::domain::{BuildPolicy, Entity, EntityId, EntityRef, Forest, HierarchyBuilder, Record};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::traits::SelectionItem;
use crate::infrastructure::InfraError;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let Some(command) = &cli.command else {
        return Ok(());
    };
    if let Commands::Completion { shell } = command {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        clap_complete::generate(*shell, &mut cmd, name, &mut io::stdout());
        return Ok(());
    }

    let container = build_container(cli)?;
    match command {
        Commands::Tree { file } => cmd_tree(&container, file),
        Commands::Find { file, id } => cmd_find(&container, file, id),
        Commands::Leaves { file } => cmd_leaves(&container, file),
        Commands::Branches { file } => cmd_branches(&container, file),
        Commands::Orphans { file } => cmd_orphans(&container, file),
        Commands::Check { file } => cmd_check(&container, file),
        Commands::Export { file, pretty } => cmd_export(&container, file, *pretty),
        Commands::Select { file } => cmd_select(&container, file),
        Commands::View => cmd_view(&container),
        Commands::Measurables { related } => cmd_measurables(&container, related.as_ref()),
        Commands::Completion { .. } => Ok(()),
    }
}

fn build_container(cli: &Cli) -> CliResult<ServiceContainer> {
    let cwd = std::env::current_dir().map_err(|e| InfraError::io("current directory", e))?;
    let local_dir = cli.catalog_dir.clone().unwrap_or_else(|| cwd.clone());

    let mut settings = Settings::load(Some(&local_dir))?;
    if let Some(dir) = &cli.catalog_dir {
        settings.catalog_dir = Some(dir.clone());
    }
    if cli.strict {
        settings.policy = BuildPolicy::Strict;
    }
    debug!("settings: {:?}", settings);

    Ok(ServiceContainer::new(settings, &cwd))
}

/// Resolve a user-typed identifier; integer-looking text falls back to a text id.
fn lookup_id(forest: &Forest<Record>, raw: &str) -> Option<EntityId> {
    let parsed: EntityId = raw.parse().ok()?;
    if forest.find(&parsed).is_some() {
        return Some(parsed);
    }
    let text = EntityId::from(raw);
    forest.find(&text).map(|_| text)
}

fn warn_absorbed(forest: &Forest<Record>) {
    let diagnostics = forest.diagnostics();
    if !diagnostics.is_clean() {
        output::warning(&format!(
            "{} records with duplicate, dangling or cyclic references (see `taxon orphans`)",
            diagnostics.len()
        ));
    }
}

fn print_trees(forest: &Forest<Record>) -> CliResult<()> {
    let trees = forest.to_tree_strings()?;
    output::header(&format!(
        "Found {} trees ({} nodes):",
        trees.len(),
        forest.len()
    ));
    for tree in trees {
        print!("{}", tree);
    }
    Ok(())
}

#[instrument(skip(container))]
fn cmd_tree(container: &ServiceContainer, file: &Path) -> CliResult<()> {
    let forest = container.taxonomy.load_forest(file)?;
    print_trees(&forest)?;
    warn_absorbed(&forest);
    Ok(())
}

#[instrument(skip(container))]
fn cmd_find(container: &ServiceContainer, file: &Path, raw_id: &str) -> CliResult<()> {
    if raw_id.trim().is_empty() {
        return Err(CliError::InvalidArgs("empty identifier".to_string()));
    }
    let forest = container.taxonomy.load_forest(file)?;
    let id = lookup_id(&forest, raw_id).ok_or_else(|| CliError::NotFound(raw_id.to_string()))?;
    let idx = forest
        .find_index(&id)
        .ok_or_else(|| CliError::NotFound(raw_id.to_string()))?;
    let Some(node) = forest.get_node(idx) else {
        return Err(CliError::NotFound(raw_id.to_string()));
    };

    output::header(&node.entity.label());
    output::action("id", node.entity.id());
    if let Some(path) = forest.path_to_root(&id) {
        output::action("path", &path.iter().join(" <- "));
    }
    output::action("depth", &(forest.ancestors(idx).count() + 1));
    output::action("children", &node.children.len());
    for &child in &node.children {
        if let Some(child) = forest.get_node(child) {
            output::detail(&format!("{} ({})", child.entity.label(), child.entity.id()));
        }
    }
    output::action("descendants", &forest.descendants(idx).count());
    Ok(())
}

#[instrument(skip(container))]
fn cmd_leaves(container: &ServiceContainer, file: &Path) -> CliResult<()> {
    let forest = container.taxonomy.load_forest(file)?;
    for leaf in forest.leaf_nodes() {
        output::info(leaf);
    }
    Ok(())
}

#[instrument(skip(container))]
fn cmd_branches(container: &ServiceContainer, file: &Path) -> CliResult<()> {
    let forest = container.taxonomy.load_forest(file)?;
    for branch in forest.branches() {
        output::info(&branch.iter().join(" <- "));
    }
    Ok(())
}

#[instrument(skip(container))]
fn cmd_orphans(container: &ServiceContainer, file: &Path) -> CliResult<()> {
    let records = container.taxonomy.load_records(file)?;
    let forest = HierarchyBuilder::new(BuildPolicy::Lenient).build(records)?;
    let diagnostics = forest.diagnostics();

    output::info(&diagnostics.len());
    for (id, parent) in &diagnostics.dangling {
        output::failure(&format!("{}: parent {} does not exist", id, parent));
    }
    for id in &diagnostics.cycles {
        output::failure(&format!("{}: parent reference forms a cycle", id));
    }
    for id in &diagnostics.duplicates {
        output::failure(&format!("{}: duplicate identifier", id));
    }
    Ok(())
}

#[instrument(skip(container))]
fn cmd_check(container: &ServiceContainer, file: &Path) -> CliResult<()> {
    let records = container.taxonomy.load_records(file)?;
    let forest = HierarchyBuilder::new(BuildPolicy::Strict).build(records)?;
    output::success(&format!(
        "{} records form {} trees, depth {}",
        forest.len(),
        forest.root_indices().len(),
        forest.depth()
    ));
    Ok(())
}

#[instrument(skip(container))]
fn cmd_export(container: &ServiceContainer, file: &Path, pretty: bool) -> CliResult<()> {
    let forest = container.taxonomy.load_forest(file)?;
    let nested = forest.to_nested()?;
    let json = if pretty {
        serde_json::to_string_pretty(&nested)?
    } else {
        serde_json::to_string(&nested)?
    };
    output::info(&json);
    Ok(())
}

#[instrument(skip(container))]
fn cmd_select(container: &ServiceContainer, file: &Path) -> CliResult<()> {
    let forest = container.taxonomy.load_forest(file)?;
    let items: Vec<SelectionItem> = forest
        .iter()
        .map(|(idx, node)| {
            let mut labels: Vec<String> = forest
                .ancestors(idx)
                .map(|(_, n)| n.entity.label())
                .collect();
            labels.reverse();
            labels.push(node.entity.label());
            SelectionItem {
                display: labels.join(" / "),
                value: node.entity.id().to_string(),
            }
        })
        .collect();

    let selected = container
        .selector
        .select_one(&items, "Select node: ")
        .map_err(|message| InfraError::Selector { message })?;

    match selected.and_then(|item| lookup_id(&forest, &item.value)) {
        Some(id) => {
            if let Some(node) = forest.find(&id) {
                on_node_selected(&forest, node.entity.id());
            }
            Ok(())
        }
        None => {
            output::warning("nothing selected");
            Ok(())
        }
    }
}

fn on_node_selected(forest: &Forest<Record>, id: &EntityId) {
    if let Some(path) = forest.path_to_root(id) {
        output::info(&path.iter().join(" <- "));
    }
}

#[instrument(skip(container))]
fn cmd_view(container: &ServiceContainer) -> CliResult<()> {
    let view = container.taxonomy.load_data_type_view()?;
    print_trees(&view.trees)?;
    print_view_summary(&view);
    Ok(())
}

fn print_view_summary(view: &DataTypeView) {
    let count = |xs: &Option<Vec<serde_json::Value>>| match xs {
        Some(xs) => xs.len().to_string(),
        None => "unavailable".to_string(),
    };
    output::action("diagrams", &count(&view.diagrams));
    output::action("panels", &count(&view.panels));
    output::action("lineage flows", &count(&view.lineage_flows));
    output::action("lineage specifications", &count(&view.lineage_specs));
}

#[instrument(skip(container))]
fn cmd_measurables(container: &ServiceContainer, related: Option<&EntityRef>) -> CliResult<()> {
    let records = match related {
        Some(entity) => container.catalog.measurables_related_to(entity)?,
        None => container.catalog.measurables()?,
    };
    let forest = container.taxonomy.build(records)?;
    print_trees(&forest)?;
    warn_absorbed(&forest);
    Ok(())
}
