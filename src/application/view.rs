//! Data-type list view state
//!
//! Lookups complete independently and in any order. Each completion is an
//! immutable `ViewUpdate` that `DataTypeView::apply` folds into the next state.

use serde_json::Value;
use tracing::debug;

use crate::domain::{EntityId, Forest, Node, Record};

/// One completed lookup or user action.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewUpdate {
    Diagrams(Vec<Value>),
    Panels(Vec<Value>),
    LineageFlows(Vec<Value>),
    LineageSpecs(Vec<Value>),
    NodeSelected(EntityId),
    SelectionCleared,
}

/// Everything the data-type list presents.
///
/// Collaborator fields stay `None` until their lookup arrives; a failed
/// lookup leaves them `None`.
#[derive(Debug)]
pub struct DataTypeView {
    pub trees: Forest<Record>,
    pub selected: Option<EntityId>,
    pub diagrams: Option<Vec<Value>>,
    pub panels: Option<Vec<Value>>,
    pub lineage_flows: Option<Vec<Value>>,
    pub lineage_specs: Option<Vec<Value>>,
}

impl DataTypeView {
    pub fn new(trees: Forest<Record>) -> Self {
        Self {
            trees,
            selected: None,
            diagrams: None,
            panels: None,
            lineage_flows: None,
            lineage_specs: None,
        }
    }

    /// Merge one update. Each field is last-write-wins.
    pub fn apply(mut self, update: ViewUpdate) -> Self {
        match update {
            ViewUpdate::Diagrams(xs) => self.diagrams = Some(xs),
            ViewUpdate::Panels(xs) => self.panels = Some(xs),
            ViewUpdate::LineageFlows(xs) => self.lineage_flows = Some(xs),
            ViewUpdate::LineageSpecs(xs) => self.lineage_specs = Some(xs),
            ViewUpdate::NodeSelected(id) => {
                if self.trees.find(&id).is_some() {
                    self.selected = Some(id);
                } else {
                    debug!("ignoring selection of unknown node {}", id);
                }
            }
            ViewUpdate::SelectionCleared => self.selected = None,
        }
        self
    }

    pub fn apply_all(self, updates: impl IntoIterator<Item = ViewUpdate>) -> Self {
        updates.into_iter().fold(self, Self::apply)
    }

    pub fn selected_node(&self) -> Option<&Node<Record>> {
        self.selected.as_ref().and_then(|id| self.trees.find(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::build_hierarchies;
    use serde_json::json;

    fn view() -> DataTypeView {
        DataTypeView::new(build_hierarchies(vec![
            Record::new(1i64, None),
            Record::new(2i64, Some(EntityId::Number(1))),
        ]))
    }

    #[test]
    fn given_updates_in_any_order_when_applied_then_same_state() {
        let a = vec![
            ViewUpdate::Panels(vec![json!({"id": 1})]),
            ViewUpdate::Diagrams(vec![json!({"id": 2})]),
        ];
        let mut b = a.clone();
        b.reverse();

        let left = view().apply_all(a);
        let right = view().apply_all(b);
        assert_eq!(left.panels, right.panels);
        assert_eq!(left.diagrams, right.diagrams);
        assert!(left.lineage_flows.is_none());
    }

    #[test]
    fn given_repeated_update_when_applied_then_last_write_wins() {
        let state = view().apply_all(vec![
            ViewUpdate::LineageFlows(vec![json!(1)]),
            ViewUpdate::LineageFlows(vec![json!(2)]),
        ]);
        assert_eq!(state.lineage_flows, Some(vec![json!(2)]));
    }

    #[test]
    fn given_known_node_when_selected_then_selected_node_resolves() {
        let state = view().apply(ViewUpdate::NodeSelected(EntityId::Number(2)));
        let node = state.selected_node().unwrap();
        assert_eq!(node.entity.to_string(), "2");
        assert!(node.parent.is_some());

        let state = state.apply(ViewUpdate::SelectionCleared);
        assert!(state.selected_node().is_none());
    }

    #[test]
    fn given_unknown_node_when_selected_then_keeps_previous_selection() {
        let state = view()
            .apply(ViewUpdate::NodeSelected(EntityId::Number(1)))
            .apply(ViewUpdate::NodeSelected(EntityId::Number(99)));
        assert_eq!(state.selected, Some(EntityId::Number(1)));
    }
}
