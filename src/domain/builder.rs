//! Hierarchy builder: flat parent-referencing entities to a forest of trees.

use std::collections::HashMap;

use generational_arena::Index;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::domain::arena::Forest;
use crate::domain::entity::Entity;
use crate::domain::error::{DomainError, DomainResult};

/// How malformed parent references are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildPolicy {
    /// Dangling and cyclic references turn the entity into a root.
    #[default]
    Lenient,
    /// The first duplicate, dangling or cyclic reference is an error.
    Strict,
}

/// Problems absorbed while building a forest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostics<Id> {
    /// `(id, parent)` pairs whose parent is not in the input
    pub dangling: Vec<(Id, Id)>,
    /// Entities whose parent link would make them their own ancestor
    pub cycles: Vec<Id>,
    /// Identifiers seen more than once, one entry per extra occurrence
    pub duplicates: Vec<Id>,
}

impl<Id> Default for Diagnostics<Id> {
    fn default() -> Self {
        Self {
            dangling: Vec::new(),
            cycles: Vec::new(),
            duplicates: Vec::new(),
        }
    }
}

impl<Id> Diagnostics<Id> {
    pub fn is_clean(&self) -> bool {
        self.dangling.is_empty() && self.cycles.is_empty() && self.duplicates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.dangling.len() + self.cycles.len() + self.duplicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.is_clean()
    }
}

/// Constructs forests from flat entity collections.
#[derive(Debug, Clone, Default)]
pub struct HierarchyBuilder {
    policy: BuildPolicy,
}

impl HierarchyBuilder {
    pub fn new(policy: BuildPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> BuildPolicy {
        self.policy
    }

    /// Build one forest from the entities.
    ///
    /// Indexes every entity, then links each one to its parent in input
    /// order. Siblings and roots keep their relative input order. Under
    /// `BuildPolicy::Lenient` this never fails.
    #[instrument(level = "debug", skip(self, entities))]
    pub fn build<E, I>(&self, entities: I) -> DomainResult<Forest<E>>
    where
        E: Entity,
        I: IntoIterator<Item = E>,
    {
        let entities = entities.into_iter();
        let capacity = entities.size_hint().0;
        let mut forest = Forest::with_capacity(capacity);
        let mut diagnostics = Diagnostics::default();

        // Pass 1: one node per entity
        let mut order = Vec::with_capacity(capacity);
        let mut positions: HashMap<Index, usize> = HashMap::with_capacity(capacity);
        for entity in entities {
            let id = entity.id().clone();
            let (idx, fresh) = forest.insert_unlinked(entity);
            if !fresh {
                warn!("duplicate identifier {}", id);
                diagnostics.duplicates.push(id);
            }
            positions.insert(idx, order.len());
            order.push(idx);
        }

        let links: Vec<Link> = order
            .iter()
            .map(|&idx| {
                let parent = forest
                    .get_node(idx)
                    .and_then(|node| node.entity.parent_id());
                match parent {
                    None => Link::Root,
                    Some(parent_id) => match forest.find_index(parent_id) {
                        None => Link::Dangling,
                        Some(parent_idx) => positions
                            .get(&parent_idx)
                            .map_or(Link::Dangling, |&pos| Link::Parent(parent_idx, pos)),
                    },
                }
            })
            .collect();
        let breakers = cycle_breakers(&links);

        // Pass 2: link to parents
        for (pos, &idx) in order.iter().enumerate() {
            match links[pos] {
                Link::Root => forest.push_root(idx),
                Link::Dangling => {
                    if let Some(node) = forest.get_node(idx) {
                        let id = node.entity.id().clone();
                        if let Some(parent_id) = node.entity.parent_id().cloned() {
                            debug!("dangling parent {} -> {}", id, parent_id);
                            diagnostics.dangling.push((id, parent_id));
                        }
                    }
                    forest.push_root(idx);
                }
                Link::Parent(_, _) if breakers[pos] => {
                    if let Some(node) = forest.get_node(idx) {
                        warn!("cyclic parent reference at {}", node.entity.id());
                        diagnostics.cycles.push(node.entity.id().clone());
                    }
                    forest.push_root(idx);
                }
                Link::Parent(parent_idx, _) => forest.attach(idx, parent_idx),
            }
        }

        if self.policy == BuildPolicy::Strict {
            Self::reject(&diagnostics)?;
        }

        debug!(
            "built {} nodes in {} trees",
            forest.len(),
            forest.root_indices().len()
        );
        forest.set_diagnostics(diagnostics);
        Ok(forest)
    }

    fn reject<Id: std::fmt::Display>(diagnostics: &Diagnostics<Id>) -> DomainResult<()> {
        if let Some(id) = diagnostics.duplicates.first() {
            return Err(DomainError::DuplicateId(id.to_string()));
        }
        // Dangling references are reported before cycles
        if let Some((id, parent)) = diagnostics.dangling.first() {
            return Err(DomainError::DanglingParentReference {
                id: id.to_string(),
                parent: parent.to_string(),
            });
        }
        if let Some(id) = diagnostics.cycles.first() {
            return Err(DomainError::CyclicReference(id.to_string()));
        }
        Ok(())
    }
}

/// Resolved parent reference of the entity at one input position.
#[derive(Debug, Clone, Copy)]
enum Link {
    Root,
    Dangling,
    /// Arena index and input position of the parent
    Parent(Index, usize),
}

/// Marks the input position that closes each cycle of parent links.
///
/// Links are made in input order, so within a cycle the member with the
/// highest position is the link that would close it. That member becomes a
/// root. Each position is visited once; walks stop at positions already
/// finished, so this is linear in the number of links.
fn cycle_breakers(links: &[Link]) -> Vec<bool> {
    const UNSEEN: u8 = 0;
    const ON_PATH: u8 = 1;
    const DONE: u8 = 2;

    let parent_of = |pos: usize| match links[pos] {
        Link::Parent(_, parent) => Some(parent),
        Link::Root | Link::Dangling => None,
    };

    let mut state = vec![UNSEEN; links.len()];
    let mut breakers = vec![false; links.len()];
    let mut path = Vec::new();
    for start in 0..links.len() {
        let mut current = Some(start);
        while let Some(pos) = current {
            if state[pos] != UNSEEN {
                break;
            }
            state[pos] = ON_PATH;
            path.push(pos);
            current = parent_of(pos);
        }

        // Walk ran into its own path: the tail from that position is a cycle
        if let Some(pos) = current.filter(|&pos| state[pos] == ON_PATH) {
            let cycle_start = path.iter().rposition(|&p| p == pos).unwrap_or(0);
            if let Some(&closing) = path[cycle_start..].iter().max() {
                breakers[closing] = true;
            }
        }
        for pos in path.drain(..) {
            state[pos] = DONE;
        }
    }
    breakers
}

/// Build a forest, absorbing dangling and cyclic references into the roots.
pub fn build_hierarchies<E, I>(entities: I) -> Forest<E>
where
    E: Entity,
    I: IntoIterator<Item = E>,
{
    // Lenient building cannot fail
    HierarchyBuilder::new(BuildPolicy::Lenient)
        .build(entities)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::{EntityId, Record};

    fn rec(id: i64, parent: Option<i64>) -> Record {
        Record::new(id, parent.map(EntityId::Number))
    }

    fn ids(forest: &Forest<Record>) -> Vec<i64> {
        forest
            .roots()
            .map(|(_, n)| match n.entity.id() {
                EntityId::Number(n) => *n,
                EntityId::Text(_) => -1,
            })
            .collect()
    }

    #[test]
    fn given_empty_input_when_building_then_empty_forest() {
        let forest: Forest<Record> = build_hierarchies(Vec::new());
        assert!(forest.is_empty());
        assert_eq!(forest.roots().count(), 0);
        assert_eq!(forest.depth(), 0);
    }

    #[test]
    fn given_children_before_parent_when_building_then_links_regardless_of_order() {
        let forest = build_hierarchies(vec![rec(3, Some(1)), rec(2, Some(1)), rec(1, None)]);
        assert_eq!(ids(&forest), vec![1]);
        let root = forest.find(&EntityId::Number(1)).unwrap();
        let children: Vec<_> = root
            .children
            .iter()
            .map(|&c| forest.get_node(c).unwrap().entity.id().clone())
            .collect();
        assert_eq!(children, vec![EntityId::Number(3), EntityId::Number(2)]);
    }

    #[test]
    fn given_strict_policy_and_clean_input_when_building_then_succeeds() {
        let builder = HierarchyBuilder::new(BuildPolicy::Strict);
        let forest = builder.build(vec![rec(1, None), rec(2, Some(1))]).unwrap();
        assert_eq!(forest.len(), 2);
        assert!(forest.diagnostics().is_clean());
    }

    #[test]
    fn given_numeric_id_and_text_parent_when_building_then_dangling() {
        let child = Record::new(2i64, Some(EntityId::from("1")));
        let forest = build_hierarchies(vec![rec(1, None), child]);
        assert_eq!(ids(&forest), vec![1, 2]);
        assert_eq!(
            forest.diagnostics().dangling,
            vec![(EntityId::Number(2), EntityId::from("1"))]
        );
    }

    #[test]
    fn given_duplicate_and_dangling_when_strict_then_duplicate_reported_first() {
        let builder = HierarchyBuilder::new(BuildPolicy::Strict);
        let err = builder
            .build(vec![rec(1, Some(9)), rec(1, None)])
            .unwrap_err();
        assert_eq!(err, DomainError::DuplicateId("1".into()));
    }
}
