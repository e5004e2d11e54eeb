use std::collections::HashMap;

use generational_arena::{Arena, Index};
use serde::Serialize;
use termtree::Tree;
use tracing::instrument;

use crate::domain::builder::Diagnostics;
use crate::domain::entity::Entity;
use crate::domain::error::{DomainError, DomainResult};

/// Deepest tree that `Forest::to_nested` and `Forest::to_tree_strings` accept.
pub const MAX_NESTING_DEPTH: usize = 256;

/// Tree node in the arena-based hierarchy structure.
#[derive(Debug)]
pub struct Node<E> {
    /// The wrapped input entity
    pub entity: E,
    /// Index of parent node in the arena, None for root nodes.
    /// Lookup only: the arena owns every node.
    pub parent: Option<Index>,
    /// Indices of child nodes in the arena, in input order
    pub children: Vec<Index>,
}

impl<E> Node<E> {
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// All hierarchies derived from one input collection.
///
/// Nodes live in a generational arena; roots are kept in input order and an
/// identifier index gives O(1) lookups. A forest is immutable once built.
#[derive(Debug)]
pub struct Forest<E: Entity> {
    arena: Arena<Node<E>>,
    roots: Vec<Index>,
    index: HashMap<E::Id, Index>,
    diagnostics: Diagnostics<E::Id>,
}

impl<E: Entity> Default for Forest<E> {
    fn default() -> Self {
        Self::with_capacity(0)
    }
}

/// Structure-only view of a forest: pre-order `(depth, id)` entries, roots at depth 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outline<Id> {
    pub entries: Vec<(usize, Id)>,
}

/// Serializable `{entity, children}` view of a tree.
#[derive(Debug, Serialize)]
pub struct NestedNode<'a, E> {
    pub entity: &'a E,
    pub children: Vec<NestedNode<'a, E>>,
}

impl<E: Entity> Forest<E> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            arena: Arena::with_capacity(capacity),
            roots: Vec::new(),
            index: HashMap::with_capacity(capacity),
            diagnostics: Diagnostics::default(),
        }
    }

    /// Store an unlinked node. Returns false as second element if its
    /// identifier was already indexed; the index keeps the first occurrence.
    pub(crate) fn insert_unlinked(&mut self, entity: E) -> (Index, bool) {
        let id = entity.id().clone();
        let idx = self.arena.insert(Node {
            entity,
            parent: None,
            children: Vec::new(),
        });
        let fresh = match self.index.entry(id) {
            std::collections::hash_map::Entry::Occupied(_) => false,
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(idx);
                true
            }
        };
        (idx, fresh)
    }

    pub(crate) fn attach(&mut self, child: Index, parent: Index) {
        if let Some(parent_node) = self.arena.get_mut(parent) {
            parent_node.children.push(child);
        }
        if let Some(child_node) = self.arena.get_mut(child) {
            child_node.parent = Some(parent);
        }
    }

    pub(crate) fn push_root(&mut self, idx: Index) {
        self.roots.push(idx);
    }

    pub(crate) fn set_diagnostics(&mut self, diagnostics: Diagnostics<E::Id>) {
        self.diagnostics = diagnostics;
    }

    /// Number of nodes, equal to the number of input entities.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn root_indices(&self) -> &[Index] {
        &self.roots
    }

    pub fn roots(&self) -> impl Iterator<Item = (Index, &Node<E>)> + '_ {
        self.roots
            .iter()
            .filter_map(move |&idx| self.arena.get(idx).map(|n| (idx, n)))
    }

    pub fn get_node(&self, idx: Index) -> Option<&Node<E>> {
        self.arena.get(idx)
    }

    /// Problems absorbed while building.
    pub fn diagnostics(&self) -> &Diagnostics<E::Id> {
        &self.diagnostics
    }

    pub fn find_index(&self, id: &E::Id) -> Option<Index> {
        self.index.get(id).copied()
    }

    /// Node wrapping the entity with this identifier.
    ///
    /// With duplicate identifiers in the input this is the first occurrence.
    pub fn find(&self, id: &E::Id) -> Option<&Node<E>> {
        self.find_index(id).and_then(|idx| self.get_node(idx))
    }

    /// First node in pre-order whose entity matches the predicate.
    pub fn find_by<P>(&self, mut predicate: P) -> Option<(Index, &Node<E>)>
    where
        P: FnMut(&E) -> bool,
    {
        self.iter().find(|(_, node)| predicate(&node.entity))
    }

    /// Pre-order traversal over all trees, roots and siblings left to right.
    pub fn iter(&self) -> TreeIterator<'_, E> {
        TreeIterator::new(self, &self.roots)
    }

    /// Pre-order traversal of the subtree rooted at `idx`, including `idx`.
    pub fn subtree(&self, idx: Index) -> TreeIterator<'_, E> {
        TreeIterator::new(self, &[idx])
    }

    pub fn iter_postorder(&self) -> PostOrderIterator<'_, E> {
        PostOrderIterator::new(self)
    }

    /// Nodes strictly below `idx`, in pre-order.
    pub fn descendants(&self, idx: Index) -> impl Iterator<Item = (Index, &Node<E>)> + '_ {
        self.subtree(idx).skip(1)
    }

    /// Parent chain of `idx`, nearest first, excluding `idx` itself.
    pub fn ancestors(&self, idx: Index) -> Ancestors<'_, E> {
        Ancestors {
            forest: self,
            next: self.get_node(idx).and_then(|n| n.parent),
        }
    }

    /// Identifiers from the node up to its root, node first.
    pub fn path_to_root(&self, id: &E::Id) -> Option<Vec<&E::Id>> {
        let idx = self.find_index(id)?;
        let node = self.get_node(idx)?;
        let mut path = vec![node.entity.id()];
        path.extend(self.ancestors(idx).map(|(_, n)| n.entity.id()));
        Some(path)
    }

    /// Number of levels in the deepest tree, 0 for an empty forest.
    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        let mut max_depth = 0;
        let mut stack: Vec<(Index, usize)> = self.roots.iter().map(|&r| (r, 1)).collect();
        while let Some((idx, depth)) = stack.pop() {
            max_depth = max_depth.max(depth);
            if let Some(node) = self.get_node(idx) {
                stack.extend(node.children.iter().map(|&c| (c, depth + 1)));
            }
        }
        max_depth
    }

    /// Identifiers of all nodes without children, in pre-order.
    #[instrument(level = "debug", skip(self))]
    pub fn leaf_nodes(&self) -> Vec<&E::Id> {
        self.iter()
            .filter(|(_, node)| node.is_leaf())
            .map(|(_, node)| node.entity.id())
            .collect()
    }

    /// One branch per leaf, listing identifiers from the leaf up to its root.
    #[instrument(level = "debug", skip(self))]
    pub fn branches(&self) -> Vec<Vec<&E::Id>> {
        self.iter()
            .filter(|(_, node)| node.is_leaf())
            .map(|(idx, node)| {
                let mut branch = vec![node.entity.id()];
                branch.extend(self.ancestors(idx).map(|(_, n)| n.entity.id()));
                branch
            })
            .collect()
    }

    /// Structure of every tree as a flat pre-order list of `(depth, id)`;
    /// equal outlines mean structurally identical forests.
    pub fn outline(&self) -> Outline<E::Id> {
        let mut entries = Vec::with_capacity(self.len());
        let mut stack: Vec<(Index, usize)> = self.roots.iter().rev().map(|&r| (r, 0)).collect();
        while let Some((idx, depth)) = stack.pop() {
            if let Some(node) = self.get_node(idx) {
                entries.push((depth, node.entity.id().clone()));
                stack.extend(node.children.iter().rev().map(|&c| (c, depth + 1)));
            }
        }
        Outline { entries }
    }

    /// Fail if the deepest tree exceeds `MAX_NESTING_DEPTH`.
    fn check_nesting(&self) -> DomainResult<()> {
        let depth = self.depth();
        if depth > MAX_NESTING_DEPTH {
            return Err(DomainError::NestingTooDeep {
                depth,
                limit: MAX_NESTING_DEPTH,
            });
        }
        Ok(())
    }

    /// Combine nodes bottom-up: `build` receives a node and its children's
    /// results, in order. Returns one result per root.
    fn fold_postorder<'a, T, F>(&'a self, mut build: F) -> Vec<T>
    where
        F: FnMut(&'a Node<E>, Vec<T>) -> T,
    {
        // Post-order leaves each node's children on top of the stack
        let mut stack: Vec<T> = Vec::new();
        for (_, node) in self.iter_postorder() {
            let children = stack.split_off(stack.len().saturating_sub(node.children.len()));
            let built = build(node, children);
            stack.push(built);
        }
        stack
    }

    /// Serializable `{entity, children}` trees.
    ///
    /// Serializing nests once per level, so forests deeper than
    /// `MAX_NESTING_DEPTH` are rejected.
    pub fn to_nested(&self) -> DomainResult<Vec<NestedNode<'_, E>>> {
        self.check_nesting()?;
        Ok(self.fold_postorder(|node, children| NestedNode {
            entity: &node.entity,
            children,
        }))
    }

    /// Render every tree with entity labels.
    ///
    /// Same depth limit as `to_nested`.
    pub fn to_tree_strings(&self) -> DomainResult<Vec<Tree<String>>> {
        self.check_nesting()?;
        Ok(self.fold_postorder(|node, children| {
            Tree::new(node.entity.label()).with_leaves(children)
        }))
    }
}

pub struct TreeIterator<'a, E: Entity> {
    forest: &'a Forest<E>,
    stack: Vec<Index>,
}

impl<'a, E: Entity> TreeIterator<'a, E> {
    fn new(forest: &'a Forest<E>, starts: &[Index]) -> Self {
        // Reversed so the first start is popped first
        let stack = starts.iter().rev().copied().collect();
        Self { forest, stack }
    }
}

impl<'a, E: Entity> Iterator for TreeIterator<'a, E> {
    type Item = (Index, &'a Node<E>);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current_idx) = self.stack.pop() {
            if let Some(node) = self.forest.get_node(current_idx) {
                // Push children in reverse order for left-to-right traversal
                for &child in node.children.iter().rev() {
                    self.stack.push(child);
                }
                return Some((current_idx, node));
            }
        }
        None
    }
}

pub struct PostOrderIterator<'a, E: Entity> {
    forest: &'a Forest<E>,
    stack: Vec<(Index, bool)>,
}

impl<'a, E: Entity> PostOrderIterator<'a, E> {
    fn new(forest: &'a Forest<E>) -> Self {
        let stack = forest.roots.iter().rev().map(|&r| (r, false)).collect();
        Self { forest, stack }
    }
}

impl<'a, E: Entity> Iterator for PostOrderIterator<'a, E> {
    type Item = (Index, &'a Node<E>);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((current_idx, visited)) = self.stack.pop() {
            if let Some(node) = self.forest.get_node(current_idx) {
                if !visited {
                    self.stack.push((current_idx, true));
                    for &child in node.children.iter().rev() {
                        self.stack.push((child, false));
                    }
                } else {
                    return Some((current_idx, node));
                }
            }
        }
        None
    }
}

pub struct Ancestors<'a, E: Entity> {
    forest: &'a Forest<E>,
    next: Option<Index>,
}

impl<'a, E: Entity> Iterator for Ancestors<'a, E> {
    type Item = (Index, &'a Node<E>);

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.next?;
        let node = self.forest.get_node(idx)?;
        self.next = node.parent;
        Some((idx, node))
    }
}
