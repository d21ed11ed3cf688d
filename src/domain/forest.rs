use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use generational_arena::{Arena, Index};
use tracing::{debug, instrument, warn};

use crate::domain::entities::{ClassifiedLocation, LocationId};

/// Tree node in the arena-backed location forest.
///
/// A node is an immutable snapshot: its kind is fixed when it enters the forest,
/// and expansion or loading flags are kept outside of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationNode {
    pub id: LocationId,
    pub label: String,
    /// Result of the classification probe, never recomputed
    pub is_branch: bool,
    /// Index of parent node in the arena, None for roots
    parent: Option<Index>,
    /// Indices of child nodes; None until the children were fetched
    children: Option<Vec<Index>>,
}

impl LocationNode {
    /// True once a children fetch for this node was merged, even if it came back empty.
    pub fn children_loaded(&self) -> bool {
        self.children.is_some()
    }

    pub fn child_count(&self) -> usize {
        self.children.as_ref().map_or(0, Vec::len)
    }
}

/// One line of the rendered picker: a node plus its indentation.
#[derive(Debug, Clone, Copy)]
pub struct VisibleRow<'a> {
    pub node: &'a LocationNode,
    pub depth: usize,
    pub expanded: bool,
}

/// Arena-based forest of locations, materialised level by level.
///
/// Nodes live in a generational arena and are addressed by id through a side
/// table; parent/child links are arena indices. Every mutation goes through
/// [`Forest::merge_children`], which returns a new forest and leaves `self` intact.
/// Nodes are shared between snapshots; a merge copies only the node it changes.
#[derive(Debug, Clone)]
pub struct Forest {
    /// Arena storage for all materialised nodes
    arena: Arena<Arc<LocationNode>>,
    /// Id lookup into the arena
    by_id: HashMap<LocationId, Index>,
    /// Top-level nodes in source order
    roots: Vec<Index>,
}

impl Default for Forest {
    fn default() -> Self {
        Self::new()
    }
}

impl Forest {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            by_id: HashMap::new(),
            roots: Vec::new(),
        }
    }

    /// Build a forest holding only the given top-level nodes, in order.
    ///
    /// A repeated id keeps its first occurrence.
    #[instrument(level = "debug", skip(roots))]
    pub fn from_roots(roots: impl IntoIterator<Item = ClassifiedLocation>) -> Self {
        let mut forest = Self::new();
        for entry in roots {
            if forest.by_id.contains_key(&entry.location.id) {
                warn!("duplicate root id dropped: {}", entry.location.id);
                continue;
            }
            let idx = forest.insert(entry, None);
            forest.roots.push(idx);
        }
        debug!("from_roots: {} roots", forest.roots.len());
        forest
    }

    fn insert(&mut self, entry: ClassifiedLocation, parent: Option<Index>) -> Index {
        let id = entry.location.id.clone();
        let idx = self.arena.insert(Arc::new(LocationNode {
            id: entry.location.id,
            label: entry.location.label,
            is_branch: entry.is_branch,
            parent,
            children: None,
        }));
        self.by_id.insert(id, idx);
        idx
    }

    /// Return a new forest in which the node `id` has exactly `children`, in order.
    ///
    /// Missing `id` returns an unchanged copy: the node may have been dropped by a
    /// refresh while its fetch was in flight. Children replaced by a second merge are
    /// removed along with their subtrees. A child whose id is already materialised
    /// elsewhere is skipped so ids stay unique and the forest stays acyclic.
    #[instrument(level = "debug", skip(self, children), fields(count = children.len()))]
    pub fn merge_children(&self, id: &LocationId, children: Vec<ClassifiedLocation>) -> Forest {
        let Some(&target) = self.by_id.get(id) else {
            debug!("merge target not in forest: {}", id);
            return self.clone();
        };

        let mut next = self.clone();
        let previous = next
            .arena
            .get_mut(target)
            .and_then(|n| Arc::make_mut(n).children.take());
        for child in previous.into_iter().flatten() {
            next.remove_subtree(child);
        }

        let mut indices = Vec::with_capacity(children.len());
        for entry in children {
            if next.by_id.contains_key(&entry.location.id) {
                warn!(
                    "child {} of {} already materialised, skipped",
                    entry.location.id, id
                );
                continue;
            }
            indices.push(next.insert(entry, Some(target)));
        }

        if let Some(node) = next.arena.get_mut(target) {
            Arc::make_mut(node).children = Some(indices);
        }
        next
    }

    fn remove_subtree(&mut self, idx: Index) {
        let mut stack = vec![idx];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.arena.remove(current) {
                self.by_id.remove(&node.id);
                stack.extend(node.children.iter().flatten().copied());
            }
        }
    }

    fn node(&self, idx: Index) -> Option<&LocationNode> {
        self.arena.get(idx).map(|node| &**node)
    }

    pub fn get(&self, id: &LocationId) -> Option<&LocationNode> {
        self.by_id.get(id).and_then(|&idx| self.node(idx))
    }

    pub fn contains(&self, id: &LocationId) -> bool {
        self.by_id.contains_key(id)
    }

    /// Number of materialised nodes.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn roots(&self) -> impl Iterator<Item = &LocationNode> + '_ {
        self.roots.iter().filter_map(|&idx| self.node(idx))
    }

    /// Loaded children of `id` in source order; empty when unknown or not loaded.
    pub fn children(&self, id: &LocationId) -> Vec<&LocationNode> {
        self.get(id)
            .and_then(|node| node.children.as_ref())
            .map(|children| {
                children
                    .iter()
                    .filter_map(|&idx| self.node(idx))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn parent(&self, id: &LocationId) -> Option<&LocationNode> {
        self.get(id)
            .and_then(|node| node.parent)
            .and_then(|idx| self.node(idx))
    }

    /// Nodes from the top-level ancestor down to `id` inclusive.
    pub fn path(&self, id: &LocationId) -> Vec<&LocationNode> {
        let mut path = Vec::new();
        let mut current = self.by_id.get(id).copied();
        while let Some(idx) = current {
            match self.node(idx) {
                Some(node) => {
                    path.push(node);
                    current = node.parent;
                }
                None => break,
            }
        }
        path.reverse();
        path
    }

    /// Depth-first pre-order traversal of every materialised node with its depth.
    pub fn iter(&self) -> ForestIterator<'_> {
        ForestIterator::new(self, None)
    }

    /// Rows to render: like [`Forest::iter`], but only descends into expanded nodes.
    pub fn visible_rows<'a>(&'a self, expanded: &'a HashSet<LocationId>) -> Vec<VisibleRow<'a>> {
        ForestIterator::new(self, Some(expanded))
            .map(|(depth, node)| VisibleRow {
                node,
                depth,
                expanded: expanded.contains(&node.id),
            })
            .collect()
    }

    /// Height of the materialised forest; 0 when empty.
    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        self.roots
            .iter()
            .map(|&root| self.calculate_depth(root))
            .max()
            .unwrap_or(0)
    }

    fn calculate_depth(&self, idx: Index) -> usize {
        if let Some(node) = self.node(idx) {
            1 + node
                .children
                .iter()
                .flatten()
                .map(|&child| self.calculate_depth(child))
                .max()
                .unwrap_or(0)
        } else {
            0
        }
    }

    fn same_subtree(&self, a: Index, other: &Forest, b: Index) -> bool {
        match (self.node(a), other.node(b)) {
            (Some(left), Some(right)) => {
                left.id == right.id
                    && left.label == right.label
                    && left.is_branch == right.is_branch
                    && match (&left.children, &right.children) {
                        (None, None) => true,
                        (Some(lc), Some(rc)) => {
                            lc.len() == rc.len()
                                && lc
                                    .iter()
                                    .zip(rc)
                                    .all(|(&l, &r)| self.same_subtree(l, other, r))
                        }
                        _ => false,
                    }
            }
            _ => false,
        }
    }
}

/// Structural equality: same nodes, same order, same load state.
/// Arena indices are not compared.
impl PartialEq for Forest {
    fn eq(&self, other: &Self) -> bool {
        self.roots.len() == other.roots.len()
            && self
                .roots
                .iter()
                .zip(&other.roots)
                .all(|(&a, &b)| self.same_subtree(a, other, b))
    }
}

impl Eq for Forest {}

pub struct ForestIterator<'a> {
    forest: &'a Forest,
    /// When set, only nodes in this set contribute their children
    expanded: Option<&'a HashSet<LocationId>>,
    stack: Vec<(Index, usize)>,
}

impl<'a> ForestIterator<'a> {
    fn new(forest: &'a Forest, expanded: Option<&'a HashSet<LocationId>>) -> Self {
        // Push roots in reverse order for left-to-right traversal
        let stack = forest.roots.iter().rev().map(|&idx| (idx, 0)).collect();
        Self {
            forest,
            expanded,
            stack,
        }
    }
}

impl<'a> Iterator for ForestIterator<'a> {
    type Item = (usize, &'a LocationNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((current, depth)) = self.stack.pop() {
            let Some(node) = self.forest.node(current) else {
                continue;
            };
            let descend = self
                .expanded
                .map_or(true, |expanded| expanded.contains(&node.id));
            if descend {
                for &child in node.children.iter().flatten().rev() {
                    self.stack.push((child, depth + 1));
                }
            }
            return Some((depth, node));
        }
        None
    }
}
