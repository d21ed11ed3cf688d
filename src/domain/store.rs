use std::sync::Arc;

use tracing::debug;

use crate::domain::entities::{ClassifiedLocation, LocationId};
use crate::domain::forest::Forest;

/// Holds the current forest snapshot.
///
/// Readers get an `Arc<Forest>` that stays valid after later merges;
/// each merge swaps in a freshly built forest.
#[derive(Debug, Clone, Default)]
pub struct NodeStore {
    forest: Arc<Forest>,
}

impl NodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole forest with a new top-level set.
    pub fn set_roots(&mut self, roots: Vec<ClassifiedLocation>) {
        self.forest = Arc::new(Forest::from_roots(roots));
        debug!("set_roots: {} nodes", self.forest.len());
    }

    pub fn merge_children(&mut self, id: &LocationId, children: Vec<ClassifiedLocation>) {
        self.forest = Arc::new(self.forest.merge_children(id, children));
    }

    pub fn clear(&mut self) {
        self.forest = Arc::new(Forest::new());
    }

    pub fn forest(&self) -> &Forest {
        &self.forest
    }

    pub fn snapshot(&self) -> Arc<Forest> {
        Arc::clone(&self.forest)
    }
}
