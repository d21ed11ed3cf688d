//! Node loading service
//!
//! Fetches locations from the directory and classifies each one as branch or leaf
//! by probing its children once.

use std::sync::Arc;

use futures::future::try_join_all;
use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{debug, instrument, warn};

use crate::domain::{ClassifiedLocation, FetchError, Location, LocationId};
use crate::infrastructure::traits::LocationDirectory;

/// Default probe limit per level; 0 probes every sibling at once.
pub const DEFAULT_PROBE_CONCURRENCY: usize = 0;

/// Service that materialises one tree level at a time.
pub struct NodeLoader {
    directory: Arc<dyn LocationDirectory>,
    /// Cap on probes in flight per level, None for no cap
    probe_limit: Option<usize>,
}

impl NodeLoader {
    /// Create a new loader. A concurrency of 0 probes a whole level at once.
    pub fn new(directory: Arc<dyn LocationDirectory>, probe_concurrency: usize) -> Self {
        Self {
            directory,
            probe_limit: (probe_concurrency > 0).then_some(probe_concurrency),
        }
    }

    /// Fetch and classify the top-level locations.
    #[instrument(level = "debug", skip(self))]
    pub async fn load_roots(&self) -> Result<Vec<ClassifiedLocation>, FetchError> {
        let roots = self.directory.fetch_root_locations().await.map_err(|e| {
            warn!("fetch roots: {}", e);
            e
        })?;
        debug!("load_roots: {} roots, probing", roots.len());
        self.classify_all(roots).await
    }

    /// Fetch the children of `id` and classify each of them.
    #[instrument(level = "debug", skip(self))]
    pub async fn load_children(
        &self,
        id: &LocationId,
    ) -> Result<Vec<ClassifiedLocation>, FetchError> {
        let children = self.directory.fetch_location_children(id).await.map_err(|e| {
            warn!("fetch children of {}: {}", id, e);
            e
        })?;
        debug!("load_children: {} children of {}, probing", children.len(), id);
        self.classify_all(children).await
    }

    /// Probe every location concurrently and join in source order.
    ///
    /// The first failed probe fails the whole level.
    async fn classify_all(
        &self,
        locations: Vec<Location>,
    ) -> Result<Vec<ClassifiedLocation>, FetchError> {
        match self.probe_limit {
            None => try_join_all(locations.into_iter().map(|location| self.classify(location))).await,
            Some(limit) => {
                stream::iter(locations)
                    .map(|location| self.classify(location))
                    .buffered(limit)
                    .try_collect()
                    .await
            }
        }
    }

    async fn classify(&self, location: Location) -> Result<ClassifiedLocation, FetchError> {
        let probe = self
            .directory
            .fetch_location_children(&location.id)
            .await
            .map_err(|e| {
                warn!("probe {}: {}", location.id, e);
                e
            })?;
        let is_branch = !probe.is_empty();
        debug!("classified {} as {}", location.id, if is_branch { "branch" } else { "leaf" });
        Ok(ClassifiedLocation {
            location,
            is_branch,
        })
    }
}
