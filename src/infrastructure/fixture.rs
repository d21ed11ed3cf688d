//! File-backed collaborators
//!
//! A TOML fixture describes a location directory and how the asset registry
//! answers. Used by the CLI for offline runs and by tests.
//!
//! ```toml
//! [[locations]]
//! id = "B"
//! label = "Building B"
//!
//! [[locations]]
//! id = "C"
//! label = "Line 1"
//! parent = "B"
//! delay_ms = 20          # optional: latency of fetching C's children
//! unavailable = false    # optional: fetching C's children fails
//!
//! [registry]
//! reject = "asset is locked"   # optional: every relocation is refused
//! ```

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::domain::{
    AssetId, FetchError, Location, LocationId, RelocationReceipt, RelocationRequest,
};
use crate::infrastructure::traits::{AssetRegistry, LocationDirectory};
use crate::infrastructure::{InfraError, InfraResult};

/// Raw fixture document.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct FixtureFile {
    pub locations: Vec<FixtureLocation>,
    pub registry: FixtureRegistryConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FixtureLocation {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub unavailable: bool,
    #[serde(default)]
    pub delay_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct FixtureRegistryConfig {
    pub reject: Option<String>,
}

impl FixtureFile {
    pub fn parse(content: &str) -> InfraResult<Self> {
        toml::from_str(content).map_err(|e| InfraError::Fixture {
            message: format!("parse fixture: {e}"),
        })
    }

    pub fn load(path: &Path) -> InfraResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| InfraError::io(format!("read fixture {}", path.display()), e))?;
        Self::parse(&content)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-memory location directory built from a fixture.
#[derive(Debug)]
pub struct FixtureDirectory {
    roots: Vec<Location>,
    children: HashMap<LocationId, Vec<Location>>,
    delays: HashMap<LocationId, Duration>,
    unavailable: Mutex<HashSet<LocationId>>,
    root_calls: AtomicUsize,
    children_calls: Mutex<HashMap<LocationId, usize>>,
}

impl FixtureDirectory {
    /// Build the directory, rejecting duplicate ids and unknown parents.
    pub fn new(locations: Vec<FixtureLocation>) -> InfraResult<Self> {
        let known: HashSet<&str> = locations.iter().map(|l| l.id.as_str()).collect();
        let mut seen = HashSet::new();
        let mut roots = Vec::new();
        let mut children: HashMap<LocationId, Vec<Location>> = HashMap::new();
        let mut delays = HashMap::new();
        let mut unavailable = HashSet::new();

        for entry in &locations {
            if !seen.insert(entry.id.as_str()) {
                return Err(InfraError::Fixture {
                    message: format!("duplicate location id: {}", entry.id),
                });
            }
            let id = LocationId::new(entry.id.as_str());
            let location = Location::new(id.clone(), entry.label.as_str());
            match entry.parent.as_deref() {
                None => roots.push(location),
                Some(parent) if known.contains(parent) && parent != entry.id => children
                    .entry(LocationId::new(parent))
                    .or_default()
                    .push(location),
                Some(parent) => {
                    return Err(InfraError::Fixture {
                        message: format!("location {} has invalid parent: {}", entry.id, parent),
                    })
                }
            }
            if let Some(ms) = entry.delay_ms {
                delays.insert(id.clone(), Duration::from_millis(ms));
            }
            if entry.unavailable {
                unavailable.insert(id);
            }
        }
        debug!(
            "fixture directory: {} locations, {} roots",
            locations.len(),
            roots.len()
        );

        Ok(Self {
            roots,
            children,
            delays,
            unavailable: Mutex::new(unavailable),
            root_calls: AtomicUsize::new(0),
            children_calls: Mutex::new(HashMap::new()),
        })
    }

    /// Simulate an outage (or recovery) for the children list of `id`.
    pub fn set_unavailable(&self, id: &LocationId, unavailable: bool) {
        let mut set = lock(&self.unavailable);
        if unavailable {
            set.insert(id.clone());
        } else {
            set.remove(id);
        }
    }

    pub fn root_calls(&self) -> usize {
        self.root_calls.load(Ordering::SeqCst)
    }

    /// How often the children of `id` were requested, probes included.
    pub fn children_calls(&self, id: &LocationId) -> usize {
        lock(&self.children_calls).get(id).copied().unwrap_or(0)
    }

    pub fn total_children_calls(&self) -> usize {
        lock(&self.children_calls).values().sum()
    }
}

#[async_trait]
impl LocationDirectory for FixtureDirectory {
    async fn fetch_root_locations(&self) -> Result<Vec<Location>, FetchError> {
        self.root_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.roots.clone())
    }

    #[instrument(level = "trace", skip(self))]
    async fn fetch_location_children(&self, id: &LocationId) -> Result<Vec<Location>, FetchError> {
        *lock(&self.children_calls).entry(id.clone()).or_default() += 1;
        if let Some(delay) = self.delays.get(id) {
            tokio::time::sleep(*delay).await;
        }
        if lock(&self.unavailable).contains(id) {
            return Err(FetchError::new(format!("location service unavailable for {id}")));
        }
        Ok(self.children.get(id).cloned().unwrap_or_default())
    }
}

/// Asset registry that accepts (or uniformly refuses) every relocation and
/// records the requests it saw.
#[derive(Debug, Default)]
pub struct FixtureRegistry {
    reject: Mutex<Option<String>>,
    requests: Mutex<Vec<RelocationRequest>>,
}

impl FixtureRegistry {
    pub fn new(config: FixtureRegistryConfig) -> Self {
        Self {
            reject: Mutex::new(config.reject),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Refuse subsequent relocations with `message`, or accept them again with `None`.
    pub fn set_reject(&self, message: Option<String>) {
        *lock(&self.reject) = message;
    }

    pub fn requests(&self) -> Vec<RelocationRequest> {
        lock(&self.requests).clone()
    }
}

#[async_trait]
impl AssetRegistry for FixtureRegistry {
    async fn relocate_asset(
        &self,
        asset: &AssetId,
        location: &LocationId,
        justification: &str,
    ) -> Result<RelocationReceipt, FetchError> {
        lock(&self.requests).push(RelocationRequest {
            asset: asset.clone(),
            location: location.clone(),
            justification: justification.to_string(),
        });
        let reject = lock(&self.reject).clone();
        Ok(match reject {
            Some(message) => RelocationReceipt::rejected(message),
            None => RelocationReceipt::accepted(format!("asset {asset} relocated to {location}")),
        })
    }
}

/// Load a fixture file into its two collaborators.
pub fn load_fixture(path: &Path) -> InfraResult<(FixtureDirectory, FixtureRegistry)> {
    let fixture = FixtureFile::load(path)?;
    let directory = FixtureDirectory::new(fixture.locations)?;
    Ok((directory, FixtureRegistry::new(fixture.registry)))
}
