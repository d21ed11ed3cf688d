//! Service container for dependency injection
//!
//! Wires settings and remote collaborators into picker sessions.

use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::application::services::{NodeLoader, PickerService};
use crate::application::Picker;
use crate::config::Settings;
use crate::domain::AssetId;
use crate::infrastructure::fixture::load_fixture;
use crate::infrastructure::traits::{AssetRegistry, LocationDirectory};
use crate::infrastructure::{InfraError, InfraResult};

/// Container holding the application settings and collaborators.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Location directory service
    pub directory: Arc<dyn LocationDirectory>,

    /// Asset registry service
    pub registry: Arc<dyn AssetRegistry>,
}

impl ServiceContainer {
    /// Create a container backed by the fixture named in the settings.
    pub fn from_fixture(settings: Settings) -> InfraResult<Self> {
        let path = settings.fixture.clone().ok_or_else(|| InfraError::Fixture {
            message: "no fixture configured (use --fixture or set `fixture` in config)".into(),
        })?;
        Self::with_fixture_file(settings, &path)
    }

    pub fn with_fixture_file(settings: Settings, path: &Path) -> InfraResult<Self> {
        debug!("loading fixture {}", path.display());
        let (directory, registry) = load_fixture(path)?;
        Ok(Self::with_deps(
            settings,
            Arc::new(directory),
            Arc::new(registry),
        ))
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(
        settings: Settings,
        directory: Arc<dyn LocationDirectory>,
        registry: Arc<dyn AssetRegistry>,
    ) -> Self {
        Self {
            settings: Arc::new(settings),
            directory,
            registry,
        }
    }

    pub fn loader(&self) -> NodeLoader {
        NodeLoader::new(
            Arc::clone(&self.directory),
            self.settings.loader.probe_concurrency,
        )
    }

    /// Fresh picker session for relocating `asset`.
    pub fn picker_service(&self, asset: AssetId) -> PickerService {
        let picker = Picker::new(asset, self.settings.picker.max_justification_len);
        PickerService::new(self.loader(), Arc::clone(&self.registry), picker)
    }
}
