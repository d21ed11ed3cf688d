//! Picker session service
//!
//! Drives a [`Picker`] against the remote collaborators: every effect the reducer
//! emits is executed here and its completion fed back in. The picker lock is never
//! held across a remote call, so several intents can be in flight at once on a
//! single-threaded runtime.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, instrument};

use crate::application::picker::{Completion, Effect, Intent, Msg, Picker, Step};
use crate::application::services::NodeLoader;
use crate::application::ApplicationResult;
use crate::domain::RelocationReceipt;
use crate::infrastructure::traits::AssetRegistry;

/// Service owning one picker instance for the lifetime of a relocation dialog.
pub struct PickerService {
    loader: NodeLoader,
    registry: Arc<dyn AssetRegistry>,
    picker: Mutex<Picker>,
}

impl PickerService {
    /// Create a new session; the forest stays empty until [`PickerService::mount`].
    pub fn new(loader: NodeLoader, registry: Arc<dyn AssetRegistry>, picker: Picker) -> Self {
        Self {
            loader,
            registry,
            picker: Mutex::new(picker),
        }
    }

    /// Load the root set.
    pub async fn mount(&self) -> ApplicationResult<()> {
        self.dispatch(Intent::LoadRoots).await.map(|_| ())
    }

    /// Handle one intent through to its settled state.
    ///
    /// Returns the registry receipt when this intent completed a relocation.
    #[instrument(level = "debug", skip(self))]
    pub async fn dispatch(&self, intent: Intent) -> ApplicationResult<Option<RelocationReceipt>> {
        let mut msg = Msg::from(intent);
        loop {
            let step = self.lock().update(msg)?;
            match step {
                Step::Idle => return Ok(None),
                Step::Relocated(receipt) => return Ok(Some(receipt)),
                Step::Run(effect) => msg = self.run(effect).await.into(),
            }
        }
    }

    async fn run(&self, effect: Effect) -> Completion {
        debug!("run: {:?}", effect);
        match effect {
            Effect::FetchRoots { ticket } => Completion::RootsLoaded {
                ticket,
                result: self.loader.load_roots().await,
            },
            Effect::FetchChildren { id, ticket } => {
                let result = self.loader.load_children(&id).await;
                Completion::ChildrenLoaded { id, ticket, result }
            }
            Effect::Relocate(request) => Completion::RelocationSettled {
                result: self
                    .registry
                    .relocate_asset(&request.asset, &request.location, &request.justification)
                    .await,
            },
        }
    }

    /// Copy of the current picker state.
    pub fn snapshot(&self) -> Picker {
        self.lock().clone()
    }

    /// Read the current state without cloning it.
    pub fn with_picker<R>(&self, f: impl FnOnce(&Picker) -> R) -> R {
        f(&self.lock())
    }

    fn lock(&self) -> MutexGuard<'_, Picker> {
        self.picker.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
