//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on the remote boundary traits (LocationDirectory, AssetRegistry)
//! but are themselves concrete structs, not traits.

mod loader;
mod session;

pub use loader::{NodeLoader, DEFAULT_PROBE_CONCURRENCY};
pub use session::PickerService;
