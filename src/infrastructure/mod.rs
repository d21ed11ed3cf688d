//! Infrastructure layer: remote boundary traits, fixture collaborators and DI container
//!
//! This layer implements the boundary traits and wires up services.

pub mod di;
pub mod error;
pub mod fixture;
pub mod traits;

pub use error::{InfraError, InfraResult};
