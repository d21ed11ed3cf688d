//! Lazily materialised location tree picker.
//!
//! The location forest is fetched level by level from a directory service,
//! each node classified once as branch or leaf, and a single leaf selected as
//! the target of an asset relocation.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod tree_traits;
pub mod util;
