//! Domain entities: core data structures

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identifier of a location in the directory service.
///
/// Stable for the lifetime of the node it names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationId(String);

impl LocationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LocationId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for LocationId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Identifier of an asset in the asset registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(String);

impl AssetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AssetId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A location as returned by the directory service: `{id, label}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub label: String,
}

impl Location {
    pub fn new(id: impl Into<LocationId>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

/// A location whose branch/leaf kind has been determined by the classification probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedLocation {
    pub location: Location,
    /// True when the probe returned at least one child
    pub is_branch: bool,
}

impl ClassifiedLocation {
    pub fn branch(id: impl Into<LocationId>, label: impl Into<String>) -> Self {
        Self {
            location: Location::new(id, label),
            is_branch: true,
        }
    }

    pub fn leaf(id: impl Into<LocationId>, label: impl Into<String>) -> Self {
        Self {
            location: Location::new(id, label),
            is_branch: false,
        }
    }
}

/// Validated arguments of one relocation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelocationRequest {
    pub asset: AssetId,
    pub location: LocationId,
    /// Already trimmed, never empty
    pub justification: String,
}

/// Reply of the asset registry: `{success, message}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelocationReceipt {
    pub success: bool,
    pub message: String,
}

impl RelocationReceipt {
    pub fn accepted(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}
