/*!
 * Capability Definitions
 * Types describing the capability hierarchy
 */

use crate::core::serde::{is_empty_vec, is_false, is_none};
use crate::core::types::{CapabilityId, RiskLevel};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, TimestampSeconds};
use std::time::SystemTime;
use thiserror::Error;

/// Catalog operation result
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Catalog errors
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "error", content = "details")]
pub enum CatalogError {
    #[error("Parent capability {parent:?} not found while registering {id:?}")]
    ParentNotFound { id: CapabilityId, parent: CapabilityId },
}

/// Bookkeeping attached to a capability definition
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CapabilityMetadata {
    pub version: u32,
    #[serde_as(as = "TimestampSeconds<i64>")]
    pub created_at: SystemTime,
    #[serde_as(as = "TimestampSeconds<i64>")]
    pub modified_at: SystemTime,
    #[serde(default, skip_serializing_if = "is_false")]
    pub deprecated: bool,
    #[serde(default, skip_serializing_if = "is_none")]
    pub replaced_by: Option<CapabilityId>,
}

impl CapabilityMetadata {
    pub fn new() -> Self {
        let now = SystemTime::now();
        Self {
            version: 1,
            created_at: now,
            modified_at: now,
            deprecated: false,
            replaced_by: None,
        }
    }
}

impl Default for CapabilityMetadata {
    fn default() -> Self {
        Self::new()
    }
}

/// A named permission category in the capability tree
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Capability {
    pub id: CapabilityId,
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "is_none")]
    pub parent: Option<CapabilityId>,
    pub risk: RiskLevel,
    /// Capabilities the grantee must already hold before this one is issued
    #[serde(default, skip_serializing_if = "is_empty_vec")]
    pub requires: Vec<CapabilityId>,
    /// Capabilities that may not be held alongside this one
    #[serde(default, skip_serializing_if = "is_empty_vec")]
    pub conflicts: Vec<CapabilityId>,
    pub delegatable: bool,
    pub metadata: CapabilityMetadata,
}

impl Capability {
    /// Create a capability with empty prerequisite/conflict sets
    pub fn new(id: impl Into<CapabilityId>, name: impl Into<String>, risk: RiskLevel) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            parent: None,
            risk,
            requires: Vec::new(),
            conflicts: Vec::new(),
            delegatable: true,
            metadata: CapabilityMetadata::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_parent(mut self, parent: impl Into<CapabilityId>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_requires(mut self, requires: Vec<CapabilityId>) -> Self {
        self.requires = requires;
        self
    }

    pub fn with_conflicts(mut self, conflicts: Vec<CapabilityId>) -> Self {
        self.conflicts = conflicts;
        self
    }

    pub fn not_delegatable(mut self) -> Self {
        self.delegatable = false;
        self
    }
}
