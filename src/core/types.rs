/*!
 * Core Types
 * Identifiers shared across catalog, grants, and authorization
 */

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Capability identifier, e.g. `"filesystem.write"`
pub type CapabilityId = String;

/// Grant identifier
pub type GrantId = Uuid;

/// Tool identifier as assigned by the execution runtime
pub type ToolId = String;

/// Kind of principal a grant is issued to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GranteeKind {
    Tool,
    User,
    Role,
}

/// Principal holding a grant
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Grantee {
    pub kind: GranteeKind,
    pub id: String,
}

impl Grantee {
    pub fn tool(id: impl Into<String>) -> Self {
        Self {
            kind: GranteeKind::Tool,
            id: id.into(),
        }
    }

    pub fn user(id: impl Into<String>) -> Self {
        Self {
            kind: GranteeKind::User,
            id: id.into(),
        }
    }

    pub fn role(id: impl Into<String>) -> Self {
        Self {
            kind: GranteeKind::Role,
            id: id.into(),
        }
    }
}

impl std::fmt::Display for Grantee {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let kind = match self.kind {
            GranteeKind::Tool => "tool",
            GranteeKind::User => "user",
            GranteeKind::Role => "role",
        };
        write!(f, "{}:{}", kind, self.id)
    }
}

/// Risk classification of a capability
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "low"),
            RiskLevel::Medium => write!(f, "medium"),
            RiskLevel::High => write!(f, "high"),
            RiskLevel::Critical => write!(f, "critical"),
        }
    }
}
