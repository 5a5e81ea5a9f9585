/*!
 * Grant Types
 * Signed capability grants, scopes, conditions, and constraints
 */

use crate::core::serde::{is_empty_vec, is_none};
use crate::core::types::{CapabilityId, GrantId, Grantee, RiskLevel};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, TimestampSeconds};
use std::time::SystemTime;
use thiserror::Error;
use time::OffsetDateTime;

/// Grant operation result
pub type GrantResult<T> = Result<T, GrantError>;

/// Errors from grant issuance, delegation, and revocation
///
/// These represent configuration or programming errors; routine denial is
/// reported by the authorization engine as a decision value instead.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "error", content = "details")]
pub enum GrantError {
    #[error("Capability {0:?} not found")]
    CapabilityNotFound(CapabilityId),

    #[error("Grantee {grantee} lacks prerequisite {missing:?} for {capability:?}")]
    PrerequisiteMissing {
        capability: CapabilityId,
        missing: CapabilityId,
        grantee: Grantee,
    },

    #[error("Grantee {grantee} holds {conflicting:?} which conflicts with {capability:?}")]
    ConflictingCapability {
        capability: CapabilityId,
        conflicting: CapabilityId,
        grantee: Grantee,
    },

    #[error("Grant {0} not found")]
    GrantNotFound(GrantId),

    #[error("Grant {0} is not delegatable")]
    NotDelegatable(GrantId),

    #[error("Delegation depth {depth} reached the maximum of {max}")]
    MaxDepthExceeded { depth: u8, max: u8 },

    #[error("Delegated scope exceeds parent scope: {0}")]
    ScopeExceedsParent(String),
}

/// Closed condition language attached to a scope
///
/// Interpreted by a fixed evaluator; caller-supplied expressions are never
/// executed as code.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Condition {
    /// Hour-of-day window in UTC, `[from, to)`; wraps past midnight when
    /// `from > to`
    HourRange { from: u8, to: u8 },
    /// Absolute validity window
    TimeWindow {
        #[serde_as(as = "Option<TimestampSeconds<i64>>")]
        #[serde(default, skip_serializing_if = "is_none")]
        not_before: Option<SystemTime>,
        #[serde_as(as = "Option<TimestampSeconds<i64>>")]
        #[serde(default, skip_serializing_if = "is_none")]
        not_after: Option<SystemTime>,
    },
}

impl Condition {
    /// Evaluate against a request timestamp
    pub fn holds_at(&self, timestamp: SystemTime) -> bool {
        match self {
            Condition::HourRange { from, to } => {
                let hour = OffsetDateTime::from(timestamp).hour();
                if from <= to {
                    hour >= *from && hour < *to
                } else {
                    hour >= *from || hour < *to
                }
            }
            Condition::TimeWindow {
                not_before,
                not_after,
            } => {
                if let Some(start) = not_before {
                    if timestamp < *start {
                        return false;
                    }
                }
                if let Some(end) = not_after {
                    if timestamp > *end {
                        return false;
                    }
                }
                true
            }
        }
    }
}

/// Closed constraint set evaluated against the execution context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Constraint {
    /// The request must carry this exact user id
    RequireUser { user_id: String },
    /// The capability's declared risk may not exceed this ceiling
    RiskCeiling { max: RiskLevel },
}

impl Constraint {
    /// Evaluate against the requesting user and the capability's risk level
    pub fn holds(&self, user_id: Option<&str>, capability_risk: RiskLevel) -> bool {
        match self {
            Constraint::RequireUser { user_id: required } => {
                user_id == Some(required.as_str())
            }
            Constraint::RiskCeiling { max } => capability_risk <= *max,
        }
    }
}

/// Resource/action/condition restriction attached to a grant
///
/// Empty `resources` or `actions` means unrestricted for that dimension.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct GrantScope {
    #[serde(default, skip_serializing_if = "is_empty_vec")]
    pub resources: Vec<String>,
    #[serde(default, skip_serializing_if = "is_empty_vec")]
    pub actions: Vec<String>,
    #[serde(default, skip_serializing_if = "is_empty_vec")]
    pub conditions: Vec<Condition>,
}

impl GrantScope {
    /// Unrestricted scope
    pub fn unrestricted() -> Self {
        Self::default()
    }

    pub fn with_resources(mut self, resources: Vec<String>) -> Self {
        self.resources = resources;
        self
    }

    pub fn with_actions(mut self, actions: Vec<String>) -> Self {
        self.actions = actions;
        self
    }

    pub fn with_conditions(mut self, conditions: Vec<Condition>) -> Self {
        self.conditions = conditions;
        self
    }

    /// Check whether a concrete resource falls inside the resource patterns
    pub fn matches_resource(&self, resource: &str) -> bool {
        if self.resources.is_empty() {
            return true;
        }
        self.resources
            .iter()
            .any(|pattern| pattern_matches(pattern, resource))
    }

    /// Check whether an action is permitted by the action list
    pub fn matches_action(&self, action: &str) -> bool {
        self.actions.is_empty() || self.actions.iter().any(|a| a == action)
    }

    /// Check whether every condition holds at the given instant
    pub fn conditions_hold_at(&self, timestamp: SystemTime) -> bool {
        self.conditions.iter().all(|c| c.holds_at(timestamp))
    }

    /// Subset test for delegation: every resource pattern and action of
    /// `self` must be contained in the parent scope
    ///
    /// Containment is tested per pattern, not by string equality; an empty
    /// (unrestricted) dimension is only a subset of an empty parent
    /// dimension.
    pub fn is_subset_of(&self, parent: &GrantScope) -> Result<(), String> {
        if !parent.resources.is_empty() {
            if self.resources.is_empty() {
                return Err("child scope is unrestricted on resources".into());
            }
            for child in &self.resources {
                if !parent
                    .resources
                    .iter()
                    .any(|p| pattern_contains(p, child))
                {
                    return Err(format!(
                        "resource pattern {:?} is not covered by the parent scope",
                        child
                    ));
                }
            }
        }
        if !parent.actions.is_empty() {
            if self.actions.is_empty() {
                return Err("child scope is unrestricted on actions".into());
            }
            for action in &self.actions {
                if !parent.actions.contains(action) {
                    return Err(format!(
                        "action {:?} is not covered by the parent scope",
                        action
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Glob match of a concrete value against a scope pattern
pub fn pattern_matches(pattern: &str, value: &str) -> bool {
    match glob::Pattern::new(pattern) {
        Ok(compiled) => compiled.matches(value),
        // An unparseable pattern grants nothing
        Err(_) => pattern == value,
    }
}

/// Whether a pattern is a plain string with no glob metacharacters
fn is_literal(pattern: &str) -> bool {
    !pattern.contains(|c| matches!(c, '*' | '?' | '['))
}

/// Pattern containment: does `parent` cover everything `child` can match
///
/// Exact glob containment is undecidable in general for this pattern
/// language; this test accepts equality, a literal child matched by the
/// parent, and a trailing-wildcard parent whose literal prefix prefixes the
/// child. Anything else is rejected.
pub fn pattern_contains(parent: &str, child: &str) -> bool {
    if parent == "*" || parent == "**" || parent == child {
        return true;
    }
    // Matching the child against the parent is only meaningful when the
    // child has no metacharacters of its own: a wildcard child can match
    // values the parent never would, yet still match the parent textually
    // (`report-?.txt` matches the literal string `report-*.txt`)
    if is_literal(child) && pattern_matches(parent, child) {
        return true;
    }
    if let Some(prefix) = parent.strip_suffix("**").or_else(|| parent.strip_suffix('*')) {
        return child.starts_with(prefix);
    }
    false
}

/// Delegation linkage for a derived grant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Delegation {
    pub parent_grant_id: GrantId,
    /// 1 for a grant delegated from a root grant
    pub depth: u8,
    /// Whether this grant may itself be delegated further
    pub delegatable: bool,
}

/// A signed assertion that a grantee holds a capability
///
/// Immutable once signed except for `revoked_at`.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CapabilityGrant {
    pub grant_id: GrantId,
    pub capability_id: CapabilityId,
    pub grantee: Grantee,
    pub grantor: String,
    pub scope: GrantScope,
    #[serde(default, skip_serializing_if = "is_empty_vec")]
    pub constraints: Vec<Constraint>,
    #[serde_as(as = "TimestampSeconds<i64>")]
    pub issued_at: SystemTime,
    #[serde_as(as = "Option<TimestampSeconds<i64>>")]
    #[serde(default, skip_serializing_if = "is_none")]
    pub expires_at: Option<SystemTime>,
    #[serde_as(as = "Option<TimestampSeconds<i64>>")]
    #[serde(default, skip_serializing_if = "is_none")]
    pub revoked_at: Option<SystemTime>,
    #[serde(default, skip_serializing_if = "is_none")]
    pub delegation: Option<Delegation>,
    /// Hex-encoded HMAC over the immutable fields
    pub signature: String,
}

impl CapabilityGrant {
    /// Delegation depth of this grant (0 for a root grant)
    pub fn depth(&self) -> u8 {
        self.delegation.as_ref().map(|d| d.depth).unwrap_or(0)
    }

    /// Whether this grant may be delegated further, at the grant level
    ///
    /// The capability's own `delegatable` flag is checked separately.
    pub fn grant_delegatable(&self) -> bool {
        self.delegation.as_ref().map(|d| d.delegatable).unwrap_or(true)
    }

    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }

    pub fn is_expired(&self, now: SystemTime) -> bool {
        matches!(self.expires_at, Some(expiry) if expiry <= now)
    }
}
