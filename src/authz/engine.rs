/*!
 * Authorization Engine
 * Resolves required capabilities against stored grants
 */

use super::context::ExecutionContext;
use crate::audit::{AuditEvent, AuditKind, AuditSink};
use crate::catalog::CapabilityCatalog;
use crate::core::serde::is_none;
use crate::core::types::{CapabilityId, GrantId, Grantee};
use crate::grant::{CapabilityGrant, GrantSigner, GrantStore};
use log::debug;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, TimestampSeconds};
use std::sync::Arc;
use std::time::SystemTime;

/// Outcome for a single required capability
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CapabilityDecision {
    pub capability_id: CapabilityId,
    pub granted: bool,
    /// The grant that satisfied the requirement, when granted
    #[serde(default, skip_serializing_if = "is_none")]
    pub grant_id: Option<GrantId>,
    /// Specific reason; never a bare yes/no
    pub reason: String,
}

/// Overall authorization outcome
///
/// `granted` is the logical AND across all required capabilities; every
/// per-capability decision is reported regardless.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AuthorizationDecision {
    pub granted: bool,
    pub decisions: Vec<CapabilityDecision>,
    #[serde_as(as = "TimestampSeconds<i64>")]
    pub decided_at: SystemTime,
}

impl AuthorizationDecision {
    pub fn is_granted(&self) -> bool {
        self.granted
    }

    /// Decision for one capability, if it was part of the request
    pub fn for_capability(&self, capability_id: &str) -> Option<&CapabilityDecision> {
        self.decisions
            .iter()
            .find(|d| d.capability_id == capability_id)
    }
}

/// Deny-by-default capability authorization
///
/// Authorization never errors: denial is an expected, frequent outcome of
/// normal operation, reported as a decision value with its reason.
#[derive(Clone)]
pub struct AuthorizationEngine {
    catalog: Arc<CapabilityCatalog>,
    store: Arc<GrantStore>,
    signer: GrantSigner,
    audit: Option<Arc<dyn AuditSink>>,
}

impl AuthorizationEngine {
    pub fn new(
        catalog: Arc<CapabilityCatalog>,
        store: Arc<GrantStore>,
        signer: GrantSigner,
    ) -> Self {
        Self {
            catalog,
            store,
            signer,
            audit: None,
        }
    }

    /// Attach an audit sink receiving one record per authorization call
    pub fn with_audit(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Resolve a granted/denied decision for each required capability
    pub fn authorize(
        &self,
        required: &[CapabilityId],
        context: &ExecutionContext,
    ) -> AuthorizationDecision {
        let grantee = Grantee::tool(context.tool_id.clone());
        let decisions: Vec<CapabilityDecision> = required
            .iter()
            .map(|capability_id| self.decide(capability_id, &grantee, context))
            .collect();
        let granted = decisions.iter().all(|d| d.granted);

        debug!(
            "Authorization for tool {}: {} ({} capabilities)",
            context.tool_id,
            if granted { "granted" } else { "denied" },
            decisions.len()
        );

        let decision = AuthorizationDecision {
            granted,
            decisions,
            decided_at: SystemTime::now(),
        };
        if let Some(ref audit) = self.audit {
            let details = serde_json::to_value(&decision).unwrap_or_default();
            audit.record(AuditEvent::new(
                AuditKind::AuthorizationDecision,
                context.tool_id.clone(),
                details,
            ));
        }
        decision
    }

    fn decide(
        &self,
        capability_id: &str,
        grantee: &Grantee,
        context: &ExecutionContext,
    ) -> CapabilityDecision {
        let Some(capability) = self.catalog.get(capability_id) else {
            return CapabilityDecision {
                capability_id: capability_id.to_string(),
                granted: false,
                grant_id: None,
                reason: format!("capability {:?} is not registered", capability_id),
            };
        };

        let candidates = self.store.find(capability_id, grantee);
        let valid: Vec<CapabilityGrant> = candidates
            .into_iter()
            .filter(|grant| {
                !grant.is_revoked()
                    && !grant.is_expired(context.timestamp)
                    && self.signer.verify(grant)
            })
            .collect();
        if valid.is_empty() {
            return CapabilityDecision {
                capability_id: capability_id.to_string(),
                granted: false,
                grant_id: None,
                reason: format!(
                    "no valid grant for {:?} held by {}",
                    capability_id, grantee
                ),
            };
        }

        // First-match over the remaining grants; scope and constraints must
        // both be satisfied by the same grant
        for grant in &valid {
            let scope_ok = grant.scope.matches_resource(&context.resource)
                && grant.scope.matches_action(&context.action)
                && grant.scope.conditions_hold_at(context.timestamp);
            let constraints_ok = grant
                .constraints
                .iter()
                .all(|c| c.holds(context.user_id.as_deref(), capability.risk));
            if scope_ok && constraints_ok {
                return CapabilityDecision {
                    capability_id: capability_id.to_string(),
                    granted: true,
                    grant_id: Some(grant.grant_id),
                    reason: format!("grant {} satisfies scope and constraints", grant.grant_id),
                };
            }
        }

        CapabilityDecision {
            capability_id: capability_id.to_string(),
            granted: false,
            grant_id: None,
            reason: format!(
                "scope or constraints not satisfied for {:?} (action {:?} on {:?})",
                capability_id, context.action, context.resource
            ),
        }
    }
}
