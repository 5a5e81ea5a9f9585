/*!
 * Delegation Manager
 * Issues, delegates, and revokes grants with prerequisite, conflict,
 * depth, and scope-subset enforcement
 */

use super::signer::GrantSigner;
use super::store::GrantStore;
use super::types::{
    CapabilityGrant, Constraint, Delegation, GrantError, GrantResult, GrantScope,
};
use crate::audit::{AuditEvent, AuditKind, AuditSink};
use crate::catalog::CapabilityCatalog;
use crate::core::limits::{DEFAULT_DELEGATION_TTL, MAX_DELEGATION_DEPTH};
use crate::core::types::{CapabilityId, GrantId, Grantee};
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::SystemTime;
use uuid::Uuid;

/// Issues, delegates, and revokes capability grants
#[derive(Clone)]
pub struct DelegationManager {
    catalog: Arc<CapabilityCatalog>,
    store: Arc<GrantStore>,
    signer: GrantSigner,
    audit: Option<Arc<dyn AuditSink>>,
}

impl DelegationManager {
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

    /// Attach an audit sink receiving issuance/delegation/revocation records
    pub fn with_audit(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = Some(audit);
        self
    }

    /// A grant is valid when it is unrevoked, unexpired, and its signature
    /// verifies
    pub fn is_grant_valid(&self, grant: &CapabilityGrant, now: SystemTime) -> bool {
        !grant.is_revoked() && !grant.is_expired(now) && self.signer.verify(grant)
    }

    /// Capability ids for which the grantee holds any valid grant
    ///
    /// Validity includes the signature check, so a tampered stored grant
    /// cannot satisfy a prerequisite or trigger a conflict.
    fn held_capabilities(&self, grantee: &Grantee, now: SystemTime) -> Vec<CapabilityId> {
        let mut held: Vec<CapabilityId> = self
            .store
            .for_grantee(grantee)
            .into_iter()
            .filter(|g| self.is_grant_valid(g, now))
            .map(|g| g.capability_id)
            .collect();
        held.sort_unstable();
        held.dedup();
        held
    }

    /// Issue a root grant
    ///
    /// The grantee must already hold every capability in `requires` (any
    /// valid grant counts; scope and constraints are not consulted) and
    /// none of `conflicts`.
    pub fn issue_grant(
        &self,
        capability_id: &str,
        grantee: Grantee,
        grantor: impl Into<String>,
        scope: GrantScope,
        constraints: Vec<Constraint>,
        expires_at: Option<SystemTime>,
    ) -> GrantResult<CapabilityGrant> {
        let capability = self
            .catalog
            .get(capability_id)
            .ok_or_else(|| GrantError::CapabilityNotFound(capability_id.to_string()))?;

        let now = SystemTime::now();
        let held = self.held_capabilities(&grantee, now);
        for required in &capability.requires {
            if !held.contains(required) {
                return Err(GrantError::PrerequisiteMissing {
                    capability: capability.id.clone(),
                    missing: required.clone(),
                    grantee,
                });
            }
        }
        for conflict in &capability.conflicts {
            if held.contains(conflict) {
                return Err(GrantError::ConflictingCapability {
                    capability: capability.id.clone(),
                    conflicting: conflict.clone(),
                    grantee,
                });
            }
        }

        let mut grant = CapabilityGrant {
            grant_id: Uuid::new_v4(),
            capability_id: capability.id.clone(),
            grantee,
            grantor: grantor.into(),
            scope,
            constraints,
            issued_at: now,
            expires_at,
            revoked_at: None,
            delegation: None,
            signature: String::new(),
        };
        grant.signature = self.signer.sign(&grant);
        self.store.insert(grant.clone());

        info!(
            "Issued grant {} for {} to {}",
            grant.grant_id, grant.capability_id, grant.grantee
        );
        self.record(AuditKind::GrantIssued, grant.grantee.to_string(), &grant);
        Ok(grant)
    }

    /// Derive a narrower grant from an existing one
    ///
    /// The parent must be valid, its capability delegatable, its depth below
    /// the delegation cap, and the requested scope a subset of its own.
    /// Validation and insertion happen under the store's write lock.
    pub fn delegate_grant(
        &self,
        parent_grant_id: GrantId,
        delegatee: Grantee,
        scope: GrantScope,
    ) -> GrantResult<CapabilityGrant> {
        let now = SystemTime::now();
        let grant = self.store.delegate_with(parent_grant_id, |parent| {
            // A revoked, expired, or tampered parent cannot spawn children;
            // treat it the same as an absent one
            if !self.is_grant_valid(parent, now) {
                return Err(GrantError::GrantNotFound(parent_grant_id));
            }

            let capability = self
                .catalog
                .get(&parent.capability_id)
                .ok_or_else(|| GrantError::CapabilityNotFound(parent.capability_id.clone()))?;
            if !capability.delegatable {
                return Err(GrantError::NotDelegatable(parent_grant_id));
            }

            let depth = parent.depth();
            let new_depth = depth + 1;
            if new_depth >= MAX_DELEGATION_DEPTH {
                return Err(GrantError::MaxDepthExceeded {
                    depth,
                    max: MAX_DELEGATION_DEPTH,
                });
            }
            if !parent.grant_delegatable() {
                return Err(GrantError::NotDelegatable(parent_grant_id));
            }

            scope
                .is_subset_of(&parent.scope)
                .map_err(GrantError::ScopeExceedsParent)?;

            // A delegated grant never outlives its parent and defaults to a
            // 24h lifetime
            let ttl_expiry = now + DEFAULT_DELEGATION_TTL;
            let expires_at = Some(match parent.expires_at {
                Some(parent_expiry) => parent_expiry.min(ttl_expiry),
                None => ttl_expiry,
            });

            let mut child = CapabilityGrant {
                grant_id: Uuid::new_v4(),
                capability_id: parent.capability_id.clone(),
                grantee: delegatee.clone(),
                grantor: parent.grantee.to_string(),
                scope: scope.clone(),
                constraints: parent.constraints.clone(),
                issued_at: now,
                expires_at,
                revoked_at: None,
                delegation: Some(Delegation {
                    parent_grant_id,
                    depth: new_depth,
                    delegatable: new_depth + 1 < MAX_DELEGATION_DEPTH,
                }),
                signature: String::new(),
            };
            child.signature = self.signer.sign(&child);
            Ok(child)
        })?;

        debug!(
            "Delegated grant {} from {} to {} at depth {}",
            grant.grant_id,
            parent_grant_id,
            grant.grantee,
            grant.depth()
        );
        self.record(AuditKind::GrantDelegated, grant.grantee.to_string(), &grant);
        Ok(grant)
    }

    /// Revoke a grant and cascade through every delegated descendant
    pub fn revoke_grant(&self, grant_id: GrantId) -> GrantResult<Vec<GrantId>> {
        let now = SystemTime::now();
        let revoked = self.store.revoke_cascade(grant_id, now)?;
        warn!(
            "Revoked grant {} and {} descendant(s)",
            grant_id,
            revoked.len().saturating_sub(1)
        );
        if let Some(ref audit) = self.audit {
            audit.record(AuditEvent::new(
                AuditKind::GrantRevoked,
                grant_id.to_string(),
                serde_json::json!({ "revoked": revoked }),
            ));
        }
        Ok(revoked)
    }

    fn record(&self, kind: AuditKind, subject_id: String, grant: &CapabilityGrant) {
        if let Some(ref audit) = self.audit {
            let details = serde_json::to_value(grant).unwrap_or_default();
            audit.record(AuditEvent::new(kind, subject_id, details));
        }
    }
}
