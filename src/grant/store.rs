/*!
 * Grant Store
 * In-memory store of issued grants with optional write-through persistence
 */

use super::types::{CapabilityGrant, GrantError, GrantResult};
use crate::core::types::{GrantId, Grantee};
use ahash::RandomState;
use log::{debug, info};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::SystemTime;

/// Pluggable key-value persistence for grants
///
/// The store writes through on every insert and revocation; no transactional
/// guarantees are required beyond what the in-process write lock provides.
pub trait BackingStore: Send + Sync {
    fn get(&self, grant_id: GrantId) -> Option<CapabilityGrant>;
    fn put(&self, grant: &CapabilityGrant);
    fn delete(&self, grant_id: GrantId);
}

/// Holds issued grants keyed by grant id
///
/// Reads take the read lock; issue, delegation, and revocation serialize on
/// the write lock. The revocation cascade and the delegation
/// validate-then-insert both run under a single write-lock acquisition so a
/// grant can never be delegated from an ancestor that is mid-revocation.
pub struct GrantStore {
    grants: RwLock<HashMap<GrantId, CapabilityGrant, RandomState>>,
    backing: Option<Arc<dyn BackingStore>>,
}

impl GrantStore {
    pub fn new() -> Self {
        Self {
            grants: RwLock::new(HashMap::with_hasher(RandomState::new())),
            backing: None,
        }
    }

    /// Store with write-through persistence
    pub fn with_backing(backing: Arc<dyn BackingStore>) -> Self {
        Self {
            grants: RwLock::new(HashMap::with_hasher(RandomState::new())),
            backing: Some(backing),
        }
    }

    /// Seed the store, e.g. from a persistence load at startup
    pub fn load(&self, grants: impl IntoIterator<Item = CapabilityGrant>) {
        let mut map = self.grants.write();
        for grant in grants {
            map.insert(grant.grant_id, grant);
        }
        info!("Grant store loaded {} grants", map.len());
    }

    pub fn insert(&self, grant: CapabilityGrant) {
        if let Some(ref backing) = self.backing {
            backing.put(&grant);
        }
        debug!(
            "Stored grant {} ({} -> {})",
            grant.grant_id, grant.capability_id, grant.grantee
        );
        self.grants.write().insert(grant.grant_id, grant);
    }

    pub fn get(&self, grant_id: GrantId) -> Option<CapabilityGrant> {
        self.grants.read().get(&grant_id).cloned()
    }

    /// All grants issued to a grantee for a capability, valid or not
    pub fn find(&self, capability_id: &str, grantee: &Grantee) -> Vec<CapabilityGrant> {
        self.grants
            .read()
            .values()
            .filter(|g| g.capability_id == capability_id && &g.grantee == grantee)
            .cloned()
            .collect()
    }

    /// All grants issued to a grantee, across capabilities, valid or not
    ///
    /// Validity is the caller's judgement; only the manager holds the signer.
    pub fn for_grantee(&self, grantee: &Grantee) -> Vec<CapabilityGrant> {
        self.grants
            .read()
            .values()
            .filter(|g| &g.grantee == grantee)
            .cloned()
            .collect()
    }

    pub fn list(&self) -> Vec<CapabilityGrant> {
        self.grants.read().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.grants.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.grants.read().is_empty()
    }

    /// Direct children of a grant in the delegation tree
    pub fn children(&self, grant_id: GrantId) -> Vec<CapabilityGrant> {
        self.grants
            .read()
            .values()
            .filter(|g| {
                g.delegation
                    .as_ref()
                    .map(|d| d.parent_grant_id == grant_id)
                    .unwrap_or(false)
            })
            .cloned()
            .collect()
    }

    /// Revoke a grant and every descendant reachable through
    /// `parent_grant_id`, returning the ids revoked
    ///
    /// Iterative worklist rather than recursion: the depth cap is a policy
    /// choice, not a structural guarantee of the data. The whole cascade
    /// runs under one write lock.
    pub fn revoke_cascade(&self, grant_id: GrantId, now: SystemTime) -> GrantResult<Vec<GrantId>> {
        let mut grants = self.grants.write();
        if !grants.contains_key(&grant_id) {
            return Err(GrantError::GrantNotFound(grant_id));
        }

        let mut revoked = Vec::new();
        let mut worklist = vec![grant_id];
        while let Some(current) = worklist.pop() {
            if let Some(grant) = grants.get_mut(&current) {
                if grant.revoked_at.is_none() {
                    grant.revoked_at = Some(now);
                    if let Some(ref backing) = self.backing {
                        backing.put(grant);
                    }
                    revoked.push(current);
                }
            }
            // Each delegated grant has exactly one parent fixed at creation,
            // so the tree has no cycles and the scan terminates
            let children: Vec<GrantId> = grants
                .values()
                .filter(|g| {
                    g.revoked_at.is_none()
                        && g.delegation
                            .as_ref()
                            .map(|d| d.parent_grant_id == current)
                            .unwrap_or(false)
                })
                .map(|g| g.grant_id)
                .collect();
            worklist.extend(children);
        }
        Ok(revoked)
    }

    /// Build and insert a delegated grant atomically with respect to its
    /// parent
    ///
    /// The `build` closure validates the parent and constructs the child;
    /// both happen under the store's write lock, closing the window in which
    /// an ancestor could be revoked between check and insert.
    pub fn delegate_with<F>(&self, parent_id: GrantId, build: F) -> GrantResult<CapabilityGrant>
    where
        F: FnOnce(&CapabilityGrant) -> GrantResult<CapabilityGrant>,
    {
        let mut grants = self.grants.write();
        let parent = grants
            .get(&parent_id)
            .ok_or(GrantError::GrantNotFound(parent_id))?;
        let child = build(parent)?;
        if let Some(ref backing) = self.backing {
            backing.put(&child);
        }
        grants.insert(child.grant_id, child.clone());
        Ok(child)
    }
}

impl Default for GrantStore {
    fn default() -> Self {
        Self::new()
    }
}
