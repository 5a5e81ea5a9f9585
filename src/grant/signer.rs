/*!
 * Grant Signer
 * Keyed integrity signature over a grant's immutable fields
 */

use super::types::{CapabilityGrant, Constraint, Delegation, GrantScope};
use crate::core::types::{CapabilityId, GrantId, Grantee};
use hmac::{Hmac, Mac};
use serde::Serialize;
use serde_with::{serde_as, TimestampSeconds};
use sha2::Sha256;
use std::time::SystemTime;

type HmacSha256 = Hmac<Sha256>;

/// Canonical serialization of the signed fields
///
/// Field order is fixed by declaration order, so the JSON encoding is
/// deterministic. `revoked_at` is deliberately absent: revocation is the one
/// mutation a stored grant undergoes and must not invalidate the signature.
#[serde_as]
#[derive(Serialize)]
struct SignedFields<'a> {
    grant_id: &'a GrantId,
    capability_id: &'a CapabilityId,
    grantee: &'a Grantee,
    grantor: &'a str,
    #[serde_as(as = "TimestampSeconds<i64>")]
    issued_at: SystemTime,
    scope: &'a GrantScope,
    constraints: &'a [Constraint],
    #[serde_as(as = "Option<TimestampSeconds<i64>>")]
    expires_at: Option<SystemTime>,
    delegation: &'a Option<Delegation>,
}

/// Computes and verifies HMAC-SHA256 signatures over grants
///
/// Pure and stateless; the key is process-wide configuration, not grant
/// state.
#[derive(Clone)]
pub struct GrantSigner {
    key: Vec<u8>,
}

impl GrantSigner {
    pub fn new(key: impl Into<Vec<u8>>) -> Self {
        Self { key: key.into() }
    }

    /// Hex-encoded signature over the grant's immutable fields
    ///
    /// Deterministic: two calls over the same fields yield the same value.
    pub fn sign(&self, grant: &CapabilityGrant) -> String {
        let fields = SignedFields {
            grant_id: &grant.grant_id,
            capability_id: &grant.capability_id,
            grantee: &grant.grantee,
            grantor: &grant.grantor,
            issued_at: grant.issued_at,
            scope: &grant.scope,
            constraints: &grant.constraints,
            expires_at: grant.expires_at,
            delegation: &grant.delegation,
        };
        // Serialization of a plain struct with fixed field order cannot fail
        let canonical = serde_json::to_vec(&fields).unwrap_or_default();

        let mut mac =
            HmacSha256::new_from_slice(&self.key).expect("HMAC accepts keys of any size");
        mac.update(&canonical);
        hex::encode(mac.finalize().into_bytes())
    }

    /// Recompute and compare against the stored signature
    pub fn verify(&self, grant: &CapabilityGrant) -> bool {
        // Constant-time comparison via the Mac verifier
        let fields = SignedFields {
            grant_id: &grant.grant_id,
            capability_id: &grant.capability_id,
            grantee: &grant.grantee,
            grantor: &grant.grantor,
            issued_at: grant.issued_at,
            scope: &grant.scope,
            constraints: &grant.constraints,
            expires_at: grant.expires_at,
            delegation: &grant.delegation,
        };
        let canonical = serde_json::to_vec(&fields).unwrap_or_default();

        let Ok(expected) = hex::decode(&grant.signature) else {
            return false;
        };
        let mut mac =
            HmacSha256::new_from_slice(&self.key).expect("HMAC accepts keys of any size");
        mac.update(&canonical);
        mac.verify_slice(&expected).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Grantee;
    use uuid::Uuid;

    fn sample_grant() -> CapabilityGrant {
        CapabilityGrant {
            grant_id: Uuid::new_v4(),
            capability_id: "filesystem.read".into(),
            grantee: Grantee::tool("search"),
            grantor: "runtime".into(),
            scope: GrantScope::unrestricted(),
            constraints: Vec::new(),
            issued_at: SystemTime::now(),
            expires_at: None,
            revoked_at: None,
            delegation: None,
            signature: String::new(),
        }
    }

    #[test]
    fn test_sign_is_deterministic() {
        let signer = GrantSigner::new(b"test-key".to_vec());
        let grant = sample_grant();
        assert_eq!(signer.sign(&grant), signer.sign(&grant));
    }

    #[test]
    fn test_verify_round_trip() {
        let signer = GrantSigner::new(b"test-key".to_vec());
        let mut grant = sample_grant();
        grant.signature = signer.sign(&grant);
        assert!(signer.verify(&grant));
    }

    #[test]
    fn test_tamper_detection() {
        let signer = GrantSigner::new(b"test-key".to_vec());
        let mut grant = sample_grant();
        grant.signature = signer.sign(&grant);

        grant.grantor = "attacker".into();
        assert!(!signer.verify(&grant));
    }

    #[test]
    fn test_scope_is_signed() {
        let signer = GrantSigner::new(b"test-key".to_vec());
        let mut grant = sample_grant();
        grant.signature = signer.sign(&grant);

        grant.scope = GrantScope::unrestricted().with_resources(vec!["**".into()]);
        assert!(!signer.verify(&grant));
    }

    #[test]
    fn test_revocation_keeps_signature_valid() {
        let signer = GrantSigner::new(b"test-key".to_vec());
        let mut grant = sample_grant();
        grant.signature = signer.sign(&grant);

        grant.revoked_at = Some(SystemTime::now());
        assert!(signer.verify(&grant));
    }

    #[test]
    fn test_wrong_key_rejects() {
        let signer = GrantSigner::new(b"test-key".to_vec());
        let other = GrantSigner::new(b"other-key".to_vec());
        let mut grant = sample_grant();
        grant.signature = signer.sign(&grant);
        assert!(!other.verify(&grant));
    }
}
