/*!
 * Signature and Scope Property Tests
 */

use proptest::prelude::*;
use std::time::SystemTime;
use toolguard::grant::types::pattern_contains;
use toolguard::{CapabilityGrant, GrantScope, GrantSigner, Grantee};
use uuid::Uuid;

fn grant_with(capability: String, grantor: String, actions: Vec<String>) -> CapabilityGrant {
    CapabilityGrant {
        grant_id: Uuid::nil(),
        capability_id: capability,
        grantee: Grantee::tool("prop"),
        grantor,
        scope: GrantScope::unrestricted().with_actions(actions),
        constraints: Vec::new(),
        issued_at: SystemTime::UNIX_EPOCH,
        expires_at: None,
        revoked_at: None,
        delegation: None,
        signature: String::new(),
    }
}

proptest! {
    #[test]
    fn sign_is_deterministic(
        capability in "[a-z.]{1,32}",
        grantor in "[a-zA-Z0-9:_-]{1,32}",
        actions in proptest::collection::vec("[a-z]{1,8}", 0..4),
    ) {
        let signer = GrantSigner::new(b"prop-key".to_vec());
        let grant = grant_with(capability, grantor, actions);
        prop_assert_eq!(signer.sign(&grant), signer.sign(&grant));
    }

    #[test]
    fn signed_grants_verify_and_tampering_fails(
        capability in "[a-z.]{1,32}",
        grantor in "[a-zA-Z0-9:_-]{1,32}",
    ) {
        let signer = GrantSigner::new(b"prop-key".to_vec());
        let mut grant = grant_with(capability, grantor, vec![]);
        grant.signature = signer.sign(&grant);
        prop_assert!(signer.verify(&grant));

        grant.capability_id.push('x');
        prop_assert!(!signer.verify(&grant));
    }

    #[test]
    fn scope_is_subset_of_itself(
        resources in proptest::collection::vec("[a-z/]{1,16}", 1..4),
        actions in proptest::collection::vec("[a-z]{1,8}", 1..4),
    ) {
        let scope = GrantScope::unrestricted()
            .with_resources(resources)
            .with_actions(actions);
        prop_assert!(scope.is_subset_of(&scope).is_ok());
    }

    #[test]
    fn literal_paths_matched_by_parent_are_contained(
        prefix in "[a-z]{1,8}",
        suffix in "[a-z]{1,8}",
    ) {
        let parent = format!("{}/*", prefix);
        let child = format!("{}/{}", prefix, suffix);
        prop_assert!(pattern_contains(&parent, &child));
    }
}
