/*!
 * Grant Module
 * Grant storage, integrity signing, and delegation lifecycle
 */

pub mod delegation;
pub mod signer;
pub mod store;
pub mod types;

// Re-export for convenience
pub use delegation::DelegationManager;
pub use signer::GrantSigner;
pub use store::{BackingStore, GrantStore};
pub use types::{
    CapabilityGrant, Condition, Constraint, Delegation, GrantError, GrantResult, GrantScope,
};
