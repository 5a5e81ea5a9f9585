/*!
 * Toolguard
 * Capability authorization and sandbox policy enforcement for tool/agent
 * executions
 *
 * Two independent, composable engines:
 * - `authz::AuthorizationEngine` decides whether a tool holds valid,
 *   non-expired, non-revoked grants for the capabilities an action needs
 * - `policy` validators decide whether one concrete filesystem, process,
 *   network, syscall, or resource operation complies with the declared
 *   `SandboxPolicy`
 *
 * The crate computes structured allow/deny/violation decisions only; it
 * never executes tools or creates OS-level isolation.
 */

pub mod audit;
pub mod authz;
pub mod catalog;
pub mod core;
pub mod grant;
pub mod policy;

// Re-exports
pub use audit::{AuditEvent, AuditKind, AuditLogger, AuditSink, AuditStats};
pub use authz::{AuthorizationDecision, AuthorizationEngine, CapabilityDecision, ExecutionContext};
pub use catalog::{Capability, CapabilityCatalog, CatalogError, CatalogResult};
pub use crate::core::types::{CapabilityId, GrantId, Grantee, GranteeKind, RiskLevel, ToolId};
pub use grant::{
    BackingStore, CapabilityGrant, Condition, Constraint, DelegationManager, GrantError,
    GrantResult, GrantScope, GrantSigner, GrantStore,
};
pub use policy::{
    validate_network, validate_path, validate_policy, validate_process, validate_resource,
    validate_syscall, FileAccess, IsolationLevel, PolicyCheck, PolicyEnforcer, ProcessOperation,
    ResourceKind, SandboxPolicy, SyscallFilterMode, Violation, ViolationKind, ViolationSeverity,
};
