/*!
 * Policy Module
 * Sandbox policy model and per-operation validators
 *
 * Independent of capability authorization: capabilities answer whether an
 * actor may use a category of power at all, policy validation answers
 * whether one concrete operation is consistent with the sandbox contract.
 */

pub mod enforcer;
pub mod engine;
pub mod path;
pub mod types;

// Re-export for convenience
pub use enforcer::PolicyEnforcer;
pub use engine::{
    validate_network, validate_path, validate_policy, validate_process, validate_resource,
    validate_syscall, FileAccess, ProcessOperation, ResourceKind,
};
pub use types::{
    FilesystemPolicy, IsolationLevel, NetworkPolicy, PolicyCheck, ProcessPolicy, ResourcePolicy,
    SandboxPolicy, SyscallFilterMode, SyscallPolicy, Violation, ViolationKind, ViolationSeverity,
};
