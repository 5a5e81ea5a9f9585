/*!
 * Policy Enforcer
 * Audited front-end over the pure validators
 *
 * Binds a policy to the subject it governs and records every denial and
 * structural violation to the audit sink. The validators themselves stay
 * pure; callers that do not need audit can keep using them directly.
 */

use super::engine::{
    validate_network, validate_path, validate_policy, validate_process, validate_resource,
    validate_syscall, FileAccess, ProcessOperation, ResourceKind,
};
use super::types::{PolicyCheck, SandboxPolicy, Violation};
use crate::audit::{AuditEvent, AuditKind, AuditSink};
use log::warn;
use std::sync::Arc;

/// Validates concrete operations for one sandboxed execution
pub struct PolicyEnforcer {
    policy: SandboxPolicy,
    subject_id: String,
    audit: Option<Arc<dyn AuditSink>>,
}

impl PolicyEnforcer {
    pub fn new(policy: SandboxPolicy, subject_id: impl Into<String>) -> Self {
        Self {
            policy,
            subject_id: subject_id.into(),
            audit: None,
        }
    }

    /// Attach an audit sink receiving a record for every violation
    pub fn with_audit(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = Some(audit);
        self
    }

    pub fn policy(&self) -> &SandboxPolicy {
        &self.policy
    }

    pub fn check_path(&self, raw_path: &str, access: FileAccess) -> PolicyCheck {
        let check = validate_path(raw_path, access, &self.policy.filesystem);
        self.record_denied(
            "filesystem",
            &check,
            serde_json::json!({ "path": raw_path, "access": access }),
        );
        check
    }

    pub fn check_process(
        &self,
        operation: ProcessOperation,
        executable: Option<&str>,
        current_count: u32,
    ) -> PolicyCheck {
        let check = validate_process(operation, executable, current_count, &self.policy.process);
        self.record_denied(
            "process",
            &check,
            serde_json::json!({ "operation": operation, "executable": executable }),
        );
        check
    }

    pub fn check_network(
        &self,
        destination: &str,
        port: u16,
        current_connections: u32,
    ) -> PolicyCheck {
        let check = validate_network(destination, port, current_connections, &self.policy.network);
        self.record_denied(
            "network",
            &check,
            serde_json::json!({ "destination": destination, "port": port }),
        );
        check
    }

    pub fn check_syscall(&self, syscall: &str) -> PolicyCheck {
        let check = validate_syscall(syscall, &self.policy.syscalls);
        self.record_denied("syscall", &check, serde_json::json!({ "syscall": syscall }));
        check
    }

    pub fn check_resource(&self, kind: ResourceKind, current_usage: u64) -> PolicyCheck {
        let check = validate_resource(kind, current_usage, &self.policy.resources);
        self.record_denied(
            "resource",
            &check,
            serde_json::json!({ "kind": kind, "usage": current_usage }),
        );
        check
    }

    /// Structural validation of the bound policy, each finding recorded
    pub fn check_policy(&self) -> Vec<Violation> {
        let violations = validate_policy(&self.policy);
        if let Some(ref audit) = self.audit {
            for violation in &violations {
                audit.record(AuditEvent::new(
                    AuditKind::PolicyViolation,
                    self.subject_id.clone(),
                    serde_json::to_value(violation).unwrap_or_default(),
                ));
            }
        }
        violations
    }

    fn record_denied(&self, dimension: &str, check: &PolicyCheck, operation: serde_json::Value) {
        if check.is_allowed() {
            return;
        }
        warn!(
            "Policy violation by {}: {}",
            self.subject_id,
            check.reason()
        );
        if let Some(ref audit) = self.audit {
            audit.record(AuditEvent::new(
                AuditKind::PolicyViolation,
                self.subject_id.clone(),
                serde_json::json!({
                    "dimension": dimension,
                    "reason": check.reason(),
                    "operation": operation,
                }),
            ));
        }
    }
}
