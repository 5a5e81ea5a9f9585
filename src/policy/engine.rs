/*!
 * Policy Engine
 * Pure validators for concrete operations against a sandbox policy
 *
 * Every function here is synchronous, side-effect-free, and non-throwing:
 * callers branch on the returned check or violation list.
 */

use super::path;
use super::types::{
    FilesystemPolicy, IsolationLevel, NetworkPolicy, PolicyCheck, ProcessPolicy, ResourcePolicy,
    SandboxPolicy, SyscallFilterMode, SyscallPolicy, Violation, ViolationKind, ViolationSeverity,
};
use crate::core::limits::{DANGEROUS_SYSCALLS, MAX_CPU_PERCENT, MAX_MEMORY_BYTES};
use serde::{Deserialize, Serialize};

/// File access kind being validated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileAccess {
    Read,
    Write,
    Delete,
    Execute,
}

/// Process operation being validated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessOperation {
    Fork,
    Exec,
    Spawn,
}

/// Resource dimension being validated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Cpu,
    Memory,
    FileDescriptors,
    Threads,
}

/// Validate a filesystem access against the policy
///
/// Traversal sequences are rejected outright; absolute paths must fall under
/// the sandbox root; denied patterns always win; writes and deletes require
/// a read-write match, reads and executes a read-only or read-write match.
/// An empty allow-list for the relevant dimension means unrestricted.
pub fn validate_path(raw_path: &str, access: FileAccess, policy: &FilesystemPolicy) -> PolicyCheck {
    if path::has_traversal(raw_path) {
        return PolicyCheck::deny(format!(
            "path {:?} contains traversal sequences",
            raw_path
        ));
    }

    let normalized = path::normalize(raw_path);
    let Some(relative) = path::relative_to_root(&normalized, &policy.root_path) else {
        return PolicyCheck::deny(format!(
            "path {:?} is outside the sandbox root {:?}",
            raw_path, policy.root_path
        ));
    };

    if path::matches_any(&relative, &policy.denied_paths) {
        return PolicyCheck::deny(format!("path {:?} matches a denied pattern", raw_path));
    }

    match access {
        FileAccess::Write | FileAccess::Delete => {
            if !policy.read_write_paths.is_empty()
                && !path::matches_any(&relative, &policy.read_write_paths)
            {
                return PolicyCheck::deny(format!(
                    "path {:?} is not within a writable path",
                    raw_path
                ));
            }
        }
        FileAccess::Read | FileAccess::Execute => {
            let unrestricted =
                policy.read_only_paths.is_empty() && policy.read_write_paths.is_empty();
            if !unrestricted
                && !path::matches_any(&relative, &policy.read_only_paths)
                && !path::matches_any(&relative, &policy.read_write_paths)
            {
                return PolicyCheck::deny(format!(
                    "path {:?} is not within a readable path",
                    raw_path
                ));
            }
        }
    }

    PolicyCheck::allow()
}

/// Validate a process operation against the policy
pub fn validate_process(
    operation: ProcessOperation,
    executable: Option<&str>,
    current_count: u32,
    policy: &ProcessPolicy,
) -> PolicyCheck {
    if current_count >= policy.max_processes {
        return PolicyCheck::deny(format!(
            "process limit reached ({}/{})",
            current_count, policy.max_processes
        ));
    }
    match operation {
        ProcessOperation::Fork => {
            if !policy.allow_fork {
                return PolicyCheck::deny("fork is not permitted by the policy");
            }
        }
        ProcessOperation::Exec | ProcessOperation::Spawn => {
            if !policy.allow_exec {
                return PolicyCheck::deny("exec is not permitted by the policy");
            }
            if !policy.allowed_executables.is_empty() {
                let Some(exe) = executable else {
                    return PolicyCheck::deny(
                        "executable path required when the policy restricts executables",
                    );
                };
                let allowed = policy.allowed_executables.iter().any(|pattern| {
                    glob::Pattern::new(pattern)
                        .map(|compiled| compiled.matches(exe))
                        .unwrap_or(false)
                });
                if !allowed {
                    return PolicyCheck::deny(format!(
                        "executable {:?} is not in the allowed list",
                        exe
                    ));
                }
            }
        }
    }
    PolicyCheck::allow()
}

/// Validate an outbound connection against the policy
pub fn validate_network(
    destination: &str,
    port: u16,
    current_connections: u32,
    policy: &NetworkPolicy,
) -> PolicyCheck {
    if !policy.allow_network {
        return PolicyCheck::deny("network access is not permitted by the policy");
    }
    if !policy.allowed_hosts.is_empty() {
        let allowed = policy.allowed_hosts.iter().any(|pattern| {
            glob::Pattern::new(pattern)
                .map(|compiled| compiled.matches(destination))
                .unwrap_or(false)
        });
        if !allowed {
            return PolicyCheck::deny(format!(
                "host {:?} is not in the allowed list",
                destination
            ));
        }
    }
    if !policy.allowed_ports.is_empty() && !policy.allowed_ports.contains(&port) {
        return PolicyCheck::deny(format!("port {} is not in the allowed list", port));
    }
    if current_connections >= policy.max_connections {
        return PolicyCheck::deny(format!(
            "connection limit reached ({}/{})",
            current_connections, policy.max_connections
        ));
    }
    PolicyCheck::allow()
}

/// Validate a syscall against the filter
pub fn validate_syscall(syscall: &str, policy: &SyscallPolicy) -> PolicyCheck {
    match policy.mode {
        SyscallFilterMode::Whitelist => {
            if policy.syscalls.contains(syscall) {
                PolicyCheck::allow()
            } else {
                PolicyCheck::deny(format!("syscall {:?} is not whitelisted", syscall))
            }
        }
        SyscallFilterMode::Blacklist => {
            if policy.syscalls.contains(syscall) {
                PolicyCheck::deny(format!("syscall {:?} is blacklisted", syscall))
            } else {
                PolicyCheck::allow()
            }
        }
    }
}

/// Validate current resource usage against the matching limit
pub fn validate_resource(kind: ResourceKind, current_usage: u64, policy: &ResourcePolicy) -> PolicyCheck {
    let limit = match kind {
        ResourceKind::Cpu => policy.max_cpu_percent as u64,
        ResourceKind::Memory => policy.max_memory_bytes,
        ResourceKind::FileDescriptors => policy.max_file_descriptors as u64,
        ResourceKind::Threads => policy.max_threads as u64,
    };
    if current_usage >= limit {
        return PolicyCheck::deny(format!(
            "{:?} usage {} has reached the limit {}",
            kind, current_usage, limit
        ));
    }
    PolicyCheck::allow()
}

/// Structural validation of a whole policy
///
/// Returns every violation found, not just the first, so a misconfigured
/// policy can be fixed in one pass.
pub fn validate_policy(policy: &SandboxPolicy) -> Vec<Violation> {
    let mut violations = Vec::new();

    if policy.filesystem.root_path.as_os_str().is_empty() {
        violations.push(Violation::new(
            ViolationKind::Filesystem,
            ViolationSeverity::High,
            "root_path is empty",
        ));
    }

    if policy.resources.max_cpu_percent == 0 || policy.resources.max_cpu_percent > MAX_CPU_PERCENT {
        violations.push(Violation::new(
            ViolationKind::Resource,
            ViolationSeverity::Medium,
            format!(
                "max_cpu_percent {} is outside the sane range 1..={}",
                policy.resources.max_cpu_percent, MAX_CPU_PERCENT
            ),
        ));
    }
    if policy.resources.max_memory_bytes == 0 || policy.resources.max_memory_bytes > MAX_MEMORY_BYTES
    {
        violations.push(Violation::new(
            ViolationKind::Resource,
            ViolationSeverity::Medium,
            format!(
                "max_memory_bytes {} is outside the sane range 1..={}",
                policy.resources.max_memory_bytes, MAX_MEMORY_BYTES
            ),
        ));
    }

    // Full isolation with a blacklist filter must cover every dangerous
    // syscall; a whitelist is closed by construction
    if policy.isolation_level == IsolationLevel::Level2
        && policy.syscalls.mode == SyscallFilterMode::Blacklist
    {
        let missing: Vec<&str> = DANGEROUS_SYSCALLS
            .iter()
            .copied()
            .filter(|s| !policy.syscalls.syscalls.contains(*s))
            .collect();
        if !missing.is_empty() {
            violations.push(Violation::new(
                ViolationKind::Syscall,
                ViolationSeverity::Critical,
                format!(
                    "level 2 blacklist is missing dangerous syscalls: {}",
                    missing.join(", ")
                ),
            ));
        }
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn fs_policy(read_write: Vec<&str>) -> FilesystemPolicy {
        FilesystemPolicy {
            root_path: PathBuf::from("/sandbox"),
            read_only_paths: vec![],
            read_write_paths: read_write.into_iter().map(String::from).collect(),
            denied_paths: vec![],
            max_file_size: 1024,
            max_total_size: 4096,
        }
    }

    #[test]
    fn test_path_traversal_denied() {
        let policy = fs_policy(vec!["tmp/*"]);
        let check = validate_path("../../etc/passwd", FileAccess::Read, &policy);
        assert!(!check.is_allowed());
        assert!(check.reason().contains("traversal"));
    }

    #[test]
    fn test_write_within_writable_path() {
        let policy = fs_policy(vec!["tmp/*"]);
        assert!(validate_path("tmp/file.txt", FileAccess::Write, &policy).is_allowed());
        assert!(!validate_path("var/file.txt", FileAccess::Write, &policy).is_allowed());
    }

    #[test]
    fn test_absolute_path_outside_root() {
        let policy = fs_policy(vec!["tmp/*"]);
        let check = validate_path("/etc/passwd", FileAccess::Read, &policy);
        assert!(!check.is_allowed());
        assert!(check.reason().contains("outside"));
    }

    #[test]
    fn test_absolute_path_inside_root() {
        let policy = fs_policy(vec!["tmp/*"]);
        assert!(validate_path("/sandbox/tmp/file.txt", FileAccess::Write, &policy).is_allowed());
    }

    #[test]
    fn test_denied_patterns_win() {
        let mut policy = fs_policy(vec!["tmp/*"]);
        policy.denied_paths = vec!["tmp/secret*".into()];
        assert!(!validate_path("tmp/secret.txt", FileAccess::Read, &policy).is_allowed());
        assert!(validate_path("tmp/open.txt", FileAccess::Write, &policy).is_allowed());
    }

    #[test]
    fn test_read_union_of_allow_lists() {
        let mut policy = fs_policy(vec!["tmp/*"]);
        policy.read_only_paths = vec!["data/*".into()];
        assert!(validate_path("data/input.csv", FileAccess::Read, &policy).is_allowed());
        assert!(validate_path("tmp/scratch.txt", FileAccess::Read, &policy).is_allowed());
        assert!(!validate_path("etc/config", FileAccess::Read, &policy).is_allowed());
        // Read-only paths are not writable
        assert!(!validate_path("data/input.csv", FileAccess::Write, &policy).is_allowed());
    }

    #[test]
    fn test_empty_allow_list_is_unrestricted() {
        let policy = fs_policy(vec![]);
        assert!(validate_path("anything/at/all.txt", FileAccess::Write, &policy).is_allowed());
        assert!(validate_path("anything/at/all.txt", FileAccess::Read, &policy).is_allowed());
    }

    fn process_policy() -> ProcessPolicy {
        ProcessPolicy {
            max_processes: 4,
            allow_fork: true,
            allow_exec: true,
            allowed_executables: vec!["/usr/bin/*".into()],
        }
    }

    #[test]
    fn test_process_limit() {
        let policy = process_policy();
        assert!(!validate_process(ProcessOperation::Fork, None, 4, &policy).is_allowed());
        assert!(validate_process(ProcessOperation::Fork, None, 3, &policy).is_allowed());
    }

    #[test]
    fn test_exec_allowed_executables() {
        let policy = process_policy();
        assert!(
            validate_process(ProcessOperation::Exec, Some("/usr/bin/python3"), 0, &policy)
                .is_allowed()
        );
        assert!(
            !validate_process(ProcessOperation::Exec, Some("/tmp/payload"), 0, &policy)
                .is_allowed()
        );
        assert!(!validate_process(ProcessOperation::Exec, None, 0, &policy).is_allowed());
    }

    #[test]
    fn test_fork_disabled() {
        let mut policy = process_policy();
        policy.allow_fork = false;
        assert!(!validate_process(ProcessOperation::Fork, None, 0, &policy).is_allowed());
    }

    fn network_policy() -> NetworkPolicy {
        NetworkPolicy {
            allow_network: true,
            allowed_hosts: vec!["*.example.com".into()],
            allowed_ports: vec![443],
            max_connections: 2,
        }
    }

    #[test]
    fn test_network_host_and_port() {
        let policy = network_policy();
        assert!(validate_network("api.example.com", 443, 0, &policy).is_allowed());
        assert!(!validate_network("evil.com", 443, 0, &policy).is_allowed());
        assert!(!validate_network("api.example.com", 80, 0, &policy).is_allowed());
    }

    #[test]
    fn test_network_connection_limit() {
        let policy = network_policy();
        assert!(!validate_network("api.example.com", 443, 2, &policy).is_allowed());
    }

    #[test]
    fn test_network_disabled() {
        let mut policy = network_policy();
        policy.allow_network = false;
        let check = validate_network("api.example.com", 443, 0, &policy);
        assert!(!check.is_allowed());
        assert!(check.reason().contains("network"));
    }

    #[test]
    fn test_syscall_whitelist() {
        let policy = SyscallPolicy {
            mode: SyscallFilterMode::Whitelist,
            syscalls: ["read", "write"].iter().map(|s| s.to_string()).collect(),
        };
        assert!(validate_syscall("read", &policy).is_allowed());
        assert!(!validate_syscall("ptrace", &policy).is_allowed());
    }

    #[test]
    fn test_syscall_blacklist() {
        let policy = SyscallPolicy {
            mode: SyscallFilterMode::Blacklist,
            syscalls: ["ptrace"].iter().map(|s| s.to_string()).collect(),
        };
        assert!(!validate_syscall("ptrace", &policy).is_allowed());
        assert!(validate_syscall("read", &policy).is_allowed());
    }

    #[test]
    fn test_resource_limits() {
        let policy = ResourcePolicy {
            max_cpu_percent: 100,
            max_memory_bytes: 1024,
            max_file_descriptors: 10,
            max_threads: 4,
        };
        assert!(validate_resource(ResourceKind::Memory, 512, &policy).is_allowed());
        assert!(!validate_resource(ResourceKind::Memory, 1024, &policy).is_allowed());
        assert!(!validate_resource(ResourceKind::Threads, 4, &policy).is_allowed());
        assert!(validate_resource(ResourceKind::Cpu, 50, &policy).is_allowed());
    }

    #[test]
    fn test_validate_policy_clean_presets() {
        assert!(validate_policy(&SandboxPolicy::level1("/sandbox")).is_empty());
        assert!(validate_policy(&SandboxPolicy::level2("/sandbox")).is_empty());
    }

    #[test]
    fn test_validate_policy_reports_all_violations() {
        let mut policy = SandboxPolicy::level0("");
        policy.resources.max_memory_bytes = 0;
        let violations = validate_policy(&policy);
        assert_eq!(violations.len(), 2);
    }

    #[test]
    fn test_level2_blacklist_must_cover_dangerous_syscalls() {
        let mut policy = SandboxPolicy::level2("/sandbox");
        policy.syscalls = SyscallPolicy {
            mode: SyscallFilterMode::Blacklist,
            syscalls: DANGEROUS_SYSCALLS
                .iter()
                .filter(|s| **s != "mount")
                .map(|s| s.to_string())
                .collect(),
        };

        let violations = validate_policy(&policy);
        assert_eq!(violations.len(), 1);
        let violation = &violations[0];
        assert_eq!(violation.kind, ViolationKind::Syscall);
        assert_eq!(violation.severity, ViolationSeverity::Critical);
        assert!(violation.message.contains("mount"));
    }
}
