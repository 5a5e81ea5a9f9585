/*!
 * Sandbox Policy Types
 * Declared isolation contract for a sandboxed execution
 */

use crate::core::serde::{is_empty_vec, is_none};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

/// Sandbox strictness tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IsolationLevel {
    /// No isolation
    Level0,
    /// Process isolation
    Level1,
    /// Full namespace + seccomp isolation
    Level2,
}

/// Filesystem surface of a policy
///
/// Path lists are glob patterns relative to `root_path`; an empty allow-list
/// means unrestricted for that dimension, denied patterns always win.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct FilesystemPolicy {
    pub root_path: PathBuf,
    #[serde(default, skip_serializing_if = "is_empty_vec")]
    pub read_only_paths: Vec<String>,
    #[serde(default, skip_serializing_if = "is_empty_vec")]
    pub read_write_paths: Vec<String>,
    #[serde(default, skip_serializing_if = "is_empty_vec")]
    pub denied_paths: Vec<String>,
    pub max_file_size: u64,
    pub max_total_size: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ProcessPolicy {
    pub max_processes: u32,
    pub allow_fork: bool,
    pub allow_exec: bool,
    /// Glob patterns; empty means any executable
    #[serde(default, skip_serializing_if = "is_empty_vec")]
    pub allowed_executables: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct NetworkPolicy {
    pub allow_network: bool,
    /// Host patterns, e.g. `"*.example.com"`; empty means any host
    #[serde(default, skip_serializing_if = "is_empty_vec")]
    pub allowed_hosts: Vec<String>,
    /// Empty means any port
    #[serde(default, skip_serializing_if = "is_empty_vec")]
    pub allowed_ports: Vec<u16>,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ResourcePolicy {
    /// Percent of one core, 100 per core
    pub max_cpu_percent: u32,
    pub max_memory_bytes: u64,
    pub max_file_descriptors: u32,
    pub max_threads: u32,
}

/// Whether the syscall list names what is allowed or what is denied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyscallFilterMode {
    Whitelist,
    Blacklist,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SyscallPolicy {
    pub mode: SyscallFilterMode,
    pub syscalls: HashSet<String>,
}

/// The sandbox contract for one execution
///
/// Constructed once per sandboxed execution and immutable for its lifetime.
/// This core computes decisions against it; a separate orchestrator turns it
/// into namespaces, cgroups, and seccomp filters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SandboxPolicy {
    pub isolation_level: IsolationLevel,
    pub filesystem: FilesystemPolicy,
    pub process: ProcessPolicy,
    pub network: NetworkPolicy,
    pub resources: ResourcePolicy,
    pub syscalls: SyscallPolicy,
}

impl SandboxPolicy {
    /// No isolation: everything permitted, generous limits
    pub fn level0(root_path: impl Into<PathBuf>) -> Self {
        Self {
            isolation_level: IsolationLevel::Level0,
            filesystem: FilesystemPolicy {
                root_path: root_path.into(),
                read_only_paths: vec![],
                read_write_paths: vec![],
                denied_paths: vec![],
                max_file_size: 1024 * 1024 * 1024,
                max_total_size: 10 * 1024 * 1024 * 1024,
            },
            process: ProcessPolicy {
                max_processes: 64,
                allow_fork: true,
                allow_exec: true,
                allowed_executables: vec![],
            },
            network: NetworkPolicy {
                allow_network: true,
                allowed_hosts: vec![],
                allowed_ports: vec![],
                max_connections: 256,
            },
            resources: ResourcePolicy {
                max_cpu_percent: 400,
                max_memory_bytes: 4 * 1024 * 1024 * 1024,
                max_file_descriptors: 1024,
                max_threads: 256,
            },
            syscalls: SyscallPolicy {
                mode: SyscallFilterMode::Blacklist,
                syscalls: HashSet::new(),
            },
        }
    }

    /// Process isolation: bounded spawning, scoped filesystem, open network
    pub fn level1(root_path: impl Into<PathBuf>) -> Self {
        Self {
            isolation_level: IsolationLevel::Level1,
            filesystem: FilesystemPolicy {
                root_path: root_path.into(),
                read_only_paths: vec!["usr/**".into(), "lib/**".into()],
                read_write_paths: vec!["tmp/**".into(), "work/**".into()],
                denied_paths: vec!["etc/**".into()],
                max_file_size: 256 * 1024 * 1024,
                max_total_size: 1024 * 1024 * 1024,
            },
            process: ProcessPolicy {
                max_processes: 8,
                allow_fork: true,
                allow_exec: false,
                allowed_executables: vec![],
            },
            network: NetworkPolicy {
                allow_network: true,
                allowed_hosts: vec![],
                allowed_ports: vec![80, 443],
                max_connections: 16,
            },
            resources: ResourcePolicy {
                max_cpu_percent: 200,
                max_memory_bytes: 1024 * 1024 * 1024,
                max_file_descriptors: 256,
                max_threads: 32,
            },
            syscalls: SyscallPolicy {
                mode: SyscallFilterMode::Blacklist,
                syscalls: crate::core::limits::DANGEROUS_SYSCALLS
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            },
        }
    }

    /// Full isolation: whitelist syscalls, no network, no fork/exec
    pub fn level2(root_path: impl Into<PathBuf>) -> Self {
        Self {
            isolation_level: IsolationLevel::Level2,
            filesystem: FilesystemPolicy {
                root_path: root_path.into(),
                read_only_paths: vec![],
                read_write_paths: vec!["tmp/**".into()],
                denied_paths: vec!["etc/**".into(), "proc/**".into(), "sys/**".into()],
                max_file_size: 64 * 1024 * 1024,
                max_total_size: 256 * 1024 * 1024,
            },
            process: ProcessPolicy {
                max_processes: 1,
                allow_fork: false,
                allow_exec: false,
                allowed_executables: vec![],
            },
            network: NetworkPolicy {
                allow_network: false,
                allowed_hosts: vec![],
                allowed_ports: vec![],
                max_connections: 0,
            },
            resources: ResourcePolicy {
                max_cpu_percent: 100,
                max_memory_bytes: 256 * 1024 * 1024,
                max_file_descriptors: 64,
                max_threads: 8,
            },
            syscalls: SyscallPolicy {
                mode: SyscallFilterMode::Whitelist,
                syscalls: ["read", "write", "open", "close", "fstat", "mmap", "brk", "exit_group"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            },
        }
    }
}

/// Result of a single policy validation
///
/// Validators never fail; a denied operation is routine control flow, not an
/// error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PolicyCheck {
    pub allowed: bool,
    #[serde(default, skip_serializing_if = "is_none")]
    pub reason: Option<String>,
}

impl PolicyCheck {
    pub fn allow() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }

    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.into()),
        }
    }

    pub fn is_allowed(&self) -> bool {
        self.allowed
    }

    pub fn reason(&self) -> &str {
        self.reason.as_deref().unwrap_or_default()
    }
}

/// Which part of a policy a violation concerns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    Filesystem,
    Process,
    Network,
    Syscall,
    Resource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationSeverity {
    Low,
    Medium,
    High,
    Critical,
}

/// A structural finding that a policy is internally inconsistent or
/// insufficiently strict for its isolation level
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Violation {
    pub kind: ViolationKind,
    pub severity: ViolationSeverity,
    pub message: String,
}

impl Violation {
    pub fn new(
        kind: ViolationKind,
        severity: ViolationSeverity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            severity,
            message: message.into(),
        }
    }
}
