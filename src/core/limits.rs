/*!
 * System Limits and Constants
 *
 * Centralized location for authorization and sandbox policy limits.
 * Security-critical constants are marked with [SECURITY].
 */

use std::time::Duration;

// =============================================================================
// DELEGATION LIMITS
// =============================================================================

/// Maximum delegation chain depth (root grant is depth 0)
/// [SECURITY] Bounds transitive privilege spread; a grant at the last
/// delegatable depth produces children that can no longer delegate
pub const MAX_DELEGATION_DEPTH: u8 = 3;

/// Default lifetime of a delegated grant (24h)
/// A delegated grant never outlives its parent
pub const DEFAULT_DELEGATION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

// =============================================================================
// SANDBOX POLICY BOUNDS
// =============================================================================

/// Upper bound on a policy's CPU allotment, in percent of one core times
/// core count (100 per core, 64 cores)
pub const MAX_CPU_PERCENT: u32 = 100 * 64;

/// Upper bound on a policy's memory limit (64GB)
/// Limits above this are treated as misconfiguration, not generosity
pub const MAX_MEMORY_BYTES: u64 = 64 * 1024 * 1024 * 1024;

/// Syscalls that must never be reachable under full isolation
/// [SECURITY] A LEVEL_2 blacklist policy must cover every entry here
pub const DANGEROUS_SYSCALLS: &[&str] = &[
    "ptrace",
    "mount",
    "umount2",
    "clone",
    "fork",
    "vfork",
    "execve",
    "kexec_load",
    "init_module",
    "delete_module",
    "reboot",
    "setuid",
    "setgid",
    "chroot",
    "pivot_root",
];

// =============================================================================
// AUDIT LIMITS
// =============================================================================

/// Maximum audit events kept in the in-memory ring buffer
pub const MAX_AUDIT_EVENTS: usize = 10_000;

/// Maximum audit events retained per subject
pub const MAX_AUDIT_EVENTS_PER_SUBJECT: usize = 500;
