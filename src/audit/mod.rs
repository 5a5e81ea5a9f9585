/*!
 * Audit Trail
 * Structured records for grant lifecycle, authorization decisions, and
 * policy violations
 *
 * This core emits audit records as data; persisting or transmitting them is
 * the embedding runtime's concern.
 */

use crate::core::limits::{MAX_AUDIT_EVENTS, MAX_AUDIT_EVENTS_PER_SUBJECT};
use ahash::RandomState;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, TimestampSeconds};
use std::collections::{HashMap, VecDeque};
use std::time::SystemTime;
use uuid::Uuid;

/// What an audit record describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditKind {
    GrantIssued,
    GrantDelegated,
    GrantRevoked,
    AuthorizationDecision,
    PolicyViolation,
}

/// A structured audit record
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AuditEvent {
    pub event_id: Uuid,
    #[serde_as(as = "TimestampSeconds<i64>")]
    pub timestamp: SystemTime,
    pub kind: AuditKind,
    /// The grantee, tool, or grant the record is about
    pub subject_id: String,
    pub details: serde_json::Value,
}

impl AuditEvent {
    pub fn new(kind: AuditKind, subject_id: impl Into<String>, details: serde_json::Value) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            timestamp: SystemTime::now(),
            kind,
            subject_id: subject_id.into(),
            details,
        }
    }
}

/// Receives audit records as they are produced
pub trait AuditSink: Send + Sync {
    fn record(&self, event: AuditEvent);
}

/// Bounded in-memory audit log
///
/// Ring buffer of recent events plus per-subject logs and denial counters.
pub struct AuditLogger {
    events: RwLock<VecDeque<AuditEvent>>,
    subject_events: RwLock<HashMap<String, VecDeque<AuditEvent>, RandomState>>,
    denial_counts: RwLock<HashMap<String, u64, RandomState>>,
}

impl AuditLogger {
    pub fn new() -> Self {
        Self {
            events: RwLock::new(VecDeque::with_capacity(MAX_AUDIT_EVENTS)),
            subject_events: RwLock::new(HashMap::with_hasher(RandomState::new())),
            denial_counts: RwLock::new(HashMap::with_hasher(RandomState::new())),
        }
    }

    /// Most recent events, newest first
    pub fn recent(&self, limit: usize) -> Vec<AuditEvent> {
        self.events.read().iter().rev().take(limit).cloned().collect()
    }

    /// Events for one subject, newest first
    pub fn for_subject(&self, subject_id: &str, limit: usize) -> Vec<AuditEvent> {
        self.subject_events
            .read()
            .get(subject_id)
            .map(|events| events.iter().rev().take(limit).cloned().collect())
            .unwrap_or_default()
    }

    /// How many denied authorization decisions a subject has accumulated
    pub fn denial_count(&self, subject_id: &str) -> u64 {
        self.denial_counts.read().get(subject_id).copied().unwrap_or(0)
    }

    pub fn stats(&self) -> AuditStats {
        AuditStats {
            total_events: self.events.read().len(),
            total_denials: self.denial_counts.read().values().sum(),
            subjects_tracked: self.subject_events.read().len(),
        }
    }

    pub fn clear(&self) {
        self.events.write().clear();
        self.subject_events.write().clear();
        self.denial_counts.write().clear();
    }
}

impl AuditSink for AuditLogger {
    fn record(&self, event: AuditEvent) {
        let is_denial = event.kind == AuditKind::AuthorizationDecision
            && event
                .details
                .get("granted")
                .and_then(|v| v.as_bool())
                .map(|granted| !granted)
                .unwrap_or(false);

        {
            let mut events = self.events.write();
            if events.len() >= MAX_AUDIT_EVENTS {
                events.pop_front();
            }
            events.push_back(event.clone());
        }

        {
            let mut subjects = self.subject_events.write();
            let log = subjects
                .entry(event.subject_id.clone())
                .or_insert_with(|| VecDeque::with_capacity(MAX_AUDIT_EVENTS_PER_SUBJECT));
            if log.len() >= MAX_AUDIT_EVENTS_PER_SUBJECT {
                log.pop_front();
            }
            log.push_back(event.clone());
        }

        if is_denial {
            *self
                .denial_counts
                .write()
                .entry(event.subject_id)
                .or_insert(0) += 1;
        }
    }
}

impl Default for AuditLogger {
    fn default() -> Self {
        Self::new()
    }
}

/// Audit statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditStats {
    pub total_events: usize,
    pub total_denials: u64,
    pub subjects_tracked: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_recent() {
        let logger = AuditLogger::new();
        logger.record(AuditEvent::new(
            AuditKind::GrantIssued,
            "tool:search",
            serde_json::json!({"capability": "filesystem.read"}),
        ));

        let recent = logger.recent(10);
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].subject_id, "tool:search");
        assert_eq!(logger.for_subject("tool:search", 10).len(), 1);
    }

    #[test]
    fn test_denial_counting() {
        let logger = AuditLogger::new();
        logger.record(AuditEvent::new(
            AuditKind::AuthorizationDecision,
            "tool:search",
            serde_json::json!({"granted": false}),
        ));
        logger.record(AuditEvent::new(
            AuditKind::AuthorizationDecision,
            "tool:search",
            serde_json::json!({"granted": true}),
        ));

        assert_eq!(logger.denial_count("tool:search"), 1);
        assert_eq!(logger.stats().total_denials, 1);
    }

    #[test]
    fn test_ring_buffer_bound() {
        let logger = AuditLogger::new();
        for i in 0..(MAX_AUDIT_EVENTS + 50) {
            logger.record(AuditEvent::new(
                AuditKind::PolicyViolation,
                format!("subject-{}", i % 3),
                serde_json::Value::Null,
            ));
        }
        assert_eq!(logger.stats().total_events, MAX_AUDIT_EVENTS);
    }
}
