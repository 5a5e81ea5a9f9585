/*!
 * Execution Context
 * What the runtime knows about a pending tool execution
 */

use crate::core::serde::is_none;
use crate::core::types::ToolId;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, TimestampSeconds};
use std::time::SystemTime;

/// Context an authorization decision is evaluated against
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ExecutionContext {
    /// Tool requesting the execution
    pub tool_id: ToolId,
    /// User on whose behalf the tool runs, if known
    #[serde(default, skip_serializing_if = "is_none")]
    pub user_id: Option<String>,
    /// Action the tool wants to perform, e.g. `"write"`
    pub action: String,
    /// Concrete resource the action targets, matched against scope globs
    pub resource: String,
    /// When the request was made
    #[serde_as(as = "TimestampSeconds<i64>")]
    pub timestamp: SystemTime,
}

impl ExecutionContext {
    pub fn new(
        tool_id: impl Into<ToolId>,
        action: impl Into<String>,
        resource: impl Into<String>,
    ) -> Self {
        Self {
            tool_id: tool_id.into(),
            user_id: None,
            action: action.into(),
            resource: resource.into(),
            timestamp: SystemTime::now(),
        }
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn at(mut self, timestamp: SystemTime) -> Self {
        self.timestamp = timestamp;
        self
    }
}
