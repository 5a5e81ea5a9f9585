/*!
 * Authorization Module
 * Capability authorization decisions for tool executions
 */

pub mod context;
pub mod engine;

// Re-export for convenience
pub use context::ExecutionContext;
pub use engine::{AuthorizationDecision, AuthorizationEngine, CapabilityDecision};
