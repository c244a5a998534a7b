//! Audit hook contract.
//!
//! Every create/update/delete fires an audit call to an external
//! collaborator. Audit failures must never fail the data operation; the
//! repositories log and continue.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// What happened to the entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Created,
    Updated,
    Deleted,
}

/// One audit record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub action: AuditAction,
    pub entity_type: &'static str,
    pub entity_id: String,
    pub before_state: Option<Value>,
    pub after_state: Option<Value>,
    pub actor_id: Option<String>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Audit hook failed: {0}")]
pub struct AuditError(pub String);

/// External audit collaborator.
#[async_trait]
pub trait AuditHook: Send + Sync {
    async fn record(&self, event: AuditEvent) -> Result<(), AuditError>;
}

/// Audit hook that drops every event; the default wiring for tests and for
/// deployments without an audit sink.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAuditHook;

#[async_trait]
impl AuditHook for NoopAuditHook {
    async fn record(&self, _event: AuditEvent) -> Result<(), AuditError> {
        Ok(())
    }
}
