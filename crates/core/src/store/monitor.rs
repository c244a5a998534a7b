//! Performance monitor contract.
//!
//! Every repository operation reports timing and outcome to an external
//! collaborator for slow-query introspection. Monitoring is observational
//! only; it is never required for correctness.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Whether the reported operation succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Ok,
    Error,
}

/// One timed operation report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryReport {
    /// Collection name of the reporting repository.
    pub repository: &'static str,
    pub operation: &'static str,
    pub correlation_id: Uuid,
    pub outcome: Outcome,
    pub duration_ms: u64,
    /// Serialized filter description, when the operation had one.
    pub filters: Option<String>,
}

/// External performance-monitoring collaborator.
#[async_trait]
pub trait PerformanceMonitor: Send + Sync {
    async fn report(&self, report: QueryReport);
}

/// Monitor that drops every report.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMonitor;

#[async_trait]
impl PerformanceMonitor for NoopMonitor {
    async fn report(&self, _report: QueryReport) {}
}
