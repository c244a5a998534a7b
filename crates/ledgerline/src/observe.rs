//! Tracing-backed implementations of the observability contracts.

use async_trait::async_trait;

use ledgerline_core::store::{
    AuditError, AuditEvent, AuditHook, Outcome, PerformanceMonitor, QueryReport,
};

/// Audit hook that writes structured log lines.
///
/// Stands in for the external audit service; deployments swap in their own
/// [`AuditHook`] implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogAuditHook;

#[async_trait]
impl AuditHook for LogAuditHook {
    async fn record(&self, event: AuditEvent) -> Result<(), AuditError> {
        tracing::info!(
            action = ?event.action,
            entity_type = event.entity_type,
            entity_id = %event.entity_id,
            actor_id = event.actor_id.as_deref().unwrap_or("-"),
            "audit"
        );
        Ok(())
    }
}

/// Performance monitor that logs every report and flags slow queries.
#[derive(Debug, Clone, Copy)]
pub struct LogPerformanceMonitor {
    /// Reports at or above this duration log at `warn`.
    pub slow_query_ms: u64,
}

impl Default for LogPerformanceMonitor {
    fn default() -> Self {
        Self { slow_query_ms: 250 }
    }
}

#[async_trait]
impl PerformanceMonitor for LogPerformanceMonitor {
    async fn report(&self, report: QueryReport) {
        if report.duration_ms >= self.slow_query_ms {
            tracing::warn!(
                repository = report.repository,
                operation = report.operation,
                correlation_id = %report.correlation_id,
                outcome = ?report.outcome,
                duration_ms = report.duration_ms,
                filters = report.filters.as_deref().unwrap_or("-"),
                "Slow query"
            );
            return;
        }

        match report.outcome {
            Outcome::Ok => tracing::debug!(
                repository = report.repository,
                operation = report.operation,
                correlation_id = %report.correlation_id,
                duration_ms = report.duration_ms,
                "Query completed"
            ),
            Outcome::Error => tracing::debug!(
                repository = report.repository,
                operation = report.operation,
                correlation_id = %report.correlation_id,
                duration_ms = report.duration_ms,
                "Query failed"
            ),
        }
    }
}
