// Execution Logger - durable per-rule outcome records

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;
use uuid::Uuid;

use super::rules::AutomationRule;
use crate::error::EngineResult;
use crate::events::DomainEvent;

/// Outcome of one rule execution attempt.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Success,
    Failed,
    Skipped,
}

impl ExecutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }
}

/// Immutable record of one rule execution attempt. Created exactly once per
/// execution, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutomationExecutionLog {
    pub id: Uuid,
    pub rule_id: Uuid,
    pub record_id: Uuid,
    pub tenant_id: Uuid,
    pub status: ExecutionStatus,
    pub message: Option<String>,
    pub duration_ms: i64,
    pub executed_at: DateTime<Utc>,
}

/// Append-only sink for execution logs.
#[async_trait]
pub trait ExecutionLogStore: Send + Sync {
    async fn append(&self, entry: AutomationExecutionLog) -> EngineResult<()>;
}

pub struct ExecutionLogger {
    store: Arc<dyn ExecutionLogStore>,
}

impl ExecutionLogger {
    pub fn new(store: Arc<dyn ExecutionLogStore>) -> Self {
        Self { store }
    }

    /// Persist one outcome row. `started` is the instant condition
    /// evaluation began, so duration covers the whole attempt.
    pub async fn record(
        &self,
        rule: &AutomationRule,
        event: &DomainEvent,
        status: ExecutionStatus,
        message: Option<String>,
        started: Instant,
    ) -> EngineResult<()> {
        let entry = AutomationExecutionLog {
            id: Uuid::new_v4(),
            rule_id: rule.id,
            record_id: event.record_id,
            tenant_id: rule.tenant_id,
            status,
            message,
            duration_ms: started.elapsed().as_millis() as i64,
            executed_at: Utc::now(),
        };

        debug!(
            rule = %rule.name,
            status = status.as_str(),
            duration_ms = entry.duration_ms,
            "recording rule execution"
        );
        self.store.append(entry).await
    }
}
