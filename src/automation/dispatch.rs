// Background Dispatcher - defers rule execution onto a durable job queue
//
// Only serializable identifiers cross the boundary: the rule id and a
// snapshot of the event. The worker rebuilds everything else from storage.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use super::rules::AutomationRule;
use crate::error::EngineResult;
use crate::events::DomainEvent;

/// Unit of deferred work handed to the job queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueuedRuleExecution {
    pub rule_id: Uuid,
    pub event: DomainEvent,
}

/// Durable background job client, implemented outside this crate.
#[async_trait]
pub trait JobQueue: Send + Sync {
    async fn enqueue_rule_execution(&self, job: &QueuedRuleExecution) -> EngineResult<()>;
}

pub struct BackgroundDispatcher {
    queue: Arc<dyn JobQueue>,
}

impl BackgroundDispatcher {
    pub fn new(queue: Arc<dyn JobQueue>) -> Self {
        Self { queue }
    }

    pub async fn defer(&self, rule: &AutomationRule, event: &DomainEvent) -> EngineResult<()> {
        let job = QueuedRuleExecution {
            rule_id: rule.id,
            event: event.clone(),
        };
        debug!(rule = %rule.name, event_id = %event.event_id, "deferring rule execution");
        self.queue.enqueue_rule_execution(&job).await
    }
}
