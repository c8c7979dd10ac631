// Automation Engine - matches and executes rules for domain events

use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::actions::{ActionExecutor, ActionOutcome};
use super::conditions::ConditionEvaluator;
use super::dispatch::{BackgroundDispatcher, QueuedRuleExecution};
use super::log::{ExecutionLogger, ExecutionStatus};
use super::recursion::ChainDepth;
use super::rules::{AutomationRule, ExecutionMode, RuleStore};
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::events::DomainEvent;
use crate::metadata::MetadataCache;

/// What one `process_event` call did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutionSummary {
    /// Rules whose conditions matched.
    pub matched: usize,
    /// Rules executed inline (including skipped/failed ones).
    pub executed: usize,
    /// Rules deferred to the background queue.
    pub deferred: usize,
    /// True when the recursion guard stopped processing before it began.
    pub halted: bool,
}

impl ExecutionSummary {
    fn halted() -> Self {
        Self {
            halted: true,
            ..Self::default()
        }
    }
}

pub struct AutomationEngine {
    config: EngineConfig,
    metadata: Arc<dyn MetadataCache>,
    rules: Arc<dyn RuleStore>,
    evaluator: ConditionEvaluator,
    executor: ActionExecutor,
    logger: ExecutionLogger,
    dispatcher: BackgroundDispatcher,
}

impl AutomationEngine {
    pub fn new(
        config: EngineConfig,
        metadata: Arc<dyn MetadataCache>,
        rules: Arc<dyn RuleStore>,
        evaluator: ConditionEvaluator,
        executor: ActionExecutor,
        logger: ExecutionLogger,
        dispatcher: BackgroundDispatcher,
    ) -> Self {
        Self {
            config,
            metadata,
            rules,
            evaluator,
            executor,
            logger,
            dispatcher,
        }
    }

    /// Process a domain event at the root of a new call chain.
    pub async fn process_event(
        &self,
        event: &DomainEvent,
        cancel: &CancellationToken,
    ) -> EngineResult<ExecutionSummary> {
        self.process_chained_event(event, ChainDepth::root(self.config.max_chain_depth), cancel)
            .await
    }

    /// Process an event raised from within an automation cascade.
    ///
    /// Callers re-entering the engine because an action's side effect
    /// produced a new event must pass `depth.child()` of the depth they
    /// were invoked at; the chain soft-stops at the configured ceiling.
    pub async fn process_chained_event(
        &self,
        event: &DomainEvent,
        depth: ChainDepth,
        cancel: &CancellationToken,
    ) -> EngineResult<ExecutionSummary> {
        if depth.exceeded() {
            warn!(
                depth = depth.value(),
                event_id = %event.event_id,
                table = %event.table_name,
                "automation chain depth ceiling reached, skipping event"
            );
            return Ok(ExecutionSummary::halted());
        }

        let Some(table) = self.metadata.table_by_id(event.table_id).await? else {
            debug!(table_id = %event.table_id, "event table not found, nothing to process");
            return Ok(ExecutionSummary::default());
        };

        let rules = self.rules.active_rules(table.id, event.event_type).await?;
        info!(
            table = %table.name,
            event = event.event_type.as_str(),
            candidates = rules.len(),
            depth = depth.value(),
            "processing domain event"
        );

        let mut summary = ExecutionSummary::default();
        for rule in &rules {
            if !rule.listens_for(event.event_type) {
                continue;
            }

            match rule.execution_mode {
                ExecutionMode::Synchronous => {
                    let matched = self.execute_rule(rule, event, cancel).await?;
                    summary.executed += 1;
                    if matched {
                        summary.matched += 1;
                        if rule.stop_on_match {
                            info!(rule = %rule.name, "rule matched with stop-on-match, halting rule evaluation");
                            break;
                        }
                    }
                }
                ExecutionMode::Background => {
                    // Conditions are evaluated here, synchronously; only the
                    // action phase is deferred. The worker re-evaluates
                    // against a fresh point-in-time read on dequeue.
                    let started = Instant::now();
                    let matched = match self.evaluator.evaluate(rule, event).await {
                        Ok(matched) => matched,
                        Err(e) => {
                            error!(rule = %rule.name, error = %e, "condition evaluation failed");
                            self.logger
                                .record(
                                    rule,
                                    event,
                                    ExecutionStatus::Failed,
                                    Some(e.to_string()),
                                    started,
                                )
                                .await?;
                            summary.executed += 1;
                            continue;
                        }
                    };

                    if !matched {
                        self.logger
                            .record(rule, event, ExecutionStatus::Skipped, None, started)
                            .await?;
                        summary.executed += 1;
                        continue;
                    }

                    self.dispatcher.defer(rule, event).await?;
                    summary.deferred += 1;
                    summary.matched += 1;
                    if rule.stop_on_match {
                        info!(rule = %rule.name, "deferred rule matched with stop-on-match, halting rule evaluation");
                        break;
                    }
                }
            }
        }

        Ok(summary)
    }

    /// Entry point for the background worker: run one previously deferred
    /// rule against its event snapshot.
    ///
    /// A rule that was deleted or deactivated since scheduling is a no-op,
    /// not an error.
    pub async fn execute_rule_by_id(
        &self,
        rule_id: Uuid,
        event: &DomainEvent,
        cancel: &CancellationToken,
    ) -> EngineResult<()> {
        let Some(rule) = self.rules.rule_by_id(rule_id).await? else {
            warn!(rule_id = %rule_id, "deferred rule no longer exists, dropping job");
            return Ok(());
        };
        if !rule.is_active {
            debug!(rule = %rule.name, "deferred rule deactivated since scheduling, dropping job");
            return Ok(());
        }

        self.execute_rule(&rule, event, cancel).await.map(|_| ())
    }

    /// Convenience wrapper for workers consuming `QueuedRuleExecution`
    /// payloads directly.
    pub async fn execute_queued(
        &self,
        job: &QueuedRuleExecution,
        cancel: &CancellationToken,
    ) -> EngineResult<()> {
        self.execute_rule_by_id(job.rule_id, &job.event, cancel).await
    }

    /// Run one rule inline: evaluate conditions, execute actions, write
    /// exactly one execution log row. Returns whether the rule matched.
    ///
    /// Faults inside the rule are contained here and reflected in the log
    /// row; only cancellation and log-write failures propagate.
    async fn execute_rule(
        &self,
        rule: &AutomationRule,
        event: &DomainEvent,
        cancel: &CancellationToken,
    ) -> EngineResult<bool> {
        let started = Instant::now();

        let matched = match self.evaluator.evaluate(rule, event).await {
            Ok(matched) => matched,
            Err(e) => {
                error!(rule = %rule.name, error = %e, "condition evaluation failed");
                self.logger
                    .record(
                        rule,
                        event,
                        ExecutionStatus::Failed,
                        Some(e.to_string()),
                        started,
                    )
                    .await?;
                return Ok(false);
            }
        };

        if !matched {
            self.logger
                .record(rule, event, ExecutionStatus::Skipped, None, started)
                .await?;
            return Ok(false);
        }

        match self.executor.execute(rule, event, cancel).await {
            Ok(ActionOutcome { executed, failed }) => {
                let message = (failed > 0).then(|| {
                    format!("{failed} of {} actions failed", executed + failed)
                });
                self.logger
                    .record(rule, event, ExecutionStatus::Success, message, started)
                    .await?;
                Ok(true)
            }
            Err(EngineError::Cancelled) => {
                // The audit row is written before the cancellation surfaces.
                self.logger
                    .record(
                        rule,
                        event,
                        ExecutionStatus::Failed,
                        Some("execution cancelled".to_string()),
                        started,
                    )
                    .await?;
                Err(EngineError::Cancelled)
            }
            Err(e) => {
                error!(rule = %rule.name, error = %e, "rule execution failed");
                self.logger
                    .record(
                        rule,
                        event,
                        ExecutionStatus::Failed,
                        Some(e.to_string()),
                        started,
                    )
                    .await?;
                Ok(true)
            }
        }
    }
}
