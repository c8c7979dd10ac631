// Workflow Orchestrator - drives instances through their step graphs

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::model::{
    InstanceStatus, StepActionStatus, WorkflowAction, WorkflowDefinition, WorkflowInstance,
    WorkflowStep,
};
use super::registry::{StepContext, StepHandlerRegistry, StepOutcome};
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};

/// Actor recorded on audit rows written by the engine itself.
pub const ENGINE_ACTOR: &str = "workflow_engine";

/// Persistence for workflow definitions, instances and their audit trail.
#[async_trait]
pub trait WorkflowRepository: Send + Sync {
    async fn definition(&self, definition_id: Uuid) -> EngineResult<Option<WorkflowDefinition>>;
    async fn save_instance(&self, instance: &WorkflowInstance) -> EngineResult<()>;
    async fn append_action(&self, action: &WorkflowAction) -> EngineResult<()>;
}

/// Single mutator of workflow instances. Dispatches the current step to its
/// handler, follows the selected transition, and keeps chaining through
/// automated steps until the instance parks, finishes or fails.
pub struct WorkflowOrchestrator {
    config: EngineConfig,
    repository: Arc<dyn WorkflowRepository>,
    registry: Arc<StepHandlerRegistry>,
}

impl WorkflowOrchestrator {
    pub fn new(
        config: EngineConfig,
        repository: Arc<dyn WorkflowRepository>,
        registry: Arc<StepHandlerRegistry>,
    ) -> Self {
        Self {
            config,
            repository,
            registry,
        }
    }

    /// Advance `instance` as far as it can go right now.
    ///
    /// `external_trigger` is advisory context for the first dispatched step
    /// (e.g. the event a caller believes occurred); transition selection
    /// always comes from what the handler actually returns. Re-advancing a
    /// terminal instance is a no-op.
    pub async fn advance(
        &self,
        instance: &mut WorkflowInstance,
        external_trigger: Option<&str>,
        cancel: &CancellationToken,
    ) -> EngineResult<()> {
        if instance.status.is_terminal() {
            debug!(
                instance = %instance.reference,
                status = instance.status.as_str(),
                "instance already terminal, nothing to advance"
            );
            return Ok(());
        }

        let definition = self
            .repository
            .definition(instance.definition_id)
            .await?
            .ok_or_else(|| EngineError::not_found("workflow definition", instance.definition_id))?;

        let mut trigger = external_trigger;
        for _ in 0..self.config.max_chained_steps {
            if cancel.is_cancelled() {
                return self.cancel_instance(instance).await;
            }

            let step = match self.current_step(instance, &definition)? {
                Some(step) => step.clone(),
                None => {
                    return self
                        .fail_instance(instance, "definition has no initial step")
                        .await;
                }
            };

            if instance.status == InstanceStatus::Draft {
                instance.status = InstanceStatus::Active;
                instance.started_at = Some(Utc::now());
                instance.current_step_id = Some(step.id);
                self.repository.save_instance(instance).await?;
                info!(instance = %instance.reference, step = %step.code, "workflow started");
            }

            let Some(handler) = self.registry.resolve(&step.step_type) else {
                return self
                    .fail_instance(
                        instance,
                        &format!("no handler registered for step type '{}'", step.step_type),
                    )
                    .await;
            };

            let ctx = StepContext {
                instance: &*instance,
                step: &step,
                external_trigger: trigger,
            };
            let outcome = match handler.execute(ctx).await {
                Ok(outcome) => outcome,
                Err(EngineError::Cancelled) => {
                    return self.cancel_instance(instance).await;
                }
                // Dispatch errors fail the step rather than poison the
                // instance record with an unsaved state.
                Err(e) => StepOutcome::failed(e.to_string()),
            };
            // The advisory trigger only applies to the first hop.
            trigger = None;

            match outcome {
                StepOutcome::Waiting => {
                    self.record_action(instance, Some(&step), None, StepActionStatus::Waiting, None)
                        .await?;
                    instance.status = InstanceStatus::Pending;
                    self.repository.save_instance(instance).await?;
                    debug!(
                        instance = %instance.reference,
                        step = %step.code,
                        "workflow parked pending external input"
                    );
                    return Ok(());
                }
                StepOutcome::Failed { message } => {
                    self.record_action(
                        instance,
                        Some(&step),
                        None,
                        StepActionStatus::Failed,
                        Some(&message),
                    )
                    .await?;
                    return self.fail_instance(instance, &message).await;
                }
                StepOutcome::Completed { trigger_event } => {
                    self.record_action(
                        instance,
                        Some(&step),
                        Some(&trigger_event),
                        StepActionStatus::Completed,
                        None,
                    )
                    .await?;

                    let Some(transition) = definition.transition_for(step.id, &trigger_event)
                    else {
                        // A reachable (step, event) pair without a transition
                        // is a definition defect, not a transient fault.
                        let message = EngineError::TransitionNotFound {
                            step_id: step.id,
                            event: trigger_event,
                        }
                        .to_string();
                        return self.fail_instance(instance, &message).await;
                    };
                    let Some(target) = definition.step(transition.to_step_id) else {
                        let message = format!(
                            "transition from '{}' points at unknown step {}",
                            step.code, transition.to_step_id
                        );
                        return self.fail_instance(instance, &message).await;
                    };

                    instance.current_step_id = Some(target.id);
                    if target.is_terminal {
                        instance.status = InstanceStatus::Completed;
                        instance.completed_at = Some(Utc::now());
                        self.repository.save_instance(instance).await?;
                        info!(
                            instance = %instance.reference,
                            step = %target.code,
                            "workflow completed"
                        );
                        return Ok(());
                    }
                    instance.status = InstanceStatus::Active;
                    self.repository.save_instance(instance).await?;
                    debug!(
                        instance = %instance.reference,
                        from = %step.code,
                        to = %target.code,
                        event = %trigger_event,
                        "workflow advanced"
                    );
                }
            }
        }

        let message = format!(
            "exceeded {} chained steps; definition is likely cyclic",
            self.config.max_chained_steps
        );
        self.fail_instance(instance, &message).await
    }

    /// Resolve the step the next dispatch targets. A fresh instance starts
    /// at the definition's initial step.
    fn current_step<'a>(
        &self,
        instance: &WorkflowInstance,
        definition: &'a WorkflowDefinition,
    ) -> EngineResult<Option<&'a WorkflowStep>> {
        match instance.current_step_id {
            Some(step_id) => definition
                .step(step_id)
                .ok_or_else(|| EngineError::not_found("workflow step", step_id))
                .map(Some),
            None => Ok(definition.initial_step()),
        }
    }

    async fn fail_instance(
        &self,
        instance: &mut WorkflowInstance,
        message: &str,
    ) -> EngineResult<()> {
        error!(instance = %instance.reference, reason = message, "workflow failed");
        instance.status = InstanceStatus::Failed;
        instance.completed_at = Some(Utc::now());
        instance.set_output("error", serde_json::json!(message));
        self.repository.save_instance(instance).await
    }

    /// The audit row is written before the instance surfaces as cancelled.
    async fn cancel_instance(&self, instance: &mut WorkflowInstance) -> EngineResult<()> {
        warn!(instance = %instance.reference, "workflow cancelled");
        self.record_action(instance, None, None, StepActionStatus::Cancelled, None)
            .await?;
        instance.status = InstanceStatus::Cancelled;
        instance.completed_at = Some(Utc::now());
        self.repository.save_instance(instance).await
    }

    async fn record_action(
        &self,
        instance: &WorkflowInstance,
        step: Option<&WorkflowStep>,
        trigger_event: Option<&str>,
        status: StepActionStatus,
        comment: Option<&str>,
    ) -> EngineResult<()> {
        let action = WorkflowAction {
            id: Uuid::new_v4(),
            instance_id: instance.id,
            step_id: step.map(|s| s.id),
            trigger_event: trigger_event.map(str::to_string),
            status,
            actor: ENGINE_ACTOR.to_string(),
            comment: comment.map(str::to_string),
            created_at: Utc::now(),
        };
        self.repository.append_action(&action).await
    }
}
