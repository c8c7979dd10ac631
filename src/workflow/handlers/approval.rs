// Approval Step Handler - parks the workflow on a human decision

use async_trait::async_trait;
use tracing::debug;

use crate::error::EngineResult;
use crate::workflow::model::{TaskStatus, WorkflowTask};
use crate::workflow::registry::{StepContext, StepHandler, StepOutcome};
use crate::workflow::tasks::WorkflowTaskManager;

pub const APPROVAL_STEP_TYPE: &str = "approval";
pub const APPROVED_EVENT: &str = "Approved";
pub const REJECTED_EVENT: &str = "Rejected";

pub struct ApprovalHandler {
    tasks: WorkflowTaskManager,
}

impl ApprovalHandler {
    pub fn new(tasks: WorkflowTaskManager) -> Self {
        Self { tasks }
    }

    /// Map a resolved task to its outgoing event.
    fn resolution_event(task: &WorkflowTask) -> &'static str {
        if task.status == TaskStatus::Rejected {
            return REJECTED_EVENT;
        }
        match &task.resolution_notes {
            Some(notes) if notes.to_ascii_lowercase().contains("reject") => REJECTED_EVENT,
            _ => APPROVED_EVENT,
        }
    }
}

#[async_trait]
impl StepHandler for ApprovalHandler {
    fn step_type(&self) -> &str {
        APPROVAL_STEP_TYPE
    }

    /// Idempotent by construction: orchestration may re-dispatch the same
    /// approval step (retries, repeated `advance` calls), so an existing
    /// task for `(instance, step)` is always honored before a new one is
    /// created.
    async fn execute(&self, ctx: StepContext<'_>) -> EngineResult<StepOutcome> {
        let existing = self
            .tasks
            .tasks_for_step(ctx.instance.id, ctx.step.id)
            .await?;

        if let Some(resolved) = existing.iter().find(|t| t.status.is_resolved()) {
            let event = Self::resolution_event(resolved);
            debug!(
                instance = %ctx.instance.reference,
                step = %ctx.step.code,
                event,
                "approval task resolved"
            );
            return Ok(StepOutcome::completed(event));
        }

        if existing.iter().any(|t| t.status.is_open()) {
            debug!(
                instance = %ctx.instance.reference,
                step = %ctx.step.code,
                "approval task still open, waiting"
            );
            return Ok(StepOutcome::Waiting);
        }

        self.tasks.create_for_step(ctx.instance, ctx.step).await?;
        Ok(StepOutcome::Waiting)
    }
}
