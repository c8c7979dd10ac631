// Workflow Task Manager - human-actionable tasks created by waiting steps

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::model::{TaskAssignee, TaskStatus, WorkflowInstance, WorkflowStep, WorkflowTask};
use crate::error::{EngineError, EngineResult};

/// Persistence for workflow tasks, implemented outside this crate.
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn tasks_for_step(
        &self,
        instance_id: Uuid,
        step_id: Uuid,
    ) -> EngineResult<Vec<WorkflowTask>>;
    async fn task_by_id(&self, task_id: Uuid) -> EngineResult<Option<WorkflowTask>>;
    async fn create(&self, task: WorkflowTask) -> EngineResult<()>;
    async fn update(&self, task: &WorkflowTask) -> EngineResult<()>;
}

#[derive(Clone)]
pub struct WorkflowTaskManager {
    store: Arc<dyn TaskStore>,
}

impl WorkflowTaskManager {
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        Self { store }
    }

    pub async fn tasks_for_step(
        &self,
        instance_id: Uuid,
        step_id: Uuid,
    ) -> EngineResult<Vec<WorkflowTask>> {
        self.store.tasks_for_step(instance_id, step_id).await
    }

    /// Materialize a task for a human step. The assignee comes from the
    /// step's required role; a human step without one is a configuration
    /// defect.
    pub async fn create_for_step(
        &self,
        instance: &WorkflowInstance,
        step: &WorkflowStep,
    ) -> EngineResult<WorkflowTask> {
        let role = step.required_role.as_deref().ok_or_else(|| {
            EngineError::configuration(
                "step",
                format!("human step '{}' has no required role", step.code),
            )
        })?;

        let title = step
            .config
            .get("title")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| format!("Action required: {}", step.code));
        let description = step
            .config
            .get("description")
            .and_then(|v| v.as_str())
            .map(str::to_string);

        let task = WorkflowTask {
            id: Uuid::new_v4(),
            instance_id: instance.id,
            step_id: step.id,
            title,
            description,
            assignee: TaskAssignee::Role(role.to_string()),
            status: TaskStatus::New,
            resolution_notes: None,
            completed_by: None,
            completed_at: None,
            created_at: Utc::now(),
        };

        info!(
            instance = %instance.reference,
            step = %step.code,
            role,
            "created workflow task"
        );
        self.store.create(task.clone()).await?;
        Ok(task)
    }

    /// Record a human approving/finishing a task. The orchestrator observes
    /// the resolved task on the next `advance`.
    pub async fn complete(
        &self,
        task_id: Uuid,
        resolution_notes: &str,
        completed_by: Uuid,
    ) -> EngineResult<WorkflowTask> {
        self.resolve(task_id, TaskStatus::Completed, resolution_notes, completed_by)
            .await
    }

    /// Record a human rejecting a task.
    pub async fn reject(
        &self,
        task_id: Uuid,
        resolution_notes: &str,
        completed_by: Uuid,
    ) -> EngineResult<WorkflowTask> {
        self.resolve(task_id, TaskStatus::Rejected, resolution_notes, completed_by)
            .await
    }

    async fn resolve(
        &self,
        task_id: Uuid,
        status: TaskStatus,
        resolution_notes: &str,
        completed_by: Uuid,
    ) -> EngineResult<WorkflowTask> {
        let mut task = self
            .store
            .task_by_id(task_id)
            .await?
            .ok_or_else(|| EngineError::not_found("task", task_id))?;

        task.status = status;
        task.resolution_notes = Some(resolution_notes.to_string());
        task.completed_by = Some(completed_by);
        task.completed_at = Some(Utc::now());
        self.store.update(&task).await?;

        info!(task_id = %task.id, status = status.as_str(), "workflow task resolved");
        Ok(task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::fixtures::InMemoryTasks;
    use crate::workflow::model::WorkflowDefinition;

    fn approval_setup() -> (WorkflowTaskManager, Arc<InMemoryTasks>, WorkflowInstance, WorkflowStep)
    {
        let store = Arc::new(InMemoryTasks::new());
        let manager = WorkflowTaskManager::new(store.clone() as Arc<dyn TaskStore>);
        let definition = WorkflowDefinition::new("wf", "Test");
        let instance = WorkflowInstance::new(definition.id, "WF-0001", "ticket", Uuid::new_v4());
        let step = WorkflowStep::new("manager-review", "approval", 1)
            .with_required_role("service_manager");
        (manager, store, instance, step)
    }

    #[tokio::test]
    async fn test_create_and_complete_round_trip() {
        let (manager, _store, instance, step) = approval_setup();

        let task = manager.create_for_step(&instance, &step).await.unwrap();
        assert_eq!(task.status, TaskStatus::New);
        assert_eq!(
            task.assignee,
            TaskAssignee::Role("service_manager".to_string())
        );

        let approver = Uuid::new_v4();
        let resolved = manager
            .complete(task.id, "approved after review", approver)
            .await
            .unwrap();
        assert_eq!(resolved.status, TaskStatus::Completed);
        assert_eq!(resolved.completed_by, Some(approver));
        assert!(resolved.completed_at.is_some());
    }

    #[tokio::test]
    async fn test_step_without_role_is_a_configuration_defect() {
        let (manager, _store, instance, mut step) = approval_setup();
        step.required_role = None;

        let err = manager.create_for_step(&instance, &step).await.unwrap_err();
        assert!(matches!(err, EngineError::Configuration { .. }));
    }
}
