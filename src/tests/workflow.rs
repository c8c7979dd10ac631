// Workflow orchestrator behavior tests against in-memory fakes.

use serde_json::json;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::helpers::{ticket_table, workflow_harness};
use crate::error::EngineError;
use crate::workflow::model::{
    InstanceStatus, StepActionStatus, TaskStatus, WorkflowDefinition, WorkflowInstance,
    WorkflowStep, WorkflowTransition,
};

fn instance_for(definition: &WorkflowDefinition) -> WorkflowInstance {
    WorkflowInstance::new(definition.id, "WF-0001", "ticket", Uuid::new_v4())
}

/// review (approval) --Approved--> approved (terminal)
///                    --Rejected--> rejected (terminal)
fn approval_definition() -> (WorkflowDefinition, Uuid, Uuid, Uuid) {
    let review = WorkflowStep::new("review", "approval", 1)
        .initial()
        .with_required_role("manager");
    let approved = WorkflowStep::new("approved", "approval", 2).terminal();
    let rejected = WorkflowStep::new("rejected", "approval", 3).terminal();
    let (review_id, approved_id, rejected_id) = (review.id, approved.id, rejected.id);

    let definition = WorkflowDefinition::new("ticket-approval", "Ticket Approval")
        .with_step(review)
        .with_step(approved)
        .with_step(rejected)
        .with_transition(WorkflowTransition::new(review_id, approved_id, "Approved", 1))
        .with_transition(WorkflowTransition::new(review_id, rejected_id, "Rejected", 1));
    (definition, review_id, approved_id, rejected_id)
}

#[tokio::test]
async fn test_approval_step_parks_and_creates_one_task() {
    let (definition, review_id, _, _) = approval_definition();
    let harness = workflow_harness(definition.clone(), vec![ticket_table()]);
    let mut instance = instance_for(&definition);
    let cancel = CancellationToken::new();

    harness
        .orchestrator
        .advance(&mut instance, None, &cancel)
        .await
        .unwrap();

    assert_eq!(instance.status, InstanceStatus::Pending);
    assert_eq!(instance.current_step_id, Some(review_id));
    assert!(instance.started_at.is_some());
    assert_eq!(harness.tasks.all().len(), 1);
    assert_eq!(harness.tasks.all()[0].status, TaskStatus::New);

    // Re-advancing while the task is open neither duplicates the task nor
    // moves the instance.
    harness
        .orchestrator
        .advance(&mut instance, None, &cancel)
        .await
        .unwrap();
    assert_eq!(instance.status, InstanceStatus::Pending);
    assert_eq!(harness.tasks.all().len(), 1);
}

#[tokio::test]
async fn test_completed_task_advances_to_terminal_step() {
    let (definition, _, approved_id, _) = approval_definition();
    let harness = workflow_harness(definition.clone(), vec![ticket_table()]);
    let mut instance = instance_for(&definition);
    let cancel = CancellationToken::new();

    harness
        .orchestrator
        .advance(&mut instance, None, &cancel)
        .await
        .unwrap();
    let task = harness.tasks.all().remove(0);
    harness
        .task_manager
        .complete(task.id, "looks good", Uuid::new_v4())
        .await
        .unwrap();

    harness
        .orchestrator
        .advance(&mut instance, None, &cancel)
        .await
        .unwrap();

    assert_eq!(instance.status, InstanceStatus::Completed);
    assert_eq!(instance.current_step_id, Some(approved_id));
    assert!(instance.completed_at.is_some());

    let completed: Vec<_> = harness
        .repository
        .actions()
        .into_iter()
        .filter(|a| a.status == StepActionStatus::Completed)
        .collect();
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0].trigger_event.as_deref(), Some("Approved"));
}

#[tokio::test]
async fn test_rejected_task_takes_the_rejected_branch() {
    let (definition, _, _, rejected_id) = approval_definition();
    let harness = workflow_harness(definition.clone(), vec![ticket_table()]);
    let mut instance = instance_for(&definition);
    let cancel = CancellationToken::new();

    harness
        .orchestrator
        .advance(&mut instance, None, &cancel)
        .await
        .unwrap();
    let task = harness.tasks.all().remove(0);
    harness
        .task_manager
        .reject(task.id, "missing change record", Uuid::new_v4())
        .await
        .unwrap();

    harness
        .orchestrator
        .advance(&mut instance, None, &cancel)
        .await
        .unwrap();

    assert_eq!(instance.status, InstanceStatus::Completed);
    assert_eq!(instance.current_step_id, Some(rejected_id));
}

#[tokio::test]
async fn test_lowest_priority_transition_wins_at_runtime() {
    // Empty condition config emits "Default"; two transitions compete.
    let branch = WorkflowStep::new("branch", "condition", 1).initial();
    let slow = WorkflowStep::new("slow-lane", "approval", 2).terminal();
    let fast = WorkflowStep::new("fast-lane", "approval", 3).terminal();
    let (branch_id, slow_id, fast_id) = (branch.id, slow.id, fast.id);

    let definition = WorkflowDefinition::new("routing", "Routing")
        .with_step(branch)
        .with_step(slow)
        .with_step(fast)
        .with_transition(WorkflowTransition::new(branch_id, slow_id, "Default", 2))
        .with_transition(WorkflowTransition::new(branch_id, fast_id, "Default", 1));

    let harness = workflow_harness(definition.clone(), vec![ticket_table()]);
    let mut instance = instance_for(&definition);

    harness
        .orchestrator
        .advance(&mut instance, None, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(instance.current_step_id, Some(fast_id));
    assert_eq!(instance.status, InstanceStatus::Completed);
}

#[tokio::test]
async fn test_condition_step_routes_on_field_value() {
    let table = ticket_table();
    let check = WorkflowStep::new("check-priority", "condition", 1)
        .initial()
        .with_config(json!({
            "field": "priority",
            "operator": "equals",
            "value": "high",
        }));
    let escalate = WorkflowStep::new("escalate", "approval", 2).terminal();
    let archive = WorkflowStep::new("archive", "approval", 3).terminal();
    let (check_id, escalate_id, archive_id) = (check.id, escalate.id, archive.id);

    let definition = WorkflowDefinition::new("triage", "Triage")
        .with_step(check)
        .with_step(escalate)
        .with_step(archive)
        .with_transition(WorkflowTransition::new(check_id, escalate_id, "True", 1))
        .with_transition(WorkflowTransition::new(check_id, archive_id, "False", 1));

    let harness = workflow_harness(definition.clone(), vec![table]);
    let mut instance = instance_for(&definition);
    harness.records.seed(instance.entity_id, "priority", "high");

    harness
        .orchestrator
        .advance(&mut instance, None, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(instance.current_step_id, Some(escalate_id));
}

#[tokio::test]
async fn test_automated_steps_chain_in_one_advance_call() {
    let table = ticket_table();
    let triage = WorkflowStep::new("triage", "update_field", 1)
        .initial()
        .with_config(json!({ "field": "status", "value": "triaged" }));
    let downgrade = WorkflowStep::new("downgrade", "update_field", 2)
        .with_config(json!({ "field": "priority", "value": "low" }));
    let done = WorkflowStep::new("done", "approval", 3).terminal();
    let (triage_id, downgrade_id, done_id) = (triage.id, downgrade.id, done.id);

    let definition = WorkflowDefinition::new("auto", "Auto")
        .with_step(triage)
        .with_step(downgrade)
        .with_step(done)
        .with_transition(WorkflowTransition::new(triage_id, downgrade_id, "Success", 1))
        .with_transition(WorkflowTransition::new(downgrade_id, done_id, "Success", 1));

    let harness = workflow_harness(definition.clone(), vec![table]);
    let mut instance = instance_for(&definition);

    harness
        .orchestrator
        .advance(&mut instance, None, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(instance.status, InstanceStatus::Completed);
    assert_eq!(instance.current_step_id, Some(done_id));
    assert_eq!(
        harness.records.value(instance.entity_id, "status").as_deref(),
        Some("triaged")
    );
    assert_eq!(
        harness.records.value(instance.entity_id, "priority").as_deref(),
        Some("low")
    );
}

#[tokio::test]
async fn test_missing_transition_fails_the_instance() {
    let review = WorkflowStep::new("review", "approval", 1)
        .initial()
        .with_required_role("manager");
    let review_id = review.id;
    // Only the Rejected branch is wired up.
    let rejected = WorkflowStep::new("rejected", "approval", 2).terminal();
    let rejected_step_id = rejected.id;
    let definition = WorkflowDefinition::new("partial", "Partial")
        .with_step(review)
        .with_step(rejected)
        .with_transition(WorkflowTransition::new(
            review_id,
            rejected_step_id,
            "Rejected",
            1,
        ));

    let harness = workflow_harness(definition.clone(), vec![ticket_table()]);
    let mut instance = instance_for(&definition);
    let cancel = CancellationToken::new();

    harness
        .orchestrator
        .advance(&mut instance, None, &cancel)
        .await
        .unwrap();
    let task = harness.tasks.all().remove(0);
    harness
        .task_manager
        .complete(task.id, "approved", Uuid::new_v4())
        .await
        .unwrap();

    harness
        .orchestrator
        .advance(&mut instance, None, &cancel)
        .await
        .unwrap();

    assert_eq!(instance.status, InstanceStatus::Failed);
    let error = instance.output["error"].as_str().unwrap();
    assert!(error.contains("no transition"));
    assert!(error.contains("Approved"));
    assert!(error.contains(&review_id.to_string()));
}

#[tokio::test]
async fn test_cyclic_definition_hits_the_chained_step_cap() {
    let table = ticket_table();
    let spin = WorkflowStep::new("spin", "update_field", 1)
        .initial()
        .with_config(json!({ "field": "status", "value": "spinning" }));
    let spin_id = spin.id;
    let definition = WorkflowDefinition::new("cycle", "Cycle")
        .with_step(spin)
        .with_transition(WorkflowTransition::new(spin_id, spin_id, "Success", 1));

    let harness = workflow_harness(definition.clone(), vec![table]);
    let mut instance = instance_for(&definition);

    harness
        .orchestrator
        .advance(&mut instance, None, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(instance.status, InstanceStatus::Failed);
    assert!(instance.output["error"]
        .as_str()
        .unwrap()
        .contains("cyclic"));
}

#[tokio::test]
async fn test_cancellation_records_an_audit_row_first() {
    let (definition, _, _, _) = approval_definition();
    let harness = workflow_harness(definition.clone(), vec![ticket_table()]);
    let mut instance = instance_for(&definition);
    let cancel = CancellationToken::new();
    cancel.cancel();

    harness
        .orchestrator
        .advance(&mut instance, None, &cancel)
        .await
        .unwrap();

    assert_eq!(instance.status, InstanceStatus::Cancelled);
    assert!(instance.completed_at.is_some());
    let actions = harness.repository.actions();
    assert_eq!(actions.len(), 1);
    assert_eq!(actions[0].status, StepActionStatus::Cancelled);
    assert!(harness.tasks.all().is_empty());
}

#[tokio::test]
async fn test_unregistered_step_type_fails_the_instance() {
    let script = WorkflowStep::new("run-script", "script", 1).initial();
    let definition = WorkflowDefinition::new("scripted", "Scripted").with_step(script);

    let harness = workflow_harness(definition.clone(), vec![ticket_table()]);
    let mut instance = instance_for(&definition);

    harness
        .orchestrator
        .advance(&mut instance, None, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(instance.status, InstanceStatus::Failed);
    assert!(instance.output["error"]
        .as_str()
        .unwrap()
        .contains("no handler registered"));
}

#[tokio::test]
async fn test_terminal_instance_is_not_re_advanced() {
    let (definition, _, _, _) = approval_definition();
    let harness = workflow_harness(definition.clone(), vec![ticket_table()]);
    let mut instance = instance_for(&definition);
    instance.status = InstanceStatus::Cancelled;

    harness
        .orchestrator
        .advance(&mut instance, None, &CancellationToken::new())
        .await
        .unwrap();

    assert!(harness.repository.saves().is_empty());
    assert!(harness.repository.actions().is_empty());
}

#[tokio::test]
async fn test_missing_definition_is_an_error() {
    let (definition, _, _, _) = approval_definition();
    let harness = workflow_harness(definition, vec![ticket_table()]);
    // Instance pointing at a definition the repository does not hold.
    let mut instance = WorkflowInstance::new(Uuid::new_v4(), "WF-0002", "ticket", Uuid::new_v4());

    let err = harness
        .orchestrator
        .advance(&mut instance, None, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound { .. }));
}
