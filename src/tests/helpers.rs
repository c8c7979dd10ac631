// Harness builders wiring the engines to the in-memory fakes.

use std::sync::{Arc, Once};
use uuid::Uuid;

use super::fixtures::{
    InMemoryLogs, InMemoryMetadata, InMemoryQueue, InMemoryRecords, InMemoryRules, InMemoryTasks,
    InMemoryWorkflows, RecordingActivity, RecordingAssignments, RecordingNotifications,
    RecordingStates,
};
use crate::automation::actions::ActionExecutor;
use crate::automation::conditions::ConditionEvaluator;
use crate::automation::dispatch::BackgroundDispatcher;
use crate::automation::engine::AutomationEngine;
use crate::automation::log::ExecutionLogger;
use crate::automation::rules::AutomationRule;
use crate::config::EngineConfig;
use crate::events::{DomainEvent, EventSource};
use crate::metadata::{FieldDef, TableDef};
use crate::workflow::handlers::{ApprovalHandler, ConditionHandler, UpdateFieldHandler};
use crate::workflow::model::WorkflowDefinition;
use crate::workflow::orchestrator::WorkflowOrchestrator;
use crate::workflow::registry::StepHandlerRegistry;
use crate::workflow::tasks::WorkflowTaskManager;

static TRACING: Once = Once::new();

/// Route engine tracing through a captured subscriber, once per test binary.
fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    });
}

/// A ticket table with the fields most tests compare against.
pub fn ticket_table() -> TableDef {
    let table_id = Uuid::new_v4();
    let field = |name: &str| FieldDef {
        id: Uuid::new_v4(),
        table_id,
        name: name.to_string(),
    };
    TableDef {
        id: table_id,
        name: "ticket".to_string(),
        fields: vec![field("priority"), field("status"), field("category")],
    }
}

pub fn created_event(table: &TableDef, record_id: Uuid) -> DomainEvent {
    DomainEvent::record_created(
        record_id,
        table.id,
        &table.name,
        Uuid::new_v4(),
        EventSource::System,
    )
}

pub struct AutomationHarness {
    pub engine: AutomationEngine,
    pub records: Arc<InMemoryRecords>,
    pub logs: Arc<InMemoryLogs>,
    pub queue: Arc<InMemoryQueue>,
    pub activity: Arc<RecordingActivity>,
    pub assignments: Arc<RecordingAssignments>,
    pub states: Arc<RecordingStates>,
    pub notifications: Arc<RecordingNotifications>,
}

pub fn automation_harness(tables: Vec<TableDef>, rules: Vec<AutomationRule>) -> AutomationHarness {
    init_tracing();
    let metadata = Arc::new(InMemoryMetadata::new(tables.clone()));
    let records = Arc::new(InMemoryRecords::new(&tables));
    let logs = Arc::new(InMemoryLogs::new());
    let queue = Arc::new(InMemoryQueue::new());
    let activity = Arc::new(RecordingActivity::new());
    let assignments = Arc::new(RecordingAssignments::new());
    let states = Arc::new(RecordingStates::new());
    let notifications = Arc::new(RecordingNotifications::new());

    let evaluator = ConditionEvaluator::new(metadata.clone(), records.clone());
    let executor = ActionExecutor::new(
        metadata.clone(),
        records.clone(),
        assignments.clone(),
        states.clone(),
        notifications.clone(),
        activity.clone(),
    );
    let logger = ExecutionLogger::new(logs.clone());
    let dispatcher = BackgroundDispatcher::new(queue.clone());
    let engine = AutomationEngine::new(
        EngineConfig::default(),
        metadata,
        Arc::new(InMemoryRules::new(rules)),
        evaluator,
        executor,
        logger,
        dispatcher,
    );

    AutomationHarness {
        engine,
        records,
        logs,
        queue,
        activity,
        assignments,
        states,
        notifications,
    }
}

pub struct WorkflowHarness {
    pub orchestrator: WorkflowOrchestrator,
    pub repository: Arc<InMemoryWorkflows>,
    pub tasks: Arc<InMemoryTasks>,
    pub task_manager: WorkflowTaskManager,
    pub records: Arc<InMemoryRecords>,
}

/// Orchestrator with all built-in handlers registered against in-memory
/// storage.
pub fn workflow_harness(definition: WorkflowDefinition, tables: Vec<TableDef>) -> WorkflowHarness {
    init_tracing();
    let metadata = Arc::new(InMemoryMetadata::new(tables.clone()));
    let records = Arc::new(InMemoryRecords::new(&tables));
    let tasks = Arc::new(InMemoryTasks::new());
    let task_manager = WorkflowTaskManager::new(tasks.clone());
    let repository = Arc::new(InMemoryWorkflows::new(definition));

    let mut registry = StepHandlerRegistry::new();
    registry.register(Arc::new(ApprovalHandler::new(task_manager.clone())));
    registry.register(Arc::new(ConditionHandler::new(records.clone())));
    registry.register(Arc::new(UpdateFieldHandler::new(
        metadata.clone(),
        records.clone(),
    )));

    let orchestrator = WorkflowOrchestrator::new(
        EngineConfig::default(),
        repository.clone(),
        Arc::new(registry),
    );

    WorkflowHarness {
        orchestrator,
        repository,
        tasks,
        task_manager,
        records,
    }
}
