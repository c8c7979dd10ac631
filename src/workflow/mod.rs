// Workflow Engine - step-graph state machine with pluggable handlers
//
// A definition is a graph of steps joined by prioritized, event-keyed
// transitions. The orchestrator is the only component that mutates a
// running instance; step behavior lives behind the handler registry.

pub mod handlers;
pub mod model;
pub mod orchestrator;
pub mod registry;
pub mod tasks;

pub use handlers::{ApprovalHandler, ConditionHandler, UpdateFieldHandler};
pub use model::{
    InstanceStatus, StepActionStatus, TaskAssignee, TaskStatus, WorkflowAction,
    WorkflowDefinition, WorkflowInstance, WorkflowStep, WorkflowTask, WorkflowTransition,
};
pub use orchestrator::{WorkflowOrchestrator, WorkflowRepository};
pub use registry::{StepContext, StepHandler, StepHandlerRegistry, StepOutcome};
pub use tasks::{TaskStore, WorkflowTaskManager};
