// Workflow Model - definitions, instances, audit rows and tasks

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A workflow template: steps plus prioritized transitions. Not a running
/// process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub category: Option<String>,
    pub version: i32,
    pub is_published: bool,
    pub is_active: bool,
    pub steps: Vec<WorkflowStep>,
    pub transitions: Vec<WorkflowTransition>,
}

impl WorkflowDefinition {
    pub fn new(code: &str, name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            code: code.to_string(),
            name: name.to_string(),
            category: None,
            version: 1,
            is_published: false,
            is_active: true,
            steps: Vec::new(),
            transitions: Vec::new(),
        }
    }

    pub fn with_step(mut self, step: WorkflowStep) -> Self {
        self.steps.push(step);
        self
    }

    pub fn with_transition(mut self, transition: WorkflowTransition) -> Self {
        self.transitions.push(transition);
        self
    }

    pub fn initial_step(&self) -> Option<&WorkflowStep> {
        self.steps
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_initial)
            .min_by_key(|(i, s)| (s.order, *i))
            .map(|(_, s)| s)
    }

    pub fn step(&self, step_id: Uuid) -> Option<&WorkflowStep> {
        self.steps.iter().find(|s| s.id == step_id)
    }

    /// Resolve the outgoing transition for `(from_step, trigger_event)`.
    ///
    /// Multiple transitions may exist for the same pair; the lowest
    /// priority number wins and definition order breaks ties.
    pub fn transition_for(
        &self,
        from_step_id: Uuid,
        trigger_event: &str,
    ) -> Option<&WorkflowTransition> {
        self.transitions
            .iter()
            .enumerate()
            .filter(|(_, t)| {
                t.from_step_id == from_step_id
                    && t.trigger_event.eq_ignore_ascii_case(trigger_event)
            })
            .min_by_key(|(i, t)| (t.priority, *i))
            .map(|(_, t)| t)
    }
}

/// A node in a workflow definition's graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowStep {
    pub id: Uuid,
    pub code: String,
    /// Dispatch key into the step handler registry.
    pub step_type: String,
    pub order: i32,
    pub is_initial: bool,
    pub is_terminal: bool,
    /// Role whose members act on human steps (e.g. approvals).
    pub required_role: Option<String>,
    /// Opaque configuration interpreted by the step handler.
    pub config: serde_json::Value,
    // Designer canvas coordinates; carried for the UI, unused by the engine.
    pub position_x: Option<f64>,
    pub position_y: Option<f64>,
}

impl WorkflowStep {
    pub fn new(code: &str, step_type: &str, order: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            code: code.to_string(),
            step_type: step_type.to_string(),
            order,
            is_initial: false,
            is_terminal: false,
            required_role: None,
            config: serde_json::json!({}),
            position_x: None,
            position_y: None,
        }
    }

    pub fn initial(mut self) -> Self {
        self.is_initial = true;
        self
    }

    pub fn terminal(mut self) -> Self {
        self.is_terminal = true;
        self
    }

    pub fn with_required_role(mut self, role: &str) -> Self {
        self.required_role = Some(role.to_string());
        self
    }

    pub fn with_config(mut self, config: serde_json::Value) -> Self {
        self.config = config;
        self
    }
}

/// A prioritized edge between two steps, keyed by trigger event name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowTransition {
    pub id: Uuid,
    pub from_step_id: Uuid,
    pub to_step_id: Uuid,
    pub trigger_event: String,
    pub condition: Option<String>,
    pub priority: i32,
}

impl WorkflowTransition {
    pub fn new(from_step_id: Uuid, to_step_id: Uuid, trigger_event: &str, priority: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            from_step_id,
            to_step_id,
            trigger_event: trigger_event.to_string(),
            condition: None,
            priority,
        }
    }
}

/// Lifecycle of a running workflow instance.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InstanceStatus {
    Draft,
    Active,
    Pending,
    Completed,
    Cancelled,
    Failed,
}

impl InstanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Active => "active",
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Failed)
    }
}

/// One running execution of a definition against a specific record.
/// Mutated only by the orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowInstance {
    pub id: Uuid,
    pub definition_id: Uuid,
    /// Unique user-facing reference number.
    pub reference: String,
    pub status: InstanceStatus,
    pub current_step_id: Option<Uuid>,
    /// The record this instance operates on.
    pub entity_type: String,
    pub entity_id: Uuid,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub input: serde_json::Value,
    pub output: serde_json::Value,
}

impl WorkflowInstance {
    pub fn new(definition_id: Uuid, reference: &str, entity_type: &str, entity_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            definition_id,
            reference: reference.to_string(),
            status: InstanceStatus::Draft,
            current_step_id: None,
            entity_type: entity_type.to_string(),
            entity_id,
            started_at: None,
            completed_at: None,
            input: serde_json::json!({}),
            output: serde_json::json!({}),
        }
    }

    pub fn with_input(mut self, input: serde_json::Value) -> Self {
        self.input = input;
        self
    }

    /// Record a value on the output payload, creating the object if the
    /// payload was overwritten with something else.
    pub fn set_output(&mut self, key: &str, value: serde_json::Value) {
        if !self.output.is_object() {
            self.output = serde_json::json!({});
        }
        if let Some(map) = self.output.as_object_mut() {
            map.insert(key.to_string(), value);
        }
    }
}

/// Outcome recorded for one step handler invocation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StepActionStatus {
    Completed,
    Waiting,
    Failed,
    Cancelled,
}

impl StepActionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Waiting => "waiting",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Append-only audit row: one per step action taken.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowAction {
    pub id: Uuid,
    pub instance_id: Uuid,
    pub step_id: Option<Uuid>,
    pub trigger_event: Option<String>,
    pub status: StepActionStatus,
    pub actor: String,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Lifecycle of a human-actionable task.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    New,
    InProgress,
    Completed,
    Cancelled,
    Rejected,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Rejected => "rejected",
        }
    }

    /// Task is still awaiting a human decision.
    pub fn is_open(&self) -> bool {
        matches!(self, Self::New | Self::InProgress)
    }

    /// Task carries a decision the workflow can act on.
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Completed | Self::Rejected)
    }
}

/// Who a task is routed to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum TaskAssignee {
    User(Uuid),
    Group(Uuid),
    Role(String),
}

/// A human-actionable work item produced by a waiting step handler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowTask {
    pub id: Uuid,
    pub instance_id: Uuid,
    pub step_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub assignee: TaskAssignee,
    pub status: TaskStatus,
    pub resolution_notes: Option<String>,
    pub completed_by: Option<Uuid>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
