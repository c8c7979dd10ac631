// Automation Rules - trigger/condition/action configuration for one table

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::EngineResult;
use crate::events::TriggerEventType;

/// Whether a rule runs inline on the triggering call or on a worker.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    Synchronous,
    Background,
}

/// Logical tag on a condition. One `Or` anywhere switches the whole
/// condition set to pure OR; otherwise the set is pure AND.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LogicalGroup {
    And,
    Or,
}

/// Comparison operators for rule conditions.
///
/// Payloads persisted by older releases may carry operators this build does
/// not know; those deserialize to `Unknown` and evaluate false.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOperator {
    Equals,
    NotEquals,
    GreaterThan,
    LessThan,
    Contains,
    StartsWith,
    ChangedTo,
    ChangedFrom,
    #[serde(other)]
    Unknown,
}

/// Types of actions a rule can execute.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    UpdateField,
    AssignUser,
    AssignGroup,
    ChangeState,
    SendNotification,
    AddComment,
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UpdateField => "update_field",
            Self::AssignUser => "assign_user",
            Self::AssignGroup => "assign_group",
            Self::ChangeState => "change_state",
            Self::SendNotification => "send_notification",
            Self::AddComment => "add_comment",
        }
    }
}

/// One event type a rule listens for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutomationTrigger {
    pub event_type: TriggerEventType,
}

/// A single comparison against a field of the triggering record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutomationCondition {
    pub field_id: Uuid,
    pub operator: ConditionOperator,
    pub value: Option<String>,
    pub logical_group: LogicalGroup,
}

impl AutomationCondition {
    pub fn new(field_id: Uuid, operator: ConditionOperator, value: Option<&str>) -> Self {
        Self {
            field_id,
            operator,
            value: value.map(str::to_string),
            logical_group: LogicalGroup::And,
        }
    }

    pub fn or(mut self) -> Self {
        self.logical_group = LogicalGroup::Or;
        self
    }
}

/// An action with its opaque configuration payload. The payload is parsed
/// into a typed config at dispatch time; see `ActionConfig`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutomationAction {
    pub id: Uuid,
    pub action_type: ActionType,
    pub config: serde_json::Value,
}

impl AutomationAction {
    pub fn new(action_type: ActionType, config: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            action_type,
            config,
        }
    }

    pub fn update_field(field: &str, value: &str) -> Self {
        Self::new(
            ActionType::UpdateField,
            serde_json::json!({ "field": field, "value": value }),
        )
    }

    pub fn assign_user(user_id: Uuid) -> Self {
        Self::new(
            ActionType::AssignUser,
            serde_json::json!({ "user_id": user_id }),
        )
    }

    pub fn assign_group(group_id: Uuid) -> Self {
        Self::new(
            ActionType::AssignGroup,
            serde_json::json!({ "group_id": group_id }),
        )
    }

    pub fn change_state(target_state: &str) -> Self {
        Self::new(
            ActionType::ChangeState,
            serde_json::json!({ "target_state": target_state }),
        )
    }

    pub fn send_notification(template_code: &str, recipients: &[&str]) -> Self {
        Self::new(
            ActionType::SendNotification,
            serde_json::json!({
                "template_code": template_code,
                "recipients": recipients,
            }),
        )
    }

    pub fn add_comment(body: &str) -> Self {
        Self::new(ActionType::AddComment, serde_json::json!({ "body": body }))
    }
}

/// An automation rule for one table: triggers, conditions and ordered
/// actions. Read-only to the engine at execution time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutomationRule {
    pub id: Uuid,
    pub name: String,
    pub table_id: Uuid,
    pub tenant_id: Uuid,
    pub execution_mode: ExecutionMode,
    pub stop_on_match: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub triggers: Vec<AutomationTrigger>,
    pub conditions: Vec<AutomationCondition>,
    pub actions: Vec<AutomationAction>,
}

impl AutomationRule {
    pub fn new(name: &str, table_id: Uuid, tenant_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            table_id,
            tenant_id,
            execution_mode: ExecutionMode::Synchronous,
            stop_on_match: false,
            is_active: true,
            created_at: Utc::now(),
            triggers: Vec::new(),
            conditions: Vec::new(),
            actions: Vec::new(),
        }
    }

    /// Listen for one more event type.
    pub fn on(mut self, event_type: TriggerEventType) -> Self {
        self.triggers.push(AutomationTrigger { event_type });
        self
    }

    pub fn when(mut self, condition: AutomationCondition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn then(mut self, action: AutomationAction) -> Self {
        self.actions.push(action);
        self
    }

    pub fn background(mut self) -> Self {
        self.execution_mode = ExecutionMode::Background;
        self
    }

    pub fn stop_on_match(mut self) -> Self {
        self.stop_on_match = true;
        self
    }

    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn listens_for(&self, event_type: TriggerEventType) -> bool {
        self.triggers.iter().any(|t| t.event_type == event_type)
    }
}

/// Read access to stored rules.
///
/// Tables are tenant-scoped: a `table_id` belongs to exactly one tenant,
/// so filtering by table already confines results to the event's tenant
/// and no separate tenant predicate is applied at match time.
#[async_trait]
pub trait RuleStore: Send + Sync {
    /// Active rules for a table whose triggers include the event type,
    /// ordered by creation time ascending (oldest first).
    async fn active_rules(
        &self,
        table_id: Uuid,
        event_type: TriggerEventType,
    ) -> EngineResult<Vec<AutomationRule>>;

    async fn rule_by_id(&self, rule_id: Uuid) -> EngineResult<Option<AutomationRule>>;
}
