// Action Executor - dispatches a rule's actions with per-action isolation

use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::rules::{ActionType, AutomationAction, AutomationRule};
use crate::error::{EngineError, EngineResult};
use crate::events::DomainEvent;
use crate::metadata::MetadataCache;
use crate::services::{
    ActivityService, AssignmentService, NotificationService, RecordStore, StateMachineService,
};
use tokio_util::sync::CancellationToken;

/// Role set automation presents to the state machine; rules have no human
/// caller.
pub const SYSTEM_ACTOR_ROLES: &[&str] = &["system", "automation"];

/// Activity kind recorded when a single action fails.
pub const AUTOMATION_FAILED_KIND: &str = "automation_failed";

/// Typed view of an action's opaque configuration payload.
///
/// Parsing happens at dispatch time so malformed payloads surface as a
/// configuration error for that one action instead of propagating deeper.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionConfig {
    UpdateField { field: String, value: String },
    AssignUser { user_id: Uuid },
    AssignGroup { group_id: Uuid },
    ChangeState { target_state: String },
    SendNotification { template_code: String, recipients: Vec<String> },
    AddComment { body: String },
}

impl ActionConfig {
    pub fn parse(action: &AutomationAction) -> EngineResult<Self> {
        let config = &action.config;
        match action.action_type {
            ActionType::UpdateField => Ok(Self::UpdateField {
                field: require_str(config, "field")?,
                value: require_str(config, "value")?,
            }),
            ActionType::AssignUser => Ok(Self::AssignUser {
                user_id: require_uuid(config, "user_id")?,
            }),
            ActionType::AssignGroup => Ok(Self::AssignGroup {
                group_id: require_uuid(config, "group_id")?,
            }),
            ActionType::ChangeState => Ok(Self::ChangeState {
                target_state: require_str(config, "target_state")?,
            }),
            ActionType::SendNotification => Ok(Self::SendNotification {
                template_code: require_str(config, "template_code")?,
                recipients: config
                    .get("recipients")
                    .and_then(|v| v.as_array())
                    .map(|arr| {
                        arr.iter()
                            .filter_map(|v| v.as_str().map(str::to_string))
                            .collect()
                    })
                    .unwrap_or_default(),
            }),
            ActionType::AddComment => Ok(Self::AddComment {
                body: require_str(config, "body")?,
            }),
        }
    }
}

fn require_str(config: &serde_json::Value, key: &str) -> EngineResult<String> {
    config
        .get(key)
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| EngineError::configuration("action", format!("missing '{key}'")))
}

fn require_uuid(config: &serde_json::Value, key: &str) -> EngineResult<Uuid> {
    let raw = require_str(config, key)?;
    raw.parse().map_err(|_| {
        EngineError::configuration("action", format!("'{key}' is not a valid uuid: {raw}"))
    })
}

/// Net result of running a rule's action list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActionOutcome {
    pub executed: usize,
    pub failed: usize,
}

pub struct ActionExecutor {
    metadata: Arc<dyn MetadataCache>,
    records: Arc<dyn RecordStore>,
    assignments: Arc<dyn AssignmentService>,
    states: Arc<dyn StateMachineService>,
    notifications: Arc<dyn NotificationService>,
    activity: Arc<dyn ActivityService>,
}

impl ActionExecutor {
    pub fn new(
        metadata: Arc<dyn MetadataCache>,
        records: Arc<dyn RecordStore>,
        assignments: Arc<dyn AssignmentService>,
        states: Arc<dyn StateMachineService>,
        notifications: Arc<dyn NotificationService>,
        activity: Arc<dyn ActivityService>,
    ) -> Self {
        Self {
            metadata,
            records,
            assignments,
            states,
            notifications,
            activity,
        }
    }

    /// Execute a rule's actions in stored order, sequentially.
    ///
    /// A failing action is recorded as an `automation_failed` activity
    /// entry and execution continues with the next action; later actions
    /// may depend on earlier field mutations, so the order is fixed.
    /// Cancellation aborts before the next action and surfaces as
    /// `EngineError::Cancelled` so the caller can still log the outcome.
    pub async fn execute(
        &self,
        rule: &AutomationRule,
        event: &DomainEvent,
        cancel: &CancellationToken,
    ) -> EngineResult<ActionOutcome> {
        let mut outcome = ActionOutcome::default();

        for action in &rule.actions {
            if cancel.is_cancelled() {
                warn!(rule = %rule.name, "action execution cancelled");
                return Err(EngineError::Cancelled);
            }

            match self.execute_action(action, event).await {
                Ok(()) => outcome.executed += 1,
                Err(e) => {
                    outcome.failed += 1;
                    warn!(
                        rule = %rule.name,
                        action = action.action_type.as_str(),
                        error = %e,
                        "action failed, continuing with remaining actions"
                    );
                    let message =
                        format!("action '{}' failed: {}", action.action_type.as_str(), e);
                    if let Err(log_err) = self
                        .activity
                        .append_system(event.record_id, AUTOMATION_FAILED_KIND, &message)
                        .await
                    {
                        error!(error = %log_err, "failed to record action failure activity");
                    }
                }
            }
        }

        info!(
            rule = %rule.name,
            executed = outcome.executed,
            failed = outcome.failed,
            "rule actions finished"
        );
        Ok(outcome)
    }

    async fn execute_action(
        &self,
        action: &AutomationAction,
        event: &DomainEvent,
    ) -> EngineResult<()> {
        match ActionConfig::parse(action)? {
            ActionConfig::UpdateField { field, value } => {
                let table = self
                    .metadata
                    .table_by_id(event.table_id)
                    .await?
                    .ok_or_else(|| EngineError::not_found("table", event.table_id))?;
                let field_def = table.field_by_name(&field).ok_or_else(|| {
                    EngineError::configuration(
                        "action",
                        format!("field '{}' does not exist on table '{}'", field, table.name),
                    )
                })?;
                self.records
                    .upsert_field_value(event.record_id, field_def.id, &value)
                    .await
            }
            ActionConfig::AssignUser { user_id } => {
                self.assignments.assign_user(event.record_id, user_id).await
            }
            ActionConfig::AssignGroup { group_id } => {
                self.assignments
                    .assign_group(event.record_id, group_id)
                    .await
            }
            ActionConfig::ChangeState { target_state } => {
                self.states
                    .change_state(event.record_id, &target_state, SYSTEM_ACTOR_ROLES)
                    .await
            }
            ActionConfig::SendNotification {
                template_code,
                recipients,
            } => {
                self.notifications
                    .send(&template_code, event.record_id, &recipients)
                    .await
            }
            ActionConfig::AddComment { body } => {
                self.activity
                    .append_comment(event.record_id, &body, "automation")
                    .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automation::rules::AutomationAction;

    #[test]
    fn test_parse_typed_configs() {
        let user_id = Uuid::new_v4();
        let parsed = ActionConfig::parse(&AutomationAction::assign_user(user_id)).unwrap();
        assert_eq!(parsed, ActionConfig::AssignUser { user_id });

        let parsed =
            ActionConfig::parse(&AutomationAction::update_field("priority", "high")).unwrap();
        assert_eq!(
            parsed,
            ActionConfig::UpdateField {
                field: "priority".to_string(),
                value: "high".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_rejects_missing_keys() {
        let action = AutomationAction::new(ActionType::ChangeState, serde_json::json!({}));
        let err = ActionConfig::parse(&action).unwrap_err();
        assert!(matches!(err, EngineError::Configuration { .. }));
    }

    #[test]
    fn test_parse_rejects_malformed_uuid() {
        let action = AutomationAction::new(
            ActionType::AssignUser,
            serde_json::json!({ "user_id": "not-a-uuid" }),
        );
        assert!(ActionConfig::parse(&action).is_err());
    }
}
