// Condition Step Handler - boolean branch over the trigger record's fields

use async_trait::async_trait;
use std::sync::Arc;

use crate::automation::conditions::apply_operator;
use crate::automation::rules::ConditionOperator;
use crate::error::EngineResult;
use crate::services::RecordStore;
use crate::workflow::registry::{StepContext, StepHandler, StepOutcome};

pub const CONDITION_STEP_TYPE: &str = "condition";
pub const TRUE_EVENT: &str = "True";
pub const FALSE_EVENT: &str = "False";
pub const DEFAULT_EVENT: &str = "Default";

pub struct ConditionHandler {
    records: Arc<dyn RecordStore>,
}

impl ConditionHandler {
    pub fn new(records: Arc<dyn RecordStore>) -> Self {
        Self { records }
    }
}

#[async_trait]
impl StepHandler for ConditionHandler {
    fn step_type(&self) -> &str {
        CONDITION_STEP_TYPE
    }

    /// Config shape: `{ "field": "...", "operator": "...", "value": "..." }`.
    /// An empty config is a pass-through branch producing "Default";
    /// a partially filled config is malformed and fails the step.
    async fn execute(&self, ctx: StepContext<'_>) -> EngineResult<StepOutcome> {
        let config = &ctx.step.config;
        let is_empty = config.is_null()
            || config.as_object().map(|o| o.is_empty()).unwrap_or(false);
        if is_empty {
            return Ok(StepOutcome::completed(DEFAULT_EVENT));
        }

        let Some(field) = config.get("field").and_then(|v| v.as_str()) else {
            return Ok(StepOutcome::failed(format!(
                "condition step '{}' has no 'field' configured",
                ctx.step.code
            )));
        };
        let operator = match config.get("operator") {
            Some(raw) => match serde_json::from_value::<ConditionOperator>(raw.clone()) {
                Ok(op) => op,
                Err(_) => {
                    return Ok(StepOutcome::failed(format!(
                        "condition step '{}' has a malformed operator",
                        ctx.step.code
                    )));
                }
            },
            None => {
                return Ok(StepOutcome::failed(format!(
                    "condition step '{}' has no 'operator' configured",
                    ctx.step.code
                )));
            }
        };
        let literal = match config.get("value") {
            None | Some(serde_json::Value::Null) => None,
            Some(serde_json::Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
        };

        // Missing record surfaces as an error from the store and fails the
        // step via the orchestrator's dispatch-error path.
        let values = self.records.field_values(ctx.instance.entity_id).await?;
        let current = values.get(field).map(String::as_str);

        // ChangedTo/ChangedFrom have no diff to consult here and evaluate
        // false, matching the automation semantics.
        let result = apply_operator(operator, current, literal.as_deref(), None);
        Ok(StepOutcome::completed(if result {
            TRUE_EVENT
        } else {
            FALSE_EVENT
        }))
    }
}
