// Update Field Step Handler - upserts a configured literal onto the trigger record

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use crate::error::EngineResult;
use crate::metadata::MetadataCache;
use crate::services::RecordStore;
use crate::workflow::registry::{StepContext, StepHandler, StepOutcome};

pub const UPDATE_FIELD_STEP_TYPE: &str = "update_field";
pub const SUCCESS_EVENT: &str = "Success";

pub struct UpdateFieldHandler {
    metadata: Arc<dyn MetadataCache>,
    records: Arc<dyn RecordStore>,
}

impl UpdateFieldHandler {
    pub fn new(metadata: Arc<dyn MetadataCache>, records: Arc<dyn RecordStore>) -> Self {
        Self { metadata, records }
    }
}

#[async_trait]
impl StepHandler for UpdateFieldHandler {
    fn step_type(&self) -> &str {
        UPDATE_FIELD_STEP_TYPE
    }

    /// Config shape: `{ "field": "...", "value": "..." }`. The field is
    /// resolved by name on the table named by the instance's trigger
    /// entity type.
    async fn execute(&self, ctx: StepContext<'_>) -> EngineResult<StepOutcome> {
        let config = &ctx.step.config;
        let Some(field) = config.get("field").and_then(|v| v.as_str()) else {
            return Ok(StepOutcome::failed(format!(
                "update_field step '{}' has no 'field' configured",
                ctx.step.code
            )));
        };
        let Some(value) = config.get("value").and_then(|v| v.as_str()) else {
            return Ok(StepOutcome::failed(format!(
                "update_field step '{}' has no 'value' configured",
                ctx.step.code
            )));
        };

        let Some(table) = self.metadata.table_by_name(&ctx.instance.entity_type).await? else {
            return Ok(StepOutcome::failed(format!(
                "table '{}' not found for workflow instance {}",
                ctx.instance.entity_type, ctx.instance.reference
            )));
        };
        let Some(field_def) = table.field_by_name(field) else {
            return Ok(StepOutcome::failed(format!(
                "field '{}' does not exist on table '{}'",
                field, table.name
            )));
        };

        self.records
            .upsert_field_value(ctx.instance.entity_id, field_def.id, value)
            .await?;

        debug!(
            instance = %ctx.instance.reference,
            step = %ctx.step.code,
            field,
            "workflow step updated field"
        );
        Ok(StepOutcome::completed(SUCCESS_EVENT))
    }
}
