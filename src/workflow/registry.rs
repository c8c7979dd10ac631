// Step Handler Registry - string-keyed dispatch for polymorphic step types
//
// New step types are added by registering another handler; the
// orchestrator never changes.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use super::model::{WorkflowInstance, WorkflowStep};
use crate::error::EngineResult;

/// What a step handler produced.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// No further progress now; the instance parks as Pending until
    /// externally re-advanced (e.g. a task completes).
    Waiting,
    /// The step finished; `trigger_event` selects the outgoing transition.
    Completed { trigger_event: String },
    Failed { message: String },
}

impl StepOutcome {
    pub fn completed(trigger_event: &str) -> Self {
        Self::Completed {
            trigger_event: trigger_event.to_string(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }
}

/// Everything a handler may look at for one invocation.
pub struct StepContext<'a> {
    pub instance: &'a WorkflowInstance,
    pub step: &'a WorkflowStep,
    /// Trigger event supplied by the external caller, if any. Advisory:
    /// handlers may consult it, but the outgoing transition is always
    /// selected from the handler's own result.
    pub external_trigger: Option<&'a str>,
}

/// Common execution contract for all step types.
#[async_trait]
pub trait StepHandler: Send + Sync {
    /// Dispatch key; matched case-insensitively against `WorkflowStep::step_type`.
    fn step_type(&self) -> &str;

    async fn execute(&self, ctx: StepContext<'_>) -> EngineResult<StepOutcome>;
}

/// Maps step-type keys to handlers.
#[derive(Default)]
pub struct StepHandlerRegistry {
    handlers: HashMap<String, Arc<dyn StepHandler>>,
}

impl StepHandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, handler: Arc<dyn StepHandler>) {
        self.handlers
            .insert(handler.step_type().to_ascii_lowercase(), handler);
    }

    pub fn resolve(&self, step_type: &str) -> Option<Arc<dyn StepHandler>> {
        self.handlers.get(&step_type.to_ascii_lowercase()).cloned()
    }

    pub fn registered_types(&self) -> Vec<&str> {
        self.handlers.keys().map(String::as_str).collect()
    }
}
