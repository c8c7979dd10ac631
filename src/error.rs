// Engine Errors - shared error type for automation and workflow execution

use thiserror::Error;
use uuid::Uuid;

/// Errors surfaced by the automation and workflow engines.
///
/// Per-action failures inside a rule are deliberately *not* represented
/// here: the action executor isolates them, records an activity entry and
/// keeps going. Only faults that abort a whole unit of work (a rule, a
/// workflow step, an enqueue) become an `EngineError`.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("invalid {scope} configuration: {message}")]
    Configuration { scope: &'static str, message: String },

    #[error("no transition from step {step_id} for event '{event}'")]
    TransitionNotFound { step_id: Uuid, event: String },

    #[error("{service} service error: {message}")]
    Service { service: &'static str, message: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("execution cancelled")]
    Cancelled,
}

impl EngineError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn configuration(scope: &'static str, message: impl Into<String>) -> Self {
        Self::Configuration {
            scope,
            message: message.into(),
        }
    }

    pub fn service(service: &'static str, message: impl Into<String>) -> Self {
        Self::Service {
            service,
            message: message.into(),
        }
    }
}

/// Result type alias used across the engine.
pub type EngineResult<T> = Result<T, EngineError>;
