//! Metadata-driven process engines for records defined at runtime.
//!
//! Two engines share one set of collaborator traits:
//!
//! - [`automation`]: event-driven rules (trigger, conditions, ordered
//!   actions) with per-action failure isolation, chain-depth guarding,
//!   background deferral and durable execution logs.
//! - [`workflow`]: a step-graph state machine with pluggable step handlers,
//!   prioritized event-keyed transitions and human tasks for approval
//!   steps.
//!
//! Persistence and side-effecting services (EAV record storage, the rule
//! store, assignment, notifications, the job queue) stay behind the traits
//! in [`services`], [`metadata`] and the engine modules; this crate never
//! talks to a database or queue directly.

pub mod automation;
pub mod config;
pub mod error;
pub mod events;
pub mod metadata;
pub mod services;
pub mod workflow;

#[cfg(test)]
pub mod tests;

pub use automation::{AutomationEngine, AutomationRule, ExecutionSummary};
pub use config::EngineConfig;
pub use error::{EngineError, EngineResult};
pub use events::{DomainEvent, EventSource, TriggerEventType};
pub use workflow::{WorkflowDefinition, WorkflowInstance, WorkflowOrchestrator};
