// Automation Engine
//
// Event-driven rule execution: trigger matching, condition evaluation,
// ordered action dispatch with per-action failure isolation, recursion
// guarding and durable execution logs.

pub mod actions;
pub mod conditions;
pub mod dispatch;
pub mod engine;
pub mod log;
pub mod recursion;
pub mod rules;

pub use actions::{ActionConfig, ActionExecutor, ActionOutcome, SYSTEM_ACTOR_ROLES};
pub use conditions::ConditionEvaluator;
pub use dispatch::{BackgroundDispatcher, JobQueue, QueuedRuleExecution};
pub use engine::{AutomationEngine, ExecutionSummary};
pub use log::{AutomationExecutionLog, ExecutionLogStore, ExecutionLogger, ExecutionStatus};
pub use recursion::ChainDepth;
pub use rules::{
    ActionType, AutomationAction, AutomationCondition, AutomationRule, AutomationTrigger,
    ConditionOperator, ExecutionMode, LogicalGroup, RuleStore,
};
