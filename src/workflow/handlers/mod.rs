// Built-in Step Handlers

pub mod approval;
pub mod condition;
pub mod update_field;

pub use approval::{ApprovalHandler, APPROVAL_STEP_TYPE, APPROVED_EVENT, REJECTED_EVENT};
pub use condition::{
    ConditionHandler, CONDITION_STEP_TYPE, DEFAULT_EVENT, FALSE_EVENT, TRUE_EVENT,
};
pub use update_field::{UpdateFieldHandler, SUCCESS_EVENT, UPDATE_FIELD_STEP_TYPE};
