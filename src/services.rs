// External Services - narrow collaborator interfaces the engines depend on
//
// Everything here is implemented outside this crate (EAV storage,
// assignment, state machine, notification delivery, activity stream). The
// engines never see SQL, HTTP or queue internals through these traits.

use async_trait::async_trait;
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::EngineResult;

/// Point-in-time access to a record's field values.
///
/// `field_values` is a batch read keyed by field name; evaluation against
/// it is eventually consistent with concurrent writers by design.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn field_values(&self, record_id: Uuid) -> EngineResult<HashMap<String, String>>;
    async fn upsert_field_value(
        &self,
        record_id: Uuid,
        field_id: Uuid,
        value: &str,
    ) -> EngineResult<()>;
}

/// Assigns a record to a user or a group.
#[async_trait]
pub trait AssignmentService: Send + Sync {
    async fn assign_user(&self, record_id: Uuid, user_id: Uuid) -> EngineResult<()>;
    async fn assign_group(&self, record_id: Uuid, group_id: Uuid) -> EngineResult<()>;
}

/// Executes a state transition on a record on behalf of a caller role set.
#[async_trait]
pub trait StateMachineService: Send + Sync {
    async fn change_state(
        &self,
        record_id: Uuid,
        target_state: &str,
        caller_roles: &[&str],
    ) -> EngineResult<()>;
}

/// Sends a templated notification by code.
#[async_trait]
pub trait NotificationService: Send + Sync {
    async fn send(
        &self,
        template_code: &str,
        record_id: Uuid,
        recipients: &[String],
    ) -> EngineResult<()>;
}

/// Appends activity entries to a record's stream. Used both for workflow
/// comments and for recording isolated automation action failures.
#[async_trait]
pub trait ActivityService: Send + Sync {
    async fn append_system(&self, record_id: Uuid, kind: &str, message: &str) -> EngineResult<()>;
    async fn append_comment(&self, record_id: Uuid, body: &str, actor: &str) -> EngineResult<()>;
}
