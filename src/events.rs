// Domain Events - record lifecycle events that drive rule and workflow execution

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Lifecycle event kinds a rule can listen for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TriggerEventType {
    RecordCreated,
    RecordUpdated,
    StateChanged,
    AssignmentChanged,
    SlaBreached,
    CommentAdded,
}

impl TriggerEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RecordCreated => "record_created",
            Self::RecordUpdated => "record_updated",
            Self::StateChanged => "state_changed",
            Self::AssignmentChanged => "assignment_changed",
            Self::SlaBreached => "sla_breached",
            Self::CommentAdded => "comment_added",
        }
    }
}

/// Before/after values for a single field in an update-type event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldChange {
    pub old_value: Option<String>,
    pub new_value: Option<String>,
}

impl FieldChange {
    pub fn new(old_value: Option<&str>, new_value: Option<&str>) -> Self {
        Self {
            old_value: old_value.map(str::to_string),
            new_value: new_value.map(str::to_string),
        }
    }
}

/// Who raised the event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum EventSource {
    System,
    User(Uuid),
    Integration(String),
}

/// A typed, fully serializable record lifecycle event.
///
/// The event must round-trip through serde unchanged: background rule
/// execution ships a snapshot of it across the job queue, and the worker
/// must be able to rebuild the exact same event with no shared state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainEvent {
    pub event_id: Uuid,
    pub event_type: TriggerEventType,
    pub record_id: Uuid,
    pub table_id: Uuid,
    pub table_name: String,
    pub tenant_id: Uuid,
    pub source: EventSource,
    /// Field-name keyed diff; empty for non-update events.
    #[serde(default)]
    pub changed_fields: HashMap<String, FieldChange>,
    pub occurred_at: DateTime<Utc>,
    pub correlation_id: Option<Uuid>,
}

impl DomainEvent {
    pub fn new(
        event_type: TriggerEventType,
        record_id: Uuid,
        table_id: Uuid,
        table_name: &str,
        tenant_id: Uuid,
        source: EventSource,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            event_type,
            record_id,
            table_id,
            table_name: table_name.to_string(),
            tenant_id,
            source,
            changed_fields: HashMap::new(),
            occurred_at: Utc::now(),
            correlation_id: None,
        }
    }

    /// Create a record created event
    pub fn record_created(
        record_id: Uuid,
        table_id: Uuid,
        table_name: &str,
        tenant_id: Uuid,
        source: EventSource,
    ) -> Self {
        Self::new(
            TriggerEventType::RecordCreated,
            record_id,
            table_id,
            table_name,
            tenant_id,
            source,
        )
    }

    /// Create a record updated event carrying a before/after diff
    pub fn record_updated(
        record_id: Uuid,
        table_id: Uuid,
        table_name: &str,
        tenant_id: Uuid,
        source: EventSource,
        changed_fields: HashMap<String, FieldChange>,
    ) -> Self {
        let mut event = Self::new(
            TriggerEventType::RecordUpdated,
            record_id,
            table_id,
            table_name,
            tenant_id,
            source,
        );
        event.changed_fields = changed_fields;
        event
    }

    /// Create a state changed event
    pub fn state_changed(
        record_id: Uuid,
        table_id: Uuid,
        table_name: &str,
        tenant_id: Uuid,
        old_state: &str,
        new_state: &str,
        changed_by: Uuid,
    ) -> Self {
        let mut event = Self::new(
            TriggerEventType::StateChanged,
            record_id,
            table_id,
            table_name,
            tenant_id,
            EventSource::User(changed_by),
        );
        event.changed_fields.insert(
            "state".to_string(),
            FieldChange::new(Some(old_state), Some(new_state)),
        );
        event
    }

    /// Create an assignment changed event
    pub fn assignment_changed(
        record_id: Uuid,
        table_id: Uuid,
        table_name: &str,
        tenant_id: Uuid,
        old_assignee: Option<Uuid>,
        new_assignee: Uuid,
        assigned_by: Uuid,
    ) -> Self {
        let mut event = Self::new(
            TriggerEventType::AssignmentChanged,
            record_id,
            table_id,
            table_name,
            tenant_id,
            EventSource::User(assigned_by),
        );
        let old = old_assignee.map(|id| id.to_string());
        event.changed_fields.insert(
            "assigned_to".to_string(),
            FieldChange::new(old.as_deref(), Some(&new_assignee.to_string())),
        );
        event
    }

    /// Create an SLA breached event
    pub fn sla_breached(
        record_id: Uuid,
        table_id: Uuid,
        table_name: &str,
        tenant_id: Uuid,
    ) -> Self {
        Self::new(
            TriggerEventType::SlaBreached,
            record_id,
            table_id,
            table_name,
            tenant_id,
            EventSource::System,
        )
    }

    /// Create a comment added event
    pub fn comment_added(
        record_id: Uuid,
        table_id: Uuid,
        table_name: &str,
        tenant_id: Uuid,
        author: Uuid,
    ) -> Self {
        Self::new(
            TriggerEventType::CommentAdded,
            record_id,
            table_id,
            table_name,
            tenant_id,
            EventSource::User(author),
        )
    }

    /// Add correlation ID for tracking related events
    pub fn with_correlation_id(mut self, correlation_id: Uuid) -> Self {
        self.correlation_id = Some(correlation_id);
        self
    }

    /// Whether this event kind carries a before/after field diff.
    ///
    /// `ChangedTo`/`ChangedFrom` conditions only apply to these events.
    pub fn carries_diff(&self) -> bool {
        matches!(
            self.event_type,
            TriggerEventType::RecordUpdated
                | TriggerEventType::StateChanged
                | TriggerEventType::AssignmentChanged
        )
    }

    pub fn changed_field(&self, field_name: &str) -> Option<&FieldChange> {
        if !self.carries_diff() {
            return None;
        }
        self.changed_fields.get(field_name)
    }
}
