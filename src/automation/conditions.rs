// Condition Evaluator - evaluates a rule's condition set against a record

use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use super::rules::{AutomationRule, ConditionOperator, LogicalGroup};
use crate::error::EngineResult;
use crate::events::{DomainEvent, FieldChange};
use crate::metadata::MetadataCache;
use crate::services::RecordStore;

pub struct ConditionEvaluator {
    metadata: Arc<dyn MetadataCache>,
    records: Arc<dyn RecordStore>,
}

impl ConditionEvaluator {
    pub fn new(metadata: Arc<dyn MetadataCache>, records: Arc<dyn RecordStore>) -> Self {
        Self { metadata, records }
    }

    /// Evaluate all conditions of a rule against the triggering event.
    ///
    /// A rule with no conditions matches vacuously. Field values are
    /// batch-loaded once per evaluation, not per condition. If any
    /// condition is tagged `Or`, the whole set is pure OR; otherwise the
    /// set is pure AND. Mixed sub-groups are not supported.
    pub async fn evaluate(
        &self,
        rule: &AutomationRule,
        event: &DomainEvent,
    ) -> EngineResult<bool> {
        if rule.conditions.is_empty() {
            return Ok(true);
        }

        let values = self.records.field_values(event.record_id).await?;

        let mut any_or = false;
        let mut results = Vec::with_capacity(rule.conditions.len());
        for condition in &rule.conditions {
            if condition.logical_group == LogicalGroup::Or {
                any_or = true;
            }
            results.push(self.evaluate_condition(condition, event, &values).await?);
        }

        let matched = if any_or {
            results.iter().any(|&r| r)
        } else {
            results.iter().all(|&r| r)
        };

        debug!(
            rule = %rule.name,
            conditions = rule.conditions.len(),
            or_mode = any_or,
            matched,
            "evaluated rule conditions"
        );
        Ok(matched)
    }

    async fn evaluate_condition(
        &self,
        condition: &super::rules::AutomationCondition,
        event: &DomainEvent,
        values: &HashMap<String, String>,
    ) -> EngineResult<bool> {
        // A field that no longer resolves contributes false, never an error.
        let Some(field) = self.metadata.field_by_id(condition.field_id).await? else {
            debug!(field_id = %condition.field_id, "condition field no longer resolves");
            return Ok(false);
        };

        let current = values.get(&field.name).map(String::as_str);
        Ok(apply_operator(
            condition.operator,
            current,
            condition.value.as_deref(),
            event.changed_field(&field.name),
        ))
    }
}

/// Apply a single comparison operator.
///
/// Shared with the workflow Condition step handler, which evaluates the
/// same operators against step configuration.
pub fn apply_operator(
    operator: ConditionOperator,
    current: Option<&str>,
    literal: Option<&str>,
    change: Option<&FieldChange>,
) -> bool {
    match operator {
        ConditionOperator::Equals => eq_ignore_case(current, literal),
        ConditionOperator::NotEquals => !eq_ignore_case(current, literal),
        ConditionOperator::GreaterThan => compare(current, literal) == Some(Ordering::Greater),
        ConditionOperator::LessThan => compare(current, literal) == Some(Ordering::Less),
        ConditionOperator::Contains => match (current, literal) {
            (Some(c), Some(l)) => c.to_lowercase().contains(&l.to_lowercase()),
            _ => false,
        },
        ConditionOperator::StartsWith => match (current, literal) {
            (Some(c), Some(l)) => c.to_lowercase().starts_with(&l.to_lowercase()),
            _ => false,
        },
        ConditionOperator::ChangedTo => change
            .map(|c| eq_ignore_case(c.new_value.as_deref(), literal))
            .unwrap_or(false),
        ConditionOperator::ChangedFrom => change
            .map(|c| eq_ignore_case(c.old_value.as_deref(), literal))
            .unwrap_or(false),
        // Fail closed on operators this build does not know.
        ConditionOperator::Unknown => false,
    }
}

fn eq_ignore_case(a: Option<&str>, b: Option<&str>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
        (None, None) => true,
        _ => false,
    }
}

/// Numeric compare when both sides parse as decimals, otherwise
/// case-insensitive lexicographic compare. Either side missing ⇒ no order.
fn compare(current: Option<&str>, literal: Option<&str>) -> Option<Ordering> {
    let (c, l) = match (current, literal) {
        (Some(c), Some(l)) => (c, l),
        _ => return None,
    };
    match (c.trim().parse::<Decimal>(), l.trim().parse::<Decimal>()) {
        (Ok(a), Ok(b)) => Some(a.cmp(&b)),
        _ => Some(c.to_lowercase().cmp(&l.to_lowercase())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equals_is_case_insensitive() {
        assert!(apply_operator(
            ConditionOperator::Equals,
            Some("High"),
            Some("high"),
            None
        ));
        assert!(!apply_operator(
            ConditionOperator::Equals,
            Some("high"),
            Some("low"),
            None
        ));
        assert!(apply_operator(ConditionOperator::Equals, None, None, None));
        assert!(!apply_operator(
            ConditionOperator::Equals,
            None,
            Some("high"),
            None
        ));
    }

    #[test]
    fn test_numeric_compare_prefers_decimals() {
        // "9" > "10" lexicographically but not numerically.
        assert!(!apply_operator(
            ConditionOperator::GreaterThan,
            Some("9"),
            Some("10"),
            None
        ));
        assert!(apply_operator(
            ConditionOperator::LessThan,
            Some("9"),
            Some("10"),
            None
        ));
        assert!(apply_operator(
            ConditionOperator::GreaterThan,
            Some("2.50"),
            Some("2.05"),
            None
        ));
    }

    #[test]
    fn test_compare_falls_back_to_lexicographic() {
        assert!(apply_operator(
            ConditionOperator::GreaterThan,
            Some("beta"),
            Some("Alpha"),
            None
        ));
        assert!(!apply_operator(
            ConditionOperator::GreaterThan,
            None,
            Some("alpha"),
            None
        ));
    }

    #[test]
    fn test_contains_and_starts_with_null_current() {
        assert!(apply_operator(
            ConditionOperator::Contains,
            Some("Printer offline"),
            Some("OFFLINE"),
            None
        ));
        assert!(!apply_operator(
            ConditionOperator::Contains,
            None,
            Some("offline"),
            None
        ));
        assert!(apply_operator(
            ConditionOperator::StartsWith,
            Some("VPN outage"),
            Some("vpn"),
            None
        ));
        assert!(!apply_operator(
            ConditionOperator::StartsWith,
            None,
            Some("vpn"),
            None
        ));
    }

    #[test]
    fn test_changed_to_requires_a_diff_entry() {
        let change = FieldChange::new(Some("open"), Some("resolved"));
        assert!(apply_operator(
            ConditionOperator::ChangedTo,
            Some("resolved"),
            Some("resolved"),
            Some(&change)
        ));
        assert!(apply_operator(
            ConditionOperator::ChangedFrom,
            Some("resolved"),
            Some("open"),
            Some(&change)
        ));
        // No diff entry for the field ⇒ false regardless of current value.
        assert!(!apply_operator(
            ConditionOperator::ChangedTo,
            Some("resolved"),
            Some("resolved"),
            None
        ));
    }

    #[test]
    fn test_unknown_operator_fails_closed() {
        assert!(!apply_operator(
            ConditionOperator::Unknown,
            Some("x"),
            Some("x"),
            None
        ));
    }
}
