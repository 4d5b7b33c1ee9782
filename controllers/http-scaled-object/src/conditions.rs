//! Status condition helpers for HTTPScaledObject.
//!
//! Pure functions: building a condition and merging it into an object's
//! status never touches the API server and cannot fail. Persisting the
//! result is the reconciler's job.

use chrono::{SecondsFormat, Utc};
use crds::{
    ConditionReason, ConditionStatus, ConditionType, HTTPScaledObject, HTTPScaledObjectCondition,
};

/// Builds a condition stamped with the current time.
pub fn create_condition(
    type_: ConditionType,
    status: ConditionStatus,
    reason: ConditionReason,
) -> HTTPScaledObjectCondition {
    HTTPScaledObjectCondition {
        type_,
        status,
        reason: Some(reason),
        message: None,
        timestamp: Some(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)),
    }
}

/// Builder-style additions to a condition
pub trait ConditionExt {
    /// Attaches a human-readable message
    fn with_message(self, message: impl Into<String>) -> Self;
}

impl ConditionExt for HTTPScaledObjectCondition {
    fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Merges `condition` into the object's status, keeping one entry per type.
///
/// An existing entry of the same type is replaced. When its status does not
/// change, the original timestamp is kept, since it records the transition.
/// A condition of a new type is appended. Returns whether the list changed.
pub fn add_condition(httpso: &mut HTTPScaledObject, mut condition: HTTPScaledObjectCondition) -> bool {
    let status = httpso.status.get_or_insert_with(Default::default);

    match status.conditions.iter_mut().find(|c| c.type_ == condition.type_) {
        Some(existing) => {
            if existing.status == condition.status {
                if existing.reason == condition.reason && existing.message == condition.message {
                    return false;
                }
                condition.timestamp = existing.timestamp.clone();
            }
            *existing = condition;
            true
        }
        None => {
            status.conditions.push(condition);
            true
        }
    }
}
