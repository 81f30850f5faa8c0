//! Audit trail for mutating operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// What happened to the target record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Create => "create",
            AuditAction::Update => "update",
            AuditAction::Delete => "delete",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AuditAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(AuditAction::Create),
            "update" => Ok(AuditAction::Update),
            "delete" => Ok(AuditAction::Delete),
            other => Err(format!("unknown audit action: {other}")),
        }
    }
}

/// The record an audit entry is about.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditTarget {
    /// Table-like kind, e.g. `"organization"` or `"cert_letter"`.
    pub kind: String,
    pub id: Uuid,
    /// Human-readable label captured at write time, so the trail stays
    /// readable after the record is deleted.
    pub label: String,
}

/// One entry in the audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: Uuid,
    /// Staff profile that performed the action, if any (seed and migration
    /// writes have none).
    pub actor_id: Option<Uuid>,
    pub action: AuditAction,
    pub target: AuditTarget,
    /// For updates: map of field name to `{"from": .., "to": ..}`.
    pub changes: Value,
    pub created_at: DateTime<Utc>,
}

impl AuditEntry {
    pub fn new(actor_id: Option<Uuid>, action: AuditAction, target: AuditTarget) -> Self {
        Self {
            id: Uuid::new_v4(),
            actor_id,
            action,
            target,
            changes: Value::Null,
            created_at: Utc::now(),
        }
    }

    pub fn with_changes(mut self, changes: Value) -> Self {
        self.changes = changes;
        self
    }
}

/// Diffs two JSON snapshots of a record and returns only the fields that
/// changed, each as `{"from": old, "to": new}`. Non-object inputs yield an
/// empty map.
pub fn changed_fields(before: &Value, after: &Value) -> Value {
    let (Some(before), Some(after)) = (before.as_object(), after.as_object()) else {
        return Value::Object(Map::new());
    };
    let mut out = Map::new();
    for (key, new) in after {
        let old = before.get(key).unwrap_or(&Value::Null);
        if old != new {
            out.insert(
                key.clone(),
                serde_json::json!({ "from": old, "to": new }),
            );
        }
    }
    for (key, old) in before {
        if !after.contains_key(key) {
            out.insert(
                key.clone(),
                serde_json::json!({ "from": old, "to": Value::Null }),
            );
        }
    }
    Value::Object(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn diff_reports_only_changes() {
        let before = json!({"name": "Alpha", "phone": "100", "email": ""});
        let after = json!({"name": "Alpha", "phone": "200", "email": ""});
        let diff = changed_fields(&before, &after);
        assert_eq!(diff, json!({"phone": {"from": "100", "to": "200"}}));
    }

    #[test]
    fn diff_handles_added_and_removed_keys() {
        let before = json!({"a": 1});
        let after = json!({"b": 2});
        let diff = changed_fields(&before, &after);
        assert_eq!(diff["a"], json!({"from": 1, "to": null}));
        assert_eq!(diff["b"], json!({"from": null, "to": 2}));
    }

    #[test]
    fn diff_of_non_objects_is_empty() {
        assert_eq!(changed_fields(&json!(1), &json!(2)), json!({}));
    }

    #[test]
    fn action_round_trip() {
        for a in [AuditAction::Create, AuditAction::Update, AuditAction::Delete] {
            assert_eq!(a.as_str().parse::<AuditAction>().unwrap(), a);
        }
    }
}
