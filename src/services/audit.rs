use axum::http::HeaderMap;
use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, DatabaseConnection};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::auth::{extract_client_ip, extract_user_agent};
use crate::entities::admin_log;

/// Request metadata captured alongside every audit row.
#[derive(Debug, Clone, Default)]
pub struct AuditContext {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl AuditContext {
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            ip_address: extract_client_ip(headers),
            user_agent: extract_user_agent(headers),
        }
    }
}

pub struct AuditService;

impl AuditService {
    /// Append an audit row for a privileged mutation.
    ///
    /// Best-effort by contract: the mutation has already committed by the
    /// time this runs, so a failed write is logged server-side and swallowed
    /// rather than turning a successful mutation into a 500.
    pub async fn record(
        db: &DatabaseConnection,
        actor_id: Uuid,
        action: &str,
        entity_type: &str,
        entity_id: Option<String>,
        details: Option<Value>,
        ctx: &AuditContext,
    ) {
        let details_text = details.as_ref().map(std::string::ToString::to_string);

        let row = admin_log::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(actor_id),
            action: Set(action.to_string()),
            entity_type: Set(entity_type.to_string()),
            entity_id: Set(entity_id),
            details: Set(details_text),
            ip_address: Set(ctx.ip_address.clone()),
            user_agent: Set(ctx.user_agent.clone()),
            created_at: Set(Utc::now().fixed_offset()),
        };

        if let Err(err) = row.insert(db).await {
            tracing::error!(
                action,
                entity_type,
                error = %err,
                "Failed to persist admin audit log entry"
            );
        }
    }
}

/// Field-level diff of two JSON objects, for audit `details` on updates.
///
/// Returns `{ field: { "from": old, "to": new } }` over the union of keys;
/// unchanged fields are omitted. Non-object inputs produce an empty object.
#[must_use]
pub fn compute_diff(old: &Value, new: &Value) -> Value {
    let (Some(old_map), Some(new_map)) = (old.as_object(), new.as_object()) else {
        return Value::Object(Map::new());
    };

    let mut diff = Map::new();

    for (key, old_value) in old_map {
        let new_value = new_map.get(key).unwrap_or(&Value::Null);
        if old_value != new_value {
            diff.insert(
                key.clone(),
                serde_json::json!({ "from": old_value, "to": new_value }),
            );
        }
    }

    for (key, new_value) in new_map {
        if !old_map.contains_key(key) && *new_value != Value::Null {
            diff.insert(
                key.clone(),
                serde_json::json!({ "from": Value::Null, "to": new_value }),
            );
        }
    }

    Value::Object(diff)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_diff_changed_field() {
        let old = json!({ "name": "a", "priority": 1 });
        let new = json!({ "name": "a", "priority": 2 });
        assert_eq!(
            compute_diff(&old, &new),
            json!({ "priority": { "from": 1, "to": 2 } })
        );
    }

    #[test]
    fn test_diff_added_and_removed_fields() {
        let old = json!({ "gone": true });
        let new = json!({ "added": "x" });
        let diff = compute_diff(&old, &new);
        assert_eq!(diff["gone"], json!({ "from": true, "to": null }));
        assert_eq!(diff["added"], json!({ "from": null, "to": "x" }));
    }

    #[test]
    fn test_diff_identical_is_empty() {
        let v = json!({ "a": 1, "b": [1, 2] });
        assert_eq!(compute_diff(&v, &v), json!({}));
    }

    #[test]
    fn test_diff_non_objects_empty() {
        assert_eq!(compute_diff(&json!(1), &json!(2)), json!({}));
    }
}
