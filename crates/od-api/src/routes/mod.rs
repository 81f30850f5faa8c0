//! API routes.

pub mod audit;
pub mod categories;
pub mod cert_letters;
pub mod curatorships;
pub mod external_letters;
pub mod health;
pub mod org_structure;
pub mod organizations;
pub mod staff;
pub mod statistics;

use crate::state::AppState;
use axum::Router;
use serde::{Deserialize, Deserializer};
use od_core::audit::{AuditAction, AuditEntry, AuditTarget};
use od_core::db::create_audit_repository;
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

/// Creates the main API router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api", api_routes())
        .merge(health::routes())
        .with_state(state)
}

/// API routes under the /api prefix.
fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/categories", categories::routes())
        .nest("/organizations", organizations::routes())
        .nest("/org-units", org_structure::unit_routes())
        .nest("/org-employees", org_structure::employee_routes())
        .nest("/management-units", staff::management_unit_routes())
        .nest("/departments", staff::department_routes())
        .nest("/staff/profiles", staff::profile_routes())
        .nest("/staff/curatorships", curatorships::routes())
        .nest("/cert/letters", cert_letters::letter_routes())
        .nest("/cert/letter-replies", cert_letters::reply_routes())
        .nest("/external/categories", external_letters::category_routes())
        .nest("/external/letters", external_letters::letter_routes())
        .nest(
            "/external/letter-replies",
            external_letters::reply_routes(),
        )
        .nest("/audit", audit::routes())
        .nest("/statistics", statistics::routes())
}

/// Deserializer for double-option fields: a present `null` becomes
/// `Some(None)` (clear the value), while an absent field stays `None` via
/// `#[serde(default)]` (leave it untouched).
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Appends an audit entry for a completed write. Failures are logged, not
/// surfaced, so an audit hiccup never rolls back a committed change.
pub(crate) async fn record_audit(
    state: &AppState,
    actor_id: Option<Uuid>,
    action: AuditAction,
    kind: &str,
    target_id: Uuid,
    label: &str,
    changes: Option<Value>,
) {
    let mut entry = AuditEntry::new(
        actor_id,
        action,
        AuditTarget {
            kind: kind.to_string(),
            id: target_id,
            label: label.to_string(),
        },
    );
    if let Some(changes) = changes {
        entry = entry.with_changes(changes);
    }
    if let Err(e) = create_audit_repository(&state.db).append(&entry).await {
        warn!(error = %e, kind, target_id = %target_id, "Failed to record audit entry");
    }
}
