//! Audit trail endpoints. Read-only; entries are appended by the write
//! handlers themselves.

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use crate::auth::{require_admin_like, CurrentStaff};
use crate::error::ApiError;
use crate::state::AppState;
use od_core::audit::{AuditAction, AuditEntry};
use od_core::db::{create_audit_repository, AuditFilter, Pagination};

/// Creates audit trail routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(list_entries))
}

/// Query parameters for listing audit entries.
#[derive(Debug, Deserialize, Validate)]
pub struct ListAuditQuery {
    pub target_kind: Option<String>,
    pub target_id: Option<Uuid>,
    pub actor: Option<Uuid>,
    /// One of `create`, `update`, `delete`.
    pub action: Option<String>,
    #[validate(range(min = 1))]
    pub page: Option<u32>,
    #[validate(range(min = 1, max = 200))]
    pub per_page: Option<u32>,
}

/// Paginated audit trail response.
#[derive(Debug, Serialize)]
pub struct PaginatedAuditResponse {
    pub data: Vec<AuditEntry>,
    pub page: u32,
    pub per_page: u32,
    pub total_items: u64,
    pub total_pages: u32,
}

async fn list_entries(
    State(state): State<AppState>,
    CurrentStaff(staff): CurrentStaff,
    Query(query): Query<ListAuditQuery>,
) -> Result<Json<PaginatedAuditResponse>, ApiError> {
    require_admin_like(&staff)?;
    query.validate()?;

    let action = match &query.action {
        Some(raw) => Some(AuditAction::from_str(raw).map_err(|_| {
            ApiError::validation_field("action", "invalid", "expected create, update or delete")
        })?),
        None => None,
    };

    let filter = AuditFilter {
        target_kind: query.target_kind,
        target_id: query.target_id,
        actor_id: query.actor,
        action,
    };
    let pagination = Pagination::from_query(query.page, query.per_page);

    let page = create_audit_repository(&state.db)
        .list(&filter, &pagination)
        .await?;

    Ok(Json(PaginatedAuditResponse {
        page: page.page,
        per_page: page.per_page,
        total_items: page.total,
        total_pages: page.total_pages,
        data: page.items,
    }))
}
