//! Curatorship link endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::{require_admin_like, CurrentStaff};
use crate::error::ApiError;
use crate::routes::record_audit;
use crate::state::AppState;
use od_core::audit::AuditAction;
use od_core::curatorship::StaffCuratorship;
use od_core::db::{
    create_category_repository, create_curatorship_repository, create_organization_repository,
    create_staff_profile_repository,
};

/// Creates curatorship routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_curatorships).post(create_curatorship))
        .route(
            "/:id",
            axum::routing::put(set_can_edit).delete(delete_curatorship),
        )
}

/// Query parameters for listing curatorships.
#[derive(Debug, Deserialize)]
pub struct ListCuratorshipsQuery {
    pub staff: Option<Uuid>,
}

/// Request body for creating a curatorship link. Exactly one of
/// `organization_id` and `category_id` must be set.
#[derive(Debug, Deserialize)]
pub struct CreateCuratorshipRequest {
    pub staff_id: Uuid,
    pub organization_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    #[serde(default)]
    pub can_edit: bool,
}

/// Request body for toggling the edit flag on a link.
#[derive(Debug, Deserialize)]
pub struct SetCanEditRequest {
    pub can_edit: bool,
}

async fn list_curatorships(
    State(state): State<AppState>,
    CurrentStaff(staff): CurrentStaff,
    Query(query): Query<ListCuratorshipsQuery>,
) -> Result<Json<Vec<StaffCuratorship>>, ApiError> {
    require_admin_like(&staff)?;

    let repo = create_curatorship_repository(&state.db);
    let links = match query.staff {
        Some(staff_id) => repo.list_for_staff(staff_id).await?,
        None => repo.list().await?,
    };
    Ok(Json(links))
}

async fn create_curatorship(
    State(state): State<AppState>,
    CurrentStaff(staff): CurrentStaff,
    Json(body): Json<CreateCuratorshipRequest>,
) -> Result<(StatusCode, Json<StaffCuratorship>), ApiError> {
    require_admin_like(&staff)?;

    create_staff_profile_repository(&state.db)
        .get(body.staff_id)
        .await?
        .ok_or_else(|| {
            ApiError::validation_field("staff_id", "not_found", "unknown staff profile")
        })?;

    let label = match (body.organization_id, body.category_id) {
        (Some(org_id), None) => {
            let org = create_organization_repository(&state.db)
                .get(org_id)
                .await?
                .ok_or_else(|| {
                    ApiError::validation_field(
                        "organization_id",
                        "not_found",
                        "unknown organization",
                    )
                })?;
            org.name
        }
        (None, Some(cat_id)) => {
            let cat = create_category_repository(&state.db)
                .get(cat_id)
                .await?
                .ok_or_else(|| {
                    ApiError::validation_field("category_id", "not_found", "unknown category")
                })?;
            cat.name
        }
        _ => {
            return Err(ApiError::validation_field(
                "organization_id",
                "invalid",
                "exactly one of organization_id and category_id must be set",
            ));
        }
    };

    let link = StaffCuratorship::new(
        body.staff_id,
        body.organization_id,
        body.category_id,
        body.can_edit,
    )
    .map_err(|e| ApiError::validation_field("organization_id", "invalid", &e.to_string()))?;

    let created = create_curatorship_repository(&state.db)
        .create(&link)
        .await?;
    record_audit(
        &state,
        Some(staff.id),
        AuditAction::Create,
        "curatorship",
        created.id,
        &label,
        None,
    )
    .await;

    Ok((StatusCode::CREATED, Json(created)))
}

async fn set_can_edit(
    State(state): State<AppState>,
    CurrentStaff(staff): CurrentStaff,
    Path(id): Path<Uuid>,
    Json(body): Json<SetCanEditRequest>,
) -> Result<Json<StaffCuratorship>, ApiError> {
    require_admin_like(&staff)?;

    let repo = create_curatorship_repository(&state.db);
    repo.get(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("curatorship {id} not found")))?;

    let updated = repo.set_can_edit(id, body.can_edit).await?;
    record_audit(
        &state,
        Some(staff.id),
        AuditAction::Update,
        "curatorship",
        updated.id,
        "can_edit",
        Some(serde_json::json!({ "can_edit": { "to": body.can_edit } })),
    )
    .await;

    Ok(Json(updated))
}

async fn delete_curatorship(
    State(state): State<AppState>,
    CurrentStaff(staff): CurrentStaff,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    require_admin_like(&staff)?;

    let repo = create_curatorship_repository(&state.db);
    let existing = repo
        .get(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("curatorship {id} not found")))?;

    repo.delete(id).await?;
    record_audit(
        &state,
        Some(staff.id),
        AuditAction::Delete,
        "curatorship",
        existing.id,
        "curatorship",
        None,
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}
