//! Category directory endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use validator::Validate;

use crate::auth::{staff_view, CurrentStaff};
use crate::error::ApiError;
use crate::routes::record_audit;
use crate::state::AppState;
use od_core::audit::{changed_fields, AuditAction};
use od_core::db::create_category_repository;
use od_core::org::{Category, CategoryUpdate, CategoryWithCounts};
use od_core::permissions::{can_edit, WriteTarget};
use od_core::slugs::{slugify, unique_slug};

/// Creates category routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_categories).post(create_category))
        .route(
            "/:slug",
            get(get_category)
                .put(update_category)
                .delete(delete_category),
        )
}

/// Request body for creating a category.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub badge: String,
}

/// Request body for updating a category.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCategoryRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub badge: Option<String>,
}

async fn resolve_by_slug(state: &AppState, slug: &str) -> Result<Category, ApiError> {
    create_category_repository(&state.db)
        .get_by_slug(slug)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("category '{slug}' not found")))
}

async fn check_category_write(
    state: &AppState,
    staff: &od_core::staff::StaffProfile,
    category: &Category,
) -> Result<(), ApiError> {
    let view = staff_view(state, staff).await?;
    if can_edit(Some(&view), &WriteTarget::category(category)) {
        Ok(())
    } else {
        Err(ApiError::Forbidden(format!(
            "no curatorship over category '{}'",
            category.slug
        )))
    }
}

/// List all categories with organization counts.
async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<CategoryWithCounts>>, ApiError> {
    let categories = create_category_repository(&state.db).list().await?;
    Ok(Json(categories))
}

/// Get one category by slug.
async fn get_category(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Category>, ApiError> {
    Ok(Json(resolve_by_slug(&state, &slug).await?))
}

/// Create a category. The slug is generated from the name.
async fn create_category(
    State(state): State<AppState>,
    CurrentStaff(staff): CurrentStaff,
    Json(body): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<Category>), ApiError> {
    body.validate()?;

    let view = staff_view(&state, &staff).await?;
    if !view.is_admin_like() {
        return Err(ApiError::Forbidden(
            "only admins and managers create categories".to_string(),
        ));
    }

    let repo = create_category_repository(&state.db);
    let taken = repo.list_slugs().await?.into_iter().collect();
    let slug = unique_slug(&slugify(&body.name), &taken);

    let mut category = Category::new(body.name, slug);
    category.description = body.description;
    category.badge = body.badge;

    let created = repo.create(&category).await?;
    record_audit(
        &state,
        Some(staff.id),
        AuditAction::Create,
        "category",
        created.id,
        &created.name,
        None,
    )
    .await;

    Ok((StatusCode::CREATED, Json(created)))
}

/// Update a category. The slug never changes.
async fn update_category(
    State(state): State<AppState>,
    CurrentStaff(staff): CurrentStaff,
    Path(slug): Path<String>,
    Json(body): Json<UpdateCategoryRequest>,
) -> Result<Json<Category>, ApiError> {
    body.validate()?;

    let existing = resolve_by_slug(&state, &slug).await?;
    check_category_write(&state, &staff, &existing).await?;

    let update = CategoryUpdate {
        name: body.name,
        description: body.description,
        badge: body.badge,
    };
    let updated = create_category_repository(&state.db)
        .update(existing.id, &update)
        .await?;

    let changes = changed_fields(
        &serde_json::to_value(&existing)?,
        &serde_json::to_value(&updated)?,
    );
    record_audit(
        &state,
        Some(staff.id),
        AuditAction::Update,
        "category",
        updated.id,
        &updated.name,
        Some(changes),
    )
    .await;

    Ok(Json(updated))
}

/// Delete a category.
async fn delete_category(
    State(state): State<AppState>,
    CurrentStaff(staff): CurrentStaff,
    Path(slug): Path<String>,
) -> Result<StatusCode, ApiError> {
    let existing = resolve_by_slug(&state, &slug).await?;
    check_category_write(&state, &staff, &existing).await?;

    create_category_repository(&state.db)
        .delete(existing.id)
        .await?;
    record_audit(
        &state,
        Some(staff.id),
        AuditAction::Delete,
        "category",
        existing.id,
        &existing.name,
        None,
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}
