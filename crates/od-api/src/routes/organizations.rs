//! Organization directory endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::{staff_view, CurrentStaff};
use crate::error::ApiError;
use crate::routes::record_audit;
use crate::state::AppState;
use od_core::audit::{changed_fields, AuditAction};
use od_core::db::{create_category_repository, create_organization_repository, Pagination};
use od_core::org::{Organization, OrganizationFilter, OrganizationOrder, OrganizationUpdate};
use od_core::permissions::{can_edit, WriteTarget};
use od_core::slugs::{slugify, unique_slug};
use uuid::Uuid;

/// Creates organization routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_organizations).post(create_organization))
        .route(
            "/:slug",
            get(get_organization)
                .put(update_organization)
                .delete(delete_organization),
        )
}

/// Query parameters for listing organizations.
#[derive(Debug, Deserialize, Validate)]
pub struct ListOrganizationsQuery {
    /// Filter by category slug.
    pub category: Option<String>,
    /// Substring search over name, description, address, lotus, phone, email.
    pub search: Option<String>,
    /// Sort order: `created` (default), `updated`, `name`.
    pub ordering: Option<String>,
    #[validate(range(min = 1))]
    pub page: Option<u32>,
    #[validate(range(min = 1, max = 200))]
    pub per_page: Option<u32>,
}

/// Request body for creating an organization.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrganizationRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    /// Category slug the organization belongs to.
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub lotus: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
}

/// Request body for updating an organization. The slug never changes.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateOrganizationRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
    pub lotus: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    /// Stored logo file name; an explicit `null` clears it, absence leaves
    /// it untouched.
    #[serde(default, deserialize_with = "crate::routes::double_option")]
    pub logo_file: Option<Option<String>>,
}

/// Paginated organizations response.
#[derive(Debug, Serialize)]
pub struct PaginatedOrganizationsResponse {
    pub data: Vec<Organization>,
    pub page: u32,
    pub per_page: u32,
    pub total_items: u64,
    pub total_pages: u32,
}

async fn resolve_by_slug(state: &AppState, slug: &str) -> Result<Organization, ApiError> {
    create_organization_repository(&state.db)
        .get_by_slug(slug)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("organization '{slug}' not found")))
}

async fn resolve_category_id(state: &AppState, slug: &str) -> Result<Uuid, ApiError> {
    create_category_repository(&state.db)
        .get_by_slug(slug)
        .await?
        .map(|c| c.id)
        .ok_or_else(|| {
            ApiError::validation_field("category", "not_found", &format!("unknown category '{slug}'"))
        })
}

async fn check_org_write(
    state: &AppState,
    staff: &od_core::staff::StaffProfile,
    org: &Organization,
) -> Result<(), ApiError> {
    let view = staff_view(state, staff).await?;
    if can_edit(Some(&view), &WriteTarget::organization(org)) {
        Ok(())
    } else {
        Err(ApiError::Forbidden(format!(
            "no curatorship over organization '{}'",
            org.slug
        )))
    }
}

/// List organizations with filters and pagination.
async fn list_organizations(
    State(state): State<AppState>,
    Query(query): Query<ListOrganizationsQuery>,
) -> Result<Json<PaginatedOrganizationsResponse>, ApiError> {
    query.validate()?;

    let filter = OrganizationFilter {
        category_slug: query.category,
        search: query.search,
        order: query
            .ordering
            .as_deref()
            .map(OrganizationOrder::parse)
            .unwrap_or_default(),
    };
    let pagination = Pagination::from_query(query.page, query.per_page);

    let page = create_organization_repository(&state.db)
        .list(&filter, &pagination)
        .await?;

    Ok(Json(PaginatedOrganizationsResponse {
        page: page.page,
        per_page: page.per_page,
        total_items: page.total,
        total_pages: page.total_pages,
        data: page.items,
    }))
}

/// Get one organization by slug.
async fn get_organization(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Organization>, ApiError> {
    Ok(Json(resolve_by_slug(&state, &slug).await?))
}

/// Create an organization. The slug is generated from the name and fixed
/// for the lifetime of the record.
async fn create_organization(
    State(state): State<AppState>,
    CurrentStaff(staff): CurrentStaff,
    Json(body): Json<CreateOrganizationRequest>,
) -> Result<(StatusCode, Json<Organization>), ApiError> {
    body.validate()?;

    let category_id = resolve_category_id(&state, &body.category).await?;

    // Creating inside a category requires edit rights over that category.
    let view = staff_view(&state, &staff).await?;
    let category_target = WriteTarget::Category { id: category_id };
    if !can_edit(Some(&view), &category_target) {
        return Err(ApiError::Forbidden(format!(
            "no curatorship over category '{}'",
            body.category
        )));
    }

    let repo = create_organization_repository(&state.db);
    let taken = repo.list_slugs().await?.into_iter().collect();
    let slug = unique_slug(&slugify(&body.name), &taken);

    let mut org = Organization::new(body.name, slug, category_id);
    org.description = body.description;
    org.address = body.address;
    org.lotus = body.lotus;
    org.phone = body.phone;
    org.email = body.email;

    let created = repo.create(&org).await?;
    record_audit(
        &state,
        Some(staff.id),
        AuditAction::Create,
        "organization",
        created.id,
        &created.name,
        None,
    )
    .await;

    Ok((StatusCode::CREATED, Json(created)))
}

/// Update an organization. The slug never changes, even on rename.
async fn update_organization(
    State(state): State<AppState>,
    CurrentStaff(staff): CurrentStaff,
    Path(slug): Path<String>,
    Json(body): Json<UpdateOrganizationRequest>,
) -> Result<Json<Organization>, ApiError> {
    body.validate()?;

    let existing = resolve_by_slug(&state, &slug).await?;
    check_org_write(&state, &staff, &existing).await?;

    let category_id = match &body.category {
        Some(category_slug) => Some(resolve_category_id(&state, category_slug).await?),
        None => None,
    };

    let update = OrganizationUpdate {
        name: body.name,
        description: body.description,
        address: body.address,
        lotus: body.lotus,
        phone: body.phone,
        email: body.email,
        category_id,
        logo_file: body.logo_file,
    };
    let updated = create_organization_repository(&state.db)
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
        "organization",
        updated.id,
        &updated.name,
        Some(changes),
    )
    .await;

    Ok(Json(updated))
}

/// Delete an organization.
async fn delete_organization(
    State(state): State<AppState>,
    CurrentStaff(staff): CurrentStaff,
    Path(slug): Path<String>,
) -> Result<StatusCode, ApiError> {
    let existing = resolve_by_slug(&state, &slug).await?;
    check_org_write(&state, &staff, &existing).await?;

    create_organization_repository(&state.db)
        .delete(existing.id)
        .await?;
    record_audit(
        &state,
        Some(staff.id),
        AuditAction::Delete,
        "organization",
        existing.id,
        &existing.name,
        None,
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}
