//! Staff directory endpoints: profiles, management units and departments.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use crate::auth::{require_admin_like, CurrentStaff};
use crate::error::ApiError;
use crate::routes::record_audit;
use crate::state::AppState;
use od_core::audit::{changed_fields, AuditAction};
use od_core::curatorship::StaffCuratorship;
use od_core::db::{
    create_curatorship_repository, create_department_repository,
    create_management_unit_repository, create_organization_repository,
    create_staff_profile_repository, StaffFilter,
};
use od_core::org::Organization;
use od_core::slugs::{slugify, unique_slug};
use od_core::staff::{
    Department, ManagementUnit, Position, Role, StaffProfile, StaffProfileUpdate,
};

/// Creates management unit routes.
pub fn management_unit_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_management_units).post(create_management_unit))
        .route("/:id", axum::routing::delete(delete_management_unit))
}

/// Creates department routes.
pub fn department_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_departments).post(create_department))
        .route("/:id", axum::routing::delete(delete_department))
}

/// Creates staff profile routes.
pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_profiles).post(create_profile))
        .route("/me", get(my_profile))
        .route(
            "/:id",
            get(get_profile).put(update_profile).delete(delete_profile),
        )
}

/// Request body for creating a management unit or department.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateNamedUnitRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    /// Required for departments: the parent management unit.
    pub management_id: Option<Uuid>,
}

/// Query parameters for listing departments.
#[derive(Debug, Deserialize)]
pub struct ListDepartmentsQuery {
    pub management: Option<Uuid>,
}

/// Query parameters for listing staff profiles.
#[derive(Debug, Deserialize)]
pub struct ListProfilesQuery {
    pub role: Option<String>,
    pub management: Option<Uuid>,
    pub department: Option<Uuid>,
    /// Substring search over names, lotus, work email.
    pub search: Option<String>,
}

/// Request body for creating a staff profile.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateProfileRequest {
    /// Account id in the fronting auth system.
    pub user_id: Uuid,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub second_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub lotus: String,
    #[serde(default)]
    pub work_email: String,
    #[serde(default)]
    pub work_phone: String,
    pub position: Option<String>,
    pub management_id: Option<Uuid>,
    pub department_id: Option<Uuid>,
    pub role: Option<String>,
}

/// Request body for updating a staff profile.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    pub first_name: Option<String>,
    pub second_name: Option<String>,
    pub last_name: Option<String>,
    pub lotus: Option<String>,
    pub work_email: Option<String>,
    pub work_phone: Option<String>,
    pub position: Option<String>,
    #[serde(default, deserialize_with = "crate::routes::double_option")]
    pub management_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "crate::routes::double_option")]
    pub department_id: Option<Option<Uuid>>,
    pub role: Option<String>,
}

/// Staff profile response: the profile with its curatorship links and the
/// organizations it curates directly.
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    #[serde(flatten)]
    pub profile: StaffProfile,
    pub fio: String,
    pub curatorships: Vec<StaffCuratorship>,
    pub curated_organizations: Vec<Organization>,
}

fn parse_position(raw: &str) -> Result<Position, ApiError> {
    Position::from_str(raw)
        .map_err(|message| ApiError::validation_field("position", "invalid", &message))
}

fn parse_role(raw: &str) -> Result<Role, ApiError> {
    Role::from_str(raw).map_err(|message| ApiError::validation_field("role", "invalid", &message))
}

async fn profile_response(
    state: &AppState,
    profile: StaffProfile,
) -> Result<ProfileResponse, ApiError> {
    let curatorships = create_curatorship_repository(&state.db)
        .list_for_staff(profile.id)
        .await?;

    let org_repo = create_organization_repository(&state.db);
    let mut curated_organizations = Vec::new();
    for link in &curatorships {
        if let Some(org_id) = link.organization_id {
            if let Some(org) = org_repo.get(org_id).await? {
                curated_organizations.push(org);
            }
        }
    }

    let fio = profile.fio();
    Ok(ProfileResponse {
        profile,
        fio,
        curatorships,
        curated_organizations,
    })
}

async fn list_management_units(
    State(state): State<AppState>,
) -> Result<Json<Vec<ManagementUnit>>, ApiError> {
    let units = create_management_unit_repository(&state.db).list().await?;
    Ok(Json(units))
}

async fn create_management_unit(
    State(state): State<AppState>,
    CurrentStaff(staff): CurrentStaff,
    Json(body): Json<CreateNamedUnitRequest>,
) -> Result<(StatusCode, Json<ManagementUnit>), ApiError> {
    body.validate()?;
    require_admin_like(&staff)?;

    let repo = create_management_unit_repository(&state.db);
    let taken = repo.list_slugs().await?.into_iter().collect();
    let unit = ManagementUnit {
        id: Uuid::new_v4(),
        slug: unique_slug(&slugify(&body.name), &taken),
        name: body.name,
    };

    let created = repo.create(&unit).await?;
    record_audit(
        &state,
        Some(staff.id),
        AuditAction::Create,
        "management_unit",
        created.id,
        &created.name,
        None,
    )
    .await;

    Ok((StatusCode::CREATED, Json(created)))
}

async fn delete_management_unit(
    State(state): State<AppState>,
    CurrentStaff(staff): CurrentStaff,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    require_admin_like(&staff)?;

    let repo = create_management_unit_repository(&state.db);
    let existing = repo
        .get(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("management unit {id} not found")))?;

    repo.delete(id).await?;
    record_audit(
        &state,
        Some(staff.id),
        AuditAction::Delete,
        "management_unit",
        existing.id,
        &existing.name,
        None,
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}

async fn list_departments(
    State(state): State<AppState>,
    Query(query): Query<ListDepartmentsQuery>,
) -> Result<Json<Vec<Department>>, ApiError> {
    let departments = create_department_repository(&state.db)
        .list(query.management)
        .await?;
    Ok(Json(departments))
}

async fn create_department(
    State(state): State<AppState>,
    CurrentStaff(staff): CurrentStaff,
    Json(body): Json<CreateNamedUnitRequest>,
) -> Result<(StatusCode, Json<Department>), ApiError> {
    body.validate()?;
    require_admin_like(&staff)?;

    let management_id = body.management_id.ok_or_else(|| {
        ApiError::validation_field("management_id", "required", "a department needs a management unit")
    })?;
    create_management_unit_repository(&state.db)
        .get(management_id)
        .await?
        .ok_or_else(|| {
            ApiError::validation_field("management_id", "not_found", "unknown management unit")
        })?;

    let repo = create_department_repository(&state.db);
    let taken = repo.list_slugs().await?.into_iter().collect();
    let department = Department {
        id: Uuid::new_v4(),
        management_id,
        slug: unique_slug(&slugify(&body.name), &taken),
        name: body.name,
    };

    let created = repo.create(&department).await?;
    record_audit(
        &state,
        Some(staff.id),
        AuditAction::Create,
        "department",
        created.id,
        &created.name,
        None,
    )
    .await;

    Ok((StatusCode::CREATED, Json(created)))
}

async fn delete_department(
    State(state): State<AppState>,
    CurrentStaff(staff): CurrentStaff,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    require_admin_like(&staff)?;

    let repo = create_department_repository(&state.db);
    let existing = repo
        .get(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("department {id} not found")))?;

    repo.delete(id).await?;
    record_audit(
        &state,
        Some(staff.id),
        AuditAction::Delete,
        "department",
        existing.id,
        &existing.name,
        None,
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}

async fn list_profiles(
    State(state): State<AppState>,
    CurrentStaff(staff): CurrentStaff,
    Query(query): Query<ListProfilesQuery>,
) -> Result<Json<Vec<ProfileResponse>>, ApiError> {
    require_admin_like(&staff)?;

    let role = query.role.as_deref().map(parse_role).transpose()?;
    let filter = StaffFilter {
        role,
        management_id: query.management,
        department_id: query.department,
        search: query.search,
    };

    let profiles = create_staff_profile_repository(&state.db)
        .list(&filter)
        .await?;

    let mut responses = Vec::with_capacity(profiles.len());
    for profile in profiles {
        responses.push(profile_response(&state, profile).await?);
    }
    Ok(Json(responses))
}

/// The caller's own profile. Any staff member can read it.
async fn my_profile(
    State(state): State<AppState>,
    CurrentStaff(staff): CurrentStaff,
) -> Result<Json<ProfileResponse>, ApiError> {
    Ok(Json(profile_response(&state, staff).await?))
}

async fn get_profile(
    State(state): State<AppState>,
    CurrentStaff(staff): CurrentStaff,
    Path(id): Path<Uuid>,
) -> Result<Json<ProfileResponse>, ApiError> {
    require_admin_like(&staff)?;

    let profile = create_staff_profile_repository(&state.db)
        .get(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("staff profile {id} not found")))?;
    Ok(Json(profile_response(&state, profile).await?))
}

async fn create_profile(
    State(state): State<AppState>,
    CurrentStaff(staff): CurrentStaff,
    Json(body): Json<CreateProfileRequest>,
) -> Result<(StatusCode, Json<ProfileResponse>), ApiError> {
    body.validate()?;
    require_admin_like(&staff)?;

    let mut profile = StaffProfile::new(body.user_id);
    profile.first_name = body.first_name;
    profile.second_name = body.second_name;
    profile.last_name = body.last_name;
    profile.lotus = body.lotus;
    profile.work_email = body.work_email;
    profile.work_phone = body.work_phone;
    profile.management_id = body.management_id;
    profile.department_id = body.department_id;
    if let Some(position) = body.position.as_deref() {
        profile.position = parse_position(position)?;
    }
    if let Some(role) = body.role.as_deref() {
        profile.role = parse_role(role)?;
    }

    let created = create_staff_profile_repository(&state.db)
        .create(&profile)
        .await?;
    record_audit(
        &state,
        Some(staff.id),
        AuditAction::Create,
        "staff_profile",
        created.id,
        &created.fio(),
        None,
    )
    .await;

    Ok((StatusCode::CREATED, Json(profile_response(&state, created).await?)))
}

async fn update_profile(
    State(state): State<AppState>,
    CurrentStaff(staff): CurrentStaff,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateProfileRequest>,
) -> Result<Json<ProfileResponse>, ApiError> {
    body.validate()?;
    require_admin_like(&staff)?;

    let repo = create_staff_profile_repository(&state.db);
    let existing = repo
        .get(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("staff profile {id} not found")))?;

    let position = body.position.as_deref().map(parse_position).transpose()?;
    let role = body.role.as_deref().map(parse_role).transpose()?;
    let update = StaffProfileUpdate {
        first_name: body.first_name,
        second_name: body.second_name,
        last_name: body.last_name,
        lotus: body.lotus,
        work_email: body.work_email,
        work_phone: body.work_phone,
        position,
        management_id: body.management_id,
        department_id: body.department_id,
        role,
    };
    let updated = repo.update(id, &update).await?;

    let changes = changed_fields(
        &serde_json::to_value(&existing)?,
        &serde_json::to_value(&updated)?,
    );
    record_audit(
        &state,
        Some(staff.id),
        AuditAction::Update,
        "staff_profile",
        updated.id,
        &updated.fio(),
        Some(changes),
    )
    .await;

    Ok(Json(profile_response(&state, updated).await?))
}

async fn delete_profile(
    State(state): State<AppState>,
    CurrentStaff(staff): CurrentStaff,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    require_admin_like(&staff)?;

    if staff.id == id {
        return Err(ApiError::BadRequest(
            "cannot delete your own profile".to_string(),
        ));
    }

    let repo = create_staff_profile_repository(&state.db);
    let existing = repo
        .get(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("staff profile {id} not found")))?;

    repo.delete(id).await?;
    record_audit(
        &state,
        Some(staff.id),
        AuditAction::Delete,
        "staff_profile",
        existing.id,
        &existing.fio(),
        None,
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}
