//! Org-unit tree and organization employee endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use crate::auth::{staff_view, CurrentStaff};
use crate::error::ApiError;
use crate::routes::record_audit;
use crate::state::AppState;
use od_core::audit::AuditAction;
use od_core::db::{
    create_org_employee_repository, create_org_unit_repository, create_organization_repository,
};
use od_core::org_structure::{
    build_unit_tree, OrgEmployee, OrgEmployeeUpdate, OrgUnit, OrgUnitUpdate, UnitTreeNode,
    UnitType,
};
use od_core::permissions::{can_edit, WriteTarget};

/// Creates org-unit routes.
pub fn unit_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_units).post(create_unit))
        .route("/tree", get(unit_tree))
        .route("/:id", get(get_unit).put(update_unit).delete(delete_unit))
}

/// Creates org-employee routes.
pub fn employee_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_employees).post(create_employee))
        .route(
            "/:id",
            get(get_employee)
                .put(update_employee)
                .delete(delete_employee),
        )
}

/// Query parameters scoping units to one organization (by slug).
#[derive(Debug, Deserialize)]
pub struct OrganizationScopeQuery {
    pub organization: String,
}

/// Query parameters for listing employees.
#[derive(Debug, Deserialize)]
pub struct ListEmployeesQuery {
    /// Organization slug; lists all of its employees, placed in a unit or not.
    pub organization: Option<String>,
    /// A single unit id.
    pub unit: Option<Uuid>,
}

/// Request body for creating an org unit.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUnitRequest {
    /// Organization slug the unit belongs to.
    pub organization: String,
    pub parent_id: Option<Uuid>,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub unit_type: String,
    #[serde(default)]
    pub sort_order: i32,
}

/// Request body for updating an org unit.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUnitRequest {
    /// An explicit `null` detaches the unit to the root level.
    #[serde(default, deserialize_with = "crate::routes::double_option")]
    pub parent_id: Option<Option<Uuid>>,
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub unit_type: Option<String>,
    pub sort_order: Option<i32>,
}

/// Request body for creating an org employee.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateEmployeeRequest {
    /// Organization slug the employee belongs to.
    pub organization: String,
    /// Optional placement into one of the organization's units.
    pub unit_id: Option<Uuid>,
    #[validate(length(min = 1, max = 255))]
    pub full_name: String,
    #[serde(default)]
    pub position_title: String,
    #[serde(default)]
    pub work_phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub lotus: String,
    #[serde(default)]
    pub is_head: bool,
    #[serde(default)]
    pub sort_order: i32,
}

/// Request body for updating an org employee.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateEmployeeRequest {
    /// An explicit `null` removes the employee from their unit.
    #[serde(default, deserialize_with = "crate::routes::double_option")]
    pub unit_id: Option<Option<Uuid>>,
    #[validate(length(min = 1, max = 255))]
    pub full_name: Option<String>,
    pub position_title: Option<String>,
    pub work_phone: Option<String>,
    pub email: Option<String>,
    pub lotus: Option<String>,
    pub is_head: Option<bool>,
    pub sort_order: Option<i32>,
}

fn parse_unit_type(raw: &str) -> Result<UnitType, ApiError> {
    UnitType::from_str(raw).map_err(|message| {
        ApiError::validation_field("unit_type", "invalid", &message)
    })
}

async fn resolve_organization(
    state: &AppState,
    slug: &str,
) -> Result<od_core::org::Organization, ApiError> {
    create_organization_repository(&state.db)
        .get_by_slug(slug)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("organization '{slug}' not found")))
}

/// Structure writes follow the owning organization's edit rights.
async fn check_structure_write(
    state: &AppState,
    staff: &od_core::staff::StaffProfile,
    org_id: Uuid,
) -> Result<(), ApiError> {
    let org = create_organization_repository(&state.db)
        .get(org_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("organization {org_id} not found")))?;
    let view = staff_view(state, staff).await?;
    if can_edit(Some(&view), &WriteTarget::organization(&org)) {
        Ok(())
    } else {
        Err(ApiError::Forbidden(format!(
            "no curatorship over organization '{}'",
            org.slug
        )))
    }
}

async fn get_unit_or_404(state: &AppState, id: Uuid) -> Result<OrgUnit, ApiError> {
    create_org_unit_repository(&state.db)
        .get(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("org unit {id} not found")))
}

/// Flat unit listing for one organization.
async fn list_units(
    State(state): State<AppState>,
    Query(query): Query<OrganizationScopeQuery>,
) -> Result<Json<Vec<OrgUnit>>, ApiError> {
    let org = resolve_organization(&state, &query.organization).await?;
    let units = create_org_unit_repository(&state.db)
        .list_for_organization(org.id)
        .await?;
    Ok(Json(units))
}

/// Nested unit tree for one organization, employees attached.
async fn unit_tree(
    State(state): State<AppState>,
    Query(query): Query<OrganizationScopeQuery>,
) -> Result<Json<Vec<UnitTreeNode>>, ApiError> {
    let org = resolve_organization(&state, &query.organization).await?;
    let units = create_org_unit_repository(&state.db)
        .list_for_organization(org.id)
        .await?;
    let employees = create_org_employee_repository(&state.db)
        .list_for_organization(org.id)
        .await?;
    Ok(Json(build_unit_tree(&units, &employees)))
}

async fn get_unit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<OrgUnit>, ApiError> {
    Ok(Json(get_unit_or_404(&state, id).await?))
}

async fn create_unit(
    State(state): State<AppState>,
    CurrentStaff(staff): CurrentStaff,
    Json(body): Json<CreateUnitRequest>,
) -> Result<(StatusCode, Json<OrgUnit>), ApiError> {
    body.validate()?;

    let org = resolve_organization(&state, &body.organization).await?;
    check_structure_write(&state, &staff, org.id).await?;

    let unit_type = parse_unit_type(&body.unit_type)?;
    if let Some(parent_id) = body.parent_id {
        let parent = get_unit_or_404(&state, parent_id).await?;
        if parent.organization_id != org.id {
            return Err(ApiError::validation_field(
                "parent_id",
                "invalid",
                "parent unit belongs to another organization",
            ));
        }
    }

    let mut unit = OrgUnit::new(org.id, body.name, unit_type);
    unit.parent_id = body.parent_id;
    unit.sort_order = body.sort_order;

    let created = create_org_unit_repository(&state.db).create(&unit).await?;
    record_audit(
        &state,
        Some(staff.id),
        AuditAction::Create,
        "org_unit",
        created.id,
        &created.name,
        None,
    )
    .await;

    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_unit(
    State(state): State<AppState>,
    CurrentStaff(staff): CurrentStaff,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateUnitRequest>,
) -> Result<Json<OrgUnit>, ApiError> {
    body.validate()?;

    let existing = get_unit_or_404(&state, id).await?;
    check_structure_write(&state, &staff, existing.organization_id).await?;

    if let Some(Some(parent_id)) = body.parent_id {
        if parent_id == id {
            return Err(ApiError::validation_field(
                "parent_id",
                "invalid",
                "a unit cannot be its own parent",
            ));
        }
        let parent = get_unit_or_404(&state, parent_id).await?;
        if parent.organization_id != existing.organization_id {
            return Err(ApiError::validation_field(
                "parent_id",
                "invalid",
                "parent unit belongs to another organization",
            ));
        }
    }

    let unit_type = body.unit_type.as_deref().map(parse_unit_type).transpose()?;
    let update = OrgUnitUpdate {
        parent_id: body.parent_id,
        name: body.name,
        unit_type,
        sort_order: body.sort_order,
    };
    let updated = create_org_unit_repository(&state.db)
        .update(id, &update)
        .await?;

    record_audit(
        &state,
        Some(staff.id),
        AuditAction::Update,
        "org_unit",
        updated.id,
        &updated.name,
        None,
    )
    .await;

    Ok(Json(updated))
}

async fn delete_unit(
    State(state): State<AppState>,
    CurrentStaff(staff): CurrentStaff,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let existing = get_unit_or_404(&state, id).await?;
    check_structure_write(&state, &staff, existing.organization_id).await?;

    create_org_unit_repository(&state.db).delete(id).await?;
    record_audit(
        &state,
        Some(staff.id),
        AuditAction::Delete,
        "org_unit",
        existing.id,
        &existing.name,
        None,
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}

async fn get_employee_or_404(state: &AppState, id: Uuid) -> Result<OrgEmployee, ApiError> {
    create_org_employee_repository(&state.db)
        .get(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("org employee {id} not found")))
}

async fn list_employees(
    State(state): State<AppState>,
    Query(query): Query<ListEmployeesQuery>,
) -> Result<Json<Vec<OrgEmployee>>, ApiError> {
    let repo = create_org_employee_repository(&state.db);

    let employees = if let Some(unit_id) = query.unit {
        repo.list_for_unit(unit_id).await?
    } else if let Some(org_slug) = &query.organization {
        let org = resolve_organization(&state, org_slug).await?;
        repo.list_for_organization(org.id).await?
    } else {
        return Err(ApiError::BadRequest(
            "either 'organization' or 'unit' query parameter is required".to_string(),
        ));
    };

    Ok(Json(employees))
}

async fn get_employee(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<OrgEmployee>, ApiError> {
    Ok(Json(get_employee_or_404(&state, id).await?))
}

async fn create_employee(
    State(state): State<AppState>,
    CurrentStaff(staff): CurrentStaff,
    Json(body): Json<CreateEmployeeRequest>,
) -> Result<(StatusCode, Json<OrgEmployee>), ApiError> {
    body.validate()?;

    let org = resolve_organization(&state, &body.organization).await?;
    check_structure_write(&state, &staff, org.id).await?;

    if let Some(unit_id) = body.unit_id {
        let unit = get_unit_or_404(&state, unit_id).await?;
        if unit.organization_id != org.id {
            return Err(ApiError::validation_field(
                "unit_id",
                "invalid",
                "unit belongs to another organization",
            ));
        }
    }

    let mut employee = OrgEmployee::new(org.id, body.full_name);
    employee.unit_id = body.unit_id;
    employee.position_title = body.position_title;
    employee.work_phone = body.work_phone;
    employee.email = body.email;
    employee.lotus = body.lotus;
    employee.is_head = body.is_head;
    employee.sort_order = body.sort_order;

    let created = create_org_employee_repository(&state.db)
        .create(&employee)
        .await?;
    record_audit(
        &state,
        Some(staff.id),
        AuditAction::Create,
        "org_employee",
        created.id,
        &created.full_name,
        None,
    )
    .await;

    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_employee(
    State(state): State<AppState>,
    CurrentStaff(staff): CurrentStaff,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateEmployeeRequest>,
) -> Result<Json<OrgEmployee>, ApiError> {
    body.validate()?;

    let existing = get_employee_or_404(&state, id).await?;
    check_structure_write(&state, &staff, existing.organization_id).await?;

    if let Some(Some(unit_id)) = body.unit_id {
        let target_unit = get_unit_or_404(&state, unit_id).await?;
        if target_unit.organization_id != existing.organization_id {
            return Err(ApiError::validation_field(
                "unit_id",
                "invalid",
                "target unit belongs to another organization",
            ));
        }
    }

    let update = OrgEmployeeUpdate {
        unit_id: body.unit_id,
        full_name: body.full_name,
        position_title: body.position_title,
        work_phone: body.work_phone,
        email: body.email,
        lotus: body.lotus,
        is_head: body.is_head,
        sort_order: body.sort_order,
    };
    let updated = create_org_employee_repository(&state.db)
        .update(id, &update)
        .await?;

    record_audit(
        &state,
        Some(staff.id),
        AuditAction::Update,
        "org_employee",
        updated.id,
        &updated.full_name,
        None,
    )
    .await;

    Ok(Json(updated))
}

async fn delete_employee(
    State(state): State<AppState>,
    CurrentStaff(staff): CurrentStaff,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let existing = get_employee_or_404(&state, id).await?;
    check_structure_write(&state, &staff, existing.organization_id).await?;

    create_org_employee_repository(&state.db).delete(id).await?;
    record_audit(
        &state,
        Some(staff.id),
        AuditAction::Delete,
        "org_employee",
        existing.id,
        &existing.full_name,
        None,
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}
