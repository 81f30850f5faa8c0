//! Cert letter endpoints: letters, destinations, attachments and replies.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::auth::CurrentStaff;
use crate::error::ApiError;
use crate::routes::record_audit;
use crate::state::AppState;
use od_core::audit::{changed_fields, AuditAction};
use od_core::db::{
    create_cert_letter_repository, create_organization_repository, Pagination,
};
use od_core::letters::{
    CertLetter, CertLetterFile, CertLetterFilter, CertLetterReply, CertLetterReplyUpdate,
    CertLetterUpdate,
};
use od_core::stats::OrgRef;

/// Creates cert letter routes.
pub fn letter_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_letters).post(create_letter))
        .route(
            "/:id",
            get(get_letter).put(update_letter).delete(delete_letter),
        )
        .route("/:id/files", get(list_files).post(add_file))
        .route("/:id/files/:file_id", axum::routing::delete(delete_file))
        .route("/:id/replies", get(list_replies))
}

/// Creates cert letter reply routes.
pub fn reply_routes() -> Router<AppState> {
    Router::new().route("/", axum::routing::post(create_reply)).route(
        "/:id",
        get(get_reply).put(update_reply).delete(delete_reply),
    )
}

/// Query parameters for listing cert letters.
#[derive(Debug, Deserialize, Validate)]
pub struct ListLettersQuery {
    /// Substring search over number, subject, description.
    pub search: Option<String>,
    pub has_deadline: Option<bool>,
    pub need_replies: Option<bool>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    /// Restrict to letters addressed to this organization.
    pub organization: Option<Uuid>,
    #[validate(range(min = 1))]
    pub page: Option<u32>,
    #[validate(range(min = 1, max = 200))]
    pub per_page: Option<u32>,
}

/// Request body for creating a cert letter.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateLetterRequest {
    #[validate(length(min = 1, max = 64))]
    pub number: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub description: String,
    /// Free-form name of whoever follows the letter up.
    #[serde(default)]
    pub performer: String,
    #[serde(default)]
    pub has_deadline: bool,
    pub deadline: Option<NaiveDate>,
    /// Defaults to true: replies are tracked unless opted out.
    pub need_replies: Option<bool>,
    /// Destination organization ids.
    #[serde(default)]
    pub dest_organizations: Vec<Uuid>,
}

/// Request body for updating a cert letter.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateLetterRequest {
    #[validate(length(min = 1, max = 64))]
    pub number: Option<String>,
    pub date: Option<NaiveDate>,
    pub subject: Option<String>,
    pub description: Option<String>,
    pub performer: Option<String>,
    pub has_deadline: Option<bool>,
    #[serde(default, deserialize_with = "crate::routes::double_option")]
    pub deadline: Option<Option<NaiveDate>>,
    pub need_replies: Option<bool>,
    /// Full replacement of the destination set when present.
    pub dest_organizations: Option<Vec<Uuid>>,
}

/// Request body for registering an attachment. Byte storage is external;
/// only the original name travels here.
#[derive(Debug, Deserialize, Validate)]
pub struct AddFileRequest {
    #[validate(length(min = 1, max = 255))]
    pub original_name: String,
}

/// Request body for creating a cert letter reply.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateReplyRequest {
    pub letter_id: Uuid,
    /// `None` marks a reply from outside the destination list.
    pub organization_id: Option<Uuid>,
    #[serde(default)]
    pub reply_number: String,
    #[serde(default)]
    pub internal_number: String,
    pub file_name: Option<String>,
    pub received_date: NaiveDate,
}

/// Request body for updating a cert letter reply.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateReplyRequest {
    #[serde(default, deserialize_with = "crate::routes::double_option")]
    pub organization_id: Option<Option<Uuid>>,
    pub reply_number: Option<String>,
    pub internal_number: Option<String>,
    #[serde(default, deserialize_with = "crate::routes::double_option")]
    pub file_name: Option<Option<String>>,
    pub received_date: Option<NaiveDate>,
}

/// Cert letter response: the letter with destinations, files and replies.
#[derive(Debug, Serialize)]
pub struct LetterResponse {
    #[serde(flatten)]
    pub letter: CertLetter,
    pub destinations: Vec<OrgRef>,
    pub files: Vec<CertLetterFile>,
    pub replies: Vec<CertLetterReply>,
}

/// Paginated cert letters response.
#[derive(Debug, Serialize)]
pub struct PaginatedLettersResponse {
    pub data: Vec<LetterResponse>,
    pub page: u32,
    pub per_page: u32,
    pub total_items: u64,
    pub total_pages: u32,
}

async fn letter_response(state: &AppState, letter: CertLetter) -> Result<LetterResponse, ApiError> {
    let repo = create_cert_letter_repository(&state.db);
    let destinations = repo.destinations(letter.id).await?;
    let files = repo.list_files(letter.id).await?;
    let replies = repo.list_replies(letter.id).await?;
    Ok(LetterResponse {
        letter,
        destinations,
        files,
        replies,
    })
}

async fn get_letter_or_404(state: &AppState, id: Uuid) -> Result<CertLetter, ApiError> {
    create_cert_letter_repository(&state.db)
        .get(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("cert letter {id} not found")))
}

async fn check_destinations(state: &AppState, dest_ids: &[Uuid]) -> Result<(), ApiError> {
    let org_repo = create_organization_repository(&state.db);
    for org_id in dest_ids {
        if org_repo.get(*org_id).await?.is_none() {
            return Err(ApiError::validation_field(
                "dest_organizations",
                "not_found",
                &format!("unknown organization {org_id}"),
            ));
        }
    }
    Ok(())
}

fn check_deadline(has_deadline: bool, deadline: Option<NaiveDate>) -> Result<(), ApiError> {
    if has_deadline && deadline.is_none() {
        return Err(ApiError::validation_field(
            "deadline",
            "required",
            "a letter with a deadline needs a deadline date",
        ));
    }
    Ok(())
}

async fn list_letters(
    State(state): State<AppState>,
    Query(query): Query<ListLettersQuery>,
) -> Result<Json<PaginatedLettersResponse>, ApiError> {
    query.validate()?;

    let filter = CertLetterFilter {
        search: query.search,
        has_deadline: query.has_deadline,
        need_replies: query.need_replies,
        date_from: query.date_from,
        date_to: query.date_to,
        organization_id: query.organization,
    };
    let pagination = Pagination::from_query(query.page, query.per_page);

    let page = create_cert_letter_repository(&state.db)
        .list(&filter, &pagination)
        .await?;

    let mut data = Vec::with_capacity(page.items.len());
    for letter in page.items {
        data.push(letter_response(&state, letter).await?);
    }

    Ok(Json(PaginatedLettersResponse {
        data,
        page: page.page,
        per_page: page.per_page,
        total_items: page.total,
        total_pages: page.total_pages,
    }))
}

async fn get_letter(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<LetterResponse>, ApiError> {
    let letter = get_letter_or_404(&state, id).await?;
    Ok(Json(letter_response(&state, letter).await?))
}

async fn create_letter(
    State(state): State<AppState>,
    CurrentStaff(staff): CurrentStaff,
    Json(body): Json<CreateLetterRequest>,
) -> Result<(StatusCode, Json<LetterResponse>), ApiError> {
    body.validate()?;
    check_deadline(body.has_deadline, body.deadline)?;
    check_destinations(&state, &body.dest_organizations).await?;

    let mut letter = CertLetter::new(body.number, body.date);
    letter.subject = body.subject;
    letter.description = body.description;
    letter.performer = body.performer;
    letter.has_deadline = body.has_deadline;
    letter.deadline = body.deadline;
    if let Some(need_replies) = body.need_replies {
        letter.need_replies = need_replies;
    }
    letter.created_by = Some(staff.id);
    letter.updated_by = Some(staff.id);

    let created = create_cert_letter_repository(&state.db)
        .create(&letter, &body.dest_organizations)
        .await?;
    record_audit(
        &state,
        Some(staff.id),
        AuditAction::Create,
        "cert_letter",
        created.id,
        &created.number,
        None,
    )
    .await;

    Ok((StatusCode::CREATED, Json(letter_response(&state, created).await?)))
}

async fn update_letter(
    State(state): State<AppState>,
    CurrentStaff(staff): CurrentStaff,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateLetterRequest>,
) -> Result<Json<LetterResponse>, ApiError> {
    body.validate()?;

    let existing = get_letter_or_404(&state, id).await?;

    let has_deadline = body.has_deadline.unwrap_or(existing.has_deadline);
    let deadline = match body.deadline {
        Some(v) => v,
        None => existing.deadline,
    };
    check_deadline(has_deadline, deadline)?;

    if let Some(dest_ids) = &body.dest_organizations {
        check_destinations(&state, dest_ids).await?;
    }

    let update = CertLetterUpdate {
        number: body.number,
        date: body.date,
        subject: body.subject,
        description: body.description,
        performer: body.performer,
        has_deadline: body.has_deadline,
        deadline: body.deadline,
        need_replies: body.need_replies,
        dest_organization_ids: body.dest_organizations,
    };
    let updated = create_cert_letter_repository(&state.db)
        .update(id, &update)
        .await?;

    let changes = changed_fields(
        &serde_json::to_value(&existing)?,
        &serde_json::to_value(&updated)?,
    );
    record_audit(
        &state,
        Some(staff.id),
        AuditAction::Update,
        "cert_letter",
        updated.id,
        &updated.number,
        Some(changes),
    )
    .await;

    Ok(Json(letter_response(&state, updated).await?))
}

async fn delete_letter(
    State(state): State<AppState>,
    CurrentStaff(staff): CurrentStaff,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let existing = get_letter_or_404(&state, id).await?;

    create_cert_letter_repository(&state.db).delete(id).await?;
    record_audit(
        &state,
        Some(staff.id),
        AuditAction::Delete,
        "cert_letter",
        existing.id,
        &existing.number,
        None,
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}

async fn list_files(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<CertLetterFile>>, ApiError> {
    get_letter_or_404(&state, id).await?;
    let files = create_cert_letter_repository(&state.db)
        .list_files(id)
        .await?;
    Ok(Json(files))
}

async fn add_file(
    State(state): State<AppState>,
    CurrentStaff(staff): CurrentStaff,
    Path(id): Path<Uuid>,
    Json(body): Json<AddFileRequest>,
) -> Result<(StatusCode, Json<CertLetterFile>), ApiError> {
    body.validate()?;
    get_letter_or_404(&state, id).await?;

    let file = CertLetterFile {
        id: Uuid::new_v4(),
        letter_id: id,
        file_name: format!("cert/{id}/{}-{}", Uuid::new_v4().simple(), body.original_name),
        original_name: body.original_name,
        uploaded_at: chrono::Utc::now(),
    };

    let created = create_cert_letter_repository(&state.db)
        .add_file(&file)
        .await?;
    record_audit(
        &state,
        Some(staff.id),
        AuditAction::Create,
        "cert_letter_file",
        created.id,
        &created.original_name,
        None,
    )
    .await;

    Ok((StatusCode::CREATED, Json(created)))
}

async fn delete_file(
    State(state): State<AppState>,
    CurrentStaff(staff): CurrentStaff,
    Path((id, file_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    get_letter_or_404(&state, id).await?;

    let deleted = create_cert_letter_repository(&state.db)
        .delete_file(file_id)
        .await?;
    if !deleted {
        return Err(ApiError::NotFound(format!("file {file_id} not found")));
    }
    record_audit(
        &state,
        Some(staff.id),
        AuditAction::Delete,
        "cert_letter_file",
        file_id,
        "attachment",
        None,
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}

async fn list_replies(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<CertLetterReply>>, ApiError> {
    get_letter_or_404(&state, id).await?;
    let replies = create_cert_letter_repository(&state.db)
        .list_replies(id)
        .await?;
    Ok(Json(replies))
}

async fn get_reply_or_404(state: &AppState, id: Uuid) -> Result<CertLetterReply, ApiError> {
    create_cert_letter_repository(&state.db)
        .get_reply(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("cert letter reply {id} not found")))
}

async fn create_reply(
    State(state): State<AppState>,
    CurrentStaff(staff): CurrentStaff,
    Json(body): Json<CreateReplyRequest>,
) -> Result<(StatusCode, Json<CertLetterReply>), ApiError> {
    body.validate()?;

    let letter = get_letter_or_404(&state, body.letter_id).await?;
    if !letter.need_replies {
        return Err(ApiError::validation_field(
            "letter_id",
            "invalid",
            "this letter does not track replies",
        ));
    }
    if let Some(org_id) = body.organization_id {
        if create_organization_repository(&state.db)
            .get(org_id)
            .await?
            .is_none()
        {
            return Err(ApiError::validation_field(
                "organization_id",
                "not_found",
                "unknown organization",
            ));
        }
    }

    let mut reply = CertLetterReply::new(letter.id, body.organization_id, body.received_date);
    reply.reply_number = body.reply_number;
    reply.internal_number = body.internal_number;
    reply.file_name = body.file_name;
    reply.added_by = Some(staff.id);

    let created = create_cert_letter_repository(&state.db)
        .add_reply(&reply)
        .await?;
    record_audit(
        &state,
        Some(staff.id),
        AuditAction::Create,
        "cert_letter_reply",
        created.id,
        &created.reply_number,
        None,
    )
    .await;

    Ok((StatusCode::CREATED, Json(created)))
}

async fn get_reply(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CertLetterReply>, ApiError> {
    Ok(Json(get_reply_or_404(&state, id).await?))
}

async fn update_reply(
    State(state): State<AppState>,
    CurrentStaff(staff): CurrentStaff,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateReplyRequest>,
) -> Result<Json<CertLetterReply>, ApiError> {
    body.validate()?;
    get_reply_or_404(&state, id).await?;

    let update = CertLetterReplyUpdate {
        organization_id: body.organization_id,
        reply_number: body.reply_number,
        internal_number: body.internal_number,
        file_name: body.file_name,
        received_date: body.received_date,
    };
    let updated = create_cert_letter_repository(&state.db)
        .update_reply(id, &update)
        .await?;

    record_audit(
        &state,
        Some(staff.id),
        AuditAction::Update,
        "cert_letter_reply",
        updated.id,
        &updated.reply_number,
        None,
    )
    .await;

    Ok(Json(updated))
}

async fn delete_reply(
    State(state): State<AppState>,
    CurrentStaff(staff): CurrentStaff,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let existing = get_reply_or_404(&state, id).await?;

    create_cert_letter_repository(&state.db)
        .delete_reply(id)
        .await?;
    record_audit(
        &state,
        Some(staff.id),
        AuditAction::Delete,
        "cert_letter_reply",
        existing.id,
        &existing.reply_number,
        None,
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}
