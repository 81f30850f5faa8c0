//! External letter log endpoints: categories, letters and replies.

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
use od_core::db::{create_external_letter_repository, Pagination};
use od_core::letters::{
    ExternalLetter, ExternalLetterFilter, ExternalLetterReply, ExternalLetterReplyUpdate,
    ExternalLetterUpdate, ExternalLettersCategory,
};
use od_core::slugs::{letter_slug, random_tail, slugify, unique_slug};

/// Creates external letter category routes.
pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_categories).post(create_category))
        .route(
            "/:slug",
            get(get_category)
                .put(update_category)
                .delete(delete_category),
        )
}

/// Creates external letter routes.
pub fn letter_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_letters).post(create_letter))
        .route(
            "/:slug",
            get(get_letter).put(update_letter).delete(delete_letter),
        )
        .route("/:slug/replies", get(list_replies))
}

/// Creates external letter reply routes.
pub fn reply_routes() -> Router<AppState> {
    Router::new().route("/", axum::routing::post(create_reply)).route(
        "/:id",
        get(get_reply).put(update_reply).delete(delete_reply),
    )
}

/// Request body for creating a category.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[serde(default)]
    pub badge: String,
}

/// Request body for updating a category. The slug never changes.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCategoryRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub badge: Option<String>,
}

/// Query parameters for listing external letters.
#[derive(Debug, Deserialize, Validate)]
pub struct ListLettersQuery {
    /// Filter by category slug.
    pub category: Option<String>,
    /// Substring search over title, description and both numbers.
    pub search: Option<String>,
    #[validate(range(min = 1))]
    pub page: Option<u32>,
    #[validate(range(min = 1, max = 200))]
    pub per_page: Option<u32>,
}

/// Request body for creating an external letter.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateLetterRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    /// Category slug.
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub letter_number: String,
    #[serde(default)]
    pub internal_letter_number: String,
    #[serde(default)]
    pub executor: String,
    pub file_name: Option<String>,
}

/// Request body for updating an external letter. The slug never changes,
/// even when the title does.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateLetterRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub letter_number: Option<String>,
    pub internal_letter_number: Option<String>,
    pub executor: Option<String>,
    #[serde(default, deserialize_with = "crate::routes::double_option")]
    pub file_name: Option<Option<String>>,
}

/// Request body for creating an external letter reply.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateReplyRequest {
    pub letter_id: Uuid,
    #[serde(default)]
    pub reply_number: String,
    #[serde(default)]
    pub internal_number: String,
    pub file_name: Option<String>,
    pub sent_date: NaiveDate,
}

/// Request body for updating an external letter reply.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateReplyRequest {
    pub reply_number: Option<String>,
    pub internal_number: Option<String>,
    #[serde(default, deserialize_with = "crate::routes::double_option")]
    pub file_name: Option<Option<String>>,
    pub sent_date: Option<NaiveDate>,
}

/// Paginated external letters response.
#[derive(Debug, Serialize)]
pub struct PaginatedLettersResponse {
    pub data: Vec<ExternalLetter>,
    pub page: u32,
    pub per_page: u32,
    pub total_items: u64,
    pub total_pages: u32,
}

async fn resolve_category(
    state: &AppState,
    slug: &str,
) -> Result<ExternalLettersCategory, ApiError> {
    create_external_letter_repository(&state.db)
        .get_category_by_slug(slug)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("external letter category '{slug}' not found")))
}

async fn resolve_letter(state: &AppState, slug: &str) -> Result<ExternalLetter, ApiError> {
    create_external_letter_repository(&state.db)
        .get_by_slug(slug)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("external letter '{slug}' not found")))
}

async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<ExternalLettersCategory>>, ApiError> {
    let categories = create_external_letter_repository(&state.db)
        .list_categories()
        .await?;
    Ok(Json(categories))
}

async fn get_category(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ExternalLettersCategory>, ApiError> {
    Ok(Json(resolve_category(&state, &slug).await?))
}

async fn create_category(
    State(state): State<AppState>,
    CurrentStaff(staff): CurrentStaff,
    Json(body): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<ExternalLettersCategory>), ApiError> {
    body.validate()?;

    let repo = create_external_letter_repository(&state.db);
    let taken = repo.list_category_slugs().await?.into_iter().collect();
    let slug = unique_slug(&slugify(&body.name), &taken);

    let mut category = ExternalLettersCategory::new(body.name, slug);
    category.badge = body.badge;

    let created = repo.create_category(&category).await?;
    record_audit(
        &state,
        Some(staff.id),
        AuditAction::Create,
        "external_letter_category",
        created.id,
        &created.name,
        None,
    )
    .await;

    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_category(
    State(state): State<AppState>,
    CurrentStaff(staff): CurrentStaff,
    Path(slug): Path<String>,
    Json(body): Json<UpdateCategoryRequest>,
) -> Result<Json<ExternalLettersCategory>, ApiError> {
    body.validate()?;

    let existing = resolve_category(&state, &slug).await?;
    let updated = create_external_letter_repository(&state.db)
        .update_category(existing.id, body.name.as_deref(), body.badge.as_deref())
        .await?;

    record_audit(
        &state,
        Some(staff.id),
        AuditAction::Update,
        "external_letter_category",
        updated.id,
        &updated.name,
        None,
    )
    .await;

    Ok(Json(updated))
}

async fn delete_category(
    State(state): State<AppState>,
    CurrentStaff(staff): CurrentStaff,
    Path(slug): Path<String>,
) -> Result<StatusCode, ApiError> {
    let existing = resolve_category(&state, &slug).await?;

    create_external_letter_repository(&state.db)
        .delete_category(existing.id)
        .await?;
    record_audit(
        &state,
        Some(staff.id),
        AuditAction::Delete,
        "external_letter_category",
        existing.id,
        &existing.name,
        None,
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}

async fn list_letters(
    State(state): State<AppState>,
    Query(query): Query<ListLettersQuery>,
) -> Result<Json<PaginatedLettersResponse>, ApiError> {
    query.validate()?;

    let filter = ExternalLetterFilter {
        category_slug: query.category,
        search: query.search,
    };
    let pagination = Pagination::from_query(query.page, query.per_page);

    let page = create_external_letter_repository(&state.db)
        .list(&filter, &pagination)
        .await?;

    Ok(Json(PaginatedLettersResponse {
        page: page.page,
        per_page: page.per_page,
        total_items: page.total,
        total_pages: page.total_pages,
        data: page.items,
    }))
}

async fn get_letter(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ExternalLetter>, ApiError> {
    Ok(Json(resolve_letter(&state, &slug).await?))
}

async fn create_letter(
    State(state): State<AppState>,
    CurrentStaff(staff): CurrentStaff,
    Json(body): Json<CreateLetterRequest>,
) -> Result<(StatusCode, Json<ExternalLetter>), ApiError> {
    body.validate()?;

    let category = resolve_category(&state, &body.category).await?;
    let slug = letter_slug(&body.title, &random_tail());

    let mut letter = ExternalLetter::new(body.title, slug, category.id);
    letter.description = body.description;
    letter.letter_number = body.letter_number;
    letter.internal_letter_number = body.internal_letter_number;
    letter.executor = body.executor;
    letter.file_name = body.file_name;

    let created = create_external_letter_repository(&state.db)
        .create(&letter)
        .await?;
    record_audit(
        &state,
        Some(staff.id),
        AuditAction::Create,
        "external_letter",
        created.id,
        &created.title,
        None,
    )
    .await;

    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_letter(
    State(state): State<AppState>,
    CurrentStaff(staff): CurrentStaff,
    Path(slug): Path<String>,
    Json(body): Json<UpdateLetterRequest>,
) -> Result<Json<ExternalLetter>, ApiError> {
    body.validate()?;

    let existing = resolve_letter(&state, &slug).await?;
    let category_id = match &body.category {
        Some(category_slug) => Some(resolve_category(&state, category_slug).await?.id),
        None => None,
    };

    let update = ExternalLetterUpdate {
        title: body.title,
        description: body.description,
        letter_number: body.letter_number,
        internal_letter_number: body.internal_letter_number,
        executor: body.executor,
        category_id,
        file_name: body.file_name,
    };
    let updated = create_external_letter_repository(&state.db)
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
        "external_letter",
        updated.id,
        &updated.title,
        Some(changes),
    )
    .await;

    Ok(Json(updated))
}

async fn delete_letter(
    State(state): State<AppState>,
    CurrentStaff(staff): CurrentStaff,
    Path(slug): Path<String>,
) -> Result<StatusCode, ApiError> {
    let existing = resolve_letter(&state, &slug).await?;

    create_external_letter_repository(&state.db)
        .delete(existing.id)
        .await?;
    record_audit(
        &state,
        Some(staff.id),
        AuditAction::Delete,
        "external_letter",
        existing.id,
        &existing.title,
        None,
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}

async fn list_replies(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Vec<ExternalLetterReply>>, ApiError> {
    let letter = resolve_letter(&state, &slug).await?;
    let replies = create_external_letter_repository(&state.db)
        .list_replies(letter.id)
        .await?;
    Ok(Json(replies))
}

async fn get_reply_or_404(state: &AppState, id: Uuid) -> Result<ExternalLetterReply, ApiError> {
    create_external_letter_repository(&state.db)
        .get_reply(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("external letter reply {id} not found")))
}

async fn create_reply(
    State(state): State<AppState>,
    CurrentStaff(staff): CurrentStaff,
    Json(body): Json<CreateReplyRequest>,
) -> Result<(StatusCode, Json<ExternalLetterReply>), ApiError> {
    body.validate()?;

    let repo = create_external_letter_repository(&state.db);
    repo.get(body.letter_id)
        .await?
        .ok_or_else(|| {
            ApiError::validation_field("letter_id", "not_found", "unknown external letter")
        })?;

    let mut reply = ExternalLetterReply::new(body.letter_id, body.sent_date);
    reply.reply_number = body.reply_number;
    reply.internal_number = body.internal_number;
    reply.file_name = body.file_name;
    reply.added_by = Some(staff.id);

    let created = repo.add_reply(&reply).await?;
    record_audit(
        &state,
        Some(staff.id),
        AuditAction::Create,
        "external_letter_reply",
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
) -> Result<Json<ExternalLetterReply>, ApiError> {
    Ok(Json(get_reply_or_404(&state, id).await?))
}

async fn update_reply(
    State(state): State<AppState>,
    CurrentStaff(staff): CurrentStaff,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateReplyRequest>,
) -> Result<Json<ExternalLetterReply>, ApiError> {
    body.validate()?;
    get_reply_or_404(&state, id).await?;

    let update = ExternalLetterReplyUpdate {
        reply_number: body.reply_number,
        internal_number: body.internal_number,
        file_name: body.file_name,
        sent_date: body.sent_date,
    };
    let updated = create_external_letter_repository(&state.db)
        .update_reply(id, &update)
        .await?;

    record_audit(
        &state,
        Some(staff.id),
        AuditAction::Update,
        "external_letter_reply",
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

    create_external_letter_repository(&state.db)
        .delete_reply(id)
        .await?;
    record_audit(
        &state,
        Some(staff.id),
        AuditAction::Delete,
        "external_letter_reply",
        existing.id,
        &existing.reply_number,
        None,
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}
