//! Aggregate statistics endpoints.
//!
//! The heavy lifting lives in `od_core::stats`; these handlers only load the
//! flattened data and serialize the aggregation results.

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;
use od_core::db::{create_cert_letter_repository, create_org_employee_repository};
use od_core::stats::{aggregate_reply_stats, count_letters_by_month, MonthBucket, OrgReplyStats};

/// Creates statistics routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/letters-by-month", get(letters_by_month))
        .route("/employees-count", get(employees_count))
        .route("/org-replies", get(org_replies))
}

/// Query parameters for the monthly letter counts.
#[derive(Debug, Deserialize)]
pub struct LettersByMonthQuery {
    pub year: Option<i32>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

/// Query parameters for the reply timeliness report.
#[derive(Debug, Deserialize)]
pub struct OrgRepliesQuery {
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct EmployeesCountResponse {
    pub total: u64,
}

fn check_date_range(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Result<(), ApiError> {
    if let (Some(from), Some(to)) = (from, to) {
        if from > to {
            return Err(ApiError::validation_field(
                "date_from",
                "invalid",
                "date_from must not be after date_to",
            ));
        }
    }
    Ok(())
}

async fn letters_by_month(
    State(state): State<AppState>,
    Query(query): Query<LettersByMonthQuery>,
) -> Result<Json<Vec<MonthBucket>>, ApiError> {
    check_date_range(query.date_from, query.date_to)?;

    let dates = create_cert_letter_repository(&state.db)
        .list_dates(query.year)
        .await?;
    let dates: Vec<NaiveDate> = dates
        .into_iter()
        .filter(|d| query.date_from.map_or(true, |from| *d >= from))
        .filter(|d| query.date_to.map_or(true, |to| *d <= to))
        .collect();
    Ok(Json(count_letters_by_month(&dates)))
}

async fn employees_count(
    State(state): State<AppState>,
) -> Result<Json<EmployeesCountResponse>, ApiError> {
    let total = create_org_employee_repository(&state.db)
        .count_all()
        .await?;
    Ok(Json(EmployeesCountResponse { total }))
}

async fn org_replies(
    State(state): State<AppState>,
    Query(query): Query<OrgRepliesQuery>,
) -> Result<Json<Vec<OrgReplyStats>>, ApiError> {
    check_date_range(query.date_from, query.date_to)?;

    let letters = create_cert_letter_repository(&state.db)
        .list_for_stats(query.date_from, query.date_to)
        .await?;
    Ok(Json(aggregate_reply_stats(&letters)))
}
