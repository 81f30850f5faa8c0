//! Caller identity extractors.
//!
//! Authentication happens in a fronting proxy; it forwards the account id of
//! the caller in the `X-User-Id` header. The extractors here resolve that id
//! to a staff profile. Reads work without one; writes require one.

use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use od_core::db::create_curatorship_repository;
use od_core::permissions::StaffView;
use od_core::staff::{Role, StaffProfile};
use uuid::Uuid;

/// Header carrying the authenticated account id.
pub const USER_ID_HEADER: &str = "X-User-Id";

/// Extractor for the caller's staff profile. Rejects with 401 when the
/// header is missing or no profile matches.
pub struct CurrentStaff(pub StaffProfile);

/// Extractor for an optional caller profile. Yields `None` for anonymous
/// requests instead of rejecting.
pub struct MaybeStaff(pub Option<StaffProfile>);

fn header_user_id(parts: &Parts) -> Result<Option<Uuid>, ApiError> {
    let Some(raw) = parts.headers.get(USER_ID_HEADER) else {
        return Ok(None);
    };
    let raw = raw
        .to_str()
        .map_err(|_| ApiError::Unauthorized(format!("invalid {USER_ID_HEADER} header")))?;
    let user_id = Uuid::parse_str(raw.trim())
        .map_err(|_| ApiError::Unauthorized(format!("invalid {USER_ID_HEADER} header")))?;
    Ok(Some(user_id))
}

async fn lookup_profile(
    state: &AppState,
    user_id: Uuid,
) -> Result<Option<StaffProfile>, ApiError> {
    let repo = od_core::db::create_staff_profile_repository(&state.db);
    Ok(repo.get_by_user(user_id).await?)
}

#[axum::async_trait]
impl FromRequestParts<AppState> for CurrentStaff {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user_id = header_user_id(parts)?
            .ok_or_else(|| ApiError::Unauthorized(format!("missing {USER_ID_HEADER} header")))?;
        let profile = lookup_profile(state, user_id).await?.ok_or_else(|| {
            ApiError::Unauthorized(format!("no staff profile for account {user_id}"))
        })?;
        Ok(CurrentStaff(profile))
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for MaybeStaff {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match header_user_id(parts)? {
            Some(user_id) => Ok(MaybeStaff(lookup_profile(state, user_id).await?)),
            None => Ok(MaybeStaff(None)),
        }
    }
}

/// Builds the caller's permission view, curatorship links included.
pub async fn staff_view(state: &AppState, profile: &StaffProfile) -> Result<StaffView, ApiError> {
    let links = create_curatorship_repository(&state.db)
        .links_for_staff(profile.id)
        .await?;
    Ok(StaffView::new(profile.role, profile.position).with_links(links))
}

/// Gate for the admin-only surfaces (staff directory, curatorships, audit).
pub fn require_admin_like(profile: &StaffProfile) -> Result<(), ApiError> {
    if matches!(profile.role, Role::Admin | Role::Manager) {
        Ok(())
    } else {
        Err(ApiError::Forbidden(
            "requires admin or manager role".to_string(),
        ))
    }
}
