//! Database seeding utilities.
//!
//! Creates the initial administrator profile on first run so a fresh
//! deployment has someone able to manage the directory.

use super::{create_staff_profile_repository, DbError, DbPool};
use crate::staff::{Role, StaffProfile};
use tracing::{info, warn};
use uuid::Uuid;

/// Ensures an administrator staff profile exists.
///
/// If no profiles exist, creates one with role Admin. The fronting account
/// id is taken from the `OD_ADMIN_USER_ID` env var when set, otherwise a
/// fresh id is generated and logged.
///
/// Returns `Ok(Some(profile))` if a new admin was created, `Ok(None)` if
/// profiles already exist.
pub async fn ensure_admin_staff(pool: &DbPool) -> Result<Option<StaffProfile>, DbError> {
    let profiles = create_staff_profile_repository(pool);

    if profiles.any_exist().await? {
        info!("Staff profiles already exist, skipping admin seed");
        return Ok(None);
    }

    let user_id = match std::env::var("OD_ADMIN_USER_ID") {
        Ok(raw) => Uuid::parse_str(raw.trim()).map_err(|e| {
            DbError::validation("OD_ADMIN_USER_ID", format!("not a valid uuid: {e}"))
        })?,
        Err(_) => {
            let generated = Uuid::new_v4();
            warn!(user_id = %generated, "No OD_ADMIN_USER_ID set, generated one");
            generated
        }
    };

    let mut admin = StaffProfile::new(user_id);
    admin.last_name = "Administrator".to_string();
    admin.role = Role::Admin;

    let created = profiles.create(&admin).await?;
    info!(profile_id = %created.id, user_id = %created.user_id, "Created admin staff profile");

    Ok(Some(created))
}
