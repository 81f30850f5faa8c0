//! Curatorship links between staff and organizations or categories.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// An authorization link granting a staff member edit rights over exactly one
/// organization or exactly one category, never both.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffCuratorship {
    pub id: Uuid,
    pub staff_id: Uuid,
    pub organization_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub can_edit: bool,
    pub created_at: DateTime<Utc>,
}

impl StaffCuratorship {
    /// Builds a new link after checking the organization-XOR-category rule.
    pub fn new(
        staff_id: Uuid,
        organization_id: Option<Uuid>,
        category_id: Option<Uuid>,
        can_edit: bool,
    ) -> Result<Self, CuratorshipError> {
        validate_curatorship_target(organization_id, category_id)?;
        Ok(Self {
            id: Uuid::new_v4(),
            staff_id,
            organization_id,
            category_id,
            can_edit,
            created_at: Utc::now(),
        })
    }
}

/// Validation failures for curatorship writes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CuratorshipError {
    #[error("exactly one of organization or category must be set")]
    AmbiguousTarget,
}

/// Enforces the XOR invariant: a link targets an organization or a category,
/// never both and never neither.
pub fn validate_curatorship_target(
    organization_id: Option<Uuid>,
    category_id: Option<Uuid>,
) -> Result<(), CuratorshipError> {
    if organization_id.is_some() == category_id.is_some() {
        return Err(CuratorshipError::AmbiguousTarget);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_must_be_exclusive() {
        let org = Some(Uuid::new_v4());
        let cat = Some(Uuid::new_v4());
        assert!(validate_curatorship_target(org, None).is_ok());
        assert!(validate_curatorship_target(None, cat).is_ok());
        assert_eq!(
            validate_curatorship_target(org, cat),
            Err(CuratorshipError::AmbiguousTarget)
        );
        assert_eq!(
            validate_curatorship_target(None, None),
            Err(CuratorshipError::AmbiguousTarget)
        );
    }

    #[test]
    fn new_rejects_double_target() {
        let staff = Uuid::new_v4();
        assert!(StaffCuratorship::new(staff, Some(Uuid::new_v4()), Some(Uuid::new_v4()), true)
            .is_err());
        let link = StaffCuratorship::new(staff, Some(Uuid::new_v4()), None, true).unwrap();
        assert!(link.can_edit);
        assert_eq!(link.staff_id, staff);
    }
}
