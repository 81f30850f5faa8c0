//! Staff directory: access roles, positions, placement hierarchy and profiles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Access role of a staff member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Manager,
    Curator,
    Viewer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Curator => "curator",
            Role::Viewer => "viewer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "manager" => Ok(Role::Manager),
            "curator" => Ok(Role::Curator),
            "viewer" => Ok(Role::Viewer),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// Job position, ordered roughly top-down in the office hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Position {
    Director,
    DeputyDirector,
    HeadOfDepartment,
    ChiefExpert,
    LeadExpert,
    ExpertL1,
    Employee,
    RecordsClerk,
}

impl Position {
    pub fn as_str(&self) -> &'static str {
        match self {
            Position::Director => "director",
            Position::DeputyDirector => "deputy_director",
            Position::HeadOfDepartment => "head_of_department",
            Position::ChiefExpert => "chief_expert",
            Position::LeadExpert => "lead_expert",
            Position::ExpertL1 => "expert_l1",
            Position::Employee => "employee",
            Position::RecordsClerk => "records_clerk",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Position {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "director" => Ok(Position::Director),
            "deputy_director" => Ok(Position::DeputyDirector),
            "head_of_department" => Ok(Position::HeadOfDepartment),
            "chief_expert" => Ok(Position::ChiefExpert),
            "lead_expert" => Ok(Position::LeadExpert),
            "expert_l1" => Ok(Position::ExpertL1),
            "employee" => Ok(Position::Employee),
            "records_clerk" => Ok(Position::RecordsClerk),
            other => Err(format!("unknown position: {other}")),
        }
    }
}

/// Top-level placement unit of the office itself (e.g. "Retail Banking
/// Supervision"). Not to be confused with [`crate::OrgUnit`], which models
/// the structure of tracked organizations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManagementUnit {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

/// A department inside one management unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Department {
    pub id: Uuid,
    pub management_id: Uuid,
    pub name: String,
    pub slug: String,
}

/// A staff member's profile, linked one-to-one to an external user account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffProfile {
    pub id: Uuid,
    /// Account id from the fronting auth system.
    pub user_id: Uuid,
    pub first_name: String,
    pub second_name: String,
    pub last_name: String,
    pub lotus: String,
    pub work_email: String,
    pub work_phone: String,
    pub position: Position,
    pub management_id: Option<Uuid>,
    pub department_id: Option<Uuid>,
    pub role: Role,
    /// Cached count of organization curatorships; kept consistent with the
    /// link table by the curatorship repository.
    pub curated_orgs_count: i64,
    /// Cached count of category curatorships.
    pub curated_cats_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StaffProfile {
    pub fn new(user_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            first_name: String::new(),
            second_name: String::new(),
            last_name: String::new(),
            lotus: String::new(),
            work_email: String::new(),
            work_phone: String::new(),
            position: Position::Employee,
            management_id: None,
            department_id: None,
            role: Role::Curator,
            curated_orgs_count: 0,
            curated_cats_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Full name in "last first second" order; empty parts are skipped.
    pub fn fio(&self) -> String {
        [&self.last_name, &self.first_name, &self.second_name]
            .iter()
            .filter(|p| !p.is_empty())
            .map(|p| p.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Partial update for a staff profile.
#[derive(Debug, Clone, Default)]
pub struct StaffProfileUpdate {
    pub first_name: Option<String>,
    pub second_name: Option<String>,
    pub last_name: Option<String>,
    pub lotus: Option<String>,
    pub work_email: Option<String>,
    pub work_phone: Option<String>,
    pub position: Option<Position>,
    pub management_id: Option<Option<Uuid>>,
    pub department_id: Option<Option<Uuid>>,
    pub role: Option<Role>,
}

/// A violation of the position/placement rules, attributed to one field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct PlacementError {
    pub field: &'static str,
    pub message: &'static str,
}

impl PlacementError {
    fn new(field: &'static str, message: &'static str) -> Self {
        Self { field, message }
    }
}

/// Checks that a position is compatible with its management/department
/// placement.
///
/// - Director and records clerk sit outside the hierarchy entirely.
/// - A deputy director is attached to a management unit but not a department.
/// - A head of department and all expert/employee positions are attached to
///   both, and the department must belong to the chosen management unit.
pub fn validate_placement(
    position: Position,
    management_id: Option<Uuid>,
    department: Option<&Department>,
) -> Result<(), PlacementError> {
    match position {
        Position::Director | Position::RecordsClerk => {
            if management_id.is_some() || department.is_some() {
                return Err(PlacementError::new(
                    "management_id",
                    "director and records clerk must not be placed in a management or department",
                ));
            }
        }
        Position::DeputyDirector => {
            if management_id.is_none() {
                return Err(PlacementError::new(
                    "management_id",
                    "deputy director must be attached to a management unit",
                ));
            }
            if department.is_some() {
                return Err(PlacementError::new(
                    "department_id",
                    "deputy director must not be attached to a department",
                ));
            }
        }
        Position::HeadOfDepartment
        | Position::ChiefExpert
        | Position::LeadExpert
        | Position::ExpertL1
        | Position::Employee => {
            let (Some(management_id), Some(department)) = (management_id, department) else {
                return Err(PlacementError::new(
                    "department_id",
                    "this position requires both a management unit and a department",
                ));
            };
            if department.management_id != management_id {
                return Err(PlacementError::new(
                    "department_id",
                    "department must belong to the chosen management unit",
                ));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dept(management_id: Uuid) -> Department {
        Department {
            id: Uuid::new_v4(),
            management_id,
            name: "Licensing".to_string(),
            slug: "licensing".to_string(),
        }
    }

    #[test]
    fn role_round_trip() {
        for role in [Role::Admin, Role::Manager, Role::Curator, Role::Viewer] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn position_round_trip() {
        for pos in [
            Position::Director,
            Position::DeputyDirector,
            Position::HeadOfDepartment,
            Position::ChiefExpert,
            Position::LeadExpert,
            Position::ExpertL1,
            Position::Employee,
            Position::RecordsClerk,
        ] {
            assert_eq!(pos.as_str().parse::<Position>().unwrap(), pos);
        }
    }

    #[test]
    fn director_is_unplaced() {
        assert!(validate_placement(Position::Director, None, None).is_ok());
        let m = Uuid::new_v4();
        assert!(validate_placement(Position::Director, Some(m), None).is_err());
        assert!(validate_placement(Position::RecordsClerk, None, Some(&dept(m))).is_err());
    }

    #[test]
    fn deputy_has_management_only() {
        let m = Uuid::new_v4();
        assert!(validate_placement(Position::DeputyDirector, Some(m), None).is_ok());
        assert!(validate_placement(Position::DeputyDirector, None, None).is_err());
        assert!(validate_placement(Position::DeputyDirector, Some(m), Some(&dept(m))).is_err());
    }

    #[test]
    fn expert_requires_matching_pair() {
        let m = Uuid::new_v4();
        let d = dept(m);
        assert!(validate_placement(Position::ChiefExpert, Some(m), Some(&d)).is_ok());
        assert!(validate_placement(Position::Employee, Some(m), None).is_err());
        assert!(validate_placement(Position::ExpertL1, None, Some(&d)).is_err());

        // Department from another management unit is rejected.
        let other = Uuid::new_v4();
        let err = validate_placement(Position::HeadOfDepartment, Some(other), Some(&d))
            .expect_err("mismatched department must be rejected");
        assert_eq!(err.field, "department_id");
    }

    #[test]
    fn fio_skips_blank_parts() {
        let mut profile = StaffProfile::new(Uuid::new_v4());
        profile.last_name = "Ivanov".to_string();
        profile.first_name = "Petr".to_string();
        assert_eq!(profile.fio(), "Ivanov Petr");
        assert_eq!(StaffProfile::new(Uuid::new_v4()).fio(), "");
    }
}
