//! Org-unit and org-employee repositories.

use super::convert::{parse_opt_uuid, parse_ts, parse_uuid};
use super::{DbError, DbPool};
use crate::org_structure::{OrgEmployee, OrgEmployeeUpdate, OrgUnit, OrgUnitUpdate, UnitType};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

const UNIT_COLUMNS: &str = "id, organization_id, parent_id, name, unit_type, sort_order, created_at";
const EMP_COLUMNS: &str = "id, organization_id, unit_id, full_name, position_title, work_phone, email, lotus, is_head, sort_order, created_at";

/// Repository trait for org-unit persistence.
#[async_trait]
pub trait OrgUnitRepository: Send + Sync {
    async fn create(&self, unit: &OrgUnit) -> Result<OrgUnit, DbError>;

    async fn get(&self, id: Uuid) -> Result<Option<OrgUnit>, DbError>;

    /// All units of one organization, in sibling order.
    async fn list_for_organization(&self, organization_id: Uuid) -> Result<Vec<OrgUnit>, DbError>;

    async fn update(&self, id: Uuid, update: &OrgUnitUpdate) -> Result<OrgUnit, DbError>;

    async fn delete(&self, id: Uuid) -> Result<bool, DbError>;
}

/// Repository trait for org-employee persistence.
#[async_trait]
pub trait OrgEmployeeRepository: Send + Sync {
    async fn create(&self, employee: &OrgEmployee) -> Result<OrgEmployee, DbError>;

    async fn get(&self, id: Uuid) -> Result<Option<OrgEmployee>, DbError>;

    async fn list_for_unit(&self, unit_id: Uuid) -> Result<Vec<OrgEmployee>, DbError>;

    /// All employees of one organization, placed in a unit or not.
    async fn list_for_organization(
        &self,
        organization_id: Uuid,
    ) -> Result<Vec<OrgEmployee>, DbError>;

    async fn update(&self, id: Uuid, update: &OrgEmployeeUpdate) -> Result<OrgEmployee, DbError>;

    async fn delete(&self, id: Uuid) -> Result<bool, DbError>;

    /// Total employee count across all tracked organizations.
    async fn count_all(&self) -> Result<u64, DbError>;
}

/// SQLite implementation of OrgUnitRepository.
pub struct SqliteOrgUnitRepository {
    pool: sqlx::SqlitePool,
}

impl SqliteOrgUnitRepository {
    pub fn new(pool: sqlx::SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrgUnitRepository for SqliteOrgUnitRepository {
    async fn create(&self, unit: &OrgUnit) -> Result<OrgUnit, DbError> {
        sqlx::query(
            "INSERT INTO org_units (id, organization_id, parent_id, name, unit_type, sort_order, created_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(unit.id.to_string())
        .bind(unit.organization_id.to_string())
        .bind(unit.parent_id.map(|p| p.to_string()))
        .bind(&unit.name)
        .bind(unit.unit_type.as_str())
        .bind(unit.sort_order)
        .bind(unit.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(unit.clone())
    }

    async fn get(&self, id: Uuid) -> Result<Option<OrgUnit>, DbError> {
        let row: Option<SqliteUnitRow> = sqlx::query_as(&format!(
            "SELECT {UNIT_COLUMNS} FROM org_units WHERE id = ?"
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn list_for_organization(&self, organization_id: Uuid) -> Result<Vec<OrgUnit>, DbError> {
        let rows: Vec<SqliteUnitRow> = sqlx::query_as(&format!(
            "SELECT {UNIT_COLUMNS} FROM org_units WHERE organization_id = ? ORDER BY sort_order ASC, name ASC"
        ))
        .bind(organization_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn update(&self, id: Uuid, update: &OrgUnitUpdate) -> Result<OrgUnit, DbError> {
        let existing = self
            .get(id)
            .await?
            .ok_or_else(|| DbError::not_found("OrgUnit", id))?;

        let parent_id = match update.parent_id {
            Some(v) => v,
            None => existing.parent_id,
        };
        let name = update.name.as_ref().unwrap_or(&existing.name);
        let unit_type = update.unit_type.unwrap_or(existing.unit_type);
        let sort_order = update.sort_order.unwrap_or(existing.sort_order);

        sqlx::query(
            "UPDATE org_units SET parent_id = ?, name = ?, unit_type = ?, sort_order = ? WHERE id = ?",
        )
        .bind(parent_id.map(|p| p.to_string()))
        .bind(name)
        .bind(unit_type.as_str())
        .bind(sort_order)
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        self.get(id)
            .await?
            .ok_or_else(|| DbError::not_found("OrgUnit", id))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM org_units WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// PostgreSQL implementation of OrgUnitRepository.
pub struct PgOrgUnitRepository {
    pool: sqlx::PgPool,
}

impl PgOrgUnitRepository {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrgUnitRepository for PgOrgUnitRepository {
    async fn create(&self, unit: &OrgUnit) -> Result<OrgUnit, DbError> {
        sqlx::query(
            "INSERT INTO org_units (id, organization_id, parent_id, name, unit_type, sort_order, created_at) VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(unit.id)
        .bind(unit.organization_id)
        .bind(unit.parent_id)
        .bind(&unit.name)
        .bind(unit.unit_type.as_str())
        .bind(unit.sort_order)
        .bind(unit.created_at)
        .execute(&self.pool)
        .await?;

        Ok(unit.clone())
    }

    async fn get(&self, id: Uuid) -> Result<Option<OrgUnit>, DbError> {
        let row: Option<PgUnitRow> = sqlx::query_as(&format!(
            "SELECT {UNIT_COLUMNS} FROM org_units WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn list_for_organization(&self, organization_id: Uuid) -> Result<Vec<OrgUnit>, DbError> {
        let rows: Vec<PgUnitRow> = sqlx::query_as(&format!(
            "SELECT {UNIT_COLUMNS} FROM org_units WHERE organization_id = $1 ORDER BY sort_order ASC, name ASC"
        ))
        .bind(organization_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn update(&self, id: Uuid, update: &OrgUnitUpdate) -> Result<OrgUnit, DbError> {
        let existing = self
            .get(id)
            .await?
            .ok_or_else(|| DbError::not_found("OrgUnit", id))?;

        let parent_id = match update.parent_id {
            Some(v) => v,
            None => existing.parent_id,
        };
        let name = update.name.as_ref().unwrap_or(&existing.name);
        let unit_type = update.unit_type.unwrap_or(existing.unit_type);
        let sort_order = update.sort_order.unwrap_or(existing.sort_order);

        sqlx::query(
            "UPDATE org_units SET parent_id = $1, name = $2, unit_type = $3, sort_order = $4 WHERE id = $5",
        )
        .bind(parent_id)
        .bind(name)
        .bind(unit_type.as_str())
        .bind(sort_order)
        .bind(id)
        .execute(&self.pool)
        .await?;

        self.get(id)
            .await?
            .ok_or_else(|| DbError::not_found("OrgUnit", id))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM org_units WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// SQLite implementation of OrgEmployeeRepository.
pub struct SqliteOrgEmployeeRepository {
    pool: sqlx::SqlitePool,
}

impl SqliteOrgEmployeeRepository {
    pub fn new(pool: sqlx::SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrgEmployeeRepository for SqliteOrgEmployeeRepository {
    async fn create(&self, employee: &OrgEmployee) -> Result<OrgEmployee, DbError> {
        sqlx::query(
            "INSERT INTO org_employees (id, organization_id, unit_id, full_name, position_title, work_phone, email, lotus, is_head, sort_order, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(employee.id.to_string())
        .bind(employee.organization_id.to_string())
        .bind(employee.unit_id.map(|u| u.to_string()))
        .bind(&employee.full_name)
        .bind(&employee.position_title)
        .bind(&employee.work_phone)
        .bind(&employee.email)
        .bind(&employee.lotus)
        .bind(employee.is_head)
        .bind(employee.sort_order)
        .bind(employee.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(employee.clone())
    }

    async fn get(&self, id: Uuid) -> Result<Option<OrgEmployee>, DbError> {
        let row: Option<SqliteEmployeeRow> = sqlx::query_as(&format!(
            "SELECT {EMP_COLUMNS} FROM org_employees WHERE id = ?"
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn list_for_unit(&self, unit_id: Uuid) -> Result<Vec<OrgEmployee>, DbError> {
        let rows: Vec<SqliteEmployeeRow> = sqlx::query_as(&format!(
            "SELECT {EMP_COLUMNS} FROM org_employees WHERE unit_id = ? ORDER BY is_head DESC, sort_order ASC, full_name ASC"
        ))
        .bind(unit_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn list_for_organization(
        &self,
        organization_id: Uuid,
    ) -> Result<Vec<OrgEmployee>, DbError> {
        let rows: Vec<SqliteEmployeeRow> = sqlx::query_as(&format!(
            "SELECT {EMP_COLUMNS} FROM org_employees WHERE organization_id = ? ORDER BY is_head DESC, sort_order ASC, full_name ASC"
        ))
        .bind(organization_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn update(&self, id: Uuid, update: &OrgEmployeeUpdate) -> Result<OrgEmployee, DbError> {
        let existing = self
            .get(id)
            .await?
            .ok_or_else(|| DbError::not_found("OrgEmployee", id))?;

        let unit_id = match update.unit_id {
            Some(v) => v,
            None => existing.unit_id,
        };
        let full_name = update.full_name.as_ref().unwrap_or(&existing.full_name);
        let position_title = update
            .position_title
            .as_ref()
            .unwrap_or(&existing.position_title);
        let work_phone = update.work_phone.as_ref().unwrap_or(&existing.work_phone);
        let email = update.email.as_ref().unwrap_or(&existing.email);
        let lotus = update.lotus.as_ref().unwrap_or(&existing.lotus);
        let is_head = update.is_head.unwrap_or(existing.is_head);
        let sort_order = update.sort_order.unwrap_or(existing.sort_order);

        sqlx::query(
            "UPDATE org_employees SET unit_id = ?, full_name = ?, position_title = ?, work_phone = ?, email = ?, lotus = ?, is_head = ?, sort_order = ? WHERE id = ?",
        )
        .bind(unit_id.map(|u| u.to_string()))
        .bind(full_name)
        .bind(position_title)
        .bind(work_phone)
        .bind(email)
        .bind(lotus)
        .bind(is_head)
        .bind(sort_order)
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        self.get(id)
            .await?
            .ok_or_else(|| DbError::not_found("OrgEmployee", id))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM org_employees WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count_all(&self) -> Result<u64, DbError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM org_employees")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }
}

/// PostgreSQL implementation of OrgEmployeeRepository.
pub struct PgOrgEmployeeRepository {
    pool: sqlx::PgPool,
}

impl PgOrgEmployeeRepository {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrgEmployeeRepository for PgOrgEmployeeRepository {
    async fn create(&self, employee: &OrgEmployee) -> Result<OrgEmployee, DbError> {
        sqlx::query(
            "INSERT INTO org_employees (id, organization_id, unit_id, full_name, position_title, work_phone, email, lotus, is_head, sort_order, created_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(employee.id)
        .bind(employee.organization_id)
        .bind(employee.unit_id)
        .bind(&employee.full_name)
        .bind(&employee.position_title)
        .bind(&employee.work_phone)
        .bind(&employee.email)
        .bind(&employee.lotus)
        .bind(employee.is_head)
        .bind(employee.sort_order)
        .bind(employee.created_at)
        .execute(&self.pool)
        .await?;

        Ok(employee.clone())
    }

    async fn get(&self, id: Uuid) -> Result<Option<OrgEmployee>, DbError> {
        let row: Option<PgEmployeeRow> = sqlx::query_as(&format!(
            "SELECT {EMP_COLUMNS} FROM org_employees WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn list_for_unit(&self, unit_id: Uuid) -> Result<Vec<OrgEmployee>, DbError> {
        let rows: Vec<PgEmployeeRow> = sqlx::query_as(&format!(
            "SELECT {EMP_COLUMNS} FROM org_employees WHERE unit_id = $1 ORDER BY is_head DESC, sort_order ASC, full_name ASC"
        ))
        .bind(unit_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn list_for_organization(
        &self,
        organization_id: Uuid,
    ) -> Result<Vec<OrgEmployee>, DbError> {
        let rows: Vec<PgEmployeeRow> = sqlx::query_as(&format!(
            "SELECT {EMP_COLUMNS} FROM org_employees WHERE organization_id = $1 ORDER BY is_head DESC, sort_order ASC, full_name ASC"
        ))
        .bind(organization_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn update(&self, id: Uuid, update: &OrgEmployeeUpdate) -> Result<OrgEmployee, DbError> {
        let existing = self
            .get(id)
            .await?
            .ok_or_else(|| DbError::not_found("OrgEmployee", id))?;

        let unit_id = match update.unit_id {
            Some(v) => v,
            None => existing.unit_id,
        };
        let full_name = update.full_name.as_ref().unwrap_or(&existing.full_name);
        let position_title = update
            .position_title
            .as_ref()
            .unwrap_or(&existing.position_title);
        let work_phone = update.work_phone.as_ref().unwrap_or(&existing.work_phone);
        let email = update.email.as_ref().unwrap_or(&existing.email);
        let lotus = update.lotus.as_ref().unwrap_or(&existing.lotus);
        let is_head = update.is_head.unwrap_or(existing.is_head);
        let sort_order = update.sort_order.unwrap_or(existing.sort_order);

        sqlx::query(
            "UPDATE org_employees SET unit_id = $1, full_name = $2, position_title = $3, work_phone = $4, email = $5, lotus = $6, is_head = $7, sort_order = $8 WHERE id = $9",
        )
        .bind(unit_id)
        .bind(full_name)
        .bind(position_title)
        .bind(work_phone)
        .bind(email)
        .bind(lotus)
        .bind(is_head)
        .bind(sort_order)
        .bind(id)
        .execute(&self.pool)
        .await?;

        self.get(id)
            .await?
            .ok_or_else(|| DbError::not_found("OrgEmployee", id))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM org_employees WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count_all(&self) -> Result<u64, DbError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM org_employees")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }
}

/// Factory function to create the appropriate org-unit repository.
pub fn create_org_unit_repository(pool: &DbPool) -> Box<dyn OrgUnitRepository> {
    match pool {
        DbPool::Sqlite(pool) => Box::new(SqliteOrgUnitRepository::new(pool.clone())),
        DbPool::Postgres(pool) => Box::new(PgOrgUnitRepository::new(pool.clone())),
    }
}

/// Factory function to create the appropriate org-employee repository.
pub fn create_org_employee_repository(pool: &DbPool) -> Box<dyn OrgEmployeeRepository> {
    match pool {
        DbPool::Sqlite(pool) => Box::new(SqliteOrgEmployeeRepository::new(pool.clone())),
        DbPool::Postgres(pool) => Box::new(PgOrgEmployeeRepository::new(pool.clone())),
    }
}

// Helper structs for SQLx row mapping

#[derive(sqlx::FromRow)]
struct SqliteUnitRow {
    id: String,
    organization_id: String,
    parent_id: Option<String>,
    name: String,
    unit_type: String,
    sort_order: i32,
    created_at: String,
}

impl TryFrom<SqliteUnitRow> for OrgUnit {
    type Error = DbError;

    fn try_from(row: SqliteUnitRow) -> Result<Self, Self::Error> {
        Ok(OrgUnit {
            id: parse_uuid(&row.id)?,
            organization_id: parse_uuid(&row.organization_id)?,
            parent_id: parse_opt_uuid(row.parent_id.as_deref())?,
            name: row.name,
            unit_type: parse_unit_type(&row.unit_type)?,
            sort_order: row.sort_order,
            created_at: parse_ts(&row.created_at)?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct PgUnitRow {
    id: Uuid,
    organization_id: Uuid,
    parent_id: Option<Uuid>,
    name: String,
    unit_type: String,
    sort_order: i32,
    created_at: DateTime<Utc>,
}

impl TryFrom<PgUnitRow> for OrgUnit {
    type Error = DbError;

    fn try_from(row: PgUnitRow) -> Result<Self, Self::Error> {
        Ok(OrgUnit {
            id: row.id,
            organization_id: row.organization_id,
            parent_id: row.parent_id,
            name: row.name,
            unit_type: parse_unit_type(&row.unit_type)?,
            sort_order: row.sort_order,
            created_at: row.created_at,
        })
    }
}

fn parse_unit_type(s: &str) -> Result<UnitType, DbError> {
    s.parse::<UnitType>()
        .map_err(|_| DbError::Serialization(format!("Invalid unit type: {}", s)))
}

#[derive(sqlx::FromRow)]
struct SqliteEmployeeRow {
    id: String,
    organization_id: String,
    unit_id: Option<String>,
    full_name: String,
    position_title: String,
    work_phone: String,
    email: String,
    lotus: String,
    is_head: bool,
    sort_order: i32,
    created_at: String,
}

impl TryFrom<SqliteEmployeeRow> for OrgEmployee {
    type Error = DbError;

    fn try_from(row: SqliteEmployeeRow) -> Result<Self, Self::Error> {
        Ok(OrgEmployee {
            id: parse_uuid(&row.id)?,
            organization_id: parse_uuid(&row.organization_id)?,
            unit_id: parse_opt_uuid(row.unit_id.as_deref())?,
            full_name: row.full_name,
            position_title: row.position_title,
            work_phone: row.work_phone,
            email: row.email,
            lotus: row.lotus,
            is_head: row.is_head,
            sort_order: row.sort_order,
            created_at: parse_ts(&row.created_at)?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct PgEmployeeRow {
    id: Uuid,
    organization_id: Uuid,
    unit_id: Option<Uuid>,
    full_name: String,
    position_title: String,
    work_phone: String,
    email: String,
    lotus: String,
    is_head: bool,
    sort_order: i32,
    created_at: DateTime<Utc>,
}

impl From<PgEmployeeRow> for OrgEmployee {
    fn from(row: PgEmployeeRow) -> Self {
        OrgEmployee {
            id: row.id,
            organization_id: row.organization_id,
            unit_id: row.unit_id,
            full_name: row.full_name,
            position_title: row.position_title,
            work_phone: row.work_phone,
            email: row.email,
            lotus: row.lotus,
            is_head: row.is_head,
            sort_order: row.sort_order,
            created_at: row.created_at,
        }
    }
}
