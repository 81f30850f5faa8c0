//! Staff directory repositories: management units, departments and profiles.

use super::convert::{parse_opt_uuid, parse_ts, parse_uuid};
use super::{make_like_pattern, DbError, DbPool};
use crate::staff::{
    validate_placement, Department, ManagementUnit, Position, Role, StaffProfile,
    StaffProfileUpdate,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

const PROFILE_COLUMNS: &str = "id, user_id, first_name, second_name, last_name, lotus, work_email, work_phone, position, management_id, department_id, role, curated_orgs_count, curated_cats_count, created_at, updated_at";

/// Filter for staff profile listings.
#[derive(Debug, Clone, Default)]
pub struct StaffFilter {
    pub role: Option<Role>,
    pub management_id: Option<Uuid>,
    pub department_id: Option<Uuid>,
    /// Substring search over name parts, lotus and work email.
    pub search: Option<String>,
}

/// Repository trait for management unit persistence.
#[async_trait]
pub trait ManagementUnitRepository: Send + Sync {
    async fn create(&self, unit: &ManagementUnit) -> Result<ManagementUnit, DbError>;

    async fn get(&self, id: Uuid) -> Result<Option<ManagementUnit>, DbError>;

    async fn list(&self) -> Result<Vec<ManagementUnit>, DbError>;

    async fn delete(&self, id: Uuid) -> Result<bool, DbError>;

    async fn list_slugs(&self) -> Result<Vec<String>, DbError>;
}

/// Repository trait for department persistence.
#[async_trait]
pub trait DepartmentRepository: Send + Sync {
    async fn create(&self, department: &Department) -> Result<Department, DbError>;

    async fn get(&self, id: Uuid) -> Result<Option<Department>, DbError>;

    async fn list(&self, management_id: Option<Uuid>) -> Result<Vec<Department>, DbError>;

    async fn delete(&self, id: Uuid) -> Result<bool, DbError>;

    async fn list_slugs(&self) -> Result<Vec<String>, DbError>;
}

/// Repository trait for staff profile persistence.
///
/// `create` and `update` enforce the position/placement rules; a violation
/// surfaces as [`DbError::Validation`].
#[async_trait]
pub trait StaffProfileRepository: Send + Sync {
    async fn create(&self, profile: &StaffProfile) -> Result<StaffProfile, DbError>;

    async fn get(&self, id: Uuid) -> Result<Option<StaffProfile>, DbError>;

    /// Looks a profile up by the fronting auth system's account id.
    async fn get_by_user(&self, user_id: Uuid) -> Result<Option<StaffProfile>, DbError>;

    async fn list(&self, filter: &StaffFilter) -> Result<Vec<StaffProfile>, DbError>;

    async fn update(&self, id: Uuid, update: &StaffProfileUpdate) -> Result<StaffProfile, DbError>;

    async fn delete(&self, id: Uuid) -> Result<bool, DbError>;

    async fn any_exist(&self) -> Result<bool, DbError>;
}

/// SQLite implementation of ManagementUnitRepository.
pub struct SqliteManagementUnitRepository {
    pool: sqlx::SqlitePool,
}

impl SqliteManagementUnitRepository {
    pub fn new(pool: sqlx::SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ManagementUnitRepository for SqliteManagementUnitRepository {
    async fn create(&self, unit: &ManagementUnit) -> Result<ManagementUnit, DbError> {
        sqlx::query("INSERT INTO management_units (id, name, slug) VALUES (?, ?, ?)")
            .bind(unit.id.to_string())
            .bind(&unit.name)
            .bind(&unit.slug)
            .execute(&self.pool)
            .await?;

        Ok(unit.clone())
    }

    async fn get(&self, id: Uuid) -> Result<Option<ManagementUnit>, DbError> {
        let row: Option<SqliteManagementRow> =
            sqlx::query_as("SELECT id, name, slug FROM management_units WHERE id = ?")
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn list(&self) -> Result<Vec<ManagementUnit>, DbError> {
        let rows: Vec<SqliteManagementRow> =
            sqlx::query_as("SELECT id, name, slug FROM management_units ORDER BY name ASC")
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM management_units WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_slugs(&self) -> Result<Vec<String>, DbError> {
        let slugs: Vec<String> = sqlx::query_scalar("SELECT slug FROM management_units")
            .fetch_all(&self.pool)
            .await?;
        Ok(slugs)
    }
}

/// PostgreSQL implementation of ManagementUnitRepository.
pub struct PgManagementUnitRepository {
    pool: sqlx::PgPool,
}

impl PgManagementUnitRepository {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ManagementUnitRepository for PgManagementUnitRepository {
    async fn create(&self, unit: &ManagementUnit) -> Result<ManagementUnit, DbError> {
        sqlx::query("INSERT INTO management_units (id, name, slug) VALUES ($1, $2, $3)")
            .bind(unit.id)
            .bind(&unit.name)
            .bind(&unit.slug)
            .execute(&self.pool)
            .await?;

        Ok(unit.clone())
    }

    async fn get(&self, id: Uuid) -> Result<Option<ManagementUnit>, DbError> {
        let row: Option<PgManagementRow> =
            sqlx::query_as("SELECT id, name, slug FROM management_units WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(Into::into))
    }

    async fn list(&self) -> Result<Vec<ManagementUnit>, DbError> {
        let rows: Vec<PgManagementRow> =
            sqlx::query_as("SELECT id, name, slug FROM management_units ORDER BY name ASC")
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM management_units WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_slugs(&self) -> Result<Vec<String>, DbError> {
        let slugs: Vec<String> = sqlx::query_scalar("SELECT slug FROM management_units")
            .fetch_all(&self.pool)
            .await?;
        Ok(slugs)
    }
}

/// SQLite implementation of DepartmentRepository.
pub struct SqliteDepartmentRepository {
    pool: sqlx::SqlitePool,
}

impl SqliteDepartmentRepository {
    pub fn new(pool: sqlx::SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DepartmentRepository for SqliteDepartmentRepository {
    async fn create(&self, department: &Department) -> Result<Department, DbError> {
        sqlx::query("INSERT INTO departments (id, management_id, name, slug) VALUES (?, ?, ?, ?)")
            .bind(department.id.to_string())
            .bind(department.management_id.to_string())
            .bind(&department.name)
            .bind(&department.slug)
            .execute(&self.pool)
            .await?;

        Ok(department.clone())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Department>, DbError> {
        let row: Option<SqliteDepartmentRow> =
            sqlx::query_as("SELECT id, management_id, name, slug FROM departments WHERE id = ?")
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn list(&self, management_id: Option<Uuid>) -> Result<Vec<Department>, DbError> {
        let rows: Vec<SqliteDepartmentRow> = match management_id {
            Some(mid) => {
                sqlx::query_as(
                    "SELECT id, management_id, name, slug FROM departments WHERE management_id = ? ORDER BY name ASC",
                )
                .bind(mid.to_string())
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as(
                    "SELECT id, management_id, name, slug FROM departments ORDER BY name ASC",
                )
                .fetch_all(&self.pool)
                .await?
            }
        };

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM departments WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_slugs(&self) -> Result<Vec<String>, DbError> {
        let slugs: Vec<String> = sqlx::query_scalar("SELECT slug FROM departments")
            .fetch_all(&self.pool)
            .await?;
        Ok(slugs)
    }
}

/// PostgreSQL implementation of DepartmentRepository.
pub struct PgDepartmentRepository {
    pool: sqlx::PgPool,
}

impl PgDepartmentRepository {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DepartmentRepository for PgDepartmentRepository {
    async fn create(&self, department: &Department) -> Result<Department, DbError> {
        sqlx::query(
            "INSERT INTO departments (id, management_id, name, slug) VALUES ($1, $2, $3, $4)",
        )
        .bind(department.id)
        .bind(department.management_id)
        .bind(&department.name)
        .bind(&department.slug)
        .execute(&self.pool)
        .await?;

        Ok(department.clone())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Department>, DbError> {
        let row: Option<PgDepartmentRow> =
            sqlx::query_as("SELECT id, management_id, name, slug FROM departments WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(Into::into))
    }

    async fn list(&self, management_id: Option<Uuid>) -> Result<Vec<Department>, DbError> {
        let rows: Vec<PgDepartmentRow> = match management_id {
            Some(mid) => {
                sqlx::query_as(
                    "SELECT id, management_id, name, slug FROM departments WHERE management_id = $1 ORDER BY name ASC",
                )
                .bind(mid)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as(
                    "SELECT id, management_id, name, slug FROM departments ORDER BY name ASC",
                )
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM departments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_slugs(&self) -> Result<Vec<String>, DbError> {
        let slugs: Vec<String> = sqlx::query_scalar("SELECT slug FROM departments")
            .fetch_all(&self.pool)
            .await?;
        Ok(slugs)
    }
}

/// SQLite implementation of StaffProfileRepository.
pub struct SqliteStaffProfileRepository {
    pool: sqlx::SqlitePool,
}

impl SqliteStaffProfileRepository {
    pub fn new(pool: sqlx::SqlitePool) -> Self {
        Self { pool }
    }

    async fn check_placement(
        &self,
        position: Position,
        management_id: Option<Uuid>,
        department_id: Option<Uuid>,
    ) -> Result<(), DbError> {
        let department = match department_id {
            Some(id) => Some(
                SqliteDepartmentRepository::new(self.pool.clone())
                    .get(id)
                    .await?
                    .ok_or_else(|| DbError::not_found("Department", id))?,
            ),
            None => None,
        };
        validate_placement(position, management_id, department.as_ref())?;
        Ok(())
    }
}

#[async_trait]
impl StaffProfileRepository for SqliteStaffProfileRepository {
    async fn create(&self, profile: &StaffProfile) -> Result<StaffProfile, DbError> {
        self.check_placement(profile.position, profile.management_id, profile.department_id)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO staff_profiles (id, user_id, first_name, second_name, last_name, lotus, work_email, work_phone, position, management_id, department_id, role, curated_orgs_count, curated_cats_count, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(profile.id.to_string())
        .bind(profile.user_id.to_string())
        .bind(&profile.first_name)
        .bind(&profile.second_name)
        .bind(&profile.last_name)
        .bind(&profile.lotus)
        .bind(&profile.work_email)
        .bind(&profile.work_phone)
        .bind(profile.position.as_str())
        .bind(profile.management_id.map(|v| v.to_string()))
        .bind(profile.department_id.map(|v| v.to_string()))
        .bind(profile.role.as_str())
        .bind(profile.curated_orgs_count)
        .bind(profile.curated_cats_count)
        .bind(profile.created_at.to_rfc3339())
        .bind(profile.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(profile.clone())
    }

    async fn get(&self, id: Uuid) -> Result<Option<StaffProfile>, DbError> {
        let row: Option<SqliteProfileRow> = sqlx::query_as(&format!(
            "SELECT {PROFILE_COLUMNS} FROM staff_profiles WHERE id = ?"
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn get_by_user(&self, user_id: Uuid) -> Result<Option<StaffProfile>, DbError> {
        let row: Option<SqliteProfileRow> = sqlx::query_as(&format!(
            "SELECT {PROFILE_COLUMNS} FROM staff_profiles WHERE user_id = ?"
        ))
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn list(&self, filter: &StaffFilter) -> Result<Vec<StaffProfile>, DbError> {
        let mut query = format!("SELECT {PROFILE_COLUMNS} FROM staff_profiles WHERE 1=1");
        let mut params: Vec<String> = Vec::new();

        if let Some(role) = filter.role {
            query.push_str(" AND role = ?");
            params.push(role.as_str().to_string());
        }
        if let Some(mid) = filter.management_id {
            query.push_str(" AND management_id = ?");
            params.push(mid.to_string());
        }
        if let Some(did) = filter.department_id {
            query.push_str(" AND department_id = ?");
            params.push(did.to_string());
        }
        if let Some(search) = &filter.search {
            query.push_str(
                " AND (last_name LIKE ? ESCAPE '\\' OR first_name LIKE ? ESCAPE '\\' OR second_name LIKE ? ESCAPE '\\' OR lotus LIKE ? ESCAPE '\\' OR work_email LIKE ? ESCAPE '\\')",
            );
            let pattern = make_like_pattern(search);
            for _ in 0..5 {
                params.push(pattern.clone());
            }
        }

        query.push_str(" ORDER BY last_name ASC, first_name ASC");

        let mut sqlx_query = sqlx::query_as::<_, SqliteProfileRow>(&query);
        for param in params {
            sqlx_query = sqlx_query.bind(param);
        }

        let rows: Vec<SqliteProfileRow> = sqlx_query.fetch_all(&self.pool).await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn update(&self, id: Uuid, update: &StaffProfileUpdate) -> Result<StaffProfile, DbError> {
        let existing = self
            .get(id)
            .await?
            .ok_or_else(|| DbError::not_found("StaffProfile", id))?;

        let position = update.position.unwrap_or(existing.position);
        let management_id = match update.management_id {
            Some(v) => v,
            None => existing.management_id,
        };
        let department_id = match update.department_id {
            Some(v) => v,
            None => existing.department_id,
        };
        self.check_placement(position, management_id, department_id)
            .await?;

        let first_name = update.first_name.as_ref().unwrap_or(&existing.first_name);
        let second_name = update
            .second_name
            .as_ref()
            .unwrap_or(&existing.second_name);
        let last_name = update.last_name.as_ref().unwrap_or(&existing.last_name);
        let lotus = update.lotus.as_ref().unwrap_or(&existing.lotus);
        let work_email = update.work_email.as_ref().unwrap_or(&existing.work_email);
        let work_phone = update.work_phone.as_ref().unwrap_or(&existing.work_phone);
        let role = update.role.unwrap_or(existing.role);

        sqlx::query(
            r#"
            UPDATE staff_profiles SET first_name = ?, second_name = ?, last_name = ?, lotus = ?, work_email = ?, work_phone = ?, position = ?, management_id = ?, department_id = ?, role = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(first_name)
        .bind(second_name)
        .bind(last_name)
        .bind(lotus)
        .bind(work_email)
        .bind(work_phone)
        .bind(position.as_str())
        .bind(management_id.map(|v| v.to_string()))
        .bind(department_id.map(|v| v.to_string()))
        .bind(role.as_str())
        .bind(Utc::now().to_rfc3339())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        self.get(id)
            .await?
            .ok_or_else(|| DbError::not_found("StaffProfile", id))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM staff_profiles WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn any_exist(&self) -> Result<bool, DbError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM staff_profiles")
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }
}

/// PostgreSQL implementation of StaffProfileRepository.
pub struct PgStaffProfileRepository {
    pool: sqlx::PgPool,
}

impl PgStaffProfileRepository {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }

    async fn check_placement(
        &self,
        position: Position,
        management_id: Option<Uuid>,
        department_id: Option<Uuid>,
    ) -> Result<(), DbError> {
        let department = match department_id {
            Some(id) => Some(
                PgDepartmentRepository::new(self.pool.clone())
                    .get(id)
                    .await?
                    .ok_or_else(|| DbError::not_found("Department", id))?,
            ),
            None => None,
        };
        validate_placement(position, management_id, department.as_ref())?;
        Ok(())
    }
}

#[async_trait]
impl StaffProfileRepository for PgStaffProfileRepository {
    async fn create(&self, profile: &StaffProfile) -> Result<StaffProfile, DbError> {
        self.check_placement(profile.position, profile.management_id, profile.department_id)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO staff_profiles (id, user_id, first_name, second_name, last_name, lotus, work_email, work_phone, position, management_id, department_id, role, curated_orgs_count, curated_cats_count, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            "#,
        )
        .bind(profile.id)
        .bind(profile.user_id)
        .bind(&profile.first_name)
        .bind(&profile.second_name)
        .bind(&profile.last_name)
        .bind(&profile.lotus)
        .bind(&profile.work_email)
        .bind(&profile.work_phone)
        .bind(profile.position.as_str())
        .bind(profile.management_id)
        .bind(profile.department_id)
        .bind(profile.role.as_str())
        .bind(profile.curated_orgs_count)
        .bind(profile.curated_cats_count)
        .bind(profile.created_at)
        .bind(profile.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(profile.clone())
    }

    async fn get(&self, id: Uuid) -> Result<Option<StaffProfile>, DbError> {
        let row: Option<PgProfileRow> = sqlx::query_as(&format!(
            "SELECT {PROFILE_COLUMNS} FROM staff_profiles WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn get_by_user(&self, user_id: Uuid) -> Result<Option<StaffProfile>, DbError> {
        let row: Option<PgProfileRow> = sqlx::query_as(&format!(
            "SELECT {PROFILE_COLUMNS} FROM staff_profiles WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn list(&self, filter: &StaffFilter) -> Result<Vec<StaffProfile>, DbError> {
        let mut conditions = vec!["1=1".to_string()];
        let mut param_idx = 1;

        if filter.role.is_some() {
            conditions.push(format!("role = ${param_idx}"));
            param_idx += 1;
        }
        if filter.management_id.is_some() {
            conditions.push(format!("management_id = ${param_idx}"));
            param_idx += 1;
        }
        if filter.department_id.is_some() {
            conditions.push(format!("department_id = ${param_idx}"));
            param_idx += 1;
        }
        if filter.search.is_some() {
            conditions.push(format!(
                "(last_name ILIKE ${0} OR first_name ILIKE ${1} OR second_name ILIKE ${2} OR lotus ILIKE ${3} OR work_email ILIKE ${4})",
                param_idx,
                param_idx + 1,
                param_idx + 2,
                param_idx + 3,
                param_idx + 4
            ));
        }

        let query = format!(
            "SELECT {PROFILE_COLUMNS} FROM staff_profiles WHERE {} ORDER BY last_name ASC, first_name ASC",
            conditions.join(" AND ")
        );

        let mut sqlx_query = sqlx::query_as::<_, PgProfileRow>(&query);
        if let Some(role) = filter.role {
            sqlx_query = sqlx_query.bind(role.as_str());
        }
        if let Some(mid) = filter.management_id {
            sqlx_query = sqlx_query.bind(mid);
        }
        if let Some(did) = filter.department_id {
            sqlx_query = sqlx_query.bind(did);
        }
        if let Some(search) = &filter.search {
            let pattern = make_like_pattern(search);
            for _ in 0..5 {
                sqlx_query = sqlx_query.bind(pattern.clone());
            }
        }

        let rows: Vec<PgProfileRow> = sqlx_query.fetch_all(&self.pool).await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn update(&self, id: Uuid, update: &StaffProfileUpdate) -> Result<StaffProfile, DbError> {
        let existing = self
            .get(id)
            .await?
            .ok_or_else(|| DbError::not_found("StaffProfile", id))?;

        let position = update.position.unwrap_or(existing.position);
        let management_id = match update.management_id {
            Some(v) => v,
            None => existing.management_id,
        };
        let department_id = match update.department_id {
            Some(v) => v,
            None => existing.department_id,
        };
        self.check_placement(position, management_id, department_id)
            .await?;

        let first_name = update.first_name.as_ref().unwrap_or(&existing.first_name);
        let second_name = update
            .second_name
            .as_ref()
            .unwrap_or(&existing.second_name);
        let last_name = update.last_name.as_ref().unwrap_or(&existing.last_name);
        let lotus = update.lotus.as_ref().unwrap_or(&existing.lotus);
        let work_email = update.work_email.as_ref().unwrap_or(&existing.work_email);
        let work_phone = update.work_phone.as_ref().unwrap_or(&existing.work_phone);
        let role = update.role.unwrap_or(existing.role);

        sqlx::query(
            r#"
            UPDATE staff_profiles SET first_name = $1, second_name = $2, last_name = $3, lotus = $4, work_email = $5, work_phone = $6, position = $7, management_id = $8, department_id = $9, role = $10, updated_at = NOW()
            WHERE id = $11
            "#,
        )
        .bind(first_name)
        .bind(second_name)
        .bind(last_name)
        .bind(lotus)
        .bind(work_email)
        .bind(work_phone)
        .bind(position.as_str())
        .bind(management_id)
        .bind(department_id)
        .bind(role.as_str())
        .bind(id)
        .execute(&self.pool)
        .await?;

        self.get(id)
            .await?
            .ok_or_else(|| DbError::not_found("StaffProfile", id))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM staff_profiles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn any_exist(&self) -> Result<bool, DbError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM staff_profiles")
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }
}

/// Factory function to create the appropriate management unit repository.
pub fn create_management_unit_repository(pool: &DbPool) -> Box<dyn ManagementUnitRepository> {
    match pool {
        DbPool::Sqlite(pool) => Box::new(SqliteManagementUnitRepository::new(pool.clone())),
        DbPool::Postgres(pool) => Box::new(PgManagementUnitRepository::new(pool.clone())),
    }
}

/// Factory function to create the appropriate department repository.
pub fn create_department_repository(pool: &DbPool) -> Box<dyn DepartmentRepository> {
    match pool {
        DbPool::Sqlite(pool) => Box::new(SqliteDepartmentRepository::new(pool.clone())),
        DbPool::Postgres(pool) => Box::new(PgDepartmentRepository::new(pool.clone())),
    }
}

/// Factory function to create the appropriate staff profile repository.
pub fn create_staff_profile_repository(pool: &DbPool) -> Box<dyn StaffProfileRepository> {
    match pool {
        DbPool::Sqlite(pool) => Box::new(SqliteStaffProfileRepository::new(pool.clone())),
        DbPool::Postgres(pool) => Box::new(PgStaffProfileRepository::new(pool.clone())),
    }
}

// Helper structs for SQLx row mapping

#[derive(sqlx::FromRow)]
struct SqliteManagementRow {
    id: String,
    name: String,
    slug: String,
}

impl TryFrom<SqliteManagementRow> for ManagementUnit {
    type Error = DbError;

    fn try_from(row: SqliteManagementRow) -> Result<Self, Self::Error> {
        Ok(ManagementUnit {
            id: parse_uuid(&row.id)?,
            name: row.name,
            slug: row.slug,
        })
    }
}

#[derive(sqlx::FromRow)]
struct PgManagementRow {
    id: Uuid,
    name: String,
    slug: String,
}

impl From<PgManagementRow> for ManagementUnit {
    fn from(row: PgManagementRow) -> Self {
        ManagementUnit {
            id: row.id,
            name: row.name,
            slug: row.slug,
        }
    }
}

#[derive(sqlx::FromRow)]
struct SqliteDepartmentRow {
    id: String,
    management_id: String,
    name: String,
    slug: String,
}

impl TryFrom<SqliteDepartmentRow> for Department {
    type Error = DbError;

    fn try_from(row: SqliteDepartmentRow) -> Result<Self, Self::Error> {
        Ok(Department {
            id: parse_uuid(&row.id)?,
            management_id: parse_uuid(&row.management_id)?,
            name: row.name,
            slug: row.slug,
        })
    }
}

#[derive(sqlx::FromRow)]
struct PgDepartmentRow {
    id: Uuid,
    management_id: Uuid,
    name: String,
    slug: String,
}

impl From<PgDepartmentRow> for Department {
    fn from(row: PgDepartmentRow) -> Self {
        Department {
            id: row.id,
            management_id: row.management_id,
            name: row.name,
            slug: row.slug,
        }
    }
}

#[derive(sqlx::FromRow)]
struct SqliteProfileRow {
    id: String,
    user_id: String,
    first_name: String,
    second_name: String,
    last_name: String,
    lotus: String,
    work_email: String,
    work_phone: String,
    position: String,
    management_id: Option<String>,
    department_id: Option<String>,
    role: String,
    curated_orgs_count: i64,
    curated_cats_count: i64,
    created_at: String,
    updated_at: String,
}

impl TryFrom<SqliteProfileRow> for StaffProfile {
    type Error = DbError;

    fn try_from(row: SqliteProfileRow) -> Result<Self, Self::Error> {
        Ok(StaffProfile {
            id: parse_uuid(&row.id)?,
            user_id: parse_uuid(&row.user_id)?,
            first_name: row.first_name,
            second_name: row.second_name,
            last_name: row.last_name,
            lotus: row.lotus,
            work_email: row.work_email,
            work_phone: row.work_phone,
            position: parse_position(&row.position)?,
            management_id: parse_opt_uuid(row.management_id.as_deref())?,
            department_id: parse_opt_uuid(row.department_id.as_deref())?,
            role: parse_role(&row.role)?,
            curated_orgs_count: row.curated_orgs_count,
            curated_cats_count: row.curated_cats_count,
            created_at: parse_ts(&row.created_at)?,
            updated_at: parse_ts(&row.updated_at)?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct PgProfileRow {
    id: Uuid,
    user_id: Uuid,
    first_name: String,
    second_name: String,
    last_name: String,
    lotus: String,
    work_email: String,
    work_phone: String,
    position: String,
    management_id: Option<Uuid>,
    department_id: Option<Uuid>,
    role: String,
    curated_orgs_count: i64,
    curated_cats_count: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PgProfileRow> for StaffProfile {
    type Error = DbError;

    fn try_from(row: PgProfileRow) -> Result<Self, Self::Error> {
        Ok(StaffProfile {
            id: row.id,
            user_id: row.user_id,
            first_name: row.first_name,
            second_name: row.second_name,
            last_name: row.last_name,
            lotus: row.lotus,
            work_email: row.work_email,
            work_phone: row.work_phone,
            position: parse_position(&row.position)?,
            management_id: row.management_id,
            department_id: row.department_id,
            role: parse_role(&row.role)?,
            curated_orgs_count: row.curated_orgs_count,
            curated_cats_count: row.curated_cats_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn parse_position(s: &str) -> Result<Position, DbError> {
    s.parse::<Position>()
        .map_err(|_| DbError::Serialization(format!("Invalid position: {}", s)))
}

fn parse_role(s: &str) -> Result<Role, DbError> {
    s.parse::<Role>()
        .map_err(|_| DbError::Serialization(format!("Invalid role: {}", s)))
}
