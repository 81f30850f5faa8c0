//! Curatorship link repository.
//!
//! Inserts and deletes run inside a transaction that also recounts the
//! cached curatorship counters on the owning staff profile, so the counters
//! can never drift from the link table.

use super::convert::{parse_opt_uuid, parse_ts, parse_uuid};
use super::{DbError, DbPool};
use crate::curatorship::{validate_curatorship_target, StaffCuratorship};
use crate::permissions::CuratorLink;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

const LINK_COLUMNS: &str = "id, staff_id, organization_id, category_id, can_edit, created_at";

/// Repository trait for curatorship persistence.
#[async_trait]
pub trait CuratorshipRepository: Send + Sync {
    async fn create(&self, link: &StaffCuratorship) -> Result<StaffCuratorship, DbError>;

    async fn get(&self, id: Uuid) -> Result<Option<StaffCuratorship>, DbError>;

    async fn list(&self) -> Result<Vec<StaffCuratorship>, DbError>;

    async fn list_for_staff(&self, staff_id: Uuid) -> Result<Vec<StaffCuratorship>, DbError>;

    /// The permission resolver's view of one staff member's links.
    async fn links_for_staff(&self, staff_id: Uuid) -> Result<Vec<CuratorLink>, DbError>;

    async fn set_can_edit(&self, id: Uuid, can_edit: bool) -> Result<StaffCuratorship, DbError>;

    async fn delete(&self, id: Uuid) -> Result<bool, DbError>;
}

/// SQLite implementation of CuratorshipRepository.
pub struct SqliteCuratorshipRepository {
    pool: sqlx::SqlitePool,
}

impl SqliteCuratorshipRepository {
    pub fn new(pool: sqlx::SqlitePool) -> Self {
        Self { pool }
    }
}

async fn recount_sqlite(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    staff_id: Uuid,
) -> Result<(), DbError> {
    sqlx::query(
        r#"
        UPDATE staff_profiles SET
            curated_orgs_count = (SELECT COUNT(*) FROM staff_curatorships WHERE staff_id = ? AND organization_id IS NOT NULL),
            curated_cats_count = (SELECT COUNT(*) FROM staff_curatorships WHERE staff_id = ? AND category_id IS NOT NULL)
        WHERE id = ?
        "#,
    )
    .bind(staff_id.to_string())
    .bind(staff_id.to_string())
    .bind(staff_id.to_string())
    .execute(&mut **tx)
    .await?;
    Ok(())
}

#[async_trait]
impl CuratorshipRepository for SqliteCuratorshipRepository {
    async fn create(&self, link: &StaffCuratorship) -> Result<StaffCuratorship, DbError> {
        validate_curatorship_target(link.organization_id, link.category_id)?;

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO staff_curatorships (id, staff_id, organization_id, category_id, can_edit, created_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(link.id.to_string())
        .bind(link.staff_id.to_string())
        .bind(link.organization_id.map(|v| v.to_string()))
        .bind(link.category_id.map(|v| v.to_string()))
        .bind(link.can_edit)
        .bind(link.created_at.to_rfc3339())
        .execute(&mut *tx)
        .await?;

        recount_sqlite(&mut tx, link.staff_id).await?;
        tx.commit().await?;

        Ok(link.clone())
    }

    async fn get(&self, id: Uuid) -> Result<Option<StaffCuratorship>, DbError> {
        let row: Option<SqliteLinkRow> = sqlx::query_as(&format!(
            "SELECT {LINK_COLUMNS} FROM staff_curatorships WHERE id = ?"
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn list(&self) -> Result<Vec<StaffCuratorship>, DbError> {
        let rows: Vec<SqliteLinkRow> = sqlx::query_as(&format!(
            "SELECT {LINK_COLUMNS} FROM staff_curatorships ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn list_for_staff(&self, staff_id: Uuid) -> Result<Vec<StaffCuratorship>, DbError> {
        let rows: Vec<SqliteLinkRow> = sqlx::query_as(&format!(
            "SELECT {LINK_COLUMNS} FROM staff_curatorships WHERE staff_id = ? ORDER BY created_at DESC"
        ))
        .bind(staff_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn links_for_staff(&self, staff_id: Uuid) -> Result<Vec<CuratorLink>, DbError> {
        Ok(self
            .list_for_staff(staff_id)
            .await?
            .into_iter()
            .map(|l| CuratorLink {
                organization_id: l.organization_id,
                category_id: l.category_id,
                can_edit: l.can_edit,
            })
            .collect())
    }

    async fn set_can_edit(&self, id: Uuid, can_edit: bool) -> Result<StaffCuratorship, DbError> {
        let result = sqlx::query("UPDATE staff_curatorships SET can_edit = ? WHERE id = ?")
            .bind(can_edit)
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("StaffCuratorship", id));
        }

        self.get(id)
            .await?
            .ok_or_else(|| DbError::not_found("StaffCuratorship", id))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DbError> {
        let Some(existing) = self.get(id).await? else {
            return Ok(false);
        };

        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM staff_curatorships WHERE id = ?")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await?;

        recount_sqlite(&mut tx, existing.staff_id).await?;
        tx.commit().await?;

        Ok(true)
    }
}

/// PostgreSQL implementation of CuratorshipRepository.
pub struct PgCuratorshipRepository {
    pool: sqlx::PgPool,
}

impl PgCuratorshipRepository {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

async fn recount_pg(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    staff_id: Uuid,
) -> Result<(), DbError> {
    sqlx::query(
        r#"
        UPDATE staff_profiles SET
            curated_orgs_count = (SELECT COUNT(*) FROM staff_curatorships WHERE staff_id = $1 AND organization_id IS NOT NULL),
            curated_cats_count = (SELECT COUNT(*) FROM staff_curatorships WHERE staff_id = $1 AND category_id IS NOT NULL)
        WHERE id = $1
        "#,
    )
    .bind(staff_id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

#[async_trait]
impl CuratorshipRepository for PgCuratorshipRepository {
    async fn create(&self, link: &StaffCuratorship) -> Result<StaffCuratorship, DbError> {
        validate_curatorship_target(link.organization_id, link.category_id)?;

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO staff_curatorships (id, staff_id, organization_id, category_id, can_edit, created_at) VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(link.id)
        .bind(link.staff_id)
        .bind(link.organization_id)
        .bind(link.category_id)
        .bind(link.can_edit)
        .bind(link.created_at)
        .execute(&mut *tx)
        .await?;

        recount_pg(&mut tx, link.staff_id).await?;
        tx.commit().await?;

        Ok(link.clone())
    }

    async fn get(&self, id: Uuid) -> Result<Option<StaffCuratorship>, DbError> {
        let row: Option<PgLinkRow> = sqlx::query_as(&format!(
            "SELECT {LINK_COLUMNS} FROM staff_curatorships WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn list(&self) -> Result<Vec<StaffCuratorship>, DbError> {
        let rows: Vec<PgLinkRow> = sqlx::query_as(&format!(
            "SELECT {LINK_COLUMNS} FROM staff_curatorships ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn list_for_staff(&self, staff_id: Uuid) -> Result<Vec<StaffCuratorship>, DbError> {
        let rows: Vec<PgLinkRow> = sqlx::query_as(&format!(
            "SELECT {LINK_COLUMNS} FROM staff_curatorships WHERE staff_id = $1 ORDER BY created_at DESC"
        ))
        .bind(staff_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn links_for_staff(&self, staff_id: Uuid) -> Result<Vec<CuratorLink>, DbError> {
        Ok(self
            .list_for_staff(staff_id)
            .await?
            .into_iter()
            .map(|l| CuratorLink {
                organization_id: l.organization_id,
                category_id: l.category_id,
                can_edit: l.can_edit,
            })
            .collect())
    }

    async fn set_can_edit(&self, id: Uuid, can_edit: bool) -> Result<StaffCuratorship, DbError> {
        let result = sqlx::query("UPDATE staff_curatorships SET can_edit = $1 WHERE id = $2")
            .bind(can_edit)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("StaffCuratorship", id));
        }

        self.get(id)
            .await?
            .ok_or_else(|| DbError::not_found("StaffCuratorship", id))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DbError> {
        let Some(existing) = self.get(id).await? else {
            return Ok(false);
        };

        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM staff_curatorships WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        recount_pg(&mut tx, existing.staff_id).await?;
        tx.commit().await?;

        Ok(true)
    }
}

/// Factory function to create the appropriate curatorship repository.
pub fn create_curatorship_repository(pool: &DbPool) -> Box<dyn CuratorshipRepository> {
    match pool {
        DbPool::Sqlite(pool) => Box::new(SqliteCuratorshipRepository::new(pool.clone())),
        DbPool::Postgres(pool) => Box::new(PgCuratorshipRepository::new(pool.clone())),
    }
}

// Helper structs for SQLx row mapping

#[derive(sqlx::FromRow)]
struct SqliteLinkRow {
    id: String,
    staff_id: String,
    organization_id: Option<String>,
    category_id: Option<String>,
    can_edit: bool,
    created_at: String,
}

impl TryFrom<SqliteLinkRow> for StaffCuratorship {
    type Error = DbError;

    fn try_from(row: SqliteLinkRow) -> Result<Self, Self::Error> {
        Ok(StaffCuratorship {
            id: parse_uuid(&row.id)?,
            staff_id: parse_uuid(&row.staff_id)?,
            organization_id: parse_opt_uuid(row.organization_id.as_deref())?,
            category_id: parse_opt_uuid(row.category_id.as_deref())?,
            can_edit: row.can_edit,
            created_at: parse_ts(&row.created_at)?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct PgLinkRow {
    id: Uuid,
    staff_id: Uuid,
    organization_id: Option<Uuid>,
    category_id: Option<Uuid>,
    can_edit: bool,
    created_at: DateTime<Utc>,
}

impl From<PgLinkRow> for StaffCuratorship {
    fn from(row: PgLinkRow) -> Self {
        StaffCuratorship {
            id: row.id,
            staff_id: row.staff_id,
            organization_id: row.organization_id,
            category_id: row.category_id,
            can_edit: row.can_edit,
            created_at: row.created_at,
        }
    }
}
