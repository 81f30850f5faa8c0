//! Append-only audit trail repository.

use super::convert::{parse_opt_uuid, parse_ts, parse_uuid};
use super::{DbError, DbPool, PaginatedResult, Pagination};
use crate::audit::{AuditAction, AuditEntry, AuditTarget};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::str::FromStr;
use uuid::Uuid;

const AUDIT_COLUMNS: &str =
    "id, actor_id, action, target_kind, target_id, target_label, changes, created_at";

/// Filter for audit trail listings.
#[derive(Debug, Clone, Default)]
pub struct AuditFilter {
    pub target_kind: Option<String>,
    pub target_id: Option<Uuid>,
    pub actor_id: Option<Uuid>,
    pub action: Option<AuditAction>,
}

/// Repository trait for the audit trail. Entries are never updated or
/// deleted through this interface.
#[async_trait]
pub trait AuditRepository: Send + Sync {
    async fn append(&self, entry: &AuditEntry) -> Result<AuditEntry, DbError>;

    async fn list(
        &self,
        filter: &AuditFilter,
        pagination: &Pagination,
    ) -> Result<PaginatedResult<AuditEntry>, DbError>;
}

/// SQLite implementation of AuditRepository.
pub struct SqliteAuditRepository {
    pool: sqlx::SqlitePool,
}

impl SqliteAuditRepository {
    pub fn new(pool: sqlx::SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditRepository for SqliteAuditRepository {
    async fn append(&self, entry: &AuditEntry) -> Result<AuditEntry, DbError> {
        let changes = serde_json::to_string(&entry.changes)?;
        sqlx::query(
            r#"
            INSERT INTO audit_entries (id, actor_id, action, target_kind, target_id, target_label, changes, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(entry.id.to_string())
        .bind(entry.actor_id.map(|v| v.to_string()))
        .bind(entry.action.as_str())
        .bind(&entry.target.kind)
        .bind(entry.target.id.to_string())
        .bind(&entry.target.label)
        .bind(changes)
        .bind(entry.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(entry.clone())
    }

    async fn list(
        &self,
        filter: &AuditFilter,
        pagination: &Pagination,
    ) -> Result<PaginatedResult<AuditEntry>, DbError> {
        let mut where_clause = String::from(" WHERE 1=1");
        let mut params: Vec<String> = Vec::new();

        if let Some(kind) = &filter.target_kind {
            where_clause.push_str(" AND target_kind = ?");
            params.push(kind.clone());
        }
        if let Some(target_id) = filter.target_id {
            where_clause.push_str(" AND target_id = ?");
            params.push(target_id.to_string());
        }
        if let Some(actor_id) = filter.actor_id {
            where_clause.push_str(" AND actor_id = ?");
            params.push(actor_id.to_string());
        }
        if let Some(action) = filter.action {
            where_clause.push_str(" AND action = ?");
            params.push(action.as_str().to_string());
        }

        let count_query = format!("SELECT COUNT(*) FROM audit_entries{where_clause}");
        let mut count_q = sqlx::query_scalar::<_, i64>(&count_query);
        for p in &params {
            count_q = count_q.bind(p);
        }
        let total: i64 = count_q.fetch_one(&self.pool).await?;

        let list_query = format!(
            "SELECT {AUDIT_COLUMNS} FROM audit_entries{where_clause} ORDER BY created_at DESC LIMIT ? OFFSET ?"
        );
        let mut list_q = sqlx::query_as::<_, SqliteAuditRow>(&list_query);
        for p in &params {
            list_q = list_q.bind(p);
        }
        let rows: Vec<SqliteAuditRow> = list_q
            .bind(pagination.limit() as i64)
            .bind(pagination.offset() as i64)
            .fetch_all(&self.pool)
            .await?;

        let items: Result<Vec<AuditEntry>, DbError> =
            rows.into_iter().map(TryInto::try_into).collect();
        Ok(PaginatedResult::new(items?, total as u64, pagination))
    }
}

/// PostgreSQL implementation of AuditRepository.
pub struct PgAuditRepository {
    pool: sqlx::PgPool,
}

impl PgAuditRepository {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditRepository for PgAuditRepository {
    async fn append(&self, entry: &AuditEntry) -> Result<AuditEntry, DbError> {
        sqlx::query(
            r#"
            INSERT INTO audit_entries (id, actor_id, action, target_kind, target_id, target_label, changes, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(entry.id)
        .bind(entry.actor_id)
        .bind(entry.action.as_str())
        .bind(&entry.target.kind)
        .bind(entry.target.id)
        .bind(&entry.target.label)
        .bind(&entry.changes)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await?;

        Ok(entry.clone())
    }

    async fn list(
        &self,
        filter: &AuditFilter,
        pagination: &Pagination,
    ) -> Result<PaginatedResult<AuditEntry>, DbError> {
        let mut conditions = vec!["1=1".to_string()];
        let mut param_idx = 1;

        if filter.target_kind.is_some() {
            conditions.push(format!("target_kind = ${param_idx}"));
            param_idx += 1;
        }
        if filter.target_id.is_some() {
            conditions.push(format!("target_id = ${param_idx}"));
            param_idx += 1;
        }
        if filter.actor_id.is_some() {
            conditions.push(format!("actor_id = ${param_idx}"));
            param_idx += 1;
        }
        if filter.action.is_some() {
            conditions.push(format!("action = ${param_idx}"));
            param_idx += 1;
        }
        let where_clause = conditions.join(" AND ");

        macro_rules! bind_filter {
            ($q:expr) => {{
                let mut q = $q;
                if let Some(kind) = &filter.target_kind {
                    q = q.bind(kind.clone());
                }
                if let Some(target_id) = filter.target_id {
                    q = q.bind(target_id);
                }
                if let Some(actor_id) = filter.actor_id {
                    q = q.bind(actor_id);
                }
                if let Some(action) = filter.action {
                    q = q.bind(action.as_str());
                }
                q
            }};
        }

        let count_query = format!("SELECT COUNT(*) FROM audit_entries WHERE {where_clause}");
        let total: i64 = bind_filter!(sqlx::query_scalar::<_, i64>(&count_query))
            .fetch_one(&self.pool)
            .await?;

        let list_query = format!(
            "SELECT {AUDIT_COLUMNS} FROM audit_entries WHERE {where_clause} ORDER BY created_at DESC LIMIT ${param_idx} OFFSET ${}",
            param_idx + 1
        );
        let rows: Vec<PgAuditRow> = bind_filter!(sqlx::query_as::<_, PgAuditRow>(&list_query))
            .bind(pagination.limit() as i64)
            .bind(pagination.offset() as i64)
            .fetch_all(&self.pool)
            .await?;

        let items: Result<Vec<AuditEntry>, DbError> =
            rows.into_iter().map(TryInto::try_into).collect();
        Ok(PaginatedResult::new(items?, total as u64, pagination))
    }
}

/// Factory function to create the appropriate audit repository.
pub fn create_audit_repository(pool: &DbPool) -> Box<dyn AuditRepository> {
    match pool {
        DbPool::Sqlite(pool) => Box::new(SqliteAuditRepository::new(pool.clone())),
        DbPool::Postgres(pool) => Box::new(PgAuditRepository::new(pool.clone())),
    }
}

// Helper structs for SQLx row mapping

#[derive(sqlx::FromRow)]
struct SqliteAuditRow {
    id: String,
    actor_id: Option<String>,
    action: String,
    target_kind: String,
    target_id: String,
    target_label: String,
    changes: String,
    created_at: String,
}

impl TryFrom<SqliteAuditRow> for AuditEntry {
    type Error = DbError;

    fn try_from(row: SqliteAuditRow) -> Result<Self, Self::Error> {
        let action = AuditAction::from_str(&row.action)
            .map_err(|message| DbError::validation("action", message))?;
        Ok(AuditEntry {
            id: parse_uuid(&row.id)?,
            actor_id: parse_opt_uuid(row.actor_id.as_deref())?,
            action,
            target: AuditTarget {
                kind: row.target_kind,
                id: parse_uuid(&row.target_id)?,
                label: row.target_label,
            },
            changes: serde_json::from_str(&row.changes)?,
            created_at: parse_ts(&row.created_at)?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct PgAuditRow {
    id: Uuid,
    actor_id: Option<Uuid>,
    action: String,
    target_kind: String,
    target_id: Uuid,
    target_label: String,
    changes: Value,
    created_at: DateTime<Utc>,
}

impl TryFrom<PgAuditRow> for AuditEntry {
    type Error = DbError;

    fn try_from(row: PgAuditRow) -> Result<Self, Self::Error> {
        let action = AuditAction::from_str(&row.action)
            .map_err(|message| DbError::validation("action", message))?;
        Ok(AuditEntry {
            id: row.id,
            actor_id: row.actor_id,
            action,
            target: AuditTarget {
                kind: row.target_kind,
                id: row.target_id,
                label: row.target_label,
            },
            changes: row.changes,
            created_at: row.created_at,
        })
    }
}
