//! External letter repository: categories, the letter log and its replies.

use super::convert::{parse_date, parse_opt_uuid, parse_ts, parse_uuid};
use super::{make_like_pattern, DbError, DbPool, PaginatedResult, Pagination};
use crate::letters::{
    ExternalLetter, ExternalLetterFilter, ExternalLetterReply, ExternalLetterReplyUpdate,
    ExternalLetterUpdate, ExternalLettersCategory,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

const CATEGORY_COLUMNS: &str = "id, name, slug, badge, created_at";
const LETTER_COLUMNS: &str = "id, title, slug, description, letter_number, internal_letter_number, executor, category_id, file_name, created_at, updated_at";
const REPLY_COLUMNS: &str =
    "id, letter_id, reply_number, internal_number, file_name, sent_date, added_by, added_at";

/// Repository trait for the external letter log.
#[async_trait]
pub trait ExternalLetterRepository: Send + Sync {
    async fn create_category(
        &self,
        category: &ExternalLettersCategory,
    ) -> Result<ExternalLettersCategory, DbError>;

    async fn get_category(&self, id: Uuid) -> Result<Option<ExternalLettersCategory>, DbError>;

    async fn get_category_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<ExternalLettersCategory>, DbError>;

    async fn list_categories(&self) -> Result<Vec<ExternalLettersCategory>, DbError>;

    /// Renames or rebadges a category. The slug never changes.
    async fn update_category(
        &self,
        id: Uuid,
        name: Option<&str>,
        badge: Option<&str>,
    ) -> Result<ExternalLettersCategory, DbError>;

    async fn delete_category(&self, id: Uuid) -> Result<bool, DbError>;

    /// All category slugs, for unique slug generation.
    async fn list_category_slugs(&self) -> Result<Vec<String>, DbError>;

    async fn create(&self, letter: &ExternalLetter) -> Result<ExternalLetter, DbError>;

    async fn get(&self, id: Uuid) -> Result<Option<ExternalLetter>, DbError>;

    async fn get_by_slug(&self, slug: &str) -> Result<Option<ExternalLetter>, DbError>;

    async fn list(
        &self,
        filter: &ExternalLetterFilter,
        pagination: &Pagination,
    ) -> Result<PaginatedResult<ExternalLetter>, DbError>;

    async fn update(&self, id: Uuid, update: &ExternalLetterUpdate)
        -> Result<ExternalLetter, DbError>;

    async fn delete(&self, id: Uuid) -> Result<bool, DbError>;

    async fn add_reply(&self, reply: &ExternalLetterReply) -> Result<ExternalLetterReply, DbError>;

    async fn get_reply(&self, id: Uuid) -> Result<Option<ExternalLetterReply>, DbError>;

    async fn list_replies(&self, letter_id: Uuid) -> Result<Vec<ExternalLetterReply>, DbError>;

    async fn update_reply(
        &self,
        id: Uuid,
        update: &ExternalLetterReplyUpdate,
    ) -> Result<ExternalLetterReply, DbError>;

    async fn delete_reply(&self, id: Uuid) -> Result<bool, DbError>;
}

/// SQLite implementation of ExternalLetterRepository.
pub struct SqliteExternalLetterRepository {
    pool: sqlx::SqlitePool,
}

impl SqliteExternalLetterRepository {
    pub fn new(pool: sqlx::SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ExternalLetterRepository for SqliteExternalLetterRepository {
    async fn create_category(
        &self,
        category: &ExternalLettersCategory,
    ) -> Result<ExternalLettersCategory, DbError> {
        sqlx::query(
            "INSERT INTO external_letter_categories (id, name, slug, badge, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(category.id.to_string())
        .bind(&category.name)
        .bind(&category.slug)
        .bind(&category.badge)
        .bind(category.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(category.clone())
    }

    async fn get_category(&self, id: Uuid) -> Result<Option<ExternalLettersCategory>, DbError> {
        let row: Option<SqliteCategoryRow> = sqlx::query_as(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM external_letter_categories WHERE id = ?"
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn get_category_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<ExternalLettersCategory>, DbError> {
        let row: Option<SqliteCategoryRow> = sqlx::query_as(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM external_letter_categories WHERE slug = ?"
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn list_categories(&self) -> Result<Vec<ExternalLettersCategory>, DbError> {
        let rows: Vec<SqliteCategoryRow> = sqlx::query_as(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM external_letter_categories ORDER BY name ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn update_category(
        &self,
        id: Uuid,
        name: Option<&str>,
        badge: Option<&str>,
    ) -> Result<ExternalLettersCategory, DbError> {
        let existing = self
            .get_category(id)
            .await?
            .ok_or_else(|| DbError::not_found("ExternalLettersCategory", id))?;

        let name = name.unwrap_or(&existing.name);
        let badge = badge.unwrap_or(&existing.badge);

        sqlx::query("UPDATE external_letter_categories SET name = ?, badge = ? WHERE id = ?")
            .bind(name)
            .bind(badge)
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        self.get_category(id)
            .await?
            .ok_or_else(|| DbError::not_found("ExternalLettersCategory", id))
    }

    async fn delete_category(&self, id: Uuid) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM external_letter_categories WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_category_slugs(&self) -> Result<Vec<String>, DbError> {
        let slugs: Vec<String> =
            sqlx::query_scalar("SELECT slug FROM external_letter_categories")
                .fetch_all(&self.pool)
                .await?;
        Ok(slugs)
    }

    async fn create(&self, letter: &ExternalLetter) -> Result<ExternalLetter, DbError> {
        sqlx::query(
            r#"
            INSERT INTO external_letters (id, title, slug, description, letter_number, internal_letter_number, executor, category_id, file_name, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(letter.id.to_string())
        .bind(&letter.title)
        .bind(&letter.slug)
        .bind(&letter.description)
        .bind(&letter.letter_number)
        .bind(&letter.internal_letter_number)
        .bind(&letter.executor)
        .bind(letter.category_id.to_string())
        .bind(&letter.file_name)
        .bind(letter.created_at.to_rfc3339())
        .bind(letter.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(letter.clone())
    }

    async fn get(&self, id: Uuid) -> Result<Option<ExternalLetter>, DbError> {
        let row: Option<SqliteLetterRow> = sqlx::query_as(&format!(
            "SELECT {LETTER_COLUMNS} FROM external_letters WHERE id = ?"
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<ExternalLetter>, DbError> {
        let row: Option<SqliteLetterRow> = sqlx::query_as(&format!(
            "SELECT {LETTER_COLUMNS} FROM external_letters WHERE slug = ?"
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn list(
        &self,
        filter: &ExternalLetterFilter,
        pagination: &Pagination,
    ) -> Result<PaginatedResult<ExternalLetter>, DbError> {
        let mut where_clause = String::from(" WHERE 1=1");
        let mut params: Vec<String> = Vec::new();

        if let Some(slug) = &filter.category_slug {
            where_clause.push_str(
                " AND category_id IN (SELECT id FROM external_letter_categories WHERE slug = ?)",
            );
            params.push(slug.clone());
        }
        if let Some(search) = &filter.search {
            where_clause.push_str(
                " AND (title LIKE ? ESCAPE '\\' OR description LIKE ? ESCAPE '\\' OR letter_number LIKE ? ESCAPE '\\' OR internal_letter_number LIKE ? ESCAPE '\\')",
            );
            let pattern = make_like_pattern(search);
            for _ in 0..4 {
                params.push(pattern.clone());
            }
        }

        let count_query = format!("SELECT COUNT(*) FROM external_letters{where_clause}");
        let mut count_q = sqlx::query_scalar::<_, i64>(&count_query);
        for p in &params {
            count_q = count_q.bind(p);
        }
        let total: i64 = count_q.fetch_one(&self.pool).await?;

        let list_query = format!(
            "SELECT {LETTER_COLUMNS} FROM external_letters{where_clause} ORDER BY created_at DESC LIMIT ? OFFSET ?"
        );
        let mut list_q = sqlx::query_as::<_, SqliteLetterRow>(&list_query);
        for p in &params {
            list_q = list_q.bind(p);
        }
        let rows: Vec<SqliteLetterRow> = list_q
            .bind(pagination.limit() as i64)
            .bind(pagination.offset() as i64)
            .fetch_all(&self.pool)
            .await?;

        let items: Result<Vec<ExternalLetter>, DbError> =
            rows.into_iter().map(TryInto::try_into).collect();
        Ok(PaginatedResult::new(items?, total as u64, pagination))
    }

    async fn update(
        &self,
        id: Uuid,
        update: &ExternalLetterUpdate,
    ) -> Result<ExternalLetter, DbError> {
        let existing = self
            .get(id)
            .await?
            .ok_or_else(|| DbError::not_found("ExternalLetter", id))?;

        let title = update.title.as_ref().unwrap_or(&existing.title);
        let description = update
            .description
            .as_ref()
            .unwrap_or(&existing.description);
        let letter_number = update
            .letter_number
            .as_ref()
            .unwrap_or(&existing.letter_number);
        let internal_letter_number = update
            .internal_letter_number
            .as_ref()
            .unwrap_or(&existing.internal_letter_number);
        let executor = update.executor.as_ref().unwrap_or(&existing.executor);
        let category_id = update.category_id.unwrap_or(existing.category_id);
        let file_name = match &update.file_name {
            Some(v) => v.clone(),
            None => existing.file_name.clone(),
        };

        sqlx::query(
            r#"
            UPDATE external_letters SET title = ?, description = ?, letter_number = ?, internal_letter_number = ?, executor = ?, category_id = ?, file_name = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(title)
        .bind(description)
        .bind(letter_number)
        .bind(internal_letter_number)
        .bind(executor)
        .bind(category_id.to_string())
        .bind(&file_name)
        .bind(Utc::now().to_rfc3339())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        self.get(id)
            .await?
            .ok_or_else(|| DbError::not_found("ExternalLetter", id))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM external_letters WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn add_reply(&self, reply: &ExternalLetterReply) -> Result<ExternalLetterReply, DbError> {
        sqlx::query(
            r#"
            INSERT INTO external_letter_replies (id, letter_id, reply_number, internal_number, file_name, sent_date, added_by, added_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(reply.id.to_string())
        .bind(reply.letter_id.to_string())
        .bind(&reply.reply_number)
        .bind(&reply.internal_number)
        .bind(&reply.file_name)
        .bind(reply.sent_date.to_string())
        .bind(reply.added_by.map(|v| v.to_string()))
        .bind(reply.added_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(reply.clone())
    }

    async fn get_reply(&self, id: Uuid) -> Result<Option<ExternalLetterReply>, DbError> {
        let row: Option<SqliteReplyRow> = sqlx::query_as(&format!(
            "SELECT {REPLY_COLUMNS} FROM external_letter_replies WHERE id = ?"
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn list_replies(&self, letter_id: Uuid) -> Result<Vec<ExternalLetterReply>, DbError> {
        let rows: Vec<SqliteReplyRow> = sqlx::query_as(&format!(
            "SELECT {REPLY_COLUMNS} FROM external_letter_replies WHERE letter_id = ? ORDER BY sent_date DESC"
        ))
        .bind(letter_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn update_reply(
        &self,
        id: Uuid,
        update: &ExternalLetterReplyUpdate,
    ) -> Result<ExternalLetterReply, DbError> {
        let existing = self
            .get_reply(id)
            .await?
            .ok_or_else(|| DbError::not_found("ExternalLetterReply", id))?;

        let reply_number = update
            .reply_number
            .as_ref()
            .unwrap_or(&existing.reply_number);
        let internal_number = update
            .internal_number
            .as_ref()
            .unwrap_or(&existing.internal_number);
        let file_name = match &update.file_name {
            Some(v) => v.clone(),
            None => existing.file_name.clone(),
        };
        let sent_date = update.sent_date.unwrap_or(existing.sent_date);

        sqlx::query(
            "UPDATE external_letter_replies SET reply_number = ?, internal_number = ?, file_name = ?, sent_date = ? WHERE id = ?",
        )
        .bind(reply_number)
        .bind(internal_number)
        .bind(&file_name)
        .bind(sent_date.to_string())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        self.get_reply(id)
            .await?
            .ok_or_else(|| DbError::not_found("ExternalLetterReply", id))
    }

    async fn delete_reply(&self, id: Uuid) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM external_letter_replies WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// PostgreSQL implementation of ExternalLetterRepository.
pub struct PgExternalLetterRepository {
    pool: sqlx::PgPool,
}

impl PgExternalLetterRepository {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ExternalLetterRepository for PgExternalLetterRepository {
    async fn create_category(
        &self,
        category: &ExternalLettersCategory,
    ) -> Result<ExternalLettersCategory, DbError> {
        sqlx::query(
            "INSERT INTO external_letter_categories (id, name, slug, badge, created_at) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(category.id)
        .bind(&category.name)
        .bind(&category.slug)
        .bind(&category.badge)
        .bind(category.created_at)
        .execute(&self.pool)
        .await?;

        Ok(category.clone())
    }

    async fn get_category(&self, id: Uuid) -> Result<Option<ExternalLettersCategory>, DbError> {
        let row: Option<PgCategoryRow> = sqlx::query_as(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM external_letter_categories WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn get_category_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<ExternalLettersCategory>, DbError> {
        let row: Option<PgCategoryRow> = sqlx::query_as(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM external_letter_categories WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn list_categories(&self) -> Result<Vec<ExternalLettersCategory>, DbError> {
        let rows: Vec<PgCategoryRow> = sqlx::query_as(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM external_letter_categories ORDER BY name ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn update_category(
        &self,
        id: Uuid,
        name: Option<&str>,
        badge: Option<&str>,
    ) -> Result<ExternalLettersCategory, DbError> {
        let existing = self
            .get_category(id)
            .await?
            .ok_or_else(|| DbError::not_found("ExternalLettersCategory", id))?;

        let name = name.unwrap_or(&existing.name);
        let badge = badge.unwrap_or(&existing.badge);

        sqlx::query("UPDATE external_letter_categories SET name = $1, badge = $2 WHERE id = $3")
            .bind(name)
            .bind(badge)
            .bind(id)
            .execute(&self.pool)
            .await?;

        self.get_category(id)
            .await?
            .ok_or_else(|| DbError::not_found("ExternalLettersCategory", id))
    }

    async fn delete_category(&self, id: Uuid) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM external_letter_categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_category_slugs(&self) -> Result<Vec<String>, DbError> {
        let slugs: Vec<String> =
            sqlx::query_scalar("SELECT slug FROM external_letter_categories")
                .fetch_all(&self.pool)
                .await?;
        Ok(slugs)
    }

    async fn create(&self, letter: &ExternalLetter) -> Result<ExternalLetter, DbError> {
        sqlx::query(
            r#"
            INSERT INTO external_letters (id, title, slug, description, letter_number, internal_letter_number, executor, category_id, file_name, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(letter.id)
        .bind(&letter.title)
        .bind(&letter.slug)
        .bind(&letter.description)
        .bind(&letter.letter_number)
        .bind(&letter.internal_letter_number)
        .bind(&letter.executor)
        .bind(letter.category_id)
        .bind(&letter.file_name)
        .bind(letter.created_at)
        .bind(letter.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(letter.clone())
    }

    async fn get(&self, id: Uuid) -> Result<Option<ExternalLetter>, DbError> {
        let row: Option<PgLetterRow> = sqlx::query_as(&format!(
            "SELECT {LETTER_COLUMNS} FROM external_letters WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<ExternalLetter>, DbError> {
        let row: Option<PgLetterRow> = sqlx::query_as(&format!(
            "SELECT {LETTER_COLUMNS} FROM external_letters WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn list(
        &self,
        filter: &ExternalLetterFilter,
        pagination: &Pagination,
    ) -> Result<PaginatedResult<ExternalLetter>, DbError> {
        let mut conditions = vec!["1=1".to_string()];
        let mut param_idx = 1;

        if filter.category_slug.is_some() {
            conditions.push(format!(
                "category_id IN (SELECT id FROM external_letter_categories WHERE slug = ${param_idx})"
            ));
            param_idx += 1;
        }
        if filter.search.is_some() {
            conditions.push(format!(
                "(title ILIKE ${0} OR description ILIKE ${1} OR letter_number ILIKE ${2} OR internal_letter_number ILIKE ${3})",
                param_idx,
                param_idx + 1,
                param_idx + 2,
                param_idx + 3
            ));
            param_idx += 4;
        }
        let where_clause = conditions.join(" AND ");

        macro_rules! bind_filter {
            ($q:expr) => {{
                let mut q = $q;
                if let Some(slug) = &filter.category_slug {
                    q = q.bind(slug.clone());
                }
                if let Some(search) = &filter.search {
                    let pattern = make_like_pattern(search);
                    q = q
                        .bind(pattern.clone())
                        .bind(pattern.clone())
                        .bind(pattern.clone())
                        .bind(pattern);
                }
                q
            }};
        }

        let count_query = format!("SELECT COUNT(*) FROM external_letters WHERE {where_clause}");
        let total: i64 = bind_filter!(sqlx::query_scalar::<_, i64>(&count_query))
            .fetch_one(&self.pool)
            .await?;

        let list_query = format!(
            "SELECT {LETTER_COLUMNS} FROM external_letters WHERE {where_clause} ORDER BY created_at DESC LIMIT ${param_idx} OFFSET ${}",
            param_idx + 1
        );
        let rows: Vec<PgLetterRow> = bind_filter!(sqlx::query_as::<_, PgLetterRow>(&list_query))
            .bind(pagination.limit() as i64)
            .bind(pagination.offset() as i64)
            .fetch_all(&self.pool)
            .await?;

        Ok(PaginatedResult::new(
            rows.into_iter().map(Into::into).collect(),
            total as u64,
            pagination,
        ))
    }

    async fn update(
        &self,
        id: Uuid,
        update: &ExternalLetterUpdate,
    ) -> Result<ExternalLetter, DbError> {
        let existing = self
            .get(id)
            .await?
            .ok_or_else(|| DbError::not_found("ExternalLetter", id))?;

        let title = update.title.as_ref().unwrap_or(&existing.title);
        let description = update
            .description
            .as_ref()
            .unwrap_or(&existing.description);
        let letter_number = update
            .letter_number
            .as_ref()
            .unwrap_or(&existing.letter_number);
        let internal_letter_number = update
            .internal_letter_number
            .as_ref()
            .unwrap_or(&existing.internal_letter_number);
        let executor = update.executor.as_ref().unwrap_or(&existing.executor);
        let category_id = update.category_id.unwrap_or(existing.category_id);
        let file_name = match &update.file_name {
            Some(v) => v.clone(),
            None => existing.file_name.clone(),
        };

        sqlx::query(
            r#"
            UPDATE external_letters SET title = $1, description = $2, letter_number = $3, internal_letter_number = $4, executor = $5, category_id = $6, file_name = $7, updated_at = NOW()
            WHERE id = $8
            "#,
        )
        .bind(title)
        .bind(description)
        .bind(letter_number)
        .bind(internal_letter_number)
        .bind(executor)
        .bind(category_id)
        .bind(&file_name)
        .bind(id)
        .execute(&self.pool)
        .await?;

        self.get(id)
            .await?
            .ok_or_else(|| DbError::not_found("ExternalLetter", id))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM external_letters WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn add_reply(&self, reply: &ExternalLetterReply) -> Result<ExternalLetterReply, DbError> {
        sqlx::query(
            r#"
            INSERT INTO external_letter_replies (id, letter_id, reply_number, internal_number, file_name, sent_date, added_by, added_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(reply.id)
        .bind(reply.letter_id)
        .bind(&reply.reply_number)
        .bind(&reply.internal_number)
        .bind(&reply.file_name)
        .bind(reply.sent_date)
        .bind(reply.added_by)
        .bind(reply.added_at)
        .execute(&self.pool)
        .await?;

        Ok(reply.clone())
    }

    async fn get_reply(&self, id: Uuid) -> Result<Option<ExternalLetterReply>, DbError> {
        let row: Option<PgReplyRow> = sqlx::query_as(&format!(
            "SELECT {REPLY_COLUMNS} FROM external_letter_replies WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn list_replies(&self, letter_id: Uuid) -> Result<Vec<ExternalLetterReply>, DbError> {
        let rows: Vec<PgReplyRow> = sqlx::query_as(&format!(
            "SELECT {REPLY_COLUMNS} FROM external_letter_replies WHERE letter_id = $1 ORDER BY sent_date DESC"
        ))
        .bind(letter_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn update_reply(
        &self,
        id: Uuid,
        update: &ExternalLetterReplyUpdate,
    ) -> Result<ExternalLetterReply, DbError> {
        let existing = self
            .get_reply(id)
            .await?
            .ok_or_else(|| DbError::not_found("ExternalLetterReply", id))?;

        let reply_number = update
            .reply_number
            .as_ref()
            .unwrap_or(&existing.reply_number);
        let internal_number = update
            .internal_number
            .as_ref()
            .unwrap_or(&existing.internal_number);
        let file_name = match &update.file_name {
            Some(v) => v.clone(),
            None => existing.file_name.clone(),
        };
        let sent_date = update.sent_date.unwrap_or(existing.sent_date);

        sqlx::query(
            "UPDATE external_letter_replies SET reply_number = $1, internal_number = $2, file_name = $3, sent_date = $4 WHERE id = $5",
        )
        .bind(reply_number)
        .bind(internal_number)
        .bind(&file_name)
        .bind(sent_date)
        .bind(id)
        .execute(&self.pool)
        .await?;

        self.get_reply(id)
            .await?
            .ok_or_else(|| DbError::not_found("ExternalLetterReply", id))
    }

    async fn delete_reply(&self, id: Uuid) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM external_letter_replies WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Factory function to create the appropriate external letter repository.
pub fn create_external_letter_repository(pool: &DbPool) -> Box<dyn ExternalLetterRepository> {
    match pool {
        DbPool::Sqlite(pool) => Box::new(SqliteExternalLetterRepository::new(pool.clone())),
        DbPool::Postgres(pool) => Box::new(PgExternalLetterRepository::new(pool.clone())),
    }
}

// Helper structs for SQLx row mapping

#[derive(sqlx::FromRow)]
struct SqliteCategoryRow {
    id: String,
    name: String,
    slug: String,
    badge: String,
    created_at: String,
}

impl TryFrom<SqliteCategoryRow> for ExternalLettersCategory {
    type Error = DbError;

    fn try_from(row: SqliteCategoryRow) -> Result<Self, Self::Error> {
        Ok(ExternalLettersCategory {
            id: parse_uuid(&row.id)?,
            name: row.name,
            slug: row.slug,
            badge: row.badge,
            created_at: parse_ts(&row.created_at)?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct PgCategoryRow {
    id: Uuid,
    name: String,
    slug: String,
    badge: String,
    created_at: DateTime<Utc>,
}

impl From<PgCategoryRow> for ExternalLettersCategory {
    fn from(row: PgCategoryRow) -> Self {
        ExternalLettersCategory {
            id: row.id,
            name: row.name,
            slug: row.slug,
            badge: row.badge,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct SqliteLetterRow {
    id: String,
    title: String,
    slug: String,
    description: String,
    letter_number: String,
    internal_letter_number: String,
    executor: String,
    category_id: String,
    file_name: Option<String>,
    created_at: String,
    updated_at: String,
}

impl TryFrom<SqliteLetterRow> for ExternalLetter {
    type Error = DbError;

    fn try_from(row: SqliteLetterRow) -> Result<Self, Self::Error> {
        Ok(ExternalLetter {
            id: parse_uuid(&row.id)?,
            title: row.title,
            slug: row.slug,
            description: row.description,
            letter_number: row.letter_number,
            internal_letter_number: row.internal_letter_number,
            executor: row.executor,
            category_id: parse_uuid(&row.category_id)?,
            file_name: row.file_name,
            created_at: parse_ts(&row.created_at)?,
            updated_at: parse_ts(&row.updated_at)?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct PgLetterRow {
    id: Uuid,
    title: String,
    slug: String,
    description: String,
    letter_number: String,
    internal_letter_number: String,
    executor: String,
    category_id: Uuid,
    file_name: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PgLetterRow> for ExternalLetter {
    fn from(row: PgLetterRow) -> Self {
        ExternalLetter {
            id: row.id,
            title: row.title,
            slug: row.slug,
            description: row.description,
            letter_number: row.letter_number,
            internal_letter_number: row.internal_letter_number,
            executor: row.executor,
            category_id: row.category_id,
            file_name: row.file_name,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct SqliteReplyRow {
    id: String,
    letter_id: String,
    reply_number: String,
    internal_number: String,
    file_name: Option<String>,
    sent_date: String,
    added_by: Option<String>,
    added_at: String,
}

impl TryFrom<SqliteReplyRow> for ExternalLetterReply {
    type Error = DbError;

    fn try_from(row: SqliteReplyRow) -> Result<Self, Self::Error> {
        Ok(ExternalLetterReply {
            id: parse_uuid(&row.id)?,
            letter_id: parse_uuid(&row.letter_id)?,
            reply_number: row.reply_number,
            internal_number: row.internal_number,
            file_name: row.file_name,
            sent_date: parse_date(&row.sent_date)?,
            added_by: parse_opt_uuid(row.added_by.as_deref())?,
            added_at: parse_ts(&row.added_at)?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct PgReplyRow {
    id: Uuid,
    letter_id: Uuid,
    reply_number: String,
    internal_number: String,
    file_name: Option<String>,
    sent_date: NaiveDate,
    added_by: Option<Uuid>,
    added_at: DateTime<Utc>,
}

impl From<PgReplyRow> for ExternalLetterReply {
    fn from(row: PgReplyRow) -> Self {
        ExternalLetterReply {
            id: row.id,
            letter_id: row.letter_id,
            reply_number: row.reply_number,
            internal_number: row.internal_number,
            file_name: row.file_name,
            sent_date: row.sent_date,
            added_by: row.added_by,
            added_at: row.added_at,
        }
    }
}
