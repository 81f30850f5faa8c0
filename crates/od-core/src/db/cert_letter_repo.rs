//! Cert letter repository: letters, destination links, file metadata and
//! replies, plus the flattened loads the statistics endpoints run on.

use super::convert::{parse_date, parse_opt_date, parse_opt_uuid, parse_ts, parse_uuid};
use super::{make_like_pattern, DbError, DbPool, PaginatedResult, Pagination};
use crate::letters::{
    CertLetter, CertLetterFile, CertLetterFilter, CertLetterReply, CertLetterReplyUpdate,
    CertLetterUpdate,
};
use crate::stats::{LetterForStats, OrgRef, ReplyForStats};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;
use uuid::Uuid;

const LETTER_COLUMNS: &str = "id, system, number, date, subject, description, performer, has_deadline, deadline, need_replies, created_by, updated_by, created_at, updated_at";
const REPLY_COLUMNS: &str = "id, letter_id, organization_id, reply_number, internal_number, file_name, received_date, added_by, added_at";
const FILE_COLUMNS: &str = "id, letter_id, file_name, original_name, uploaded_at";

/// Repository trait for cert letter persistence.
#[async_trait]
pub trait CertLetterRepository: Send + Sync {
    /// Creates a letter together with its destination set.
    async fn create(&self, letter: &CertLetter, dest_ids: &[Uuid]) -> Result<CertLetter, DbError>;

    async fn get(&self, id: Uuid) -> Result<Option<CertLetter>, DbError>;

    /// Destination organizations of one letter, id and name.
    async fn destinations(&self, letter_id: Uuid) -> Result<Vec<OrgRef>, DbError>;

    async fn list(
        &self,
        filter: &CertLetterFilter,
        pagination: &Pagination,
    ) -> Result<PaginatedResult<CertLetter>, DbError>;

    async fn update(&self, id: Uuid, update: &CertLetterUpdate) -> Result<CertLetter, DbError>;

    async fn delete(&self, id: Uuid) -> Result<bool, DbError>;

    async fn add_file(&self, file: &CertLetterFile) -> Result<CertLetterFile, DbError>;

    async fn list_files(&self, letter_id: Uuid) -> Result<Vec<CertLetterFile>, DbError>;

    async fn delete_file(&self, id: Uuid) -> Result<bool, DbError>;

    async fn add_reply(&self, reply: &CertLetterReply) -> Result<CertLetterReply, DbError>;

    async fn get_reply(&self, id: Uuid) -> Result<Option<CertLetterReply>, DbError>;

    async fn list_replies(&self, letter_id: Uuid) -> Result<Vec<CertLetterReply>, DbError>;

    async fn update_reply(
        &self,
        id: Uuid,
        update: &CertLetterReplyUpdate,
    ) -> Result<CertLetterReply, DbError>;

    async fn delete_reply(&self, id: Uuid) -> Result<bool, DbError>;

    /// Letters that require replies, flattened for the timeliness aggregator,
    /// optionally bounded by letter date.
    async fn list_for_stats(
        &self,
        date_from: Option<NaiveDate>,
        date_to: Option<NaiveDate>,
    ) -> Result<Vec<LetterForStats>, DbError>;

    /// Letter dates for the monthly grouping, optionally bounded by year.
    async fn list_dates(&self, year: Option<i32>) -> Result<Vec<NaiveDate>, DbError>;
}

/// SQLite implementation of CertLetterRepository.
pub struct SqliteCertLetterRepository {
    pool: sqlx::SqlitePool,
}

impl SqliteCertLetterRepository {
    pub fn new(pool: sqlx::SqlitePool) -> Self {
        Self { pool }
    }

    async fn replace_destinations(
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        letter_id: Uuid,
        dest_ids: &[Uuid],
    ) -> Result<(), DbError> {
        sqlx::query("DELETE FROM cert_letter_destinations WHERE letter_id = ?")
            .bind(letter_id.to_string())
            .execute(&mut **tx)
            .await?;
        for org_id in dest_ids {
            sqlx::query(
                "INSERT INTO cert_letter_destinations (letter_id, organization_id) VALUES (?, ?)",
            )
            .bind(letter_id.to_string())
            .bind(org_id.to_string())
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl CertLetterRepository for SqliteCertLetterRepository {
    async fn create(&self, letter: &CertLetter, dest_ids: &[Uuid]) -> Result<CertLetter, DbError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO cert_letters (id, system, number, date, subject, description, performer, has_deadline, deadline, need_replies, created_by, updated_by, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(letter.id.to_string())
        .bind(&letter.system)
        .bind(&letter.number)
        .bind(letter.date.to_string())
        .bind(&letter.subject)
        .bind(&letter.description)
        .bind(&letter.performer)
        .bind(letter.has_deadline)
        .bind(letter.deadline.map(|d| d.to_string()))
        .bind(letter.need_replies)
        .bind(letter.created_by.map(|v| v.to_string()))
        .bind(letter.updated_by.map(|v| v.to_string()))
        .bind(letter.created_at.to_rfc3339())
        .bind(letter.updated_at.to_rfc3339())
        .execute(&mut *tx)
        .await?;

        Self::replace_destinations(&mut tx, letter.id, dest_ids).await?;
        tx.commit().await?;

        Ok(letter.clone())
    }

    async fn get(&self, id: Uuid) -> Result<Option<CertLetter>, DbError> {
        let row: Option<SqliteLetterRow> = sqlx::query_as(&format!(
            "SELECT {LETTER_COLUMNS} FROM cert_letters WHERE id = ?"
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn destinations(&self, letter_id: Uuid) -> Result<Vec<OrgRef>, DbError> {
        let rows: Vec<(String, String)> = sqlx::query_as(
            r#"
            SELECT o.id, o.name FROM cert_letter_destinations d
            JOIN organizations o ON o.id = d.organization_id
            WHERE d.letter_id = ?
            ORDER BY o.name ASC
            "#,
        )
        .bind(letter_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|(id, name)| {
                Ok(OrgRef {
                    id: parse_uuid(&id)?,
                    name,
                })
            })
            .collect()
    }

    async fn list(
        &self,
        filter: &CertLetterFilter,
        pagination: &Pagination,
    ) -> Result<PaginatedResult<CertLetter>, DbError> {
        let mut where_clause = String::from(" WHERE 1=1");
        let mut params: Vec<String> = Vec::new();

        if let Some(search) = &filter.search {
            where_clause.push_str(
                " AND (number LIKE ? ESCAPE '\\' OR subject LIKE ? ESCAPE '\\' OR description LIKE ? ESCAPE '\\')",
            );
            let pattern = make_like_pattern(search);
            for _ in 0..3 {
                params.push(pattern.clone());
            }
        }
        if let Some(has_deadline) = filter.has_deadline {
            where_clause.push_str(" AND has_deadline = ?");
            params.push(if has_deadline { "1" } else { "0" }.to_string());
        }
        if let Some(need_replies) = filter.need_replies {
            where_clause.push_str(" AND need_replies = ?");
            params.push(if need_replies { "1" } else { "0" }.to_string());
        }
        if let Some(from) = filter.date_from {
            where_clause.push_str(" AND date >= ?");
            params.push(from.to_string());
        }
        if let Some(to) = filter.date_to {
            where_clause.push_str(" AND date <= ?");
            params.push(to.to_string());
        }
        if let Some(org_id) = filter.organization_id {
            where_clause.push_str(
                " AND id IN (SELECT letter_id FROM cert_letter_destinations WHERE organization_id = ?)",
            );
            params.push(org_id.to_string());
        }

        let count_query = format!("SELECT COUNT(*) FROM cert_letters{where_clause}");
        let mut count_q = sqlx::query_scalar::<_, i64>(&count_query);
        for p in &params {
            count_q = count_q.bind(p);
        }
        let total: i64 = count_q.fetch_one(&self.pool).await?;

        let list_query = format!(
            "SELECT {LETTER_COLUMNS} FROM cert_letters{where_clause} ORDER BY date DESC, created_at DESC LIMIT ? OFFSET ?"
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

        let items: Result<Vec<CertLetter>, DbError> =
            rows.into_iter().map(TryInto::try_into).collect();
        Ok(PaginatedResult::new(items?, total as u64, pagination))
    }

    async fn update(&self, id: Uuid, update: &CertLetterUpdate) -> Result<CertLetter, DbError> {
        let existing = self
            .get(id)
            .await?
            .ok_or_else(|| DbError::not_found("CertLetter", id))?;

        let number = update.number.as_ref().unwrap_or(&existing.number);
        let date = update.date.unwrap_or(existing.date);
        let subject = update.subject.as_ref().unwrap_or(&existing.subject);
        let description = update
            .description
            .as_ref()
            .unwrap_or(&existing.description);
        let performer = update.performer.as_ref().unwrap_or(&existing.performer);
        let has_deadline = update.has_deadline.unwrap_or(existing.has_deadline);
        let deadline = match update.deadline {
            Some(v) => v,
            None => existing.deadline,
        };
        let need_replies = update.need_replies.unwrap_or(existing.need_replies);

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            UPDATE cert_letters SET number = ?, date = ?, subject = ?, description = ?, performer = ?, has_deadline = ?, deadline = ?, need_replies = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(number)
        .bind(date.to_string())
        .bind(subject)
        .bind(description)
        .bind(performer)
        .bind(has_deadline)
        .bind(deadline.map(|d| d.to_string()))
        .bind(need_replies)
        .bind(Utc::now().to_rfc3339())
        .bind(id.to_string())
        .execute(&mut *tx)
        .await?;

        if let Some(dest_ids) = &update.dest_organization_ids {
            Self::replace_destinations(&mut tx, id, dest_ids).await?;
        }
        tx.commit().await?;

        self.get(id)
            .await?
            .ok_or_else(|| DbError::not_found("CertLetter", id))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM cert_letters WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn add_file(&self, file: &CertLetterFile) -> Result<CertLetterFile, DbError> {
        sqlx::query(
            "INSERT INTO cert_letter_files (id, letter_id, file_name, original_name, uploaded_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(file.id.to_string())
        .bind(file.letter_id.to_string())
        .bind(&file.file_name)
        .bind(&file.original_name)
        .bind(file.uploaded_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(file.clone())
    }

    async fn list_files(&self, letter_id: Uuid) -> Result<Vec<CertLetterFile>, DbError> {
        let rows: Vec<SqliteFileRow> = sqlx::query_as(&format!(
            "SELECT {FILE_COLUMNS} FROM cert_letter_files WHERE letter_id = ? ORDER BY uploaded_at ASC"
        ))
        .bind(letter_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn delete_file(&self, id: Uuid) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM cert_letter_files WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn add_reply(&self, reply: &CertLetterReply) -> Result<CertLetterReply, DbError> {
        sqlx::query(
            r#"
            INSERT INTO cert_letter_replies (id, letter_id, organization_id, reply_number, internal_number, file_name, received_date, added_by, added_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(reply.id.to_string())
        .bind(reply.letter_id.to_string())
        .bind(reply.organization_id.map(|v| v.to_string()))
        .bind(&reply.reply_number)
        .bind(&reply.internal_number)
        .bind(&reply.file_name)
        .bind(reply.received_date.to_string())
        .bind(reply.added_by.map(|v| v.to_string()))
        .bind(reply.added_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(reply.clone())
    }

    async fn get_reply(&self, id: Uuid) -> Result<Option<CertLetterReply>, DbError> {
        let row: Option<SqliteReplyRow> = sqlx::query_as(&format!(
            "SELECT {REPLY_COLUMNS} FROM cert_letter_replies WHERE id = ?"
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn list_replies(&self, letter_id: Uuid) -> Result<Vec<CertLetterReply>, DbError> {
        let rows: Vec<SqliteReplyRow> = sqlx::query_as(&format!(
            "SELECT {REPLY_COLUMNS} FROM cert_letter_replies WHERE letter_id = ? ORDER BY received_date DESC"
        ))
        .bind(letter_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn update_reply(
        &self,
        id: Uuid,
        update: &CertLetterReplyUpdate,
    ) -> Result<CertLetterReply, DbError> {
        let existing = self
            .get_reply(id)
            .await?
            .ok_or_else(|| DbError::not_found("CertLetterReply", id))?;

        let organization_id = match update.organization_id {
            Some(v) => v,
            None => existing.organization_id,
        };
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
        let received_date = update.received_date.unwrap_or(existing.received_date);

        sqlx::query(
            "UPDATE cert_letter_replies SET organization_id = ?, reply_number = ?, internal_number = ?, file_name = ?, received_date = ? WHERE id = ?",
        )
        .bind(organization_id.map(|v| v.to_string()))
        .bind(reply_number)
        .bind(internal_number)
        .bind(&file_name)
        .bind(received_date.to_string())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        self.get_reply(id)
            .await?
            .ok_or_else(|| DbError::not_found("CertLetterReply", id))
    }

    async fn delete_reply(&self, id: Uuid) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM cert_letter_replies WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_for_stats(
        &self,
        date_from: Option<NaiveDate>,
        date_to: Option<NaiveDate>,
    ) -> Result<Vec<LetterForStats>, DbError> {
        let mut query = String::from(
            "SELECT id, date, has_deadline, deadline FROM cert_letters WHERE need_replies = 1",
        );
        let mut params: Vec<String> = Vec::new();
        if let Some(from) = date_from {
            query.push_str(" AND date >= ?");
            params.push(from.to_string());
        }
        if let Some(to) = date_to {
            query.push_str(" AND date <= ?");
            params.push(to.to_string());
        }

        let mut letters_q =
            sqlx::query_as::<_, (String, String, bool, Option<String>)>(&query);
        for p in &params {
            letters_q = letters_q.bind(p);
        }
        let letter_rows = letters_q.fetch_all(&self.pool).await?;

        let dest_rows: Vec<(String, String, String)> = sqlx::query_as(
            r#"
            SELECT d.letter_id, o.id, o.name FROM cert_letter_destinations d
            JOIN organizations o ON o.id = d.organization_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let reply_rows: Vec<(String, Option<String>, String)> = sqlx::query_as(
            "SELECT letter_id, organization_id, received_date FROM cert_letter_replies",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut dests: HashMap<Uuid, Vec<OrgRef>> = HashMap::new();
        for (letter_id, org_id, name) in dest_rows {
            dests.entry(parse_uuid(&letter_id)?).or_default().push(OrgRef {
                id: parse_uuid(&org_id)?,
                name,
            });
        }
        let mut replies: HashMap<Uuid, Vec<ReplyForStats>> = HashMap::new();
        for (letter_id, org_id, received) in reply_rows {
            replies
                .entry(parse_uuid(&letter_id)?)
                .or_default()
                .push(ReplyForStats {
                    organization_id: parse_opt_uuid(org_id.as_deref())?,
                    received_date: parse_date(&received)?,
                });
        }

        letter_rows
            .into_iter()
            .map(|(id, date, has_deadline, deadline)| {
                let id = parse_uuid(&id)?;
                let deadline = if has_deadline {
                    parse_opt_date(deadline.as_deref())?
                } else {
                    None
                };
                Ok(LetterForStats {
                    id,
                    date: parse_date(&date)?,
                    deadline,
                    destinations: dests.remove(&id).unwrap_or_default(),
                    replies: replies.remove(&id).unwrap_or_default(),
                })
            })
            .collect()
    }

    async fn list_dates(&self, year: Option<i32>) -> Result<Vec<NaiveDate>, DbError> {
        let rows: Vec<String> = match year {
            Some(y) => {
                sqlx::query_scalar("SELECT date FROM cert_letters WHERE date >= ? AND date <= ?")
                    .bind(format!("{y:04}-01-01"))
                    .bind(format!("{y:04}-12-31"))
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                sqlx::query_scalar("SELECT date FROM cert_letters")
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        rows.iter().map(|s| parse_date(s)).collect()
    }
}

/// PostgreSQL implementation of CertLetterRepository.
pub struct PgCertLetterRepository {
    pool: sqlx::PgPool,
}

impl PgCertLetterRepository {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }

    async fn replace_destinations(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        letter_id: Uuid,
        dest_ids: &[Uuid],
    ) -> Result<(), DbError> {
        sqlx::query("DELETE FROM cert_letter_destinations WHERE letter_id = $1")
            .bind(letter_id)
            .execute(&mut **tx)
            .await?;
        for org_id in dest_ids {
            sqlx::query(
                "INSERT INTO cert_letter_destinations (letter_id, organization_id) VALUES ($1, $2)",
            )
            .bind(letter_id)
            .bind(org_id)
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl CertLetterRepository for PgCertLetterRepository {
    async fn create(&self, letter: &CertLetter, dest_ids: &[Uuid]) -> Result<CertLetter, DbError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO cert_letters (id, system, number, date, subject, description, performer, has_deadline, deadline, need_replies, created_by, updated_by, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(letter.id)
        .bind(&letter.system)
        .bind(&letter.number)
        .bind(letter.date)
        .bind(&letter.subject)
        .bind(&letter.description)
        .bind(&letter.performer)
        .bind(letter.has_deadline)
        .bind(letter.deadline)
        .bind(letter.need_replies)
        .bind(letter.created_by)
        .bind(letter.updated_by)
        .bind(letter.created_at)
        .bind(letter.updated_at)
        .execute(&mut *tx)
        .await?;

        Self::replace_destinations(&mut tx, letter.id, dest_ids).await?;
        tx.commit().await?;

        Ok(letter.clone())
    }

    async fn get(&self, id: Uuid) -> Result<Option<CertLetter>, DbError> {
        let row: Option<PgLetterRow> = sqlx::query_as(&format!(
            "SELECT {LETTER_COLUMNS} FROM cert_letters WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn destinations(&self, letter_id: Uuid) -> Result<Vec<OrgRef>, DbError> {
        let rows: Vec<(Uuid, String)> = sqlx::query_as(
            r#"
            SELECT o.id, o.name FROM cert_letter_destinations d
            JOIN organizations o ON o.id = d.organization_id
            WHERE d.letter_id = $1
            ORDER BY o.name ASC
            "#,
        )
        .bind(letter_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, name)| OrgRef { id, name })
            .collect())
    }

    async fn list(
        &self,
        filter: &CertLetterFilter,
        pagination: &Pagination,
    ) -> Result<PaginatedResult<CertLetter>, DbError> {
        let mut conditions = vec!["1=1".to_string()];
        let mut param_idx = 1;

        if filter.search.is_some() {
            conditions.push(format!(
                "(number ILIKE ${0} OR subject ILIKE ${1} OR description ILIKE ${2})",
                param_idx,
                param_idx + 1,
                param_idx + 2
            ));
            param_idx += 3;
        }
        if filter.has_deadline.is_some() {
            conditions.push(format!("has_deadline = ${param_idx}"));
            param_idx += 1;
        }
        if filter.need_replies.is_some() {
            conditions.push(format!("need_replies = ${param_idx}"));
            param_idx += 1;
        }
        if filter.date_from.is_some() {
            conditions.push(format!("date >= ${param_idx}"));
            param_idx += 1;
        }
        if filter.date_to.is_some() {
            conditions.push(format!("date <= ${param_idx}"));
            param_idx += 1;
        }
        if filter.organization_id.is_some() {
            conditions.push(format!(
                "id IN (SELECT letter_id FROM cert_letter_destinations WHERE organization_id = ${param_idx})"
            ));
            param_idx += 1;
        }
        let where_clause = conditions.join(" AND ");

        macro_rules! bind_filter {
            ($q:expr) => {{
                let mut q = $q;
                if let Some(search) = &filter.search {
                    let pattern = make_like_pattern(search);
                    q = q.bind(pattern.clone()).bind(pattern.clone()).bind(pattern);
                }
                if let Some(v) = filter.has_deadline {
                    q = q.bind(v);
                }
                if let Some(v) = filter.need_replies {
                    q = q.bind(v);
                }
                if let Some(v) = filter.date_from {
                    q = q.bind(v);
                }
                if let Some(v) = filter.date_to {
                    q = q.bind(v);
                }
                if let Some(v) = filter.organization_id {
                    q = q.bind(v);
                }
                q
            }};
        }

        let count_query = format!("SELECT COUNT(*) FROM cert_letters WHERE {where_clause}");
        let total: i64 = bind_filter!(sqlx::query_scalar::<_, i64>(&count_query))
            .fetch_one(&self.pool)
            .await?;

        let list_query = format!(
            "SELECT {LETTER_COLUMNS} FROM cert_letters WHERE {where_clause} ORDER BY date DESC, created_at DESC LIMIT ${param_idx} OFFSET ${}",
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

    async fn update(&self, id: Uuid, update: &CertLetterUpdate) -> Result<CertLetter, DbError> {
        let existing = self
            .get(id)
            .await?
            .ok_or_else(|| DbError::not_found("CertLetter", id))?;

        let number = update.number.as_ref().unwrap_or(&existing.number);
        let date = update.date.unwrap_or(existing.date);
        let subject = update.subject.as_ref().unwrap_or(&existing.subject);
        let description = update
            .description
            .as_ref()
            .unwrap_or(&existing.description);
        let performer = update.performer.as_ref().unwrap_or(&existing.performer);
        let has_deadline = update.has_deadline.unwrap_or(existing.has_deadline);
        let deadline = match update.deadline {
            Some(v) => v,
            None => existing.deadline,
        };
        let need_replies = update.need_replies.unwrap_or(existing.need_replies);

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            UPDATE cert_letters SET number = $1, date = $2, subject = $3, description = $4, performer = $5, has_deadline = $6, deadline = $7, need_replies = $8, updated_at = NOW()
            WHERE id = $9
            "#,
        )
        .bind(number)
        .bind(date)
        .bind(subject)
        .bind(description)
        .bind(performer)
        .bind(has_deadline)
        .bind(deadline)
        .bind(need_replies)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if let Some(dest_ids) = &update.dest_organization_ids {
            Self::replace_destinations(&mut tx, id, dest_ids).await?;
        }
        tx.commit().await?;

        self.get(id)
            .await?
            .ok_or_else(|| DbError::not_found("CertLetter", id))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM cert_letters WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn add_file(&self, file: &CertLetterFile) -> Result<CertLetterFile, DbError> {
        sqlx::query(
            "INSERT INTO cert_letter_files (id, letter_id, file_name, original_name, uploaded_at) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(file.id)
        .bind(file.letter_id)
        .bind(&file.file_name)
        .bind(&file.original_name)
        .bind(file.uploaded_at)
        .execute(&self.pool)
        .await?;

        Ok(file.clone())
    }

    async fn list_files(&self, letter_id: Uuid) -> Result<Vec<CertLetterFile>, DbError> {
        let rows: Vec<PgFileRow> = sqlx::query_as(&format!(
            "SELECT {FILE_COLUMNS} FROM cert_letter_files WHERE letter_id = $1 ORDER BY uploaded_at ASC"
        ))
        .bind(letter_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn delete_file(&self, id: Uuid) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM cert_letter_files WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn add_reply(&self, reply: &CertLetterReply) -> Result<CertLetterReply, DbError> {
        sqlx::query(
            r#"
            INSERT INTO cert_letter_replies (id, letter_id, organization_id, reply_number, internal_number, file_name, received_date, added_by, added_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(reply.id)
        .bind(reply.letter_id)
        .bind(reply.organization_id)
        .bind(&reply.reply_number)
        .bind(&reply.internal_number)
        .bind(&reply.file_name)
        .bind(reply.received_date)
        .bind(reply.added_by)
        .bind(reply.added_at)
        .execute(&self.pool)
        .await?;

        Ok(reply.clone())
    }

    async fn get_reply(&self, id: Uuid) -> Result<Option<CertLetterReply>, DbError> {
        let row: Option<PgReplyRow> = sqlx::query_as(&format!(
            "SELECT {REPLY_COLUMNS} FROM cert_letter_replies WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn list_replies(&self, letter_id: Uuid) -> Result<Vec<CertLetterReply>, DbError> {
        let rows: Vec<PgReplyRow> = sqlx::query_as(&format!(
            "SELECT {REPLY_COLUMNS} FROM cert_letter_replies WHERE letter_id = $1 ORDER BY received_date DESC"
        ))
        .bind(letter_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn update_reply(
        &self,
        id: Uuid,
        update: &CertLetterReplyUpdate,
    ) -> Result<CertLetterReply, DbError> {
        let existing = self
            .get_reply(id)
            .await?
            .ok_or_else(|| DbError::not_found("CertLetterReply", id))?;

        let organization_id = match update.organization_id {
            Some(v) => v,
            None => existing.organization_id,
        };
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
        let received_date = update.received_date.unwrap_or(existing.received_date);

        sqlx::query(
            "UPDATE cert_letter_replies SET organization_id = $1, reply_number = $2, internal_number = $3, file_name = $4, received_date = $5 WHERE id = $6",
        )
        .bind(organization_id)
        .bind(reply_number)
        .bind(internal_number)
        .bind(&file_name)
        .bind(received_date)
        .bind(id)
        .execute(&self.pool)
        .await?;

        self.get_reply(id)
            .await?
            .ok_or_else(|| DbError::not_found("CertLetterReply", id))
    }

    async fn delete_reply(&self, id: Uuid) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM cert_letter_replies WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_for_stats(
        &self,
        date_from: Option<NaiveDate>,
        date_to: Option<NaiveDate>,
    ) -> Result<Vec<LetterForStats>, DbError> {
        let mut conditions = vec!["need_replies = TRUE".to_string()];
        let mut param_idx = 1;
        if date_from.is_some() {
            conditions.push(format!("date >= ${param_idx}"));
            param_idx += 1;
        }
        if date_to.is_some() {
            conditions.push(format!("date <= ${param_idx}"));
        }
        let query = format!(
            "SELECT id, date, has_deadline, deadline FROM cert_letters WHERE {}",
            conditions.join(" AND ")
        );

        let mut letters_q =
            sqlx::query_as::<_, (Uuid, NaiveDate, bool, Option<NaiveDate>)>(&query);
        if let Some(from) = date_from {
            letters_q = letters_q.bind(from);
        }
        if let Some(to) = date_to {
            letters_q = letters_q.bind(to);
        }
        let letter_rows = letters_q.fetch_all(&self.pool).await?;

        let dest_rows: Vec<(Uuid, Uuid, String)> = sqlx::query_as(
            r#"
            SELECT d.letter_id, o.id, o.name FROM cert_letter_destinations d
            JOIN organizations o ON o.id = d.organization_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let reply_rows: Vec<(Uuid, Option<Uuid>, NaiveDate)> = sqlx::query_as(
            "SELECT letter_id, organization_id, received_date FROM cert_letter_replies",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut dests: HashMap<Uuid, Vec<OrgRef>> = HashMap::new();
        for (letter_id, org_id, name) in dest_rows {
            dests
                .entry(letter_id)
                .or_default()
                .push(OrgRef { id: org_id, name });
        }
        let mut replies: HashMap<Uuid, Vec<ReplyForStats>> = HashMap::new();
        for (letter_id, org_id, received) in reply_rows {
            replies.entry(letter_id).or_default().push(ReplyForStats {
                organization_id: org_id,
                received_date: received,
            });
        }

        Ok(letter_rows
            .into_iter()
            .map(|(id, date, has_deadline, deadline)| LetterForStats {
                id,
                date,
                deadline: if has_deadline { deadline } else { None },
                destinations: dests.remove(&id).unwrap_or_default(),
                replies: replies.remove(&id).unwrap_or_default(),
            })
            .collect())
    }

    async fn list_dates(&self, year: Option<i32>) -> Result<Vec<NaiveDate>, DbError> {
        let rows: Vec<NaiveDate> = match year {
            Some(y) => {
                sqlx::query_scalar(
                    "SELECT date FROM cert_letters WHERE EXTRACT(YEAR FROM date) = $1",
                )
                .bind(y as i64)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_scalar("SELECT date FROM cert_letters")
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        Ok(rows)
    }
}

/// Factory function to create the appropriate cert letter repository.
pub fn create_cert_letter_repository(pool: &DbPool) -> Box<dyn CertLetterRepository> {
    match pool {
        DbPool::Sqlite(pool) => Box::new(SqliteCertLetterRepository::new(pool.clone())),
        DbPool::Postgres(pool) => Box::new(PgCertLetterRepository::new(pool.clone())),
    }
}

// Helper structs for SQLx row mapping

#[derive(sqlx::FromRow)]
struct SqliteLetterRow {
    id: String,
    system: String,
    number: String,
    date: String,
    subject: String,
    description: String,
    performer: String,
    has_deadline: bool,
    deadline: Option<String>,
    need_replies: bool,
    created_by: Option<String>,
    updated_by: Option<String>,
    created_at: String,
    updated_at: String,
}

impl TryFrom<SqliteLetterRow> for CertLetter {
    type Error = DbError;

    fn try_from(row: SqliteLetterRow) -> Result<Self, Self::Error> {
        Ok(CertLetter {
            id: parse_uuid(&row.id)?,
            system: row.system,
            number: row.number,
            date: parse_date(&row.date)?,
            subject: row.subject,
            description: row.description,
            performer: row.performer,
            has_deadline: row.has_deadline,
            deadline: parse_opt_date(row.deadline.as_deref())?,
            need_replies: row.need_replies,
            created_by: parse_opt_uuid(row.created_by.as_deref())?,
            updated_by: parse_opt_uuid(row.updated_by.as_deref())?,
            created_at: parse_ts(&row.created_at)?,
            updated_at: parse_ts(&row.updated_at)?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct PgLetterRow {
    id: Uuid,
    system: String,
    number: String,
    date: NaiveDate,
    subject: String,
    description: String,
    performer: String,
    has_deadline: bool,
    deadline: Option<NaiveDate>,
    need_replies: bool,
    created_by: Option<Uuid>,
    updated_by: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PgLetterRow> for CertLetter {
    fn from(row: PgLetterRow) -> Self {
        CertLetter {
            id: row.id,
            system: row.system,
            number: row.number,
            date: row.date,
            subject: row.subject,
            description: row.description,
            performer: row.performer,
            has_deadline: row.has_deadline,
            deadline: row.deadline,
            need_replies: row.need_replies,
            created_by: row.created_by,
            updated_by: row.updated_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct SqliteFileRow {
    id: String,
    letter_id: String,
    file_name: String,
    original_name: String,
    uploaded_at: String,
}

impl TryFrom<SqliteFileRow> for CertLetterFile {
    type Error = DbError;

    fn try_from(row: SqliteFileRow) -> Result<Self, Self::Error> {
        Ok(CertLetterFile {
            id: parse_uuid(&row.id)?,
            letter_id: parse_uuid(&row.letter_id)?,
            file_name: row.file_name,
            original_name: row.original_name,
            uploaded_at: parse_ts(&row.uploaded_at)?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct PgFileRow {
    id: Uuid,
    letter_id: Uuid,
    file_name: String,
    original_name: String,
    uploaded_at: DateTime<Utc>,
}

impl From<PgFileRow> for CertLetterFile {
    fn from(row: PgFileRow) -> Self {
        CertLetterFile {
            id: row.id,
            letter_id: row.letter_id,
            file_name: row.file_name,
            original_name: row.original_name,
            uploaded_at: row.uploaded_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct SqliteReplyRow {
    id: String,
    letter_id: String,
    organization_id: Option<String>,
    reply_number: String,
    internal_number: String,
    file_name: Option<String>,
    received_date: String,
    added_by: Option<String>,
    added_at: String,
}

impl TryFrom<SqliteReplyRow> for CertLetterReply {
    type Error = DbError;

    fn try_from(row: SqliteReplyRow) -> Result<Self, Self::Error> {
        Ok(CertLetterReply {
            id: parse_uuid(&row.id)?,
            letter_id: parse_uuid(&row.letter_id)?,
            organization_id: parse_opt_uuid(row.organization_id.as_deref())?,
            reply_number: row.reply_number,
            internal_number: row.internal_number,
            file_name: row.file_name,
            received_date: parse_date(&row.received_date)?,
            added_by: parse_opt_uuid(row.added_by.as_deref())?,
            added_at: parse_ts(&row.added_at)?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct PgReplyRow {
    id: Uuid,
    letter_id: Uuid,
    organization_id: Option<Uuid>,
    reply_number: String,
    internal_number: String,
    file_name: Option<String>,
    received_date: NaiveDate,
    added_by: Option<Uuid>,
    added_at: DateTime<Utc>,
}

impl From<PgReplyRow> for CertLetterReply {
    fn from(row: PgReplyRow) -> Self {
        CertLetterReply {
            id: row.id,
            letter_id: row.letter_id,
            organization_id: row.organization_id,
            reply_number: row.reply_number,
            internal_number: row.internal_number,
            file_name: row.file_name,
            received_date: row.received_date,
            added_by: row.added_by,
            added_at: row.added_at,
        }
    }
}
