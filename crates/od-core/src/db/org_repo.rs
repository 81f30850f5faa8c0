//! Category and organization repositories.

use super::convert::{parse_ts, parse_uuid};
use super::{make_like_pattern, DbError, DbPool, PaginatedResult, Pagination};
use crate::org::{
    Category, CategoryUpdate, CategoryWithCounts, Organization, OrganizationFilter,
    OrganizationUpdate,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

const ORG_COLUMNS: &str = "id, name, slug, description, address, lotus, phone, email, category_id, logo_file, created_at, updated_at";
const CAT_COLUMNS: &str = "id, name, slug, description, badge, created_at";

/// Repository trait for category persistence.
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    async fn create(&self, category: &Category) -> Result<Category, DbError>;

    async fn get(&self, id: Uuid) -> Result<Option<Category>, DbError>;

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Category>, DbError>;

    /// Lists all categories with organization counts, ordered by name.
    async fn list(&self) -> Result<Vec<CategoryWithCounts>, DbError>;

    async fn update(&self, id: Uuid, update: &CategoryUpdate) -> Result<Category, DbError>;

    async fn delete(&self, id: Uuid) -> Result<bool, DbError>;

    /// All existing slugs, for unique slug generation.
    async fn list_slugs(&self) -> Result<Vec<String>, DbError>;
}

/// Repository trait for organization persistence.
#[async_trait]
pub trait OrganizationRepository: Send + Sync {
    async fn create(&self, org: &Organization) -> Result<Organization, DbError>;

    async fn get(&self, id: Uuid) -> Result<Option<Organization>, DbError>;

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Organization>, DbError>;

    async fn list(
        &self,
        filter: &OrganizationFilter,
        pagination: &Pagination,
    ) -> Result<PaginatedResult<Organization>, DbError>;

    async fn update(&self, id: Uuid, update: &OrganizationUpdate) -> Result<Organization, DbError>;

    async fn delete(&self, id: Uuid) -> Result<bool, DbError>;

    async fn list_slugs(&self) -> Result<Vec<String>, DbError>;
}

/// SQLite implementation of CategoryRepository.
pub struct SqliteCategoryRepository {
    pool: sqlx::SqlitePool,
}

impl SqliteCategoryRepository {
    pub fn new(pool: sqlx::SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CategoryRepository for SqliteCategoryRepository {
    async fn create(&self, category: &Category) -> Result<Category, DbError> {
        sqlx::query(
            "INSERT INTO categories (id, name, slug, description, badge, created_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(category.id.to_string())
        .bind(&category.name)
        .bind(&category.slug)
        .bind(&category.description)
        .bind(&category.badge)
        .bind(category.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(category.clone())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Category>, DbError> {
        let row: Option<SqliteCategoryRow> = sqlx::query_as(&format!(
            "SELECT {CAT_COLUMNS} FROM categories WHERE id = ?"
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Category>, DbError> {
        let row: Option<SqliteCategoryRow> = sqlx::query_as(&format!(
            "SELECT {CAT_COLUMNS} FROM categories WHERE slug = ?"
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn list(&self) -> Result<Vec<CategoryWithCounts>, DbError> {
        let rows: Vec<SqliteCategoryCountRow> = sqlx::query_as(
            r#"
            SELECT c.id, c.name, c.slug, c.description, c.badge, c.created_at,
                   (SELECT COUNT(*) FROM organizations o WHERE o.category_id = c.id) AS objects_count,
                   (SELECT COUNT(*) FROM organizations o
                     WHERE o.category_id = c.id AND date(o.created_at) = date('now')) AS today_count
            FROM categories c
            ORDER BY c.name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn update(&self, id: Uuid, update: &CategoryUpdate) -> Result<Category, DbError> {
        let existing = self
            .get(id)
            .await?
            .ok_or_else(|| DbError::not_found("Category", id))?;

        let name = update.name.as_ref().unwrap_or(&existing.name);
        let description = update
            .description
            .as_ref()
            .unwrap_or(&existing.description);
        let badge = update.badge.as_ref().unwrap_or(&existing.badge);

        sqlx::query("UPDATE categories SET name = ?, description = ?, badge = ? WHERE id = ?")
            .bind(name)
            .bind(description)
            .bind(badge)
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        self.get(id)
            .await?
            .ok_or_else(|| DbError::not_found("Category", id))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM categories WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_slugs(&self) -> Result<Vec<String>, DbError> {
        let slugs: Vec<String> = sqlx::query_scalar("SELECT slug FROM categories")
            .fetch_all(&self.pool)
            .await?;
        Ok(slugs)
    }
}

/// PostgreSQL implementation of CategoryRepository.
pub struct PgCategoryRepository {
    pool: sqlx::PgPool,
}

impl PgCategoryRepository {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CategoryRepository for PgCategoryRepository {
    async fn create(&self, category: &Category) -> Result<Category, DbError> {
        sqlx::query(
            "INSERT INTO categories (id, name, slug, description, badge, created_at) VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(category.id)
        .bind(&category.name)
        .bind(&category.slug)
        .bind(&category.description)
        .bind(&category.badge)
        .bind(category.created_at)
        .execute(&self.pool)
        .await?;

        Ok(category.clone())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Category>, DbError> {
        let row: Option<PgCategoryRow> = sqlx::query_as(&format!(
            "SELECT {CAT_COLUMNS} FROM categories WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Category>, DbError> {
        let row: Option<PgCategoryRow> = sqlx::query_as(&format!(
            "SELECT {CAT_COLUMNS} FROM categories WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn list(&self) -> Result<Vec<CategoryWithCounts>, DbError> {
        let rows: Vec<PgCategoryCountRow> = sqlx::query_as(
            r#"
            SELECT c.id, c.name, c.slug, c.description, c.badge, c.created_at,
                   (SELECT COUNT(*) FROM organizations o WHERE o.category_id = c.id) AS objects_count,
                   (SELECT COUNT(*) FROM organizations o
                     WHERE o.category_id = c.id AND o.created_at::date = CURRENT_DATE) AS today_count
            FROM categories c
            ORDER BY c.name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn update(&self, id: Uuid, update: &CategoryUpdate) -> Result<Category, DbError> {
        let existing = self
            .get(id)
            .await?
            .ok_or_else(|| DbError::not_found("Category", id))?;

        let name = update.name.as_ref().unwrap_or(&existing.name);
        let description = update
            .description
            .as_ref()
            .unwrap_or(&existing.description);
        let badge = update.badge.as_ref().unwrap_or(&existing.badge);

        sqlx::query("UPDATE categories SET name = $1, description = $2, badge = $3 WHERE id = $4")
            .bind(name)
            .bind(description)
            .bind(badge)
            .bind(id)
            .execute(&self.pool)
            .await?;

        self.get(id)
            .await?
            .ok_or_else(|| DbError::not_found("Category", id))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_slugs(&self) -> Result<Vec<String>, DbError> {
        let slugs: Vec<String> = sqlx::query_scalar("SELECT slug FROM categories")
            .fetch_all(&self.pool)
            .await?;
        Ok(slugs)
    }
}

/// SQLite implementation of OrganizationRepository.
pub struct SqliteOrganizationRepository {
    pool: sqlx::SqlitePool,
}

impl SqliteOrganizationRepository {
    pub fn new(pool: sqlx::SqlitePool) -> Self {
        Self { pool }
    }
}

// Shared WHERE-clause assembly for list/count; both backends use the same
// positional placeholder style after substitution.
fn org_filter_clauses(filter: &OrganizationFilter, placeholder: fn(usize) -> String) -> (String, Vec<String>) {
    let mut clauses = Vec::new();
    let mut params = Vec::new();

    if let Some(slug) = &filter.category_slug {
        clauses.push(format!(
            "category_id = (SELECT id FROM categories WHERE slug = {})",
            placeholder(params.len() + 1)
        ));
        params.push(slug.clone());
    }

    if let Some(search) = &filter.search {
        let pattern = make_like_pattern(search);
        let first = params.len() + 1;
        clauses.push(format!(
            "(name LIKE {p1} ESCAPE '\\' OR description LIKE {p2} ESCAPE '\\' OR address LIKE {p3} ESCAPE '\\' OR lotus LIKE {p4} ESCAPE '\\' OR phone LIKE {p5} ESCAPE '\\' OR email LIKE {p6} ESCAPE '\\')",
            p1 = placeholder(first),
            p2 = placeholder(first + 1),
            p3 = placeholder(first + 2),
            p4 = placeholder(first + 3),
            p5 = placeholder(first + 4),
            p6 = placeholder(first + 5),
        ));
        for _ in 0..6 {
            params.push(pattern.clone());
        }
    }

    let where_clause = if clauses.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", clauses.join(" AND "))
    };

    (where_clause, params)
}

fn qmark(_: usize) -> String {
    "?".to_string()
}

fn dollar(n: usize) -> String {
    format!("${n}")
}

#[async_trait]
impl OrganizationRepository for SqliteOrganizationRepository {
    async fn create(&self, org: &Organization) -> Result<Organization, DbError> {
        sqlx::query(
            r#"
            INSERT INTO organizations (id, name, slug, description, address, lotus, phone, email, category_id, logo_file, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(org.id.to_string())
        .bind(&org.name)
        .bind(&org.slug)
        .bind(&org.description)
        .bind(&org.address)
        .bind(&org.lotus)
        .bind(&org.phone)
        .bind(&org.email)
        .bind(org.category_id.to_string())
        .bind(&org.logo_file)
        .bind(org.created_at.to_rfc3339())
        .bind(org.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(org.clone())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Organization>, DbError> {
        let row: Option<SqliteOrgRow> = sqlx::query_as(&format!(
            "SELECT {ORG_COLUMNS} FROM organizations WHERE id = ?"
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Organization>, DbError> {
        let row: Option<SqliteOrgRow> = sqlx::query_as(&format!(
            "SELECT {ORG_COLUMNS} FROM organizations WHERE slug = ?"
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn list(
        &self,
        filter: &OrganizationFilter,
        pagination: &Pagination,
    ) -> Result<PaginatedResult<Organization>, DbError> {
        let (where_clause, params) = org_filter_clauses(filter, qmark);

        let count_query = format!("SELECT COUNT(*) FROM organizations{where_clause}");
        let mut count_q = sqlx::query_scalar::<_, i64>(&count_query);
        for p in &params {
            count_q = count_q.bind(p);
        }
        let total: i64 = count_q.fetch_one(&self.pool).await?;

        let list_query = format!(
            "SELECT {ORG_COLUMNS} FROM organizations{where_clause} ORDER BY {} LIMIT ? OFFSET ?",
            filter.order.order_by_clause()
        );
        let mut list_q = sqlx::query_as::<_, SqliteOrgRow>(&list_query);
        for p in &params {
            list_q = list_q.bind(p);
        }
        let rows: Vec<SqliteOrgRow> = list_q
            .bind(pagination.limit() as i64)
            .bind(pagination.offset() as i64)
            .fetch_all(&self.pool)
            .await?;

        let items: Result<Vec<Organization>, DbError> =
            rows.into_iter().map(TryInto::try_into).collect();
        Ok(PaginatedResult::new(items?, total as u64, pagination))
    }

    async fn update(&self, id: Uuid, update: &OrganizationUpdate) -> Result<Organization, DbError> {
        let existing = self
            .get(id)
            .await?
            .ok_or_else(|| DbError::not_found("Organization", id))?;

        let name = update.name.as_ref().unwrap_or(&existing.name);
        let description = update
            .description
            .as_ref()
            .unwrap_or(&existing.description);
        let address = update.address.as_ref().unwrap_or(&existing.address);
        let lotus = update.lotus.as_ref().unwrap_or(&existing.lotus);
        let phone = update.phone.as_ref().unwrap_or(&existing.phone);
        let email = update.email.as_ref().unwrap_or(&existing.email);
        let category_id = update.category_id.unwrap_or(existing.category_id);
        let logo_file = match &update.logo_file {
            Some(v) => v.clone(),
            None => existing.logo_file.clone(),
        };

        sqlx::query(
            r#"
            UPDATE organizations SET name = ?, description = ?, address = ?, lotus = ?, phone = ?, email = ?, category_id = ?, logo_file = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(name)
        .bind(description)
        .bind(address)
        .bind(lotus)
        .bind(phone)
        .bind(email)
        .bind(category_id.to_string())
        .bind(&logo_file)
        .bind(Utc::now().to_rfc3339())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        self.get(id)
            .await?
            .ok_or_else(|| DbError::not_found("Organization", id))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM organizations WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_slugs(&self) -> Result<Vec<String>, DbError> {
        let slugs: Vec<String> = sqlx::query_scalar("SELECT slug FROM organizations")
            .fetch_all(&self.pool)
            .await?;
        Ok(slugs)
    }
}

/// PostgreSQL implementation of OrganizationRepository.
pub struct PgOrganizationRepository {
    pool: sqlx::PgPool,
}

impl PgOrganizationRepository {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrganizationRepository for PgOrganizationRepository {
    async fn create(&self, org: &Organization) -> Result<Organization, DbError> {
        sqlx::query(
            r#"
            INSERT INTO organizations (id, name, slug, description, address, lotus, phone, email, category_id, logo_file, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(org.id)
        .bind(&org.name)
        .bind(&org.slug)
        .bind(&org.description)
        .bind(&org.address)
        .bind(&org.lotus)
        .bind(&org.phone)
        .bind(&org.email)
        .bind(org.category_id)
        .bind(&org.logo_file)
        .bind(org.created_at)
        .bind(org.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(org.clone())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Organization>, DbError> {
        let row: Option<PgOrgRow> = sqlx::query_as(&format!(
            "SELECT {ORG_COLUMNS} FROM organizations WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Organization>, DbError> {
        let row: Option<PgOrgRow> = sqlx::query_as(&format!(
            "SELECT {ORG_COLUMNS} FROM organizations WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn list(
        &self,
        filter: &OrganizationFilter,
        pagination: &Pagination,
    ) -> Result<PaginatedResult<Organization>, DbError> {
        let (where_clause, params) = org_filter_clauses(filter, dollar);

        let count_query = format!("SELECT COUNT(*) FROM organizations{where_clause}");
        let mut count_q = sqlx::query_scalar::<_, i64>(&count_query);
        for p in &params {
            count_q = count_q.bind(p);
        }
        let total: i64 = count_q.fetch_one(&self.pool).await?;

        let limit_pos = params.len() + 1;
        let list_query = format!(
            "SELECT {ORG_COLUMNS} FROM organizations{where_clause} ORDER BY {} LIMIT ${limit_pos} OFFSET ${}",
            filter.order.order_by_clause(),
            limit_pos + 1
        );
        let mut list_q = sqlx::query_as::<_, PgOrgRow>(&list_query);
        for p in &params {
            list_q = list_q.bind(p);
        }
        let rows: Vec<PgOrgRow> = list_q
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

    async fn update(&self, id: Uuid, update: &OrganizationUpdate) -> Result<Organization, DbError> {
        let existing = self
            .get(id)
            .await?
            .ok_or_else(|| DbError::not_found("Organization", id))?;

        let name = update.name.as_ref().unwrap_or(&existing.name);
        let description = update
            .description
            .as_ref()
            .unwrap_or(&existing.description);
        let address = update.address.as_ref().unwrap_or(&existing.address);
        let lotus = update.lotus.as_ref().unwrap_or(&existing.lotus);
        let phone = update.phone.as_ref().unwrap_or(&existing.phone);
        let email = update.email.as_ref().unwrap_or(&existing.email);
        let category_id = update.category_id.unwrap_or(existing.category_id);
        let logo_file = match &update.logo_file {
            Some(v) => v.clone(),
            None => existing.logo_file.clone(),
        };

        sqlx::query(
            r#"
            UPDATE organizations SET name = $1, description = $2, address = $3, lotus = $4, phone = $5, email = $6, category_id = $7, logo_file = $8, updated_at = NOW()
            WHERE id = $9
            "#,
        )
        .bind(name)
        .bind(description)
        .bind(address)
        .bind(lotus)
        .bind(phone)
        .bind(email)
        .bind(category_id)
        .bind(&logo_file)
        .bind(id)
        .execute(&self.pool)
        .await?;

        self.get(id)
            .await?
            .ok_or_else(|| DbError::not_found("Organization", id))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM organizations WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_slugs(&self) -> Result<Vec<String>, DbError> {
        let slugs: Vec<String> = sqlx::query_scalar("SELECT slug FROM organizations")
            .fetch_all(&self.pool)
            .await?;
        Ok(slugs)
    }
}

/// Factory function to create the appropriate category repository.
pub fn create_category_repository(pool: &DbPool) -> Box<dyn CategoryRepository> {
    match pool {
        DbPool::Sqlite(pool) => Box::new(SqliteCategoryRepository::new(pool.clone())),
        DbPool::Postgres(pool) => Box::new(PgCategoryRepository::new(pool.clone())),
    }
}

/// Factory function to create the appropriate organization repository.
pub fn create_organization_repository(pool: &DbPool) -> Box<dyn OrganizationRepository> {
    match pool {
        DbPool::Sqlite(pool) => Box::new(SqliteOrganizationRepository::new(pool.clone())),
        DbPool::Postgres(pool) => Box::new(PgOrganizationRepository::new(pool.clone())),
    }
}

// Helper structs for SQLx row mapping

#[derive(sqlx::FromRow)]
struct SqliteCategoryRow {
    id: String,
    name: String,
    slug: String,
    description: String,
    badge: String,
    created_at: String,
}

impl TryFrom<SqliteCategoryRow> for Category {
    type Error = DbError;

    fn try_from(row: SqliteCategoryRow) -> Result<Self, Self::Error> {
        Ok(Category {
            id: parse_uuid(&row.id)?,
            name: row.name,
            slug: row.slug,
            description: row.description,
            badge: row.badge,
            created_at: parse_ts(&row.created_at)?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct SqliteCategoryCountRow {
    id: String,
    name: String,
    slug: String,
    description: String,
    badge: String,
    created_at: String,
    objects_count: i64,
    today_count: i64,
}

impl TryFrom<SqliteCategoryCountRow> for CategoryWithCounts {
    type Error = DbError;

    fn try_from(row: SqliteCategoryCountRow) -> Result<Self, Self::Error> {
        Ok(CategoryWithCounts {
            category: Category {
                id: parse_uuid(&row.id)?,
                name: row.name,
                slug: row.slug,
                description: row.description,
                badge: row.badge,
                created_at: parse_ts(&row.created_at)?,
            },
            objects_count: row.objects_count,
            today_count: row.today_count,
        })
    }
}

#[derive(sqlx::FromRow)]
struct PgCategoryRow {
    id: Uuid,
    name: String,
    slug: String,
    description: String,
    badge: String,
    created_at: DateTime<Utc>,
}

impl From<PgCategoryRow> for Category {
    fn from(row: PgCategoryRow) -> Self {
        Category {
            id: row.id,
            name: row.name,
            slug: row.slug,
            description: row.description,
            badge: row.badge,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PgCategoryCountRow {
    id: Uuid,
    name: String,
    slug: String,
    description: String,
    badge: String,
    created_at: DateTime<Utc>,
    objects_count: i64,
    today_count: i64,
}

impl From<PgCategoryCountRow> for CategoryWithCounts {
    fn from(row: PgCategoryCountRow) -> Self {
        CategoryWithCounts {
            category: Category {
                id: row.id,
                name: row.name,
                slug: row.slug,
                description: row.description,
                badge: row.badge,
                created_at: row.created_at,
            },
            objects_count: row.objects_count,
            today_count: row.today_count,
        }
    }
}

#[derive(sqlx::FromRow)]
struct SqliteOrgRow {
    id: String,
    name: String,
    slug: String,
    description: String,
    address: String,
    lotus: String,
    phone: String,
    email: String,
    category_id: String,
    logo_file: Option<String>,
    created_at: String,
    updated_at: String,
}

impl TryFrom<SqliteOrgRow> for Organization {
    type Error = DbError;

    fn try_from(row: SqliteOrgRow) -> Result<Self, Self::Error> {
        Ok(Organization {
            id: parse_uuid(&row.id)?,
            name: row.name,
            slug: row.slug,
            description: row.description,
            address: row.address,
            lotus: row.lotus,
            phone: row.phone,
            email: row.email,
            category_id: parse_uuid(&row.category_id)?,
            logo_file: row.logo_file,
            created_at: parse_ts(&row.created_at)?,
            updated_at: parse_ts(&row.updated_at)?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct PgOrgRow {
    id: Uuid,
    name: String,
    slug: String,
    description: String,
    address: String,
    lotus: String,
    phone: String,
    email: String,
    category_id: Uuid,
    logo_file: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PgOrgRow> for Organization {
    fn from(row: PgOrgRow) -> Self {
        Organization {
            id: row.id,
            name: row.name,
            slug: row.slug,
            description: row.description,
            address: row.address,
            lotus: row.lotus,
            phone: row.phone,
            email: row.email,
            category_id: row.category_id,
            logo_file: row.logo_file,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_clauses_number_pg_placeholders() {
        let filter = OrganizationFilter {
            category_slug: Some("banks".to_string()),
            search: Some("alpha".to_string()),
            ..Default::default()
        };
        let (clause, params) = org_filter_clauses(&filter, dollar);
        assert!(clause.contains("$1"));
        assert!(clause.contains("$7"));
        assert_eq!(params.len(), 7);
    }

    #[test]
    fn filter_clauses_empty_without_filters() {
        let (clause, params) = org_filter_clauses(&OrganizationFilter::default(), qmark);
        assert!(clause.is_empty());
        assert!(params.is_empty());
    }
}
