//! Organization and category directory models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A grouping of organizations (e.g. "Banks", "Insurers").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    /// URL-safe identifier, generated once on create.
    pub slug: String,
    pub description: String,
    /// Short display label used by the frontend.
    pub badge: String,
    pub created_at: DateTime<Utc>,
}

impl Category {
    pub fn new(name: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            slug: slug.into(),
            description: String::new(),
            badge: String::new(),
            created_at: Utc::now(),
        }
    }
}

/// A category together with its aggregate counts, as returned by listings.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryWithCounts {
    #[serde(flatten)]
    pub category: Category,
    /// Total organizations in this category.
    pub objects_count: i64,
    /// Organizations created today.
    pub today_count: i64,
}

/// Partial update for a category. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct CategoryUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub badge: Option<String>,
}

/// A tracked organization.
///
/// The slug is generated once from the name and never changes afterwards,
/// even if the organization is renamed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub address: String,
    /// Lotus Notes address (legacy internal mail system).
    pub lotus: String,
    pub phone: String,
    pub email: String,
    pub category_id: Uuid,
    /// Stored logo file name; byte storage is handled elsewhere.
    pub logo_file: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Organization {
    pub fn new(name: impl Into<String>, slug: impl Into<String>, category_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            slug: slug.into(),
            description: String::new(),
            address: String::new(),
            lotus: String::new(),
            phone: String::new(),
            email: String::new(),
            category_id,
            logo_file: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update for an organization. The slug is deliberately absent.
#[derive(Debug, Clone, Default)]
pub struct OrganizationUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
    pub lotus: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub category_id: Option<Uuid>,
    pub logo_file: Option<Option<String>>,
}

/// Sort order for organization listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrganizationOrder {
    #[default]
    CreatedDesc,
    UpdatedDesc,
    NameAsc,
}

impl OrganizationOrder {
    /// Parses the `ordering` query value; unknown values fall back to default.
    pub fn parse(s: &str) -> Self {
        match s {
            "updated" | "-updated" => OrganizationOrder::UpdatedDesc,
            "name" => OrganizationOrder::NameAsc,
            _ => OrganizationOrder::CreatedDesc,
        }
    }

    pub fn order_by_clause(&self) -> &'static str {
        match self {
            OrganizationOrder::CreatedDesc => "created_at DESC",
            OrganizationOrder::UpdatedDesc => "updated_at DESC",
            OrganizationOrder::NameAsc => "name ASC",
        }
    }
}

/// Filter for organization listings.
#[derive(Debug, Clone, Default)]
pub struct OrganizationFilter {
    /// Restrict to a category by slug.
    pub category_slug: Option<String>,
    /// Substring search over name, description, address, lotus, phone, email.
    pub search: Option<String>,
    pub order: OrganizationOrder,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn organization_new_sets_identity() {
        let cat = Uuid::new_v4();
        let org = Organization::new("Central Bank", "central-bank", cat);
        assert_eq!(org.slug, "central-bank");
        assert_eq!(org.category_id, cat);
        assert_eq!(org.created_at, org.updated_at);
    }

    #[test]
    fn organization_order_parse() {
        assert_eq!(
            OrganizationOrder::parse("updated"),
            OrganizationOrder::UpdatedDesc
        );
        assert_eq!(OrganizationOrder::parse("name"), OrganizationOrder::NameAsc);
        assert_eq!(
            OrganizationOrder::parse("bogus"),
            OrganizationOrder::CreatedDesc
        );
    }
}
