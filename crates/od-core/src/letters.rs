//! Correspondence registries.
//!
//! Two parallel trackers: certification letters ("cert"), which carry
//! deadlines, destination organizations and per-organization reply
//! timeliness, and external letters, a simpler categorized inbound/outbound
//! log.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A certification letter sent out to one or more organizations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertLetter {
    pub id: Uuid,
    /// Issuing system label; currently always `"CERT-CBU"`.
    pub system: String,
    pub number: String,
    /// Date the letter went out, the axis for monthly stats.
    pub date: NaiveDate,
    pub subject: String,
    pub description: String,
    /// Free-form name of whoever is responsible for follow-up.
    pub performer: String,
    pub has_deadline: bool,
    pub deadline: Option<NaiveDate>,
    /// When false, replies are not tracked and the letter is invisible to
    /// the timeliness stats.
    pub need_replies: bool,
    pub created_by: Option<Uuid>,
    pub updated_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CertLetter {
    pub fn new(number: impl Into<String>, date: NaiveDate) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            system: "CERT-CBU".to_string(),
            number: number.into(),
            date,
            subject: String::new(),
            description: String::new(),
            performer: String::new(),
            has_deadline: false,
            deadline: None,
            need_replies: true,
            created_by: None,
            updated_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Deadline as the stats see it: set only when both the flag and the
    /// date are present.
    pub fn effective_deadline(&self) -> Option<NaiveDate> {
        if self.has_deadline {
            self.deadline
        } else {
            None
        }
    }
}

/// Partial update for a cert letter.
#[derive(Debug, Clone, Default)]
pub struct CertLetterUpdate {
    pub number: Option<String>,
    pub date: Option<NaiveDate>,
    pub subject: Option<String>,
    pub description: Option<String>,
    pub performer: Option<String>,
    pub has_deadline: Option<bool>,
    pub deadline: Option<Option<NaiveDate>>,
    pub need_replies: Option<bool>,
    /// Full replacement of the destination set when present.
    pub dest_organization_ids: Option<Vec<Uuid>>,
}

/// Filter for cert letter listings.
#[derive(Debug, Clone, Default)]
pub struct CertLetterFilter {
    pub search: Option<String>,
    pub has_deadline: Option<bool>,
    pub need_replies: Option<bool>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub organization_id: Option<Uuid>,
}

/// Attachment metadata for a cert letter; bytes live in external storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertLetterFile {
    pub id: Uuid,
    pub letter_id: Uuid,
    /// Storage key under which the bytes were saved.
    pub file_name: String,
    pub original_name: String,
    pub uploaded_at: DateTime<Utc>,
}

/// A reply from one organization to one cert letter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertLetterReply {
    pub id: Uuid,
    pub letter_id: Uuid,
    /// `None` when the reply came from an organization outside the letter's
    /// destination list; stored, but excluded from timeliness stats.
    pub organization_id: Option<Uuid>,
    pub reply_number: String,
    pub internal_number: String,
    pub file_name: Option<String>,
    /// Official receipt date, the one compared against the deadline.
    pub received_date: NaiveDate,
    pub added_by: Option<Uuid>,
    pub added_at: DateTime<Utc>,
}

impl CertLetterReply {
    pub fn new(letter_id: Uuid, organization_id: Option<Uuid>, received_date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            letter_id,
            organization_id,
            reply_number: String::new(),
            internal_number: String::new(),
            file_name: None,
            received_date,
            added_by: None,
            added_at: Utc::now(),
        }
    }
}

/// Partial update for a cert letter reply.
#[derive(Debug, Clone, Default)]
pub struct CertLetterReplyUpdate {
    pub organization_id: Option<Option<Uuid>>,
    pub reply_number: Option<String>,
    pub internal_number: Option<String>,
    pub file_name: Option<Option<String>>,
    pub received_date: Option<NaiveDate>,
}

/// A category of external letters, with its own slug namespace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalLettersCategory {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub badge: String,
    pub created_at: DateTime<Utc>,
}

impl ExternalLettersCategory {
    pub fn new(name: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            slug: slug.into(),
            badge: String::new(),
            created_at: Utc::now(),
        }
    }
}

/// An entry in the external letter log.
///
/// The slug is derived once from the title plus a random 8-hex tail and
/// never changes on update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalLetter {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: String,
    /// Inbound/outbound registration number.
    pub letter_number: String,
    pub internal_letter_number: String,
    pub executor: String,
    pub category_id: Uuid,
    pub file_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ExternalLetter {
    pub fn new(title: impl Into<String>, slug: impl Into<String>, category_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            slug: slug.into(),
            description: String::new(),
            letter_number: String::new(),
            internal_letter_number: String::new(),
            executor: String::new(),
            category_id,
            file_name: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update for an external letter. The slug is deliberately absent.
#[derive(Debug, Clone, Default)]
pub struct ExternalLetterUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub letter_number: Option<String>,
    pub internal_letter_number: Option<String>,
    pub executor: Option<String>,
    pub category_id: Option<Uuid>,
    pub file_name: Option<Option<String>>,
}

/// Filter for external letter listings.
#[derive(Debug, Clone, Default)]
pub struct ExternalLetterFilter {
    pub category_slug: Option<String>,
    /// Substring search over title, description and both numbers.
    pub search: Option<String>,
}

/// A reply logged against an external letter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalLetterReply {
    pub id: Uuid,
    pub letter_id: Uuid,
    pub reply_number: String,
    pub internal_number: String,
    pub file_name: Option<String>,
    pub sent_date: NaiveDate,
    pub added_by: Option<Uuid>,
    pub added_at: DateTime<Utc>,
}

impl ExternalLetterReply {
    pub fn new(letter_id: Uuid, sent_date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            letter_id,
            reply_number: String::new(),
            internal_number: String::new(),
            file_name: None,
            sent_date,
            added_by: None,
            added_at: Utc::now(),
        }
    }
}

/// Partial update for an external letter reply.
#[derive(Debug, Clone, Default)]
pub struct ExternalLetterReplyUpdate {
    pub reply_number: Option<String>,
    pub internal_number: Option<String>,
    pub file_name: Option<Option<String>>,
    pub sent_date: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn new_letter_defaults() {
        let letter = CertLetter::new("12/345", d(2025, 3, 1));
        assert_eq!(letter.system, "CERT-CBU");
        assert!(letter.need_replies);
        assert!(!letter.has_deadline);
        assert_eq!(letter.effective_deadline(), None);
    }

    #[test]
    fn effective_deadline_requires_flag_and_date() {
        let mut letter = CertLetter::new("1", d(2025, 3, 1));
        letter.deadline = Some(d(2025, 3, 10));
        assert_eq!(letter.effective_deadline(), None);
        letter.has_deadline = true;
        assert_eq!(letter.effective_deadline(), Some(d(2025, 3, 10)));
        letter.deadline = None;
        assert_eq!(letter.effective_deadline(), None);
    }
}
