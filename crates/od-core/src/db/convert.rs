//! Parsing helpers for SQLite rows, where UUIDs, dates and timestamps are
//! stored as TEXT.

use super::DbError;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

pub(crate) fn parse_uuid(s: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(s).map_err(|e| DbError::Serialization(format!("Invalid UUID: {}", e)))
}

pub(crate) fn parse_opt_uuid(s: Option<&str>) -> Result<Option<Uuid>, DbError> {
    s.map(parse_uuid).transpose()
}

pub(crate) fn parse_ts(s: &str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DbError::Serialization(format!("Invalid timestamp: {}", e)))
}

pub(crate) fn parse_date(s: &str) -> Result<NaiveDate, DbError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| DbError::Serialization(format!("Invalid date: {}", e)))
}

pub(crate) fn parse_opt_date(s: Option<&str>) -> Result<Option<NaiveDate>, DbError> {
    s.map(parse_date).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_round_tripped_values() {
        let id = Uuid::new_v4();
        assert_eq!(parse_uuid(&id.to_string()).unwrap(), id);

        let now = Utc::now();
        assert_eq!(parse_ts(&now.to_rfc3339()).unwrap(), now);

        assert_eq!(
            parse_date("2025-03-01").unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
        );
        assert!(parse_date("01.03.2025").is_err());
        assert_eq!(parse_opt_date(None).unwrap(), None);
        assert_eq!(parse_opt_uuid(None).unwrap(), None);
    }
}
