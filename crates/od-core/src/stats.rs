//! Statistics over the correspondence registries.
//!
//! Both aggregations are pure functions over data the repositories load in
//! one pass, so they are trivially testable without a database.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;
use uuid::Uuid;

/// A destination organization as seen by the stats aggregator.
#[derive(Debug, Clone, Serialize)]
pub struct OrgRef {
    pub id: Uuid,
    pub name: String,
}

/// One reply as seen by the stats aggregator. `organization_id` is `None`
/// when the reply came from an organization outside the letter's destination
/// list; such replies are kept in the registry but do not count here.
#[derive(Debug, Clone)]
pub struct ReplyForStats {
    pub organization_id: Option<Uuid>,
    pub received_date: NaiveDate,
}

/// A letter flattened for aggregation: its deadline, who it was sent to and
/// what came back.
#[derive(Debug, Clone)]
pub struct LetterForStats {
    pub id: Uuid,
    pub date: NaiveDate,
    pub deadline: Option<NaiveDate>,
    pub destinations: Vec<OrgRef>,
    pub replies: Vec<ReplyForStats>,
}

/// Per-organization reply discipline over a set of letters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrgReplyStats {
    pub organization_id: Uuid,
    pub organization_name: String,
    /// Letters with a deadline addressed to this organization.
    pub total: u64,
    /// Replies received on or before the deadline.
    pub on_time: u64,
    /// Replies received after the deadline.
    pub late: u64,
    /// Deadlined letters with no reply at all.
    pub no_reply: u64,
    /// `on_time / total`, rounded to three decimal places.
    pub on_time_ratio: f64,
}

#[derive(Default)]
struct OrgAccumulator {
    name: String,
    total: u64,
    on_time: u64,
    late: u64,
    no_reply: u64,
}

/// Aggregates reply discipline per destination organization.
///
/// Letters without a deadline are skipped entirely. For each deadlined
/// letter, each destination organization is judged by its earliest reply to
/// that letter: on or before the deadline counts as on-time, after it as
/// late, and no reply at all as no-reply. Results are sorted by on-time
/// ratio, best first.
pub fn aggregate_reply_stats(letters: &[LetterForStats]) -> Vec<OrgReplyStats> {
    let mut acc: BTreeMap<Uuid, OrgAccumulator> = BTreeMap::new();

    for letter in letters {
        let Some(deadline) = letter.deadline else {
            continue;
        };
        for dest in &letter.destinations {
            let entry = acc.entry(dest.id).or_default();
            if entry.name.is_empty() {
                entry.name = dest.name.clone();
            }
            entry.total += 1;

            let earliest = letter
                .replies
                .iter()
                .filter(|r| r.organization_id == Some(dest.id))
                .map(|r| r.received_date)
                .min();
            match earliest {
                Some(received) if received <= deadline => entry.on_time += 1,
                Some(_) => entry.late += 1,
                None => entry.no_reply += 1,
            }
        }
    }

    let mut rows: Vec<OrgReplyStats> = acc
        .into_iter()
        .map(|(id, a)| {
            let ratio = a.on_time as f64 / a.total.max(1) as f64;
            OrgReplyStats {
                organization_id: id,
                organization_name: a.name,
                total: a.total,
                on_time: a.on_time,
                late: a.late,
                no_reply: a.no_reply,
                on_time_ratio: round3(ratio),
            }
        })
        .collect();

    // Best ratio first; BTreeMap iteration keeps ties deterministic.
    rows.sort_by(|a, b| b.on_time_ratio.total_cmp(&a.on_time_ratio));
    rows
}

fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}

/// One calendar month worth of letters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthBucket {
    /// `YYYY-MM` label.
    pub month: String,
    pub year: i32,
    pub month_num: u32,
    pub count: u64,
}

/// Groups letter dates into per-month buckets, ascending. Months with no
/// letters are absent rather than zero-filled.
pub fn count_letters_by_month(dates: &[NaiveDate]) -> Vec<MonthBucket> {
    let mut buckets: BTreeMap<(i32, u32), u64> = BTreeMap::new();
    for date in dates {
        *buckets.entry((date.year(), date.month())).or_insert(0) += 1;
    }
    buckets
        .into_iter()
        .map(|((year, month_num), count)| MonthBucket {
            month: format!("{year:04}-{month_num:02}"),
            year,
            month_num,
            count,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn org(name: &str) -> OrgRef {
        OrgRef {
            id: Uuid::new_v4(),
            name: name.to_string(),
        }
    }

    fn reply(org_id: Uuid, date: NaiveDate) -> ReplyForStats {
        ReplyForStats {
            organization_id: Some(org_id),
            received_date: date,
        }
    }

    #[test]
    fn reply_before_deadline_is_on_time() {
        let dest = org("Alpha Bank");
        let letter = LetterForStats {
            id: Uuid::new_v4(),
            date: d(2025, 1, 1),
            deadline: Some(d(2025, 1, 10)),
            destinations: vec![dest.clone()],
            replies: vec![reply(dest.id, d(2025, 1, 9))],
        };
        let stats = aggregate_reply_stats(&[letter]);
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].on_time, 1);
        assert_eq!(stats[0].late, 0);
        assert_eq!(stats[0].no_reply, 0);
        assert_eq!(stats[0].on_time_ratio, 1.0);
    }

    #[test]
    fn reply_on_deadline_day_is_on_time() {
        let dest = org("Alpha Bank");
        let letter = LetterForStats {
            id: Uuid::new_v4(),
            date: d(2025, 1, 1),
            deadline: Some(d(2025, 1, 10)),
            destinations: vec![dest.clone()],
            replies: vec![reply(dest.id, d(2025, 1, 10))],
        };
        let stats = aggregate_reply_stats(&[letter]);
        assert_eq!(stats[0].on_time, 1);
    }

    #[test]
    fn earliest_reply_decides() {
        let dest = org("Alpha Bank");
        let letter = LetterForStats {
            id: Uuid::new_v4(),
            date: d(2025, 1, 1),
            deadline: Some(d(2025, 1, 10)),
            destinations: vec![dest.clone()],
            // A late duplicate must not override the earlier on-time reply.
            replies: vec![reply(dest.id, d(2025, 1, 15)), reply(dest.id, d(2025, 1, 8))],
        };
        let stats = aggregate_reply_stats(&[letter]);
        assert_eq!(stats[0].on_time, 1);
        assert_eq!(stats[0].late, 0);
    }

    #[test]
    fn letters_without_deadline_are_skipped() {
        let dest = org("Alpha Bank");
        let letter = LetterForStats {
            id: Uuid::new_v4(),
            date: d(2025, 1, 1),
            deadline: None,
            destinations: vec![dest.clone()],
            replies: vec![reply(dest.id, d(2025, 1, 2))],
        };
        assert!(aggregate_reply_stats(&[letter]).is_empty());
    }

    #[test]
    fn out_of_list_replies_do_not_count() {
        let dest = org("Alpha Bank");
        let letter = LetterForStats {
            id: Uuid::new_v4(),
            date: d(2025, 1, 1),
            deadline: Some(d(2025, 1, 10)),
            destinations: vec![dest.clone()],
            replies: vec![ReplyForStats {
                organization_id: None,
                received_date: d(2025, 1, 5),
            }],
        };
        let stats = aggregate_reply_stats(&[letter]);
        assert_eq!(stats[0].no_reply, 1);
        assert_eq!(stats[0].on_time, 0);
    }

    #[test]
    fn mixed_outcomes_sorted_by_ratio() {
        let good = org("Good Bank");
        let bad = org("Silent Bank");
        let letters = vec![
            LetterForStats {
                id: Uuid::new_v4(),
                date: d(2025, 2, 1),
                deadline: Some(d(2025, 2, 10)),
                destinations: vec![good.clone(), bad.clone()],
                replies: vec![reply(good.id, d(2025, 2, 5))],
            },
            LetterForStats {
                id: Uuid::new_v4(),
                date: d(2025, 3, 1),
                deadline: Some(d(2025, 3, 10)),
                destinations: vec![good.clone(), bad.clone()],
                replies: vec![reply(good.id, d(2025, 3, 20)), reply(bad.id, d(2025, 3, 30))],
            },
        ];
        let stats = aggregate_reply_stats(&letters);
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].organization_name, "Good Bank");
        assert_eq!(stats[0].on_time, 1);
        assert_eq!(stats[0].late, 1);
        assert_eq!(stats[0].on_time_ratio, 0.5);
        assert_eq!(stats[1].organization_name, "Silent Bank");
        assert_eq!(stats[1].no_reply, 1);
        assert_eq!(stats[1].late, 1);
        assert_eq!(stats[1].on_time_ratio, 0.0);
    }

    #[test]
    fn ratio_rounds_to_three_decimals() {
        let dest = org("Third Bank");
        let mut letters = Vec::new();
        for i in 0..3 {
            let replies = if i == 0 {
                vec![reply(dest.id, d(2025, 1, 5))]
            } else {
                Vec::new()
            };
            letters.push(LetterForStats {
                id: Uuid::new_v4(),
                date: d(2025, 1, 1),
                deadline: Some(d(2025, 1, 10)),
                destinations: vec![dest.clone()],
                replies,
            });
        }
        let stats = aggregate_reply_stats(&letters);
        assert_eq!(stats[0].on_time_ratio, 0.333);
    }

    #[test]
    fn months_grouped_ascending() {
        let dates = vec![
            d(2025, 2, 14),
            d(2025, 1, 3),
            d(2025, 1, 20),
            d(2024, 12, 31),
        ];
        let buckets = count_letters_by_month(&dates);
        assert_eq!(buckets.len(), 3);
        assert_eq!(buckets[0].month, "2024-12");
        assert_eq!(buckets[0].count, 1);
        assert_eq!(buckets[1].month, "2025-01");
        assert_eq!(buckets[1].count, 2);
        assert_eq!(buckets[2].month, "2025-02");
        assert_eq!(buckets[2].year, 2025);
        assert_eq!(buckets[2].month_num, 2);
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(count_letters_by_month(&[]).is_empty());
        assert!(aggregate_reply_stats(&[]).is_empty());
    }
}
