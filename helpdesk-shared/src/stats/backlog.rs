//! Backlog age buckets

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::ticket::{TicketPriority, TicketType};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ActiveTicket {
    pub created_at: DateTime<Utc>,
    pub priority: TicketPriority,
    pub ticket_type: TicketType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BacklogBucket {
    pub age_range: String,
    pub ticket_count: i64,
    pub priority_breakdown: BTreeMap<String, i64>,
    pub type_breakdown: BTreeMap<String, i64>,
}

impl BacklogBucket {
    fn empty(age_range: String) -> Self {
        Self {
            age_range,
            ticket_count: 0,
            priority_breakdown: BTreeMap::new(),
            type_breakdown: BTreeMap::new(),
        }
    }

    fn add(&mut self, ticket: &ActiveTicket) {
        self.ticket_count += 1;
        *self
            .priority_breakdown
            .entry(ticket.priority.as_str().to_string())
            .or_default() += 1;
        *self
            .type_breakdown
            .entry(ticket.ticket_type.as_str().to_string())
            .or_default() += 1;
    }
}

/// Splits active tickets into `0-c`, `c-2c` and `2c+` day buckets
///
/// Age is counted in whole days. All three buckets are always returned, in
/// age order. A cutoff below 1 is treated as 1.
pub fn bucket_backlog(
    tickets: &[ActiveTicket],
    cutoff_days: i64,
    now: DateTime<Utc>,
) -> Vec<BacklogBucket> {
    let c = cutoff_days.max(1);
    let double = c.saturating_mul(2);
    let mut buckets = [
        BacklogBucket::empty(format!("0-{} days", c)),
        BacklogBucket::empty(format!("{}-{} days", c, double)),
        BacklogBucket::empty(format!("{}+ days", double)),
    ];

    for ticket in tickets {
        let age = (now - ticket.created_at).num_days().max(0);
        let idx = if age < c {
            0
        } else if age < double {
            1
        } else {
            2
        };
        buckets[idx].add(ticket);
    }

    buckets.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn ticket(now: DateTime<Utc>, age_days: i64, priority: TicketPriority) -> ActiveTicket {
        ActiveTicket {
            created_at: now - Duration::days(age_days) - Duration::minutes(1),
            priority,
            ticket_type: TicketType::Incident,
        }
    }

    #[test]
    fn test_bucket_labels_and_edges() {
        let now = Utc::now();
        let tickets = vec![
            ticket(now, 0, TicketPriority::Low),
            ticket(now, 6, TicketPriority::High),
            ticket(now, 7, TicketPriority::High),
            ticket(now, 13, TicketPriority::Critical),
            ticket(now, 14, TicketPriority::Critical),
            ticket(now, 400, TicketPriority::Medium),
        ];

        let buckets = bucket_backlog(&tickets, 7, now);

        let labels: Vec<_> = buckets.iter().map(|b| b.age_range.as_str()).collect();
        assert_eq!(labels, vec!["0-7 days", "7-14 days", "14+ days"]);

        let counts: Vec<_> = buckets.iter().map(|b| b.ticket_count).collect();
        assert_eq!(counts, vec![2, 2, 2]);

        assert_eq!(buckets[0].priority_breakdown.get("low"), Some(&1));
        assert_eq!(buckets[0].priority_breakdown.get("high"), Some(&1));
        assert_eq!(buckets[2].type_breakdown.get("incident"), Some(&2));
    }

    #[test]
    fn test_empty_backlog_still_has_three_buckets() {
        let buckets = bucket_backlog(&[], 3, Utc::now());
        assert_eq!(buckets.len(), 3);
        assert!(buckets.iter().all(|b| b.ticket_count == 0));
        assert_eq!(buckets[2].age_range, "6+ days");
    }

    #[test]
    fn test_non_positive_cutoff_is_clamped() {
        let buckets = bucket_backlog(&[], 0, Utc::now());
        assert_eq!(buckets[0].age_range, "0-1 days");
    }

    #[test]
    fn test_huge_cutoff_saturates() {
        let now = Utc::now();
        let cutoff = i64::MAX / 2 + 1;
        let buckets = bucket_backlog(&[ticket(now, 400, TicketPriority::Low)], cutoff, now);

        assert_eq!(buckets[1].age_range, format!("{}-{} days", cutoff, i64::MAX));
        assert_eq!(buckets[2].age_range, format!("{}+ days", i64::MAX));
        assert_eq!(buckets[0].ticket_count, 1);
    }
}
