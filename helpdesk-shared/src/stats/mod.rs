//! Help desk statistics
//!
//! Five aggregations over tickets and computers, collected together into a
//! [`StatisticsReport`] for the statistics page and the `.xlsx` export.
//!
//! # Example
//!
//! ```no_run
//! use helpdesk_shared::stats::{StatisticsReport, TimeRange};
//! use sqlx::PgPool;
//!
//! # async fn example(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
//! let report = StatisticsReport::collect(&pool, TimeRange::Last7Days, 7).await?;
//! println!("{} tickets resolved this week", report.response_times.tickets_resolved);
//! # Ok(())
//! # }
//! ```

pub mod backlog;
pub mod export;
pub mod queries;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::models::ticket::{TicketPriority, TicketStatus, TicketType};

pub use backlog::BacklogBucket;

/// Default backlog bucket width, in days
pub const DEFAULT_BACKLOG_CUTOFF_DAYS: i64 = 7;

/// Widest accepted backlog bucket, ten years
pub const MAX_BACKLOG_CUTOFF_DAYS: i64 = 3650;

/// Look-back window for the time-bound aggregations
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeRange {
    #[serde(rename = "7d")]
    Last7Days,
    #[default]
    #[serde(rename = "30d")]
    Last30Days,
    #[serde(rename = "90d")]
    Last90Days,
}

impl TimeRange {
    pub fn days(&self) -> i64 {
        match self {
            TimeRange::Last7Days => 7,
            TimeRange::Last30Days => 30,
            TimeRange::Last90Days => 90,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeRange::Last7Days => "7d",
            TimeRange::Last30Days => "30d",
            TimeRange::Last90Days => "90d",
        }
    }

    /// Start of the window ending at `now`
    pub fn start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::days(self.days())
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "7d" => Ok(TimeRange::Last7Days),
            "30d" => Ok(TimeRange::Last30Days),
            "90d" => Ok(TimeRange::Last90Days),
            other => Err(format!("Invalid time range: {}", other)),
        }
    }
}

/// Ticket count for one status/priority/type combination
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TicketStat {
    pub status: TicketStatus,
    pub priority: TicketPriority,
    #[serde(rename = "type")]
    pub ticket_type: TicketType,
    pub count: i64,
}

/// Durations in hours; None when there is nothing to average
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ResponseTimes {
    pub avg_first_response_hours: Option<f64>,
    pub avg_resolution_hours: Option<f64>,
    pub tickets_resolved: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TechnicianStat {
    pub technician_id: Uuid,
    pub technician_name: String,
    pub tickets_assigned: i64,
    pub tickets_resolved: i64,
    pub avg_resolution_hours: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputerStats {
    pub total_computers: i64,
    pub active_computers: i64,
    pub in_maintenance: i64,
    pub retired_computers: i64,
    pub unassigned_computers: i64,
    pub computers_by_type: BTreeMap<String, i64>,
    pub computers_by_department: BTreeMap<String, i64>,
}

/// Everything the statistics page shows
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatisticsReport {
    pub time_range: TimeRange,
    pub backlog_cutoff_days: i64,
    pub generated_at: DateTime<Utc>,
    pub ticket_stats: Vec<TicketStat>,
    pub response_times: ResponseTimes,
    pub technician_stats: Vec<TechnicianStat>,
    pub computer_stats: ComputerStats,
    pub backlog_stats: Vec<BacklogBucket>,
}

impl StatisticsReport {
    /// Runs all five aggregations
    ///
    /// `backlog_cutoff_days` must be at least 1.
    pub async fn collect(
        pool: &PgPool,
        time_range: TimeRange,
        backlog_cutoff_days: i64,
    ) -> Result<Self, sqlx::Error> {
        let now = Utc::now();
        let start = time_range.start(now);

        let ticket_stats = queries::ticket_stats(pool, start).await?;
        let response_times = queries::response_times(pool, start).await?;
        let technician_stats = queries::technician_stats(pool, start).await?;
        let computer_stats = queries::computer_stats(pool).await?;
        let active = queries::active_ticket_ages(pool).await?;
        let backlog_stats = backlog::bucket_backlog(&active, backlog_cutoff_days, now);

        tracing::debug!(
            time_range = %time_range,
            backlog_cutoff_days,
            "Collected statistics"
        );

        Ok(Self {
            time_range,
            backlog_cutoff_days,
            generated_at: now,
            ticket_stats,
            response_times,
            technician_stats,
            computer_stats,
            backlog_stats,
        })
    }

    /// Sum of all ticket stat counts
    pub fn total_tickets(&self) -> i64 {
        self.ticket_stats.iter().map(|s| s.count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_range_parsing() {
        assert_eq!("7d".parse::<TimeRange>(), Ok(TimeRange::Last7Days));
        assert_eq!("90d".parse::<TimeRange>(), Ok(TimeRange::Last90Days));
        assert!("1y".parse::<TimeRange>().is_err());
        assert_eq!(TimeRange::default(), TimeRange::Last30Days);
    }

    #[test]
    fn test_time_range_serde_uses_short_form() {
        assert_eq!(serde_json::to_string(&TimeRange::Last7Days).unwrap(), "\"7d\"");
        let parsed: TimeRange = serde_json::from_str("\"90d\"").unwrap();
        assert_eq!(parsed, TimeRange::Last90Days);
    }

    #[test]
    fn test_time_range_start() {
        let now = Utc::now();
        assert_eq!(now - TimeRange::Last30Days.start(now), Duration::days(30));
    }
}
