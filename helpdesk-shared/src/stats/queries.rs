//! Aggregation queries
//!
//! Windows are half-open on the left: tickets created at or after `start`.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::backlog::ActiveTicket;
use super::{ComputerStats, ResponseTimes, TechnicianStat, TicketStat};

pub async fn ticket_stats(
    pool: &PgPool,
    start: DateTime<Utc>,
) -> Result<Vec<TicketStat>, sqlx::Error> {
    sqlx::query_as::<_, TicketStat>(
        r#"
        SELECT status, priority, type AS ticket_type, COUNT(*) AS count
        FROM tickets
        WHERE created_at >= $1
        GROUP BY status, priority, type
        ORDER BY status, priority DESC, type
        "#,
    )
    .bind(start)
    .fetch_all(pool)
    .await
}

/// First response is the earliest comment by anyone but the requestor
pub async fn response_times(
    pool: &PgPool,
    start: DateTime<Utc>,
) -> Result<ResponseTimes, sqlx::Error> {
    sqlx::query_as::<_, ResponseTimes>(
        r#"
        WITH scoped AS (
            SELECT id, requestor_id, created_at, resolved_at
            FROM tickets
            WHERE created_at >= $1
        ),
        first_responses AS (
            SELECT MIN(c.created_at) - s.created_at AS waited
            FROM scoped s
            JOIN ticket_comments c ON c.ticket_id = s.id AND c.user_id <> s.requestor_id
            GROUP BY s.id, s.created_at
        )
        SELECT
            (SELECT (EXTRACT(EPOCH FROM AVG(waited)) / 3600.0)::float8
               FROM first_responses) AS avg_first_response_hours,
            (SELECT (EXTRACT(EPOCH FROM AVG(resolved_at - created_at)) / 3600.0)::float8
               FROM scoped WHERE resolved_at IS NOT NULL) AS avg_resolution_hours,
            (SELECT COUNT(*) FROM scoped WHERE resolved_at IS NOT NULL) AS tickets_resolved
        "#,
    )
    .bind(start)
    .fetch_one(pool)
    .await
}

/// One row per technician or admin, including those with no tickets
pub async fn technician_stats(
    pool: &PgPool,
    start: DateTime<Utc>,
) -> Result<Vec<TechnicianStat>, sqlx::Error> {
    sqlx::query_as::<_, TechnicianStat>(
        r#"
        SELECT
            u.id AS technician_id,
            u.full_name AS technician_name,
            COUNT(t.id) AS tickets_assigned,
            COUNT(t.id) FILTER (WHERE t.resolved_at IS NOT NULL) AS tickets_resolved,
            (EXTRACT(EPOCH FROM AVG(t.resolved_at - t.created_at)) / 3600.0)::float8
                AS avg_resolution_hours
        FROM users u
        LEFT JOIN tickets t ON t.assigned_to = u.id AND t.created_at >= $1
        WHERE u.role IN ('technician', 'admin')
        GROUP BY u.id, u.full_name
        ORDER BY tickets_assigned DESC, u.full_name
        "#,
    )
    .bind(start)
    .fetch_all(pool)
    .await
}

#[derive(sqlx::FromRow)]
struct ComputerTotals {
    total: i64,
    active: i64,
    maintenance: i64,
    retired: i64,
    unassigned: i64,
}

pub async fn computer_stats(pool: &PgPool) -> Result<ComputerStats, sqlx::Error> {
    let totals = sqlx::query_as::<_, ComputerTotals>(
        r#"
        SELECT
            COUNT(*) AS total,
            COUNT(*) FILTER (WHERE status = 'active') AS active,
            COUNT(*) FILTER (WHERE status = 'maintenance') AS maintenance,
            COUNT(*) FILTER (WHERE status = 'retired') AS retired,
            COUNT(*) FILTER (WHERE assigned_to IS NULL) AS unassigned
        FROM computer_assets
        "#,
    )
    .fetch_one(pool)
    .await?;

    let by_type: Vec<(String, i64)> = sqlx::query_as(
        "SELECT type::text, COUNT(*) FROM computer_assets GROUP BY type",
    )
    .fetch_all(pool)
    .await?;

    let by_department: Vec<(String, i64)> = sqlx::query_as(
        r#"
        SELECT COALESCE(NULLIF(TRIM(department), ''), 'Unassigned'), COUNT(*)
        FROM computer_assets
        GROUP BY 1
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(ComputerStats {
        total_computers: totals.total,
        active_computers: totals.active,
        in_maintenance: totals.maintenance,
        retired_computers: totals.retired,
        unassigned_computers: totals.unassigned,
        computers_by_type: by_type.into_iter().collect(),
        computers_by_department: by_department.into_iter().collect(),
    })
}

/// Open and in-progress tickets, for backlog bucketing
pub async fn active_ticket_ages(pool: &PgPool) -> Result<Vec<ActiveTicket>, sqlx::Error> {
    sqlx::query_as::<_, ActiveTicket>(
        r#"
        SELECT created_at, priority, type AS ticket_type
        FROM tickets
        WHERE status IN ('open', 'in_progress')
        "#,
    )
    .fetch_all(pool)
    .await
}
