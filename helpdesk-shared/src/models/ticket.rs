/// Ticket model and database operations
///
/// A ticket is an incident or service request filed by a requestor. Tickets
/// move through `open -> in_progress -> resolved -> closed`, may be reopened,
/// and every status change leaves a system comment behind.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE ticket_type AS ENUM ('incident', 'request');
/// CREATE TYPE ticket_priority AS ENUM ('low', 'medium', 'high', 'critical');
/// CREATE TYPE ticket_status AS ENUM ('open', 'in_progress', 'resolved', 'closed');
///
/// CREATE TABLE tickets (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     title VARCHAR(255) NOT NULL,
///     description TEXT NOT NULL,
///     type ticket_type NOT NULL,
///     priority ticket_priority NOT NULL,
///     status ticket_status NOT NULL DEFAULT 'open',
///     category_id UUID NOT NULL REFERENCES ticket_categories(id),
///     requestor_id UUID NOT NULL REFERENCES users(id),
///     created_by UUID REFERENCES users(id),
///     assigned_to UUID REFERENCES users(id),
///     assigned_date TIMESTAMPTZ,
///     resolved_at TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use helpdesk_shared::models::ticket::{Ticket, TicketFilter, TicketStatus};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let filter = TicketFilter {
///     status: Some(TicketStatus::Open),
///     search: Some("printer".to_string()),
///     ..Default::default()
/// };
///
/// for ticket in Ticket::list(&pool, &filter).await? {
///     println!("[{}] {}", ticket.priority, ticket.title);
/// }
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::assignment::{AssignmentEntry, AssignmentTarget};
use super::ticket_comment::{CommentWithAuthor, TicketComment};

/// Default look-back window for ticket lists, in days
pub const DEFAULT_LIST_DAYS: i32 = 30;

/// Longest look-back window, a century; larger requests are clamped to it
pub const MAX_LIST_DAYS: i32 = 36_500;

/// Number of tickets shown in the dashboard's urgent list
pub const DASHBOARD_URGENT_LIMIT: i64 = 5;

/// Incident (something broke) or request (something is wanted)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "ticket_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TicketType {
    Incident,
    Request,
}

impl TicketType {
    pub const ALL: [TicketType; 2] = [TicketType::Incident, TicketType::Request];

    pub fn as_str(&self) -> &'static str {
        match self {
            TicketType::Incident => "incident",
            TicketType::Request => "request",
        }
    }
}

/// Ticket urgency
///
/// Variants are declared in severity order; the PostgreSQL enum follows the
/// same order, so `ORDER BY priority DESC` lists critical tickets first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "ticket_priority", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TicketPriority {
    Low,
    Medium,
    High,
    Critical,
}

impl TicketPriority {
    pub const ALL: [TicketPriority; 4] = [
        TicketPriority::Low,
        TicketPriority::Medium,
        TicketPriority::High,
        TicketPriority::Critical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TicketPriority::Low => "low",
            TicketPriority::Medium => "medium",
            TicketPriority::High => "high",
            TicketPriority::Critical => "critical",
        }
    }
}

/// Ticket lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "ticket_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    /// Filed, nobody has started on it
    Open,
    /// Being worked
    InProgress,
    /// Fix delivered, awaiting confirmation
    Resolved,
    /// Done
    Closed,
}

impl TicketStatus {
    pub const ALL: [TicketStatus; 4] = [
        TicketStatus::Open,
        TicketStatus::InProgress,
        TicketStatus::Resolved,
        TicketStatus::Closed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Open => "open",
            TicketStatus::InProgress => "in_progress",
            TicketStatus::Resolved => "resolved",
            TicketStatus::Closed => "closed",
        }
    }

    /// Human form, e.g. "in progress"
    pub fn label(&self) -> String {
        self.as_str().replace('_', " ")
    }

    /// Open and in-progress tickets count towards the backlog
    pub fn is_active(&self) -> bool {
        matches!(self, TicketStatus::Open | TicketStatus::InProgress)
    }

    /// Resolved and closed tickets carry a `resolved_at` timestamp
    pub fn is_finished(&self) -> bool {
        !self.is_active()
    }
}

macro_rules! text_enum {
    ($ty:ty) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim().to_ascii_lowercase();
                <$ty>::ALL
                    .into_iter()
                    .find(|v| v.as_str() == wanted)
                    .ok_or_else(|| s.to_string())
            }
        }
    };
}

text_enum!(TicketType);
text_enum!(TicketPriority);
text_enum!(TicketStatus);

/// Ticket row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Ticket {
    pub id: Uuid,
    pub title: String,
    pub description: String,

    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub ticket_type: TicketType,

    pub priority: TicketPriority,
    pub status: TicketStatus,
    pub category_id: Uuid,

    /// Who the ticket is for
    pub requestor_id: Uuid,

    /// Who filed it; differs from the requestor when staff file on someone's behalf
    pub created_by: Option<Uuid>,

    /// Current assignee, mirrored by the open row in the assignment history
    pub assigned_to: Option<Uuid>,
    pub assigned_date: Option<DateTime<Utc>>,

    /// Set when the ticket reaches resolved or closed, cleared on reopen
    pub resolved_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Ticket joined with the names needed for lists and detail views
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TicketSummary {
    pub id: Uuid,
    pub title: String,
    pub description: String,

    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub ticket_type: TicketType,

    pub priority: TicketPriority,
    pub status: TicketStatus,
    pub category_id: Uuid,
    pub category_name: String,
    pub requestor_id: Uuid,
    pub requestor_name: String,
    pub requestor_email: String,
    pub assigned_to: Option<Uuid>,
    pub assignee_name: Option<String>,
    pub assigned_date: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTicket {
    pub title: String,
    pub description: String,
    pub ticket_type: TicketType,
    pub priority: TicketPriority,
    pub category_id: Uuid,
    pub requestor_id: Uuid,
    pub created_by: Uuid,
}

/// Ticket list filter
///
/// Every field narrows the result; set fields combine with AND.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TicketFilter {
    pub status: Option<TicketStatus>,
    pub priority: Option<TicketPriority>,
    pub category_id: Option<Uuid>,
    pub requestor_id: Option<Uuid>,
    pub assigned_to: Option<Uuid>,

    /// Only tickets created within this many days; None means the default
    /// window, `Some(0)` means no limit; capped at [`MAX_LIST_DAYS`]
    pub days: Option<i32>,

    /// Case-insensitive text matched against title, requestor and assignee names
    pub search: Option<String>,
}

impl TicketFilter {
    /// Effective look-back window, None when unlimited
    pub fn window_days(&self) -> Option<i32> {
        match self.days.unwrap_or(DEFAULT_LIST_DAYS) {
            d if d <= 0 => None,
            d => Some(d.min(MAX_LIST_DAYS)),
        }
    }

    /// Applies every filter to an already-loaded ticket
    ///
    /// Mirrors the SQL in [`Ticket::list`].
    pub fn matches(&self, ticket: &TicketSummary, now: DateTime<Utc>) -> bool {
        if self.status.is_some_and(|s| s != ticket.status) {
            return false;
        }
        if self.priority.is_some_and(|p| p != ticket.priority) {
            return false;
        }
        if self.category_id.is_some_and(|c| c != ticket.category_id) {
            return false;
        }
        if self.requestor_id.is_some_and(|r| r != ticket.requestor_id) {
            return false;
        }
        if self.assigned_to.is_some() && self.assigned_to != ticket.assigned_to {
            return false;
        }
        if let Some(days) = self.window_days() {
            if ticket.created_at < now - Duration::days(i64::from(days)) {
                return false;
            }
        }
        match self.search.as_deref() {
            Some(term) => matches_search(ticket, term),
            None => true,
        }
    }
}

/// Free-text match on title, requestor name and assignee name
///
/// Blank terms match everything.
pub fn matches_search(ticket: &TicketSummary, term: &str) -> bool {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return true;
    }

    ticket.title.to_lowercase().contains(&term)
        || ticket.requestor_name.to_lowercase().contains(&term)
        || ticket
            .assignee_name
            .as_deref()
            .is_some_and(|name| name.to_lowercase().contains(&term))
}

/// Result of a status change request
#[derive(Debug, Clone)]
pub enum StatusChange {
    Changed(Ticket),
    /// The ticket already had the requested status
    Unchanged,
    NotFound,
}

/// Ticket with its comments and assignment history
#[derive(Debug, Clone, Serialize)]
pub struct TicketDetail {
    #[serde(flatten)]
    pub ticket: TicketSummary,

    /// Oldest first
    pub comments: Vec<CommentWithAuthor>,

    /// Newest first
    pub assignment_history: Vec<AssignmentEntry>,
}

/// Dashboard counters
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub total_tickets: i64,
    pub active_tickets: i64,
    pub critical_tickets: i64,

    /// Most urgent active tickets, critical and newest first
    pub urgent_tickets: Vec<TicketSummary>,
}

const TICKET_COLUMNS: &str = "id, title, description, type, priority, status, category_id, \
                              requestor_id, created_by, assigned_to, assigned_date, resolved_at, \
                              created_at, updated_at";

const SUMMARY_SELECT: &str = r#"
    SELECT t.id, t.title, t.description, t.type, t.priority, t.status,
           t.category_id, c.name AS category_name,
           t.requestor_id, r.full_name AS requestor_name, r.email AS requestor_email,
           t.assigned_to, a.full_name AS assignee_name, t.assigned_date,
           t.resolved_at, t.created_at, t.updated_at
    FROM tickets t
    JOIN ticket_categories c ON c.id = t.category_id
    JOIN users r ON r.id = t.requestor_id
    LEFT JOIN users a ON a.id = t.assigned_to
"#;

impl Ticket {
    /// Files a new ticket with status `open`
    pub async fn create(pool: &PgPool, data: CreateTicket) -> Result<Self, sqlx::Error> {
        let ticket = sqlx::query_as::<_, Ticket>(&format!(
            r#"
            INSERT INTO tickets (title, description, type, priority, status,
                                 category_id, requestor_id, created_by)
            VALUES ($1, $2, $3, $4, 'open', $5, $6, $7)
            RETURNING {TICKET_COLUMNS}
            "#
        ))
        .bind(data.title.trim())
        .bind(data.description.trim())
        .bind(data.ticket_type)
        .bind(data.priority)
        .bind(data.category_id)
        .bind(data.requestor_id)
        .bind(data.created_by)
        .fetch_one(pool)
        .await?;

        Ok(ticket)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let ticket = sqlx::query_as::<_, Ticket>(&format!(
            "SELECT {TICKET_COLUMNS} FROM tickets WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(ticket)
    }

    pub async fn find_summary(pool: &PgPool, id: Uuid) -> Result<Option<TicketSummary>, sqlx::Error> {
        let ticket = sqlx::query_as::<_, TicketSummary>(&format!("{SUMMARY_SELECT} WHERE t.id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(ticket)
    }

    /// Lists tickets matching `filter`, most urgent first
    ///
    /// Structured filters run in SQL; the text search is applied to the
    /// joined rows with [`matches_search`].
    pub async fn list(pool: &PgPool, filter: &TicketFilter) -> Result<Vec<TicketSummary>, sqlx::Error> {
        let mut conditions: Vec<String> = Vec::new();
        let mut bind_idx = 0;

        if filter.status.is_some() {
            bind_idx += 1;
            conditions.push(format!("t.status = ${bind_idx}"));
        }
        if filter.priority.is_some() {
            bind_idx += 1;
            conditions.push(format!("t.priority = ${bind_idx}"));
        }
        if filter.category_id.is_some() {
            bind_idx += 1;
            conditions.push(format!("t.category_id = ${bind_idx}"));
        }
        if filter.requestor_id.is_some() {
            bind_idx += 1;
            conditions.push(format!("t.requestor_id = ${bind_idx}"));
        }
        if filter.assigned_to.is_some() {
            bind_idx += 1;
            conditions.push(format!("t.assigned_to = ${bind_idx}"));
        }
        let window = filter.window_days();
        if window.is_some() {
            bind_idx += 1;
            conditions.push(format!(
                "t.created_at >= NOW() - make_interval(days => ${bind_idx})"
            ));
        }

        let mut query = String::from(SUMMARY_SELECT);
        if !conditions.is_empty() {
            query.push_str(" WHERE ");
            query.push_str(&conditions.join(" AND "));
        }
        query.push_str(" ORDER BY t.priority DESC, t.created_at DESC");

        let mut q = sqlx::query_as::<_, TicketSummary>(&query);
        if let Some(status) = filter.status {
            q = q.bind(status);
        }
        if let Some(priority) = filter.priority {
            q = q.bind(priority);
        }
        if let Some(category_id) = filter.category_id {
            q = q.bind(category_id);
        }
        if let Some(requestor_id) = filter.requestor_id {
            q = q.bind(requestor_id);
        }
        if let Some(assigned_to) = filter.assigned_to {
            q = q.bind(assigned_to);
        }
        if let Some(days) = window {
            q = q.bind(days);
        }

        let mut tickets = q.fetch_all(pool).await?;

        if let Some(term) = filter.search.as_deref() {
            tickets.retain(|t| matches_search(t, term));
        }

        Ok(tickets)
    }

    /// Changes the status and records a system comment, atomically
    ///
    /// `resolved_at` is stamped on resolved/closed and cleared when the
    /// ticket is reopened. The comment is authored by `actor`.
    pub async fn change_status(
        pool: &PgPool,
        id: Uuid,
        new_status: TicketStatus,
        actor: Uuid,
    ) -> Result<StatusChange, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let current: Option<TicketStatus> =
            sqlx::query_scalar("SELECT status FROM tickets WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;

        match current {
            None => return Ok(StatusChange::NotFound),
            Some(status) if status == new_status => return Ok(StatusChange::Unchanged),
            Some(_) => {}
        }

        let ticket = sqlx::query_as::<_, Ticket>(&format!(
            r#"
            UPDATE tickets
            SET status = $2,
                resolved_at = CASE
                    WHEN $3 THEN COALESCE(resolved_at, NOW())
                    ELSE NULL
                END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {TICKET_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(new_status)
        .bind(new_status.is_finished())
        .fetch_one(&mut *tx)
        .await?;

        TicketComment::create(
            &mut *tx,
            id,
            actor,
            &format!("Status changed to {}", new_status.label()),
        )
        .await?;

        tx.commit().await?;

        Ok(StatusChange::Changed(ticket))
    }

    /// Loads a ticket with its comments and assignment history
    pub async fn detail(pool: &PgPool, id: Uuid) -> Result<Option<TicketDetail>, sqlx::Error> {
        let Some(ticket) = Self::find_summary(pool, id).await? else {
            return Ok(None);
        };

        let comments = TicketComment::list_for_ticket(pool, id).await?;
        let assignment_history = AssignmentTarget::Ticket.history(pool, id).await?;

        Ok(Some(TicketDetail {
            ticket,
            comments,
            assignment_history,
        }))
    }

    /// Counters and the urgent list for the landing page
    pub async fn dashboard(pool: &PgPool) -> Result<DashboardSummary, sqlx::Error> {
        let (total_tickets, active_tickets, critical_tickets): (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*),
                   COUNT(*) FILTER (WHERE status IN ('open', 'in_progress')),
                   COUNT(*) FILTER (WHERE status IN ('open', 'in_progress') AND priority = 'critical')
            FROM tickets
            "#,
        )
        .fetch_one(pool)
        .await?;

        let urgent_tickets = sqlx::query_as::<_, TicketSummary>(&format!(
            r#"{SUMMARY_SELECT}
            WHERE t.status IN ('open', 'in_progress')
            ORDER BY t.priority DESC, t.created_at DESC
            LIMIT $1
            "#
        ))
        .bind(DASHBOARD_URGENT_LIMIT)
        .fetch_all(pool)
        .await?;

        Ok(DashboardSummary {
            total_tickets,
            active_tickets,
            critical_tickets,
            urgent_tickets,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn summary(title: &str, requestor: &str, assignee: Option<&str>) -> TicketSummary {
        TicketSummary {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: String::new(),
            ticket_type: TicketType::Incident,
            priority: TicketPriority::Medium,
            status: TicketStatus::Open,
            category_id: Uuid::new_v4(),
            category_name: "Hardware".to_string(),
            requestor_id: Uuid::new_v4(),
            requestor_name: requestor.to_string(),
            requestor_email: format!("{}@example.com", requestor.to_lowercase()),
            assigned_to: assignee.map(|_| Uuid::new_v4()),
            assignee_name: assignee.map(str::to_string),
            assigned_date: None,
            resolved_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_priority_orders_by_severity() {
        assert!(TicketPriority::Critical > TicketPriority::High);
        assert!(TicketPriority::High > TicketPriority::Medium);
        assert!(TicketPriority::Medium > TicketPriority::Low);
    }

    #[test]
    fn test_status_label_and_activity() {
        assert_eq!(TicketStatus::InProgress.label(), "in progress");
        assert_eq!(TicketStatus::Open.label(), "open");
        assert!(TicketStatus::Open.is_active());
        assert!(TicketStatus::InProgress.is_active());
        assert!(TicketStatus::Resolved.is_finished());
        assert!(TicketStatus::Closed.is_finished());
    }

    #[test]
    fn test_enum_parsing() {
        assert_eq!("Incident".parse::<TicketType>(), Ok(TicketType::Incident));
        assert_eq!("CRITICAL".parse::<TicketPriority>(), Ok(TicketPriority::Critical));
        assert_eq!("in_progress".parse::<TicketStatus>(), Ok(TicketStatus::InProgress));
        assert!("urgent".parse::<TicketPriority>().is_err());
    }

    #[test]
    fn test_ticket_serializes_type_field() {
        let t = summary("Laptop broken", "Alice", None);
        let json = serde_json::to_value(&t).unwrap();
        assert_eq!(json["type"], "incident");
        assert_eq!(json["status"], "open");
        assert!(json.get("ticket_type").is_none());
    }

    #[test]
    fn test_search_matches_title_requestor_and_assignee() {
        let t = summary("Printer jammed", "Alice Cooper", Some("Bob Tech"));

        assert!(matches_search(&t, "printer"));
        assert!(matches_search(&t, "ALICE"));
        assert!(matches_search(&t, "bob"));
        assert!(matches_search(&t, "   "));
        assert!(!matches_search(&t, "monitor"));

        let unassigned = summary("Printer jammed", "Alice Cooper", None);
        assert!(!matches_search(&unassigned, "bob"));
    }

    #[test]
    fn test_window_days() {
        assert_eq!(TicketFilter::default().window_days(), Some(30));
        let unlimited = TicketFilter { days: Some(0), ..Default::default() };
        assert_eq!(unlimited.window_days(), None);
        let week = TicketFilter { days: Some(7), ..Default::default() };
        assert_eq!(week.window_days(), Some(7));
        let huge = TicketFilter { days: Some(i32::MAX), ..Default::default() };
        assert_eq!(huge.window_days(), Some(MAX_LIST_DAYS));
    }

    #[test]
    fn test_huge_window_matches_without_overflow() {
        let now = Utc::now();
        let mut old = summary("Old", "Alice", None);
        old.created_at = now - Duration::days(3 * 365);

        let huge = TicketFilter { days: Some(i32::MAX), ..Default::default() };
        assert!(huge.matches(&old, now));
    }

    #[test]
    fn test_old_tickets_fall_outside_default_window() {
        let now = Utc::now();
        let mut old = summary("Old", "Alice", None);
        old.created_at = now - Duration::days(45);

        assert!(!TicketFilter::default().matches(&old, now));
        let unlimited = TicketFilter { days: Some(0), ..Default::default() };
        assert!(unlimited.matches(&old, now));
    }

    #[test]
    fn test_combined_filters_equal_intersection() {
        let now = Utc::now();
        let mut tickets = vec![
            summary("VPN down", "Alice", Some("Bob")),
            summary("VPN slow", "Carol", None),
            summary("New monitor", "Alice", None),
            summary("Printer", "Dave", Some("Bob")),
        ];
        tickets[0].priority = TicketPriority::Critical;
        tickets[1].priority = TicketPriority::Critical;
        tickets[3].status = TicketStatus::Resolved;

        let by_priority = TicketFilter {
            priority: Some(TicketPriority::Critical),
            ..Default::default()
        };
        let by_search = TicketFilter {
            search: Some("alice".to_string()),
            ..Default::default()
        };
        let both = TicketFilter {
            priority: Some(TicketPriority::Critical),
            search: Some("alice".to_string()),
            ..Default::default()
        };

        for t in &tickets {
            assert_eq!(
                both.matches(t, now),
                by_priority.matches(t, now) && by_search.matches(t, now),
                "ticket {}",
                t.title
            );
        }

        let hits: Vec<_> = tickets.iter().filter(|t| both.matches(t, now)).collect();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "VPN down");
    }
}
