/// Assignment history for tickets and computers
///
/// Tickets are assigned to technicians, computers to any user. Both keep a
/// history table next to the `assigned_to` column on the owning row. The
/// open history row (`unassigned_at IS NULL`) always names the current
/// assignee.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE ticket_assignment_history (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     ticket_id UUID NOT NULL REFERENCES tickets(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     assigned_by UUID REFERENCES users(id) ON DELETE SET NULL,
///     assigned_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     unassigned_at TIMESTAMPTZ,
///     notes TEXT
/// );
///
/// CREATE UNIQUE INDEX idx_ticket_assignment_open
///     ON ticket_assignment_history (ticket_id)
///     WHERE unassigned_at IS NULL;
/// ```
///
/// `computer_assignment_history` has the same shape keyed by `computer_id`.
///
/// # Example
///
/// ```no_run
/// use helpdesk_shared::models::assignment::{AssignmentTarget, NewAssignment};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, computer: Uuid, user: Uuid, tech: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// AssignmentTarget::Computer
///     .reassign(&pool, computer, NewAssignment {
///         user_id: user,
///         assigned_by: tech,
///         notes: Some("Replacement laptop".to_string()),
///     })
///     .await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use super::user::UserRole;

/// Assignment failures
#[derive(Debug, Error)]
pub enum AssignmentError {
    #[error("{0} not found")]
    EntityNotFound(&'static str),

    #[error("User not found")]
    UserNotFound,

    #[error("Tickets can only be assigned to technicians or admins")]
    AssigneeNotStaff,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Which kind of entity is being assigned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentTarget {
    Ticket,
    Computer,
}

impl AssignmentTarget {
    fn owner_table(self) -> &'static str {
        match self {
            AssignmentTarget::Ticket => "tickets",
            AssignmentTarget::Computer => "computer_assets",
        }
    }

    fn history_table(self) -> &'static str {
        match self {
            AssignmentTarget::Ticket => "ticket_assignment_history",
            AssignmentTarget::Computer => "computer_assignment_history",
        }
    }

    fn key_column(self) -> &'static str {
        match self {
            AssignmentTarget::Ticket => "ticket_id",
            AssignmentTarget::Computer => "computer_id",
        }
    }

    /// Name used in error messages
    pub fn label(self) -> &'static str {
        match self {
            AssignmentTarget::Ticket => "Ticket",
            AssignmentTarget::Computer => "Computer",
        }
    }

    /// Whether the assignee must be a technician or admin
    pub fn requires_staff(self) -> bool {
        matches!(self, AssignmentTarget::Ticket)
    }

    /// Hands the entity to a new user
    ///
    /// In one transaction: lock the owner row, close the open history row,
    /// insert the new one, point `assigned_to` at the new user. Any failure
    /// rolls the whole thing back.
    pub async fn reassign(
        self,
        pool: &PgPool,
        entity_id: Uuid,
        assignment: NewAssignment,
    ) -> Result<AssignmentRecord, AssignmentError> {
        let owner = self.owner_table();
        let history = self.history_table();
        let key = self.key_column();

        let mut tx = pool.begin().await?;

        let exists: Option<Uuid> =
            sqlx::query_scalar(&format!("SELECT id FROM {owner} WHERE id = $1 FOR UPDATE"))
                .bind(entity_id)
                .fetch_optional(&mut *tx)
                .await?;
        if exists.is_none() {
            return Err(AssignmentError::EntityNotFound(self.label()));
        }

        let role: Option<UserRole> = sqlx::query_scalar("SELECT role FROM users WHERE id = $1")
            .bind(assignment.user_id)
            .fetch_optional(&mut *tx)
            .await?;
        match role {
            None => return Err(AssignmentError::UserNotFound),
            Some(role) if self.requires_staff() && !role.is_staff() => {
                return Err(AssignmentError::AssigneeNotStaff)
            }
            Some(_) => {}
        }

        let closed = sqlx::query(&format!(
            "UPDATE {history} SET unassigned_at = NOW() WHERE {key} = $1 AND unassigned_at IS NULL"
        ))
        .bind(entity_id)
        .execute(&mut *tx)
        .await?;
        debug!(
            entity = self.label(),
            entity_id = %entity_id,
            closed = closed.rows_affected(),
            "Closed previous assignment"
        );

        let record = sqlx::query_as::<_, AssignmentRecord>(&format!(
            r#"
            INSERT INTO {history} ({key}, user_id, assigned_by, notes)
            VALUES ($1, $2, $3, $4)
            RETURNING id, {key} AS entity_id, user_id, assigned_by, assigned_at, unassigned_at, notes
            "#
        ))
        .bind(entity_id)
        .bind(assignment.user_id)
        .bind(assignment.assigned_by)
        .bind(assignment.notes)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(&format!(
            "UPDATE {owner} SET assigned_to = $2, assigned_date = NOW(), updated_at = NOW() WHERE id = $1"
        ))
        .bind(entity_id)
        .bind(assignment.user_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(
            entity = self.label(),
            entity_id = %entity_id,
            user_id = %record.user_id,
            "Assignment changed"
        );

        Ok(record)
    }

    /// Clears the assignee and closes the open history row atomically
    ///
    /// Returns false when the entity was not assigned to anyone.
    pub async fn unassign(self, pool: &PgPool, entity_id: Uuid) -> Result<bool, AssignmentError> {
        let owner = self.owner_table();
        let history = self.history_table();
        let key = self.key_column();

        let mut tx = pool.begin().await?;

        let current: Option<Option<Uuid>> = sqlx::query_scalar(&format!(
            "SELECT assigned_to FROM {owner} WHERE id = $1 FOR UPDATE"
        ))
        .bind(entity_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(current) = current else {
            return Err(AssignmentError::EntityNotFound(self.label()));
        };

        let closed = sqlx::query(&format!(
            "UPDATE {history} SET unassigned_at = NOW() WHERE {key} = $1 AND unassigned_at IS NULL"
        ))
        .bind(entity_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(&format!(
            "UPDATE {owner} SET assigned_to = NULL, assigned_date = NULL, updated_at = NOW() WHERE id = $1"
        ))
        .bind(entity_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        let was_assigned = current.is_some() || closed.rows_affected() > 0;
        info!(
            entity = self.label(),
            entity_id = %entity_id,
            was_assigned,
            "Assignment cleared"
        );

        Ok(was_assigned)
    }

    /// Assignment history with user names, newest first
    pub async fn history(
        self,
        pool: &PgPool,
        entity_id: Uuid,
    ) -> Result<Vec<AssignmentEntry>, sqlx::Error> {
        let history = self.history_table();
        let key = self.key_column();

        let entries = sqlx::query_as::<_, AssignmentEntry>(&format!(
            r#"
            SELECT h.id, h.{key} AS entity_id, h.user_id,
                   u.full_name AS user_name, u.email AS user_email,
                   h.assigned_by, b.full_name AS assigned_by_name,
                   h.assigned_at, h.unassigned_at, h.notes
            FROM {history} h
            JOIN users u ON u.id = h.user_id
            LEFT JOIN users b ON b.id = h.assigned_by
            WHERE h.{key} = $1
            ORDER BY h.assigned_at DESC
            "#
        ))
        .bind(entity_id)
        .fetch_all(pool)
        .await?;

        Ok(entries)
    }

    /// Number of open history rows; at most one by construction
    pub async fn open_assignments(self, pool: &PgPool, entity_id: Uuid) -> Result<i64, sqlx::Error> {
        let history = self.history_table();
        let key = self.key_column();

        let count: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM {history} WHERE {key} = $1 AND unassigned_at IS NULL"
        ))
        .bind(entity_id)
        .fetch_one(pool)
        .await?;

        Ok(count)
    }
}

/// Input for a reassignment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAssignment {
    pub user_id: Uuid,
    pub assigned_by: Uuid,
    pub notes: Option<String>,
}

/// One history row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AssignmentRecord {
    pub id: Uuid,

    /// Ticket or computer ID
    pub entity_id: Uuid,

    pub user_id: Uuid,
    pub assigned_by: Option<Uuid>,
    pub assigned_at: DateTime<Utc>,

    /// None while this is the current assignment
    pub unassigned_at: Option<DateTime<Utc>>,

    pub notes: Option<String>,
}

/// History row joined with user names
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AssignmentEntry {
    pub id: Uuid,
    pub entity_id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    pub user_email: String,
    pub assigned_by: Option<Uuid>,
    pub assigned_by_name: Option<String>,
    pub assigned_at: DateTime<Utc>,
    pub unassigned_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

impl AssignmentEntry {
    pub fn is_current(&self) -> bool {
        self.unassigned_at.is_none()
    }
}
