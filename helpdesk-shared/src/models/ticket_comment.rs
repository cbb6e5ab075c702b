/// Ticket comments
///
/// Comments form the conversation on a ticket. Status changes add a system
/// comment authored by whoever made the change.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE ticket_comments (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     ticket_id UUID NOT NULL REFERENCES tickets(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     content TEXT NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TicketComment {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Comment joined with its author's name
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CommentWithAuthor {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub user_id: Uuid,
    pub author_name: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl TicketComment {
    /// Inserts a comment
    ///
    /// Accepts any executor so status changes can write their system comment
    /// inside the same transaction.
    pub async fn create<'e, E>(
        executor: E,
        ticket_id: Uuid,
        user_id: Uuid,
        content: &str,
    ) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let comment = sqlx::query_as::<_, TicketComment>(
            r#"
            INSERT INTO ticket_comments (ticket_id, user_id, content)
            VALUES ($1, $2, $3)
            RETURNING id, ticket_id, user_id, content, created_at
            "#,
        )
        .bind(ticket_id)
        .bind(user_id)
        .bind(content)
        .fetch_one(executor)
        .await?;

        Ok(comment)
    }

    /// Comments on a ticket, oldest first
    pub async fn list_for_ticket(
        pool: &PgPool,
        ticket_id: Uuid,
    ) -> Result<Vec<CommentWithAuthor>, sqlx::Error> {
        let comments = sqlx::query_as::<_, CommentWithAuthor>(
            r#"
            SELECT c.id, c.ticket_id, c.user_id, u.full_name AS author_name,
                   c.content, c.created_at
            FROM ticket_comments c
            JOIN users u ON u.id = c.user_id
            WHERE c.ticket_id = $1
            ORDER BY c.created_at ASC
            "#,
        )
        .bind(ticket_id)
        .fetch_all(pool)
        .await?;

        Ok(comments)
    }
}

/// Normalizes user-entered comment text, rejecting blank input
pub fn normalize_content(content: &str) -> Option<&str> {
    let trimmed = content.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_content() {
        assert_eq!(normalize_content("  looks fixed now \n"), Some("looks fixed now"));
        assert_eq!(normalize_content("   "), None);
        assert_eq!(normalize_content(""), None);
    }
}
