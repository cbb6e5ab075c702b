/// Ticket categories
///
/// Admin-maintained list of categories offered when filing a ticket. Each
/// category belongs to one ticket type; inactive categories stay on existing
/// tickets but can no longer be chosen for new ones.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE ticket_categories (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL UNIQUE,
///     description TEXT,
///     is_active BOOLEAN NOT NULL DEFAULT TRUE,
///     ticket_type ticket_type NOT NULL DEFAULT 'incident',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::ticket::TicketType;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TicketCategory {
    pub id: Uuid,

    /// Unique display name
    pub name: String,

    pub description: Option<String>,

    /// Whether new tickets may use this category
    pub is_active: bool,

    /// The kind of ticket this category applies to
    pub ticket_type: TicketType,

    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTicketCategory {
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub ticket_type: TicketType,
}

/// Fields to change on a category; None leaves the column untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTicketCategory {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub is_active: Option<bool>,
    pub ticket_type: Option<TicketType>,
}

impl TicketCategory {
    pub async fn create(pool: &PgPool, data: CreateTicketCategory) -> Result<Self, sqlx::Error> {
        let category = sqlx::query_as::<_, TicketCategory>(
            r#"
            INSERT INTO ticket_categories (name, description, is_active, ticket_type)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, description, is_active, ticket_type, created_at
            "#,
        )
        .bind(data.name.trim())
        .bind(data.description)
        .bind(data.is_active)
        .bind(data.ticket_type)
        .fetch_one(pool)
        .await?;

        Ok(category)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let category = sqlx::query_as::<_, TicketCategory>(
            r#"
            SELECT id, name, description, is_active, ticket_type, created_at
            FROM ticket_categories
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(category)
    }

    /// Lists categories by name
    ///
    /// `active_only` hides retired categories, as the ticket form does.
    pub async fn list(pool: &PgPool, active_only: bool) -> Result<Vec<Self>, sqlx::Error> {
        let categories = sqlx::query_as::<_, TicketCategory>(
            r#"
            SELECT id, name, description, is_active, ticket_type, created_at
            FROM ticket_categories
            WHERE ($1 = FALSE OR is_active)
            ORDER BY name
            "#,
        )
        .bind(active_only)
        .fetch_all(pool)
        .await?;

        Ok(categories)
    }

    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateTicketCategory,
    ) -> Result<Option<Self>, sqlx::Error> {
        let category = sqlx::query_as::<_, TicketCategory>(
            r#"
            UPDATE ticket_categories
            SET name = COALESCE($2, name),
                description = CASE WHEN $3 THEN $4 ELSE description END,
                is_active = COALESCE($5, is_active),
                ticket_type = COALESCE($6, ticket_type)
            WHERE id = $1
            RETURNING id, name, description, is_active, ticket_type, created_at
            "#,
        )
        .bind(id)
        .bind(data.name.as_deref().map(str::trim))
        .bind(data.description.is_some())
        .bind(data.description.flatten())
        .bind(data.is_active)
        .bind(data.ticket_type)
        .fetch_optional(pool)
        .await?;

        Ok(category)
    }

    /// Deletes a category
    ///
    /// Fails with a foreign key violation while tickets still reference it.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM ticket_categories WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
