/// Computer maintenance log
///
/// # Schema
///
/// ```sql
/// CREATE TABLE computer_maintenance (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     computer_id UUID NOT NULL REFERENCES computer_assets(id) ON DELETE CASCADE,
///     maintenance_type VARCHAR(100) NOT NULL,
///     description TEXT NOT NULL,
///     performed_by UUID REFERENCES users(id) ON DELETE SET NULL,
///     performed_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     cost DOUBLE PRECISION,
///     next_maintenance_date DATE,
///     notes TEXT
/// );
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

/// Maintenance type recorded when a computer is put into maintenance
pub const STATUS_CHANGE_MAINTENANCE_TYPE: &str = "Status Change";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ComputerMaintenance {
    pub id: Uuid,
    pub computer_id: Uuid,

    /// Free text such as "Repair", "Upgrade" or "Status Change"
    pub maintenance_type: String,

    pub description: String,
    pub performed_by: Option<Uuid>,
    pub performed_at: DateTime<Utc>,
    pub cost: Option<f64>,
    pub next_maintenance_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

/// Maintenance record joined with the performer's name
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MaintenanceEntry {
    pub id: Uuid,
    pub computer_id: Uuid,
    pub maintenance_type: String,
    pub description: String,
    pub performed_by: Option<Uuid>,
    pub performed_by_name: Option<String>,
    pub performed_at: DateTime<Utc>,
    pub cost: Option<f64>,
    pub next_maintenance_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMaintenance {
    pub computer_id: Uuid,
    pub maintenance_type: String,
    pub description: String,
    pub performed_by: Option<Uuid>,

    /// Defaults to now
    pub performed_at: Option<DateTime<Utc>>,

    pub cost: Option<f64>,
    pub next_maintenance_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

impl CreateMaintenance {
    /// The automatic entry written when a computer's status becomes maintenance
    pub fn status_change(computer_id: Uuid, performed_by: Uuid) -> Self {
        Self {
            computer_id,
            maintenance_type: STATUS_CHANGE_MAINTENANCE_TYPE.to_string(),
            description: "Status changed to maintenance".to_string(),
            performed_by: Some(performed_by),
            performed_at: None,
            cost: None,
            next_maintenance_date: None,
            notes: Some("Automatic entry for status change".to_string()),
        }
    }
}

impl ComputerMaintenance {
    pub async fn create<'e, E>(executor: E, data: CreateMaintenance) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let record = sqlx::query_as::<_, ComputerMaintenance>(
            r#"
            INSERT INTO computer_maintenance
                (computer_id, maintenance_type, description, performed_by, performed_at,
                 cost, next_maintenance_date, notes)
            VALUES ($1, $2, $3, $4, COALESCE($5, NOW()), $6, $7, $8)
            RETURNING id, computer_id, maintenance_type, description, performed_by,
                      performed_at, cost, next_maintenance_date, notes
            "#,
        )
        .bind(data.computer_id)
        .bind(data.maintenance_type)
        .bind(data.description)
        .bind(data.performed_by)
        .bind(data.performed_at)
        .bind(data.cost)
        .bind(data.next_maintenance_date)
        .bind(data.notes)
        .fetch_one(executor)
        .await?;

        Ok(record)
    }

    /// Maintenance history, newest first
    pub async fn list_for_computer(
        pool: &PgPool,
        computer_id: Uuid,
    ) -> Result<Vec<MaintenanceEntry>, sqlx::Error> {
        let records = sqlx::query_as::<_, MaintenanceEntry>(
            r#"
            SELECT m.id, m.computer_id, m.maintenance_type, m.description,
                   m.performed_by, u.full_name AS performed_by_name,
                   m.performed_at, m.cost, m.next_maintenance_date, m.notes
            FROM computer_maintenance m
            LEFT JOIN users u ON u.id = m.performed_by
            WHERE m.computer_id = $1
            ORDER BY m.performed_at DESC
            "#,
        )
        .bind(computer_id)
        .fetch_all(pool)
        .await?;

        Ok(records)
    }
}
