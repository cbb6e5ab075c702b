/// Computer inventory
///
/// Each computer is identified by a unique asset tag. Computers can be
/// assigned to a user (with history), put into maintenance, retired or
/// stored.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE computer_type AS ENUM ('desktop', 'laptop', 'workstation', 'server');
/// CREATE TYPE computer_status AS ENUM ('active', 'maintenance', 'retired', 'storage');
///
/// CREATE TABLE computer_assets (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     asset_tag VARCHAR(100) NOT NULL UNIQUE,
///     serial_number VARCHAR(255),
///     name VARCHAR(255) NOT NULL,
///     type computer_type NOT NULL,
///     manufacturer VARCHAR(255) NOT NULL,
///     model VARCHAR(255) NOT NULL,
///     status computer_status NOT NULL DEFAULT 'active',
///     assigned_to UUID REFERENCES users(id),
///     assigned_date TIMESTAMPTZ,
///     location VARCHAR(255),
///     department VARCHAR(255),
///     specifications JSONB NOT NULL DEFAULT '{}',
///     notes TEXT,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use helpdesk_shared::models::computer_asset::{ComputerAsset, ComputerStatus};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, id: Uuid, tech: Uuid) -> Result<(), sqlx::Error> {
/// // Also writes a maintenance log entry
/// ComputerAsset::change_status(&pool, id, ComputerStatus::Maintenance, tech).await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::fmt;
use std::str::FromStr;
use tracing::info;
use uuid::Uuid;

use super::assignment::{AssignmentEntry, AssignmentTarget};
use super::computer_maintenance::{ComputerMaintenance, CreateMaintenance, MaintenanceEntry};
use super::computer_software::ComputerSoftware;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "computer_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ComputerType {
    Desktop,
    Laptop,
    Workstation,
    Server,
}

impl ComputerType {
    pub const ALL: [ComputerType; 4] = [
        ComputerType::Desktop,
        ComputerType::Laptop,
        ComputerType::Workstation,
        ComputerType::Server,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ComputerType::Desktop => "desktop",
            ComputerType::Laptop => "laptop",
            ComputerType::Workstation => "workstation",
            ComputerType::Server => "server",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "computer_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ComputerStatus {
    /// In use
    Active,
    /// Out for repair or upgrade
    Maintenance,
    /// Decommissioned
    Retired,
    /// On the shelf, available for assignment
    Storage,
}

impl ComputerStatus {
    pub const ALL: [ComputerStatus; 4] = [
        ComputerStatus::Active,
        ComputerStatus::Maintenance,
        ComputerStatus::Retired,
        ComputerStatus::Storage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ComputerStatus::Active => "active",
            ComputerStatus::Maintenance => "maintenance",
            ComputerStatus::Retired => "retired",
            ComputerStatus::Storage => "storage",
        }
    }
}

impl fmt::Display for ComputerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for ComputerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComputerType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == wanted)
            .ok_or_else(|| s.to_string())
    }
}

impl FromStr for ComputerStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == wanted)
            .ok_or_else(|| s.to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ComputerAsset {
    pub id: Uuid,

    /// Unique inventory label, e.g. "COMP001"
    pub asset_tag: String,

    pub serial_number: Option<String>,
    pub name: String,

    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub computer_type: ComputerType,

    pub manufacturer: String,
    pub model: String,
    pub status: ComputerStatus,
    pub assigned_to: Option<Uuid>,
    pub assigned_date: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub department: Option<String>,

    /// Free-form hardware details (CPU, RAM, disk, ...)
    pub specifications: serde_json::Value,

    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Computer joined with its assignee
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ComputerSummary {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub computer: ComputerAsset,

    pub assignee_name: Option<String>,
    pub assignee_email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateComputer {
    pub asset_tag: String,
    pub serial_number: Option<String>,
    pub name: String,
    pub computer_type: ComputerType,
    pub manufacturer: String,
    pub model: String,
    pub status: ComputerStatus,
    pub location: Option<String>,
    pub department: Option<String>,
    pub specifications: Option<serde_json::Value>,
    pub notes: Option<String>,
}

/// Inventory filter; set fields combine with AND
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComputerFilter {
    pub status: Option<ComputerStatus>,

    #[serde(rename = "type")]
    pub computer_type: Option<ComputerType>,
    pub department: Option<String>,
    pub assigned_to: Option<Uuid>,

    /// Case-insensitive text matched against asset tag, name, manufacturer and model
    pub search: Option<String>,
}

impl ComputerFilter {
    pub fn matches(&self, computer: &ComputerAsset) -> bool {
        if self.status.is_some_and(|s| s != computer.status) {
            return false;
        }
        if self.computer_type.is_some_and(|t| t != computer.computer_type) {
            return false;
        }
        if let Some(department) = self.department.as_deref() {
            if computer.department.as_deref() != Some(department) {
                return false;
            }
        }
        if self.assigned_to.is_some() && self.assigned_to != computer.assigned_to {
            return false;
        }
        match self.search.as_deref() {
            Some(term) => matches_search(computer, term),
            None => true,
        }
    }
}

/// Free-text match on asset tag, name, manufacturer and model
pub fn matches_search(computer: &ComputerAsset, term: &str) -> bool {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return true;
    }

    [
        computer.asset_tag.as_str(),
        computer.name.as_str(),
        computer.manufacturer.as_str(),
        computer.model.as_str(),
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(&term))
}

/// Computer with history, maintenance log and software
#[derive(Debug, Clone, Serialize)]
pub struct ComputerDetail {
    #[serde(flatten)]
    pub computer: ComputerSummary,

    /// Newest first
    pub assignment_history: Vec<AssignmentEntry>,

    /// Newest first
    pub maintenance: Vec<MaintenanceEntry>,

    /// By name
    pub software: Vec<ComputerSoftware>,
}

const COMPUTER_COLUMNS: &str = "id, asset_tag, serial_number, name, type, manufacturer, model, \
                                status, assigned_to, assigned_date, location, department, \
                                specifications, notes, created_at, updated_at";

const SUMMARY_SELECT: &str = r#"
    SELECT c.id, c.asset_tag, c.serial_number, c.name, c.type, c.manufacturer, c.model,
           c.status, c.assigned_to, c.assigned_date, c.location, c.department,
           c.specifications, c.notes, c.created_at, c.updated_at,
           u.full_name AS assignee_name, u.email AS assignee_email
    FROM computer_assets c
    LEFT JOIN users u ON u.id = c.assigned_to
"#;

impl ComputerAsset {
    /// Adds a computer to the inventory
    ///
    /// # Errors
    ///
    /// Unique violation on `computer_assets_asset_tag_key` for a duplicate tag.
    pub async fn create(pool: &PgPool, data: CreateComputer) -> Result<Self, sqlx::Error> {
        let specifications = data
            .specifications
            .unwrap_or_else(|| serde_json::Value::Object(Default::default()));

        let computer = sqlx::query_as::<_, ComputerAsset>(&format!(
            r#"
            INSERT INTO computer_assets
                (asset_tag, serial_number, name, type, manufacturer, model, status,
                 location, department, specifications, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {COMPUTER_COLUMNS}
            "#
        ))
        .bind(data.asset_tag.trim())
        .bind(data.serial_number)
        .bind(data.name.trim())
        .bind(data.computer_type)
        .bind(data.manufacturer.trim())
        .bind(data.model.trim())
        .bind(data.status)
        .bind(data.location)
        .bind(data.department)
        .bind(specifications)
        .bind(data.notes)
        .fetch_one(pool)
        .await?;

        info!(computer_id = %computer.id, asset_tag = %computer.asset_tag, "Computer created");
        Ok(computer)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let computer = sqlx::query_as::<_, ComputerAsset>(&format!(
            "SELECT {COMPUTER_COLUMNS} FROM computer_assets WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(computer)
    }

    pub async fn asset_tag_exists(pool: &PgPool, asset_tag: &str) -> Result<bool, sqlx::Error> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM computer_assets WHERE asset_tag = $1)")
                .bind(asset_tag.trim())
                .fetch_one(pool)
                .await?;

        Ok(exists)
    }

    /// Lists computers matching `filter`, by asset tag
    pub async fn list(
        pool: &PgPool,
        filter: &ComputerFilter,
    ) -> Result<Vec<ComputerSummary>, sqlx::Error> {
        let mut conditions: Vec<String> = Vec::new();
        let mut bind_idx = 0;

        if filter.status.is_some() {
            bind_idx += 1;
            conditions.push(format!("c.status = ${bind_idx}"));
        }
        if filter.computer_type.is_some() {
            bind_idx += 1;
            conditions.push(format!("c.type = ${bind_idx}"));
        }
        if filter.department.is_some() {
            bind_idx += 1;
            conditions.push(format!("c.department = ${bind_idx}"));
        }
        if filter.assigned_to.is_some() {
            bind_idx += 1;
            conditions.push(format!("c.assigned_to = ${bind_idx}"));
        }

        let mut query = String::from(SUMMARY_SELECT);
        if !conditions.is_empty() {
            query.push_str(" WHERE ");
            query.push_str(&conditions.join(" AND "));
        }
        query.push_str(" ORDER BY c.asset_tag");

        let mut q = sqlx::query_as::<_, ComputerSummary>(&query);
        if let Some(status) = filter.status {
            q = q.bind(status);
        }
        if let Some(computer_type) = filter.computer_type {
            q = q.bind(computer_type);
        }
        if let Some(department) = filter.department.as_deref() {
            q = q.bind(department);
        }
        if let Some(assigned_to) = filter.assigned_to {
            q = q.bind(assigned_to);
        }

        let mut computers = q.fetch_all(pool).await?;

        if let Some(term) = filter.search.as_deref() {
            computers.retain(|c| matches_search(&c.computer, term));
        }

        Ok(computers)
    }

    /// Sets the status
    ///
    /// Setting maintenance, even on a computer already in maintenance, also
    /// writes a "Status Change" maintenance record performed by `actor` in
    /// the same transaction. Returns None if the computer doesn't exist.
    pub async fn change_status(
        pool: &PgPool,
        id: Uuid,
        status: ComputerStatus,
        actor: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let previous: Option<ComputerStatus> =
            sqlx::query_scalar("SELECT status FROM computer_assets WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;

        let Some(previous) = previous else {
            return Ok(None);
        };

        let computer = sqlx::query_as::<_, ComputerAsset>(&format!(
            r#"
            UPDATE computer_assets
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {COMPUTER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(status)
        .fetch_one(&mut *tx)
        .await?;

        if status == ComputerStatus::Maintenance {
            ComputerMaintenance::create(&mut *tx, CreateMaintenance::status_change(id, actor))
                .await?;
        }

        tx.commit().await?;

        info!(
            computer_id = %id,
            from = %previous,
            to = %status,
            "Computer status changed"
        );

        Ok(Some(computer))
    }

    /// Loads a computer with assignee, history, maintenance and software
    pub async fn detail(pool: &PgPool, id: Uuid) -> Result<Option<ComputerDetail>, sqlx::Error> {
        let computer = sqlx::query_as::<_, ComputerSummary>(&format!(
            "{SUMMARY_SELECT} WHERE c.id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        let Some(computer) = computer else {
            return Ok(None);
        };

        let assignment_history = AssignmentTarget::Computer.history(pool, id).await?;
        let maintenance = ComputerMaintenance::list_for_computer(pool, id).await?;
        let software = ComputerSoftware::list_for_computer(pool, id).await?;

        Ok(Some(ComputerDetail {
            computer,
            assignment_history,
            maintenance,
            software,
        }))
    }
}
