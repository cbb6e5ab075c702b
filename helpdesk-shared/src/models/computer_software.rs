/// Software installed on a computer
///
/// # Schema
///
/// ```sql
/// CREATE TABLE computer_software (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     computer_id UUID NOT NULL REFERENCES computer_assets(id) ON DELETE CASCADE,
///     software_name VARCHAR(255) NOT NULL,
///     version VARCHAR(100),
///     license_key VARCHAR(255),
///     installation_date DATE,
///     expiry_date DATE,
///     status VARCHAR(50) NOT NULL DEFAULT 'active',
///     notes TEXT
/// );
/// ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ComputerSoftware {
    pub id: Uuid,
    pub computer_id: Uuid,
    pub software_name: String,
    pub version: Option<String>,
    pub license_key: Option<String>,
    pub installation_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub status: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSoftware {
    pub computer_id: Uuid,
    pub software_name: String,
    pub version: Option<String>,
    pub license_key: Option<String>,
    pub installation_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,

    /// Defaults to "active"
    pub status: Option<String>,

    pub notes: Option<String>,
}

impl ComputerSoftware {
    /// True once the licence expiry date has passed
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.expiry_date.is_some_and(|d| d < today)
    }

    pub async fn create(pool: &PgPool, data: CreateSoftware) -> Result<Self, sqlx::Error> {
        let software = sqlx::query_as::<_, ComputerSoftware>(
            r#"
            INSERT INTO computer_software
                (computer_id, software_name, version, license_key,
                 installation_date, expiry_date, status, notes)
            VALUES ($1, $2, $3, $4, $5, $6, COALESCE($7, 'active'), $8)
            RETURNING id, computer_id, software_name, version, license_key,
                      installation_date, expiry_date, status, notes
            "#,
        )
        .bind(data.computer_id)
        .bind(data.software_name.trim())
        .bind(data.version)
        .bind(data.license_key)
        .bind(data.installation_date)
        .bind(data.expiry_date)
        .bind(data.status)
        .bind(data.notes)
        .fetch_one(pool)
        .await?;

        Ok(software)
    }

    /// Installed software, by name
    pub async fn list_for_computer(
        pool: &PgPool,
        computer_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let software = sqlx::query_as::<_, ComputerSoftware>(
            r#"
            SELECT id, computer_id, software_name, version, license_key,
                   installation_date, expiry_date, status, notes
            FROM computer_software
            WHERE computer_id = $1
            ORDER BY software_name
            "#,
        )
        .bind(computer_id)
        .fetch_all(pool)
        .await?;

        Ok(software)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_expired() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let mut software = ComputerSoftware {
            id: Uuid::new_v4(),
            computer_id: Uuid::new_v4(),
            software_name: "Office".to_string(),
            version: Some("2021".to_string()),
            license_key: None,
            installation_date: None,
            expiry_date: None,
            status: "active".to_string(),
            notes: None,
        };
        assert!(!software.is_expired(today));

        software.expiry_date = NaiveDate::from_ymd_opt(2025, 5, 31);
        assert!(software.is_expired(today));

        software.expiry_date = NaiveDate::from_ymd_opt(2025, 6, 1);
        assert!(!software.is_expired(today));
    }
}
