/// Schema migrations
///
/// The SQL files in the workspace-level `migrations/` directory are embedded
/// into the binary at compile time, so a deployed server carries its own
/// schema and upgrades the database on startup.
///
/// # Schema
///
/// - `users` with the `user_role` enum
/// - `ticket_categories`, `tickets`, `ticket_comments`,
///   `ticket_assignment_history`
/// - `computer_assets`, `computer_assignment_history`,
///   `computer_maintenance`, `computer_software`
///
/// Both history tables carry a partial unique index on the owning entity
/// `WHERE unassigned_at IS NULL`, so at most one assignment is open at a time.
///
/// # Example
///
/// ```no_run
/// use helpdesk_shared::db::pool::{create_pool, DatabaseConfig};
/// use helpdesk_shared::db::migrations::{run_migrations, get_migration_status};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig {
///     url: std::env::var("DATABASE_URL")?,
///     ..Default::default()
/// })
/// .await?;
///
/// run_migrations(&pool).await?;
/// let status = get_migration_status(&pool).await?;
/// println!("Applied {} migrations", status.applied_migrations);
/// # Ok(())
/// # }
/// ```

use sqlx::{migrate::Migrator, postgres::PgPool};
use tracing::{debug, info, warn};

/// Embedded migrations from `<workspace>/migrations`
pub static MIGRATOR: Migrator = sqlx::migrate!("../migrations");

/// Migration status information
#[derive(Debug, Clone)]
pub struct MigrationStatus {
    /// Number of migrations recorded as applied
    pub applied_migrations: usize,

    /// Latest applied migration version (timestamp prefix of the file)
    pub latest_version: Option<i64>,

    /// Whether every embedded migration has been applied
    pub is_up_to_date: bool,
}

/// Runs all pending migrations
///
/// Each migration runs in its own transaction; a failing file is rolled back
/// and the error is returned.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    info!(
        embedded = MIGRATOR.iter().count(),
        "Starting database migrations"
    );

    match MIGRATOR.run(pool).await {
        Ok(()) => {
            info!("All database migrations completed successfully");
            Ok(())
        }
        Err(e) => {
            warn!(error = %e, "Migration failed");
            Err(e)
        }
    }
}

/// Reads `_sqlx_migrations` and compares it with the embedded set
pub async fn get_migration_status(pool: &PgPool) -> Result<MigrationStatus, sqlx::Error> {
    debug!("Checking migration status");

    let table_exists: bool = sqlx::query_scalar(
        "SELECT EXISTS (
            SELECT FROM information_schema.tables
            WHERE table_schema = 'public'
            AND table_name = '_sqlx_migrations'
        )",
    )
    .fetch_one(pool)
    .await?;

    if !table_exists {
        debug!("Migrations table does not exist yet");
        return Ok(MigrationStatus {
            applied_migrations: 0,
            latest_version: None,
            is_up_to_date: false,
        });
    }

    let (count, latest_version): (i64, Option<i64>) = sqlx::query_as(
        "SELECT
            COUNT(*) as count,
            MAX(version) as latest_version
         FROM _sqlx_migrations
         WHERE success = true",
    )
    .fetch_one(pool)
    .await?;

    debug!(
        applied_migrations = count,
        latest_version = ?latest_version,
        "Migration status retrieved"
    );

    Ok(status_from_counts(count as usize, latest_version, embedded_latest_version()))
}

/// Highest version among the embedded migrations
pub fn embedded_latest_version() -> Option<i64> {
    MIGRATOR.iter().map(|m| m.version).max()
}

fn status_from_counts(
    applied: usize,
    latest_version: Option<i64>,
    embedded_latest: Option<i64>,
) -> MigrationStatus {
    MigrationStatus {
        applied_migrations: applied,
        latest_version,
        is_up_to_date: latest_version.is_some() && latest_version >= embedded_latest,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_migrations_are_present() {
        assert!(MIGRATOR.iter().count() >= 3);
        assert!(embedded_latest_version().is_some());
    }

    #[test]
    fn test_status_up_to_date_only_when_latest_applied() {
        let embedded = Some(20250101000003);

        let behind = status_from_counts(2, Some(20250101000002), embedded);
        assert!(!behind.is_up_to_date);

        let current = status_from_counts(3, Some(20250101000003), embedded);
        assert!(current.is_up_to_date);
        assert_eq!(current.applied_migrations, 3);

        let empty = status_from_counts(0, None, embedded);
        assert!(!empty.is_up_to_date);
    }
}
