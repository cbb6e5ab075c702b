/// Database layer for the help desk
///
/// Connection pooling and the embedded schema migrations. Row types and
/// their queries live in the `models` module at crate root level.
///
/// # Modules
///
/// - `pool`: PostgreSQL connection pool with health checks
/// - `migrations`: embedded migration runner and status queries
///
/// # Example
///
/// ```no_run
/// use helpdesk_shared::db::pool::{create_pool, DatabaseConfig};
/// use helpdesk_shared::db::migrations::run_migrations;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = DatabaseConfig {
///         url: std::env::var("DATABASE_URL")?,
///         ..Default::default()
///     };
///
///     let pool = create_pool(config).await?;
///     run_migrations(&pool).await?;
///     Ok(())
/// }
/// ```

pub mod migrations;
pub mod pool;
