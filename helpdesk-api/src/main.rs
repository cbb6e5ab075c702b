//! # Help Desk API Server
//!
//! Loads configuration from the environment, migrates the database, creates
//! the first admin when one is configured, and serves the API until Ctrl-C.
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgres://localhost/helpdesk JWT_SECRET=... cargo run -p helpdesk-api
//! ```

use anyhow::Context;
use helpdesk_api::{
    app::{build_router, AppState},
    config::{Config, LogFormat},
};
use helpdesk_shared::{
    bootstrap::{ensure_admin, BootstrapOutcome},
    db::{
        migrations::{get_migration_status, run_migrations},
        pool::{close_pool, create_pool, DatabaseConfig},
    },
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LOG_FILTER: &str = "helpdesk_api=debug,helpdesk_shared=debug,tower_http=debug";

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;
    init_tracing(config.log_format);

    tracing::info!(
        "Help Desk API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let pool = create_pool(DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..DatabaseConfig::default()
    })
    .await
    .context("Failed to connect to database")?;

    run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;

    match get_migration_status(&pool).await {
        Ok(status) => tracing::info!(
            applied = status.applied_migrations,
            latest = ?status.latest_version,
            up_to_date = status.is_up_to_date,
            "Database schema ready"
        ),
        Err(e) => tracing::warn!(error = %e, "Could not read migration status"),
    }

    if let Some(admin) = &config.admin {
        match ensure_admin(&pool, &admin.email, &admin.password)
            .await
            .context("Failed to create admin account")?
        {
            BootstrapOutcome::Created(user) => {
                tracing::info!(user_id = %user.id, "Admin account created")
            }
            BootstrapOutcome::AlreadyExists => {
                tracing::debug!("Admin account already exists")
            }
        }
    }

    let address = config.bind_address();
    let app = build_router(AppState::new(pool.clone(), config));

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    tracing::info!("Server listening on http://{}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    close_pool(pool).await;
    tracing::info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    wait_for_signal(tokio::signal::ctrl_c()).await
}

/// Resolves once `signal` fires; a listener that fails never resolves, so
/// the server keeps running instead of shutting down on the error
async fn wait_for_signal<F>(signal: F)
where
    F: std::future::Future<Output = std::io::Result<()>>,
{
    if let Err(e) = signal.await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, exiting...");
}
