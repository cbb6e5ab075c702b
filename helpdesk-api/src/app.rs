/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use helpdesk_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config);
/// let app = helpdesk_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, error::ApiError, middleware::security::SecurityHeadersLayer};
use axum::{
    extract::{DefaultBodyLimit, Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{get, patch, post, put},
    Router,
};
use helpdesk_shared::auth::middleware::authenticate;
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Largest accepted spreadsheet upload
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                          # public
/// └── /v1/
///     ├── /auth/                       # register, login, refresh public; rest authenticated
///     ├── /dashboard
///     ├── /tickets[/:id[/status|/comments|/assign|/unassign]]
///     ├── /categories[/:id]
///     ├── /computers[/:id[/status|/assign|/unassign|/maintenance|/software]]
///     ├── /computers/import[/template]
///     ├── /users[/:id]
///     ├── /users/import[/template]
///     └── /statistics[/export]
/// ```
///
/// # Middleware Stack
///
/// Applied in order (outermost last):
/// 1. Authentication (per route group)
/// 2. Logging (tower-http TraceLayer)
/// 3. Compression
/// 4. CORS
/// 5. Security headers
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let public_auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh));

    let session_routes = Router::new()
        .route("/logout", post(routes::auth::logout))
        .route("/me", get(routes::auth::me))
        .route("/password", put(routes::auth::change_password));

    let ticket_routes = Router::new()
        .route(
            "/",
            get(routes::tickets::list_tickets).post(routes::tickets::create_ticket),
        )
        .route("/:id", get(routes::tickets::get_ticket))
        .route("/:id/status", patch(routes::tickets::change_status))
        .route("/:id/comments", post(routes::tickets::add_comment))
        .route("/:id/assign", post(routes::tickets::assign_ticket))
        .route("/:id/unassign", post(routes::tickets::unassign_ticket));

    let category_routes = Router::new()
        .route(
            "/",
            get(routes::categories::list_categories).post(routes::categories::create_category),
        )
        .route(
            "/:id",
            put(routes::categories::update_category).delete(routes::categories::delete_category),
        );

    let computer_import_routes = Router::new()
        .route("/template", get(routes::imports::computer_template))
        .route("/", post(routes::imports::import_computers))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES));

    let computer_routes = Router::new()
        .route(
            "/",
            get(routes::computers::list_computers).post(routes::computers::create_computer),
        )
        .nest("/import", computer_import_routes)
        .route("/:id", get(routes::computers::get_computer))
        .route("/:id/status", patch(routes::computers::change_status))
        .route("/:id/assign", post(routes::computers::assign_computer))
        .route("/:id/unassign", post(routes::computers::unassign_computer))
        .route("/:id/maintenance", post(routes::computers::add_maintenance))
        .route("/:id/software", post(routes::computers::add_software));

    let user_import_routes = Router::new()
        .route("/template", get(routes::imports::user_template))
        .route("/", post(routes::imports::import_users))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES));

    let user_routes = Router::new()
        .route(
            "/",
            get(routes::users::list_users).post(routes::users::create_user),
        )
        .nest("/import", user_import_routes)
        .route(
            "/:id",
            put(routes::users::update_user).delete(routes::users::delete_user),
        );

    let statistics_routes = Router::new()
        .route("/", get(routes::statistics::get_statistics))
        .route("/export", get(routes::statistics::export_statistics));

    // Everything here requires a valid access token
    let protected_routes = Router::new()
        .nest("/auth", session_routes)
        .route("/dashboard", get(routes::dashboard::dashboard))
        .nest("/tickets", ticket_routes)
        .nest("/categories", category_routes)
        .nest("/computers", computer_routes)
        .nest("/users", user_routes)
        .nest("/statistics", statistics_routes)
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let v1_routes = Router::new()
        .nest("/auth", public_auth_routes)
        .merge(protected_routes);

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(CompressionLayer::new())
        .layer(cors_layer(&state.config))
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// Permissive CORS when `*` is configured, otherwise an explicit allow list
fn cors_layer(config: &Config) -> CorsLayer {
    if config.allows_any_origin() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .api
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .expose_headers([header::CONTENT_DISPOSITION])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}

/// JWT authentication middleware layer
///
/// Validates the bearer token and injects an `AuthContext` into the request
/// extensions.
async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_context = authenticate(req.headers(), state.jwt_secret())?;

    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}
