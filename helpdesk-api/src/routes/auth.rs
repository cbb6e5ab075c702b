/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /v1/auth/register` - Register new user
/// - `POST /v1/auth/login` - Login and get tokens
/// - `POST /v1/auth/refresh` - Refresh access token
/// - `POST /v1/auth/logout` - Acknowledge sign-out
/// - `GET  /v1/auth/me` - Current identity
/// - `PUT  /v1/auth/password` - Change own password

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{extract::State, http::StatusCode, Json};
use helpdesk_shared::{
    auth::{
        jwt::{self, TokenPair},
        middleware::AuthContext,
        password,
    },
    models::user::{default_full_name, CreateUser, UpdateUser, User, UserRole},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters long"))]
    pub password: String,

    /// Defaults to the part of the email before `@`
    #[validate(length(max = 255, message = "Name must be at most 255 characters"))]
    pub full_name: Option<String>,

    #[validate(length(max = 100, message = "Department must be at most 100 characters"))]
    pub department: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    /// New access token (24h)
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

/// The signed-in user
#[derive(Debug, Serialize)]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
    pub role: UserRole,
    pub full_name: String,
    pub department: Option<String>,
}

impl From<User> for Identity {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            role: user.role,
            full_name: user.full_name,
            department: user.department,
        }
    }
}

/// Tokens plus the identity they belong to
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user: Identity,

    #[serde(flatten)]
    pub tokens: TokenPair,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Register a new user
///
/// New accounts always get the `user` role.
///
/// # Errors
///
/// - `409 Conflict`: Email already exists
/// - `422 Unprocessable Entity`: Validation failed
pub async fn register(
    State(state): State<AppState>,
    Json(mut req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<SessionResponse>)> {
    req.email = req.email.trim().to_string();
    req.validate()?;

    let email = req.email;
    let full_name = non_blank(req.full_name).unwrap_or_else(|| default_full_name(&email));
    let password_hash = password::hash_password(&req.password)?;

    let user = User::create(
        &state.db,
        CreateUser {
            email,
            password_hash,
            role: UserRole::User,
            full_name,
            department: non_blank(req.department),
        },
    )
    .await?;

    tracing::info!(user_id = %user.id, "User registered");

    let tokens = TokenPair::issue(user.id, user.role, state.jwt_secret())?;

    Ok((
        StatusCode::CREATED,
        Json(SessionResponse {
            user: user.into(),
            tokens,
        }),
    ))
}

/// Login endpoint
///
/// # Errors
///
/// - `401 Unauthorized`: Invalid credentials
pub async fn login(
    State(state): State<AppState>,
    Json(mut req): Json<LoginRequest>,
) -> ApiResult<Json<SessionResponse>> {
    req.email = req.email.trim().to_string();
    req.validate()?;

    let user = User::find_by_email(&state.db, &req.email)
        .await?
        .ok_or_else(|| ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

    if !password::verify_password(&req.password, &user.password_hash)? {
        tracing::warn!(user_id = %user.id, "Failed login attempt");
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    }

    User::update_last_login(&state.db, user.id).await?;

    let tokens = TokenPair::issue(user.id, user.role, state.jwt_secret())?;

    Ok(Json(SessionResponse {
        user: user.into(),
        tokens,
    }))
}

/// Token refresh endpoint
///
/// The new access token carries the role currently stored for the user.
///
/// # Errors
///
/// - `401 Unauthorized`: Invalid or expired refresh token, or the user is gone
pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<Json<RefreshResponse>> {
    let claims = jwt::validate_refresh_token(&req.refresh_token, state.jwt_secret())?;

    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("User no longer exists".to_string()))?;

    let access_token = jwt::refresh_access_token(&claims, user.role, state.jwt_secret())?;

    Ok(Json(RefreshResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: jwt::TokenType::Access.default_expiration().num_seconds(),
    }))
}

/// Tokens are stateless; the client discards them
pub async fn logout(auth: AuthContext) -> StatusCode {
    tracing::debug!(user_id = %auth.user_id, "User signed out");
    StatusCode::NO_CONTENT
}

pub async fn me(State(state): State<AppState>, auth: AuthContext) -> ApiResult<Json<Identity>> {
    let user = User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(user.into()))
}

/// Change own password
///
/// # Errors
///
/// - `400 Bad Request`: New passwords do not match, too short, or the
///   current password is incorrect
pub async fn change_password(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(req): Json<ChangePasswordRequest>,
) -> ApiResult<StatusCode> {
    password::validate_new_password(&req.new_password, &req.confirm_password)?;

    let user = User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if !password::verify_password(&req.current_password, &user.password_hash)? {
        return Err(ApiError::BadRequest(
            "Current password is incorrect".to_string(),
        ));
    }

    let password_hash = password::hash_password(&req.new_password)?;
    User::update(
        &state.db,
        user.id,
        UpdateUser {
            password_hash: Some(password_hash),
            ..Default::default()
        },
    )
    .await?;

    tracing::info!(user_id = %user.id, "Password changed");

    Ok(StatusCode::NO_CONTENT)
}
