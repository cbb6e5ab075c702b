/// User administration endpoints
///
/// # Endpoints
///
/// - `GET    /v1/users?role=technician` - List users, newest first (technician+)
/// - `GET    /v1/users?staff=true` - Technicians and admins by name, for assignee pickers
/// - `POST   /v1/users` - Create a user with a temporary password (admin)
/// - `PUT    /v1/users/:id` - Update name, role, department (admin)
/// - `DELETE /v1/users/:id` - Delete a user (admin)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use helpdesk_shared::{
    auth::{authorization::require_role, middleware::AuthContext, password},
    models::user::{default_full_name, CreateUser, UpdateUser, User, UserRole},
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Default, Deserialize)]
pub struct ListUsersQuery {
    pub role: Option<UserRole>,

    /// Overrides `role` with every technician and admin
    #[serde(default)]
    pub staff: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(max = 255, message = "Name must be at most 255 characters"))]
    pub full_name: Option<String>,

    #[validate(length(max = 100, message = "Department must be at most 100 characters"))]
    pub department: Option<String>,

    #[serde(default = "default_role")]
    pub role: UserRole,
}

/// Absent fields are left as they are; an empty department clears it
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub full_name: Option<String>,

    pub role: Option<UserRole>,

    #[validate(length(max = 100, message = "Department must be at most 100 characters"))]
    pub department: Option<String>,
}

fn default_role() -> UserRole {
    UserRole::User
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub async fn list_users(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(query): Query<ListUsersQuery>,
) -> ApiResult<Json<Vec<User>>> {
    require_role(&auth, UserRole::Technician)?;

    let users = if query.staff {
        User::list_staff(&state.db).await?
    } else {
        User::list(&state.db, query.role).await?
    };

    Ok(Json(users))
}

/// Creates an account on someone's behalf
///
/// The account gets a random password that is never returned; the user
/// resets it out of band.
///
/// # Errors
///
/// - `409 Conflict`: Email already exists
pub async fn create_user(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(mut req): Json<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<User>)> {
    require_role(&auth, UserRole::Admin)?;
    req.email = req.email.trim().to_string();
    req.validate()?;

    if User::email_exists(&state.db, &req.email).await? {
        return Err(ApiError::Conflict(format!(
            "User with email {} already exists",
            req.email
        )));
    }

    let password_hash = password::hash_password(&password::generate_temporary_password())?;
    let full_name = non_blank(req.full_name).unwrap_or_else(|| default_full_name(&req.email));

    let user = User::create(
        &state.db,
        CreateUser {
            email: req.email,
            password_hash,
            role: req.role,
            full_name,
            department: non_blank(req.department),
        },
    )
    .await?;

    tracing::info!(user_id = %user.id, role = %user.role, created_by = %auth.user_id, "User created");

    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn update_user(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateUserRequest>,
) -> ApiResult<Json<User>> {
    require_role(&auth, UserRole::Admin)?;
    req.validate()?;

    let update = UpdateUser {
        full_name: non_blank(req.full_name),
        role: req.role,
        department: req.department.map(|d| non_blank(Some(d))),
        password_hash: None,
    };

    let user = User::update(&state.db, id, update)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    tracing::info!(user_id = %id, role = %user.role, "User updated");

    Ok(Json(user))
}

/// # Errors
///
/// - `400 Bad Request`: Admin tried to delete their own account
/// - `404 Not Found`: No such user
pub async fn delete_user(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    require_role(&auth, UserRole::Admin)?;

    if id == auth.user_id {
        return Err(ApiError::BadRequest(
            "You cannot delete your own account".to_string(),
        ));
    }

    if !User::delete(&state.db, id).await? {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    tracing::info!(user_id = %id, deleted_by = %auth.user_id, "User deleted");

    Ok(StatusCode::NO_CONTENT)
}
