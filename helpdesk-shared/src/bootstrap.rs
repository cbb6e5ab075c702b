//! First administrator
//!
//! A fresh database has no way in. At startup the server can be given an
//! admin email and password; the account is created only when no user with
//! that email exists, so an existing account is never touched.

use sqlx::PgPool;

use crate::auth::password::{hash_password, validate_password, PasswordError, PasswordPolicyError};
use crate::models::user::{default_full_name, CreateUser, User, UserRole};

#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("Admin password rejected: {0}")]
    Policy(#[from] PasswordPolicyError),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone)]
pub enum BootstrapOutcome {
    Created(User),
    AlreadyExists,
}

pub async fn ensure_admin(
    pool: &PgPool,
    email: &str,
    password: &str,
) -> Result<BootstrapOutcome, BootstrapError> {
    if User::email_exists(pool, email).await? {
        tracing::debug!(email = %email, "Bootstrap admin already present");
        return Ok(BootstrapOutcome::AlreadyExists);
    }

    validate_password(password)?;

    let user = User::create(
        pool,
        CreateUser {
            email: email.to_string(),
            password_hash: hash_password(password)?,
            role: UserRole::Admin,
            full_name: default_full_name(email),
            department: None,
        },
    )
    .await?;

    tracing::info!(user_id = %user.id, email = %user.email, "Created bootstrap admin");

    Ok(BootstrapOutcome::Created(user))
}
