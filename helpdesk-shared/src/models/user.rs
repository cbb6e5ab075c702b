/// User model and database operations
///
/// Users are everyone who can sign in: requestors, technicians who work
/// tickets, and administrators. The role decides what each may do.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE user_role AS ENUM ('user', 'technician', 'admin');
///
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     email VARCHAR(255) NOT NULL UNIQUE,
///     password_hash VARCHAR(255) NOT NULL,
///     role user_role NOT NULL DEFAULT 'user',
///     full_name VARCHAR(255) NOT NULL,
///     department VARCHAR(255),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     last_login_at TIMESTAMPTZ
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use helpdesk_shared::models::user::{CreateUser, User, UserRole};
/// use helpdesk_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let user = User::create(&pool, CreateUser {
///     email: "jane@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     role: UserRole::Technician,
///     full_name: "Jane Smith".to_string(),
///     department: Some("IT".to_string()),
/// })
/// .await?;
///
/// let found = User::find_by_email(&pool, "JANE@example.com").await?;
/// assert_eq!(found.map(|u| u.id), Some(user.id));
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Access level of a user
///
/// Levels are ordered: `User < Technician < Admin`. A check for a minimum
/// level passes for every higher level too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Files tickets and sees their own equipment
    User,
    /// Works tickets and manages the computer inventory
    Technician,
    /// Full access, including user and category administration
    Admin,
}

impl UserRole {
    /// All roles, lowest first
    pub const ALL: [UserRole; 3] = [UserRole::User, UserRole::Technician, UserRole::Admin];

    fn rank(self) -> u8 {
        match self {
            UserRole::User => 0,
            UserRole::Technician => 1,
            UserRole::Admin => 2,
        }
    }

    /// Returns true if this role is at least `required`
    pub fn at_least(self, required: UserRole) -> bool {
        self.rank() >= required.rank()
    }

    /// Technicians and admins can be assigned tickets
    pub fn is_staff(self) -> bool {
        self.at_least(UserRole::Technician)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            UserRole::User => "user",
            UserRole::Technician => "technician",
            UserRole::Admin => "admin",
        }
    }
}

impl PartialOrd for UserRole {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for UserRole {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = String;

    /// Case-insensitive, surrounding whitespace ignored
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(UserRole::User),
            "technician" => Ok(UserRole::Technician),
            "admin" => Ok(UserRole::Admin),
            _ => Err(s.to_string()),
        }
    }
}

/// User account
///
/// The password hash never leaves the server: it is skipped when the struct
/// is serialized.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID
    pub id: Uuid,

    /// Email address, unique ignoring case
    pub email: String,

    /// Argon2id password hash
    #[serde(skip_serializing, default)]
    pub password_hash: String,

    /// Access level
    pub role: UserRole,

    /// Display name
    pub full_name: String,

    /// Optional department, used for grouping in reports
    pub department: Option<String>,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last updated
    pub updated_at: DateTime<Utc>,

    /// When the user last signed in (None if never)
    pub last_login_at: Option<DateTime<Utc>>,
}

/// Input for creating a new user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    /// Email address, stored lowercase
    pub email: String,

    /// Argon2id password hash (NOT the plaintext password)
    pub password_hash: String,

    pub role: UserRole,

    pub full_name: String,

    pub department: Option<String>,
}

/// Input for updating an existing user
///
/// All fields are optional. Only non-None fields will be updated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUser {
    /// New display name
    pub full_name: Option<String>,

    /// New role
    pub role: Option<UserRole>,

    /// New department (use Some(None) to clear)
    pub department: Option<Option<String>>,

    /// New password hash
    pub password_hash: Option<String>,
}

/// Display name used when sign-up omits one: the local part of the email
///
/// ```
/// use helpdesk_shared::models::user::default_full_name;
/// assert_eq!(default_full_name("john.doe@example.com"), "john.doe");
/// ```
pub fn default_full_name(email: &str) -> String {
    email.split('@').next().unwrap_or(email).to_string()
}

const USER_COLUMNS: &str = "id, email, password_hash, role, full_name, department, \
                            created_at, updated_at, last_login_at";

impl User {
    /// Creates a new user
    ///
    /// # Errors
    ///
    /// Fails with a unique violation on `users_email_key` / `idx_users_email_lower`
    /// if the email is taken.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (email, password_hash, role, full_name, department)
            VALUES (LOWER($1), $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(data.email.trim())
        .bind(data.password_hash)
        .bind(data.role)
        .bind(data.full_name)
        .bind(data.department)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by email address, ignoring case
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = LOWER($1)"
        ))
        .bind(email.trim())
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Returns true if an account with this email exists
    pub async fn email_exists(pool: &PgPool, email: &str) -> Result<bool, sqlx::Error> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM users WHERE LOWER(email) = LOWER($1))",
        )
        .bind(email.trim())
        .fetch_one(pool)
        .await?;

        Ok(exists)
    }

    /// Updates an existing user
    ///
    /// Only non-None fields in `data` are written; `updated_at` is always
    /// bumped. Returns None if the user doesn't exist.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateUser,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE users SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.full_name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", full_name = ${}", bind_count));
        }
        if data.role.is_some() {
            bind_count += 1;
            query.push_str(&format!(", role = ${}", bind_count));
        }
        if data.department.is_some() {
            bind_count += 1;
            query.push_str(&format!(", department = ${}", bind_count));
        }
        if data.password_hash.is_some() {
            bind_count += 1;
            query.push_str(&format!(", password_hash = ${}", bind_count));
        }

        query.push_str(&format!(" WHERE id = $1 RETURNING {USER_COLUMNS}"));

        let mut q = sqlx::query_as::<_, User>(&query).bind(id);

        if let Some(full_name) = data.full_name {
            q = q.bind(full_name);
        }
        if let Some(role) = data.role {
            q = q.bind(role);
        }
        if let Some(department) = data.department {
            q = q.bind(department);
        }
        if let Some(password_hash) = data.password_hash {
            q = q.bind(password_hash);
        }

        let user = q.fetch_optional(pool).await?;

        Ok(user)
    }

    /// Deletes a user by ID
    ///
    /// Tickets they requested are removed with them; tickets and computers
    /// assigned to them become unassigned.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Records a successful sign-in
    pub async fn update_last_login(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET last_login_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists users, newest first, optionally narrowed to one role
    pub async fn list(pool: &PgPool, role: Option<UserRole>) -> Result<Vec<Self>, sqlx::Error> {
        let users = sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE ($1::user_role IS NULL OR role = $1)
            ORDER BY created_at DESC
            "#
        ))
        .bind(role)
        .fetch_all(pool)
        .await?;

        Ok(users)
    }

    /// Technicians and admins, by name; the pool of possible assignees
    pub async fn list_staff(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let users = sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE role IN ('technician', 'admin')
            ORDER BY full_name
            "#
        ))
        .fetch_all(pool)
        .await?;

        Ok(users)
    }
}
