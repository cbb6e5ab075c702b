/// Authentication and authorization
///
/// # Modules
///
/// - [`password`]: Argon2id hashing, password policy, temporary passwords
/// - [`jwt`]: access/refresh token issue and validation
/// - [`middleware`]: bearer token authentication and the `AuthContext` extractor
/// - [`authorization`]: role checks
///
/// # Example
///
/// ```no_run
/// use helpdesk_shared::auth::password::{hash_password, verify_password};
/// use helpdesk_shared::auth::jwt::TokenPair;
/// use helpdesk_shared::models::user::UserRole;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
///
/// let tokens = TokenPair::issue(Uuid::new_v4(), UserRole::User, "secret-key")?;
/// println!("{}", tokens.access_token);
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
