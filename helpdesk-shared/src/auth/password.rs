/// Password hashing using Argon2id
///
/// # Parameters
///
/// - **Algorithm**: Argon2id
/// - **Memory**: 64 MB (65536 KB)
/// - **Iterations**: 3 passes
/// - **Parallelism**: 4 lanes
/// - **Output**: 32-byte hash
///
/// Also holds the password policy for sign-up and password changes, and the
/// generator for temporary passwords handed to imported or admin-created
/// accounts.
///
/// # Example
///
/// ```
/// use helpdesk_shared::auth::password::{hash_password, verify_password};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("correct horse")?;
/// assert!(verify_password("correct horse", &hash)?);
/// assert!(!verify_password("battery staple", &hash)?);
/// # Ok(())
/// # }
/// ```

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, ParamsBuilder, Version,
};
use rand::{distributions::Alphanumeric, Rng};

/// Shortest password accepted at sign-up or password change
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Length of generated temporary passwords
pub const TEMPORARY_PASSWORD_LENGTH: usize = 12;

/// Error type for password hashing operations
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("Failed to hash password: {0}")]
    HashError(String),

    #[error("Failed to verify password: {0}")]
    VerifyError(String),

    #[error("Invalid password hash format: {0}")]
    InvalidHash(String),
}

/// Password policy violations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PasswordPolicyError {
    #[error("Password must be at least {} characters long", MIN_PASSWORD_LENGTH)]
    TooShort,

    #[error("New passwords do not match")]
    Mismatch,
}

/// Hashes a password with a fresh random salt
///
/// Returns the PHC string, e.g. `$argon2id$v=19$m=65536,t=3,p=4$...`.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    let params = ParamsBuilder::new()
        .m_cost(65536)
        .t_cost(3)
        .p_cost(4)
        .output_len(32)
        .build()
        .map_err(|e| PasswordError::HashError(format!("Invalid parameters: {}", e)))?;

    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params);

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashError(format!("Hash generation failed: {}", e)))?;

    Ok(password_hash.to_string())
}

/// Verifies a password against a stored PHC hash
///
/// `Ok(false)` means the password is wrong; `Err` means the hash itself is
/// unusable.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| PasswordError::InvalidHash(format!("Failed to parse hash: {}", e)))?;

    // Parameters come from the hash string
    let argon2 = Argon2::default();

    match argon2.verify_password(password.as_bytes(), &parsed_hash) {
        Ok(_) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerifyError(format!("Verification failed: {}", e))),
    }
}

/// Checks a password against the minimum length
pub fn validate_password(password: &str) -> Result<(), PasswordPolicyError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(PasswordPolicyError::TooShort);
    }
    Ok(())
}

/// Checks a new password and its confirmation
///
/// A mismatch is reported before the length check.
///
/// ```
/// use helpdesk_shared::auth::password::{validate_new_password, PasswordPolicyError};
///
/// assert_eq!(validate_new_password("secret1", "secret2"), Err(PasswordPolicyError::Mismatch));
/// assert_eq!(validate_new_password("abc", "abc"), Err(PasswordPolicyError::TooShort));
/// assert!(validate_new_password("secret1", "secret1").is_ok());
/// ```
pub fn validate_new_password(new_password: &str, confirm: &str) -> Result<(), PasswordPolicyError> {
    if new_password != confirm {
        return Err(PasswordPolicyError::Mismatch);
    }
    validate_password(new_password)
}

/// Random alphanumeric password for accounts created on someone's behalf
pub fn generate_temporary_password() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TEMPORARY_PASSWORD_LENGTH)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_password() {
        let hash = hash_password("test_password_123").expect("Hash should succeed");

        assert!(hash.starts_with("$argon2id$"));
        assert!(hash.contains("v=19"));
        assert!(hash.contains("m=65536"));
        assert!(hash.contains("t=3"));
        assert!(hash.contains("p=4"));
    }

    #[test]
    fn test_hash_password_produces_different_salts() {
        let hash1 = hash_password("same_password").expect("Hash 1 should succeed");
        let hash2 = hash_password("same_password").expect("Hash 2 should succeed");
        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_verify_password() {
        let hash = hash_password("correct_password").expect("Hash should succeed");

        assert!(verify_password("correct_password", &hash).unwrap());
        assert!(!verify_password("wrong_password", &hash).unwrap());
        assert!(!verify_password("", &hash).unwrap());
    }

    #[test]
    fn test_verify_password_invalid_hash() {
        assert!(verify_password("password", "invalid_hash").is_err());
        // parses as a PHC string, so it is a mismatch rather than an error
        assert!(!verify_password("password", "$argon2id$invalid").unwrap());
    }

    #[test]
    fn test_validate_password_length() {
        assert_eq!(validate_password("12345"), Err(PasswordPolicyError::TooShort));
        assert!(validate_password("123456").is_ok());
        // counted in characters, not bytes
        assert_eq!(validate_password("密码密码密"), Err(PasswordPolicyError::TooShort));
    }

    #[test]
    fn test_policy_messages() {
        assert_eq!(PasswordPolicyError::Mismatch.to_string(), "New passwords do not match");
        assert_eq!(
            PasswordPolicyError::TooShort.to_string(),
            "Password must be at least 6 characters long"
        );
    }

    #[test]
    fn test_temporary_password() {
        let a = generate_temporary_password();
        let b = generate_temporary_password();

        assert_eq!(a.len(), TEMPORARY_PASSWORD_LENGTH);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);

        let hash = hash_password(&a).unwrap();
        assert!(verify_password(&a, &hash).unwrap());
    }
}
