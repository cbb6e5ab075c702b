/// Request authentication for Axum
///
/// Bearer tokens from the `Authorization` header are validated and turned
/// into an [`AuthContext`], which the router's auth layer stores in the
/// request extensions. Handlers take `AuthContext` as an extractor argument.
///
/// # Example
///
/// ```no_run
/// use helpdesk_shared::auth::middleware::AuthContext;
///
/// async fn whoami(auth: AuthContext) -> String {
///     format!("{} ({})", auth.user_id, auth.role)
/// }
/// ```

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::jwt::{validate_access_token, Claims, JwtError};
use crate::models::user::UserRole;

/// The authenticated caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub role: UserRole,
}

impl AuthContext {
    pub fn from_claims(claims: &Claims) -> Self {
        Self {
            user_id: claims.sub,
            role: claims.role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    pub fn is_staff(&self) -> bool {
        self.role.is_staff()
    }
}

/// Why a request could not be authenticated
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing authorization header")]
    MissingCredentials,

    #[error("{0}")]
    InvalidFormat(String),

    #[error("{0}")]
    InvalidToken(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match self {
            AuthError::MissingCredentials | AuthError::InvalidToken(_) => StatusCode::UNAUTHORIZED,
            AuthError::InvalidFormat(_) => StatusCode::BAD_REQUEST,
        };
        (status, self.to_string()).into_response()
    }
}

/// Validates the bearer token in `headers`
pub fn authenticate(headers: &HeaderMap, secret: &str) -> Result<AuthContext, AuthError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AuthError::InvalidFormat("Expected Bearer token".to_string()))?;

    let claims = validate_access_token(token, secret).map_err(|e| match e {
        JwtError::Expired => AuthError::InvalidToken("Token expired".to_string()),
        JwtError::InvalidIssuer => AuthError::InvalidToken("Invalid issuer".to_string()),
        _ => AuthError::InvalidToken(format!("Invalid token: {}", e)),
    })?;

    Ok(AuthContext::from_claims(&claims))
}

/// Pulls the context stored by the auth layer; 401 when the route was
/// mounted without it
#[async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .copied()
            .ok_or(AuthError::MissingCredentials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::{create_token, TokenType};
    use axum::http::HeaderValue;

    const SECRET: &str = "middleware-test-secret-at-least-32-bytes";

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        headers
    }

    #[test]
    fn test_authenticate_valid_token() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id, UserRole::Technician, TokenType::Access);
        let token = create_token(&claims, SECRET).unwrap();

        let ctx = authenticate(&bearer(&token), SECRET).unwrap();
        assert_eq!(ctx.user_id, user_id);
        assert_eq!(ctx.role, UserRole::Technician);
        assert!(ctx.is_staff());
        assert!(!ctx.is_admin());
    }

    #[test]
    fn test_authenticate_missing_header() {
        let result = authenticate(&HeaderMap::new(), SECRET);
        assert!(matches!(result, Err(AuthError::MissingCredentials)));
    }

    #[test]
    fn test_authenticate_rejects_basic_auth() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));

        let result = authenticate(&headers, SECRET);
        assert!(matches!(result, Err(AuthError::InvalidFormat(_))));
    }

    #[test]
    fn test_authenticate_rejects_refresh_token() {
        let claims = Claims::new(Uuid::new_v4(), UserRole::User, TokenType::Refresh);
        let token = create_token(&claims, SECRET).unwrap();

        let result = authenticate(&bearer(&token), SECRET);
        assert!(matches!(result, Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn test_auth_error_into_response() {
        assert_eq!(
            AuthError::MissingCredentials.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::InvalidFormat("x".to_string()).into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AuthError::InvalidToken("x".to_string()).into_response().status(),
            StatusCode::UNAUTHORIZED
        );
    }
}
