/// Error handling for the API server
///
/// This module provides a unified error type that maps to HTTP responses.
/// All handlers return `Result<T, ApiError>`, which converts to the matching
/// HTTP status and a JSON body `{error, message, details?}`.
///
/// # Example
///
/// ```
/// use helpdesk_api::error::{ApiError, ApiResult};
/// use axum::Json;
/// use serde_json::json;
///
/// async fn handler(found: bool) -> ApiResult<Json<serde_json::Value>> {
///     if !found {
///         return Err(ApiError::NotFound("Ticket not found".to_string()));
///     }
///     Ok(Json(json!({ "ok": true })))
/// }
/// ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use helpdesk_shared::{
    auth::{
        authorization::AuthzError, jwt::JwtError, middleware::AuthError,
        password::{PasswordError, PasswordPolicyError},
    },
    import::ImportError,
    models::assignment::AssignmentError,
    spreadsheet::SpreadsheetError,
    stats::export::ExportError,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400)
    BadRequest(String),

    /// Unauthorized (401)
    Unauthorized(String),

    /// Forbidden (403)
    Forbidden(String),

    /// Not found (404)
    NotFound(String),

    /// Conflict (409) - e.g., duplicate email
    Conflict(String),

    /// Payload too large (413)
    PayloadTooLarge(String),

    /// Unprocessable entity (422) - validation errors
    ValidationError(Vec<ValidationErrorDetail>),

    /// Internal server error (500)
    InternalError(String),
}

/// Validation error detail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

impl ValidationErrorDetail {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "bad_request", "unauthorized")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Optional validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::PayloadTooLarge(msg) => write!(f, "Payload too large: {}", msg),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg, None),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg, None),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg, None),
            ApiError::PayloadTooLarge(msg) => {
                (StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large", msg, None)
            }
            ApiError::ValidationError(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation_error",
                "Request validation failed".to_string(),
                Some(errors),
            ),
            ApiError::InternalError(msg) => {
                // Log internal errors but don't expose details to clients
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}

/// Message for a unique violation on a known constraint
fn unique_violation_message(constraint: &str) -> String {
    match constraint {
        "users_email_key" | "idx_users_email_lower" => "Email already exists".to_string(),
        "computer_assets_asset_tag_key" => "Asset tag already exists".to_string(),
        "ticket_categories_name_key" => "Category name already exists".to_string(),
        "idx_ticket_assignment_open" | "idx_computer_assignment_open" => {
            "Assignment was changed by someone else, please retry".to_string()
        }
        other => format!("Constraint violation: {}", other),
    }
}

/// Message for a foreign key violation on a known constraint
fn foreign_key_message(constraint: &str) -> String {
    match constraint {
        "tickets_category_id_fkey" => "Category is used by existing tickets".to_string(),
        _ => "Record is referenced by other data".to_string(),
    }
}

/// Convert sqlx errors to API errors
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(db_err) => {
                let constraint = db_err.constraint().unwrap_or_default().to_string();

                if db_err.is_unique_violation() {
                    tracing::warn!(constraint = %constraint, "Unique violation");
                    return ApiError::Conflict(unique_violation_message(&constraint));
                }

                if db_err.is_foreign_key_violation() {
                    tracing::warn!(constraint = %constraint, "Foreign key violation");
                    return ApiError::Conflict(foreign_key_message(&constraint));
                }

                // Other database errors are internal
                ApiError::InternalError(format!("Database error: {}", db_err))
            }
            _ => ApiError::InternalError(format!("Database error: {}", err)),
        }
    }
}

/// Convert request validation failures to a 422 with per-field details
impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        let mut errors: Vec<ValidationErrorDetail> = err
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| ValidationErrorDetail {
                    field: field.to_string(),
                    message: error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "Validation failed".to_string()),
                })
            })
            .collect();
        errors.sort_by(|a, b| a.field.cmp(&b.field));
        ApiError::ValidationError(errors)
    }
}

/// Convert auth errors to API errors
impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingCredentials => ApiError::Unauthorized("Missing credentials".to_string()),
            AuthError::InvalidFormat(msg) => ApiError::BadRequest(msg),
            AuthError::InvalidToken(msg) => ApiError::Unauthorized(msg),
        }
    }
}

/// Convert authorization errors to API errors
impl From<AuthzError> for ApiError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::InsufficientRole { required, actual } => {
                tracing::debug!(%required, %actual, "Role check failed");
                ApiError::Forbidden("Insufficient permissions".to_string())
            }
            AuthzError::NotAuthorized => {
                ApiError::Forbidden("Not authorized to access this resource".to_string())
            }
        }
    }
}

/// Convert password errors to API errors
impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::InternalError(format!("Password operation failed: {}", err))
    }
}

impl From<PasswordPolicyError> for ApiError {
    fn from(err: PasswordPolicyError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

/// Convert JWT errors to API errors
impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => ApiError::Unauthorized("Token expired".to_string()),
            JwtError::InvalidIssuer => ApiError::Unauthorized("Invalid token issuer".to_string()),
            JwtError::CreateError(msg) => ApiError::InternalError(msg),
            _ => ApiError::Unauthorized(format!("Invalid token: {}", err)),
        }
    }
}

impl From<AssignmentError> for ApiError {
    fn from(err: AssignmentError) -> Self {
        match err {
            AssignmentError::EntityNotFound(_) | AssignmentError::UserNotFound => {
                ApiError::NotFound(err.to_string())
            }
            AssignmentError::AssigneeNotStaff => ApiError::BadRequest(err.to_string()),
            AssignmentError::Database(db) => db.into(),
        }
    }
}

impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match &err {
            ImportError::Parse(source) => {
                tracing::warn!(error = %source, "Rejected import upload");
                ApiError::BadRequest(err.to_string())
            }
        }
    }
}

impl From<SpreadsheetError> for ApiError {
    fn from(err: SpreadsheetError) -> Self {
        ApiError::InternalError(format!("Spreadsheet generation failed: {}", err))
    }
}

impl From<ExportError> for ApiError {
    fn from(err: ExportError) -> Self {
        let detail = match &err {
            ExportError::Write(source) => source.to_string(),
            ExportError::Serialize(source) => source.to_string(),
        };
        ApiError::InternalError(format!("Statistics export failed: {}", detail))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use helpdesk_shared::models::user::UserRole;

    #[test]
    fn test_error_display() {
        let err = ApiError::BadRequest("Invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: Invalid input");

        let err = ApiError::NotFound("User not found".to_string());
        assert_eq!(err.to_string(), "Not found: User not found");
    }

    #[test]
    fn test_validation_error() {
        let errors = vec![
            ValidationErrorDetail::new("email", "Invalid email format"),
            ValidationErrorDetail::new("password", "Password too short"),
        ];

        let err = ApiError::ValidationError(errors);
        assert_eq!(err.to_string(), "Validation failed: 2 errors");
        assert_eq!(err.into_response().status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_constraint_messages() {
        assert_eq!(unique_violation_message("idx_users_email_lower"), "Email already exists");
        assert_eq!(
            unique_violation_message("computer_assets_asset_tag_key"),
            "Asset tag already exists"
        );
        assert_eq!(
            foreign_key_message("tickets_category_id_fkey"),
            "Category is used by existing tickets"
        );
        for index in ["idx_ticket_assignment_open", "idx_computer_assignment_open"] {
            assert_eq!(
                unique_violation_message(index),
                "Assignment was changed by someone else, please retry"
            );
        }
    }

    #[test]
    fn test_status_codes() {
        let forbidden: ApiError = AuthzError::InsufficientRole {
            required: UserRole::Admin,
            actual: UserRole::User,
        }
        .into();
        assert_eq!(forbidden.into_response().status(), StatusCode::FORBIDDEN);

        let mismatch: ApiError = PasswordPolicyError::Mismatch.into();
        assert_eq!(mismatch.to_string(), "Bad request: New passwords do not match");

        let staff: ApiError = AssignmentError::AssigneeNotStaff.into();
        assert_eq!(staff.into_response().status(), StatusCode::BAD_REQUEST);

        let missing: ApiError = AssignmentError::EntityNotFound("Computer").into();
        assert_eq!(missing.to_string(), "Not found: Computer not found");

        let row: ApiError = sqlx::Error::RowNotFound.into();
        assert_eq!(row.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_parse_failure_is_bad_request() {
        let err: ApiError = ImportError::Parse(SpreadsheetError::Read("zip".to_string())).into();
        assert_eq!(
            err.to_string(),
            format!("Bad request: {}", helpdesk_shared::import::PARSE_FAILURE_MESSAGE)
        );
    }
}
