/// Spreadsheet templates and bulk imports
///
/// # Endpoints
///
/// - `GET  /v1/computers/import/template` - Computer template (.xlsx)
/// - `POST /v1/computers/import` - Import computers (technician+)
/// - `GET  /v1/users/import/template` - User template (.xlsx)
/// - `POST /v1/users/import` - Import users (admin)
///
/// Uploads are `multipart/form-data` with the workbook in the `file` field.
/// The response is an [`ImportReport`] even when every row failed; only an
/// unreadable upload is an error.

use crate::{
    app::{AppState, MAX_UPLOAD_BYTES},
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    response::Response,
    Json,
};
use helpdesk_shared::{
    auth::{authorization::require_role, middleware::AuthContext},
    import::{
        computers::import_computers as run_computer_import,
        report::ImportReport,
        templates::{
            computer_template as build_computer_template, user_template as build_user_template,
            COMPUTER_TEMPLATE_FILENAME, USER_TEMPLATE_FILENAME,
        },
        users::import_users as run_user_import,
    },
    models::user::UserRole,
};

use super::xlsx_attachment;

/// Multipart field carrying the workbook
const FILE_FIELD: &str = "file";

/// Maps a multipart failure, keeping the body limit distinct from a malformed upload
fn upload_error(e: MultipartError, context: &str) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(format!(
            "File exceeds the {} MB upload limit",
            MAX_UPLOAD_BYTES / (1024 * 1024)
        ))
    } else {
        ApiError::BadRequest(format!("{}: {}", context, e))
    }
}

/// Pulls the `file` field out of the upload
async fn read_upload(mut multipart: Multipart) -> ApiResult<Vec<u8>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| upload_error(e, "Invalid multipart body"))?
    {
        if field.name() == Some(FILE_FIELD) {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| upload_error(e, "Failed to read upload"))?;
            return Ok(bytes.to_vec());
        }
    }

    Err(ApiError::BadRequest("No file uploaded".to_string()))
}

pub async fn computer_template(_auth: AuthContext) -> ApiResult<Response> {
    xlsx_attachment(COMPUTER_TEMPLATE_FILENAME, build_computer_template()?)
}

pub async fn user_template(_auth: AuthContext) -> ApiResult<Response> {
    xlsx_attachment(USER_TEMPLATE_FILENAME, build_user_template()?)
}

pub async fn import_computers(
    State(state): State<AppState>,
    auth: AuthContext,
    multipart: Multipart,
) -> ApiResult<Json<ImportReport>> {
    require_role(&auth, UserRole::Technician)?;

    let bytes = read_upload(multipart).await?;
    let report = run_computer_import(&state.db, &bytes).await?;

    tracing::info!(
        user_id = %auth.user_id,
        total = report.total,
        successful = report.successful,
        failed = report.failed,
        "Computer import finished"
    );

    Ok(Json(report))
}

pub async fn import_users(
    State(state): State<AppState>,
    auth: AuthContext,
    multipart: Multipart,
) -> ApiResult<Json<ImportReport>> {
    require_role(&auth, UserRole::Admin)?;

    let bytes = read_upload(multipart).await?;
    let report = run_user_import(&state.db, &bytes).await?;

    tracing::info!(
        user_id = %auth.user_id,
        total = report.total,
        successful = report.successful,
        failed = report.failed,
        "User import finished"
    );

    Ok(Json(report))
}
