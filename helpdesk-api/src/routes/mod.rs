/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Authentication endpoints (register, login, refresh, password)
/// - `dashboard`: Ticket counters for the landing page
/// - `tickets`: Tickets, comments, status and assignment
/// - `categories`: Ticket categories
/// - `computers`: Computer inventory, maintenance and software
/// - `users`: User administration
/// - `imports`: Spreadsheet templates and bulk imports
/// - `statistics`: Reporting and `.xlsx` export

pub mod auth;
pub mod categories;
pub mod computers;
pub mod dashboard;
pub mod health;
pub mod imports;
pub mod statistics;
pub mod tickets;
pub mod users;

use axum::{
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
};
use helpdesk_shared::spreadsheet::XLSX_CONTENT_TYPE;

use crate::error::{ApiError, ApiResult};

/// Wraps workbook bytes in a download response
pub(crate) fn xlsx_attachment(filename: &str, bytes: Vec<u8>) -> ApiResult<Response> {
    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", filename))
        .map_err(|e| ApiError::InternalError(format!("Invalid download filename: {}", e)))?;

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(XLSX_CONTENT_TYPE)),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xlsx_attachment_headers() {
        let response = xlsx_attachment("report.xlsx", vec![1, 2, 3]).unwrap();
        let headers = response.headers();

        assert_eq!(headers[header::CONTENT_TYPE], XLSX_CONTENT_TYPE);
        assert_eq!(
            headers[header::CONTENT_DISPOSITION],
            "attachment; filename=\"report.xlsx\""
        );
    }

    #[test]
    fn test_xlsx_attachment_rejects_control_characters() {
        assert!(xlsx_attachment("bad\nname.xlsx", Vec::new()).is_err());
    }
}
