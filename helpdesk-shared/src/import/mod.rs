//! Bulk import of computers and users from `.xlsx` spreadsheets
//!
//! Rows are processed one at a time, in sheet order. A bad row is recorded
//! in the [`ImportReport`](report::ImportReport) and the import moves on;
//! only an unreadable file fails the whole request.
//!
//! # Example
//!
//! ```no_run
//! use helpdesk_shared::import::computers::import_computers;
//! use sqlx::PgPool;
//!
//! # async fn example(pool: PgPool, upload: Vec<u8>) -> Result<(), Box<dyn std::error::Error>> {
//! let report = import_computers(&pool, &upload).await?;
//! println!("{} of {} rows imported", report.successful, report.total);
//! for error in &report.errors {
//!     println!("{}", error);
//! }
//! # Ok(())
//! # }
//! ```

pub mod computers;
pub mod report;
pub mod store;
pub mod templates;
pub mod users;

use crate::spreadsheet::SpreadsheetError;

/// Shown when the upload cannot be decoded
pub const PARSE_FAILURE_MESSAGE: &str =
    "Failed to parse Excel file. Please make sure you are using the correct template.";

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("Failed to parse Excel file. Please make sure you are using the correct template.")]
    Parse(#[source] SpreadsheetError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_message() {
        let err = ImportError::Parse(SpreadsheetError::Read("bad zip".to_string()));
        assert_eq!(err.to_string(), PARSE_FAILURE_MESSAGE);
    }
}
