//! Import outcome accounting

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What happened to one data row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RowOutcome {
    Imported { id: Uuid },
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowReport {
    /// Spreadsheet row number, header is row 1
    pub row: usize,

    #[serde(flatten)]
    pub outcome: RowOutcome,
}

/// Summary returned to the uploader
///
/// `errors` holds one `"Row N: reason"` line per failed row, in sheet order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub errors: Vec<String>,
    pub rows: Vec<RowReport>,
}

impl ImportReport {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    pub fn record_success(&mut self, row: usize, id: Uuid) {
        self.successful += 1;
        self.rows.push(RowReport {
            row,
            outcome: RowOutcome::Imported { id },
        });
    }

    pub fn record_failure(&mut self, row: usize, reason: impl Into<String>) {
        let reason = reason.into();
        self.failed += 1;
        self.errors.push(format!("Row {}: {}", row, reason));
        self.rows.push(RowReport {
            row,
            outcome: RowOutcome::Failed { reason },
        });
    }

    /// Ids of the rows that made it in
    pub fn imported_ids(&self) -> Vec<Uuid> {
        self.rows
            .iter()
            .filter_map(|r| match r.outcome {
                RowOutcome::Imported { id } => Some(id),
                RowOutcome::Failed { .. } => None,
            })
            .collect()
    }
}
