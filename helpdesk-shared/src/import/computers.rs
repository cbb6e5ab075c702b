//! Computer import

use crate::models::computer_asset::{ComputerStatus, ComputerType, CreateComputer};
use crate::spreadsheet::{read_rows, SheetRow};

use super::report::ImportReport;
use super::store::ComputerImportStore;
use super::ImportError;

const REQUIRED: [&str; 5] = ["asset_tag", "name", "type", "manufacturer", "model"];

/// Decodes an upload and imports every data row
pub async fn import_computers<S>(store: &S, bytes: &[u8]) -> Result<ImportReport, ImportError>
where
    S: ComputerImportStore + ?Sized,
{
    let rows = read_rows(bytes).map_err(ImportError::Parse)?;
    Ok(import_computer_rows(store, &rows).await)
}

pub async fn import_computer_rows<S>(store: &S, rows: &[SheetRow]) -> ImportReport
where
    S: ComputerImportStore + ?Sized,
{
    let mut report = ImportReport::new(rows.len());

    for row in rows {
        match import_row(store, row).await {
            Ok(id) => report.record_success(row.row_number, id),
            Err(reason) => {
                tracing::warn!(row = row.row_number, reason = %reason, "Computer row rejected");
                report.record_failure(row.row_number, reason);
            }
        }
    }

    tracing::info!(
        total = report.total,
        successful = report.successful,
        failed = report.failed,
        "Computer import finished"
    );

    report
}

async fn import_row<S>(store: &S, row: &SheetRow) -> Result<uuid::Uuid, String>
where
    S: ComputerImportStore + ?Sized,
{
    let data = parse_row(row)?;

    if store
        .asset_tag_exists(&data.asset_tag)
        .await
        .map_err(|e| e.0)?
    {
        return Err(format!(
            "Computer with asset tag {} already exists",
            data.asset_tag
        ));
    }

    store.insert_computer(data).await.map_err(|e| e.0)
}

/// Validates one row; the error is the reason without the row prefix
pub fn parse_row(row: &SheetRow) -> Result<CreateComputer, String> {
    if REQUIRED.iter().any(|h| row.get(h).is_none()) {
        return Err("Missing required fields".to_string());
    }

    let field = |h: &str| row.get(h).unwrap_or_default().to_string();
    let optional = |h: &str| row.get(h).map(str::to_string);

    let computer_type = field("type")
        .parse::<ComputerType>()
        .map_err(|raw| format!("Invalid type - {}", raw))?;

    let status = match row.get("status") {
        Some(raw) => raw
            .parse::<ComputerStatus>()
            .map_err(|raw| format!("Invalid status - {}", raw))?,
        None => ComputerStatus::Active,
    };

    Ok(CreateComputer {
        asset_tag: field("asset_tag"),
        serial_number: optional("serial_number"),
        name: field("name"),
        computer_type,
        manufacturer: field("manufacturer"),
        model: field("model"),
        status,
        location: optional("location"),
        department: optional("department"),
        specifications: None,
        notes: optional("notes"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::report::RowOutcome;
    use crate::import::store::StoreError;
    use crate::import::templates::computer_template;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use uuid::Uuid;

    #[derive(Default)]
    struct MemoryStore {
        tags: Mutex<Vec<String>>,
        inserted: Mutex<Vec<CreateComputer>>,
        reject_insert: Option<String>,
    }

    impl MemoryStore {
        fn with_tags(tags: &[&str]) -> Self {
            Self {
                tags: Mutex::new(tags.iter().map(|t| t.to_string()).collect()),
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl ComputerImportStore for MemoryStore {
        async fn asset_tag_exists(&self, asset_tag: &str) -> Result<bool, StoreError> {
            Ok(self.tags.lock().unwrap().iter().any(|t| t == asset_tag))
        }

        async fn insert_computer(&self, data: CreateComputer) -> Result<Uuid, StoreError> {
            if let Some(message) = &self.reject_insert {
                return Err(StoreError(message.clone()));
            }
            self.tags.lock().unwrap().push(data.asset_tag.clone());
            self.inserted.lock().unwrap().push(data);
            Ok(Uuid::new_v4())
        }
    }

    fn row(number: usize, pairs: &[(&'static str, &'static str)]) -> SheetRow {
        SheetRow::from_pairs(number, pairs.iter().copied())
    }

    fn complete(number: usize, tag: &'static str) -> SheetRow {
        row(
            number,
            &[
                ("asset_tag", tag),
                ("name", "Build box"),
                ("type", "Desktop"),
                ("manufacturer", "Lenovo"),
                ("model", "M920"),
            ],
        )
    }

    #[tokio::test]
    async fn test_template_imports_cleanly() {
        let store = MemoryStore::default();
        let report = import_computers(&store, &computer_template().unwrap())
            .await
            .unwrap();

        assert_eq!(report.total, 2);
        assert_eq!(report.successful, 2);
        assert_eq!(report.failed, 0);
        assert!(report.errors.is_empty());

        let inserted = store.inserted.lock().unwrap();
        assert_eq!(inserted[0].computer_type, ComputerType::Laptop);
        assert_eq!(inserted[1].location.as_deref(), Some("Reception"));
    }

    #[tokio::test]
    async fn test_unreadable_upload_is_a_parse_error() {
        let store = MemoryStore::default();
        let result = import_computers(&store, b"not a workbook").await;
        assert!(matches!(result, Err(ImportError::Parse(_))));
    }

    #[tokio::test]
    async fn test_missing_required_field() {
        let store = MemoryStore::default();
        let rows = vec![row(
            2,
            &[("asset_tag", "PC-1"), ("name", "x"), ("type", "laptop"), ("model", "T14")],
        )];

        let report = import_computer_rows(&store, &rows).await;

        assert_eq!(report.failed, 1);
        assert_eq!(report.successful, 0);
        assert_eq!(report.errors, vec!["Row 2: Missing required fields".to_string()]);
        assert!(store.inserted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_enumerations() {
        let store = MemoryStore::default();
        let bad_status = row(
            3,
            &[
                ("asset_tag", "PC-3"),
                ("name", "x"),
                ("type", "server"),
                ("manufacturer", "HP"),
                ("model", "DL380"),
                ("status", "broken"),
            ],
        );
        let rows = vec![
            row(
                2,
                &[
                    ("asset_tag", "PC-2"),
                    ("name", "x"),
                    ("type", "tablet"),
                    ("manufacturer", "Apple"),
                    ("model", "iPad"),
                ],
            ),
            bad_status,
        ];

        let report = import_computer_rows(&store, &rows).await;

        assert_eq!(
            report.errors,
            vec![
                "Row 2: Invalid type - tablet".to_string(),
                "Row 3: Invalid status - broken".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_status_defaults_and_case_is_normalised() {
        let store = MemoryStore::default();
        let rows = vec![
            complete(2, "PC-1"),
            row(
                3,
                &[
                    ("asset_tag", "PC-2"),
                    ("name", "Spare"),
                    ("type", "LAPTOP"),
                    ("manufacturer", "Dell"),
                    ("model", "5440"),
                    ("status", "Storage"),
                ],
            ),
        ];

        let report = import_computer_rows(&store, &rows).await;
        assert_eq!(report.successful, 2);

        let inserted = store.inserted.lock().unwrap();
        assert_eq!(inserted[0].status, ComputerStatus::Active);
        assert_eq!(inserted[0].computer_type, ComputerType::Desktop);
        assert_eq!(inserted[1].status, ComputerStatus::Storage);
    }

    #[tokio::test]
    async fn test_existing_asset_tag_is_rejected() {
        let store = MemoryStore::with_tags(&["PC-1"]);
        let rows = vec![complete(2, "PC-1"), complete(3, "PC-2"), complete(4, "PC-2")];

        let report = import_computer_rows(&store, &rows).await;

        assert_eq!(report.successful, 1);
        assert_eq!(report.failed, 2);
        assert_eq!(
            report.errors,
            vec![
                "Row 2: Computer with asset tag PC-1 already exists".to_string(),
                "Row 4: Computer with asset tag PC-2 already exists".to_string(),
            ]
        );
        assert_eq!(store.inserted.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_storage_error_is_reported_per_row() {
        let store = MemoryStore {
            reject_insert: Some("value too long".to_string()),
            ..MemoryStore::default()
        };

        let report = import_computer_rows(&store, &[complete(7, "PC-9")]).await;

        assert_eq!(report.errors, vec!["Row 7: value too long".to_string()]);
        assert_eq!(
            report.rows[0].outcome,
            RowOutcome::Failed {
                reason: "value too long".to_string()
            }
        );
    }
}
