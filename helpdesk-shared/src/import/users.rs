//! User import
//!
//! Every imported account gets a random temporary password. Only its hash
//! is stored; the plaintext is dropped once hashed.

use uuid::Uuid;
use validator::ValidateEmail;

use crate::auth::password::{generate_temporary_password, hash_password};
use crate::models::user::{CreateUser, UserRole};
use crate::spreadsheet::{read_rows, SheetRow};

use super::report::ImportReport;
use super::store::UserImportStore;
use super::ImportError;

/// A validated row, before a password is attached
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRow {
    pub email: String,
    pub full_name: String,
    pub department: String,
    pub role: UserRole,
}

pub async fn import_users<S>(store: &S, bytes: &[u8]) -> Result<ImportReport, ImportError>
where
    S: UserImportStore + ?Sized,
{
    let rows = read_rows(bytes).map_err(ImportError::Parse)?;
    Ok(import_user_rows(store, &rows).await)
}

pub async fn import_user_rows<S>(store: &S, rows: &[SheetRow]) -> ImportReport
where
    S: UserImportStore + ?Sized,
{
    let mut report = ImportReport::new(rows.len());

    for row in rows {
        match import_row(store, row).await {
            Ok(id) => report.record_success(row.row_number, id),
            Err(reason) => {
                tracing::warn!(row = row.row_number, reason = %reason, "User row rejected");
                report.record_failure(row.row_number, reason);
            }
        }
    }

    tracing::info!(
        total = report.total,
        successful = report.successful,
        failed = report.failed,
        "User import finished"
    );

    report
}

async fn import_row<S>(store: &S, row: &SheetRow) -> Result<Uuid, String>
where
    S: UserImportStore + ?Sized,
{
    let parsed = parse_row(row)?;

    if store.email_exists(&parsed.email).await.map_err(|e| e.0)? {
        return Err(format!("User with email {} already exists", parsed.email));
    }

    let password_hash =
        hash_password(&generate_temporary_password()).map_err(|e| e.to_string())?;

    store
        .insert_user(CreateUser {
            email: parsed.email,
            password_hash,
            role: parsed.role,
            full_name: parsed.full_name,
            department: Some(parsed.department),
        })
        .await
        .map_err(|e| e.0)
}

/// Validates one row; the error is the reason without the row prefix
pub fn parse_row(row: &SheetRow) -> Result<UserRow, String> {
    let (Some(email), Some(full_name), Some(department), Some(role)) = (
        row.get("email"),
        row.get("full_name"),
        row.get("department"),
        row.get("role"),
    ) else {
        return Err("Missing required fields".to_string());
    };

    if !email.validate_email() {
        return Err(format!("Invalid email format - {}", email));
    }

    let role = role
        .parse::<UserRole>()
        .map_err(|raw| format!("Invalid role - {}", raw))?;

    Ok(UserRow {
        email: email.to_string(),
        full_name: full_name.to_string(),
        department: department.to_string(),
        role,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::verify_password;
    use crate::import::store::StoreError;
    use crate::import::templates::user_template;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryStore {
        emails: Mutex<Vec<String>>,
        inserted: Mutex<Vec<CreateUser>>,
    }

    #[async_trait]
    impl UserImportStore for MemoryStore {
        async fn email_exists(&self, email: &str) -> Result<bool, StoreError> {
            let wanted = email.to_lowercase();
            Ok(self.emails.lock().unwrap().iter().any(|e| *e == wanted))
        }

        async fn insert_user(&self, data: CreateUser) -> Result<Uuid, StoreError> {
            self.emails.lock().unwrap().push(data.email.to_lowercase());
            self.inserted.lock().unwrap().push(data);
            Ok(Uuid::new_v4())
        }
    }

    fn row(number: usize, email: &'static str, role: &'static str) -> SheetRow {
        SheetRow::from_pairs(
            number,
            [
                ("email", email),
                ("full_name", "Pat Example"),
                ("department", "Finance"),
                ("role", role),
            ],
        )
    }

    #[test]
    fn test_parse_row() {
        let parsed = parse_row(&row(2, "pat@example.com", "Technician")).unwrap();
        assert_eq!(parsed.role, UserRole::Technician);
        assert_eq!(parsed.department, "Finance");

        assert_eq!(
            parse_row(&row(2, "not-an-email", "user")),
            Err("Invalid email format - not-an-email".to_string())
        );
        assert_eq!(
            parse_row(&row(2, "pat@example.com", "owner")),
            Err("Invalid role - owner".to_string())
        );

        let incomplete = SheetRow::from_pairs(2, [("email", "pat@example.com"), ("role", "user")]);
        assert_eq!(parse_row(&incomplete), Err("Missing required fields".to_string()));
    }

    #[tokio::test]
    async fn test_template_imports_with_hashed_temporary_passwords() {
        let store = MemoryStore::default();
        let report = import_users(&store, &user_template().unwrap()).await.unwrap();

        assert_eq!(report.successful, 2);
        assert_eq!(report.failed, 0);

        let inserted = store.inserted.lock().unwrap();
        assert_eq!(inserted[1].role, UserRole::Technician);
        assert!(inserted[0].password_hash.starts_with("$argon2id$"));
        assert_ne!(inserted[0].password_hash, inserted[1].password_hash);
        assert!(!verify_password("", &inserted[0].password_hash).unwrap());
    }

    #[tokio::test]
    async fn test_failed_rows_never_insert() {
        let store = MemoryStore::default();
        store.emails.lock().unwrap().push("taken@example.com".to_string());

        let rows = vec![
            row(2, "Taken@Example.com", "user"),
            row(3, "bad-address", "user"),
            row(4, "new@example.com", "superuser"),
        ];
        let report = import_user_rows(&store, &rows).await;

        assert_eq!(report.total, 3);
        assert_eq!(report.successful, 0);
        assert_eq!(report.failed, 3);
        assert_eq!(
            report.errors,
            vec![
                "Row 2: User with email Taken@Example.com already exists".to_string(),
                "Row 3: Invalid email format - bad-address".to_string(),
                "Row 4: Invalid role - superuser".to_string(),
            ]
        );
        assert!(store.inserted.lock().unwrap().is_empty());
    }
}
