//! Storage seam for imports
//!
//! The import loops only need an existence check and an insert per entity.
//! [`PgPool`] implements both traits; tests use in-memory stores.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::computer_asset::{ComputerAsset, CreateComputer};
use crate::models::user::{CreateUser, User};

/// A storage failure, carried as the message shown in the row report
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct StoreError(pub String);

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError(storage_message(&err))
    }
}

/// The database's own message when there is one
pub fn storage_message(err: &sqlx::Error) -> String {
    match err.as_database_error() {
        Some(db_err) => db_err.message().to_string(),
        None => err.to_string(),
    }
}

#[async_trait]
pub trait ComputerImportStore: Send + Sync {
    async fn asset_tag_exists(&self, asset_tag: &str) -> Result<bool, StoreError>;

    async fn insert_computer(&self, data: CreateComputer) -> Result<Uuid, StoreError>;
}

#[async_trait]
pub trait UserImportStore: Send + Sync {
    async fn email_exists(&self, email: &str) -> Result<bool, StoreError>;

    async fn insert_user(&self, data: CreateUser) -> Result<Uuid, StoreError>;
}

#[async_trait]
impl ComputerImportStore for PgPool {
    async fn asset_tag_exists(&self, asset_tag: &str) -> Result<bool, StoreError> {
        Ok(ComputerAsset::asset_tag_exists(self, asset_tag).await?)
    }

    async fn insert_computer(&self, data: CreateComputer) -> Result<Uuid, StoreError> {
        Ok(ComputerAsset::create(self, data).await?.id)
    }
}

#[async_trait]
impl UserImportStore for PgPool {
    async fn email_exists(&self, email: &str) -> Result<bool, StoreError> {
        Ok(User::email_exists(self, email).await?)
    }

    async fn insert_user(&self, data: CreateUser) -> Result<Uuid, StoreError> {
        Ok(User::create(self, data).await?.id)
    }
}
