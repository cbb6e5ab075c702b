//! # Help Desk Shared Library
//!
//! Storage, auth primitives and business logic behind the help desk API.
//!
//! ## Module Organization
//!
//! - `db`: connection pool and embedded migrations
//! - `models`: tables and the SQL that reads and writes them
//! - `auth`: password hashing, JWT, request auth context, role checks
//! - `spreadsheet`: `.xlsx` reading and writing
//! - `import`: bulk computer and user import
//! - `stats`: statistics aggregation and export
//! - `bootstrap`: first administrator account

pub mod auth;
pub mod bootstrap;
pub mod db;
pub mod import;
pub mod models;
pub mod spreadsheet;
pub mod stats;

/// Current version of the shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
