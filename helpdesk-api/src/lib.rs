//! # Help Desk API Server Library
//!
//! HTTP surface of the help desk: tickets, computer inventory, spreadsheet
//! imports, user administration and statistics.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `middleware`: Security response headers
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
