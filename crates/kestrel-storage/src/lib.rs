//! Kestrel Storage Layer
//!
//! SQLite-backed persistence for settings and telemetry counters.

mod database;
mod error;
mod migrations;

pub use database::Database;
pub use error::StorageError;

pub type Result<T> = std::result::Result<T, StorageError>;
