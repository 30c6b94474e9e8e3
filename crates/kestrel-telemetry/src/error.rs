//! Telemetry error types

use thiserror::Error;

/// Failure to record an ad click for a redirect chain
#[derive(Error, Debug)]
pub enum AttributionError {
    #[error("Storage error: {0}")]
    Storage(#[from] kestrel_storage::StorageError),
}

#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Storage error: {0}")]
    Storage(#[from] kestrel_storage::StorageError),

    #[error("Invalid setting {key}: {value}")]
    InvalidSetting { key: String, value: String },
}
