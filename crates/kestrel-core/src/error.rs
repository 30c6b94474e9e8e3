//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Storage error: {0}")]
    Storage(#[from] kestrel_storage::StorageError),

    #[error("State error: {0}")]
    State(#[from] kestrel_state::StateError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] kestrel_telemetry::TelemetryError),

    #[error("Attribution error: {0}")]
    Attribution(#[from] kestrel_telemetry::AttributionError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}
