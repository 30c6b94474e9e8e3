//! State error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StateError {
    #[error("Tab not found: {0}")]
    NotFound(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}
