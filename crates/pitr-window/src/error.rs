//! Error types for pitr-window operations.
//!
//! The engine itself never fails: timestamp parsing yields `Option`, timeline
//! construction yields a possibly-empty [`Timeline`](crate::Timeline), and
//! validation yields a [`ValidationResult`](crate::ValidationResult). These
//! errors only surface at the boundaries where callers hand in raw payloads or
//! ask for a restore target.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PitrError {
    #[error("Invalid window descriptor: {0}")]
    InvalidDescriptor(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Not recoverable: {0}")]
    NotRecoverable(String),
}

pub type Result<T> = std::result::Result<T, PitrError>;
