//! Error types for relatime-engine operations.
//!
//! Only caller-supplied anchors can fail. Scanning text never does: a
//! phrase that is not recognized simply produces no match.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid datetime: {0}")]
    InvalidDatetime(String),

    #[error("Invalid mode: {0}")]
    InvalidMode(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
