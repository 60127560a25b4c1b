//! Error types for slot-engine operations.
//!
//! Only malformed input is an error. Business-rule rejections (advance notice,
//! duration, availability, conflicts, cancellation window) are values of
//! [`Rejection`](crate::validator::Rejection) carried in a
//! [`ValidationResult`](crate::validator::ValidationResult).

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulingError {
    #[error("Invalid time of day: {0}")]
    InvalidTime(String),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid interval: start {start} is not before end {end}")]
    InvalidInterval { start: String, end: String },

    #[error("Invalid recurrence rule: {0}")]
    InvalidRule(String),

    #[error("Invalid schedule document: {0}")]
    InvalidDocument(String),
}

pub type Result<T> = std::result::Result<T, SchedulingError>;
