//! Shared error-code space for API replies.
//!
//! Every reply carries an `i32` result code: 0 is success, negative is a
//! failure from this space. Device failures pass the backend's own
//! negative code through verbatim.

use thiserror::Error;

/// Failure of a control-plane operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("unspecified failure")]
    Unspecified,

    #[error("identifier is not a valid dataplane interface")]
    InvalidIndex,

    #[error("no such pair")]
    NotFound,

    #[error("interface already has a live pair")]
    AlreadyPaired,

    #[error("a replace transaction is already active")]
    AlreadyActive,

    #[error("no replace transaction is active")]
    NotActive,

    #[error("malformed request")]
    BadRequest,

    #[error("device operation failed with code {0}")]
    Device(i32),
}

impl ApiError {
    /// Wire result code. Success (0) is never produced here.
    pub fn code(self) -> i32 {
        match self {
            ApiError::Unspecified => -1,
            ApiError::InvalidIndex => -2,
            ApiError::NotFound => -3,
            ApiError::AlreadyPaired => -4,
            ApiError::AlreadyActive => -5,
            ApiError::NotActive => -6,
            ApiError::BadRequest => -7,
            // Backends report errno-style negative codes.
            ApiError::Device(code) => code,
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
