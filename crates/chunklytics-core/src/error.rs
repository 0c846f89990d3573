//! Why a log line was rejected

use thiserror::Error;

/// A structurally matched line whose field failed semantic checks.
/// Each variant carries the raw text that was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    #[error("invalid remote address: {0:?}")]
    Address(String),

    #[error("timestamp is not in common log format: {0:?}")]
    Timestamp(String),

    #[error("unknown http method: {0:?}")]
    Method(String),

    #[error("invalid response code: {0:?}")]
    ResponseCode(String),

    #[error("invalid response time: {0:?}")]
    ResponseTime(String),
}

/// Per-line failure. The pipeline counts these, it never aborts on them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LineError {
    #[error("line does not match the access log shape")]
    StructuralMismatch,

    #[error(transparent)]
    FieldInvalid(#[from] FieldError),
}
