// ⚠️ Error Types - one error enum for the library
// Binaries wrap these in anyhow; the API maps them to HTTP status codes

use crate::payments::PaymentRejection;
use crate::validation::ValidationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0} not found")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),

    #[error("payment rejected: {0}")]
    PaymentRejected(PaymentRejection),
}

impl From<Vec<ValidationError>> for TrackerError {
    fn from(errors: Vec<ValidationError>) -> Self {
        TrackerError::Validation(errors)
    }
}

impl From<PaymentRejection> for TrackerError {
    fn from(rejection: PaymentRejection) -> Self {
        TrackerError::PaymentRejected(rejection)
    }
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

pub type TrackerResult<T> = Result<T, TrackerError>;
