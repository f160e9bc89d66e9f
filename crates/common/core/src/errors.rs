use thiserror::Error;

use crate::duty::DutyType;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid hex string")]
    InvalidHexString,

    #[error("Invalid byte length: expected {expected}, got {actual}")]
    InvalidByteLength { expected: usize, actual: usize },

    #[error("Unknown duty type: {0}")]
    UnknownDutyType(String),

    #[error("Duty type {0} has no unsigned data")]
    UnsupportedDutyType(DutyType),

    #[error("Unsigned data of type {actual} does not match duty type {expected}")]
    MismatchedData {
        expected: DutyType,
        actual: DutyType,
    },

    #[error("Json error: {0}")]
    Json(#[from] serde_json::Error),
}
