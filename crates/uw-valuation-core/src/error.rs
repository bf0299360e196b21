use thiserror::Error;

/// Errors raised outside the valuation boundary.
///
/// The engine itself never fails: missing aggregates, malformed numbers and
/// unknown factor kinds all resolve to zero. These variants cover decoding
/// documents and strict parsing of user-supplied labels.
#[derive(Debug, Error)]
pub enum UnderwritingError {
    #[error("Invalid input: {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for UnderwritingError {
    fn from(e: serde_json::Error) -> Self {
        UnderwritingError::SerializationError(e.to_string())
    }
}
