use thiserror::Error;

#[derive(Debug, Error)]
pub enum WarrantLensError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Invalid warrant symbol: {0}")]
    InvalidSymbol(String),

    #[error("Date error: {0}")]
    DateError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for WarrantLensError {
    fn from(e: serde_json::Error) -> Self {
        WarrantLensError::SerializationError(e.to_string())
    }
}
