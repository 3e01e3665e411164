use thiserror::Error;

#[derive(Error, Debug)]
pub enum JournalError {
    #[error("Invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Import error: {0}")]
    Import(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl JournalError {
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        JournalError::Validation {
            field,
            reason: reason.into(),
        }
    }
}

impl From<rusqlite::Error> for JournalError {
    fn from(err: rusqlite::Error) -> Self {
        JournalError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for JournalError {
    fn from(err: serde_json::Error) -> Self {
        JournalError::Serialization(err.to_string())
    }
}

impl From<csv::Error> for JournalError {
    fn from(err: csv::Error) -> Self {
        JournalError::Import(err.to_string())
    }
}

impl From<regex::Error> for JournalError {
    fn from(err: regex::Error) -> Self {
        JournalError::Unknown(format!("Invalid pattern: {}", err))
    }
}

impl<T> From<std::sync::PoisonError<T>> for JournalError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        JournalError::Database(format!("Connection lock poisoned: {}", err))
    }
}

pub type Result<T, E = JournalError> = std::result::Result<T, E>;
