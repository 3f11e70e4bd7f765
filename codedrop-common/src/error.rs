// codedrop-common/src/error.rs

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Not found error: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Code source error: {0}")]
    CodeLoad(String),

    #[error("Code pool exhausted")]
    PoolExhausted,

    #[error("Duplicate claim: participant {participant_id} already holds a record for event {event_id}")]
    DuplicateClaim {
        event_id: Uuid,
        participant_id: Uuid,
    },

    #[error("Delivery error: {0}")]
    Delivery(String),

    #[error("Invalid event state: {0}")]
    InvalidState(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Parse(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Parse(s.to_string())
    }
}

impl From<anyhow::Error> for Error {
    fn from(e: anyhow::Error) -> Self {
        Error::Parse(e.to_string())
    }
}
