use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeskError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Source '{source_name}' unavailable: {reason}")]
    SourceUnavailable { source_name: String, reason: String },

    #[error("Unknown customer '{customer_id}'")]
    UnknownCustomer { customer_id: String },

    #[error("Invalid value for {field}: '{value}'")]
    InvalidValue { field: &'static str, value: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type DeskResult<T> = Result<T, DeskError>;
