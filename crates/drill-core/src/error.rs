use thiserror::Error;

#[derive(Debug, Error)]
pub enum DrillError {
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    #[error("invalid operand length {length}: must be between 1 and {max}")]
    InvalidOperandLength { length: u32, max: u32 },

    #[error("invalid record format: {0}")]
    InvalidRecordFormat(String),

    #[error("invalid answer: {0}")]
    InvalidAnswer(String),

    #[error("set not found: {0}")]
    NotFound(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(String),
}

pub type DrillResult<T> = Result<T, DrillError>;
