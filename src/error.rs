use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScatterError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config error: {message}")]
    Config { message: String },

    #[error("type mismatch for field '{field}': expected {expected}, got {actual}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("window skip={skip} keep={keep} out of range for cursor of {len} rows")]
    WindowOutOfRange { skip: usize, keep: usize, len: usize },

    #[error("Ingest error: {message}")]
    Ingest { message: String },

    #[error("Query error: {message}")]
    Query { message: String },

    #[error("Replication error: {0}")]
    Replication(String),
}

pub type ScatterResult<T> = Result<T, ScatterError>;
