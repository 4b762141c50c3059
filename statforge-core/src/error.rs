use thiserror::Error;

#[derive(Error, Debug)]
pub enum StatforgeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Empty text - nothing to parse")]
    EmptyInput,
}

pub type Result<T> = std::result::Result<T, StatforgeError>;
