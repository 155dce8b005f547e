use thiserror::Error;

/// Unified error type for Stasher.
#[derive(Error, Debug)]
pub enum StasherError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}
