use thiserror::Error;

#[derive(Error, Debug)]
pub enum RetailError {
    #[error("No data found for category '{0}'.")]
    UnknownCategory(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Agent '{agent}' unavailable: {reason}")]
    AgentUnavailable { agent: String, reason: String },

    #[error("Narrative generation failed: {0}")]
    Narrative(String),

    #[error("API Error: {0}")]
    Api(#[from] reqwest::Error),

    #[error("JSON Error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to load {file}: {reason}")]
    DataLoad { file: String, reason: String },

    #[error("Configuration error in {field}: {reason}")]
    Config { field: String, reason: String },
}

impl RetailError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        RetailError::InvalidInput(msg.into())
    }
}

pub type RetailResult<T> = Result<T, RetailError>;

