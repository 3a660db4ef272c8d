use engine::SourceError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProviderError>;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Failed to parse JSON: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Upstream returned {status} for {url}")]
    StatusError { status: u16, url: String },

    #[error("Gave up on {url} after {attempts} attempts")]
    Exhausted { url: String, attempts: u32 },

    #[error("Missing data: {0}")]
    MissingData(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<ProviderError> for SourceError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::ParseError(e) => SourceError::Malformed(e.to_string()),
            ProviderError::MissingData(what) => SourceError::Malformed(what),
            other => SourceError::Unavailable(other.to_string()),
        }
    }
}
