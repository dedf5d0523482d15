use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Model returned an empty response")]
    EmptyResponse,
}
