use thiserror::Error;

#[derive(Debug, Error)]
pub enum AiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("AI service returned status {status}: {body}")]
    Api { status: u16, body: String },

    #[error("AI response contained no content")]
    EmptyResponse,

    #[error("malformed suggestion payload: {0}")]
    Malformed(#[from] serde_json::Error),
}
