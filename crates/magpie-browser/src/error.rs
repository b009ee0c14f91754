use thiserror::Error;

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("browser launch failed: {0}")]
    Launch(String),

    #[error("devtools protocol error: {0}")]
    Cdp(#[from] chromiumoxide::error::CdpError),

    #[error("element not found: {selector}")]
    ElementNotFound { selector: String },

    #[error("timed out after {timeout_secs}s waiting for {what}")]
    Timeout { what: String, timeout_secs: u64 },

    #[error("script evaluation failed: {0}")]
    Eval(String),

    #[error("screenshot failed: {0}")]
    Screenshot(String),
}
