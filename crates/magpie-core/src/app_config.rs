use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,

    /// Chrome profile directory holding the logged-in session.
    pub browser_profile_dir: PathBuf,
    pub screenshot_dir: PathBuf,
    pub browser_headless: bool,
    pub browser_user_agent: String,

    /// How long to wait for the profile feed response during scraping.
    pub feed_timeout_secs: u64,
    /// How long to wait for the comment box to clear after submitting.
    pub comment_verify_timeout_secs: u64,
    /// Settle time after triggering a like, for client-side animation.
    pub like_settle_ms: u64,

    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub openai_model: String,
    /// Upper bound on image URLs passed per suggestion request.
    pub ai_max_images: usize,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("browser_profile_dir", &self.browser_profile_dir)
            .field("screenshot_dir", &self.screenshot_dir)
            .field("browser_headless", &self.browser_headless)
            .field("browser_user_agent", &self.browser_user_agent)
            .field("feed_timeout_secs", &self.feed_timeout_secs)
            .field(
                "comment_verify_timeout_secs",
                &self.comment_verify_timeout_secs,
            )
            .field("like_settle_ms", &self.like_settle_ms)
            .field(
                "openai_api_key",
                &self.openai_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("openai_base_url", &self.openai_base_url)
            .field("openai_model", &self.openai_model)
            .field("ai_max_images", &self.ai_max_images)
            .finish()
    }
}
