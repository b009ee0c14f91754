use std::path::PathBuf;

use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Default desktop user agent presented by the browsing session.
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the
/// process, without touching `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup.
///
/// The parsing/validation logic is decoupled from the real environment so
/// it can be tested with a pure `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_bool = |var: &str, default: bool| -> Result<bool, ConfigError> {
        match lookup(var) {
            Err(_) => Ok(default),
            Ok(raw) => match raw.as_str() {
                "true" | "1" => Ok(true),
                "false" | "0" => Ok(false),
                other => Err(ConfigError::InvalidEnvVar {
                    var: var.to_string(),
                    reason: format!("expected true/false, got \"{other}\""),
                }),
            },
        }
    };

    let env = parse_environment(&or_default("MAGPIE_ENV", "development"));
    let log_level = or_default("MAGPIE_LOG_LEVEL", "info");

    let browser_profile_dir = PathBuf::from(or_default(
        "MAGPIE_BROWSER_PROFILE_DIR",
        "./data/browser-profile",
    ));
    let screenshot_dir = PathBuf::from(or_default("MAGPIE_SCREENSHOT_DIR", "./data/screenshots"));
    let browser_headless = parse_bool("MAGPIE_BROWSER_HEADLESS", true)?;
    let browser_user_agent = or_default("MAGPIE_BROWSER_USER_AGENT", DEFAULT_USER_AGENT);

    let feed_timeout_secs = parse_u64("MAGPIE_FEED_TIMEOUT_SECS", "15")?;
    let comment_verify_timeout_secs = parse_u64("MAGPIE_COMMENT_VERIFY_TIMEOUT_SECS", "10")?;
    let like_settle_ms = parse_u64("MAGPIE_LIKE_SETTLE_MS", "1000")?;

    let openai_api_key = lookup("OPENAI_API_KEY").ok();
    let openai_base_url = or_default("MAGPIE_OPENAI_BASE_URL", "https://api.openai.com/v1");
    let openai_model = or_default("MAGPIE_OPENAI_MODEL", "gpt-5-nano");
    let ai_max_images = parse_usize("MAGPIE_AI_MAX_IMAGES", "4")?;

    Ok(AppConfig {
        env,
        log_level,
        browser_profile_dir,
        screenshot_dir,
        browser_headless,
        browser_user_agent,
        feed_timeout_secs,
        comment_verify_timeout_secs,
        like_settle_ms,
        openai_api_key,
        openai_base_url,
        openai_model,
        ai_max_images,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}
