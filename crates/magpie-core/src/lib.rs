pub mod app_config;
pub mod config;
pub mod notify;
pub mod posts;
pub mod store;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use notify::{LogNotifier, Notification, Notifier, NotifyError};
pub use posts::{CandidatePost, CuratedPost, MediaType, ScoredCandidate};
pub use store::{MemoryStore, Run, RunStatus, Store, StoreError, TrackedProfile};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
