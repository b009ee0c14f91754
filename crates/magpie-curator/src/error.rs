use thiserror::Error;

#[derive(Debug, Error)]
pub enum CuratorError {
    #[error(transparent)]
    Browser(#[from] magpie_browser::BrowserError),

    #[error("store error: {0}")]
    Store(#[from] magpie_core::StoreError),

    /// The stored session no longer authenticates. Callers should re-login,
    /// not retry.
    #[error("session expired or invalid; re-login required")]
    SessionExpired,

    #[error("comment box not found; the post may be restricted")]
    CommentBoxNotFound,

    #[error("post button not found")]
    PostButtonNotFound,

    /// The comment input never cleared. Ambiguous: the comment may still
    /// have been accepted by the remote.
    #[error("comment not verified as posted within {timeout_secs}s")]
    CommentNotVerified { timeout_secs: u64 },

    #[error("scheduler error: {0}")]
    Scheduler(#[from] tokio_cron_scheduler::JobSchedulerError),
}
