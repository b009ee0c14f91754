//! Storage collaborator interface and the in-memory implementation.
//!
//! The pipeline does not own a storage engine. It consumes the operations
//! below from whatever backend the host application wires in; [`MemoryStore`]
//! satisfies the same contract for tests and the bundled CLI.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::posts::CuratedPost;

/// A profile the pipeline watches. Disabled profiles are kept but skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedProfile {
    pub handle: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Running,
    Success,
    Failed,
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunStatus::Running => write!(f, "running"),
            RunStatus::Success => write!(f, "success"),
            RunStatus::Failed => write!(f, "failed"),
        }
    }
}

/// One end-to-end execution of the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Run {
    pub id: i64,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub status: RunStatus,
    pub message: Option<String>,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found: {0}")]
    NotFound(String),

    #[error("store backend error: {0}")]
    Backend(String),
}

/// Operations the pipeline consumes from its storage collaborator.
///
/// `upsert_curated_posts` is idempotent by `shortcode`: implementations
/// update engagement counters, score, caption, and media fields in place,
/// must preserve `user_comment` and `seen`, and must not clear previously
/// stored suggestions when the incoming record carries none.
#[async_trait]
pub trait Store: Send + Sync {
    async fn list_profiles(&self) -> Result<Vec<TrackedProfile>, StoreError>;

    /// Creates a run in `Running` status and returns its id.
    async fn create_run(&self) -> Result<i64, StoreError>;

    async fn complete_run(
        &self,
        run_id: i64,
        status: RunStatus,
        message: &str,
    ) -> Result<(), StoreError>;

    /// The most recently created run, if any. Triggers use this to refuse
    /// starting a new run while one is still `Running`.
    async fn latest_run(&self) -> Result<Option<Run>, StoreError>;

    async fn upsert_curated_posts(&self, posts: Vec<CuratedPost>) -> Result<(), StoreError>;

    async fn get_post(&self, shortcode: &str) -> Result<Option<CuratedPost>, StoreError>;

    /// Records the comment the user published on a post.
    async fn set_user_comment(&self, shortcode: &str, comment: &str) -> Result<(), StoreError>;

    async fn get_setting(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn set_setting(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

#[derive(Default)]
struct MemoryInner {
    profiles: Vec<TrackedProfile>,
    runs: Vec<Run>,
    posts: HashMap<String, CuratedPost>,
    settings: HashMap<String, String>,
    next_run_id: i64,
}

/// Mutex-guarded in-memory store. State lives for the process lifetime.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds tracked profiles, replacing any existing list.
    pub fn set_profiles(&self, profiles: Vec<TrackedProfile>) {
        self.lock().profiles = profiles;
    }

    /// All persisted posts, in no particular order. Test/debug helper.
    pub fn all_posts(&self) -> Vec<CuratedPost> {
        self.lock().posts.values().cloned().collect()
    }

    pub fn runs(&self) -> Vec<Run> {
        self.lock().runs.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryInner> {
        // A poisoned lock only happens after a panic elsewhere; the data is
        // still structurally sound for reads and writes.
        self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn list_profiles(&self) -> Result<Vec<TrackedProfile>, StoreError> {
        Ok(self.lock().profiles.clone())
    }

    async fn create_run(&self) -> Result<i64, StoreError> {
        let mut inner = self.lock();
        inner.next_run_id += 1;
        let id = inner.next_run_id;
        inner.runs.push(Run {
            id,
            started_at: Utc::now(),
            finished_at: None,
            status: RunStatus::Running,
            message: None,
        });
        Ok(id)
    }

    async fn complete_run(
        &self,
        run_id: i64,
        status: RunStatus,
        message: &str,
    ) -> Result<(), StoreError> {
        let mut inner = self.lock();
        let run = inner
            .runs
            .iter_mut()
            .find(|r| r.id == run_id)
            .ok_or_else(|| StoreError::NotFound(format!("run {run_id}")))?;
        run.finished_at = Some(Utc::now());
        run.status = status;
        run.message = Some(message.to_owned());
        Ok(())
    }

    async fn latest_run(&self) -> Result<Option<Run>, StoreError> {
        Ok(self.lock().runs.last().cloned())
    }

    async fn upsert_curated_posts(&self, posts: Vec<CuratedPost>) -> Result<(), StoreError> {
        let mut inner = self.lock();
        for post in posts {
            match inner.posts.entry(post.shortcode.clone()) {
                Entry::Occupied(mut slot) => {
                    let existing = slot.get_mut();
                    existing.run_id = post.run_id;
                    existing.profile_handle = post.profile_handle;
                    existing.post_url = post.post_url;
                    existing.posted_at = post.posted_at;
                    existing.comment_count = post.comment_count;
                    existing.like_count = post.like_count;
                    existing.score = post.score;
                    existing.media_type = post.media_type;
                    existing.caption = post.caption;
                    existing.accessibility_caption = post.accessibility_caption;
                    existing.has_liked = post.has_liked;
                    existing.username = post.username;
                    existing.media_urls = post.media_urls;
                    if !post.suggested_comments.is_empty() {
                        existing.suggested_comments = post.suggested_comments;
                    }
                    if post.ai_score.is_some() {
                        existing.ai_score = post.ai_score;
                    }
                    // user_comment and seen are deliberately untouched.
                }
                Entry::Vacant(slot) => {
                    slot.insert(post);
                }
            }
        }
        Ok(())
    }

    async fn get_post(&self, shortcode: &str) -> Result<Option<CuratedPost>, StoreError> {
        Ok(self.lock().posts.get(shortcode).cloned())
    }

    async fn set_user_comment(&self, shortcode: &str, comment: &str) -> Result<(), StoreError> {
        let mut inner = self.lock();
        let post = inner
            .posts
            .get_mut(shortcode)
            .ok_or_else(|| StoreError::NotFound(format!("post {shortcode}")))?;
        post.user_comment = Some(comment.to_owned());
        Ok(())
    }

    async fn get_setting(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.lock().settings.get(key).cloned())
    }

    async fn set_setting(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.lock().settings.insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}
