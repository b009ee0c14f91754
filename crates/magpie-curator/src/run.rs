//! The run orchestrator: one invocation scrapes every enabled profile,
//! scores, selects, enriches, persists, and notifies.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use magpie_ai::CommentComposer;
use magpie_browser::{PageDriver, SessionProvider};
use magpie_core::{CuratedPost, Notification, Notifier, RunStatus, ScoredCandidate, Store};
use tokio::task::JoinHandle;

use crate::commenter::{self, CommenterOptions};
use crate::enrich::{self, EnrichOutcome, EnrichRequest};
use crate::error::CuratorError;
use crate::platform;
use crate::progress::{ProgressHandle, TaskStatus, TASK_DONE, TASK_INITIALIZING};
use crate::schedule;
use crate::score;
use crate::scrape;
use crate::select;

/// Jittered pause after scraping each profile, so profile loads don't fire
/// back-to-back.
const PROFILE_PAUSE_MIN_MS: u64 = 1_000;
const PROFILE_PAUSE_SPREAD_MS: f64 = 2_000.0;

/// Tunables threaded in from configuration.
#[derive(Debug, Clone)]
pub struct CuratorOptions {
    pub feed_timeout: Duration,
    pub comment_verify_timeout: Duration,
    pub like_settle: Duration,
    pub screenshot_dir: PathBuf,
    /// Upper bound on image URLs passed per suggestion request.
    pub max_images_per_request: usize,
}

impl Default for CuratorOptions {
    fn default() -> Self {
        Self {
            feed_timeout: Duration::from_secs(15),
            comment_verify_timeout: Duration::from_secs(10),
            like_settle: Duration::from_secs(1),
            screenshot_dir: PathBuf::from("./data/screenshots"),
            max_images_per_request: 4,
        }
    }
}

/// Owns the pipeline's collaborators and the process-wide progress cell.
pub struct Curator {
    store: Arc<dyn Store>,
    notifier: Arc<dyn Notifier>,
    composer: Arc<dyn CommentComposer>,
    sessions: Arc<dyn SessionProvider>,
    progress: ProgressHandle,
    options: CuratorOptions,
}

impl Curator {
    #[must_use]
    pub fn new(
        store: Arc<dyn Store>,
        notifier: Arc<dyn Notifier>,
        composer: Arc<dyn CommentComposer>,
        sessions: Arc<dyn SessionProvider>,
        options: CuratorOptions,
    ) -> Self {
        Self {
            store,
            notifier,
            composer,
            sessions,
            progress: ProgressHandle::new(),
            options,
        }
    }

    /// Handle for polling (and resetting) the live run progress.
    #[must_use]
    pub fn progress(&self) -> ProgressHandle {
        self.progress.clone()
    }

    #[must_use]
    pub fn store(&self) -> Arc<dyn Store> {
        Arc::clone(&self.store)
    }

    /// Starts a run unless one is already in progress, returning whether a
    /// run was started. This is the trigger-side mutual-exclusion check;
    /// [`Self::run_curation`] itself does not re-check.
    ///
    /// # Errors
    ///
    /// Propagates store errors from the latest-run lookup or run creation.
    pub async fn run_if_idle(&self) -> Result<bool, CuratorError> {
        if let Some(run) = self.store.latest_run().await? {
            if run.status == RunStatus::Running {
                tracing::warn!(
                    run_id = run.id,
                    "a run is already in progress; not starting another"
                );
                return Ok(false);
            }
        }
        self.run_curation().await?;
        Ok(true)
    }

    /// Runs the full pipeline once. The outcome lands in the run record and
    /// the progress cell rather than the return value; callers poll
    /// progress for it.
    ///
    /// # Errors
    ///
    /// Only when the run cannot even be recorded (profile listing or run
    /// creation fails). Everything after that point is captured as a failed
    /// run instead.
    pub async fn run_curation(&self) -> Result<(), CuratorError> {
        let run_id = self.store.create_run().await?;
        tracing::info!(run_id, "starting curation run");

        let profiles = self.store.list_profiles().await?;
        let handles: Vec<String> = profiles
            .into_iter()
            .filter(|p| p.enabled)
            .map(|p| p.handle)
            .collect();
        self.progress.init(&handles);

        match self.curate(run_id, &handles).await {
            Ok(curated) => {
                tracing::info!(run_id, curated, "curation run complete");
            }
            Err(e) => {
                let message = e.to_string();
                tracing::error!(run_id, error = %message, "curation run failed");
                if let Err(store_err) = self
                    .store
                    .complete_run(run_id, RunStatus::Failed, &message)
                    .await
                {
                    tracing::error!(run_id, error = %store_err, "failed to record run failure");
                }
                self.progress.complete(Some(message.clone()));
                self.notify_best_effort("Curation failed", &message).await;
            }
        }
        Ok(())
    }

    /// Likes and comments on one post as the authenticated account, then
    /// records the comment on the stored post.
    ///
    /// # Errors
    ///
    /// Propagates automation failures with a step-specific message (see
    /// [`CuratorError`]); a failure screenshot is saved first. A
    /// [`CuratorError::CommentNotVerified`] is ambiguous: the comment may
    /// have been accepted even though verification timed out, so retrying
    /// can double-post.
    pub async fn publish_comment(&self, shortcode: &str, text: &str) -> Result<(), CuratorError> {
        let mut session = self.sessions.open().await?;
        let options = CommenterOptions {
            like_settle: self.options.like_settle,
            verify_timeout: self.options.comment_verify_timeout,
            screenshot_dir: self.options.screenshot_dir.clone(),
        };
        let result =
            commenter::publish_comment_on_page(session.page(), shortcode, text, &options).await;
        if let Err(e) = session.close().await {
            tracing::warn!(error = %e, "failed to close browsing session");
        }
        result?;

        if let Err(e) = self.store.set_user_comment(shortcode, text).await {
            tracing::warn!(shortcode, error = %e, "comment published but not recorded");
        }
        Ok(())
    }

    /// Reads the stored schedule settings and reports when the next
    /// recurring run would fire. Display only.
    ///
    /// # Errors
    ///
    /// Propagates store errors from the settings lookup.
    pub async fn next_scheduled_run(&self) -> Result<Option<chrono::DateTime<Utc>>, CuratorError> {
        let enabled = self
            .store
            .get_setting(schedule::SETTING_SCHEDULE_ENABLED)
            .await?
            .as_deref()
            == Some("true");
        let interval = schedule::stored_interval_hours(
            self.store
                .get_setting(schedule::SETTING_SCHEDULE_INTERVAL_HOURS)
                .await?
                .as_deref(),
        );
        Ok(schedule::next_run_time(enabled, interval, Utc::now()))
    }

    async fn curate(&self, run_id: i64, handles: &[String]) -> Result<usize, CuratorError> {
        let mut session = self.sessions.open().await?;
        let result = self
            .scrape_and_persist(session.page(), run_id, handles)
            .await;
        // The browsing session always comes down, success or failure.
        if let Err(e) = session.close().await {
            tracing::warn!(error = %e, "failed to close browsing session");
        }
        result
    }

    async fn scrape_and_persist(
        &self,
        page: &dyn PageDriver,
        run_id: i64,
        handles: &[String],
    ) -> Result<usize, CuratorError> {
        self.progress
            .update_task(TASK_INITIALIZING, TaskStatus::Done, None);
        tracing::info!(profiles = handles.len(), "curating enabled profiles");

        let mut candidates: Vec<ScoredCandidate> = Vec::new();
        let mut pending: Vec<(String, JoinHandle<EnrichOutcome>)> = Vec::new();

        for handle in handles {
            self.progress
                .update_task(handle, TaskStatus::Processing, None);

            match scrape::scrape_profile(page, handle, self.options.feed_timeout).await {
                Ok(posts) => {
                    let pause = PROFILE_PAUSE_MIN_MS
                        + (rand::random::<f64>() * PROFILE_PAUSE_SPREAD_MS) as u64;
                    tokio::time::sleep(Duration::from_millis(pause)).await;

                    let found = self
                        .collect_candidates(handle, posts, &mut candidates, &mut pending)
                        .await?;

                    self.progress.update_task(
                        handle,
                        TaskStatus::Done,
                        Some(format!("Found {found} candidates")),
                    );
                }
                Err(e) => {
                    tracing::error!(handle = %handle, error = %e, "failed to scrape profile");
                    self.progress
                        .update_task(handle, TaskStatus::Failed, Some(e.to_string()));
                }
            }
        }

        // Mandatory join: nothing is persisted while enrichment is still
        // outstanding. A run's output may be late, never missing.
        for (handle, task) in pending {
            match task.await {
                Ok(outcome) => {
                    if outcome.failed > 0 {
                        let total = outcome.failed + outcome.suggestions.len();
                        self.progress.update_task(
                            &handle,
                            TaskStatus::Done,
                            Some(format!(
                                "AI suggestions incomplete ({} of {total} failed)",
                                outcome.failed
                            )),
                        );
                    }
                    apply_suggestions(&mut candidates, outcome);
                }
                Err(e) => {
                    tracing::error!(handle = %handle, error = %e, "enrichment task panicked");
                    self.progress.update_task(
                        &handle,
                        TaskStatus::Done,
                        Some("AI suggestions unavailable".to_owned()),
                    );
                }
            }
        }

        self.progress
            .update_task(TASK_DONE, TaskStatus::Processing, None);

        let selected = select::select(candidates);
        let curated_count = selected.len();
        let records: Vec<CuratedPost> = selected
            .into_iter()
            .map(|candidate| {
                let url = platform::post_url(&candidate.post.shortcode);
                CuratedPost::from_candidate(candidate, run_id, url)
            })
            .collect();

        self.store.upsert_curated_posts(records).await?;
        self.store
            .complete_run(
                run_id,
                RunStatus::Success,
                &format!("Curated {curated_count} posts"),
            )
            .await?;

        self.progress.increment_curated(curated_count);
        self.progress.update_task(TASK_DONE, TaskStatus::Done, None);
        self.progress.complete(None);

        self.notify_best_effort(
            "Curation finished",
            &format!("Success: {curated_count} curated posts"),
        )
        .await;

        Ok(curated_count)
    }

    /// Scores one profile's scraped posts, keeps the qualifying candidates,
    /// and queues their enrichment as a background task. Returns how many
    /// candidates qualified.
    async fn collect_candidates(
        &self,
        handle: &str,
        posts: Vec<magpie_core::CandidatePost>,
        candidates: &mut Vec<ScoredCandidate>,
        pending: &mut Vec<(String, JoinHandle<EnrichOutcome>)>,
    ) -> Result<usize, CuratorError> {
        let now = Utc::now();
        let mut found = 0usize;
        let mut batch: Vec<EnrichRequest> = Vec::new();

        for post in posts {
            let score = score::score(&post, now);
            if score <= 0.0 {
                continue;
            }
            let candidate = ScoredCandidate {
                post,
                profile_handle: handle.to_owned(),
                score,
                suggested_comments: Vec::new(),
                ai_score: None,
            };

            let existing = self.store.get_post(&candidate.post.shortcode).await?;
            if enrich::is_enrichable(&candidate, existing.as_ref()) {
                batch.push(EnrichRequest {
                    shortcode: candidate.post.shortcode.clone(),
                    caption: candidate.post.caption.clone(),
                    image_urls: candidate
                        .post
                        .media_urls
                        .iter()
                        .take(self.options.max_images_per_request)
                        .cloned()
                        .collect(),
                });
            }

            candidates.push(candidate);
            found += 1;
        }

        if !batch.is_empty() {
            tracing::debug!(handle, requested = batch.len(), "queueing comment suggestions");
            let task = tokio::spawn(enrich::enrich_profile_batch(
                Arc::clone(&self.composer),
                handle.to_owned(),
                batch,
            ));
            pending.push((handle.to_owned(), task));
        }

        Ok(found)
    }

    async fn notify_best_effort(&self, title: &str, body: &str) {
        let notification = Notification {
            title: title.to_owned(),
            body: body.to_owned(),
            url: "/".to_owned(),
        };
        if let Err(e) = self.notifier.notify(notification).await {
            tracing::warn!(error = %e, "failed to send notification");
        }
    }
}

fn apply_suggestions(candidates: &mut [ScoredCandidate], outcome: EnrichOutcome) {
    for (shortcode, suggestions) in outcome.suggestions {
        if let Some(candidate) = candidates
            .iter_mut()
            .find(|c| c.post.shortcode == shortcode)
        {
            candidate.suggested_comments = suggestions.comments;
            candidate.ai_score = Some(suggestions.score);
        }
    }
}
