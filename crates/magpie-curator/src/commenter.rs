//! Browser automation for liking and commenting on one post.
//!
//! A straight state machine: navigate, verify session, like if needed,
//! locate the comment field, submit, verify the input cleared. Every failure
//! is preceded by a screenshot capture so UI drift can be debugged after
//! the fact, and carries a message naming the step that broke.

use std::path::Path;
use std::time::Duration;

use chrono::Utc;
use magpie_browser::PageDriver;

use crate::error::CuratorError;
use crate::platform;

/// How long to wait for the like control to render after navigation.
const LIKE_CONTROL_WAIT: Duration = Duration::from_secs(10);

/// Pause between filling the comment box and submitting. The submit control
/// only enables once text is present.
const PRE_SUBMIT_PAUSE: Duration = Duration::from_millis(500);

/// Poll interval while verifying the comment box cleared.
const VERIFY_POLL: Duration = Duration::from_millis(500);

pub(crate) struct CommenterOptions {
    pub like_settle: Duration,
    pub verify_timeout: Duration,
    pub screenshot_dir: std::path::PathBuf,
}

/// Likes the post if needed and publishes `text` as a comment, verifying
/// submission. On any failure a screenshot keyed by timestamp and shortcode
/// is saved before the error propagates.
pub(crate) async fn publish_comment_on_page(
    page: &dyn PageDriver,
    shortcode: &str,
    text: &str,
    options: &CommenterOptions,
) -> Result<(), CuratorError> {
    match drive_comment_flow(page, shortcode, text, options).await {
        Ok(()) => Ok(()),
        Err(e) => {
            capture_failure_screenshot(page, shortcode, &options.screenshot_dir).await;
            Err(e)
        }
    }
}

async fn drive_comment_flow(
    page: &dyn PageDriver,
    shortcode: &str,
    text: &str,
    options: &CommenterOptions,
) -> Result<(), CuratorError> {
    let url = platform::post_url(shortcode);
    tracing::info!(shortcode, %url, "starting comment flow");
    page.goto(&url).await?;

    // An exposed login link means the stored session no longer
    // authenticates. Fail before touching anything else; this is the one
    // error that calls for re-login rather than retry.
    if page.exists(platform::LOGIN_LINK).await? {
        return Err(CuratorError::SessionExpired);
    }

    like_if_needed(page, options.like_settle).await?;

    let comment_box = locate_comment_box(page).await?;
    page.fill(comment_box, text).await?;
    tokio::time::sleep(PRE_SUBMIT_PAUSE).await;

    let clicked = page
        .click_button_with_text(platform::BUTTON_ROLE, platform::POST_BUTTON_LABEL)
        .await?;
    if !clicked {
        return Err(CuratorError::PostButtonNotFound);
    }

    verify_comment_cleared(page, comment_box, options.verify_timeout).await
}

async fn like_if_needed(page: &dyn PageDriver, settle: Duration) -> Result<(), CuratorError> {
    let found = page
        .wait_for_any(
            &[platform::LIKE_ICON, platform::UNLIKE_ICON],
            LIKE_CONTROL_WAIT,
        )
        .await?;
    if found == 0 {
        if page.click_parent_of(platform::LIKE_ICON).await? {
            tracing::info!("liked post");
            tokio::time::sleep(settle).await;
        }
    } else {
        tracing::debug!("post already liked");
    }
    Ok(())
}

async fn locate_comment_box(page: &dyn PageDriver) -> Result<&'static str, CuratorError> {
    for selector in [platform::COMMENT_BOX, platform::COMMENT_BOX_FALLBACK] {
        if page.exists(selector).await? {
            return Ok(selector);
        }
    }
    Err(CuratorError::CommentBoxNotFound)
}

/// The remote clears the input on successful submission. An input that
/// never clears within the timeout is reported as unverified, an ambiguous
/// outcome: the comment may still have been accepted.
async fn verify_comment_cleared(
    page: &dyn PageDriver,
    selector: &str,
    timeout: Duration,
) -> Result<(), CuratorError> {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if let Some(value) = page.input_value(selector).await? {
            if value.is_empty() {
                tracing::info!("comment verified; input cleared");
                return Ok(());
            }
        }
        if tokio::time::Instant::now() + VERIFY_POLL > deadline {
            return Err(CuratorError::CommentNotVerified {
                timeout_secs: timeout.as_secs(),
            });
        }
        tokio::time::sleep(VERIFY_POLL).await;
    }
}

async fn capture_failure_screenshot(page: &dyn PageDriver, shortcode: &str, dir: &Path) {
    if let Err(e) = std::fs::create_dir_all(dir) {
        tracing::warn!(error = %e, "could not create screenshot directory");
        return;
    }
    let timestamp = Utc::now().format("%Y-%m-%dT%H-%M-%S");
    let path = dir.join(format!("error-{timestamp}-{shortcode}.png"));
    match page.screenshot(&path).await {
        Ok(()) => tracing::info!(path = %path.display(), "failure screenshot saved"),
        Err(e) => tracing::warn!(error = %e, "failed to capture failure screenshot"),
    }
}
