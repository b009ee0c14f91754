//! Freshness/engagement scoring for candidate posts.

use chrono::{DateTime, Utc};
use magpie_core::CandidatePost;

/// Maximum post age eligible for curation, in hours.
pub const LOOKBACK_HOURS: f64 = 24.0;

/// Minimum comment count for a post to qualify.
pub const MIN_COMMENTS: u32 = 3;

/// Scores a candidate as of `now`. A score of exactly zero means the post
/// is excluded and never enters selection.
///
/// Inside the lookback window, `engagement = 2·ln(1+comments) + ln(1+likes)`
/// (the likes term drops out when the like count is hidden or zero) and
/// `recency` decays linearly from 1 to 0 over the window, so the result is
/// `engagement × (0.7 + 0.9·recency)`: fresher, more-discussed posts win,
/// and posts near the end of the window still contribute at the 0.7 floor.
#[must_use]
pub fn score(post: &CandidatePost, now: DateTime<Utc>) -> f64 {
    let hours_ago = (now - post.posted_at).num_milliseconds() as f64 / 3_600_000.0;
    if hours_ago > LOOKBACK_HOURS {
        return 0.0;
    }
    if post.comment_count < MIN_COMMENTS {
        return 0.0;
    }

    let comments = f64::from(post.comment_count);
    let likes = post.like_count.unwrap_or(0);
    let likes_term = if likes > 0 {
        (1.0 + f64::from(likes)).ln()
    } else {
        0.0
    };
    let engagement = 2.0 * (1.0 + comments).ln() + likes_term;
    let recency = (1.0 - hours_ago / LOOKBACK_HOURS).max(0.0);

    engagement * (0.7 + 0.9 * recency)
}
