//! Domain types shared across the curation pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Media kind of a post, mapping the remote platform's numeric codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaType {
    Image,
    Video,
    Carousel,
}

impl MediaType {
    /// Maps the platform's numeric `media_type` code. Unknown codes
    /// normalise to `Image` rather than failing the whole item.
    #[must_use]
    pub fn from_code(code: i64) -> Self {
        match code {
            2 => Self::Video,
            8 => Self::Carousel,
            _ => Self::Image,
        }
    }
}

/// A post observed during scraping, before scoring and selection.
///
/// Candidates are ephemeral: they live for one run. Items whose timestamp
/// is missing or implausible never become candidates; the scraper drops
/// them at extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidatePost {
    /// Short opaque code, unique per post on the remote platform.
    pub shortcode: String,
    pub posted_at: DateTime<Utc>,
    pub comment_count: u32,
    pub like_count: Option<u32>,
    pub media_type: MediaType,
    pub caption: Option<String>,
    pub accessibility_caption: Option<String>,
    /// Highest-resolution image URL per media item, in item order.
    pub media_urls: Vec<String>,
    /// Whether the acting account had already liked this post at scrape time.
    pub has_liked: bool,
    pub username: Option<String>,
}

/// A candidate that survived scoring, with the fields derived during a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub post: CandidatePost,
    pub profile_handle: String,
    pub score: f64,
    pub suggested_comments: Vec<String>,
    pub ai_score: Option<u8>,
}

/// A candidate admitted by the selector and persisted for a run.
///
/// Identity is globally unique by `shortcode` across runs: re-curating the
/// same post updates the existing record instead of duplicating it.
/// `user_comment` and `seen` belong to the user, not the pipeline, and
/// survive every upsert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CuratedPost {
    pub run_id: i64,
    pub profile_handle: String,
    pub post_url: String,
    pub shortcode: String,
    pub posted_at: DateTime<Utc>,
    pub comment_count: u32,
    pub like_count: Option<u32>,
    pub score: f64,
    pub media_type: MediaType,
    pub caption: Option<String>,
    pub accessibility_caption: Option<String>,
    pub has_liked: bool,
    pub username: Option<String>,
    pub user_comment: Option<String>,
    pub suggested_comments: Vec<String>,
    pub media_urls: Vec<String>,
    pub seen: bool,
    pub ai_score: Option<u8>,
}

impl CuratedPost {
    /// Builds the persisted record for a selected candidate.
    #[must_use]
    pub fn from_candidate(candidate: ScoredCandidate, run_id: i64, post_url: String) -> Self {
        let ScoredCandidate {
            post,
            profile_handle,
            score,
            suggested_comments,
            ai_score,
        } = candidate;
        Self {
            run_id,
            profile_handle,
            post_url,
            shortcode: post.shortcode,
            posted_at: post.posted_at,
            comment_count: post.comment_count,
            like_count: post.like_count,
            score,
            media_type: post.media_type,
            caption: post.caption,
            accessibility_caption: post.accessibility_caption,
            has_liked: post.has_liked,
            username: post.username,
            user_comment: None,
            suggested_comments,
            media_urls: post.media_urls,
            seen: false,
            ai_score,
        }
    }
}
