//! AI enrichment of qualifying candidates, overlapped with scraping.
//!
//! One profile's eligible candidates are requested concurrently; the whole
//! batch runs as a background task while the next profile is being scraped.
//! The orchestrator joins every batch before selection and persistence.

use std::sync::Arc;

use futures::future::join_all;
use magpie_ai::{CommentComposer, CommentSuggestions};
use magpie_core::{CuratedPost, MediaType, ScoredCandidate};

/// What the suggestion service needs for one candidate.
pub(crate) struct EnrichRequest {
    pub shortcode: String,
    pub caption: Option<String>,
    pub image_urls: Vec<String>,
}

/// Result of one profile's enrichment batch.
pub(crate) struct EnrichOutcome {
    pub suggestions: Vec<(String, CommentSuggestions)>,
    /// Candidates the service returned nothing for.
    pub failed: usize,
}

/// Whether a candidate qualifies for suggestion generation.
///
/// Videos are excluded (no static frame to analyze), as are posts the
/// account already liked, posts the user marked seen, and posts that
/// already carry suggestions from an earlier run.
pub(crate) fn is_enrichable(candidate: &ScoredCandidate, existing: Option<&CuratedPost>) -> bool {
    if candidate.post.has_liked {
        return false;
    }
    if !matches!(
        candidate.post.media_type,
        MediaType::Image | MediaType::Carousel
    ) {
        return false;
    }
    if let Some(existing) = existing {
        if existing.seen || !existing.suggested_comments.is_empty() {
            return false;
        }
    }
    true
}

/// Requests suggestions for one profile's eligible candidates, all
/// concurrently. A candidate the service declines (`None`) is counted as
/// failed and the batch carries on; nothing here can fail a run.
pub(crate) async fn enrich_profile_batch(
    composer: Arc<dyn CommentComposer>,
    profile_handle: String,
    batch: Vec<EnrichRequest>,
) -> EnrichOutcome {
    let requests = batch.into_iter().map(|request| {
        let composer = Arc::clone(&composer);
        let handle = profile_handle.clone();
        async move {
            let result = composer
                .suggest_comments(&handle, request.caption.as_deref(), &request.image_urls, None)
                .await;
            (request.shortcode, result)
        }
    });

    let mut suggestions = Vec::new();
    let mut failed = 0;
    for (shortcode, result) in join_all(requests).await {
        match result {
            Some(s) => suggestions.push((shortcode, s)),
            None => failed += 1,
        }
    }
    EnrichOutcome {
        suggestions,
        failed,
    }
}
