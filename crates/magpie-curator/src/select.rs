//! Ranking and capping of scored candidates across all profiles in a run.

use std::collections::HashMap;

use magpie_core::ScoredCandidate;

/// Maximum curated posts admitted per profile in one run.
pub const MAX_POSTS_PER_PROFILE: usize = 5;

/// Maximum curated posts admitted per run.
pub const MAX_GLOBAL_POSTS: usize = 30;

/// Ranks candidates by score and applies both caps.
///
/// The sort is stable, so equal scores keep scrape order (profile iteration
/// order, then intra-profile order). The caps are hard limits, not targets:
/// coming in under them is a normal outcome.
#[must_use]
pub fn select(mut candidates: Vec<ScoredCandidate>) -> Vec<ScoredCandidate> {
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));

    let mut per_profile: HashMap<String, usize> = HashMap::new();
    let mut selected = Vec::new();
    for candidate in candidates {
        let admitted = per_profile
            .entry(candidate.profile_handle.clone())
            .or_insert(0);
        if *admitted < MAX_POSTS_PER_PROFILE {
            *admitted += 1;
            selected.push(candidate);
        }
        if selected.len() == MAX_GLOBAL_POSTS {
            break;
        }
    }
    selected
}
