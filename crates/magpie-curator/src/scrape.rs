//! Profile scraping via network-response interception.
//!
//! Rather than parsing rendered markup, the scraper registers a response
//! watcher, navigates to the profile, and waits for the page's own timeline
//! feed request to come back. The feed's shape has drifted repeatedly, so
//! every extraction below checks structure before touching fields and skips
//! what it cannot read.

use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use magpie_browser::PageDriver;
use magpie_core::{CandidatePost, MediaType};
use serde_json::Value;

use crate::error::CuratorError;
use crate::platform;

/// 2010-01-01T00:00:00Z. Anything stamped earlier (including zero) is the
/// remote's sentinel for "unknown date"; such items are dropped entirely.
const EARLIEST_PLAUSIBLE_POST: i64 = 1_262_304_000;

/// Scrapes one profile's recent posts through the live page.
///
/// Returns an empty list when no timeline feed response arrives within
/// `timeout`: the remote's response inventory is not contractually stable,
/// so a missing feed is a soft outcome, not an error. Malformed feed items
/// are skipped and logged, never raised.
///
/// # Errors
///
/// Returns [`CuratorError::Browser`] only for page-level failures
/// (navigation, interception setup).
pub async fn scrape_profile(
    page: &dyn PageDriver,
    handle: &str,
    timeout: Duration,
) -> Result<Vec<CandidatePost>, CuratorError> {
    tracing::info!(handle, "scraping profile");

    // The watcher must exist before navigation or the feed response races us.
    let mut watcher = page.watch_responses().await?;
    page.goto(&platform::profile_url(handle)).await?;

    match watcher.wait_matching(&is_timeline_response, timeout).await {
        Some(payload) => {
            let posts = parse_timeline_payload(&payload);
            tracing::info!(handle, count = posts.len(), "intercepted timeline feed");
            Ok(posts)
        }
        None => {
            tracing::warn!(handle, "no timeline feed response captured");
            Ok(Vec::new())
        }
    }
}

/// Whether an intercepted response looks like the profile timeline feed:
/// a known endpoint URL carrying the connection/edges structure.
pub(crate) fn is_timeline_response(url: &str, body: &Value) -> bool {
    platform::FEED_URL_MARKERS
        .iter()
        .any(|marker| url.contains(marker))
        && timeline_edges(body).is_some()
}

/// The edges array has been observed at two nesting points across feed
/// revisions; first match wins.
fn timeline_edges(body: &Value) -> Option<&Vec<Value>> {
    const PATHS: [&str; 2] = [
        "/data/xdt_api__v1__feed__user_timeline_graphql_connection/edges",
        "/data/user/edge_owner_to_timeline_media/edges",
    ];
    PATHS
        .iter()
        .find_map(|path| body.pointer(path).and_then(Value::as_array))
}

pub(crate) fn parse_timeline_payload(payload: &Value) -> Vec<CandidatePost> {
    let Some(edges) = timeline_edges(payload) else {
        return Vec::new();
    };
    edges
        .iter()
        .filter_map(|edge| {
            let node = edge.get("node")?;
            let post = parse_node(node);
            if post.is_none() {
                tracing::debug!("skipping malformed or undated timeline item");
            }
            post
        })
        .collect()
}

fn parse_node(node: &Value) -> Option<CandidatePost> {
    let shortcode = node
        .get("code")
        .or_else(|| node.get("shortcode"))
        .and_then(Value::as_str)?
        .to_owned();
    let posted_at = posted_at(node)?;

    let comment_count = node
        .get("comment_count")
        .and_then(Value::as_u64)
        .or_else(|| node.pointer("/edge_media_to_comment/count").and_then(Value::as_u64))
        .and_then(|v| u32::try_from(v).ok())
        .unwrap_or(0);

    Some(CandidatePost {
        shortcode,
        posted_at,
        comment_count,
        like_count: like_count(node),
        media_type: MediaType::from_code(
            node.get("media_type").and_then(Value::as_i64).unwrap_or(1),
        ),
        caption: caption_text(node),
        accessibility_caption: node
            .get("accessibility_caption")
            .and_then(Value::as_str)
            .map(str::to_owned),
        media_urls: media_urls(node),
        has_liked: node.get("has_liked").and_then(Value::as_bool).unwrap_or(false),
        username: node
            .pointer("/user/username")
            .or_else(|| node.pointer("/owner/username"))
            .and_then(Value::as_str)
            .map(str::to_owned),
    })
}

/// Timestamps arrive as epoch seconds under one of two keys. Missing or
/// pre-2010 values drop the item.
fn posted_at(node: &Value) -> Option<DateTime<Utc>> {
    let secs = node
        .get("taken_at")
        .or_else(|| node.get("taken_at_timestamp"))
        .and_then(Value::as_i64)?;
    if secs < EARLIEST_PLAUSIBLE_POST {
        return None;
    }
    Utc.timestamp_opt(secs, 0).single()
}

/// The caption has lived at two locations across feed revisions.
fn caption_text(node: &Value) -> Option<String> {
    node.pointer("/caption/text")
        .and_then(Value::as_str)
        .or_else(|| {
            node.pointer("/edge_media_to_caption/edges/0/node/text")
                .and_then(Value::as_str)
        })
        .map(str::to_owned)
}

fn like_count(node: &Value) -> Option<u32> {
    node.get("like_count")
        .and_then(Value::as_u64)
        .or_else(|| node.pointer("/edge_liked_by/count").and_then(Value::as_u64))
        .and_then(|v| u32::try_from(v).ok())
}

/// One URL per media item: the largest-area sized candidate, falling back
/// to the direct display URL when no sized candidates are offered.
fn media_urls(node: &Value) -> Vec<String> {
    if let Some(children) = node.get("carousel_media").and_then(Value::as_array) {
        return children.iter().filter_map(best_image_url).collect();
    }
    best_image_url(node).into_iter().collect()
}

fn best_image_url(item: &Value) -> Option<String> {
    if let Some(candidates) = item
        .pointer("/image_versions2/candidates")
        .and_then(Value::as_array)
    {
        let best = candidates
            .iter()
            .filter_map(|candidate| {
                let url = candidate.get("url")?.as_str()?;
                let width = candidate.get("width").and_then(Value::as_i64).unwrap_or(0);
                let height = candidate.get("height").and_then(Value::as_i64).unwrap_or(0);
                Some((width * height, url))
            })
            .max_by_key(|(area, _)| *area);
        if let Some((_, url)) = best {
            return Some(url.to_owned());
        }
    }
    item.get("display_url").and_then(Value::as_str).map(str::to_owned)
}

#[cfg(test)]
#[path = "scrape_test.rs"]
mod tests;
