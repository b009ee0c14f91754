//! End-to-end runs against the scripted page driver and the in-memory
//! store: selection caps, upsert semantics, per-profile failure isolation,
//! enrichment gating/merging, and run-fatal handling.

mod common;

use std::sync::Arc;

use common::{
    feed_payload, post_node, CollectingNotifier, FakeComposer, FakePage, FakeSessionProvider,
};
use magpie_core::{MemoryStore, RunStatus, Store, TrackedProfile};
use magpie_curator::{platform, Curator, CuratorOptions, ProgressStatus, TaskStatus};
use serde_json::json;

struct Harness {
    store: Arc<MemoryStore>,
    notifier: Arc<CollectingNotifier>,
    composer: Arc<FakeComposer>,
    page: Arc<FakePage>,
    provider: Arc<FakeSessionProvider>,
    curator: Curator,
}

fn options() -> CuratorOptions {
    CuratorOptions {
        screenshot_dir: std::env::temp_dir().join("magpie-curator-tests"),
        ..CuratorOptions::default()
    }
}

fn harness(profiles: &[&str]) -> Harness {
    let store = Arc::new(MemoryStore::new());
    store.set_profiles(
        profiles
            .iter()
            .map(|h| TrackedProfile {
                handle: (*h).to_owned(),
                enabled: true,
            })
            .collect(),
    );
    let notifier = CollectingNotifier::new();
    let composer = FakeComposer::new();
    let page = FakePage::new();
    let provider = FakeSessionProvider::new(Arc::clone(&page));
    let curator = Curator::new(
        store.clone(),
        notifier.clone(),
        composer.clone(),
        provider.clone(),
        options(),
    );
    Harness {
        store,
        notifier,
        composer,
        page,
        provider,
        curator,
    }
}

fn task(curator: &Curator, handle: &str) -> (TaskStatus, Option<String>) {
    let snapshot = curator.progress().snapshot();
    let entry = snapshot
        .tasks
        .iter()
        .find(|t| t.handle == handle)
        .unwrap_or_else(|| panic!("no task for {handle}"));
    (entry.status, entry.message.clone())
}

#[tokio::test(start_paused = true)]
async fn curates_across_profiles_applying_both_caps() {
    let h = harness(&["aurora", "basalt"]);
    h.page.set_feed(
        "aurora",
        feed_payload(vec![
            post_node("a1", 100, 500),
            post_node("a2", 90, 500),
            post_node("a3", 80, 500),
            post_node("a4", 70, 500),
            post_node("a5", 60, 500),
            post_node("a6", 50, 500),
        ]),
    );
    h.page
        .set_feed("basalt", feed_payload(vec![post_node("b1", 10_000, 50_000)]));

    h.curator.run_curation().await.unwrap();

    let posts = h.store.all_posts();
    assert_eq!(posts.len(), 6, "expected basalt's post plus aurora's top 5");
    let from_aurora = posts.iter().filter(|p| p.profile_handle == "aurora").count();
    assert_eq!(from_aurora, 5);
    assert!(!posts.iter().any(|p| p.shortcode == "a6"));

    let run = h.store.latest_run().await.unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Success);
    assert_eq!(run.message.as_deref(), Some("Curated 6 posts"));

    let progress = h.curator.progress().snapshot();
    assert_eq!(progress.status, ProgressStatus::Completed);
    assert_eq!(progress.curated_count, 6);
    assert_eq!(h.notifier.titles(), vec!["Curation finished"]);
    assert_eq!(h.provider.close_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn recuration_updates_in_place_and_preserves_user_fields() {
    let h = harness(&["aurora"]);
    h.page
        .set_feed("aurora", feed_payload(vec![post_node("a1", 10, 100)]));

    h.curator.run_curation().await.unwrap();
    h.store.set_user_comment("a1", "love this spot").await.unwrap();

    // Same remote dataset, later run: the record updates, nothing duplicates.
    h.page
        .set_feed("aurora", feed_payload(vec![post_node("a1", 25, 100)]));
    h.curator.run_curation().await.unwrap();

    let posts = h.store.all_posts();
    assert_eq!(posts.len(), 1);
    let post = &posts[0];
    assert_eq!(post.run_id, 2);
    assert_eq!(post.comment_count, 25);
    assert_eq!(post.user_comment.as_deref(), Some("love this spot"));

    // The first run enriched the post; the second must neither re-request
    // suggestions nor clear the stored ones.
    assert_eq!(h.composer.calls().len(), 1);
    assert!(!post.suggested_comments.is_empty());
}

#[tokio::test(start_paused = true)]
async fn profile_failure_is_isolated_from_the_run() {
    let h = harness(&["broken", "aurora"]);
    h.page
        .fail_navigation_to(&platform::profile_url("broken"));
    h.page
        .set_feed("aurora", feed_payload(vec![post_node("a1", 10, 100)]));

    h.curator.run_curation().await.unwrap();

    let run = h.store.latest_run().await.unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Success);
    assert_eq!(h.store.all_posts().len(), 1);

    let (broken_status, broken_message) = task(&h.curator, "broken");
    assert_eq!(broken_status, TaskStatus::Failed);
    assert!(broken_message.is_some());
    let (aurora_status, _) = task(&h.curator, "aurora");
    assert_eq!(aurora_status, TaskStatus::Done);

    // The browsing session still came down exactly once.
    assert_eq!(h.provider.close_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn missing_feed_response_is_a_soft_outcome() {
    let h = harness(&["ghost"]);
    // No feed configured: the watcher never sees a timeline response.

    h.curator.run_curation().await.unwrap();

    let run = h.store.latest_run().await.unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Success);
    assert!(h.store.all_posts().is_empty());

    let (status, message) = task(&h.curator, "ghost");
    assert_eq!(status, TaskStatus::Done);
    assert_eq!(message.as_deref(), Some("Found 0 candidates"));
}

#[tokio::test(start_paused = true)]
async fn enrichment_is_gated_and_merged_into_persisted_posts() {
    let h = harness(&["aurora"]);
    let mut video = post_node("vid1", 20, 100);
    video["media_type"] = json!(2);
    let mut liked = post_node("liked1", 20, 100);
    liked["has_liked"] = json!(true);

    h.page.set_feed(
        "aurora",
        feed_payload(vec![post_node("img1", 20, 100), video, liked]),
    );

    h.curator.run_curation().await.unwrap();

    let posts = h.store.all_posts();
    assert_eq!(posts.len(), 3);

    let enriched = posts.iter().find(|p| p.shortcode == "img1").unwrap();
    assert_eq!(enriched.suggested_comments.len(), 4);
    assert_eq!(enriched.ai_score, Some(7));

    for shortcode in ["vid1", "liked1"] {
        let post = posts.iter().find(|p| p.shortcode == shortcode).unwrap();
        assert!(post.suggested_comments.is_empty(), "{shortcode} was enriched");
        assert_eq!(post.ai_score, None);
    }

    // Only the eligible post ever reached the composer.
    assert_eq!(h.composer.calls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn partial_enrichment_failure_keeps_the_profile_task_done() {
    let h = harness(&["aurora"]);
    h.composer.fail_for_caption("caption for doomed");
    h.page.set_feed(
        "aurora",
        feed_payload(vec![post_node("doomed", 20, 100), post_node("fine", 20, 100)]),
    );

    h.curator.run_curation().await.unwrap();

    let run = h.store.latest_run().await.unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Success);

    let (status, message) = task(&h.curator, "aurora");
    assert_eq!(status, TaskStatus::Done);
    let message = message.expect("expected a partial-AI message");
    assert!(
        message.contains("AI suggestions incomplete (1 of 2 failed)"),
        "unexpected message: {message}"
    );

    let posts = h.store.all_posts();
    let fine = posts.iter().find(|p| p.shortcode == "fine").unwrap();
    assert!(!fine.suggested_comments.is_empty());
    let doomed = posts.iter().find(|p| p.shortcode == "doomed").unwrap();
    assert!(doomed.suggested_comments.is_empty());
}

#[tokio::test(start_paused = true)]
async fn session_failure_marks_the_run_failed_and_still_notifies() {
    let store = Arc::new(MemoryStore::new());
    store.set_profiles(vec![TrackedProfile {
        handle: "aurora".into(),
        enabled: true,
    }]);
    let notifier = CollectingNotifier::new();
    let curator = Curator::new(
        store.clone(),
        notifier.clone(),
        FakeComposer::new(),
        FakeSessionProvider::failing(),
        options(),
    );

    curator.run_curation().await.unwrap();

    let run = store.latest_run().await.unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Failed);
    assert!(run.message.is_some());

    let progress = curator.progress().snapshot();
    assert_eq!(progress.status, ProgressStatus::Failed);
    assert!(progress.error.is_some());

    assert_eq!(notifier.titles(), vec!["Curation failed"]);
    assert!(store.all_posts().is_empty());
}

#[tokio::test(start_paused = true)]
async fn disabled_profiles_are_not_scraped() {
    let h = harness(&[]);
    h.store.set_profiles(vec![
        TrackedProfile {
            handle: "active".into(),
            enabled: true,
        },
        TrackedProfile {
            handle: "paused".into(),
            enabled: false,
        },
    ]);
    h.page
        .set_feed("active", feed_payload(vec![post_node("a1", 10, 100)]));
    h.page
        .set_feed("paused", feed_payload(vec![post_node("p1", 10, 100)]));

    h.curator.run_curation().await.unwrap();

    let posts = h.store.all_posts();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].shortcode, "a1");

    // Progress tracks enabled profiles only: sentinels plus "active".
    let snapshot = h.curator.progress().snapshot();
    assert_eq!(snapshot.tasks.len(), 3);
    assert!(!snapshot.tasks.iter().any(|t| t.handle == "paused"));
}

#[tokio::test(start_paused = true)]
async fn trigger_refuses_to_overlap_runs() {
    let h = harness(&["aurora"]);

    // Simulate a run left in progress by another trigger.
    h.store.create_run().await.unwrap();

    let started = h.curator.run_if_idle().await.unwrap();
    assert!(!started);
    assert_eq!(h.store.runs().len(), 1, "no second run record");
}

#[tokio::test(start_paused = true)]
async fn trigger_starts_a_run_when_idle() {
    let h = harness(&["aurora"]);
    h.page
        .set_feed("aurora", feed_payload(vec![post_node("a1", 10, 100)]));

    let started = h.curator.run_if_idle().await.unwrap();
    assert!(started);

    let run = h.store.latest_run().await.unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Success);
}
