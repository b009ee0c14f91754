//! Scripted fakes shared by the curator integration tests: a page driver
//! whose platform state is configured per test, a session provider over it,
//! a canned comment composer, and a collecting notifier.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use magpie_ai::{CommentComposer, CommentSuggestions};
use magpie_browser::{
    BrowserError, PageDriver, PageSession, ResponsePredicate, ResponseWatcher, SessionProvider,
};
use magpie_core::{Notification, Notifier, NotifyError};
use magpie_curator::platform;
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeControl {
    Unliked,
    Liked,
    Missing,
}

pub struct FakeState {
    pub current_url: String,
    /// Maps navigated URLs to the timeline payload the watcher delivers.
    pub feeds: HashMap<String, Value>,
    pub goto_failures: HashSet<String>,
    pub login_link_visible: bool,
    pub like_control: LikeControl,
    /// Which comment-box selector (if any) exists on the page.
    pub comment_box: Option<String>,
    pub post_button_present: bool,
    /// Whether submitting clears the input, as the real page does on success.
    pub clears_after_post: bool,
    pub comment_value: String,
    pub like_clicks: usize,
    pub screenshots: Vec<PathBuf>,
    pending_feed: Option<(String, Value)>,
}

impl Default for FakeState {
    fn default() -> Self {
        Self {
            current_url: String::new(),
            feeds: HashMap::new(),
            goto_failures: HashSet::new(),
            login_link_visible: false,
            like_control: LikeControl::Unliked,
            comment_box: Some(platform::COMMENT_BOX.to_owned()),
            post_button_present: true,
            clears_after_post: true,
            comment_value: String::new(),
            like_clicks: 0,
            screenshots: Vec::new(),
            pending_feed: None,
        }
    }
}

pub struct FakePage {
    state: Arc<Mutex<FakeState>>,
}

impl FakePage {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Arc::new(Mutex::new(FakeState::default())),
        })
    }

    pub fn configure(&self, f: impl FnOnce(&mut FakeState)) {
        f(&mut self.lock());
    }

    pub fn set_feed(&self, handle: &str, payload: Value) {
        self.lock()
            .feeds
            .insert(platform::profile_url(handle), payload);
    }

    pub fn fail_navigation_to(&self, url: &str) {
        self.lock().goto_failures.insert(url.to_owned());
    }

    pub fn like_clicks(&self) -> usize {
        self.lock().like_clicks
    }

    pub fn like_control(&self) -> LikeControl {
        self.lock().like_control
    }

    pub fn comment_value(&self) -> String {
        self.lock().comment_value.clone()
    }

    pub fn screenshots(&self) -> Vec<PathBuf> {
        self.lock().screenshots.clone()
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    fn selector_present(state: &FakeState, selector: &str) -> bool {
        if selector == platform::LOGIN_LINK {
            return state.login_link_visible;
        }
        if selector == platform::LIKE_ICON {
            return state.like_control == LikeControl::Unliked;
        }
        if selector == platform::UNLIKE_ICON {
            return state.like_control == LikeControl::Liked;
        }
        state.comment_box.as_deref() == Some(selector)
    }
}

#[async_trait]
impl PageDriver for FakePage {
    async fn goto(&self, url: &str) -> Result<(), BrowserError> {
        let mut state = self.lock();
        if state.goto_failures.contains(url) {
            return Err(BrowserError::Timeout {
                what: format!("navigation to {url}"),
                timeout_secs: 30,
            });
        }
        state.current_url = url.to_owned();
        state.pending_feed = state.feeds.get(url).map(|payload| {
            (
                "https://www.instagram.com/graphql/query?doc_id=7".to_owned(),
                payload.clone(),
            )
        });
        Ok(())
    }

    async fn watch_responses(&self) -> Result<Box<dyn ResponseWatcher>, BrowserError> {
        Ok(Box::new(FakeWatcher {
            state: Arc::clone(&self.state),
        }))
    }

    async fn exists(&self, selector: &str) -> Result<bool, BrowserError> {
        Ok(Self::selector_present(&self.lock(), selector))
    }

    async fn wait_for_any(
        &self,
        selectors: &[&str],
        timeout: Duration,
    ) -> Result<usize, BrowserError> {
        let state = self.lock();
        for (index, selector) in selectors.iter().enumerate() {
            if Self::selector_present(&state, selector) {
                return Ok(index);
            }
        }
        Err(BrowserError::Timeout {
            what: format!("any of: {}", selectors.join(", ")),
            timeout_secs: timeout.as_secs(),
        })
    }

    async fn click_parent_of(&self, selector: &str) -> Result<bool, BrowserError> {
        let mut state = self.lock();
        if selector == platform::LIKE_ICON && state.like_control == LikeControl::Unliked {
            state.like_control = LikeControl::Liked;
            state.like_clicks += 1;
            return Ok(true);
        }
        Ok(false)
    }

    async fn click_button_with_text(
        &self,
        _selector: &str,
        text: &str,
    ) -> Result<bool, BrowserError> {
        let mut state = self.lock();
        if state.post_button_present && text == platform::POST_BUTTON_LABEL {
            if state.clears_after_post {
                state.comment_value.clear();
            }
            return Ok(true);
        }
        Ok(false)
    }

    async fn fill(&self, selector: &str, text: &str) -> Result<(), BrowserError> {
        let mut state = self.lock();
        if state.comment_box.as_deref() == Some(selector) {
            state.comment_value = text.to_owned();
            Ok(())
        } else {
            Err(BrowserError::ElementNotFound {
                selector: selector.to_owned(),
            })
        }
    }

    async fn input_value(&self, selector: &str) -> Result<Option<String>, BrowserError> {
        let state = self.lock();
        if state.comment_box.as_deref() == Some(selector) {
            Ok(Some(state.comment_value.clone()))
        } else {
            Ok(None)
        }
    }

    async fn screenshot(&self, path: &Path) -> Result<(), BrowserError> {
        self.lock().screenshots.push(path.to_path_buf());
        Ok(())
    }
}

struct FakeWatcher {
    state: Arc<Mutex<FakeState>>,
}

#[async_trait]
impl ResponseWatcher for FakeWatcher {
    async fn wait_matching(
        &mut self,
        predicate: &ResponsePredicate,
        _timeout: Duration,
    ) -> Option<Value> {
        let pending = self.state.lock().unwrap().pending_feed.take();
        match pending {
            Some((url, body)) if predicate(&url, &body) => Some(body),
            _ => None,
        }
    }
}

pub struct FakeSessionProvider {
    page: Option<Arc<FakePage>>,
    close_count: Arc<Mutex<usize>>,
}

impl FakeSessionProvider {
    pub fn new(page: Arc<FakePage>) -> Arc<Self> {
        Arc::new(Self {
            page: Some(page),
            close_count: Arc::new(Mutex::new(0)),
        })
    }

    /// A provider whose sessions never open, for run-fatal scenarios.
    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            page: None,
            close_count: Arc::new(Mutex::new(0)),
        })
    }

    pub fn close_count(&self) -> usize {
        *self.close_count.lock().unwrap()
    }
}

#[async_trait]
impl SessionProvider for FakeSessionProvider {
    async fn open(&self) -> Result<Box<dyn PageSession>, BrowserError> {
        match &self.page {
            Some(page) => Ok(Box::new(FakeSession {
                page: Arc::clone(page),
                close_count: Arc::clone(&self.close_count),
            })),
            None => Err(BrowserError::Launch("no browser available".into())),
        }
    }
}

struct FakeSession {
    page: Arc<FakePage>,
    close_count: Arc<Mutex<usize>>,
}

#[async_trait]
impl PageSession for FakeSession {
    fn page(&self) -> &dyn PageDriver {
        self.page.as_ref()
    }

    async fn close(&mut self) -> Result<(), BrowserError> {
        *self.close_count.lock().unwrap() += 1;
        Ok(())
    }
}

pub struct FakeComposer {
    calls: Mutex<Vec<(String, Option<String>)>>,
    fail_for_caption: Mutex<Option<String>>,
}

impl FakeComposer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            fail_for_caption: Mutex::new(None),
        })
    }

    /// Makes requests whose caption contains `needle` return nothing.
    pub fn fail_for_caption(&self, needle: &str) {
        *self.fail_for_caption.lock().unwrap() = Some(needle.to_owned());
    }

    /// `(handle, caption)` per request, in request order.
    pub fn calls(&self) -> Vec<(String, Option<String>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommentComposer for FakeComposer {
    async fn suggest_comments(
        &self,
        handle: &str,
        caption: Option<&str>,
        _image_urls: &[String],
        _extra_context: Option<&str>,
    ) -> Option<CommentSuggestions> {
        self.calls
            .lock()
            .unwrap()
            .push((handle.to_owned(), caption.map(ToOwned::to_owned)));
        if let Some(needle) = self.fail_for_caption.lock().unwrap().as_deref() {
            if caption.is_some_and(|c| c.contains(needle)) {
                return None;
            }
        }
        Some(CommentSuggestions {
            comments: vec![
                "that light is unreal".into(),
                "where is this?".into(),
                "instant calm".into(),
                "same energy every morning".into(),
            ],
            score: 7,
        })
    }
}

pub struct CollectingNotifier {
    notifications: Mutex<Vec<Notification>>,
}

impl CollectingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            notifications: Mutex::new(Vec::new()),
        })
    }

    pub fn titles(&self) -> Vec<String> {
        self.notifications
            .lock()
            .unwrap()
            .iter()
            .map(|n| n.title.clone())
            .collect()
    }
}

#[async_trait]
impl Notifier for CollectingNotifier {
    async fn notify(&self, notification: Notification) -> Result<(), NotifyError> {
        self.notifications.lock().unwrap().push(notification);
        Ok(())
    }
}

/// A timeline node posted an hour ago with sensible defaults; tweak fields
/// through the returned value.
pub fn post_node(shortcode: &str, comment_count: u32, like_count: u32) -> Value {
    json!({
        "code": shortcode,
        "taken_at": Utc::now().timestamp() - 3600,
        "comment_count": comment_count,
        "like_count": like_count,
        "media_type": 1,
        "caption": { "text": format!("caption for {shortcode}") },
        "has_liked": false,
        "user": { "username": "someone" },
        "image_versions2": { "candidates": [
            {
                "url": format!("https://cdn.example.com/{shortcode}.jpg"),
                "width": 1080,
                "height": 1080
            }
        ]}
    })
}

pub fn feed_payload(nodes: Vec<Value>) -> Value {
    json!({
        "data": {
            "xdt_api__v1__feed__user_timeline_graphql_connection": {
                "edges": nodes.into_iter().map(|n| json!({ "node": n })).collect::<Vec<_>>()
            }
        }
    })
}
