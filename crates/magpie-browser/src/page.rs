//! Page-driver abstraction the pipeline is written against.
//!
//! The curation and commenting code never touches a concrete browser; it
//! drives these traits. The devtools implementation lives in [`crate::cdp`],
//! and tests substitute scripted fakes. The remote platform's markup and
//! response shapes are not contractually stable, so every operation here is
//! either fallible or answers "not there" without failing.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::BrowserError;

/// Predicate over an intercepted response: `(url, parsed JSON body)`.
pub type ResponsePredicate = dyn Fn(&str, &serde_json::Value) -> bool + Send + Sync;

/// Collects JSON network responses observed on a page.
///
/// Must be created **before** navigating, so responses arriving during the
/// load are not missed.
#[async_trait]
pub trait ResponseWatcher: Send {
    /// Waits for the first intercepted response matching `predicate`,
    /// returning its body, or `None` once `timeout` elapses. A `None` is a
    /// soft outcome, not an error: the expected response simply never came.
    async fn wait_matching(
        &mut self,
        predicate: &ResponsePredicate,
        timeout: Duration,
    ) -> Option<serde_json::Value>;
}

/// One live page in an authenticated browsing session.
#[async_trait]
pub trait PageDriver: Send + Sync {
    async fn goto(&self, url: &str) -> Result<(), BrowserError>;

    /// Starts intercepting JSON responses on this page.
    async fn watch_responses(&self) -> Result<Box<dyn ResponseWatcher>, BrowserError>;

    /// Whether an element matching `selector` is currently present.
    async fn exists(&self, selector: &str) -> Result<bool, BrowserError>;

    /// Waits until any of `selectors` is present; returns the index of the
    /// first one found.
    ///
    /// # Errors
    ///
    /// Returns [`BrowserError::Timeout`] if none appears in time.
    async fn wait_for_any(
        &self,
        selectors: &[&str],
        timeout: Duration,
    ) -> Result<usize, BrowserError>;

    /// Clicks the parent element of the node matching `selector`. Returns
    /// `false` when the node is absent. Used for icon buttons where the
    /// clickable surface wraps the matched element.
    async fn click_parent_of(&self, selector: &str) -> Result<bool, BrowserError>;

    /// Clicks the first element matching `selector` whose trimmed text
    /// equals `text`. Returns `false` when no such element exists.
    async fn click_button_with_text(&self, selector: &str, text: &str)
        -> Result<bool, BrowserError>;

    /// Focuses the element matching `selector` and types `text` into it.
    async fn fill(&self, selector: &str, text: &str) -> Result<(), BrowserError>;

    /// Current value of the input matching `selector`, or `None` when the
    /// element is absent.
    async fn input_value(&self, selector: &str) -> Result<Option<String>, BrowserError>;

    async fn screenshot(&self, path: &Path) -> Result<(), BrowserError>;
}

/// A browsing session owning a browser process and one page.
#[async_trait]
pub trait PageSession: Send {
    fn page(&self) -> &dyn PageDriver;

    /// Shuts the session down. Always called in cleanup paths, success or
    /// failure.
    async fn close(&mut self) -> Result<(), BrowserError>;
}

/// Supplies authenticated browsing sessions to the pipeline.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn open(&self) -> Result<Box<dyn PageSession>, BrowserError>;
}
