//! Chrome DevTools Protocol implementation of the page driver.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use chromiumoxide::cdp::browser_protocol::network::{EventResponseReceived, GetResponseBodyParams};
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::page::{Page, ScreenshotParams};
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::error::BrowserError;
use crate::page::{PageDriver, ResponsePredicate, ResponseWatcher};

/// Poll interval for element waits.
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// A devtools-driven page.
pub struct CdpPage {
    page: Page,
}

impl CdpPage {
    #[must_use]
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// Renders `s` as a quoted, escaped JavaScript string literal. Selectors
    /// contain quotes of both kinds, so they cannot be inlined verbatim.
    fn js_string(s: &str) -> String {
        serde_json::Value::String(s.to_owned()).to_string()
    }

    async fn eval<T: serde::de::DeserializeOwned>(&self, script: String) -> Result<T, BrowserError> {
        self.page
            .evaluate(script)
            .await?
            .into_value()
            .map_err(|e| BrowserError::Eval(e.to_string()))
    }
}

struct CdpResponseWatcher {
    rx: mpsc::UnboundedReceiver<(String, serde_json::Value)>,
    task: JoinHandle<()>,
}

impl Drop for CdpResponseWatcher {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[async_trait]
impl ResponseWatcher for CdpResponseWatcher {
    async fn wait_matching(
        &mut self,
        predicate: &ResponsePredicate,
        timeout: Duration,
    ) -> Option<serde_json::Value> {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return None;
            }
            match tokio::time::timeout(remaining, self.rx.recv()).await {
                Ok(Some((url, body))) => {
                    if predicate(&url, &body) {
                        return Some(body);
                    }
                }
                Ok(None) | Err(_) => return None,
            }
        }
    }
}

#[async_trait]
impl PageDriver for CdpPage {
    async fn goto(&self, url: &str) -> Result<(), BrowserError> {
        self.page.goto(url).await?;
        self.page.wait_for_navigation().await?;
        Ok(())
    }

    async fn watch_responses(&self) -> Result<Box<dyn ResponseWatcher>, BrowserError> {
        let mut events = self.page.event_listener::<EventResponseReceived>().await?;
        let page = self.page.clone();
        let (tx, rx) = mpsc::unbounded_channel();

        // Bodies must be pulled while the event is fresh. Anything that does
        // not fetch, decode, and parse as JSON is silently skipped; the
        // remote's response inventory is not ours to validate.
        let task = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                if !event.response.mime_type.contains("json") {
                    continue;
                }
                let params = GetResponseBodyParams::new(event.request_id.clone());
                let Ok(body) = page.execute(params).await else {
                    continue;
                };
                let raw = if body.base64_encoded {
                    match base64::engine::general_purpose::STANDARD
                        .decode(body.body.as_bytes())
                        .map(String::from_utf8)
                    {
                        Ok(Ok(text)) => text,
                        _ => continue,
                    }
                } else {
                    body.body.clone()
                };
                let Ok(parsed) = serde_json::from_str::<serde_json::Value>(&raw) else {
                    continue;
                };
                if tx.send((event.response.url.clone(), parsed)).is_err() {
                    break;
                }
            }
        });

        Ok(Box::new(CdpResponseWatcher { rx, task }))
    }

    async fn exists(&self, selector: &str) -> Result<bool, BrowserError> {
        Ok(self.page.find_element(selector).await.is_ok())
    }

    async fn wait_for_any(
        &self,
        selectors: &[&str],
        timeout: Duration,
    ) -> Result<usize, BrowserError> {
        let deadline = Instant::now() + timeout;
        loop {
            for (index, selector) in selectors.iter().enumerate() {
                if self.page.find_element(*selector).await.is_ok() {
                    return Ok(index);
                }
            }
            if Instant::now() + POLL_INTERVAL > deadline {
                return Err(BrowserError::Timeout {
                    what: format!("any of: {}", selectors.join(", ")),
                    timeout_secs: timeout.as_secs(),
                });
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn click_parent_of(&self, selector: &str) -> Result<bool, BrowserError> {
        let script = format!(
            "(() => {{ const el = document.querySelector({sel}); \
             if (!el || !el.parentElement) return false; \
             el.parentElement.click(); return true; }})()",
            sel = Self::js_string(selector)
        );
        self.eval(script).await
    }

    async fn click_button_with_text(
        &self,
        selector: &str,
        text: &str,
    ) -> Result<bool, BrowserError> {
        let script = format!(
            "(() => {{ const nodes = Array.from(document.querySelectorAll({sel})); \
             const target = nodes.find(n => (n.textContent || '').trim() === {text}); \
             if (!target) return false; \
             target.click(); return true; }})()",
            sel = Self::js_string(selector),
            text = Self::js_string(text)
        );
        self.eval(script).await
    }

    async fn fill(&self, selector: &str, text: &str) -> Result<(), BrowserError> {
        let element =
            self.page
                .find_element(selector)
                .await
                .map_err(|_| BrowserError::ElementNotFound {
                    selector: selector.to_owned(),
                })?;
        element.click().await?;
        element.type_str(text).await?;
        Ok(())
    }

    async fn input_value(&self, selector: &str) -> Result<Option<String>, BrowserError> {
        // Encoded through JSON.stringify so an absent element (null) and an
        // empty value ('') stay distinguishable across the protocol.
        let script = format!(
            "JSON.stringify((() => {{ const el = document.querySelector({sel}); \
             return el ? (el.value ?? '') : null; }})())",
            sel = Self::js_string(selector)
        );
        let encoded: String = self.eval(script).await?;
        serde_json::from_str(&encoded).map_err(|e| BrowserError::Eval(e.to_string()))
    }

    async fn screenshot(&self, path: &Path) -> Result<(), BrowserError> {
        self.page
            .save_screenshot(
                ScreenshotParams::builder()
                    .format(CaptureScreenshotFormat::Png)
                    .build(),
                path,
            )
            .await
            .map_err(|e| BrowserError::Screenshot(e.to_string()))?;
        Ok(())
    }
}
