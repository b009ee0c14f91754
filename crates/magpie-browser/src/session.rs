//! Browsing-session provider.
//!
//! The session's authentication lives in a persistent Chrome profile
//! directory: the operator logs in once through a headful session (see the
//! CLI's `login` command) and every later launch against the same profile
//! directory is already authenticated.

use std::path::PathBuf;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::EnableParams;
use futures::StreamExt;
use tokio::task::JoinHandle;

use crate::cdp::CdpPage;
use crate::error::BrowserError;
use crate::page::{PageDriver, PageSession, SessionProvider};

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub profile_dir: PathBuf,
    pub headless: bool,
    pub user_agent: String,
}

/// Launches Chrome against the configured profile directory.
pub struct ChromeSessionProvider {
    config: SessionConfig,
}

impl ChromeSessionProvider {
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        Self { config }
    }
}

struct ChromeSession {
    browser: Browser,
    handler_task: JoinHandle<()>,
    page: CdpPage,
}

#[async_trait]
impl SessionProvider for ChromeSessionProvider {
    async fn open(&self) -> Result<Box<dyn PageSession>, BrowserError> {
        let mut builder = BrowserConfig::builder()
            .window_size(1280, 800)
            .user_data_dir(&self.config.profile_dir);
        if !self.config.headless {
            builder = builder.with_head();
        }
        let browser_config = builder.build().map_err(BrowserError::Launch)?;

        let (browser, mut handler) = Browser::launch(browser_config).await?;
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = browser.new_page("about:blank").await?;
        page.set_user_agent(self.config.user_agent.as_str()).await?;
        page.execute(EnableParams::default()).await?;

        tracing::debug!(
            profile_dir = %self.config.profile_dir.display(),
            headless = self.config.headless,
            "browsing session opened"
        );

        Ok(Box::new(ChromeSession {
            browser,
            handler_task,
            page: CdpPage::new(page),
        }))
    }
}

#[async_trait]
impl PageSession for ChromeSession {
    fn page(&self) -> &dyn PageDriver {
        &self.page
    }

    async fn close(&mut self) -> Result<(), BrowserError> {
        self.browser.close().await?;
        let _ = self.browser.wait().await;
        self.handler_task.abort();
        Ok(())
    }
}
