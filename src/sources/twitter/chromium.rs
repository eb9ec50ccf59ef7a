// Chromium sessions over the DevTools protocol (chromiumoxide).
//
// CDP talks to the browser directly, so there's no separate driver binary
// to install — only the browser itself, found on PATH or via CHROME_PATH.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::debug;

use super::session::{RenderSession, SessionLauncher};

const SCROLL_TO_BOTTOM_JS: &str = "window.scrollTo(0, document.body.scrollHeight);";

/// How an element poll waits between attempts.
const POLL_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug, Clone)]
pub struct BrowserOptions {
    /// Browser binary; None lets chromiumoxide search the usual locations
    pub executable: Option<PathBuf>,
    pub headless: bool,
    /// Per-CDP-command timeout
    pub request_timeout: Duration,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            executable: None,
            headless: true,
            request_timeout: Duration::from_secs(30),
        }
    }
}

pub struct ChromiumLauncher {
    options: BrowserOptions,
}

impl ChromiumLauncher {
    pub fn new(options: BrowserOptions) -> Self {
        Self { options }
    }
}

#[async_trait]
impl SessionLauncher for ChromiumLauncher {
    async fn launch(&self) -> Result<Box<dyn RenderSession>> {
        if let Some(path) = &self.options.executable {
            if !path.exists() {
                anyhow::bail!("browser binary not found at {}", path.display());
            }
        }

        let mut builder = BrowserConfig::builder()
            .arg("--no-sandbox") // Required for containerized environments
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage") // Avoid /dev/shm size issues in containers
            .request_timeout(self.options.request_timeout);
        if !self.options.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &self.options.executable {
            builder = builder.chrome_executable(path);
        }
        let config = builder
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build browser config: {e}"))?;

        debug!(headless = self.options.headless, "Launching browser");
        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("Failed to launch browser")?;

        let handler = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                handler.abort();
                return Err(e).context("Failed to open browser tab");
            }
        };

        Ok(Box::new(ChromiumSession {
            browser,
            page,
            handler: Some(handler),
        }))
    }
}

pub struct ChromiumSession {
    browser: Browser,
    page: Page,
    handler: Option<JoinHandle<()>>,
}

#[async_trait]
impl RenderSession for ChromiumSession {
    async fn goto(&mut self, url: &str) -> Result<()> {
        self.page
            .goto(url)
            .await
            .with_context(|| format!("Failed to navigate to {url}"))?;
        Ok(())
    }

    async fn wait_for(&mut self, selector: &str, timeout: Duration) -> Result<bool> {
        let page = &self.page;
        let poll = async {
            while page.find_element(selector).await.is_err() {
                tokio::time::sleep(POLL_INTERVAL).await;
            }
        };
        Ok(tokio::time::timeout(timeout, poll).await.is_ok())
    }

    async fn scroll_to_bottom(&mut self) -> Result<()> {
        self.page
            .evaluate(SCROLL_TO_BOTTOM_JS)
            .await
            .context("Failed to scroll page")?;
        Ok(())
    }

    async fn html(&mut self) -> Result<String> {
        self.page.content().await.context("Failed to read page content")
    }

    async fn close(&mut self) -> Result<()> {
        self.browser.close().await.context("Failed to close browser")?;
        if let Some(handler) = self.handler.take() {
            let _ = handler.await;
        }
        Ok(())
    }
}

impl Drop for ChromiumSession {
    fn drop(&mut self) {
        if let Some(handler) = self.handler.take() {
            handler.abort();
        }
    }
}
