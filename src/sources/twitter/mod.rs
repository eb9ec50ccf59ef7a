// X/Twitter source — scrapes the live search page with a headless browser.
//
// There's no usable public API, so we render the search results, scroll a
// few times to let the infinite feed load more, and pull posts out of the
// final DOM. Everything here is best-effort: selector drift or anti-bot
// walls show up as fewer posts, never as a failed harvest.

pub mod chromium;
pub mod extract;
pub mod session;

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info, warn};

use crate::post::{strip_mention, Platform};
use crate::sources::{FetchReport, SourceAdapter, SourceError};

use chromium::{BrowserOptions, ChromiumLauncher};
use session::{RenderSession, SessionLauncher, SessionManager};

pub const DEFAULT_BASE_URL: &str = "https://x.com";

/// Timing and location knobs for the scraper.
#[derive(Debug, Clone)]
pub struct TwitterOptions {
    pub base_url: String,
    /// Upper bound on loading the search page itself
    pub navigation_timeout: Duration,
    /// How long to wait for the first post to render
    pub wait_timeout: Duration,
    /// Scroll-to-bottom passes to trigger lazy loading
    pub scroll_rounds: u32,
    pub scroll_pause: Duration,
}

impl Default for TwitterOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            navigation_timeout: Duration::from_secs(30),
            wait_timeout: Duration::from_secs(15),
            scroll_rounds: 3,
            scroll_pause: Duration::from_secs(2),
        }
    }
}

pub struct TwitterSource {
    sessions: SessionManager,
    options: TwitterOptions,
}

impl TwitterSource {
    pub fn new(launcher: Box<dyn SessionLauncher>, options: TwitterOptions) -> Self {
        Self {
            sessions: SessionManager::new(launcher),
            options,
        }
    }

    /// Scrape with a local Chromium.
    pub fn chromium(browser: BrowserOptions, options: TwitterOptions) -> Self {
        Self::new(Box::new(ChromiumLauncher::new(browser)), options)
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    async fn scrape(
        &self,
        session: &mut dyn RenderSession,
        handle: &str,
        limit: usize,
    ) -> Result<FetchReport, SourceError> {
        let url = search_url(&self.options.base_url, handle)?;
        info!(url = %url, "Scraping Twitter search");

        tokio::time::timeout(self.options.navigation_timeout, session.goto(&url))
            .await
            .map_err(|_| SourceError::NavigationTimeout {
                what: "search page".to_string(),
                secs: self.options.navigation_timeout.as_secs(),
            })?
            .map_err(|e| SourceError::Request(format!("{e:#}")))?;

        let rendered = session
            .wait_for("article", self.options.wait_timeout)
            .await
            .map_err(|e| SourceError::Request(format!("{e:#}")))?;
        if !rendered {
            return Err(SourceError::NavigationTimeout {
                what: "first post".to_string(),
                secs: self.options.wait_timeout.as_secs(),
            });
        }

        for round in 0..self.options.scroll_rounds {
            if let Err(e) = session.scroll_to_bottom().await {
                // Keep whatever already loaded
                debug!(round, error = %e, "Scroll failed, extracting what's loaded");
                break;
            }
            tokio::time::sleep(self.options.scroll_pause).await;
        }

        let html = session
            .html()
            .await
            .map_err(|e| SourceError::Request(format!("{e:#}")))?;

        Ok(extract::extract_posts(
            &html,
            limit,
            &self.options.base_url,
            Utc::now(),
        ))
    }
}

/// Live-ordered search URL for a normalized handle.
pub fn search_url(base_url: &str, handle: &str) -> Result<String, SourceError> {
    let endpoint = format!("{}/search", base_url.trim_end_matches('/'));
    reqwest::Url::parse_with_params(
        &endpoint,
        &[("q", handle), ("src", "typed_query"), ("f", "live")],
    )
    .map(String::from)
    .map_err(|e| SourceError::Request(format!("bad search URL {endpoint}: {e}")))
}

#[async_trait]
impl SourceAdapter for TwitterSource {
    fn name(&self) -> &'static str {
        "twitter"
    }

    fn platform(&self) -> Platform {
        Platform::Twitter
    }

    async fn fetch(&self, query: &str, limit: usize) -> FetchReport {
        let handle = strip_mention(query);
        if limit == 0 || handle.is_empty() {
            debug!(query, limit, "Nothing to scrape");
            return FetchReport::empty();
        }

        let mut guard = match self.sessions.acquire().await {
            Ok(guard) => guard,
            Err(e) => {
                warn!(query = handle, error = %e, "Cannot scrape Twitter");
                return FetchReport::failed(e);
            }
        };

        let result = self.scrape(guard.session(), handle, limit).await;
        match result {
            Ok(report) => {
                guard.keep();
                info!(
                    query = handle,
                    count = report.posts.len(),
                    skipped = report.skipped,
                    rejected = report.rejected,
                    "Found Twitter posts"
                );
                report
            }
            Err(e) => {
                // The page is in an unknown state; start fresh next time
                guard.discard().await;
                warn!(query = handle, error = %e, "Twitter scraping failed");
                FetchReport::failed(e)
            }
        }
    }

    async fn release(&self) {
        self.sessions.release().await;
    }
}
