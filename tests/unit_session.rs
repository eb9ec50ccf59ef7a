// Browser session lifecycle tests for the Twitter adapter.
//
// A scripted RenderSession stands in for Chromium, so these cover launch
// failure, render timeouts, reuse across queries and release without a
// browser on the machine.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use rumour::sources::twitter::session::{RenderSession, SessionLauncher};
use rumour::sources::twitter::{search_url, TwitterOptions, TwitterSource};
use rumour::sources::{SourceAdapter, SourceError};

const PAGE: &str = r#"<html><body>
  <article>
    <div data-testid="User-Name"><a href="/nasa">NASA</a></div>
    <a href="/nasa/status/42"><time datetime="2024-04-30T18:00:00Z">1h</time></a>
    <div data-testid="tweetText">Splashdown confirmed off the coast</div>
    <div data-testid="like"><span>12</span></div>
  </article>
</body></html>"#;

#[derive(Default)]
struct Counters {
    launches: AtomicUsize,
    closes: AtomicUsize,
    visited: Mutex<Vec<String>>,
}

struct FakeSession {
    counters: Arc<Counters>,
    renders: bool,
}

#[async_trait]
impl RenderSession for FakeSession {
    async fn goto(&mut self, url: &str) -> Result<()> {
        self.counters.visited.lock().unwrap().push(url.to_string());
        Ok(())
    }

    async fn wait_for(&mut self, _selector: &str, _timeout: Duration) -> Result<bool> {
        Ok(self.renders)
    }

    async fn scroll_to_bottom(&mut self) -> Result<()> {
        Ok(())
    }

    async fn html(&mut self) -> Result<String> {
        Ok(PAGE.to_string())
    }

    async fn close(&mut self) -> Result<()> {
        self.counters.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct FakeLauncher {
    counters: Arc<Counters>,
    /// None = launch fails
    renders: Option<bool>,
}

#[async_trait]
impl SessionLauncher for FakeLauncher {
    async fn launch(&self) -> Result<Box<dyn RenderSession>> {
        self.counters.launches.fetch_add(1, Ordering::SeqCst);
        match self.renders {
            Some(renders) => Ok(Box::new(FakeSession {
                counters: Arc::clone(&self.counters),
                renders,
            })),
            None => anyhow::bail!("chrome binary not found"),
        }
    }
}

fn fast_options() -> TwitterOptions {
    TwitterOptions {
        scroll_pause: Duration::ZERO,
        scroll_rounds: 2,
        ..TwitterOptions::default()
    }
}

fn source(renders: Option<bool>) -> (TwitterSource, Arc<Counters>) {
    let counters = Arc::new(Counters::default());
    let launcher = FakeLauncher {
        counters: Arc::clone(&counters),
        renders,
    };
    (TwitterSource::new(Box::new(launcher), fast_options()), counters)
}

// ============================================================
// Happy path and reuse
// ============================================================

#[tokio::test]
async fn fetch_extracts_posts_from_rendered_page() {
    let (twitter, _) = source(Some(true));
    let report = twitter.fetch("@nasa", 5).await;
    assert!(report.failure.is_none());
    assert_eq!(report.posts.len(), 1);
    assert_eq!(report.posts[0].id, "42");
    assert_eq!(report.posts[0].engagement, 12);
}

#[tokio::test]
async fn session_is_reused_until_release() {
    let (twitter, counters) = source(Some(true));

    twitter.fetch("nasa", 5).await;
    twitter.fetch("esa", 5).await;
    assert_eq!(counters.launches.load(Ordering::SeqCst), 1);
    assert_eq!(counters.closes.load(Ordering::SeqCst), 0);
    assert!(twitter.sessions().is_live().await);

    twitter.release().await;
    assert_eq!(counters.closes.load(Ordering::SeqCst), 1);
    assert!(!twitter.sessions().is_live().await);
}

#[tokio::test]
async fn mention_marker_is_stripped_from_search() {
    let (twitter, counters) = source(Some(true));
    twitter.fetch("  @nasa ", 5).await;
    let visited = counters.visited.lock().unwrap().clone();
    assert_eq!(visited, vec![search_url("https://x.com", "nasa").unwrap()]);
}

// ============================================================
// Failure paths
// ============================================================

#[tokio::test]
async fn launch_failure_is_reported_and_not_retried() {
    let (twitter, counters) = source(None);

    let first = twitter.fetch("nasa", 5).await;
    assert!(first.posts.is_empty());
    assert!(matches!(first.failure, Some(SourceError::Acquisition(_))));

    let second = twitter.fetch("esa", 5).await;
    assert!(matches!(second.failure, Some(SourceError::Acquisition(_))));
    assert_eq!(counters.launches.load(Ordering::SeqCst), 1);

    // Release forgets the failure so the next harvest tries again
    twitter.release().await;
    twitter.fetch("nasa", 5).await;
    assert_eq!(counters.launches.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn render_timeout_discards_session() {
    let (twitter, counters) = source(Some(false));

    let report = twitter.fetch("nasa", 5).await;
    assert!(report.posts.is_empty());
    assert!(matches!(
        report.failure,
        Some(SourceError::NavigationTimeout { .. })
    ));
    assert_eq!(counters.closes.load(Ordering::SeqCst), 1);
    assert!(!twitter.sessions().is_live().await);

    // Next fetch starts a fresh browser
    twitter.fetch("nasa", 5).await;
    assert_eq!(counters.launches.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn zero_limit_or_blank_query_never_launches() {
    let (twitter, counters) = source(Some(true));
    assert!(twitter.fetch("nasa", 0).await.posts.is_empty());
    assert!(twitter.fetch(" @ ", 5).await.failure.is_none());
    assert_eq!(counters.launches.load(Ordering::SeqCst), 0);
}

// ============================================================
// Search URL
// ============================================================

#[test]
fn search_url_requests_live_results() {
    let url = search_url("https://x.com/", "moon landing").unwrap();
    assert!(url.starts_with("https://x.com/search?"));
    assert!(url.contains("q=moon+landing"));
    assert!(url.contains("src=typed_query"));
    assert!(url.contains("f=live"));
}
