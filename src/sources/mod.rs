// Source adapters — one per platform, all behind the SourceAdapter trait.
//
// The harvester only sees this trait, so a fragile scraper can be replaced
// by an API client without touching orchestration.

pub mod error;
pub mod rate_limiter;
pub mod reddit;
pub mod twitter;

use async_trait::async_trait;

use crate::post::{Platform, Post};

pub use error::SourceError;

/// What a single `fetch` call produced.
///
/// `failure` distinguishes "nothing matched" (None, empty posts) from
/// "the adapter couldn't do its job" (Some). Posts collected before a
/// failure are still returned.
#[derive(Debug, Default)]
pub struct FetchReport {
    pub posts: Vec<Post>,
    pub failure: Option<SourceError>,
    /// Candidate elements that couldn't be extracted at all
    pub skipped: usize,
    /// Normalized records dropped by `Post::check`
    pub rejected: usize,
}

impl FetchReport {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn failed(error: SourceError) -> Self {
        Self {
            failure: Some(error),
            ..Self::default()
        }
    }

    /// Attach a failure to a report that may already hold partial results.
    pub fn with_failure(mut self, error: SourceError) -> Self {
        self.failure = Some(error);
        self
    }

    /// Validate and append a normalized post, counting rejections.
    pub fn push_checked(&mut self, post: Post) {
        match post.check() {
            Ok(()) => self.posts.push(post),
            Err(reason) => {
                tracing::trace!(id = %post.id, %reason, "Dropping post");
                self.rejected += 1;
            }
        }
    }
}

/// A platform-specific post source.
///
/// Implementations must never fail out of `fetch`: every problem becomes a
/// (possibly empty) report with `failure` set.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Short name used in logs and warnings.
    fn name(&self) -> &'static str;

    fn platform(&self) -> Platform;

    /// Fetch up to `limit` recent posts matching `query`.
    async fn fetch(&self, query: &str, limit: usize) -> FetchReport;

    /// Tear down any resources held across fetches. Called once at the end
    /// of every harvest.
    async fn release(&self) {}
}
