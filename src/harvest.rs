// Harvest orchestration: fan tracked identities out across every source,
// keep whatever comes back, and merge it into one newest-first feed.
//
// A source that fails for one identity never stops the others — its
// failure becomes a warning on the Harvest and the feed is just smaller.
// There's no retry here; run `collect` again if you want one.

use std::collections::HashSet;

use anyhow::Result;
use futures::stream::{self, StreamExt};
use indicatif::ProgressBar;
use tracing::{info, warn};

use crate::post::{Platform, Post};
use crate::sources::{SourceAdapter, SourceError};

/// A degraded fetch: which source, for which identity, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceWarning {
    pub source: &'static str,
    pub identity: String,
    pub error: SourceError,
}

/// The merged result of one harvest.
#[derive(Debug, Default)]
pub struct Harvest {
    /// Sorted by timestamp, newest first; ties keep encounter order
    pub posts: Vec<Post>,
    pub warnings: Vec<SourceWarning>,
}

pub struct Harvester {
    sources: Vec<Box<dyn SourceAdapter>>,
    concurrency: usize,
    progress: Option<ProgressBar>,
}

/// Per-source share of the result budget.
///
/// Integer division: the remainder is dropped, not redistributed, so
/// `split_budget(1, 2) == 0`.
pub fn split_budget(max_results: usize, source_count: usize) -> usize {
    if source_count == 0 {
        0
    } else {
        max_results / source_count
    }
}

impl Harvester {
    pub fn new(sources: Vec<Box<dyn SourceAdapter>>) -> Self {
        Self {
            sources,
            concurrency: 1,
            progress: None,
        }
    }

    /// Process up to `n` identities at once. The default of 1 runs each
    /// identity to completion before starting the next.
    pub fn with_concurrency(mut self, n: usize) -> Self {
        self.concurrency = n.max(1);
        self
    }

    /// Tick this progress bar once per finished identity.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Harvest posts about `identities`, with a total budget of
    /// `max_results` per identity split evenly across sources.
    ///
    /// Only fails on a zero budget. Source failures are reported in
    /// `Harvest::warnings`.
    pub async fn collect(&self, identities: &[String], max_results: usize) -> Result<Harvest> {
        if max_results == 0 {
            anyhow::bail!("max_results must be positive");
        }

        let share = split_budget(max_results, self.sources.len());
        info!(
            identities = identities.len(),
            sources = self.sources.len(),
            share,
            "Starting harvest"
        );

        // `buffered` yields in identity order even when fetches overlap
        let per_identity: Vec<(Vec<Post>, Vec<SourceWarning>)> = stream::iter(identities)
            .map(|identity| self.collect_identity(identity, share))
            .buffered(self.concurrency)
            .collect()
            .await;

        for source in &self.sources {
            source.release().await;
        }

        let mut harvest = Harvest::default();
        for (posts, warnings) in per_identity {
            harvest.posts.extend(posts);
            harvest.warnings.extend(warnings);
        }

        harvest.posts = merge_feed(harvest.posts);

        info!(
            posts = harvest.posts.len(),
            warnings = harvest.warnings.len(),
            "Harvest complete"
        );
        Ok(harvest)
    }

    async fn collect_identity(
        &self,
        identity: &str,
        share: usize,
    ) -> (Vec<Post>, Vec<SourceWarning>) {
        let mut posts = Vec::new();
        let mut warnings = Vec::new();

        for source in &self.sources {
            let report = source.fetch(identity, share).await;
            posts.extend(report.posts);
            if let Some(error) = report.failure {
                warn!(
                    source = source.name(),
                    identity,
                    error = %error,
                    "Source degraded, continuing"
                );
                warnings.push(SourceWarning {
                    source: source.name(),
                    identity: identity.to_string(),
                    error,
                });
            }
        }

        if let Some(pb) = &self.progress {
            pb.inc(1);
        }

        (posts, warnings)
    }
}

/// Drop repeated `(platform, id)` pairs (first one wins), then sort newest
/// first. The sort is stable, so equal timestamps keep encounter order.
pub fn merge_feed(posts: Vec<Post>) -> Vec<Post> {
    let mut seen: HashSet<(Platform, String)> = HashSet::new();
    let mut feed: Vec<Post> = posts
        .into_iter()
        .filter(|p| seen.insert((p.platform, p.id.clone())))
        .collect();
    feed.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    feed
}
