// Composition tests — the harvester driving several adapters at once.
//
// Scripted adapters return canned reports, so these exercise budget
// splitting, failure isolation, merge ordering and release without any
// network calls or browser.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use rumour::harvest::{merge_feed, split_budget, Harvester};
use rumour::post::{Platform, Post};
use rumour::sources::{FetchReport, SourceAdapter, SourceError};

fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, hour, 0, 0).unwrap()
}

fn post(platform: Platform, id: &str, hour: u32) -> Post {
    Post {
        id: id.to_string(),
        username: "@someone".to_string(),
        platform,
        content: format!("Harvested content for post {id}"),
        timestamp: at(hour),
        engagement: 0,
        url: String::new(),
        source: "scripted".to_string(),
        title: None,
        community: None,
    }
}

/// Returns a fixed script of posts per query and records every call.
struct Scripted {
    name: &'static str,
    platform: Platform,
    posts: HashMap<String, Vec<Post>>,
    fail_on: Option<(String, SourceError)>,
    limits: Arc<Mutex<Vec<usize>>>,
    releases: Arc<AtomicUsize>,
}

impl Scripted {
    fn new(name: &'static str, platform: Platform) -> Self {
        Self {
            name,
            platform,
            posts: HashMap::new(),
            fail_on: None,
            limits: Arc::new(Mutex::new(Vec::new())),
            releases: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn with_posts(mut self, query: &str, posts: Vec<Post>) -> Self {
        self.posts.insert(query.to_string(), posts);
        self
    }

    fn failing_on(mut self, query: &str, error: SourceError) -> Self {
        self.fail_on = Some((query.to_string(), error));
        self
    }
}

#[async_trait]
impl SourceAdapter for Scripted {
    fn name(&self) -> &'static str {
        self.name
    }

    fn platform(&self) -> Platform {
        self.platform
    }

    async fn fetch(&self, query: &str, limit: usize) -> FetchReport {
        self.limits.lock().unwrap().push(limit);
        if let Some((failing, error)) = &self.fail_on {
            if failing == query {
                return FetchReport::failed(error.clone());
            }
        }
        let mut report = FetchReport::empty();
        for p in self.posts.get(query).cloned().unwrap_or_default().into_iter().take(limit) {
            report.push_checked(p);
        }
        report
    }

    async fn release(&self) {
        self.releases.fetch_add(1, Ordering::SeqCst);
    }
}

fn identities(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

// ============================================================
// Budget splitting
// ============================================================

#[test]
fn budget_splits_evenly_and_drops_remainder() {
    assert_eq!(split_budget(10, 2), 5);
    assert_eq!(split_budget(11, 2), 5);
    assert_eq!(split_budget(1, 2), 0);
    assert_eq!(split_budget(10, 0), 0);
}

#[tokio::test]
async fn each_source_gets_its_share() {
    let a = Scripted::new("a", Platform::Twitter);
    let b = Scripted::new("b", Platform::Reddit);
    let (la, lb) = (Arc::clone(&a.limits), Arc::clone(&b.limits));

    Harvester::new(vec![Box::new(a), Box::new(b)])
        .collect(&identities(&["nasa"]), 10)
        .await
        .unwrap();

    assert_eq!(*la.lock().unwrap(), vec![5]);
    assert_eq!(*lb.lock().unwrap(), vec![5]);
}

#[tokio::test]
async fn budget_of_one_across_two_sources_yields_nothing() {
    let a = Scripted::new("a", Platform::Twitter)
        .with_posts("nasa", vec![post(Platform::Twitter, "1", 1)]);
    let b = Scripted::new("b", Platform::Reddit)
        .with_posts("nasa", vec![post(Platform::Reddit, "1", 2)]);

    let harvest = Harvester::new(vec![Box::new(a), Box::new(b)])
        .collect(&identities(&["nasa"]), 1)
        .await
        .unwrap();
    assert!(harvest.posts.is_empty());
}

#[tokio::test]
async fn zero_budget_is_an_error() {
    let harvester = Harvester::new(vec![Box::new(Scripted::new("a", Platform::Twitter))]);
    assert!(harvester.collect(&identities(&["nasa"]), 0).await.is_err());
}

// ============================================================
// Merge ordering
// ============================================================

#[tokio::test]
async fn feed_is_newest_first_across_sources_and_identities() {
    let twitter = Scripted::new("twitter", Platform::Twitter)
        .with_posts("nasa", vec![post(Platform::Twitter, "t1", 3), post(Platform::Twitter, "t2", 9)])
        .with_posts("esa", vec![post(Platform::Twitter, "t3", 6)]);
    let reddit = Scripted::new("reddit", Platform::Reddit)
        .with_posts("nasa", vec![post(Platform::Reddit, "r1", 7)])
        .with_posts("esa", vec![post(Platform::Reddit, "r2", 1)]);

    let harvest = Harvester::new(vec![Box::new(twitter), Box::new(reddit)])
        .collect(&identities(&["nasa", "esa"]), 20)
        .await
        .unwrap();

    let ids: Vec<&str> = harvest.posts.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["t2", "r1", "t3", "t1", "r2"]);
    assert!(harvest.warnings.is_empty());
}

#[test]
fn equal_timestamps_keep_encounter_order() {
    let feed = merge_feed(vec![
        post(Platform::Twitter, "a", 5),
        post(Platform::Reddit, "b", 5),
        post(Platform::Twitter, "c", 8),
        post(Platform::Reddit, "d", 5),
    ]);
    let ids: Vec<&str> = feed.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["c", "a", "b", "d"]);
}

#[test]
fn duplicate_platform_id_pairs_collapse() {
    let feed = merge_feed(vec![
        post(Platform::Twitter, "1", 5),
        post(Platform::Twitter, "1", 6),
        // Same id on another platform is a different post
        post(Platform::Reddit, "1", 4),
    ]);
    assert_eq!(feed.len(), 2);
    assert_eq!(feed[0].timestamp, at(5));
    assert_eq!(feed[1].platform, Platform::Reddit);
}

// ============================================================
// Failure isolation and release
// ============================================================

#[tokio::test]
async fn one_failing_identity_does_not_block_others() {
    let twitter = Scripted::new("twitter", Platform::Twitter)
        .with_posts("esa", vec![post(Platform::Twitter, "e1", 2)])
        .failing_on(
            "nasa",
            SourceError::NavigationTimeout {
                what: "first post".to_string(),
                secs: 15,
            },
        );

    let harvest = Harvester::new(vec![Box::new(twitter)])
        .collect(&identities(&["nasa", "esa"]), 10)
        .await
        .unwrap();

    assert_eq!(harvest.posts.len(), 1);
    assert_eq!(harvest.posts[0].id, "e1");
    assert_eq!(harvest.warnings.len(), 1);
    assert_eq!(harvest.warnings[0].source, "twitter");
    assert_eq!(harvest.warnings[0].identity, "nasa");
}

#[tokio::test]
async fn all_sources_unavailable_gives_empty_feed() {
    let unavailable = |name| {
        Scripted::new(name, Platform::Reddit)
            .failing_on("nasa", SourceError::Unavailable("no credentials".to_string()))
    };
    let harvest = Harvester::new(vec![Box::new(unavailable("a")), Box::new(unavailable("b"))])
        .collect(&identities(&["nasa"]), 10)
        .await
        .unwrap();

    assert!(harvest.posts.is_empty());
    assert_eq!(harvest.warnings.len(), 2);
}

#[tokio::test]
async fn every_source_is_released_once() {
    let a = Scripted::new("a", Platform::Twitter);
    let b = Scripted::new("b", Platform::Reddit);
    let (ra, rb) = (Arc::clone(&a.releases), Arc::clone(&b.releases));

    Harvester::new(vec![Box::new(a), Box::new(b)])
        .collect(&identities(&["nasa", "esa", "jaxa"]), 10)
        .await
        .unwrap();

    assert_eq!(ra.load(Ordering::SeqCst), 1);
    assert_eq!(rb.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn concurrent_harvest_matches_sequential() {
    let build = || {
        Scripted::new("twitter", Platform::Twitter)
            .with_posts("nasa", vec![post(Platform::Twitter, "n", 4)])
            .with_posts("esa", vec![post(Platform::Twitter, "e", 4)])
            .with_posts("jaxa", vec![post(Platform::Twitter, "j", 4)])
    };
    let names = identities(&["nasa", "esa", "jaxa"]);

    let sequential = Harvester::new(vec![Box::new(build())])
        .collect(&names, 10)
        .await
        .unwrap();
    let concurrent = Harvester::new(vec![Box::new(build())])
        .with_concurrency(3)
        .collect(&names, 10)
        .await
        .unwrap();

    assert_eq!(sequential.posts, concurrent.posts);
}
