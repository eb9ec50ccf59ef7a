// Reddit source — authenticated search over the OAuth API.
//
// Uses app-only OAuth (client credentials grant), so no Reddit account is
// involved — just a registered app's id and secret. Searches r/all sorted
// by newest and pages through results with the `after` cursor.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::rate_limiter::RateLimiter;
use super::{FetchReport, SourceAdapter, SourceError};
use crate::post::{strip_mention, Platform, Post};

pub const DEFAULT_API_URL: &str = "https://oauth.reddit.com";
pub const DEFAULT_AUTH_URL: &str = "https://www.reddit.com/api/v1/access_token";
pub const DEFAULT_USER_AGENT: &str = "MisinfoDetector/1.0";

/// Permalinks in listings are site-relative.
pub const PERMALINK_BASE: &str = "https://reddit.com";

pub const SOURCE_TAG: &str = "Reddit API";

/// Reddit caps listing pages at 100 items.
const MAX_PAGE_SIZE: usize = 100;

/// Refresh the token this long before Reddit says it expires.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Handle shown when the author account is gone.
const DELETED_AUTHOR: &str = "deleted";

#[derive(Debug, Clone)]
pub struct RedditCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub user_agent: String,
}

#[derive(Debug, Clone)]
pub struct RedditOptions {
    pub api_url: String,
    pub auth_url: String,
    pub request_timeout: Duration,
    pub requests_per_second: f64,
}

impl Default for RedditOptions {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            auth_url: DEFAULT_AUTH_URL.to_string(),
            request_timeout: Duration::from_secs(30),
            requests_per_second: 1.0,
        }
    }
}

struct AccessToken {
    value: String,
    expires_at: Instant,
}

pub struct RedditSource {
    client: reqwest::Client,
    /// None means the adapter is disabled
    credentials: Option<RedditCredentials>,
    options: RedditOptions,
    token: Mutex<Option<AccessToken>>,
    rate_limiter: RateLimiter,
}

impl RedditSource {
    /// Build the adapter. Passing `None` credentials gives an adapter that
    /// reports itself unavailable on every fetch.
    pub fn new(credentials: Option<RedditCredentials>, options: RedditOptions) -> Result<Self> {
        let user_agent = credentials
            .as_ref()
            .map(|c| c.user_agent.clone())
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());

        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(options.request_timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            credentials,
            rate_limiter: RateLimiter::new(options.requests_per_second),
            options,
            token: Mutex::new(None),
        })
    }

    pub fn is_available(&self) -> bool {
        self.credentials.is_some()
    }

    /// Get a bearer token, reusing the cached one until it nears expiry.
    async fn bearer(&self, credentials: &RedditCredentials) -> Result<String> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.expires_at {
                return Ok(token.value.clone());
            }
        }

        self.rate_limiter.acquire().await;
        debug!("Requesting Reddit access token");

        let response = self
            .client
            .post(&self.options.auth_url)
            .basic_auth(&credentials.client_id, Some(&credentials.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .context("Reddit token request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Reddit token endpoint returned {status}: {body}");
        }

        let grant: TokenResponse = response
            .json()
            .await
            .context("Failed to parse Reddit token response")?;

        let lifetime = Duration::from_secs(grant.expires_in).saturating_sub(TOKEN_EXPIRY_MARGIN);
        *cached = Some(AccessToken {
            value: grant.access_token.clone(),
            expires_at: Instant::now() + lifetime,
        });

        Ok(grant.access_token)
    }

    /// Fetch one page of r/all search results, newest first.
    async fn search_page(
        &self,
        credentials: &RedditCredentials,
        query: &str,
        page_size: usize,
        after: Option<&str>,
    ) -> Result<Listing> {
        let token = self.bearer(credentials).await?;
        let url = format!(
            "{}/r/all/search",
            self.options.api_url.trim_end_matches('/')
        );

        let page_size = page_size.to_string();
        let mut params: Vec<(&str, &str)> = vec![
            ("q", query),
            ("sort", "new"),
            ("limit", &page_size),
            ("type", "link"),
            ("raw_json", "1"),
        ];
        if let Some(cursor) = after {
            params.push(("after", cursor));
        }

        self.rate_limiter.acquire().await;

        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .query(&params)
            .send()
            .await
            .with_context(|| format!("Reddit search request failed for {query:?}"))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Reddit search returned {status}: {body}");
        }

        response
            .json::<Listing>()
            .await
            .context("Failed to parse Reddit search listing")
    }
}

#[async_trait]
impl SourceAdapter for RedditSource {
    fn name(&self) -> &'static str {
        "reddit"
    }

    fn platform(&self) -> Platform {
        Platform::Reddit
    }

    async fn fetch(&self, query: &str, limit: usize) -> FetchReport {
        let Some(credentials) = &self.credentials else {
            info!("Reddit adapter unavailable (no credentials)");
            return FetchReport::failed(SourceError::Unavailable(
                "REDDIT_CLIENT_ID / REDDIT_CLIENT_SECRET not set".to_string(),
            ));
        };

        let query = strip_mention(query);
        if limit == 0 || query.is_empty() {
            debug!(query, limit, "Nothing to search");
            return FetchReport::empty();
        }

        let harvested_at = Utc::now();
        let mut report = FetchReport::empty();
        let mut seen = 0usize;
        let mut after: Option<String> = None;

        while seen < limit {
            let page_size = (limit - seen).min(MAX_PAGE_SIZE);
            let listing = match self
                .search_page(credentials, query, page_size, after.as_deref())
                .await
            {
                Ok(listing) => listing,
                Err(e) => {
                    warn!(query, error = %e, "Reddit search failed");
                    return report.with_failure(SourceError::Request(format!("{e:#}")));
                }
            };

            let children = listing.data.children;
            if children.is_empty() {
                break;
            }

            for child in children.into_iter().take(limit - seen) {
                seen += 1;
                report.push_checked(normalize_submission(child.data, harvested_at));
            }

            after = listing.data.after;
            if after.is_none() {
                break;
            }
        }

        info!(
            query,
            count = report.posts.len(),
            rejected = report.rejected,
            "Found Reddit posts"
        );
        report
    }
}

/// Map a raw submission onto the normalized post shape. The result still
/// needs `Post::check`.
pub fn normalize_submission(s: Submission, harvested_at: DateTime<Utc>) -> Post {
    let content = match s.selftext.as_deref().map(str::trim) {
        Some(body) if !body.is_empty() => body.to_string(),
        _ => s.title.trim().to_string(),
    };

    let author = s
        .author
        .as_deref()
        .filter(|a| !a.is_empty() && *a != "[deleted]")
        .unwrap_or(DELETED_AUTHOR);

    // Scores can go negative on heavily downvoted posts
    let engagement = (s.score + s.num_comments).max(0) as u64;

    let timestamp = s
        .created_utc
        .and_then(|secs| DateTime::from_timestamp(secs as i64, 0))
        .unwrap_or(harvested_at);

    let url = if s.permalink.is_empty() {
        String::new()
    } else {
        format!("{PERMALINK_BASE}{}", s.permalink)
    };

    Post {
        id: s.id,
        username: format!("u/{author}"),
        platform: Platform::Reddit,
        content,
        timestamp,
        engagement,
        url,
        source: SOURCE_TAG.to_string(),
        title: Some(s.title).filter(|t| !t.is_empty()),
        community: s.subreddit.filter(|sub| !sub.is_empty()),
    }
}

// -- Serde types for the OAuth token and search listing --

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_token_lifetime")]
    expires_in: u64,
}

fn default_token_lifetime() -> u64 {
    3600
}

/// A search listing (`kind: "Listing"`).
#[derive(Debug, Deserialize)]
pub struct Listing {
    pub data: ListingData,
}

#[derive(Debug, Deserialize)]
pub struct ListingData {
    #[serde(default)]
    pub children: Vec<ListingChild>,
    pub after: Option<String>,
}

/// One listing entry (`kind: "t3"` for submissions).
#[derive(Debug, Deserialize)]
pub struct ListingChild {
    pub data: Submission,
}

/// The submission fields we normalize from.
#[derive(Debug, Clone, Deserialize)]
pub struct Submission {
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub selftext: Option<String>,
    pub author: Option<String>,
    pub subreddit: Option<String>,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub num_comments: i64,
    pub created_utc: Option<f64>,
    #[serde(default)]
    pub permalink: String,
}
