// Post extraction from a rendered X/Twitter search page.
//
// Each `<article>` is one candidate post. Extraction is per-article: a
// missing text or author node skips that article only. Markup drifts
// often, so every selector here is a best guess at the current layout.

use chrono::{DateTime, Utc};
use scraper::{ElementRef, Html, Selector};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::debug;

use crate::post::{Platform, Post};
use crate::sources::FetchReport;

pub const SOURCE_TAG: &str = "Chromium DevTools";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("article has no tweet text")]
    MissingText,
    #[error("article has no author link")]
    MissingAuthor,
}

struct Selectors {
    article: Selector,
    text: Selector,
    author: Selector,
    like: Selector,
    time: Selector,
}

impl Selectors {
    fn new() -> Self {
        Self {
            article: Selector::parse("article").expect("Invalid article selector"),
            text: Selector::parse("[data-testid='tweetText']").expect("Invalid text selector"),
            author: Selector::parse("[data-testid='User-Name'] a")
                .expect("Invalid author selector"),
            like: Selector::parse("[data-testid='like'] span").expect("Invalid like selector"),
            time: Selector::parse("time").expect("Invalid time selector"),
        }
    }
}

/// Fields pulled out of one article before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTweet {
    pub handle: String,
    pub text: String,
    pub likes: u64,
    pub permalink: String,
    pub posted_at: Option<DateTime<Utc>>,
}

/// Extract up to `limit` posts from the page HTML.
///
/// Only the first `limit` articles are considered; some of those may be
/// skipped or rejected, so fewer than `limit` posts can come back.
pub fn extract_posts(
    html: &str,
    limit: usize,
    base_url: &str,
    harvested_at: DateTime<Utc>,
) -> FetchReport {
    let document = Html::parse_document(html);
    let selectors = Selectors::new();
    let mut report = FetchReport::empty();

    for (index, article) in document.select(&selectors.article).take(limit).enumerate() {
        match extract_article(article, &selectors, base_url) {
            Ok(raw) => report.push_checked(into_post(raw, harvested_at)),
            Err(e) => {
                debug!(index, error = %e, "Skipping malformed article");
                report.skipped += 1;
            }
        }
    }

    report
}

fn extract_article(
    article: ElementRef<'_>,
    selectors: &Selectors,
    base_url: &str,
) -> Result<RawTweet, ExtractError> {
    let text = article
        .select(&selectors.text)
        .next()
        .map(|el| el.text().collect::<String>())
        .ok_or(ExtractError::MissingText)?;

    let handle = article
        .select(&selectors.author)
        .filter_map(|a| a.value().attr("href"))
        .find_map(handle_from_href)
        .ok_or(ExtractError::MissingAuthor)?;

    let likes = article
        .select(&selectors.like)
        .next()
        .map(|el| parse_count(&el.text().collect::<String>()))
        .unwrap_or(0);

    let time = article.select(&selectors.time).next();

    let posted_at = time
        .and_then(|t| t.value().attr("datetime"))
        .and_then(|dt| DateTime::parse_from_rfc3339(dt).ok())
        .map(|dt| dt.with_timezone(&Utc));

    // The permalink is the anchor wrapping the timestamp
    let permalink = time
        .and_then(|t| t.parent())
        .and_then(ElementRef::wrap)
        .filter(|parent| parent.value().name() == "a")
        .and_then(|a| a.value().attr("href"))
        .map(|href| absolutize(base_url, href))
        .unwrap_or_default();

    Ok(RawTweet {
        handle,
        text: text.trim().to_string(),
        likes,
        permalink,
        posted_at,
    })
}

fn into_post(raw: RawTweet, harvested_at: DateTime<Utc>) -> Post {
    let id = status_id(&raw.permalink)
        .unwrap_or_else(|| fallback_id(&raw.handle, &raw.text, raw.posted_at));
    Post {
        id,
        username: format!("@{}", raw.handle),
        platform: Platform::Twitter,
        content: raw.text,
        timestamp: raw.posted_at.unwrap_or(harvested_at),
        engagement: raw.likes,
        url: raw.permalink,
        source: SOURCE_TAG.to_string(),
        title: None,
        community: None,
    }
}

/// Id for a post whose permalink couldn't be found: the handle plus a
/// digest of what was said and when. The same post gets the same id on
/// every page it shows up on.
pub fn fallback_id(handle: &str, text: &str, posted_at: Option<DateTime<Utc>>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(handle.as_bytes());
    hasher.update([0u8]);
    hasher.update(text.as_bytes());
    if let Some(at) = posted_at {
        hasher.update([0u8]);
        hasher.update(at.to_rfc3339().as_bytes());
    }
    let digest = hex::encode(hasher.finalize());
    format!("{handle}-{}", &digest[..16])
}

/// Last path segment of a profile link: "/nasa" or "https://x.com/nasa/" -> "nasa".
pub fn handle_from_href(href: &str) -> Option<String> {
    href.split(['?', '#'])
        .next()
        .unwrap_or(href)
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty() && !segment.contains(':'))
        .map(str::to_string)
}

/// Parse an engagement counter like "1,204". Anything that isn't a plain
/// number ("1.2K", empty) counts as zero.
pub fn parse_count(text: &str) -> u64 {
    text.trim().replace(',', "").parse().unwrap_or(0)
}

/// Status id from a permalink like "https://x.com/nasa/status/1789?s=20".
pub fn status_id(permalink: &str) -> Option<String> {
    let (_, rest) = permalink.split_once("/status/")?;
    let id: String = rest.chars().take_while(char::is_ascii_digit).collect();
    (!id.is_empty()).then_some(id)
}

fn absolutize(base_url: &str, href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        href.to_string()
    } else if href.starts_with('/') {
        format!("{}{href}", base_url.trim_end_matches('/'))
    } else {
        String::new()
    }
}
