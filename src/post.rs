// Normalized post model — the record shape every source adapter produces.
//
// Adapters build a Post from raw platform data, run `check()`, and drop it
// if it fails. Nothing downstream mutates a Post; the harvester only
// drops repeats and reorders.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Posts with this many characters of content or fewer are discarded.
pub const MIN_CONTENT_CHARS: usize = 10;

/// Which platform a post came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    Twitter,
    Reddit,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Twitter => "Twitter",
            Platform::Reddit => "Reddit",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Platform {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Twitter" => Ok(Platform::Twitter),
            "Reddit" => Ok(Platform::Reddit),
            other => anyhow::bail!("unknown platform: {other}"),
        }
    }
}

/// A harvested post, normalized across sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Unique within its source
    pub id: String,
    /// Source-prefixed handle: `@name` on Twitter, `u/name` on Reddit
    pub username: String,
    pub platform: Platform,
    pub content: String,
    /// Adapter-supplied when the source exposes one, otherwise harvest time
    pub timestamp: DateTime<Utc>,
    /// Source-specific popularity signal (likes, or score + comments)
    pub engagement: u64,
    /// Permalink; empty when it couldn't be resolved
    pub url: String,
    /// How the post was acquired, e.g. "Reddit API"
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Sub-forum the post lives in (subreddit name)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub community: Option<String>,
}

/// Why a normalized record was rejected at the adapter boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("post has no id")]
    MissingId,
    #[error("content too short ({chars} chars, need more than {MIN_CONTENT_CHARS})")]
    ContentTooShort { chars: usize },
}

impl Post {
    /// Check the record invariants. Adapters must drop posts that fail.
    ///
    /// Length is counted in characters of the trimmed content, not bytes —
    /// a short emoji run can be dozens of bytes.
    pub fn check(&self) -> Result<(), Rejection> {
        if self.id.trim().is_empty() {
            return Err(Rejection::MissingId);
        }
        let chars = self.content.trim().chars().count();
        if chars <= MIN_CONTENT_CHARS {
            return Err(Rejection::ContentTooShort { chars });
        }
        Ok(())
    }
}

/// Normalize a tracked identity into a search query: trim whitespace and
/// strip leading mention markers ("@elonmusk" -> "elonmusk").
pub fn strip_mention(query: &str) -> &str {
    query.trim().trim_start_matches('@').trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(id: &str, content: &str) -> Post {
        Post {
            id: id.to_string(),
            username: "@someone".to_string(),
            platform: Platform::Twitter,
            content: content.to_string(),
            timestamp: Utc::now(),
            engagement: 0,
            url: String::new(),
            source: "test".to_string(),
            title: None,
            community: None,
        }
    }

    #[test]
    fn ten_chars_is_rejected_eleven_is_kept() {
        assert_eq!(
            post("1", "0123456789").check(),
            Err(Rejection::ContentTooShort { chars: 10 })
        );
        assert!(post("1", "0123456789a").check().is_ok());
    }

    #[test]
    fn whitespace_padding_does_not_count() {
        assert!(post("1", "   short    \n\n\n   ").check().is_err());
    }

    #[test]
    fn emoji_counted_by_char() {
        // 5 emoji = 20 bytes but only 5 chars
        assert!(post("1", "🔥🔥🔥🔥🔥").check().is_err());
    }

    #[test]
    fn blank_id_is_rejected() {
        assert_eq!(
            post("  ", "long enough content here").check(),
            Err(Rejection::MissingId)
        );
    }

    #[test]
    fn strip_mention_handles_markers_and_whitespace() {
        assert_eq!(strip_mention("  @elonmusk "), "elonmusk");
        assert_eq!(strip_mention("nasa"), "nasa");
        assert_eq!(strip_mention("@"), "");
    }

    #[test]
    fn platform_parses_its_own_display() {
        for p in [Platform::Twitter, Platform::Reddit] {
            assert_eq!(p.to_string().parse::<Platform>().unwrap(), p);
        }
    }
}
