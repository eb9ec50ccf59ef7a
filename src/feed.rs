// Persisted feed format — a pretty-printed JSON array of posts.
//
// This is what `rumour harvest --output` writes and what review tooling
// reads back. Every Post field survives the round trip.

use std::path::Path;

use anyhow::{Context, Result};

use crate::post::Post;

pub fn to_json(posts: &[Post]) -> Result<String> {
    serde_json::to_string_pretty(posts).context("Failed to serialize feed")
}

pub fn from_json(json: &str) -> Result<Vec<Post>> {
    serde_json::from_str(json).context("Failed to parse feed")
}

/// Write the feed to `path`, creating parent directories as needed.
pub fn write_feed(path: &Path, posts: &[Post]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory for {}", path.display()))?;
        }
    }
    std::fs::write(path, to_json(posts)?)
        .with_context(|| format!("Failed to write feed to {}", path.display()))
}

pub fn read_feed(path: &Path) -> Result<Vec<Post>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read feed from {}", path.display()))?;
    from_json(&json)
}
