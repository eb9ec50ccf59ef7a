// Store trait — the write side for reviewed evidence.
//
// Harvesting never depends on this: cases and archived posts are a sink
// the CLI writes into. Methods are async so a networked backend could slot
// in behind the same interface as SqliteStore.

use anyhow::Result;
use async_trait::async_trait;

use super::models::{Case, CaseSubmission};
use crate::post::{Platform, Post};

#[async_trait]
pub trait Store: Send + Sync {
    // --- Lifecycle ---

    async fn table_count(&self) -> Result<i64>;

    // --- Cases ---

    /// Validate and store a report. Returns its id.
    async fn submit_case(&self, case: &CaseSubmission) -> Result<i64>;

    async fn get_case(&self, id: i64) -> Result<Option<Case>>;

    /// Most recent cases first.
    async fn recent_cases(&self, limit: u32) -> Result<Vec<Case>>;

    async fn case_count(&self) -> Result<i64>;

    /// Raw evidence file attached to a case, if any.
    async fn case_file(&self, id: i64) -> Result<Option<Vec<u8>>>;

    // --- Harvested posts ---

    /// Archive posts, replacing earlier copies with the same (platform, id).
    async fn save_posts(&self, posts: &[Post]) -> Result<usize>;

    /// Archived posts, newest first.
    async fn recent_posts(&self, limit: u32) -> Result<Vec<Post>>;

    async fn post_count(&self) -> Result<i64>;

    async fn get_post(&self, platform: Platform, id: &str) -> Result<Option<Post>>;
}
