// Adapter failure taxonomy.
//
// None of these ever escape an adapter as an `Err` — they ride along in a
// FetchReport next to whatever posts were collected before things went wrong.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    /// Credentials or runtime prerequisites are missing.
    #[error("adapter unavailable: {0}")]
    Unavailable(String),

    /// The browser session could not be created.
    #[error("could not acquire browser session: {0}")]
    Acquisition(String),

    /// The page never rendered any content before the wait timed out.
    #[error("timed out after {secs}s waiting for {what}")]
    NavigationTimeout { what: String, secs: u64 },

    /// Transport, HTTP status, or response parsing failure.
    #[error("request failed: {0}")]
    Request(String),
}
