// Rumour: harvest posts about tracked accounts for misinformation review.
//
// This is the library root. Sources fetch and normalize posts, the
// harvester merges them into one feed, and the db module stores the cases
// reviewers file from that feed.

pub mod config;
pub mod db;
pub mod feed;
pub mod harvest;
pub mod output;
pub mod post;
pub mod sources;
pub mod status;
