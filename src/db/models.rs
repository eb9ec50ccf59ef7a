// Data models for the case store.
//
// A case is one report about suspicious content: where it lives, what
// evidence backs it up, and why it was flagged. These types are kept
// separate from the queries so callers don't need rusqlite in scope.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The kind of evidence attached to a case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EvidenceType {
    /// Uploaded screenshot or image bytes
    Screenshot,
    /// Pasted post text
    PostText,
    /// URL of a matching or similar image found elsewhere
    ImageMatch,
}

impl EvidenceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EvidenceType::Screenshot => "Screenshot/Image",
            EvidenceType::PostText => "Post Text",
            EvidenceType::ImageMatch => "Image Match",
        }
    }

    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "Screenshot/Image" => Some(EvidenceType::Screenshot),
            "Post Text" => Some(EvidenceType::PostText),
            "Image Match" => Some(EvidenceType::ImageMatch),
            _ => None,
        }
    }
}

impl std::fmt::Display for EvidenceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Primary reason a case was flagged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlagReason {
    FakeAccount,
    ImageMisuse,
    DataLeak,
    Misinformation,
    Spam,
    Other,
}

impl FlagReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlagReason::FakeAccount => "Fake Account",
            FlagReason::ImageMisuse => "Image Misuse",
            FlagReason::DataLeak => "Data Leak",
            FlagReason::Misinformation => "Misinformation/Disinformation",
            FlagReason::Spam => "Spam",
            FlagReason::Other => "Other",
        }
    }

    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "Fake Account" => Some(FlagReason::FakeAccount),
            "Image Misuse" => Some(FlagReason::ImageMisuse),
            "Data Leak" => Some(FlagReason::DataLeak),
            "Misinformation/Disinformation" => Some(FlagReason::Misinformation),
            "Spam" => Some(FlagReason::Spam),
            "Other" => Some(FlagReason::Other),
            _ => None,
        }
    }
}

impl std::fmt::Display for FlagReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A report as submitted, before it's stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseSubmission {
    pub platform: String,
    pub url: String,
    pub evidence_type: EvidenceType,
    pub file_bytes: Option<Vec<u8>>,
    pub post_text: Option<String>,
    pub image_match_url: Option<String>,
    pub reason: FlagReason,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    #[error("platform and URL are both required")]
    MissingSource,
    #[error("post text is required for Post Text evidence")]
    MissingPostText,
    #[error("an image URL is required for Image Match evidence")]
    MissingImageUrl,
    #[error("a screenshot or image file is required for Screenshot/Image evidence")]
    MissingFile,
}

fn is_blank(field: &Option<String>) -> bool {
    field.as_deref().map_or(true, |s| s.trim().is_empty())
}

impl CaseSubmission {
    /// Check the fields the chosen evidence type depends on.
    pub fn validate(&self) -> Result<(), SubmissionError> {
        if self.platform.trim().is_empty() || self.url.trim().is_empty() {
            return Err(SubmissionError::MissingSource);
        }
        match self.evidence_type {
            EvidenceType::PostText if is_blank(&self.post_text) => {
                Err(SubmissionError::MissingPostText)
            }
            EvidenceType::ImageMatch if is_blank(&self.image_match_url) => {
                Err(SubmissionError::MissingImageUrl)
            }
            EvidenceType::Screenshot
                if self.file_bytes.as_ref().map_or(true, |b| b.is_empty()) =>
            {
                Err(SubmissionError::MissingFile)
            }
            _ => Ok(()),
        }
    }
}

/// A stored case, as read back for review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Case {
    pub id: i64,
    pub platform: String,
    pub url: String,
    pub evidence_type: EvidenceType,
    /// Size of the attached file, if any (bytes stay in the DB)
    pub file_size: Option<u64>,
    pub post_text: Option<String>,
    pub image_match_url: Option<String>,
    pub reason: FlagReason,
    pub notes: Option<String>,
    pub submitted_at: String,
}
