//! Translation job domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Backend-issued job identifier
///
/// Opaque to the client; it is never generated locally.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// One submitted translation request, as reported by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationJob {
    pub id: JobId,

    /// Identifier of the submitting user
    #[serde(rename = "user_id", default)]
    pub owner: String,

    pub file_name: String,
    pub source_language: String,
    pub target_language: String,
    pub status: JobStatus,

    #[serde(with = "super::timestamp")]
    pub created_at: DateTime<Utc>,

    /// Set once, when the job reaches a terminal status
    #[serde(
        default,
        with = "super::timestamp::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub completed_at: Option<DateTime<Utc>>,

    /// Short-lived authorized URL of the translated document
    #[serde(
        rename = "download_url",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub download_reference: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translated_text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s3_input_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s3_output_key: Option<String>,
}

impl TranslationJob {
    /// Whether the backend may still change this job
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Only completed jobs have something to download
    pub fn is_downloadable(&self) -> bool {
        matches!(self.status, JobStatus::Completed)
    }

    /// File name the translated document is saved under
    ///
    /// Only the last component of the backend's file name is kept, so the
    /// result never points outside the download directory.
    pub fn download_file_name(&self) -> String {
        let base = self
            .file_name
            .rsplit(['/', '\\'])
            .next()
            .filter(|name| !name.is_empty() && *name != "." && *name != "..")
            .unwrap_or("document");
        format!("translated-{}", base)
    }

    /// Language pair in display form, e.g. `EN → ES`
    pub fn language_pair(&self) -> String {
        format!(
            "{} → {}",
            self.source_language.to_uppercase(),
            self.target_language.to_uppercase()
        )
    }
}

/// Translation job status
///
/// Transitions only move forward: `Pending → Processing → {Completed, Failed}`.
/// `Pending` may also fail directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    /// Non-terminal statuses keep the poller running
    pub fn is_active(self) -> bool {
        match self {
            JobStatus::Pending | JobStatus::Processing => true,
            JobStatus::Completed | JobStatus::Failed => false,
        }
    }

    pub fn is_terminal(self) -> bool {
        !self.is_active()
    }

    /// Position in the lifecycle, used to detect regressions
    fn rank(self) -> u8 {
        match self {
            JobStatus::Pending => 0,
            JobStatus::Processing => 1,
            JobStatus::Completed | JobStatus::Failed => 2,
        }
    }

    /// Whether moving from `self` to `next` respects the lifecycle
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        if self == next {
            return true;
        }
        self.is_active() && next.rank() > self.rank()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "Pending"),
            JobStatus::Processing => write!(f, "Processing"),
            JobStatus::Completed => write!(f, "Completed"),
            JobStatus::Failed => write!(f, "Failed"),
        }
    }
}
