//! Translation DTOs

use serde::{Deserialize, Serialize};

/// Request to submit a new translation job
///
/// `file_content` is UTF-8 text for text formats and standard base64 for
/// binary formats (PDF, Word).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitTranslation {
    pub file_name: String,
    pub source_language: String,
    pub target_language: String,
    pub file_content: String,
    pub file_type: String,
}
