//! Client-side submission checks
//!
//! Everything here runs before a request is built. A submission that fails
//! validation never reaches the backend.

use std::path::Path;
use thiserror::Error;

/// File extensions the backend accepts
pub const SUPPORTED_EXTENSIONS: &[&str] = &["txt", "doc", "docx", "pdf"];

/// Reasons a submission is refused locally
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Source and target languages must be different")]
    SameLanguage,

    #[error("{0} language must be selected")]
    EmptyLanguage(&'static str),

    #[error("Unsupported file type '{0}' (expected one of: .txt, .doc, .docx, .pdf)")]
    UnsupportedFileType(String),

    #[error("File '{0}' is empty")]
    EmptyFile(String),
}

/// Checks a source/target language pair
pub fn validate_language_pair(source: &str, target: &str) -> Result<(), ValidationError> {
    let source = source.trim();
    let target = target.trim();

    if source.is_empty() {
        return Err(ValidationError::EmptyLanguage("Source"));
    }
    if target.is_empty() {
        return Err(ValidationError::EmptyLanguage("Target"));
    }
    if source.eq_ignore_ascii_case(target) {
        return Err(ValidationError::SameLanguage);
    }

    Ok(())
}

/// Checks that the file extension is one the backend accepts
pub fn validate_file_name(path: &Path) -> Result<(), ValidationError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();

    if SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
        Ok(())
    } else {
        Err(ValidationError::UnsupportedFileType(
            path.display().to_string(),
        ))
    }
}
